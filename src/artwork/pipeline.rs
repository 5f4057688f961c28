//! Per-shortcut artwork resolution
//!
//! Each task walks a fixed chain and stops at the first success:
//! 1. Grid source, title match + library-size grid  -> `Found`
//! 2. Grid source, same game, any size               -> `FoundAlternate`
//! 3. Cover source + compositor                      -> `Synthesized`
//! 4. Nothing                                        -> `Failed`
//!
//! A target that already exists short-circuits the chain with no network
//! calls. Lookup misses and transport failures both fall through to the
//! next step; only a failed write or compose ends a task early.

use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::compose::Compositor;
use super::sources::{first_or_miss, CoverSource, Dimensions, GridSource, ImageFetcher, LIBRARY_GRID_SIZES};
use super::task::{GridImageTask, RunTally, TaskStatus};
use crate::error::{ArtworkError, SourceError};

/// Which step a miss came from, for logging
#[derive(Debug, Clone, Copy)]
enum Step {
    Grid,
    RelaxedGrid,
    Cover,
}

impl Step {
    fn label(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::RelaxedGrid => "relaxed grid",
            Self::Cover => "cover",
        }
    }
}

pub struct ArtworkPipeline {
    grids: Arc<dyn GridSource>,
    covers: Option<Arc<dyn CoverSource>>,
    fetcher: Arc<dyn ImageFetcher>,
    compositor: Arc<dyn Compositor>,
}

impl ArtworkPipeline {
    pub fn new(
        grids: Arc<dyn GridSource>,
        covers: Option<Arc<dyn CoverSource>>,
        fetcher: Arc<dyn ImageFetcher>,
        compositor: Arc<dyn Compositor>,
    ) -> Self {
        Self {
            grids,
            covers,
            fetcher,
            compositor,
        }
    }

    /// Resolve every task, at most `jobs` at a time.
    ///
    /// Tasks come back in input order with the run tally.
    pub async fn run(&self, tasks: Vec<GridImageTask>, jobs: usize) -> (Vec<GridImageTask>, RunTally) {
        let done: Vec<GridImageTask> = stream::iter(tasks)
            .map(|task| self.resolve(task))
            .buffered(jobs.max(1))
            .collect()
            .await;

        let mut tally = RunTally::default();
        for task in &done {
            tally.record(task);
        }
        (done, tally)
    }

    /// Drive one task to a terminal state
    pub async fn resolve(&self, mut task: GridImageTask) -> GridImageTask {
        if task.status().is_terminal() {
            return task;
        }

        let name = task.record.display_name.clone();
        let app_id = task.record.app_id;

        if target_exists(&task.target_path).await {
            info!(app_id, %name, "grid image already exists");
            task.already_present = true;
            settle(&mut task, TaskStatus::Found);
            return task;
        }

        let status = match self.run_chain(&mut task).await {
            Ok(status) => status,
            Err(e) => {
                error!(app_id, %name, error = %e, "could not produce grid image");
                task.failure = Some(e.to_string());
                TaskStatus::Failed
            }
        };

        match status {
            TaskStatus::Found => info!(app_id, %name, "grid image downloaded"),
            TaskStatus::FoundAlternate => info!(app_id, %name, "alternative grid image downloaded"),
            TaskStatus::Synthesized => info!(app_id, %name, "custom grid image created"),
            _ => warn!(app_id, %name, "no grid image found"),
        }

        settle(&mut task, status);
        task
    }

    async fn run_chain(&self, task: &mut GridImageTask) -> Result<TaskStatus, ArtworkError> {
        let title = task.record.search_title();
        let mut game_id = None;

        match self.library_grid(&title, &mut game_id).await {
            Ok(bytes) => {
                write_target(&task.target_path, bytes).await?;
                return Ok(TaskStatus::Found);
            }
            Err(e) => note_miss(task, Step::Grid, e),
        }

        match self.any_grid(&title, game_id).await {
            Ok(bytes) => {
                write_target(&task.target_path, bytes).await?;
                return Ok(TaskStatus::FoundAlternate);
            }
            Err(e) => note_miss(task, Step::RelaxedGrid, e),
        }

        match self.cover(&title).await {
            Ok(cover) => {
                let png = self.compose(cover, title).await?;
                write_target(&task.target_path, png).await?;
                Ok(TaskStatus::Synthesized)
            }
            Err(e) => {
                note_miss(task, Step::Cover, e);
                Ok(TaskStatus::Failed)
            }
        }
    }

    async fn first_game(&self, title: &str) -> Result<u64, SourceError> {
        let ids = self.grids.search_title(title).await?;
        first_or_miss(ids, "no SteamGridDB title match")
    }

    async fn grid_bytes(&self, game_id: u64, dimensions: &[Dimensions]) -> Result<Vec<u8>, SourceError> {
        let urls = self.grids.grid_urls(game_id, dimensions).await?;
        let url = first_or_miss(urls, "no SteamGridDB grid images")?;
        self.fetcher.fetch(&url).await
    }

    /// Step 1: title match, library-sized grid only
    async fn library_grid(&self, title: &str, game_id: &mut Option<u64>) -> Result<Vec<u8>, SourceError> {
        let id = self.first_game(title).await?;
        *game_id = Some(id);
        self.grid_bytes(id, &LIBRARY_GRID_SIZES).await
    }

    /// Step 2: no size filter; re-search only if step 1 never matched
    async fn any_grid(&self, title: &str, game_id: Option<u64>) -> Result<Vec<u8>, SourceError> {
        let id = match game_id {
            Some(id) => id,
            None => self.first_game(title).await?,
        };
        self.grid_bytes(id, &[]).await
    }

    /// Step 3: first cover-bearing hit from the cover source
    async fn cover(&self, title: &str) -> Result<Vec<u8>, SourceError> {
        let covers = self
            .covers
            .as_ref()
            .ok_or_else(|| SourceError::miss("no cover source configured"))?;

        let candidates = covers.search(title).await?;
        let (slug, cover_id) = candidates
            .into_iter()
            .find_map(|c| c.cover_id.map(|id| (c.slug, id)))
            .ok_or_else(|| SourceError::miss("no cover on any IGDB match"))?;

        debug!(%slug, cover_id, "using IGDB cover");
        let url = covers.cover_url(cover_id).await?;
        self.fetcher.fetch(&url).await
    }

    /// Compose off the async runtime; image work is CPU-bound
    async fn compose(&self, cover: Vec<u8>, title: String) -> Result<Vec<u8>, ArtworkError> {
        let compositor = Arc::clone(&self.compositor);
        tokio::task::spawn_blocking(move || compositor.compose(&cover, &title)).await?
    }
}

fn settle(task: &mut GridImageTask, status: TaskStatus) {
    if let Err(e) = task.settle(status) {
        warn!(app_id = task.record.app_id, error = %e, "ignoring repeated transition");
    }
}

/// Log a step's miss; misses are expected, transport failures are not
fn note_miss(task: &mut GridImageTask, step: Step, error: SourceError) {
    let app_id = task.record.app_id;
    let name = &task.record.display_name;
    if error.is_transport() {
        warn!(app_id, %name, step = step.label(), %error, "lookup failed, falling back");
    } else {
        info!(app_id, %name, step = step.label(), %error, "lookup missed, falling back");
    }
    task.failure = Some(format!("{}: {error}", step.label()));
}

async fn target_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Write the target off the async runtime
async fn write_target(path: &Path, bytes: Vec<u8>) -> Result<(), ArtworkError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_atomic(&path, &bytes)).await?
}

/// Write through a uniquely named `.part` file in the grid folder, then
/// rename over the target.
///
/// A partial write never looks like a cached image, and two tasks with the
/// same target each rename their own file. The temp file is removed on
/// any error.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ArtworkError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| ArtworkError::write(parent, e))?;

    let mut partial = tempfile::Builder::new()
        .prefix(".gridfill-")
        .suffix(".part")
        .tempfile_in(parent)
        .map_err(|e| ArtworkError::write(parent, e))?;

    partial
        .write_all(bytes)
        .and_then(|()| partial.as_file().sync_all())
        .map_err(|e| ArtworkError::write(partial.path(), e))?;

    // Rename replaces an existing target, so the last writer wins
    partial
        .persist(path)
        .map_err(|e| ArtworkError::write(path, e.error))?;
    Ok(())
}
