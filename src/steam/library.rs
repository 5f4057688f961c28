use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{LibraryError, ParseError};
use crate::shortcuts::parser;
use crate::shortcuts::record::ShortcutRecord;

/// Shortcuts store, relative to an account directory
const SHORTCUTS_FILE: &str = "shortcuts.vdf";

/// Image format Steam looks for in the grid folder
const GRID_EXTENSION: &str = "png";

/// Shortcuts recovered from one account's store
#[derive(Debug, Default)]
pub struct AccountShortcuts {
    pub owner_user_id: String,
    pub records: Vec<ShortcutRecord>,
    /// Records that were skipped, in file order
    pub malformed: Vec<ParseError>,
}

/// A Steam installation on disk.
///
/// Layout used:
/// - `<root>/userdata/<account>/config/shortcuts.vdf`
/// - `<root>/userdata/<account>/config/grid/<appid>.png`
pub struct SteamLibrary {
    root: PathBuf,
}

impl SteamLibrary {
    /// Use an explicit Steam root without checking the default locations
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Find the Steam root.
    ///
    /// An explicit path wins. Otherwise the first platform default that
    /// has a `userdata` directory is used.
    pub fn locate(explicit: Option<PathBuf>) -> Result<Self, LibraryError> {
        if let Some(root) = explicit {
            if !root.is_dir() {
                return Err(LibraryError::SteamRootNotFound {
                    tried: root.display().to_string(),
                });
            }
            return Ok(Self::at(root));
        }

        let candidates = Self::candidate_roots();
        for candidate in &candidates {
            if candidate.join("userdata").is_dir() {
                debug!(root = %candidate.display(), "found Steam installation");
                return Ok(Self::at(candidate));
            }
        }

        Err(LibraryError::SteamRootNotFound {
            tried: candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    /// Default install locations for the current platform
    fn candidate_roots() -> Vec<PathBuf> {
        let home = dirs::home_dir();

        if cfg!(target_os = "windows") {
            vec![PathBuf::from(r"C:\Program Files (x86)\Steam")]
        } else if cfg!(target_os = "macos") {
            home.map(|h| vec![h.join("Library/Application Support/Steam")])
                .unwrap_or_default()
        } else {
            home.map(|h| vec![h.join(".steam/steam"), h.join(".local/share/Steam")])
                .unwrap_or_default()
        }
    }

    /// Get the Steam root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn userdata_dir(&self) -> PathBuf {
        self.root.join("userdata")
    }

    fn config_dir(&self, account: &str) -> PathBuf {
        self.userdata_dir().join(account).join("config")
    }

    /// Numeric account directories under `userdata/`, sorted
    pub fn accounts(&self) -> Result<Vec<String>, LibraryError> {
        let userdata = self.userdata_dir();
        let mut accounts = Vec::new();

        for entry in WalkDir::new(&userdata).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| userdata.clone());
                LibraryError::io(path, e.into())
            })?;

            // Skip stray files next to account folders
            if !entry.file_type().is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()) {
                accounts.push(name.into_owned());
            }
        }

        accounts.sort();
        Ok(accounts)
    }

    /// Path of an account's shortcuts store
    pub fn shortcuts_path(&self, account: &str) -> PathBuf {
        self.config_dir(account).join(SHORTCUTS_FILE)
    }

    /// Folder Steam reads custom grid images from
    pub fn grid_dir(&self, account: &str) -> PathBuf {
        self.config_dir(account).join("grid")
    }

    /// Where the grid image for a shortcut goes (doesn't create anything)
    pub fn grid_image_path(&self, record: &ShortcutRecord) -> PathBuf {
        self.grid_dir(&record.owner_user_id)
            .join(format!("{}.{}", record.app_id, GRID_EXTENSION))
    }

    /// Parse one account's shortcuts store.
    ///
    /// A missing store just means the account has no shortcuts.
    pub fn load_shortcuts(&self, account: &str) -> Result<AccountShortcuts, LibraryError> {
        let path = self.shortcuts_path(account);

        // Read the whole store; it is small
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(account, "no shortcuts store");
                return Ok(AccountShortcuts {
                    owner_user_id: account.to_string(),
                    ..Default::default()
                });
            }
            Err(e) => return Err(LibraryError::io(path, e)),
        };

        let mut loaded = AccountShortcuts {
            owner_user_id: account.to_string(),
            ..Default::default()
        };

        // Keep good records, set aside the rest
        for result in parser::parse(&data) {
            match result {
                Ok(raw) => {
                    debug!(account, offset = raw.offset, "parsed shortcut");
                    loaded.records.push(raw.into_record(account));
                }
                Err(error) => {
                    warn!(account, %error, "skipping shortcut");
                    loaded.malformed.push(error);
                }
            }
        }

        debug!(
            account,
            shortcuts = loaded.records.len(),
            malformed = loaded.malformed.len(),
            "loaded shortcuts store"
        );
        Ok(loaded)
    }

    /// Load shortcuts for every account, or just `only` when given
    pub fn load_all(&self, only: Option<&str>) -> Result<Vec<AccountShortcuts>, LibraryError> {
        let accounts = match only {
            Some(account) => vec![account.to_string()],
            None => self.accounts()?,
        };

        accounts
            .iter()
            .map(|account| self.load_shortcuts(account))
            .collect()
    }
}

impl std::fmt::Debug for SteamLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SteamLibrary")
            .field("root", &self.root)
            .finish()
    }
}
