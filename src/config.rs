//! Environment-driven configuration
//!
//! Empty or whitespace-only values count as unset.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_STEAMGRIDDB_API_URL: &str = "https://www.steamgriddb.com/api/v2";
const DEFAULT_IGDB_API_URL: &str = "https://api.igdb.com/v4";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

const ENV_STEAMGRIDDB_API_KEY: &str = "GRIDFILL_STEAMGRIDDB_API_KEY";
const ENV_STEAMGRIDDB_API_URL: &str = "GRIDFILL_STEAMGRIDDB_API_URL";
const ENV_IGDB_CLIENT_ID: &str = "GRIDFILL_IGDB_CLIENT_ID";
const ENV_IGDB_TOKEN: &str = "GRIDFILL_IGDB_TOKEN";
const ENV_IGDB_API_URL: &str = "GRIDFILL_IGDB_API_URL";
const ENV_REQUEST_TIMEOUT_SECS: &str = "GRIDFILL_REQUEST_TIMEOUT_SECS";
const ENV_STEAM_PATH: &str = "GRIDFILL_STEAM_PATH";
const ENV_FONT_PATH: &str = "GRIDFILL_FONT_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SteamGridDbConfig {
    pub api_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgdbConfig {
    pub api_url: String,
    pub client_id: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridfillConfig {
    pub steamgriddb: SteamGridDbConfig,
    /// None disables the synthesis fallback
    pub igdb: Option<IgdbConfig>,
    pub request_timeout: Duration,
    pub steam_path: Option<PathBuf>,
    pub font_path: Option<PathBuf>,
}

impl GridfillConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any name -> value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let steamgriddb = SteamGridDbConfig {
            api_url: get(ENV_STEAMGRIDDB_API_URL)
                .unwrap_or_else(|| DEFAULT_STEAMGRIDDB_API_URL.to_owned()),
            api_key: get(ENV_STEAMGRIDDB_API_KEY),
        };

        let igdb = match (get(ENV_IGDB_CLIENT_ID), get(ENV_IGDB_TOKEN)) {
            (Some(client_id), Some(token)) => Some(IgdbConfig {
                api_url: get(ENV_IGDB_API_URL).unwrap_or_else(|| DEFAULT_IGDB_API_URL.to_owned()),
                client_id,
                token,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(ENV_IGDB_TOKEN)),
            (None, Some(_)) => return Err(ConfigError::Missing(ENV_IGDB_CLIENT_ID)),
        };

        let request_timeout = get(ENV_REQUEST_TIMEOUT_SECS)
            .map(|raw| {
                let secs = raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                    name: ENV_REQUEST_TIMEOUT_SECS,
                    message: format!("'{raw}' is not a whole number of seconds"),
                })?;
                if secs == 0 {
                    return Err(ConfigError::Invalid {
                        name: ENV_REQUEST_TIMEOUT_SECS,
                        message: "must be greater than zero".to_owned(),
                    });
                }
                Ok(secs)
            })
            .transpose()?
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Ok(Self {
            steamgriddb,
            igdb,
            request_timeout: Duration::from_secs(request_timeout),
            steam_path: get(ENV_STEAM_PATH).map(PathBuf::from),
            font_path: get(ENV_FONT_PATH).map(PathBuf::from),
        })
    }

    /// The SteamGridDB key, which `fetch` cannot run without
    pub fn require_steamgriddb_key(&self) -> Result<&str, ConfigError> {
        self.steamgriddb
            .api_key
            .as_deref()
            .ok_or(ConfigError::Missing(ENV_STEAMGRIDDB_API_KEY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<GridfillConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GridfillConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.steamgriddb.api_url, DEFAULT_STEAMGRIDDB_API_URL);
        assert_eq!(cfg.steamgriddb.api_key, None);
        assert_eq!(cfg.igdb, None);
        assert_eq!(cfg.request_timeout, Duration::from_secs(20));
        assert!(matches!(
            cfg.require_steamgriddb_key(),
            Err(ConfigError::Missing(ENV_STEAMGRIDDB_API_KEY))
        ));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = config(&[(ENV_STEAMGRIDDB_API_KEY, "   "), (ENV_STEAM_PATH, "")]).unwrap();
        assert_eq!(cfg.steamgriddb.api_key, None);
        assert_eq!(cfg.steam_path, None);
    }

    #[test]
    fn igdb_needs_both_halves() {
        assert_eq!(
            config(&[(ENV_IGDB_CLIENT_ID, "abc")]),
            Err(ConfigError::Missing(ENV_IGDB_TOKEN))
        );

        let cfg = config(&[(ENV_IGDB_CLIENT_ID, " abc "), (ENV_IGDB_TOKEN, "tok")]).unwrap();
        let igdb = cfg.igdb.unwrap();
        assert_eq!(igdb.client_id, "abc");
        assert_eq!(igdb.api_url, DEFAULT_IGDB_API_URL);
    }

    #[test]
    fn timeout_must_be_positive_integer() {
        assert!(config(&[(ENV_REQUEST_TIMEOUT_SECS, "0")]).is_err());
        assert!(config(&[(ENV_REQUEST_TIMEOUT_SECS, "soon")]).is_err());
        let cfg = config(&[(ENV_REQUEST_TIMEOUT_SECS, "5")]).unwrap();
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
    }
}
