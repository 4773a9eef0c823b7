use anyhow::{bail, Result};
use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};
use tracing::{info, warn};

/// Which remote store backs the roster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteBackend {
    Sqlite { database_url: String },
    Postgrest { base_url: String, api_key: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub remote: RemoteBackend,
    pub cache_path: PathBuf,
    pub remote_timeout: Duration,
    pub auto_persist: bool,
    pub cors_origin: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let remote = match lookup("ATTENDANCE_REMOTE").as_deref().unwrap_or("sqlite") {
            "sqlite" => RemoteBackend::Sqlite {
                database_url: lookup("ATTENDANCE_DATABASE_URL")
                    .unwrap_or_else(|| "sqlite:attendance.db".to_string()),
            },
            "postgrest" => {
                let (Some(base_url), Some(api_key)) =
                    (lookup("ATTENDANCE_REMOTE_URL"), lookup("ATTENDANCE_REMOTE_KEY"))
                else {
                    bail!("ATTENDANCE_REMOTE=postgrest needs ATTENDANCE_REMOTE_URL and ATTENDANCE_REMOTE_KEY");
                };
                RemoteBackend::Postgrest { base_url, api_key }
            }
            other => bail!("Unknown ATTENDANCE_REMOTE {:?}, expected sqlite or postgrest", other),
        };

        let timeout_ms: u64 = try_load(&lookup, "ATTENDANCE_REMOTE_TIMEOUT_MS", 5000);

        Ok(Self {
            port: try_load(&lookup, "ATTENDANCE_PORT", 3000),
            remote,
            cache_path: lookup("ATTENDANCE_CACHE_PATH")
                .unwrap_or_else(|| "attendance_cache.json".to_string())
                .into(),
            remote_timeout: Duration::from_millis(timeout_ms),
            auto_persist: try_load(&lookup, "ATTENDANCE_AUTO_PERSIST", true),
            cors_origin: lookup("ATTENDANCE_CORS_ORIGIN")
                .unwrap_or_else(|| "http://localhost:8080".to_string()),
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(
            config.remote,
            RemoteBackend::Sqlite {
                database_url: "sqlite:attendance.db".to_string()
            }
        );
        assert_eq!(config.cache_path, PathBuf::from("attendance_cache.json"));
        assert_eq!(config.remote_timeout, Duration::from_secs(5));
        assert!(config.auto_persist);
        assert_eq!(config.cors_origin, "http://localhost:8080");
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("ATTENDANCE_PORT", "not-a-port"),
            ("ATTENDANCE_AUTO_PERSIST", "false"),
            ("ATTENDANCE_REMOTE_TIMEOUT_MS", "250"),
        ])
        .unwrap();
        assert_eq!(config.port, 3000);
        assert!(!config.auto_persist);
        assert_eq!(config.remote_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_postgrest_needs_url_and_key() {
        assert!(config_from(&[("ATTENDANCE_REMOTE", "postgrest")]).is_err());
        assert!(config_from(&[("ATTENDANCE_REMOTE", "mongo")]).is_err());

        let config = config_from(&[
            ("ATTENDANCE_REMOTE", "postgrest"),
            ("ATTENDANCE_REMOTE_URL", "https://project.example"),
            ("ATTENDANCE_REMOTE_KEY", "anon-key"),
        ])
        .unwrap();
        assert_eq!(
            config.remote,
            RemoteBackend::Postgrest {
                base_url: "https://project.example".to_string(),
                api_key: "anon-key".to_string()
            }
        );
    }
}
