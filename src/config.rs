use std::{env, path::PathBuf};
use tracing::{info, warn};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/state.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
}

impl Config {
    /// Reads `PORT` and `APP_DATA_PATH`, falling back to defaults.
    pub fn load() -> Self {
        Self {
            port: load_port(env::var("PORT").ok()),
            data_path: resolve_data_path(env::var("APP_DATA_PATH").ok()),
        }
    }
}

fn load_port(raw: Option<String>) -> u16 {
    match raw {
        Some(value) => value.trim().parse().unwrap_or_else(|err| {
            warn!("invalid PORT value {value:?}: {err}, using {DEFAULT_PORT}");
            DEFAULT_PORT
        }),
        None => {
            info!("PORT not set, using default: {DEFAULT_PORT}");
            DEFAULT_PORT
        }
    }
}

fn resolve_data_path(raw: Option<String>) -> PathBuf {
    match raw {
        Some(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_DATA_PATH),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_falls_back_on_garbage() {
        assert_eq!(load_port(Some("9090".into())), 9090);
        assert_eq!(load_port(Some("http".into())), DEFAULT_PORT);
        assert_eq!(load_port(None), DEFAULT_PORT);
    }

    #[test]
    fn blank_data_path_uses_default() {
        assert_eq!(resolve_data_path(Some("  ".into())), PathBuf::from(DEFAULT_DATA_PATH));
        assert_eq!(
            resolve_data_path(Some("/tmp/shifts.json".into())),
            PathBuf::from("/tmp/shifts.json")
        );
    }
}
