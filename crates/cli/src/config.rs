use anyhow::{Context as AnyhowContext, Result};
use std::env;
use std::path::PathBuf;

pub(crate) const DATA_DIR_ENV: &str = "POCKET_DATA_DIR";
pub(crate) const PORT_ENV: &str = "PORT";
pub(crate) const BASE_URL_ENV: &str = "POCKET_BASE_URL";

pub(crate) const DEFAULT_DATA_DIR: &str = "data";
pub(crate) const DEFAULT_BIND_HOST: &str = "127.0.0.1";
pub(crate) const DEFAULT_PORT: u16 = 5000;

fn env_nonempty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `--data-dir`, then `POCKET_DATA_DIR`, then `./data`.
pub(crate) fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| env_nonempty(DATA_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// `--bind` wins; otherwise the default host on `PORT` (or 5000).
pub(crate) fn resolve_bind(flag: Option<String>) -> Result<String> {
    if let Some(bind) = flag {
        return Ok(bind);
    }
    bind_for_port(env_nonempty(PORT_ENV).as_deref())
}

fn bind_for_port(port: Option<&str>) -> Result<String> {
    let port = match port {
        Some(raw) => raw
            .parse::<u16>()
            .with_context(|| format!("{PORT_ENV} must be a port number, got '{raw}'"))?,
        None => DEFAULT_PORT,
    };
    Ok(format!("{DEFAULT_BIND_HOST}:{port}"))
}

pub(crate) fn resolve_base_url(flag: Option<String>) -> Option<String> {
    flag.or_else(|| env_nonempty(BASE_URL_ENV))
}
