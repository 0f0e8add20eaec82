//! Configuration utilities (ports, data paths, client endpoints, env vars)

use std::{env, net::{Ipv4Addr, SocketAddr}};
use std::path::PathBuf;
use std::time::Duration;

/// Socket address to bind the server to.
///
/// Reads the `PORT` env var or defaults to 3000, binds to 0.0.0.0.
pub fn server_addr() -> SocketAddr {
    let port = env_parse::<u16>("PORT").unwrap_or(3000);
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}

/// Directory holding `exodia-parts.json` and `user-cards.json`.
pub fn data_dir() -> PathBuf {
    env::var("DATA_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("./data"))
}

/// Directory of card images served at the site root.
pub fn images_dir() -> PathBuf {
    env::var("IMAGES_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("./images"))
}

/// Artificial latency before the catalog endpoint answers. Off unless `CATALOG_DELAY_MS` is set.
pub fn catalog_delay() -> Duration {
    Duration::from_millis(env_parse::<u64>("CATALOG_DELAY_MS").unwrap_or(0))
}

pub fn api_base_url() -> String {
    env::var("EXODIA_API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

pub fn state_file() -> PathBuf {
    env::var("EXODIA_STATE_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./exodia-state.json"))
}

pub fn win_reset_delay() -> Duration {
    Duration::from_millis(env_parse::<u64>("EXODIA_WIN_RESET_MS").unwrap_or(4000))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub data_dir: PathBuf,
    pub images_dir: PathBuf,
    pub catalog_delay: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            addr: server_addr(),
            data_dir: data_dir(),
            images_dir: images_dir(),
            catalog_delay: catalog_delay(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub state_file: PathBuf,
    pub win_reset_delay: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self { base_url: api_base_url(), state_file: state_file(), win_reset_delay: win_reset_delay() }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            state_file: PathBuf::from("./exodia-state.json"),
            win_reset_delay: Duration::from_millis(4000),
        }
    }
}
