use std::{
    env,
    fs::create_dir_all,
    io,
    path::{Path, PathBuf},
};

// Public Exports
pub use ahash;
pub use chrono;
pub use log;
pub use serde;
pub use serde_json;

use directories::ProjectDirs;

use log::debug;

pub mod macros;
pub mod post;
pub mod text;

/// Root of the main website. Every post page lives under it.
pub const NEWGROUNDS_ROOT: &str = "https://www.newgrounds.com";

/// Generates the user-agent used for every request made by the extractors.
///
/// It will always follow the version declared inside ```Cargo.toml```
#[inline]
#[must_use]
pub fn user_agent() -> String {
    let ua = format!("Rust Newgrounds Downloader/{}", env!("CARGO_PKG_VERSION"));
    debug!("Using user-agent: {}", ua);
    ua
}

/// Returns a `PathBuf` pointing to the login cache directory.
///
/// This is XDG-compliant and saves cache files to
/// `$XDG_CACHE_HOME/newgrounds-downloader` on Linux or
/// `%LOCALAPPDATA%/newgrounds-downloader` on Windows
///
/// Or you can set the env var `NGDL_CACHE_DIR` to point it to a custom location.
#[inline]
pub fn auth_cache_dir() -> Result<PathBuf, io::Error> {
    resolve_dir("NGDL_CACHE_DIR", |dirs| dirs.cache_dir().to_path_buf())
}

/// Returns a `PathBuf` pointing to the directory holding `config.toml`.
///
/// Can be overridden with the env var `NGDL_CONFIG_DIR`.
#[inline]
pub fn config_dir() -> Result<PathBuf, io::Error> {
    resolve_dir("NGDL_CONFIG_DIR", |dirs| dirs.config_dir().to_path_buf())
}

fn resolve_dir<F>(env_key: &str, pick: F) -> Result<PathBuf, io::Error>
where
    F: FnOnce(&ProjectDirs) -> PathBuf,
{
    let path = match env::var(env_key) {
        Ok(custom) => PathBuf::from(custom),
        Err(_) => {
            let Some(dirs) = ProjectDirs::from("com", "newgrounds-downloader", "newgrounds-downloader")
            else {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    "no valid home directory found",
                ));
            };
            pick(&dirs)
        }
    };

    let folder = Path::new(&path);

    if !folder.exists() {
        create_dir_all(folder)?;
    }

    Ok(folder.to_path_buf())
}
