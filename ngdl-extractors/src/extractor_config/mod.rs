//! Site endpoints and user-facing options for the extractors.
//!
//! [`SiteConfig`] describes *where* requests go; [`ExtractorOptions`] describes *what*
//! the user wants out of them. Both come with sane defaults, and the options can
//! also be read from `config.toml` (see [`serialize`]).
use ngdl_common::serde::{self, Deserialize, Serialize};
use ngdl_common::NEWGROUNDS_ROOT;
use once_cell::sync::Lazy;
use std::fmt::Display;
use std::time::Duration;

pub mod options;
pub mod serialize;

pub use options::{ExtractorOptions, FormatPreference, UserKinds};

pub(crate) const DEFAULT_USER_ROOT: &str = "https://{user}.newgrounds.com";

pub static DEFAULT_SITE: Lazy<SiteConfig> = Lazy::new(|| SiteConfig {
    name: String::from("newgrounds"),
    root: String::from(NEWGROUNDS_ROOT),
    user_root: String::from(DEFAULT_USER_ROOT),
    cookies_domain: String::from(".newgrounds.com"),
    cookies_names: vec![String::from("NG_GG_username"), String::from("vmk1du5I8m")],
    request_interval: 1.0,
    user_agent: ngdl_common::user_agent(),
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(crate = "self::serde")]
pub struct SiteConfig {
    pub name: String,
    /// Main website, hosting post pages, search and the video source endpoint.
    pub root: String,
    /// Per-user subdomain template. `{user}` is replaced by the user name.
    pub user_root: String,
    /// Domain the session cookies are scoped to.
    pub cookies_domain: String,
    /// Cookies that, when all present, mean the session is already logged in.
    pub cookies_names: Vec<String>,
    /// Minimum number of seconds between two requests.
    pub request_interval: f64,
    pub user_agent: String,
}

impl SiteConfig {
    /// Root URL of a user's subdomain, without trailing slash.
    pub fn user_root(&self, user: &str) -> String {
        self.user_root.replace("{user}", user)
    }

    /// Spacing between requests. Negative or non-finite values disable it.
    pub fn request_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.request_interval.max(0.0)).unwrap_or_default()
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        DEFAULT_SITE.clone()
    }
}

impl Display for SiteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
