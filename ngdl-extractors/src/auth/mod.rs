//! Account login and the persistent cache of session cookies it produces.
use ngdl_common::headers;
use ngdl_common::log::{debug, info};
use ngdl_common::serde::{self, Deserialize, Serialize};
use ngdl_common::text;
use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::error::ExtractorError;
use crate::extractor::session::Session;
use crate::extractor_config::SiteConfig;

mod cache;

pub use cache::{FileLoginCache, LoginCache, MemoryLoginCache};

/// How long a successful login is reused before logging in again.
pub const LOGIN_CACHE_TTL: Duration = Duration::from_secs(360 * 24 * 60 * 60);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AuthState {
    Authenticated,
    NotAuthenticated,
}

impl AuthState {
    #[inline]
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        match self {
            Self::Authenticated => true,
            Self::NotAuthenticated => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    /// The login form was submitted but the server did not accept it.
    #[error("Invalid username or password")]
    InvalidLogin,

    /// The passport page did not contain a login form.
    #[error("Unable to find the login form")]
    MissingLoginForm,

    /// Indicates any unrecoverable IO error when reading or writing the login cache.
    #[error("Failed to access login cache. error: {source}")]
    CacheIOError {
        #[from]
        source: io::Error,
    },

    /// Indicates a failed attempt to serialize the login cache to `bincode`.
    #[error("Failed to encode login cache")]
    CacheEncodeError,
}

/// Session cookies obtained from a successful login, as `(name, value)` pairs.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(crate = "self::serde")]
pub struct SessionCookies(pub Vec<(String, String)>);

impl SessionCookies {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Logs in through the site's passport form and returns the resulting session cookies.
///
/// A session that is already valid gets redirected straight to the `/social` page, in
/// which case the cookies already in the jar are returned as-is.
pub async fn login(
    session: &Session,
    site: &SiteConfig,
    username: &str,
    password: &str,
) -> Result<SessionCookies, ExtractorError> {
    info!("Logging in as {}", username);

    let passport = format!("{}/passport/", site.root);
    let page = session.get(&passport, &[]).await?.error_for_status()?;

    if page.redirected && page.url.as_str().ends_with("/social") {
        debug!("Session already valid");
        return Ok(SessionCookies(session.cookies(&site.root)));
    }

    let action = text::extr(&page.body, "action=\"", "\"");
    if action.is_empty() {
        return Err(Error::MissingLoginForm.into());
    }
    let action = text::urljoin(&site.root, &text::unescape(action));
    let auth = text::extr(&page.body, "name=\"auth\" value=\"", "\"");

    let headers = headers! {
        "Origin" => site.root,
        "Referer" => passport,
    };
    let form = [
        ("username", username),
        ("password", password),
        ("remember", "1"),
        ("login", "1"),
        ("auth", auth),
    ];

    let response = session.post_form(&action, &form, &headers).await?;
    if !response.redirected {
        return Err(Error::InvalidLogin.into());
    }

    let cookies = SessionCookies(session.cookies(&site.root));
    debug!("Login returned {} cookies", cookies.0.len());
    Ok(cookies)
}
