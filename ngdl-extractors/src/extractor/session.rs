//! Thin request layer shared by every stage of an extractor.
//!
//! A [`Session`] owns the HTTP client and its cookie jar, and spaces requests out by
//! the configured interval. Requests never fail on an error status; callers decide
//! whether a 4xx/5xx is fatal through [`Page::error_for_status`].
use std::sync::Arc;
use std::time::Duration;

use ngdl_common::client;
use ngdl_common::log::debug;
use ngdl_common::serde::{de::DeserializeOwned, Serialize};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::error::ExtractorError;
use crate::extractor_config::SiteConfig;

/// Request headers as `(name, value)` pairs.
pub type Headers<'a> = [(&'a str, String)];

/// A fully read response.
#[derive(Debug, Clone)]
pub struct Page {
    pub status: StatusCode,
    /// Final URL, after following redirects.
    pub url: Url,
    /// Whether at least one redirect was followed.
    pub redirected: bool,
    pub body: String,
}

impl Page {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ExtractorError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.status.is_client_error() || self.status.is_server_error()
    }

    pub fn error_for_status(self) -> Result<Self, ExtractorError> {
        if self.is_error() {
            return Err(ExtractorError::HttpStatus {
                status: self.status.as_u16(),
                url: self.url.to_string(),
            });
        }
        Ok(self)
    }
}

#[derive(Debug)]
pub struct Session {
    client: Client,
    jar: Arc<Jar>,
    interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl Session {
    pub fn new(site: &SiteConfig) -> Result<Self, ExtractorError> {
        let jar = Arc::new(Jar::default());
        let client = client!(site.user_agent.as_str(), jar.clone())?;

        Ok(Self {
            client,
            jar,
            interval: site.request_interval(),
            last_request: Mutex::new(None),
        })
    }

    /// Returns the used client for external use.
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    pub async fn get(&self, url: &str, headers: &Headers<'_>) -> Result<Page, ExtractorError> {
        self.send(with_headers(self.client.get(url), headers)).await
    }

    pub async fn get_query<Q>(
        &self,
        url: &str,
        query: &Q,
        headers: &Headers<'_>,
    ) -> Result<Page, ExtractorError>
    where
        Q: Serialize + ?Sized,
    {
        self.send(with_headers(self.client.get(url), headers).query(query))
            .await
    }

    pub async fn post_form<F>(
        &self,
        url: &str,
        form: &F,
        headers: &Headers<'_>,
    ) -> Result<Page, ExtractorError>
    where
        F: Serialize + ?Sized,
    {
        self.send(with_headers(self.client.post(url), headers).form(form))
            .await
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Page, ExtractorError> {
        let request = builder.build()?;
        let requested = request.url().clone();

        self.debounce().await;
        debug!("{} {}", request.method(), requested);

        let response = self.client.execute(request).await?;
        let status = response.status();
        let url = response.url().clone();
        let redirected = url != requested;
        if redirected {
            debug!("Redirected to {url}");
        }

        Ok(Page {
            status,
            url,
            redirected,
            body: response.text().await?,
        })
    }

    async fn debounce(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                let wait = self.interval - elapsed;
                debug!("Debouncing API calls by {} ms", wait.as_millis());
                sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Cookies the jar would send to `url`, as `(name, value)` pairs.
    pub fn cookies(&self, url: &str) -> Vec<(String, String)> {
        let Ok(url) = Url::parse(url) else {
            return Vec::new();
        };
        let Some(header) = self.jar.cookies(&url) else {
            return Vec::new();
        };
        header
            .to_str()
            .unwrap_or_default()
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    /// Whether every cookie in `names` would be sent to `url`.
    pub fn has_cookies(&self, url: &str, names: &[String]) -> bool {
        let present = self.cookies(url);
        !names.is_empty()
            && names
                .iter()
                .all(|name| present.iter().any(|(key, _)| key == name))
    }

    /// Inserts cookies for `domain`. Hosts outside that domain get host-only cookies.
    pub fn set_cookies(&self, url: &str, domain: &str, cookies: &[(String, String)]) {
        let Ok(url) = Url::parse(url) else {
            return;
        };
        let in_domain = url
            .host_str()
            .is_some_and(|host| host.ends_with(domain.trim_start_matches('.')));

        for (name, value) in cookies {
            let cookie = if in_domain {
                format!("{name}={value}; Domain={domain}; Path=/")
            } else {
                format!("{name}={value}; Path=/")
            };
            self.jar.add_cookie_str(&cookie, &url);
        }
    }
}

fn with_headers(mut builder: RequestBuilder, headers: &Headers<'_>) -> RequestBuilder {
    for (name, value) in headers {
        builder = builder.header(*name, value.as_str());
    }
    builder
}

#[cfg(test)]
mod test {
    use super::*;

    fn local_site() -> SiteConfig {
        SiteConfig {
            request_interval: 0.0,
            ..SiteConfig::default()
        }
    }

    #[test]
    fn cookie_roundtrip_through_jar() {
        let session = Session::new(&local_site()).unwrap();
        let root = "https://www.newgrounds.com";
        let names = vec!["NG_GG_username".to_string(), "vmk1du5I8m".to_string()];

        assert!(!session.has_cookies(root, &names));

        session.set_cookies(
            root,
            ".newgrounds.com",
            &[
                ("NG_GG_username".into(), "tomfulp".into()),
                ("vmk1du5I8m".into(), "abc".into()),
            ],
        );

        assert!(session.has_cookies(root, &names));
        // Domain cookies reach user subdomains too
        assert!(session.has_cookies("https://tomfulp.newgrounds.com/favorites", &names));
    }

    #[test]
    fn error_status_is_reported() {
        let page = Page {
            status: StatusCode::NOT_FOUND,
            url: Url::parse("https://www.newgrounds.com/portal/view/1").unwrap(),
            redirected: false,
            body: String::new(),
        };
        assert!(page.is_error());
        assert!(matches!(
            page.error_for_status(),
            Err(ExtractorError::HttpStatus { status: 404, .. })
        ));
    }
}
