//! The extractor proper: turns a [`Target`] into a lazy stream of [`Message`]s.
//! # Extractors
//!
//! An extractor resolves the listing behind its target page by page, parses every post
//! it finds and emits, per post, one [`Message::Directory`] followed by one
//! [`Message::Url`] per downloadable file. Profile and following listings instead emit
//! [`Message::Queue`] entries, which the caller feeds back into a new extractor.
//!
#![deny(clippy::nursery)]
use async_stream::try_stream;
use futures::stream::{self, BoxStream};
use futures::{pin_mut, StreamExt};
use ngdl_common::headers;
use ngdl_common::log::{debug, info, warn};
use ngdl_common::post::{FileItem, PostRecord, PostType};
use ngdl_common::serde_json::{Map, Value};
use ngdl_common::text::TextCursor;
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::auth::{self, AuthState, LoginCache, LOGIN_CACHE_TTL};
use crate::dispatch::{GalleryKind, Target};
use crate::error::ExtractorError;
use crate::extractor_config::{ExtractorOptions, SiteConfig};
use crate::pagination::{self, FavoriteEntries};
use crate::{fanout, parser};

use self::session::Session;

pub mod session;

/// What an extractor hands back to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Post level metadata, emitted once before the post's files.
    Directory(PostRecord),
    /// One downloadable file.
    Url(FileItem),
    /// Another listing to run through its own extractor.
    Queue { url: String, target: Target },
}

/// Common public interface of a site extractor.
pub trait Extractor {
    /// Site the extractor talks to.
    fn category(&self) -> &str;

    /// Kind of listing being extracted.
    fn subcategory(&self) -> &'static str;

    /// Lazily walks the listing. Nothing is requested until the stream is polled.
    fn items(&self) -> BoxStream<'_, Result<Message, ExtractorError>>;

    /// Returns the used client for external use.
    fn client(&self) -> Client;
}

pub struct NewgroundsExtractor {
    target: Target,
    site: SiteConfig,
    options: ExtractorOptions,
    session: Session,
    login_cache: Option<Arc<dyn LoginCache>>,
    login_attempted: AtomicBool,
}

impl NewgroundsExtractor {
    pub fn new(
        target: Target,
        site: SiteConfig,
        options: ExtractorOptions,
    ) -> Result<Self, ExtractorError> {
        let session = Session::new(&site)?;
        debug!("New {} extractor for {}", target.subcategory(), target.url(&site));

        Ok(Self {
            target,
            site,
            options,
            session,
            login_cache: None,
            login_attempted: AtomicBool::new(false),
        })
    }

    /// Dispatches `url` and builds the extractor for it.
    pub fn from_url(
        url: &str,
        site: SiteConfig,
        options: ExtractorOptions,
    ) -> Result<Self, ExtractorError> {
        Self::new(Target::from_url(url)?, site, options)
    }

    /// Reuses and stores login results in `cache`.
    #[must_use]
    pub fn with_login_cache(mut self, cache: Arc<dyn LoginCache>) -> Self {
        self.login_cache = Some(cache);
        self
    }

    pub const fn target(&self) -> &Target {
        &self.target
    }

    pub const fn site(&self) -> &SiteConfig {
        &self.site
    }

    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// User the listing belongs to, if any.
    pub fn user(&self) -> &str {
        self.target.user()
    }

    /// Metadata merged into every record of this listing.
    pub fn metadata(&self) -> Map<String, Value> {
        let mut metadata = Map::new();
        if let Target::Search { query, .. } = &self.target {
            let terms = query.get("terms").cloned().unwrap_or_default();
            metadata.insert(String::from("search_tags"), Value::String(terms));
        }
        metadata
    }

    /// Makes sure the session is logged in, when credentials are configured.
    ///
    /// Only the first call does any work. A session that already carries all the
    /// login cookies is left alone.
    pub async fn login(&self) -> Result<AuthState, ExtractorError> {
        if self.session.has_cookies(&self.site.root, &self.site.cookies_names) {
            return Ok(AuthState::Authenticated);
        }
        if self.login_attempted.swap(true, Ordering::SeqCst) {
            return Ok(AuthState::NotAuthenticated);
        }

        let Some(username) = self.options.username.as_deref().filter(|u| !u.is_empty()) else {
            debug!("No credentials configured, continuing anonymously");
            return Ok(AuthState::NotAuthenticated);
        };

        let cached = self
            .login_cache
            .as_ref()
            .and_then(|cache| cache.get(username))
            .filter(|cookies| !cookies.is_empty());

        let cookies = match cached {
            Some(cookies) => {
                debug!("Using cached login for {username}");
                cookies
            }
            None => {
                let password = self.options.password.as_deref().unwrap_or_default();
                let cookies = auth::login(&self.session, &self.site, username, password).await?;
                if let Some(cache) = &self.login_cache {
                    if let Err(err) = cache.set(username, &cookies, LOGIN_CACHE_TTL) {
                        warn!("Failed to store login for {username}: {err}");
                    }
                }
                cookies
            }
        };

        self.session
            .set_cookies(&self.site.root, &self.site.cookies_domain, &cookies.0);
        Ok(AuthState::Authenticated)
    }

    /// Lazily yields the absolute URL of every post in the listing.
    pub fn posts(&self) -> BoxStream<'_, Result<String, ExtractorError>> {
        let root = self.site.root.as_str();
        match &self.target {
            Target::Image { .. } | Target::Media { .. } => {
                stream::once(futures::future::ready(Ok(self.target.url(&self.site)))).boxed()
            }
            Target::Gallery { user, kind } => {
                pagination::gallery(&self.session, root, self.site.user_root(user), kind.path())
                    .boxed()
            }
            Target::Favorite { user, kind } => {
                let kinds = kind.map_or_else(|| GalleryKind::FAVORITES.to_vec(), |kind| vec![kind]);
                let user_root = self.site.user_root(user);
                stream::iter(kinds)
                    .flat_map(move |kind| {
                        pagination::favorites(
                            &self.session,
                            root,
                            user_root.clone(),
                            kind.path(),
                            FavoriteEntries::Posts,
                        )
                    })
                    .boxed()
            }
            Target::Search { kind, query } => {
                pagination::search(&self.session, root, kind, query.clone()).boxed()
            }
            Target::User { .. } | Target::Following { .. } => stream::empty().boxed(),
        }
    }

    /// Fetches and parses one post page.
    ///
    /// Missing pages (4xx/5xx) produce an empty record, which the caller skips.
    pub async fn extract_post(&self, post_url: &str) -> Result<PostRecord, ExtractorError> {
        let post_type = PostType::from_post_url(post_url);
        let request_url = parser::request_url(post_url, post_type, self.options.flash);

        let page = self.session.get(&request_url, &[]).await?;
        if page.is_error() {
            debug!("{request_url} returned {}", page.status);
            return Ok(PostRecord::default());
        }

        if let Some(message) = parser::age_gate_message(&page.body) {
            warn!("'{message}'");
        }

        let mut cursor = TextCursor::new(&page.body);
        let mut record = match post_type {
            PostType::Image => parser::parse_image(&mut cursor)?,
            PostType::Audio => parser::parse_audio(&mut cursor, post_url),
            PostType::Media => {
                let media = parser::parse_media(&mut cursor, post_url);
                let mut record = media.record;
                if media.needs_sources {
                    let sources = self.video_sources(record.index).await?;
                    let selection = parser::select_format(&sources, self.options.format);
                    parser::apply_selection(&mut record, selection, &page.body);
                }
                record
            }
        };

        parser::parse_common(&mut cursor, &mut record);
        Ok(record.finalize(self.user(), post_url))
    }

    async fn video_sources(&self, index: u64) -> Result<parser::VideoSources, ExtractorError> {
        let url = format!("{}/portal/video/{index}", self.site.root);
        let headers = headers! {
            "Accept" => "application/json, text/javascript, */*; q=0.01",
            "X-Requested-With" => "XMLHttpRequest",
        };
        let response: parser::VideoSourcesResponse = self
            .session
            .get(&url, &headers)
            .await?
            .error_for_status()?
            .json()?;
        Ok(response.sources)
    }

    fn user_queue(&self, user: &str) -> BoxStream<'_, Result<Message, ExtractorError>> {
        let user_root = self.site.user_root(user);
        let messages: Vec<_> = self
            .options
            .include
            .paths()
            .into_iter()
            .filter_map(GalleryKind::from_path)
            .map(|kind| {
                Ok(Message::Queue {
                    url: format!("{user_root}/{kind}"),
                    target: Target::Gallery {
                        user: user.to_string(),
                        kind,
                    },
                })
            })
            .collect();
        stream::iter(messages).boxed()
    }

    fn following_queue<'a>(&'a self, user: &'a str) -> BoxStream<'a, Result<Message, ExtractorError>> {
        let queue = try_stream! {
            let profiles = pagination::favorites(
                &self.session,
                &self.site.root,
                self.site.user_root(user),
                "following",
                FavoriteEntries::Users,
            );
            pin_mut!(profiles);

            while let Some(url) = profiles.next().await {
                let url = url?;
                match Target::find(&url) {
                    Some(target @ Target::User { .. }) => {
                        yield Message::Queue { url, target };
                    }
                    _ => debug!("Skipping unrecognized profile {url}"),
                }
            }
        };
        queue.boxed()
    }

    fn post_items(&self) -> BoxStream<'_, Result<Message, ExtractorError>> {
        let items = try_stream! {
            self.login().await?;
            let metadata = self.metadata();

            let posts = self.posts();
            pin_mut!(posts);

            while let Some(post_url) = posts.next().await {
                let post_url = post_url?;

                let mut post = match self.extract_post(&post_url).await {
                    Ok(post) => post,
                    Err(err) => {
                        debug!("Failed to extract {post_url}: {err}");
                        PostRecord::default()
                    }
                };

                if !post.has_url() {
                    warn!("Unable to get download URL for '{post_url}'");
                    continue;
                }

                post.merge_metadata(&metadata);
                let primary = post.primary_file();
                let embedded = fanout::embedded_files(&post, &primary.post.extension);
                debug!("{post:?}");

                yield Message::Directory(post);
                yield Message::Url(primary);
                for file in embedded {
                    yield Message::Url(file);
                }
            }
        };
        items.boxed()
    }
}

impl Extractor for NewgroundsExtractor {
    fn category(&self) -> &str {
        &self.site.name
    }

    fn subcategory(&self) -> &'static str {
        self.target.subcategory()
    }

    fn items(&self) -> BoxStream<'_, Result<Message, ExtractorError>> {
        info!("Extracting {} from {}", self.subcategory(), self.target.url(&self.site));
        match &self.target {
            Target::User { user } => self.user_queue(user),
            Target::Following { user } => self.following_queue(user),
            _ => self.post_items(),
        }
    }

    fn client(&self) -> Client {
        self.session.client()
    }
}
