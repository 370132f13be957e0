//! Maps an input URL to the listing variant that handles it.
//!
//! Patterns are tried in a fixed order and the first match wins. The favorites
//! pattern would also accept `/favorites/following`, so following is tried before it.
use ahash::HashMap;
use ngdl_common::text;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Display;

use crate::error::ExtractorError;
use crate::extractor_config::SiteConfig;

const USER_PATTERN: &str = r"^(?:https?://)?([\w-]+)\.newgrounds\.com";
const BASE_PATTERN: &str = r"^(?:https?://)?(?:www\.)?newgrounds\.com";

static IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?:{BASE_PATTERN}/art/view/([^/?#]+)/([^/?#]+)|^(?:https?://)?art\.ngfiles\.com/images/\d+/\d+_([^_]+)_([^.]+))"
    ))
    .unwrap()
});
static MEDIA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{BASE_PATTERN}(/(?:portal/view|audio/listen)/\d+)")).unwrap()
});
static FOLLOWING: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"{USER_PATTERN}/favorites/following")).unwrap());
static FAVORITE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{USER_PATTERN}/favorites(?:/(art|audio|movies))?/?")).unwrap()
});
static SEARCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{BASE_PATTERN}/search/conduct/([^/?#]+)/?\?([^#]+)")).unwrap()
});
static GALLERY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{USER_PATTERN}/(art|audio|movies|games)/?$")).unwrap()
});
static USER: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"{USER_PATTERN}/?$")).unwrap());

/// Content sections of a user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GalleryKind {
    Art,
    Audio,
    Games,
    Movies,
}

impl GalleryKind {
    /// Kinds a favorites URL without an explicit section walks through, in order.
    pub const FAVORITES: [Self; 3] = [Self::Art, Self::Audio, Self::Movies];

    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            "art" => Some(Self::Art),
            "audio" => Some(Self::Audio),
            "games" => Some(Self::Games),
            "movies" => Some(Self::Movies),
            _ => None,
        }
    }

    pub const fn path(self) -> &'static str {
        match self {
            Self::Art => "art",
            Self::Audio => "audio",
            Self::Games => "games",
            Self::Movies => "movies",
        }
    }
}

impl Display for GalleryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// What an input URL points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A single art post, either its view page or a file on the art CDN.
    Image { user: String, title: String },
    /// A single movie, game or audio post. `path` is relative to the site root.
    Media { path: String },
    Gallery { user: String, kind: GalleryKind },
    /// A bare profile, expanded into one gallery per selected kind.
    User { user: String },
    /// A user's favorites; `None` walks art, audio and movies in turn.
    Favorite {
        user: String,
        kind: Option<GalleryKind>,
    },
    /// Accounts a user follows, each expanded into a profile.
    Following { user: String },
    Search {
        kind: String,
        query: HashMap<String, String>,
    },
}

impl Target {
    /// Tries every pattern in dispatch order and returns the first match.
    pub fn find(url: &str) -> Option<Self> {
        if let Some(caps) = IMAGE.captures(url) {
            let (user, title) = match (caps.get(1), caps.get(2)) {
                (Some(user), Some(title)) => (user, title),
                _ => (caps.get(3)?, caps.get(4)?),
            };
            return Some(Self::Image {
                user: user.as_str().to_string(),
                title: title.as_str().to_string(),
            });
        }

        if let Some(caps) = MEDIA.captures(url) {
            return Some(Self::Media {
                path: caps[1].to_string(),
            });
        }

        if let Some(caps) = FOLLOWING.captures(url) {
            return Some(Self::Following {
                user: caps[1].to_string(),
            });
        }

        if let Some(caps) = FAVORITE.captures(url) {
            return Some(Self::Favorite {
                user: caps[1].to_string(),
                kind: caps.get(2).and_then(|kind| GalleryKind::from_path(kind.as_str())),
            });
        }

        if let Some(caps) = SEARCH.captures(url) {
            return Some(Self::Search {
                kind: caps[1].to_string(),
                query: text::parse_query(&caps[2]),
            });
        }

        if let Some(caps) = GALLERY.captures(url) {
            return Some(Self::Gallery {
                user: caps[1].to_string(),
                kind: GalleryKind::from_path(&caps[2])?,
            });
        }

        USER.captures(url).map(|caps| Self::User {
            user: caps[1].to_string(),
        })
    }

    pub fn from_url(url: &str) -> Result<Self, ExtractorError> {
        Self::find(url).ok_or_else(|| ExtractorError::UnsupportedUrl {
            url: url.to_string(),
        })
    }

    /// Short name of the variant, as used in logs and output paths.
    pub const fn subcategory(&self) -> &'static str {
        match self {
            Self::Image { .. } => "image",
            Self::Media { .. } => "media",
            Self::Gallery { kind, .. } => kind.path(),
            Self::User { .. } => "user",
            Self::Favorite { .. } => "favorite",
            Self::Following { .. } => "following",
            Self::Search { .. } => "search",
        }
    }

    /// User the listing belongs to. Empty for single media posts and searches.
    pub fn user(&self) -> &str {
        match self {
            Self::Image { user, .. }
            | Self::Gallery { user, .. }
            | Self::User { user }
            | Self::Favorite { user, .. }
            | Self::Following { user } => user,
            Self::Media { .. } | Self::Search { .. } => "",
        }
    }

    /// Canonical URL of the listing on `site`.
    pub fn url(&self, site: &SiteConfig) -> String {
        match self {
            Self::Image { user, title } => format!("{}/art/view/{user}/{title}", site.root),
            Self::Media { path } => format!("{}{path}", site.root),
            Self::Gallery { user, kind } => format!("{}/{kind}", site.user_root(user)),
            Self::User { user } => site.user_root(user),
            Self::Favorite { user, kind } => match kind {
                Some(kind) => format!("{}/favorites/{kind}", site.user_root(user)),
                None => format!("{}/favorites", site.user_root(user)),
            },
            Self::Following { user } => format!("{}/favorites/following", site.user_root(user)),
            Self::Search { kind, .. } => format!("{}/search/conduct/{kind}", site.root),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn find(url: &str) -> Target {
        Target::find(url).unwrap_or_else(|| panic!("no match for {url}"))
    }

    #[test]
    fn image_urls() {
        assert_eq!(
            find("https://www.newgrounds.com/art/view/tomfulp/ryu-is-hawt"),
            Target::Image {
                user: "tomfulp".into(),
                title: "ryu-is-hawt".into()
            }
        );
        assert_eq!(
            find("https://art.ngfiles.com/images/0/94_tomfulp_ryu-is-hawt.gif"),
            Target::Image {
                user: "tomfulp".into(),
                title: "ryu-is-hawt".into()
            }
        );
        assert_eq!(
            find("newgrounds.com/art/view/sailoryon/yon-dream-buster").url(&SiteConfig::default()),
            "https://www.newgrounds.com/art/view/sailoryon/yon-dream-buster"
        );
    }

    #[test]
    fn media_urls() {
        assert_eq!(
            find("https://www.newgrounds.com/portal/view/595355"),
            Target::Media {
                path: "/portal/view/595355".into()
            }
        );
        assert_eq!(
            find("https://www.newgrounds.com/audio/listen/609768").subcategory(),
            "media"
        );
    }

    #[test]
    fn user_listings() {
        assert_eq!(
            find("https://tomfulp.newgrounds.com/movies/"),
            Target::Gallery {
                user: "tomfulp".into(),
                kind: GalleryKind::Movies
            }
        );
        assert_eq!(find("https://tomfulp.newgrounds.com/games").subcategory(), "games");
        assert_eq!(
            find("https://tomfulp.newgrounds.com"),
            Target::User {
                user: "tomfulp".into()
            }
        );
        assert_eq!(
            find("https://some-artist.newgrounds.com/"),
            Target::User {
                user: "some-artist".into()
            }
        );
    }

    #[test]
    fn favorites_and_following() {
        assert_eq!(
            find("https://tomfulp.newgrounds.com/favorites/following"),
            Target::Following {
                user: "tomfulp".into()
            }
        );
        assert_eq!(
            find("https://tomfulp.newgrounds.com/favorites/audio"),
            Target::Favorite {
                user: "tomfulp".into(),
                kind: Some(GalleryKind::Audio)
            }
        );
        assert_eq!(
            find("https://tomfulp.newgrounds.com/favorites"),
            Target::Favorite {
                user: "tomfulp".into(),
                kind: None
            }
        );
    }

    #[test]
    fn search_urls() {
        let target = find("https://www.newgrounds.com/search/conduct/art?terms=tree&suitabilities=e,m");
        let Target::Search { kind, query } = &target else {
            panic!("expected a search, got {target:?}");
        };
        assert_eq!(kind, "art");
        assert_eq!(query.get("terms").map(String::as_str), Some("tree"));
        assert_eq!(query.get("suitabilities").map(String::as_str), Some("e,m"));
        assert_eq!(target.user(), "");
    }

    #[test]
    fn unsupported() {
        assert!(Target::find("https://example.org/art/view/a/b").is_none());
        assert!(matches!(
            Target::from_url("https://tomfulp.newgrounds.com/news/post/1"),
            Err(ExtractorError::UnsupportedUrl { .. })
        ));
    }
}
