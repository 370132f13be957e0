//! Main representation of a newgrounds post
//!
//! # Post
//! A [`PostRecord`] is built fresh for every post page. The parser fills in the
//! type-specific fields, [`finalize`](PostRecord::finalize) applies the common
//! invariants, and emission derives one [`FileItem`] per downloadable file from it.
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use std::fmt::Debug;

use crate::text;

use self::rating::Rating;

pub mod error;
pub mod extension;
pub mod rating;

/// Internal content tag of a post, decided by the shape of its URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostType {
    /// `/art/view/...`
    Image,
    /// `/audio/listen/...`
    Audio,
    /// Anything else: movies, games and flash submissions.
    #[default]
    Media,
}

impl PostType {
    pub fn from_post_url(url: &str) -> Self {
        if url.contains("/art/view/") {
            Self::Image
        } else if url.contains("/audio/listen/") {
            Self::Audio
        } else {
            Self::Media
        }
    }

    pub const fn tag(self) -> &'static str {
        match self {
            Self::Image => "i",
            Self::Audio => "a",
            Self::Media => "",
        }
    }
}

impl Serialize for PostType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

/// Everything known about one post, plus the naming fields of the file it is attached to.
#[derive(Clone, Default, Serialize, PartialEq)]
pub struct PostRecord {
    pub title: String,
    pub description: String,
    /// Author comment with markup stripped and entities decoded.
    pub comment: String,
    /// Content category reported by the site (`article`, `movie`, `music.song`, `game`, ...).
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(rename = "_type")]
    pub post_type: PostType,
    pub date: Option<NaiveDateTime>,
    /// Primary download URL. Empty when it could not be resolved.
    pub url: String,
    pub index: u64,
    #[serde(rename = "_index")]
    pub display_index: String,
    pub rating: Rating,
    pub tags: Vec<String>,
    pub artist: Vec<String>,
    pub favorites: u64,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
    pub user: String,
    pub post_url: String,
    pub filename: String,
    pub extension: String,
    pub num: u32,
    /// Alternative URLs, best first, to try when the download URL fails.
    #[serde(rename = "_fallback", skip_serializing_if = "Vec::is_empty")]
    pub fallback: Vec<String>,
    /// Raw `art-images` block, kept for the embedded file scan.
    #[serde(skip)]
    pub images_markup: String,
    /// Raw author comment block, kept for the embedded file scan.
    #[serde(skip)]
    pub comment_markup: String,
    /// Listing-level metadata merged in before emission (e.g. `search_tags`).
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl Debug for PostRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostRecord")
            .field("Index", &self.display_index)
            .field("Type", &self.post_type)
            .field("Title", &self.title)
            .field("Download URL", &self.url)
            .field("Rating", &self.rating)
            .field("Tag List", &self.tags)
            .field("Artists", &self.artist)
            .field("Fallbacks", &self.fallback.len())
            .finish()
    }
}

impl PostRecord {
    /// Applies the invariants every record leaves the parser with.
    ///
    /// Tags get sorted, and `user` falls back to the first credited artist when the
    /// extractor itself was not created for a specific user.
    #[must_use]
    pub fn finalize(mut self, user: &str, post_url: &str) -> Self {
        self.tags.sort();
        self.user = if user.is_empty() {
            self.artist.first().cloned().unwrap_or_default()
        } else {
            user.to_string()
        };
        self.post_url = post_url.to_string();
        self
    }

    /// Merges listing-level metadata into the record. Existing keys are overwritten.
    pub fn merge_metadata(&mut self, metadata: &Map<String, Value>) {
        for (key, value) in metadata {
            self.metadata.insert(key.clone(), value.clone());
        }
    }

    /// Whether the parser managed to resolve a primary download URL.
    #[inline]
    pub fn has_url(&self) -> bool {
        !self.url.is_empty()
    }

    /// Raw markup scanned for embedded files, images block first.
    pub fn embedded_markup(&self) -> String {
        format!("{}{}", self.images_markup, self.comment_markup)
    }

    /// Builds the item for the primary file, naming it after its URL.
    pub fn primary_file(&self) -> FileItem {
        let mut post = self.clone();
        let (filename, extension) = text::nameext_from_url(&self.url);
        post.filename = filename;
        post.extension = extension;
        post.num = 0;
        FileItem {
            url: self.url.clone(),
            post,
        }
    }
}

/// A single downloadable file together with the metadata describing it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FileItem {
    /// Where to download the file from.
    pub url: String,
    #[serde(rename = "metadata")]
    pub post: PostRecord,
}

impl FileItem {
    /// File name with extension, as the output layer would save it.
    pub fn file_name(&self) -> String {
        if self.post.extension.is_empty() {
            self.post.filename.clone()
        } else {
            format!("{}.{}", self.post.filename, self.post.extension)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_by_url() {
        assert_eq!(
            PostType::from_post_url("https://www.newgrounds.com/art/view/tomfulp/ryu-is-hawt"),
            PostType::Image
        );
        assert_eq!(
            PostType::from_post_url("https://www.newgrounds.com/audio/listen/609768"),
            PostType::Audio
        );
        assert_eq!(
            PostType::from_post_url("https://www.newgrounds.com/portal/view/595355"),
            PostType::Media
        );
    }

    #[test]
    fn finalize_sorts_tags_and_picks_user() {
        let record = PostRecord {
            tags: vec!["trailer".into(), "alienhominid".into()],
            artist: vec!["kickinthehead".into(), "tomfulp".into()],
            ..Default::default()
        }
        .finalize("", "https://www.newgrounds.com/portal/view/595355");

        assert_eq!(record.tags, vec!["alienhominid", "trailer"]);
        assert_eq!(record.user, "kickinthehead");

        let record = record.finalize("tomfulp", "x");
        assert_eq!(record.user, "tomfulp");
    }

    #[test]
    fn serialized_keys() {
        let mut record = PostRecord {
            post_type: PostType::Audio,
            content_type: "music.song".into(),
            display_index: "609768".into(),
            url: "https://audio.ngfiles.com/609000/609768_ZJ.mp3?f1424720017".into(),
            comment_markup: "<p>raw</p>".into(),
            ..Default::default()
        };
        record.merge_metadata(json!({"search_tags": "tree"}).as_object().unwrap());

        let item = record.primary_file();
        assert_eq!(item.file_name(), "609768_ZJ.mp3");

        let value = serde_json::to_value(&item.post).unwrap();
        assert_eq!(value["_type"], "a");
        assert_eq!(value["type"], "music.song");
        assert_eq!(value["_index"], "609768");
        assert_eq!(value["rating"], "");
        assert_eq!(value["search_tags"], "tree");
        assert_eq!(value["extension"], "mp3");
        assert!(value.get("_fallback").is_none());
        assert!(value.get("comment_markup").is_none());
        assert!(value.get("width").is_none());
    }
}
