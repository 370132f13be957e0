//! # Post Extension Module
//!
//! This module defines the [`Extension`] enum, used to classify the files a post
//! links to. The raw extension string is what ends up in the output; this enum
//! only answers whether it is a transcoded preview.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::Serialize;

use super::error::PostError;

/// Represents the kind of file behind a download URL.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Extension {
    /// The `JPG` variant also encompasses `.jpeg` and `.jfif`.
    JPG,
    PNG,
    GIF,
    /// Art galleries serve `webp` previews of images whose original has another extension.
    WEBP,
    MP4,
    WEBM,
    MP3,
    OGG,
    WAV,
    /// Flash movies and games.
    SWF,
    /// Used for any file whose extension is unknown or not currently supported by this library.
    Unknown,
}

impl Extension {
    /// Determines the `Extension` from a string slice, case-insensitively.
    ///
    /// Anything unrecognized maps to [`Extension::Unknown`]; this never panics.
    ///
    /// # Examples
    /// ```
    /// # use ngdl_common::post::extension::Extension;
    /// assert_eq!(Extension::guess_format("WEBP"), Extension::WEBP);
    /// assert_eq!(Extension::guess_format("swf"), Extension::SWF);
    /// assert_eq!(Extension::guess_format("nonexistent"), Extension::Unknown);
    /// ```
    pub fn guess_format(s: &str) -> Self {
        Self::from_str(s).unwrap_or(Self::Unknown)
    }

    /// Lossy web formats the art CDN uses for transcoded previews.
    pub const fn is_web_preview(&self) -> bool {
        matches!(self, Self::WEBP)
    }
}

impl FromStr for Extension {
    type Err = PostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jpg" | "jpeg" | "jfif" => Ok(Self::JPG),
            "png" | "apng" => Ok(Self::PNG),
            "gif" => Ok(Self::GIF),
            "webp" => Ok(Self::WEBP),
            "mp4" | "m4v" => Ok(Self::MP4),
            "webm" => Ok(Self::WEBM),
            "mp3" => Ok(Self::MP3),
            "ogg" => Ok(Self::OGG),
            "wav" => Ok(Self::WAV),
            "swf" => Ok(Self::SWF),
            _ => Err(PostError::UnknownExtension {
                message: s.to_string(),
            }),
        }
    }
}

impl Display for Extension {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::JPG => write!(f, "jpg"),
            Self::PNG => write!(f, "png"),
            Self::GIF => write!(f, "gif"),
            Self::WEBP => write!(f, "webp"),
            Self::MP4 => write!(f, "mp4"),
            Self::WEBM => write!(f, "webm"),
            Self::MP3 => write!(f, "mp3"),
            Self::OGG => write!(f, "ogg"),
            Self::WAV => write!(f, "wav"),
            Self::SWF => write!(f, "swf"),
            Self::Unknown => write!(f, "bin"),
        }
    }
}
