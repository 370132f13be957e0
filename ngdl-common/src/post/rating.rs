//! Content rating attached to a post
//! # Post Rating
//! Every submission on newgrounds carries one of four rating codes, shown in
//! the page as a `rated-<code>` CSS class:
//! * `e` Everyone
//! * `t` Teen
//! * `m` Mature
//! * `a` Adult
//!
//! Audio pages expose no rating at all, which is represented by [`Rating::Unrated`].

use serde::{Serialize, Serializer};
use std::{fmt::Display, str::FromStr};

use super::error::PostError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Rating {
    Everyone,
    Teen,
    Mature,
    Adult,
    /// No rating present in the markup (always the case for audio).
    #[default]
    Unrated,
}

impl Rating {
    /// Guess the variant from the code found in the page. Unrecognized codes map to `Unrated`.
    pub fn from_rating_str(s: &str) -> Self {
        Self::from_str(s).unwrap_or_default()
    }

    /// The single-letter code used by the site, or an empty string for `Unrated`.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Everyone => "e",
            Self::Teen => "t",
            Self::Mature => "m",
            Self::Adult => "a",
            Self::Unrated => "",
        }
    }
}

impl FromStr for Rating {
    type Err = PostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "e" => Ok(Self::Everyone),
            "t" => Ok(Self::Teen),
            "m" => Ok(Self::Mature),
            "a" => Ok(Self::Adult),
            "" => Ok(Self::Unrated),
            other => Err(PostError::UnknownRating {
                code: other.to_string(),
            }),
        }
    }
}

impl Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Everyone => write!(f, "Everyone"),
            Self::Teen => write!(f, "Teen"),
            Self::Mature => write!(f, "Mature"),
            Self::Adult => write!(f, "Adult"),
            Self::Unrated => write!(f, "Unrated"),
        }
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}
