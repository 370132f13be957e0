//! All internal logic for resolving newgrounds.com listings into downloadable files.

extern crate ngdl_common;

pub mod auth;
pub mod dispatch;
pub mod error;
pub mod extractor;
pub mod extractor_config;
pub mod fanout;
pub mod pagination;
pub mod parser;
pub mod prelude;

pub use crate::dispatch::{GalleryKind, Target};
pub use crate::extractor::{Extractor, Message, NewgroundsExtractor};
