pub use crate::auth::{AuthState, FileLoginCache, LoginCache, MemoryLoginCache};
pub use crate::dispatch::{GalleryKind, Target};
pub use crate::error::ExtractorError;
pub use crate::extractor::session::Session;
pub use crate::extractor::{Extractor, Message, NewgroundsExtractor};
pub use crate::extractor_config::{ExtractorOptions, FormatPreference, SiteConfig, UserKinds};
