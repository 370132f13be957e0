use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PostError {
    #[error("Unknown file extension: {message}")]
    UnknownExtension { message: String },

    #[error("Unknown content rating code: {code}")]
    UnknownRating { code: String },
}
