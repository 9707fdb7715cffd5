//! Frontpage Post Submission
//!
//! Validates a title/URL pair and writes it as a `fyi.unravel.frontpage.post`
//! record to the account's repository, refreshing the session at most once
//! when the server rejects the access token.

mod draft;
mod error;
mod publisher;

pub use draft::{PostDraft, ValidatedPost, MAX_TITLE_CHARS, MAX_URL_CHARS};
pub use error::PostError;
pub use publisher::{CreatedRecord, PostPublisher, FRONTPAGE_COLLECTION, POST_RECORD_TYPE};

pub type Result<T> = std::result::Result<T, PostError>;
