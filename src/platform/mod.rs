//! The social platform as seen by the bot.
//!
//! Each [`Platform`] value acts as exactly one account. The dispatcher is
//! handed two of them (primary and notifier) instead of switching the
//! credentials of a shared client back and forth.

pub mod oauth;
pub mod twitter;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;

use crate::mention::Mention;

pub use twitter::TwitterClient;

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("credentials rejected: {0}")]
    Unauthorized(String),
    #[error("API returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("request signing failed: {0}")]
    Signing(String),
}

/// The account a call was made as, once the platform has confirmed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: u64,
    pub handle: String,
}

/// A newly created post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub text: String,
}

#[async_trait]
pub trait Platform: Send + Sync {
    async fn verify_credentials(&self) -> Result<Account, PlatformError>;

    async fn friend_ids(&self, count: u32) -> Result<Vec<u64>, PlatformError>;

    async fn follower_ids(&self, count: u32) -> Result<Vec<u64>, PlatformError>;

    /// Most recent mentions, newest first.
    async fn mentions(&self, count: u32) -> Result<Vec<Mention>, PlatformError>;

    /// Blocks `user_id` and returns the blocked account.
    async fn block(&self, user_id: u64) -> Result<Account, PlatformError>;

    async fn post(&self, text: &str, in_reply_to: Option<&str>) -> Result<Post, PlatformError>;
}
