use crate::config::ConfigError;
use crate::notify::MailError;
use crate::platform::PlatformError;
use crate::rules::RuleError;

/// Everything that can stop a run or fail a single mention.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Authentication failed for the {identity} account: {source}")]
    Auth {
        identity: &'static str,
        source: PlatformError,
    },
    #[error("Failed to fetch {what}: {source}")]
    Fetch {
        what: &'static str,
        source: PlatformError,
    },
    #[error(transparent)]
    Pattern(#[from] RuleError),
    #[error("Failed to block user {user_id} (@{handle}): {source}")]
    Block {
        user_id: u64,
        handle: String,
        source: PlatformError,
    },
    #[error("Failed to notify @{handle}: {source}")]
    Post {
        handle: String,
        source: PlatformError,
    },
    #[error("Failed to email admin about @{handle}: {source}")]
    Mail { handle: String, source: MailError },
}

impl BotError {
    /// Errors tied to one mention; the rest leave nothing to process.
    pub fn is_per_mention(&self) -> bool {
        matches!(
            self,
            BotError::Block { .. } | BotError::Post { .. } | BotError::Mail { .. }
        )
    }
}
