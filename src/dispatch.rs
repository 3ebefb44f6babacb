use crate::config::Settings;
use crate::error::BotError;
use crate::mention::Mention;
use crate::platform::Platform;

/// What a successful dispatch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockOutcome {
    pub user_id: u64,
    pub handle: String,
    pub label: String,
    pub notification: String,
    pub notification_id: String,
}

/// Blocks as the primary account and explains the block from the notifier
/// account. Each account is its own client, so nothing has to be switched
/// back afterwards.
pub struct Dispatcher<'a> {
    primary: &'a dyn Platform,
    notifier: &'a dyn Platform,
    settings: &'a Settings,
}

impl<'a> Dispatcher<'a> {
    pub fn new(primary: &'a dyn Platform, notifier: &'a dyn Platform, settings: &'a Settings) -> Self {
        Dispatcher {
            primary,
            notifier,
            settings,
        }
    }

    /// Block first, then notify. A failed block means no notice is posted.
    pub async fn dispatch(&self, mention: &Mention, label: &str) -> Result<BlockOutcome, BotError> {
        let blocked = self
            .primary
            .block(mention.author.id)
            .await
            .map_err(|source| BotError::Block {
                user_id: mention.author.id,
                handle: mention.author.handle.clone(),
                source,
            })?;

        log::info!(
            "Blocked @{} ({}) for rule '{}'",
            blocked.handle,
            blocked.id,
            label
        );

        let notice = notification_text(&blocked.handle, self.settings, label);
        let post = self
            .notifier
            .post(&notice, Some(mention.id.as_str()))
            .await
            .map_err(|source| BotError::Post {
                handle: blocked.handle.clone(),
                source,
            })?;

        Ok(BlockOutcome {
            user_id: blocked.id,
            handle: blocked.handle,
            label: label.to_string(),
            notification: post.text,
            notification_id: post.id,
        })
    }
}

pub fn reasons_link(settings: &Settings, label: &str) -> String {
    format!("{}#{}", settings.reasons_url, label)
}

pub fn notification_text(handle: &str, settings: &Settings, label: &str) -> String {
    format!(
        "@{}: Hi! You've been blocked by @{}. Reason: {}",
        handle,
        settings.screen_name,
        reasons_link(settings, label)
    )
}
