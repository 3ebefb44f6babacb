use std::collections::HashSet;

use crate::classifier::Classifier;
use crate::config::{Config, EmailConfig, ErrorPolicy, Settings};
use crate::dispatch::Dispatcher;
use crate::error::BotError;
use crate::mention::{IdentitySet, Mention};
use crate::notify::{Mailer, Notifier};
use crate::platform::Platform;
use crate::summary::{RunEvent, RunSummary};

/// One complete pass over the mentions feed.
///
/// Nothing survives the pass: the friend/follower sets are fetched fresh
/// and no record of handled mentions is kept, so running twice over the
/// same feed blocks and notifies twice.
pub struct Orchestrator<'a> {
    settings: &'a Settings,
    email: Option<&'a EmailConfig>,
    classifier: &'a Classifier,
    primary: &'a dyn Platform,
    notifier: &'a dyn Platform,
    mailer: Option<&'a dyn Mailer>,
    dry_run: bool,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a Config,
        classifier: &'a Classifier,
        primary: &'a dyn Platform,
        notifier: &'a dyn Platform,
    ) -> Self {
        Orchestrator {
            settings: &config.settings,
            email: config.active_email(),
            classifier,
            primary,
            notifier,
            mailer: None,
            dry_run: false,
        }
    }

    pub fn with_mailer(mut self, mailer: &'a dyn Mailer) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Fetch and classify, but never block, post or email.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(&self) -> Result<RunSummary, BotError> {
        let account = self
            .primary
            .verify_credentials()
            .await
            .map_err(|source| BotError::Auth {
                identity: "primary",
                source,
            })?;
        log::info!("Authenticated as @{}", account.handle);

        let identities = self.fetch_identities().await?;
        let mentions = self
            .primary
            .mentions(self.settings.mentions_count)
            .await
            .map_err(|source| BotError::Fetch {
                what: "mentions",
                source,
            })?;

        log::info!(
            "Fetched {} friends, {} followers, {} mentions",
            identities.friend_count(),
            identities.follower_count(),
            mentions.len()
        );

        let mut summary = RunSummary::new(self.dry_run);
        let mut seen = HashSet::new();

        for mention in &mentions {
            summary.record(RunEvent::Fetched);
            println!("<{}> {}", mention.author.handle, mention.text);

            if identities.is_exempt(mention.author.id) {
                log::debug!("@{} is a friend or follower, skipping", mention.author.handle);
                summary.record(RunEvent::Exempt);
                continue;
            }

            if !seen.insert(mention.id.as_str()) {
                log::debug!("Mention {} already handled in this run", mention.id);
                summary.record(RunEvent::Duplicate);
                continue;
            }

            let Some(hit) = self.classifier.classify(mention) else {
                summary.record(RunEvent::NoMatch);
                continue;
            };

            if self.dry_run {
                log::info!(
                    "Dry run: would block @{} for rule '{}' ({} rule '{}')",
                    mention.author.handle,
                    hit.label,
                    hit.category,
                    hit.pattern
                );
                summary.record(RunEvent::WouldBlock {
                    handle: &mention.author.handle,
                    label: &hit.label,
                });
                continue;
            }

            if let Err(error) = self.act(mention, &hit.label, &mut summary).await {
                match self.settings.on_error {
                    ErrorPolicy::Continue if error.is_per_mention() => {
                        log::error!("{error}; continuing with the next mention");
                        // the block itself went through
                        if let BotError::Post { handle, .. } = &error {
                            summary.record(RunEvent::Blocked {
                                handle,
                                label: &hit.label,
                            });
                        }
                        summary.record(RunEvent::Failed {
                            mention,
                            error: &error,
                        });
                    }
                    _ => return Err(error),
                }
            }
        }

        Ok(summary)
    }

    async fn fetch_identities(&self) -> Result<IdentitySet, BotError> {
        let friends = self
            .primary
            .friend_ids(self.settings.friends_count)
            .await
            .map_err(|source| BotError::Fetch {
                what: "friend IDs",
                source,
            })?;
        let followers = self
            .primary
            .follower_ids(self.settings.followers_count)
            .await
            .map_err(|source| BotError::Fetch {
                what: "follower IDs",
                source,
            })?;
        Ok(IdentitySet::new(friends, followers))
    }

    async fn act(&self, mention: &Mention, label: &str, summary: &mut RunSummary) -> Result<(), BotError> {
        let outcome = Dispatcher::new(self.primary, self.notifier, self.settings)
            .dispatch(mention, label)
            .await?;
        println!(">> {}", outcome.notification);
        log::debug!("Notice for @{} posted as {}", outcome.handle, outcome.notification_id);
        summary.record(RunEvent::Blocked {
            handle: &outcome.handle,
            label,
        });

        if let (Some(email), Some(mailer)) = (self.email, self.mailer) {
            Notifier::new(mailer, email, &self.settings.profile_base_url)
                .notify(mention, &outcome)
                .await?;
            summary.record(RunEvent::Emailed);
        }

        Ok(())
    }
}
