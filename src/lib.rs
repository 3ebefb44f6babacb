pub mod classifier;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod mention;
pub mod notify;
pub mod orchestrator;
pub mod platform;
pub mod rules;
pub mod summary;

pub use classifier::{Classifier, RuleMatch};
pub use config::{Config, ErrorPolicy};
pub use dispatch::{BlockOutcome, Dispatcher};
pub use error::BotError;
pub use mention::{IdentitySet, Mention};
pub use notify::{Mailer, Notifier, SmtpMailer};
pub use orchestrator::Orchestrator;
pub use platform::{Platform, TwitterClient};
pub use rules::RuleSet;
pub use summary::RunSummary;
