use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Account that is monitored and issues blocks.
    pub primary: Credentials,
    /// Account that posts the public block notices.
    pub notifier: Credentials,
    pub settings: Settings,
    #[serde(default)]
    pub email: Option<EmailConfig>,
    pub rules: RulesConfig,
}

/// OAuth 1.0a user-context credentials for one account.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub friends_count: u32,
    pub followers_count: u32,
    pub mentions_count: u32,
    /// Handle of the primary account, without the leading '@'.
    pub screen_name: String,
    /// Page explaining each label; notices link to `reasons_url#label`.
    pub reasons_url: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_profile_base_url")]
    pub profile_base_url: String,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    #[serde(default)]
    pub thread_replies: bool,
    #[serde(default)]
    pub on_error: ErrorPolicy,
}

fn default_api_base() -> String {
    "https://api.twitter.com/1.1".to_string()
}

fn default_profile_base_url() -> String {
    "https://twitter.com".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    30
}

/// What the run does when blocking, notifying or emailing fails for one mention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop the whole batch on the first failure.
    #[default]
    Abort,
    /// Record the failure and move on to the next mention.
    Continue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,
    pub server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_address: String,
    pub admin_address: String,
    #[serde(default)]
    pub security: SmtpSecurity,
    /// Needed for relays presenting a self-signed certificate.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    #[default]
    Starttls,
    Tls,
    None,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub text: Vec<RuleSpec>,
    #[serde(default)]
    pub location: Vec<RuleSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    pub pattern: String,
    pub label: String,
}

impl RuleSpec {
    fn new(pattern: &str, label: &str) -> Self {
        RuleSpec {
            pattern: pattern.to_string(),
            label: label.to_string(),
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Credentials {
            consumer_key: "CONSUMER_KEY".to_string(),
            consumer_secret: "CONSUMER_SECRET".to_string(),
            access_token: "ACCESS_TOKEN".to_string(),
            access_token_secret: "ACCESS_TOKEN_SECRET".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            friends_count: 5000,
            followers_count: 5000,
            mentions_count: 200,
            screen_name: "denny".to_string(),
            reasons_url: "https://example.com/blockbot".to_string(),
            api_base: default_api_base(),
            profile_base_url: default_profile_base_url(),
            request_timeout_seconds: default_request_timeout_seconds(),
            thread_replies: false,
            on_error: ErrorPolicy::Abort,
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        EmailConfig {
            enabled: false,
            server: "smtp.example.com".to_string(),
            port: default_smtp_port(),
            username: "blockbot".to_string(),
            password: "SMTP_PASSWORD".to_string(),
            from_address: "blockbot@example.com".to_string(),
            admin_address: "admin@example.com".to_string(),
            security: SmtpSecurity::Starttls,
            accept_invalid_certs: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        const DINER_CONTEXT: &str =
            "breakfast|lunch|dinner|food|coffee|milkshake|Grand Slam|diner|waitress|service|smash|IHOP";

        Config {
            primary: Credentials::default(),
            notifier: Credentials::default(),
            settings: Settings::default(),
            email: Some(EmailConfig::default()),
            rules: RulesConfig {
                text: vec![
                    // People who share the name
                    RuleSpec::new("Hamlin", "dennyhamlin"),
                    RuleSpec::new("NASCAR", "dennyhamlin"),
                    RuleSpec::new("Cagur", "dennycagur"),
                    RuleSpec::new("Sumargo", "dennysumargo"),
                    RuleSpec::new("Gitong", "dennygitong"),
                    // The restaurant chain
                    RuleSpec::new("^@Denny's$", "atdennys"),
                    RuleSpec::new(&format!("@Denny's.+({DINER_CONTEXT})"), "dennysdiner"),
                    RuleSpec::new(
                        &format!("({DINER_CONTEXT}|fam |LIVE on #Periscope).+@Denny's"),
                        "dennysdiner",
                    ),
                ],
                location: vec![
                    RuleSpec::new("Indonesia", "indonesia"),
                    RuleSpec::new("Jakarta", "indonesia"),
                    RuleSpec::new("Bandung", "indonesia"),
                    RuleSpec::new("Padang", "indonesia"),
                ],
            },
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Email settings, only when sending is switched on.
    pub fn active_email(&self) -> Option<&EmailConfig> {
        self.email.as_ref().filter(|email| email.enabled)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let settings = &self.settings;

        for (name, value) in [
            ("friends_count", settings.friends_count),
            ("followers_count", settings.followers_count),
            ("mentions_count", settings.mentions_count),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!(
                    "settings.{name} must be greater than zero"
                )));
            }
        }

        if settings.screen_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "settings.screen_name must not be empty".to_string(),
            ));
        }
        if settings.screen_name.starts_with('@') {
            return Err(ConfigError::Invalid(
                "settings.screen_name must not include the leading '@'".to_string(),
            ));
        }

        for (name, value) in [
            ("reasons_url", &settings.reasons_url),
            ("api_base", &settings.api_base),
            ("profile_base_url", &settings.profile_base_url),
        ] {
            Url::parse(value).map_err(|e| {
                ConfigError::Invalid(format!("settings.{name} '{value}' is not a valid URL: {e}"))
            })?;
        }

        if let Some(email) = self.active_email() {
            for (name, value) in [
                ("server", &email.server),
                ("from_address", &email.from_address),
                ("admin_address", &email.admin_address),
            ] {
                if value.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "email.{name} is required when email is enabled"
                    )));
                }
            }
        }

        Ok(())
    }
}
