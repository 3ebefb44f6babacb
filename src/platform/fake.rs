use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use super::{Account, Platform, PlatformError, Post};
use crate::mention::Mention;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Verify(String),
    FriendIds(String),
    FollowerIds(String),
    Mentions(String),
    Block(String, u64),
    Post(String, String, Option<String>),
}

/// Call log shared by every fake in a test, so ordering across the primary
/// and notifier accounts can be asserted.
pub type CallLog = Arc<Mutex<Vec<Call>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub struct FakePlatform {
    name: String,
    log: CallLog,
    pub friends: Vec<u64>,
    pub followers: Vec<u64>,
    pub mentions: Vec<Mention>,
    /// Handles returned by `block`, keyed by user id. Unknown ids get `user<id>`.
    pub handles: Vec<(u64, String)>,
    pub fail_verify: bool,
    pub fail_mentions: bool,
    pub fail_block_for: HashSet<u64>,
    pub fail_post: bool,
}

impl FakePlatform {
    pub fn new(name: &str, log: &CallLog) -> Self {
        FakePlatform {
            name: name.to_string(),
            log: log.clone(),
            friends: Vec::new(),
            followers: Vec::new(),
            mentions: Vec::new(),
            handles: Vec::new(),
            fail_verify: false,
            fail_mentions: false,
            fail_block_for: HashSet::new(),
            fail_post: false,
        }
    }

    fn record(&self, call: Call) {
        self.log.lock().unwrap().push(call);
    }

    fn handle_for(&self, user_id: u64) -> String {
        self.handles
            .iter()
            .find(|(id, _)| *id == user_id)
            .map(|(_, handle)| handle.clone())
            .unwrap_or_else(|| format!("user{user_id}"))
    }
}

fn rejected(what: &str) -> PlatformError {
    PlatformError::Api {
        status: 403,
        message: format!("{what} refused"),
    }
}

#[async_trait]
impl Platform for FakePlatform {
    async fn verify_credentials(&self) -> Result<Account, PlatformError> {
        self.record(Call::Verify(self.name.clone()));
        if self.fail_verify {
            return Err(PlatformError::Unauthorized("Could not authenticate you.".to_string()));
        }
        Ok(Account {
            id: 1,
            handle: self.name.clone(),
        })
    }

    async fn friend_ids(&self, _count: u32) -> Result<Vec<u64>, PlatformError> {
        self.record(Call::FriendIds(self.name.clone()));
        Ok(self.friends.clone())
    }

    async fn follower_ids(&self, _count: u32) -> Result<Vec<u64>, PlatformError> {
        self.record(Call::FollowerIds(self.name.clone()));
        Ok(self.followers.clone())
    }

    async fn mentions(&self, count: u32) -> Result<Vec<Mention>, PlatformError> {
        self.record(Call::Mentions(self.name.clone()));
        if self.fail_mentions {
            return Err(rejected("mentions"));
        }
        Ok(self.mentions.iter().take(count as usize).cloned().collect())
    }

    async fn block(&self, user_id: u64) -> Result<Account, PlatformError> {
        self.record(Call::Block(self.name.clone(), user_id));
        if self.fail_block_for.contains(&user_id) {
            return Err(rejected("block"));
        }
        Ok(Account {
            id: user_id,
            handle: self.handle_for(user_id),
        })
    }

    async fn post(&self, text: &str, in_reply_to: Option<&str>) -> Result<Post, PlatformError> {
        self.record(Call::Post(
            self.name.clone(),
            text.to_string(),
            in_reply_to.map(str::to_string),
        ));
        if self.fail_post {
            return Err(rejected("post"));
        }
        Ok(Post {
            id: "9000".to_string(),
            text: text.to_string(),
        })
    }
}
