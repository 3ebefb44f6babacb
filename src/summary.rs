use std::collections::BTreeMap;

use crate::error::BotError;
use crate::mention::Mention;

#[derive(Debug, Clone)]
pub enum RunEvent<'a> {
    Fetched,
    Exempt,
    Duplicate,
    NoMatch,
    Blocked { handle: &'a str, label: &'a str },
    WouldBlock { handle: &'a str, label: &'a str },
    Emailed,
    Failed { mention: &'a Mention, error: &'a BotError },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionFailure {
    pub mention_id: String,
    pub handle: String,
    pub error: String,
}

/// Per-label match counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelStats {
    pub matches: u64,
    pub blocks: u64,
}

/// Tally of one pass over the mentions feed. Lives only for the run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub fetched: u64,
    pub exempt: u64,
    pub duplicates: u64,
    pub unmatched: u64,
    pub emailed: u64,
    pub dry_run: bool,
    pub blocked: Vec<(String, String)>,
    pub labels: BTreeMap<String, LabelStats>,
    pub failures: Vec<MentionFailure>,
}

impl RunSummary {
    pub fn new(dry_run: bool) -> Self {
        RunSummary {
            dry_run,
            ..Default::default()
        }
    }

    pub fn record(&mut self, event: RunEvent<'_>) {
        match event {
            RunEvent::Fetched => self.fetched += 1,
            RunEvent::Exempt => self.exempt += 1,
            RunEvent::Duplicate => self.duplicates += 1,
            RunEvent::NoMatch => self.unmatched += 1,
            RunEvent::Blocked { handle, label } => {
                let stats = self.labels.entry(label.to_string()).or_default();
                stats.matches += 1;
                stats.blocks += 1;
                self.blocked.push((handle.to_string(), label.to_string()));
            }
            RunEvent::WouldBlock { handle, label } => {
                self.labels.entry(label.to_string()).or_default().matches += 1;
                self.blocked.push((handle.to_string(), label.to_string()));
            }
            RunEvent::Emailed => self.emailed += 1,
            RunEvent::Failed { mention, error } => self.failures.push(MentionFailure {
                mention_id: mention.id.clone(),
                handle: mention.author.handle.clone(),
                error: error.to_string(),
            }),
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn print_report(&self) {
        let verb = if self.dry_run { "Would block" } else { "Blocked" };

        println!();
        println!("📊 BlockBot run summary{}", if self.dry_run { " (dry run)" } else { "" });
        println!("═══════════════════════════════════════");
        println!("  Mentions fetched: {}", self.fetched);
        println!("  ├─ Friends/followers skipped: {}", self.exempt);
        if self.duplicates > 0 {
            println!("  ├─ Duplicates skipped: {}", self.duplicates);
        }
        println!("  ├─ No rule matched: {}", self.unmatched);
        println!("  ├─ {}: {}", verb, self.blocked.len());
        println!("  └─ Failed: {}", self.failures.len());
        if self.emailed > 0 {
            println!("  Admin emails sent: {}", self.emailed);
        }

        if !self.labels.is_empty() {
            println!();
            println!("┌──────────────────────────────┬─────────┬────────┐");
            println!("│ Label                        │ Matches │ Blocks │");
            println!("├──────────────────────────────┼─────────┼────────┤");
            for (label, stats) in &self.labels {
                println!(
                    "│ {:<28} │ {:>7} │ {:>6} │",
                    truncate_string(label, 28),
                    stats.matches,
                    stats.blocks
                );
            }
            println!("└──────────────────────────────┴─────────┴────────┘");
        }

        for (handle, label) in &self.blocked {
            println!("  • {verb} @{handle} ({label})");
        }

        if self.has_failures() {
            println!();
            println!("❌ Failures:");
            for failure in &self.failures {
                println!(
                    "  • mention {} by @{}: {}",
                    failure.mention_id, failure.handle, failure.error
                );
            }
        }
    }
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformError;

    #[test]
    fn test_record_counts() {
        let mut summary = RunSummary::new(false);
        summary.record(RunEvent::Fetched);
        summary.record(RunEvent::Fetched);
        summary.record(RunEvent::Exempt);
        summary.record(RunEvent::Blocked {
            handle: "racefan",
            label: "dennyhamlin",
        });

        assert_eq!(summary.fetched, 2);
        assert_eq!(summary.exempt, 1);
        assert_eq!(summary.blocked, vec![("racefan".to_string(), "dennyhamlin".to_string())]);
        assert_eq!(
            summary.labels.get("dennyhamlin"),
            Some(&LabelStats {
                matches: 1,
                blocks: 1
            })
        );
        assert!(!summary.has_failures());
    }

    #[test]
    fn test_would_block_does_not_count_as_block() {
        let mut summary = RunSummary::new(true);
        summary.record(RunEvent::WouldBlock {
            handle: "x",
            label: "indonesia",
        });
        let stats = summary.labels.get("indonesia").unwrap();
        assert_eq!(stats.matches, 1);
        assert_eq!(stats.blocks, 0);
    }

    #[test]
    fn test_failure_keeps_mention_reference() {
        let mut summary = RunSummary::new(false);
        let mention = Mention::new("55", 3, "someone", "Hamlin");
        let error = BotError::Block {
            user_id: 3,
            handle: "someone".to_string(),
            source: PlatformError::Api {
                status: 500,
                message: "oops".to_string(),
            },
        };
        summary.record(RunEvent::Failed {
            mention: &mention,
            error: &error,
        });

        assert!(summary.has_failures());
        assert_eq!(summary.failures[0].mention_id, "55");
        assert!(summary.failures[0].error.contains("oops"));
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("abcdefghijkl", 8), "abcde...");
    }
}
