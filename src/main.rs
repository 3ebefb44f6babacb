use anyhow::Context;
use blockbot::{Classifier, Config, Mention, Orchestrator, RuleSet, SmtpMailer, TwitterClient};
use clap::{Arg, Command};
use log::LevelFilter;
use std::process;
use std::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let matches = Command::new("blockbot")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Blocks accounts whose mentions match configured text or location rules")
        .long_about(
            "BlockBot checks the recent mentions of an account, skips friends and followers, \
             and blocks anyone whose mention matches a rule. A second account posts a public \
             notice linking to the reason, and an admin email can be sent for every block.\n\n\
             Each invocation is a single pass; schedule it externally (cron, systemd timer).",
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Validate the configuration and compile every rule")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("test-mention")
                .long("test-mention")
                .value_name("TEXT")
                .help("Classify a mention text offline and print the matching label")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("place")
                .long("place")
                .value_name("TEXT")
                .help("Place name to use with --test-mention")
                .requires("test-mention")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Fetch and classify mentions without blocking, posting or emailing")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let mut logger = env_logger::Builder::from_default_env();
    if let Some(level) = log_level(matches.get_flag("verbose"), std::env::var_os("RUST_LOG").is_some()) {
        logger.filter_level(level);
    }
    logger.init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config.yaml");

    let config = match Config::from_file(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    let classifier = match RuleSet::from_config(&config.rules) {
        Ok(rules) => Classifier::new(rules),
        Err(e) => {
            eprintln!("❌ Configuration validation failed:");
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        print_config_report(&config, &classifier);
        return;
    }

    if let Some(text) = matches.get_one::<String>("test-mention") {
        let place = matches.get_one::<String>("place");
        test_mention(&classifier, text, place.map(String::as_str));
        return;
    }

    let dry_run = matches.get_flag("dry-run");
    match run(&config, &classifier, dry_run).await {
        Ok(summary) => {
            summary.print_report();
            if summary.has_failures() {
                process::exit(1);
            }
        }
        Err(e) => {
            log::error!("{e:#}");
            process::exit(1);
        }
    }
}

/// `-v` forces debug output; otherwise `RUST_LOG` wins when set.
fn log_level(verbose: bool, rust_log_set: bool) -> Option<LevelFilter> {
    if verbose {
        Some(LevelFilter::Debug)
    } else if rust_log_set {
        None
    } else {
        Some(LevelFilter::Info)
    }
}

async fn run(config: &Config, classifier: &Classifier, dry_run: bool) -> anyhow::Result<blockbot::RunSummary> {
    let settings = &config.settings;
    let timeout = Duration::from_secs(settings.request_timeout_seconds);

    let primary = TwitterClient::new(
        &settings.api_base,
        config.primary.clone(),
        timeout,
        settings.thread_replies,
    )
    .context("Failed to create client for the primary account")?;
    let notifier = TwitterClient::new(
        &settings.api_base,
        config.notifier.clone(),
        timeout,
        settings.thread_replies,
    )
    .context("Failed to create client for the notifier account")?;

    let mailer = match config.active_email() {
        Some(email) => Some(SmtpMailer::new(email).context("Failed to set up SMTP transport")?),
        None => None,
    };

    log::info!(
        "Starting BlockBot for @{}{}",
        settings.screen_name,
        if dry_run { " (dry run)" } else { "" }
    );

    let mut orchestrator = Orchestrator::new(config, classifier, &primary, &notifier).dry_run(dry_run);
    if let Some(mailer) = mailer.as_ref() {
        orchestrator = orchestrator.with_mailer(mailer);
    }

    Ok(orchestrator.run().await?)
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}

fn print_config_report(config: &Config, classifier: &Classifier) {
    println!("🔍 Testing configuration...");
    println!();
    println!("Monitored account: @{}", config.settings.screen_name);
    println!("Error policy: {:?}", config.settings.on_error);
    println!(
        "Admin email: {}",
        if config.active_email().is_some() { "enabled" } else { "disabled" }
    );

    let rules = classifier.rules();
    println!("Number of text rules: {}", rules.text_rules().len());
    for (i, rule) in rules.text_rules().iter().enumerate() {
        println!("  Rule {}: {} -> {}", i + 1, rule.pattern(), rule.label());
    }
    println!("Number of location rules: {}", rules.location_rules().len());
    for (i, rule) in rules.location_rules().iter().enumerate() {
        println!("  Rule {}: {} -> {}", i + 1, rule.pattern(), rule.label());
    }
    println!("All regex patterns compiled successfully.");
}

fn test_mention(classifier: &Classifier, text: &str, place: Option<&str>) {
    let mut mention = Mention::new("0", 0, "test", text);
    if let Some(place) = place {
        mention = mention.with_place(place, "", "");
    }

    println!("🧪 Testing mention: {text}");
    if place.is_some() {
        println!("   Location: {}", mention.location());
    }
    println!();

    match classifier.classify(&mention) {
        Some(hit) => {
            println!("🚫 Result: BLOCK");
            println!("   Label: {}", hit.label);
            println!("   Matched {} rule: {}", hit.category, hit.pattern);
        }
        None => {
            println!("✅ Result: NO MATCH");
        }
    }
}
