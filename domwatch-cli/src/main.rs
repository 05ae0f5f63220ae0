mod logging;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use domwatch_core::classify::messages;
use domwatch_core::config::ENV_FILE;
use domwatch_core::{
    classify, Config, DiscordClient, DomainLookup, Notifier, WhoisClient, WhoisLookup,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "domwatch")]
#[command(about = "Posts the WHOIS registration status of a list of domains to a Discord channel")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory that receives domwatch.log
    #[arg(long, global = true, env = "DOMWATCH_LOG_DIR", default_value = ".")]
    log_dir: PathBuf,

    /// Dotenv file read for settings the environment does not set
    #[arg(long, global = true, default_value = ENV_FILE)]
    env_file: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the configured domains and post their status to Discord (default)
    Run {
        /// Domain to watch; repeat to watch several. Overrides DOMWATCH_DOMAINS
        #[arg(short, long = "domain")]
        domains: Vec<String>,
        /// Run a single pass and exit
        #[arg(long)]
        once: bool,
    },
    /// Look up domains and print their status without posting anything
    Check {
        /// Domain names to look up
        #[arg(required = true)]
        domains: Vec<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Human)]
        format: OutputFormat,
        /// Query this WHOIS server instead of each TLD's registry
        #[arg(short, long)]
        server: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Run {
        domains: Vec::new(),
        once: false,
    });

    let result = match command {
        Commands::Run { domains, once } => run(&cli.log_dir, &cli.env_file, domains, once).await,
        Commands::Check {
            domains,
            format,
            server,
        } => check(&cli.log_dir, domains, format, server).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(
    log_dir: &Path,
    env_file: &Path,
    domains: Vec<String>,
    once: bool,
) -> anyhow::Result<()> {
    // Dropped on return, which flushes the file writer before exit
    let _guard = logging::init(log_dir, "info")?;

    let config = Config::from_env_file(env_file).and_then(|config| {
        if domains.is_empty() {
            Ok(config)
        } else {
            config.with_domains(&domains)
        }
    });
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    info!(?config, "Starting domwatch");

    let delivery = DiscordClient::new(config.token.clone()).context("building the Discord client")?;
    let notifier = Notifier::from_config(&config, WhoisLookup::default(), delivery);
    info!(domains = ?notifier.domains(), "Watching domains");

    let max_passes = once.then_some(1);
    tokio::select! {
        result = notifier.run(max_passes) => result?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
    }

    Ok(())
}

async fn check(
    log_dir: &Path,
    domains: Vec<String>,
    format: OutputFormat,
    server: Option<String>,
) -> anyhow::Result<()> {
    let _guard = logging::init(log_dir, "warn")?;

    let lookup = match server {
        Some(server) => WhoisLookup::new(WhoisClient::new()).with_server(server),
        None => WhoisLookup::new(WhoisClient::new()),
    };
    let mut results = Vec::new();

    for domain in &domains {
        let result = lookup.lookup(domain).await;
        let classification = classify(&result);

        match format {
            OutputFormat::Human => println!("{}", messages::status_line(domain, &classification)),
            OutputFormat::Json => results.push(match &result {
                Ok(outcome) => serde_json::json!({
                    "domain": domain,
                    "status": classification.to_string(),
                    "lookup": outcome,
                }),
                Err(e) => serde_json::json!({
                    "domain": domain,
                    "status": classification.to_string(),
                    "error": e.to_string(),
                }),
            }),
        }
    }

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["domwatch"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.env_file, PathBuf::from(".env"));
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::try_parse_from([
            "domwatch",
            "run",
            "--domain",
            "nandomain.dev",
            "-d",
            "solutech.dev",
            "--once",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Run { domains, once }) => {
                assert_eq!(domains, vec!["nandomain.dev", "solutech.dev"]);
                assert!(once);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_check_requires_a_domain() {
        assert!(Cli::try_parse_from(["domwatch", "check"]).is_err());

        let cli = Cli::try_parse_from(["domwatch", "check", "example.com", "-f", "json"]).unwrap();
        match cli.command {
            Some(Commands::Check {
                domains,
                format,
                server,
            }) => {
                assert_eq!(domains, vec!["example.com"]);
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(server, None);
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn test_check_server_override() {
        let cli = Cli::try_parse_from(["domwatch", "check", "free.dev", "--server", "whois.nic.google"])
            .unwrap();
        match cli.command {
            Some(Commands::Check { server, .. }) => {
                assert_eq!(server.as_deref(), Some("whois.nic.google"));
            }
            _ => panic!("expected check"),
        }
    }
}
