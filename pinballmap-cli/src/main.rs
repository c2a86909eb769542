//! pinballmap - command-line access to the Pinball Map API
//!
//! Looks up machines in the catalog, lists and syncs the machines at a
//! location, and manages the account used for writes.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pinballmap_core::cache::CacheBackend;
use pinballmap_core::config::{ENV_EMAIL, ENV_PASSWORD};
use pinballmap_core::{ClientConfig, PinballMapClient};

mod output;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "pinballmap",
    about = "Interact with the Pinball Map API",
    after_help = "Happy flipping!",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Location id to list or update
    #[clap(short = 'l', long = "location", global = true)]
    location: Option<u64>,

    /// Region name (e.g., chicago), needed to remove machines
    #[clap(short, long, global = true)]
    region: Option<String>,

    /// API authentication token (needed for all write operations)
    #[clap(short, long, global = true)]
    token: Option<String>,

    /// User email address (needed for all write operations)
    #[clap(short, long, global = true)]
    email: Option<String>,

    /// Account password, used to obtain a token
    #[clap(long, env = "PINBALLMAP_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Configuration file (defaults to the platform config directory)
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Always fetch fresh data
    #[clap(long, global = true)]
    no_cache: bool,

    /// Log write operations instead of sending them
    #[clap(long, global = true)]
    dry_run: bool,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find machines by name
    Search {
        /// Machine name, e.g. "attack from mars"
        #[clap(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Drop matches scoring below this
        #[clap(long)]
        min_score: Option<i32>,

        /// Show each match's score
        #[clap(long)]
        scores: bool,

        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },

    /// Find a machine by its Pinball Map id
    MachineId { id: u64 },

    /// Find a machine by its IPDB id
    MachineIpdb { id: u64 },

    /// List the machines at a location
    LocMachines {
        /// Print only a comma-separated list of machine ids
        #[clap(short, long)]
        id_only: bool,

        /// Output results as JSON
        #[clap(long, conflicts_with = "id_only")]
        json: bool,
    },

    /// Show what would change to make the location list exactly these machines
    Compare {
        /// Machine ids, comma-separated
        #[clap(value_delimiter = ',', required = true)]
        ids: Vec<u64>,
    },

    /// Add a machine to the location
    Add { machine_id: u64 },

    /// Remove a machine from the location
    Remove { machine_id: u64 },

    /// Add and remove machines so the location lists exactly these
    Sync {
        /// Machine ids, comma-separated
        #[clap(value_delimiter = ',', required = true)]
        ids: Vec<u64>,
    },

    /// Log in with email and password and print the API token
    Login,

    /// Create an account (logs in instead if it already exists)
    Signup {
        #[clap(long)]
        username: String,
    },

    /// Manage cached API responses
    Cache {
        #[clap(subcommand)]
        command: CacheCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// Delete every cached response
    Clear,
}

/// Initialize tracing from --log-level
///
/// Logs go to stderr so tables and JSON on stdout stay clean.
fn initialize_tracing(log_level: &LogLevel) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level.to_filter_directive()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// File and environment settings with command-line flags on top
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config =
        ClientConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(location) = cli.location {
        config.location_id = Some(location);
    }
    if let Some(region) = &cli.region {
        config.region_name = Some(region.clone());
    }
    if let Some(token) = &cli.token {
        config.authentication_token = Some(token.clone());
    }
    if let Some(email) = &cli.email {
        config.user_email = Some(email.clone());
    }
    if let Some(password) = &cli.password {
        config.user_password = Some(password.clone());
    }
    if cli.dry_run {
        config.dry_run = true;
    }
    if cli.no_cache {
        config.cache.backend = CacheBackend::None;
    }

    config.validate()?;
    debug!(
        "Using {} (location {:?}, region {:?}, dry run {})",
        config.base_url, config.location_id, config.region_name, config.dry_run
    );
    Ok(config)
}

/// Email and password for the account commands
fn account_credentials(config: &ClientConfig) -> Result<(String, String)> {
    match (&config.user_email, &config.user_password) {
        (Some(email), Some(password)) => Ok((email.clone(), password.clone())),
        _ => bail!(
            "This command needs --email and --password (or {ENV_EMAIL} and {ENV_PASSWORD})"
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level);

    let config = build_config(&cli)?;
    run(cli.command, config).await
}

async fn run(command: Command, config: ClientConfig) -> Result<()> {
    match command {
        Command::Login => login_command(config).await,
        Command::Signup { username } => signup_command(config, &username).await,
        Command::Cache {
            command: CacheCommand::Clear,
        } => cache_clear_command(config),
        command => {
            let client = PinballMapClient::new(config).await?;
            api_command(&client, command).await
        }
    }
}

/// Commands that talk to the API through a connected client
async fn api_command(client: &PinballMapClient, command: Command) -> Result<()> {
    match command {
        Command::Search {
            query,
            min_score,
            scores,
            json,
        } => {
            let query = query.join(" ");
            let hits = client.machine_by_name(&query, min_score).await?;
            if hits.is_empty() {
                println!("{}", output::NO_MATCHES);
            } else {
                output::print_matches(&hits, scores, json)?;
            }
        }
        Command::MachineId { id } => match client.machine_by_map_id(id).await? {
            Some(machine) => output::print_machines(&[machine], false)?,
            None => println!("No match."),
        },
        Command::MachineIpdb { id } => match client.machine_by_ipdb_id(id).await? {
            Some(machine) => output::print_machines(&[machine], false)?,
            None => println!("No match."),
        },
        Command::LocMachines { id_only, json } => {
            let machines = client.machines_at_location(None).await?;
            println!("{}", output::location_listing(&machines, id_only, json)?);
        }
        Command::Compare { ids } => {
            let diff = client.compare_location(ids).await?;
            output::print_diff(&diff);
        }
        Command::Add { machine_id } => match client.add_machine(machine_id).await? {
            Some(_) => println!("Added machine {machine_id}."),
            None => println!("Dry run: machine {machine_id} not added."),
        },
        Command::Remove { machine_id } => match client.remove_machine(machine_id).await? {
            Some(_) => println!("Removed machine {machine_id}."),
            None => println!("Machine {machine_id} not removed."),
        },
        Command::Sync { ids } => {
            let report = client.update_map(ids).await?;
            output::print_sync_report(&report);
            if report.error_count > 0 {
                bail!("{} machine(s) failed to sync", report.error_count);
            }
        }
        Command::Login | Command::Signup { .. } | Command::Cache { .. } => {}
    }

    Ok(())
}

async fn login_command(config: ClientConfig) -> Result<()> {
    let (email, password) = account_credentials(&config)?;
    let client = PinballMapClient::build(config)?;

    let user = client
        .auth_details(&email, &password, false)
        .await
        .with_context(|| format!("Could not log in as {email}"))?;
    println!("{}", user.authentication_token);
    Ok(())
}

async fn signup_command(config: ClientConfig, username: &str) -> Result<()> {
    let (email, password) = account_credentials(&config)?;
    let client = PinballMapClient::build(config)?;

    let user = client
        .signup_user(username, &email, &password, false)
        .await
        .with_context(|| format!("Could not create or log into account {email}"))?;
    println!("{}", user.authentication_token);
    Ok(())
}

fn cache_clear_command(config: ClientConfig) -> Result<()> {
    let cache = config
        .cache
        .build()
        .context("Failed to open the response cache")?;
    cache.clear()?;
    println!("Cleared {} cache.", cache.name());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pinballmap",
            "loc-machines",
            "-l",
            "42",
            "--id-only",
            "--no-cache",
        ])
        .unwrap();

        assert_eq!(cli.location, Some(42));
        assert!(cli.no_cache);
        assert!(matches!(
            cli.command,
            Command::LocMachines {
                id_only: true,
                json: false
            }
        ));
    }

    #[test]
    fn test_search_joins_words() {
        let cli = Cli::try_parse_from(["pinballmap", "search", "attack", "from", "mars", "--scores"])
            .unwrap();
        match cli.command {
            Command::Search { query, scores, .. } => {
                assert_eq!(query.join(" "), "attack from mars");
                assert!(scores);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_search_requires_query() {
        assert!(Cli::try_parse_from(["pinballmap", "search"]).is_err());
    }

    #[test]
    fn test_sync_takes_comma_separated_ids() {
        let cli = Cli::try_parse_from(["pinballmap", "sync", "1,22,333", "-t", "tok", "-e", "a@b.c"])
            .unwrap();
        match cli.command {
            Command::Sync { ids } => assert_eq!(ids, vec![1, 22, 333]),
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.token.as_deref(), Some("tok"));
        assert_eq!(cli.email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn test_compare_rejects_non_numeric_ids() {
        assert!(Cli::try_parse_from(["pinballmap", "compare", "1,two"]).is_err());
    }

    #[test]
    fn test_json_conflicts_with_id_only() {
        assert!(Cli::try_parse_from(["pinballmap", "loc-machines", "--json", "--id-only"]).is_err());
    }

    #[test]
    fn test_cache_clear_and_signup() {
        let cli = Cli::try_parse_from(["pinballmap", "cache", "clear"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Cache {
                command: CacheCommand::Clear
            }
        ));

        let cli = Cli::try_parse_from(["pinballmap", "signup", "--username", "flipper"]).unwrap();
        assert!(matches!(cli.command, Command::Signup { ref username } if username == "flipper"));
    }

    #[test]
    fn test_log_level_default() {
        let cli = Cli::try_parse_from(["pinballmap", "login"]).unwrap();
        assert_eq!(cli.log_level.to_filter_directive(), "warn");
    }

    #[test]
    fn test_account_credentials_need_both() {
        let config = ClientConfig {
            user_email: Some("a@b.c".to_string()),
            ..ClientConfig::default()
        };
        assert!(account_credentials(&config).is_err());

        let config = ClientConfig {
            user_password: Some("pw".to_string()),
            ..config
        };
        assert_eq!(
            account_credentials(&config).unwrap(),
            ("a@b.c".to_string(), "pw".to_string())
        );
    }
}
