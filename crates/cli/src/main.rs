//! `hlautomate` CLI entry-point.
//!
//! Available sub-commands:
//! - `run`       — execute a batch of items against the API.
//! - `map`       — print the HTTP call each item maps to, without sending.
//! - `timezones` — list timezone options for location forms.
//! - `verify`    — check that the credentials can log in.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine::{parse_items, BatchExecutor, ExecutorConfig};
use nodes::http::{ReqwestTransport, DEFAULT_TIMEOUT};
use nodes::{ApiEndpoints, ApiVersion, Credentials, HlAutomateNode};

#[derive(Parser)]
#[command(
    name = "hlautomate",
    about = "Run HL Automate CRM operations from JSON item batches",
    version
)]
struct Cli {
    #[command(flatten)]
    account: AccountArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct AccountArgs {
    /// API generation the credentials belong to.
    #[arg(long, global = true, env = "HLA_API_VERSION", default_value = "v1")]
    api_version: ApiVersion,

    #[arg(long, global = true, env = "HLA_EMAIL")]
    email: Option<String>,

    #[arg(long, global = true, env = "HLA_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Agency API key, required by V1 location, user and calendar writes.
    #[arg(long, global = true, env = "HLA_AGENCY_KEY", hide_env_values = true)]
    agency_key: Option<String>,

    /// Override the API host, e.g. `https://staging.example.com`.
    #[arg(long, global = true, env = "HLA_API_HOST")]
    api_host: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Execute every item in a JSON file and print the results.
    Run {
        /// Path to a JSON array of items (or a single item object).
        path: PathBuf,
        /// Record failures as `{ "error": ... }` and keep going.
        #[arg(long)]
        continue_on_fail: bool,
        /// Reuse access tokens for this many seconds.
        #[arg(long)]
        token_ttl_secs: Option<u64>,
        #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
        timeout_secs: u64,
    },
    /// Print the HTTP call each item maps to. Sends nothing.
    Map {
        path: PathBuf,
    },
    /// List timezone options, falling back to a built-in list.
    Timezones,
    /// Log in once to check the credentials.
    Verify,
}

impl AccountArgs {
    fn endpoints(&self) -> ApiEndpoints {
        self.api_host
            .as_deref()
            .map(ApiEndpoints::with_host)
            .unwrap_or_default()
    }

    /// Credentials for commands that never log in; blank login is fine.
    fn offline_credentials(&self) -> Credentials {
        self.build(
            self.email.clone().unwrap_or_default(),
            self.password.clone().unwrap_or_default(),
        )
    }

    fn credentials(&self) -> Result<Credentials> {
        let Some(email) = self.email.clone() else {
            bail!("missing --email (or HLA_EMAIL)");
        };
        let Some(password) = self.password.clone() else {
            bail!("missing --password (or HLA_PASSWORD)");
        };
        Ok(self.build(email, password))
    }

    fn build(&self, email: String, password: String) -> Credentials {
        let credentials = Credentials::new(self.api_version, email, password);
        match &self.agency_key {
            Some(key) => credentials.with_agency_key(key.clone()),
            None => credentials,
        }
    }

    fn node(&self) -> Result<HlAutomateNode> {
        let transport = ReqwestTransport::new(DEFAULT_TIMEOUT).context("cannot build HTTP client")?;
        Ok(HlAutomateNode::new(Arc::new(transport)).with_endpoints(self.endpoints()))
    }
}

fn read_items(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read file {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("invalid JSON in {}", path.display()))?;
    Ok(parse_items(value)?)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let account = &cli.account;

    match &cli.command {
        Command::Run {
            path,
            continue_on_fail,
            token_ttl_secs,
            timeout_secs,
        } => {
            let items = read_items(path)?;
            let credentials = Arc::new(account.credentials()?);
            let config = ExecutorConfig {
                continue_on_fail: *continue_on_fail,
                token_ttl: token_ttl_secs.map(Duration::from_secs),
                request_timeout: Duration::from_secs(*timeout_secs),
            };
            info!("Running {} items from {}", items.len(), path.display());

            let executor = BatchExecutor::for_hlautomate(account.endpoints(), config)?;
            let outcome = executor.run(items, credentials).await?;
            print_json(&outcome.results)?;
        }
        Command::Map { path } => {
            let items = read_items(path)?;
            let credentials = account.offline_credentials();
            let node = account.node()?;

            let planned: Vec<Value> = items
                .into_iter()
                .enumerate()
                .map(|(index, item)| match node.plan(item, &credentials) {
                    Ok(call) => json!({ "item": index, "call": call }),
                    Err(e) => json!({ "item": index, "error": e.to_string() }),
                })
                .collect();
            print_json(&planned)?;
        }
        Command::Timezones => {
            let credentials = account.credentials()?;
            let list = account.node()?.timezones(&credentials).await;
            print_json(&list)?;
        }
        Command::Verify => {
            let credentials = account.credentials()?;
            account.node()?.verify_credentials(&credentials).await?;
            println!("Credentials OK ({} API)", credentials.api_version);
        }
    }

    Ok(())
}
