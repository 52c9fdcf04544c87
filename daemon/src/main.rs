//! proxyvote: inspect governors and tally proposals over a persisted
//! governance store.

mod config;
mod error;
mod snapshot;

use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use proxyvote_governance::{GovernorKeeper, PageRequest};
use proxyvote_store_lmdb::LmdbEnvironment;
use proxyvote_types::ProposalId;
use proxyvote_utils::LogFormat;

use crate::config::CliConfig;
use crate::snapshot::Snapshot;

#[derive(Parser)]
#[command(name = "proxyvote", about = "Delegation-weighted governor voting")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base; flags
    /// and env vars override them.
    #[arg(long, env = "PROXYVOTE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory of the governance store.
    #[arg(long, env = "PROXYVOTE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// JSON snapshot with the staking ledger and the governance state.
    /// Required by every command except `config`.
    #[arg(long, env = "PROXYVOTE_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Maximum number of governors counted in a tally.
    #[arg(long, env = "PROXYVOTE_MAX_GOVERNORS")]
    max_governors: Option<u64>,

    /// Minimum bonded tokens for a governor to be counted.
    #[arg(long, env = "PROXYVOTE_MIN_SELF_DELEGATION")]
    min_self_delegation: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "PROXYVOTE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "PROXYVOTE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// List governors.
    Governors {
        /// Only the governors a tally would count, strongest first.
        #[arg(long)]
        top: bool,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Show one governor.
    Governor { address: String },
    /// Show the governance delegation of an account.
    Delegation { account: String },
    /// List the accounts delegating to a governor.
    Delegations {
        governor: String,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// List a governor's shares per validator.
    ValShares {
        governor: String,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Tally the governor votes cast on a proposal.
    Tally { proposal: u64 },
    /// Print the effective configuration as TOML.
    Config,
}

fn load_config(cli: &Cli) -> anyhow::Result<CliConfig> {
    let mut config = match &cli.config {
        Some(path) => CliConfig::from_toml_file(path)?,
        None => CliConfig::default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(max) = cli.max_governors {
        config.governance.max_governors = max;
    }
    if let Some(min) = &cli.min_self_delegation {
        config.governance.min_governor_self_delegation = min.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    if let Command::Config = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }
    proxyvote_utils::init_logging(config.log_format, &config.log_level)?;

    let snapshot_path = cli
        .snapshot
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("--snapshot is required"))?;
    let snapshot = Snapshot::from_json_file(snapshot_path)?;
    let env = LmdbEnvironment::open(&config.data_dir, config.map_size_bytes())?;
    let keeper = GovernorKeeper::new(
        env.kv_store(),
        snapshot.staking_oracle(),
        config.governance.clone(),
    );
    snapshot.import_into(&keeper)?;

    match cli.command {
        Command::Governors { top, offset, limit } => {
            if top {
                print_json(&keeper.top_governors()?)?;
            } else {
                print_json(&keeper.query_governors(PageRequest::new(offset, limit))?)?;
            }
        }
        Command::Governor { address } => print_json(&keeper.query_governor(&address)?)?,
        Command::Delegation { account } => {
            print_json(&keeper.query_governance_delegation(&account)?)?
        }
        Command::Delegations {
            governor,
            offset,
            limit,
        } => print_json(
            &keeper.query_governance_delegations(&governor, PageRequest::new(offset, limit))?,
        )?,
        Command::ValShares {
            governor,
            offset,
            limit,
        } => print_json(
            &keeper.query_governor_val_shares(&governor, PageRequest::new(offset, limit))?,
        )?,
        Command::Tally { proposal } => {
            let proposal = ProposalId::new(proposal);
            let tally = keeper
                .tally_engine()
                .tally(proposal, &snapshot.votes_for(proposal))?;
            tracing::info!(
                proposal = %proposal,
                governors = tally.governors_counted,
                "tally complete"
            );
            print_json(&tally)?;
        }
        Command::Config => unreachable!("handled before the store is opened"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxyvote.toml");
        std::fs::write(
            &path,
            "log_level = \"debug\"\n\n[governance]\nmax_governors = 5\nmin_governor_self_delegation = \"10\"\n",
        )
        .unwrap();

        let cli = Cli::parse_from([
            "proxyvote",
            "--config",
            path.to_str().unwrap(),
            "--snapshot",
            "snap.json",
            "--max-governors",
            "2",
            "--log-format",
            "json",
            "tally",
            "7",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.governance.max_governors, 2);
        assert_eq!(config.governance.min_governor_self_delegation, "10");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Command::Tally { proposal: 7 }));
    }

    #[test]
    fn lmdb_store_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = Snapshot::from_json_str(
            r#"{
                "validators": [{ "address": "val1a", "bonded_tokens": "100", "delegator_shares": "100" }],
                "delegations": [{ "delegator": "acc1alice", "validator": "val1a", "shares": "40" }],
                "governors": [{ "address": "gov1alice", "description": { "moniker": "alice" } }]
            }"#,
        )
        .unwrap();
        let params = proxyvote_governance::GovernorParams::default();

        {
            let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
            let keeper = GovernorKeeper::new(env.kv_store(), snapshot.staking_oracle(), params.clone());
            assert!(snapshot.import_into(&keeper).unwrap());
        }

        let env = LmdbEnvironment::open(dir.path(), 1 << 20).unwrap();
        let keeper = GovernorKeeper::new(env.kv_store(), snapshot.staking_oracle(), params);
        assert!(!snapshot.import_into(&keeper).unwrap());
        let alice = keeper.query_governor("gov1alice").unwrap();
        assert_eq!(alice.voting_power.to_string(), "40");
    }
}
