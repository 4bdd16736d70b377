use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use htlc_sdk::{commitment_digest, hashlock, parse_secret};
use htlc_simulator::{Address, EngineConfig, Hash32, SimulatorStore};

#[derive(Parser)]
#[command(name = "htlc-simulator", version, about = "Simulated inheritance HTLC ledger")]
struct Cli {
    /// Directory to store simulator state
    #[arg(long, global = true, default_value = "htlc_simulator_state")]
    state_dir: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reset the simulator state
    Init {
        #[arg(long, default_value_t = false)]
        allow_direct_claim: bool,
        /// Starting ledger time (defaults to the wall clock)
        #[arg(long)]
        start_time: Option<i64>,
    },
    /// Credit an account with tokens
    Mint {
        /// Asset label or 32-byte hex
        #[arg(long)]
        asset: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: u64,
    },
    /// Lock tokens behind a hashlock and deadline
    CreateLock {
        #[arg(long)]
        depositor: String,
        #[arg(long)]
        asset: String,
        #[arg(long)]
        amount: u64,
        /// Secret whose hash becomes the hashlock
        #[arg(long, conflicts_with = "hashlock")]
        secret: Option<String>,
        /// Hashlock as 32-byte hex
        #[arg(long)]
        hashlock: Option<String>,
        /// Seconds from the current ledger time until the lock opens
        #[arg(long)]
        unlock_in: i64,
    },
    /// Bind a future reveal to a committer
    Commit {
        #[arg(long)]
        lock_id: u64,
        #[arg(long)]
        committer: String,
        #[arg(long)]
        secret: String,
        #[arg(long)]
        salt: String,
    },
    /// Reveal the secret and salt and take the funds
    Reveal {
        #[arg(long)]
        lock_id: u64,
        #[arg(long)]
        caller: String,
        #[arg(long)]
        secret: String,
        #[arg(long)]
        salt: String,
    },
    /// Claim with the secret alone (requires --allow-direct-claim at init)
    Claim {
        #[arg(long)]
        lock_id: u64,
        #[arg(long)]
        caller: String,
        #[arg(long)]
        secret: String,
    },
    /// Move ledger time and block height forward
    Advance {
        #[arg(long, default_value_t = 0)]
        seconds: i64,
        #[arg(long, default_value_t = 0)]
        blocks: u64,
    },
    /// Print a lock, or the whole state
    Show {
        #[arg(long)]
        lock_id: Option<u64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = SimulatorStore::open(&cli.state_dir)
        .with_context(|| format!("open simulator at {}", cli.state_dir.display()))?;

    let mut engine = match &cli.command {
        Command::Init {
            allow_direct_claim,
            start_time,
        } => store.init(
            EngineConfig {
                allow_direct_claim: *allow_direct_claim,
            },
            start_time.unwrap_or_else(now_unix),
        )?,
        _ => store.load_or_init(now_unix())?,
    };

    let output = match cli.command {
        Command::Init { .. } => json!({ "config": engine.config(), "clock": engine.clock() }),
        Command::Mint { asset, to, amount } => {
            let balance = engine
                .ledger_mut()
                .mint(Address::parse(&asset), Address::parse(&to), amount)?;
            json!({ "balance": balance })
        }
        Command::CreateLock {
            depositor,
            asset,
            amount,
            secret,
            hashlock: hashlock_hex,
            unlock_in,
        } => {
            let lock_hash = match (secret, hashlock_hex) {
                (Some(secret), None) => Hash32(hashlock(&parse_secret(&secret)?)),
                (None, Some(hex_value)) => Hash32::from_hex(&hex_value).context("invalid hashlock")?,
                _ => return Err(anyhow!("provide exactly one of --secret or --hashlock")),
            };
            let unlock_time = engine.clock().now.saturating_add(unlock_in);
            let lock_id = engine.create_lock(
                Address::parse(&depositor),
                Address::parse(&asset),
                amount,
                lock_hash,
                unlock_time,
            )?;
            json!({ "lock_id": lock_id, "unlock_time": unlock_time, "hashlock": lock_hash })
        }
        Command::Commit {
            lock_id,
            committer,
            secret,
            salt,
        } => {
            let committer = Address::parse(&committer);
            let digest = commitment_digest(
                lock_id,
                &committer.0,
                &parse_secret(&secret)?,
                &parse_secret(&salt)?,
            );
            let commit_block = engine.commit(committer, lock_id, Hash32(digest))?;
            json!({ "lock_id": lock_id, "commit_block": commit_block, "commitment": Hash32(digest) })
        }
        Command::Reveal {
            lock_id,
            caller,
            secret,
            salt,
        } => {
            engine.reveal_and_claim(
                Address::parse(&caller),
                lock_id,
                &parse_secret(&secret)?,
                &parse_secret(&salt)?,
            )?;
            json!({ "lock": engine.get_lock(lock_id)? })
        }
        Command::Claim {
            lock_id,
            caller,
            secret,
        } => {
            engine.claim(Address::parse(&caller), lock_id, &parse_secret(&secret)?)?;
            json!({ "lock": engine.get_lock(lock_id)? })
        }
        Command::Advance { seconds, blocks } => json!({ "clock": engine.advance(seconds, blocks) }),
        Command::Show { lock_id: Some(id) } => json!({
            "lock": engine.get_lock(id)?,
            "commitment": engine.commitments().get(id),
            "status": engine.lock_status(id)?,
        }),
        Command::Show { lock_id: None } => serde_json::to_value(&engine)?,
    };

    store.save(&engine)?;
    print_json(output)
}

fn print_json(value: serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
