use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use htlc_sdk::{
    commitment_digest, generate_human_secret, hashlock, hex_encode, parse_account, parse_secret,
    random_hex, BackupTicket, DEFAULT_SALT_LEN,
};
use serde_json::json;

#[derive(Parser)]
#[command(name = "htlc-sdk", version, about = "Client-side hashlock and commitment tooling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a fresh secret and print it with its hashlock
    Secret {
        /// Base64url secret a person can copy by hand instead of 32 hex bytes
        #[arg(long, default_value_t = false)]
        human: bool,
    },
    /// Print SHA-256(secret)
    Hashlock {
        #[arg(long)]
        secret: String,
    },
    /// Print the commit digest for a planned reveal
    Commitment {
        #[arg(long)]
        lock_id: u64,
        /// Committer account (base58 or hex)
        #[arg(long)]
        committer: String,
        #[arg(long)]
        secret: String,
        /// Salt (0x-hex or text); a random 32-byte salt is drawn if omitted
        #[arg(long)]
        salt: Option<String>,
    },
    /// Write a backup ticket for a lock
    WriteTicket {
        #[arg(long)]
        output: PathBuf,
        #[arg(long)]
        program_id: String,
        #[arg(long)]
        lock_id: u64,
        #[arg(long)]
        token_mint: String,
        #[arg(long)]
        amount: u64,
        #[arg(long)]
        unlock_time: i64,
        #[arg(long)]
        secret: String,
    },
    /// Check that a backup ticket's secret opens its hashlock
    VerifyTicket {
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Command::Secret { human } => {
            let secret = if human {
                generate_human_secret()
            } else {
                random_hex(32)
            };
            let bytes = parse_secret(&secret)?;
            print_json(json!({
                "secret": secret,
                "hashlock": hex_encode(&hashlock(&bytes)),
            }))
        }
        Command::Hashlock { secret } => {
            let bytes = parse_secret(&secret)?;
            println!("{}", hex_encode(&hashlock(&bytes)));
            Ok(())
        }
        Command::Commitment {
            lock_id,
            committer,
            secret,
            salt,
        } => {
            let committer = parse_account(&committer)?;
            let secret = parse_secret(&secret)?;
            let salt = match salt {
                Some(value) => value,
                None => random_hex(DEFAULT_SALT_LEN),
            };
            let salt_bytes = parse_secret(&salt)?;
            let digest = commitment_digest(lock_id, &committer, &secret, &salt_bytes);
            print_json(json!({
                "lock_id": lock_id,
                "salt": salt,
                "commitment": hex_encode(&digest),
            }))
        }
        Command::WriteTicket {
            output,
            program_id,
            lock_id,
            token_mint,
            amount,
            unlock_time,
            secret,
        } => {
            let ticket =
                BackupTicket::new(program_id, lock_id, token_mint, amount, unlock_time, &secret)?;
            ticket.save(&output)?;
            println!("wrote ticket: {}", output.display());
            Ok(())
        }
        Command::VerifyTicket { input } => {
            let ticket = BackupTicket::load(&input)?;
            ticket
                .verify()
                .map_err(|err| anyhow!("ticket {} rejected: {err}", input.display()))?;
            println!("ticket ok: lock {} hashlock {}", ticket.lock_id, ticket.hashlock);
            Ok(())
        }
    }
}

fn print_json(value: serde_json::Value) -> Result<()> {
    let out = serde_json::to_string_pretty(&value).context("serialize output")?;
    println!("{out}");
    Ok(())
}
