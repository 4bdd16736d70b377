use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use solana_client::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair, Signer};
#[allow(deprecated)]
use solana_sdk::system_instruction::create_account;
use solana_sdk::transaction::Transaction;
use spl_associated_token_account::get_associated_token_address;
use spl_associated_token_account::instruction::create_associated_token_account;
use spl_token::instruction as token_instruction;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use claim_coordinator::config::{validate_nonzero, validate_program_id, validate_rpc_url, PollConfig};
use claim_coordinator::db::{ClaimDb, JsonFileDb};
use claim_coordinator::driver::{run_to_completion, HtlcClient};
use claim_coordinator::metrics::TracingMetrics;
use claim_coordinator::sim::SimulatedHtlcClient;
use claim_coordinator::solana::SolanaHtlcClient;
use claim_coordinator::state::ClaimState;
use htlc_sdk::{generate_human_secret, hashlock, hex_encode, parse_secret, BackupTicket};
use htlc_simulator::{Address, ChainClock, EngineConfig, Hash32, HtlcEngine, InMemoryLedger};

const DEFAULT_PROGRAM_ID: &str = "HoTf5fr61SusB2drkWZuQXVouMfjHRErQ9ekDUe9Q8my";

#[derive(Parser)]
#[command(name = "claim-coordinator", version, about = "Inheritance HTLC orchestration CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the program's registry account (once per deployment)
    InitRegistry(InitRegistryArgs),
    /// Create a new mint and fund the depositor (localnet)
    SetupMint(SetupMintArgs),
    /// Lock tokens for a beneficiary and write a backup ticket
    CreateLock(CreateLockArgs),
    /// Commit, wait out the delays, and reveal to claim a lock
    Claim(ClaimArgs),
    /// Show a lock, its commitment, and the local claim state
    Status(StatusArgs),
    /// Run a full create/commit/reveal flow against the in-process simulator
    Simulate(SimulateArgs),
}

#[derive(Args)]
struct Network {
    /// Solana RPC URL
    #[arg(long, default_value = "http://127.0.0.1:8899")]
    rpc: String,
    /// Program ID (inheritance_htlc)
    #[arg(long, default_value = DEFAULT_PROGRAM_ID)]
    program_id: String,
}

impl Network {
    fn validate(&self) -> Result<Pubkey> {
        validate_rpc_url("rpc", &self.rpc)?;
        validate_program_id(&self.program_id)
    }
}

#[derive(Args)]
struct InitRegistryArgs {
    #[command(flatten)]
    network: Network,
    /// Admin keypair path (pays for the registry account)
    #[arg(long)]
    admin: PathBuf,
    /// Enable the front-runnable direct claim path
    #[arg(long, default_value_t = false)]
    allow_direct_claim: bool,
}

#[derive(Args)]
struct SetupMintArgs {
    /// Solana RPC URL
    #[arg(long, default_value = "http://127.0.0.1:8899")]
    rpc: String,
    /// Depositor keypair path
    #[arg(long)]
    depositor: PathBuf,
    /// Amount to mint (base units)
    #[arg(long)]
    amount: u64,
    /// Mint decimals
    #[arg(long, default_value_t = 9)]
    decimals: u8,
    /// Optional airdrop lamports (localnet)
    #[arg(long)]
    airdrop: Option<u64>,
}

#[derive(Args)]
struct CreateLockArgs {
    #[command(flatten)]
    network: Network,
    /// Depositor keypair path
    #[arg(long)]
    depositor: PathBuf,
    /// Token mint address
    #[arg(long)]
    mint: String,
    /// Amount in base units
    #[arg(long)]
    amount: u64,
    /// Seconds from now until the lock opens
    #[arg(long, default_value_t = 3600)]
    unlock_in: u64,
    /// Secret to lock with (generated if omitted)
    #[arg(long)]
    secret: Option<String>,
    /// Backup ticket output path
    #[arg(long, default_value = "tickets/lock.json")]
    ticket: PathBuf,
}

#[derive(Args)]
struct ClaimArgs {
    #[command(flatten)]
    network: Network,
    /// Claimer keypair path (commits and receives the funds)
    #[arg(long)]
    claimer: PathBuf,
    /// Backup ticket holding the lock id and secret
    #[arg(long, conflicts_with_all = ["lock_id", "secret"])]
    ticket: Option<PathBuf>,
    #[arg(long, requires = "secret")]
    lock_id: Option<u64>,
    #[arg(long, requires = "lock_id")]
    secret: Option<String>,
    /// Claim state directory
    #[arg(long, default_value = "claim_state")]
    state_dir: PathBuf,
}

#[derive(Args)]
struct StatusArgs {
    #[command(flatten)]
    network: Network,
    #[arg(long)]
    lock_id: u64,
    /// Claim state directory
    #[arg(long, default_value = "claim_state")]
    state_dir: PathBuf,
}

#[derive(Args)]
struct SimulateArgs {
    #[arg(long, default_value_t = 10)]
    amount: u64,
    #[arg(long, default_value_t = 3600)]
    unlock_in: i64,
    #[arg(long, default_value = "my-secret")]
    secret: String,
    /// Simulated seconds that pass per poll
    #[arg(long, default_value_t = 600)]
    seconds_per_poll: i64,
    /// Claim state directory
    #[arg(long, default_value = "claim_state_sim")]
    state_dir: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::InitRegistry(args) => run_init_registry(args),
        Command::SetupMint(args) => run_setup_mint(args),
        Command::CreateLock(args) => run_create_lock(args),
        Command::Claim(args) => run_claim(args).await,
        Command::Status(args) => run_status(args),
        Command::Simulate(args) => run_simulate(args).await,
    }
}

fn read_keypair(label: &str, path: &PathBuf) -> Result<Keypair> {
    read_keypair_file(path).map_err(|err| anyhow!("read {label} keypair {}: {}", path.display(), err))
}

fn run_init_registry(args: InitRegistryArgs) -> Result<()> {
    let program_id = args.network.validate()?;
    let admin = read_keypair("admin", &args.admin)?;
    let client = SolanaHtlcClient::observer(&args.network.rpc, program_id);
    let sig = client.initialize_registry(&admin, args.allow_direct_claim)?;
    println!("registry initialized: {sig}");
    Ok(())
}

fn run_setup_mint(args: SetupMintArgs) -> Result<()> {
    validate_rpc_url("rpc", &args.rpc)?;
    validate_nonzero("amount", args.amount)?;
    let depositor = read_keypair("depositor", &args.depositor)?;
    let rpc = RpcClient::new_with_commitment(args.rpc.clone(), CommitmentConfig::confirmed());
    if let Some(lamports) = args.airdrop {
        let sig = rpc.request_airdrop(&depositor.pubkey(), lamports)?;
        rpc.confirm_transaction(&sig)?;
    }
    let mint = create_mint_and_fund(&rpc, &depositor, args.amount, args.decimals)?;
    println!("mint: {mint}");
    Ok(())
}

fn run_create_lock(args: CreateLockArgs) -> Result<()> {
    let program_id = args.network.validate()?;
    validate_nonzero("amount", args.amount)?;
    validate_nonzero("unlock-in", args.unlock_in)?;
    let depositor = read_keypair("depositor", &args.depositor)?;
    let token_mint: Pubkey = args.mint.parse().context("invalid mint address")?;

    let secret_text = Zeroizing::new(args.secret.unwrap_or_else(generate_human_secret));
    let secret = Zeroizing::new(parse_secret(&secret_text)?);
    let client = SolanaHtlcClient::observer(&args.network.rpc, program_id);

    let now = client.fetch_clock()?.unix_timestamp;
    let unlock_time = now.saturating_add(i64::try_from(args.unlock_in).context("unlock-in too large")?);
    let (lock_id, sig) =
        client.create_lock(&depositor, token_mint, args.amount, hashlock(&secret), unlock_time)?;
    info!(lock_id, unlock_time, %sig, "lock created");

    let ticket = BackupTicket::new(
        program_id.to_string(),
        lock_id,
        token_mint.to_string(),
        args.amount,
        unlock_time,
        &secret_text,
    )?;
    ticket.save(&args.ticket)?;
    println!("lock_id: {lock_id}");
    println!("unlock_time: {unlock_time}");
    println!("ticket: {}", args.ticket.display());
    Ok(())
}

async fn run_claim(args: ClaimArgs) -> Result<()> {
    let program_id = args.network.validate()?;
    let (lock_id, secret) = match (&args.ticket, args.lock_id, &args.secret) {
        (Some(path), _, _) => {
            let ticket = BackupTicket::load(path)?;
            ticket.verify()?;
            if ticket.program_id != program_id.to_string() {
                return Err(anyhow!(
                    "ticket is for program {}, not {program_id}",
                    ticket.program_id
                ));
            }
            (ticket.lock_id, Zeroizing::new(parse_secret(&ticket.secret)?))
        }
        (None, Some(lock_id), Some(secret)) => (lock_id, Zeroizing::new(parse_secret(secret)?)),
        _ => return Err(anyhow!("provide --ticket or both --lock-id and --secret")),
    };

    let claimer = read_keypair("claimer", &args.claimer)?;
    let client = SolanaHtlcClient::new(&args.network.rpc, program_id, claimer);
    let db = JsonFileDb::new(&args.state_dir)?;
    let initial = match db.load(lock_id)? {
        Some(state) => state,
        None => ClaimState::pending(lock_id, client.claimer_label()),
    };
    db.save(&initial)?;

    let final_state = run_to_completion(
        initial,
        &db,
        &client,
        &TracingMetrics,
        &secret,
        &PollConfig::from_env(),
    )
    .await?;
    println!("{}", serde_json::to_string_pretty(&final_state)?);
    Ok(())
}

fn run_status(args: StatusArgs) -> Result<()> {
    let program_id = args.network.validate()?;
    let client = SolanaHtlcClient::observer(&args.network.rpc, program_id);
    let lock = client.fetch_lock(args.lock_id)?;
    let commitment = client.fetch_commitment(args.lock_id)?;
    let clock = client.fetch_clock()?;
    let local = JsonFileDb::new(&args.state_dir)?.load(args.lock_id)?;

    let out = json!({
        "lock": {
            "id": lock.id,
            "depositor": lock.depositor.to_string(),
            "token_mint": lock.token_mint.to_string(),
            "amount": lock.amount,
            "hashlock": hex_encode(&lock.hashlock),
            "unlock_time": lock.unlock_time,
            "claimed": lock.claimed,
        },
        "commitment": commitment.map(|c| json!({
            "committer": c.committer.to_string(),
            "digest": hex_encode(&c.digest),
            "commit_slot": c.commit_slot,
            "reveal_slot": c.reveal_slot(),
        })),
        "clock": { "slot": clock.slot, "unix_timestamp": clock.unix_timestamp },
        "unlocked": clock.unix_timestamp >= lock.unlock_time,
        "local_state": local,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn run_simulate(args: SimulateArgs) -> Result<()> {
    validate_nonzero("amount", args.amount)?;
    let secret = Zeroizing::new(parse_secret(&args.secret)?);
    let asset = Address::from_label("token");
    let depositor = Address::from_label("depositor");

    let mut ledger = InMemoryLedger::new();
    ledger.mint(asset, depositor, args.amount)?;
    let mut engine = HtlcEngine::new(
        EngineConfig::default(),
        ChainClock::starting_at(now_unix()),
        ledger,
    );
    let unlock_time = engine.clock().now.saturating_add(args.unlock_in);
    let lock_id = engine.create_lock(
        depositor,
        asset,
        args.amount,
        Hash32(hashlock(&secret)),
        unlock_time,
    )?;

    let engine = Arc::new(Mutex::new(engine));
    let client = SimulatedHtlcClient::new(engine.clone(), "beneficiary")
        .with_auto_advance(args.seconds_per_poll, 1);
    let db = JsonFileDb::new(&args.state_dir)?;
    let initial = ClaimState::pending(lock_id, client.claimer_label());
    db.save(&initial)?;

    let poll = PollConfig {
        interval: Duration::ZERO,
        ..PollConfig::from_env()
    };
    let final_state = run_to_completion(initial, &db, &client, &TracingMetrics, &secret, &poll).await?;

    let engine = engine.lock().map_err(|_| anyhow!("simulator engine lock poisoned"))?;
    let out = json!({
        "final_state": final_state,
        "beneficiary_balance": engine.ledger().balance_of(asset, client.claimer_address()),
        "events": engine.events(),
        "clock": engine.clock(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[allow(deprecated)]
fn create_mint_and_fund(
    rpc: &RpcClient,
    depositor: &Keypair,
    amount: u64,
    decimals: u8,
) -> Result<Pubkey> {
    let mint = Keypair::new();
    let rent = rpc.get_minimum_balance_for_rent_exemption(spl_token::state::Mint::LEN)?;
    let create_ix = create_account(
        &depositor.pubkey(),
        &mint.pubkey(),
        rent,
        spl_token::state::Mint::LEN as u64,
        &spl_token::ID,
    );
    let init_ix = token_instruction::initialize_mint(
        &spl_token::ID,
        &mint.pubkey(),
        &depositor.pubkey(),
        None,
        decimals,
    )?;

    let ata = get_associated_token_address(&depositor.pubkey(), &mint.pubkey());
    let mut ixs = vec![create_ix, init_ix];
    if rpc.get_account(&ata).is_err() {
        ixs.push(create_associated_token_account(
            &depositor.pubkey(),
            &depositor.pubkey(),
            &mint.pubkey(),
            &spl_token::ID,
        ));
    }
    ixs.push(token_instruction::mint_to(
        &spl_token::ID,
        &mint.pubkey(),
        &ata,
        &depositor.pubkey(),
        &[],
        amount,
    )?);

    let blockhash = rpc.get_latest_blockhash()?;
    let tx = Transaction::new_signed_with_payer(
        &ixs,
        Some(&depositor.pubkey()),
        &[depositor, &mint],
        blockhash,
    );
    rpc.send_and_confirm_transaction(&tx)?;
    Ok(mint.pubkey())
}
