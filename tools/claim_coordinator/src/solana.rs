//! RPC-backed client for the deployed program.

use std::time::Instant;

use anchor_lang::{AccountDeserialize, InstructionData, ToAccountMetas};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use inheritance_htlc::errors::ErrorCode;
use inheritance_htlc::state::{Commitment, HtlcRegistry, Lock};
use solana_client::client_error::ClientError;
use solana_client::rpc_client::RpcClient;
use solana_sdk::account::from_account;
use solana_sdk::clock::Clock;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::instruction::{Instruction, InstructionError};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::sysvar;
use solana_sdk::transaction::{Transaction, TransactionError};
use spl_associated_token_account::get_associated_token_address;
use spl_associated_token_account::instruction::create_associated_token_account;
use tracing::debug;

use crate::driver::{HtlcClient, LockSnapshot, Rejection};

pub fn registry_pda(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[HtlcRegistry::SEED_PREFIX], program_id).0
}

pub fn lock_pda(program_id: &Pubkey, lock_id: u64) -> Pubkey {
    Pubkey::find_program_address(&[Lock::SEED_PREFIX, &lock_id.to_le_bytes()], program_id).0
}

pub fn vault_pda(program_id: &Pubkey, lock: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[Lock::VAULT_SEED_PREFIX, lock.as_ref()], program_id).0
}

pub fn commitment_pda(program_id: &Pubkey, lock: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[Commitment::SEED_PREFIX, lock.as_ref()], program_id).0
}

/// Maps the program's custom error codes onto the rejections the driver
/// handles itself.
pub fn classify_error_code(code: u32) -> Option<Rejection> {
    if code == u32::from(ErrorCode::LockAlreadyClaimed) {
        Some(Rejection::AlreadyClaimed)
    } else if code == u32::from(ErrorCode::CommitterMismatch)
        || code == u32::from(ErrorCode::CommitmentMismatch)
    {
        Some(Rejection::CommitmentReplaced)
    } else {
        None
    }
}

/// The slot to wait from, provided the stored commitment is still ours. A
/// commit from someone else that landed right after ours replaces it.
pub fn own_commit_slot(commitment: &Commitment, claimer: &Pubkey, digest: &[u8; 32]) -> Result<u64> {
    if commitment.committer != *claimer || commitment.digest != *digest {
        return Err(anyhow::Error::new(Rejection::CommitmentReplaced));
    }
    Ok(commitment.commit_slot)
}

fn classify_client_error(err: ClientError) -> anyhow::Error {
    if let Some(TransactionError::InstructionError(_, InstructionError::Custom(code))) =
        err.get_transaction_error()
    {
        if let Some(rejection) = classify_error_code(code) {
            return anyhow::Error::new(rejection);
        }
    }
    anyhow::Error::new(err).context("send transaction failed")
}

pub struct SolanaHtlcClient {
    rpc: RpcClient,
    program_id: Pubkey,
    claimer: Keypair,
}

impl SolanaHtlcClient {
    pub fn new(rpc_url: &str, program_id: Pubkey, claimer: Keypair) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(rpc_url.to_string(), CommitmentConfig::confirmed()),
            program_id,
            claimer,
        }
    }

    /// For reads and depositor or admin transactions. The throwaway claimer
    /// key never signs anything.
    pub fn observer(rpc_url: &str, program_id: Pubkey) -> Self {
        Self::new(rpc_url, program_id, Keypair::new())
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    pub fn claimer_pubkey(&self) -> Pubkey {
        self.claimer.pubkey()
    }

    pub fn fetch_registry(&self) -> Result<HtlcRegistry> {
        let address = registry_pda(&self.program_id);
        let data = self
            .rpc
            .get_account_data(&address)
            .with_context(|| format!("registry {address} not found; run init-registry first"))?;
        HtlcRegistry::try_deserialize(&mut &data[..]).context("decode registry account")
    }

    pub fn fetch_lock(&self, lock_id: u64) -> Result<Lock> {
        let address = lock_pda(&self.program_id, lock_id);
        let data = self
            .rpc
            .get_account_data(&address)
            .with_context(|| format!("lock {lock_id} not found at {address}"))?;
        Lock::try_deserialize(&mut &data[..]).context("decode lock account")
    }

    pub fn fetch_commitment(&self, lock_id: u64) -> Result<Option<Commitment>> {
        let lock = lock_pda(&self.program_id, lock_id);
        let address = commitment_pda(&self.program_id, &lock);
        let account = self
            .rpc
            .get_account_with_commitment(&address, self.rpc.commitment())
            .context("fetch commitment account")?
            .value;
        match account {
            Some(account) if !account.data.is_empty() => {
                let commitment = Commitment::try_deserialize(&mut &account.data[..])
                    .context("decode commitment account")?;
                Ok(Some(commitment))
            }
            _ => Ok(None),
        }
    }

    pub fn fetch_clock(&self) -> Result<Clock> {
        let account = self
            .rpc
            .get_account(&sysvar::clock::ID)
            .context("fetch clock sysvar")?;
        from_account::<Clock, _>(&account).ok_or_else(|| anyhow!("decode clock sysvar"))
    }

    pub fn initialize_registry(&self, admin: &Keypair, allow_direct_claim: bool) -> Result<Signature> {
        let ix = Instruction {
            program_id: self.program_id,
            accounts: inheritance_htlc::accounts::Initialize {
                admin: admin.pubkey(),
                registry: registry_pda(&self.program_id),
                system_program: solana_sdk::system_program::ID,
            }
            .to_account_metas(None),
            data: inheritance_htlc::instruction::Initialize { allow_direct_claim }.data(),
        };
        self.sign_and_send(vec![ix], &[admin], &admin.pubkey())
    }

    /// Locks `amount` of `token_mint` from the depositor's associated token
    /// account. Returns the allocated lock id.
    pub fn create_lock(
        &self,
        depositor: &Keypair,
        token_mint: Pubkey,
        amount: u64,
        hashlock: [u8; 32],
        unlock_time: i64,
    ) -> Result<(u64, Signature)> {
        let lock_id = self.fetch_registry()?.next_lock_id;
        let lock = lock_pda(&self.program_id, lock_id);
        let ix = Instruction {
            program_id: self.program_id,
            accounts: inheritance_htlc::accounts::CreateLock {
                depositor: depositor.pubkey(),
                registry: registry_pda(&self.program_id),
                lock,
                vault: vault_pda(&self.program_id, &lock),
                depositor_token: get_associated_token_address(&depositor.pubkey(), &token_mint),
                token_mint,
                token_program: spl_token::ID,
                system_program: solana_sdk::system_program::ID,
                rent: sysvar::rent::ID,
            }
            .to_account_metas(None),
            data: inheritance_htlc::instruction::CreateLock {
                amount,
                hashlock,
                unlock_time,
            }
            .data(),
        };
        let sig = self.sign_and_send(vec![ix], &[depositor], &depositor.pubkey())?;
        Ok((lock_id, sig))
    }

    fn ensure_associated_token_account(
        &self,
        owner: &Pubkey,
        token_mint: &Pubkey,
    ) -> (Pubkey, Option<Instruction>) {
        let ata = get_associated_token_address(owner, token_mint);
        if self.rpc.get_account(&ata).is_ok() {
            return (ata, None);
        }
        let ix = create_associated_token_account(owner, owner, token_mint, &spl_token::ID);
        (ata, Some(ix))
    }

    fn sign_and_send(
        &self,
        ixs: Vec<Instruction>,
        signers: &[&Keypair],
        payer: &Pubkey,
    ) -> Result<Signature> {
        let blockhash = self.rpc.get_latest_blockhash()?;
        let tx = Transaction::new_signed_with_payer(&ixs, Some(payer), signers, blockhash);
        let started = Instant::now();
        let sig = self
            .rpc
            .send_and_confirm_transaction(&tx)
            .map_err(classify_client_error)?;
        debug!(%sig, elapsed_ms = started.elapsed().as_millis() as u64, "transaction confirmed");
        Ok(sig)
    }
}

#[async_trait]
impl HtlcClient for SolanaHtlcClient {
    fn claimer(&self) -> [u8; 32] {
        self.claimer.pubkey().to_bytes()
    }

    fn claimer_label(&self) -> String {
        self.claimer.pubkey().to_string()
    }

    async fn lock_status(&self, lock_id: u64) -> Result<LockSnapshot> {
        let lock = self.fetch_lock(lock_id)?;
        let clock = self.fetch_clock()?;
        Ok(LockSnapshot {
            claimed: lock.claimed,
            unlock_time: lock.unlock_time,
            now: clock.unix_timestamp,
            hashlock: lock.hashlock,
        })
    }

    async fn current_block(&self) -> Result<u64> {
        Ok(self.fetch_clock()?.slot)
    }

    async fn min_commit_delay_blocks(&self) -> Result<u64> {
        Ok(inheritance_htlc::MIN_COMMIT_DELAY_BLOCKS)
    }

    async fn commit(&self, lock_id: u64, digest: [u8; 32]) -> Result<(String, u64)> {
        let lock = lock_pda(&self.program_id, lock_id);
        let ix = Instruction {
            program_id: self.program_id,
            accounts: inheritance_htlc::accounts::Commit {
                committer: self.claimer.pubkey(),
                lock,
                commitment: commitment_pda(&self.program_id, &lock),
                system_program: solana_sdk::system_program::ID,
            }
            .to_account_metas(None),
            data: inheritance_htlc::instruction::Commit {
                lock_id,
                commitment: digest,
            }
            .data(),
        };
        let sig = self.sign_and_send(vec![ix], &[&self.claimer], &self.claimer.pubkey())?;
        let commitment = self
            .fetch_commitment(lock_id)?
            .ok_or_else(|| anyhow!("commitment for lock {lock_id} missing after commit"))?;
        let commit_slot = own_commit_slot(&commitment, &self.claimer.pubkey(), &digest)?;
        Ok((sig.to_string(), commit_slot))
    }

    async fn reveal_and_claim(&self, lock_id: u64, secret: &[u8], salt: &[u8]) -> Result<String> {
        let lock_account = self.fetch_lock(lock_id)?;
        let lock = lock_pda(&self.program_id, lock_id);
        let (claimer_token, create_ata) =
            self.ensure_associated_token_account(&self.claimer.pubkey(), &lock_account.token_mint);

        let mut instructions: Vec<Instruction> = create_ata.into_iter().collect();
        instructions.push(Instruction {
            program_id: self.program_id,
            accounts: inheritance_htlc::accounts::RevealAndClaim {
                claimer: self.claimer.pubkey(),
                lock,
                commitment: commitment_pda(&self.program_id, &lock),
                vault: vault_pda(&self.program_id, &lock),
                claimer_token,
                token_program: spl_token::ID,
            }
            .to_account_metas(None),
            data: inheritance_htlc::instruction::RevealAndClaim {
                lock_id,
                secret: secret.to_vec(),
                salt: salt.to_vec(),
            }
            .data(),
        });

        let sig = self.sign_and_send(instructions, &[&self.claimer], &self.claimer.pubkey())?;
        Ok(sig.to_string())
    }
}
