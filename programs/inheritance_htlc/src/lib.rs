use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

pub mod crypto;
pub mod errors;
pub mod events;
pub mod instructions;
pub mod logging;
pub mod state;
pub mod transfer;

use crate::state::{Commitment, HtlcRegistry, Lock, LockView};

declare_id!("HoTf5fr61SusB2drkWZuQXVouMfjHRErQ9ekDUe9Q8my");

/// Slots that must pass between a commitment and the reveal that spends it.
#[constant]
pub const MIN_COMMIT_DELAY_BLOCKS: u64 = 5;

#[derive(Accounts)]
pub struct Initialize<'info> {
    #[account(mut)]
    pub admin: Signer<'info>,
    #[account(
        init,
        payer = admin,
        space = HtlcRegistry::LEN,
        seeds = [HtlcRegistry::SEED_PREFIX],
        bump
    )]
    pub registry: Account<'info, HtlcRegistry>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct CreateLock<'info> {
    #[account(mut)]
    pub depositor: Signer<'info>,
    #[account(
        mut,
        seeds = [HtlcRegistry::SEED_PREFIX],
        bump = registry.bump
    )]
    pub registry: Account<'info, HtlcRegistry>,
    #[account(
        init,
        payer = depositor,
        space = Lock::LEN,
        seeds = [Lock::SEED_PREFIX, &registry.next_lock_id.to_le_bytes()],
        bump
    )]
    pub lock: Account<'info, Lock>,
    #[account(
        init,
        payer = depositor,
        seeds = [Lock::VAULT_SEED_PREFIX, lock.key().as_ref()],
        bump,
        token::mint = token_mint,
        token::authority = lock
    )]
    pub vault: Account<'info, TokenAccount>,
    #[account(mut)]
    pub depositor_token: Account<'info, TokenAccount>,
    pub token_mint: Account<'info, Mint>,
    pub token_program: Program<'info, Token>,
    pub system_program: Program<'info, System>,
    pub rent: Sysvar<'info, Rent>,
}

#[derive(Accounts)]
#[instruction(lock_id: u64)]
pub struct GetLock<'info> {
    /// CHECK: decoded by `Lock::load` so an unknown id reports `LockNotFound`.
    #[account(seeds = [Lock::SEED_PREFIX, &lock_id.to_le_bytes()], bump)]
    pub lock: UncheckedAccount<'info>,
}

#[derive(Accounts)]
#[instruction(lock_id: u64)]
pub struct Commit<'info> {
    #[account(mut)]
    pub committer: Signer<'info>,
    /// CHECK: decoded by `Lock::load` so an unknown id reports `LockNotFound`.
    #[account(seeds = [Lock::SEED_PREFIX, &lock_id.to_le_bytes()], bump)]
    pub lock: UncheckedAccount<'info>,
    #[account(
        init_if_needed,
        payer = committer,
        space = Commitment::LEN,
        seeds = [Commitment::SEED_PREFIX, lock.key().as_ref()],
        bump
    )]
    pub commitment: Account<'info, Commitment>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(lock_id: u64)]
pub struct RevealAndClaim<'info> {
    #[account(mut)]
    pub claimer: Signer<'info>,
    /// CHECK: decoded by `Lock::load` so an unknown id reports `LockNotFound`.
    #[account(mut, seeds = [Lock::SEED_PREFIX, &lock_id.to_le_bytes()], bump)]
    pub lock: UncheckedAccount<'info>,
    /// CHECK: decoded by `Commitment::load` so a lock without one reports `CommitmentNotFound`.
    #[account(mut, seeds = [Commitment::SEED_PREFIX, lock.key().as_ref()], bump)]
    pub commitment: UncheckedAccount<'info>,
    /// CHECK: address pinned by seeds; the token program validates the account itself.
    #[account(mut, seeds = [Lock::VAULT_SEED_PREFIX, lock.key().as_ref()], bump)]
    pub vault: UncheckedAccount<'info>,
    #[account(mut)]
    pub claimer_token: Account<'info, TokenAccount>,
    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
#[instruction(lock_id: u64)]
pub struct Claim<'info> {
    #[account(mut)]
    pub claimer: Signer<'info>,
    #[account(seeds = [HtlcRegistry::SEED_PREFIX], bump = registry.bump)]
    pub registry: Account<'info, HtlcRegistry>,
    /// CHECK: decoded by `Lock::load` so an unknown id reports `LockNotFound`.
    #[account(mut, seeds = [Lock::SEED_PREFIX, &lock_id.to_le_bytes()], bump)]
    pub lock: UncheckedAccount<'info>,
    /// CHECK: address pinned by seeds; the token program validates the account itself.
    #[account(mut, seeds = [Lock::VAULT_SEED_PREFIX, lock.key().as_ref()], bump)]
    pub vault: UncheckedAccount<'info>,
    #[account(mut)]
    pub claimer_token: Account<'info, TokenAccount>,
    pub token_program: Program<'info, Token>,
}

#[program]
pub mod inheritance_htlc {
    use super::*;

    pub fn initialize(ctx: Context<Initialize>, allow_direct_claim: bool) -> Result<()> {
        instructions::initialize::handler(ctx, allow_direct_claim)
    }

    pub fn create_lock(
        ctx: Context<CreateLock>,
        amount: u64,
        hashlock: [u8; 32],
        unlock_time: i64,
    ) -> Result<u64> {
        instructions::create_lock::handler(ctx, amount, hashlock, unlock_time)
    }

    pub fn get_lock(ctx: Context<GetLock>, lock_id: u64) -> Result<LockView> {
        instructions::get_lock::handler(ctx, lock_id)
    }

    pub fn commit(ctx: Context<Commit>, lock_id: u64, commitment: [u8; 32]) -> Result<u64> {
        instructions::commit::handler(ctx, lock_id, commitment)
    }

    pub fn reveal_and_claim(
        ctx: Context<RevealAndClaim>,
        lock_id: u64,
        secret: Vec<u8>,
        salt: Vec<u8>,
    ) -> Result<()> {
        instructions::reveal_and_claim::handler(ctx, lock_id, secret, salt)
    }

    /// Pays whoever presents the pre-image. A pending call exposes the secret
    /// to anyone watching, so this path is off unless the registry enables it.
    pub fn claim(ctx: Context<Claim>, lock_id: u64, secret: Vec<u8>) -> Result<()> {
        instructions::claim::handler(ctx, lock_id, secret)
    }
}
