use anchor_lang::prelude::*;

use crate::crypto::hash_secret;
use crate::errors::ErrorCode;
use crate::events::LockClaimed;
use crate::logging::debug_log_lock;
use crate::state::Lock;
use crate::transfer;
use crate::Claim;

/// Legacy direct claim: no commitment, no identity binding.
pub fn handler(ctx: Context<Claim>, lock_id: u64, secret: Vec<u8>) -> Result<()> {
    debug_log_lock("claim: start", lock_id);
    require!(
        ctx.accounts.registry.allow_direct_claim,
        ErrorCode::DirectClaimDisabled
    );

    let mut lock = Lock::load(&ctx.accounts.lock)?;
    require!(!lock.claimed, ErrorCode::LockAlreadyClaimed);

    let clock = Clock::get()?;
    require!(
        clock.unix_timestamp >= lock.unlock_time,
        ErrorCode::TimelockNotExpired
    );
    require!(hash_secret(&secret) == lock.hashlock, ErrorCode::InvalidSecret);
    require_keys_eq!(
        ctx.accounts.claimer_token.mint,
        lock.token_mint,
        ErrorCode::InvalidTokenMint
    );

    lock.claimed = true;
    lock.store(&ctx.accounts.lock)?;

    transfer::push(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.vault.to_account_info(),
        ctx.accounts.claimer_token.to_account_info(),
        ctx.accounts.lock.to_account_info(),
        &lock,
    )?;

    emit!(LockClaimed {
        lock_id: lock.id,
        claimer: ctx.accounts.claimer.key(),
    });

    debug_log_lock("claim: complete", lock_id);
    Ok(())
}
