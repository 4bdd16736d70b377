use anchor_lang::prelude::*;

use crate::crypto::{commitment_digest, hash_secret};
use crate::errors::ErrorCode;
use crate::events::LockClaimed;
use crate::logging::debug_log_lock;
use crate::state::{Commitment, Lock};
use crate::transfer;
use crate::RevealAndClaim;

pub fn handler(
    ctx: Context<RevealAndClaim>,
    lock_id: u64,
    secret: Vec<u8>,
    salt: Vec<u8>,
) -> Result<()> {
    debug_log_lock("reveal_and_claim: start", lock_id);
    let mut lock = Lock::load(&ctx.accounts.lock)?;
    require!(!lock.claimed, ErrorCode::LockAlreadyClaimed);

    let clock = Clock::get()?;
    require!(
        clock.unix_timestamp >= lock.unlock_time,
        ErrorCode::TimelockNotExpired
    );

    let commitment = Commitment::load(&ctx.accounts.commitment)?;
    require!(
        clock.slot >= commitment.reveal_slot(),
        ErrorCode::CommitDelayNotElapsed
    );

    // Copying secret and salt out of a pending reveal gets an observer
    // nowhere: the payout is bound to whoever committed.
    let claimer = ctx.accounts.claimer.key();
    require_keys_eq!(claimer, commitment.committer, ErrorCode::CommitterMismatch);

    require!(hash_secret(&secret) == lock.hashlock, ErrorCode::InvalidSecret);
    require!(
        commitment_digest(lock.id, &commitment.committer, &secret, &salt) == commitment.digest,
        ErrorCode::CommitmentMismatch
    );
    require_keys_eq!(
        ctx.accounts.claimer_token.mint,
        lock.token_mint,
        ErrorCode::InvalidTokenMint
    );

    // Flip before the transfer so a re-entrant call sees a claimed lock.
    lock.claimed = true;
    lock.store(&ctx.accounts.lock)?;

    transfer::push(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.vault.to_account_info(),
        ctx.accounts.claimer_token.to_account_info(),
        ctx.accounts.lock.to_account_info(),
        &lock,
    )?;

    Commitment::close(
        &ctx.accounts.commitment.to_account_info(),
        &ctx.accounts.claimer.to_account_info(),
    )?;

    emit!(LockClaimed {
        lock_id: lock.id,
        claimer,
    });

    debug_log_lock("reveal_and_claim: complete", lock_id);
    Ok(())
}
