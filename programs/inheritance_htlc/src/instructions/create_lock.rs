use anchor_lang::prelude::*;

use crate::errors::ErrorCode;
use crate::events::LockCreated;
use crate::logging::{debug_log, debug_log_lock};
use crate::transfer;
use crate::CreateLock;

pub fn handler(
    ctx: Context<CreateLock>,
    amount: u64,
    hashlock: [u8; 32],
    unlock_time: i64,
) -> Result<u64> {
    debug_log("create_lock: start");
    require!(amount > 0, ErrorCode::InvalidAmount);

    let clock = Clock::get()?;
    require!(unlock_time > clock.unix_timestamp, ErrorCode::InvalidUnlockTime);

    require_keys_eq!(
        ctx.accounts.depositor_token.mint,
        ctx.accounts.token_mint.key(),
        ErrorCode::InvalidTokenMint
    );

    // Funds land in custody before the record is written.
    transfer::pull(
        ctx.accounts.token_program.to_account_info(),
        ctx.accounts.depositor_token.to_account_info(),
        ctx.accounts.vault.to_account_info(),
        ctx.accounts.depositor.to_account_info(),
        amount,
    )?;

    let lock_id = ctx.accounts.registry.next_lock_id;
    let depositor = ctx.accounts.depositor.key();
    let token_mint = ctx.accounts.token_mint.key();

    let lock = &mut ctx.accounts.lock;
    lock.id = lock_id;
    lock.depositor = depositor;
    lock.token_mint = token_mint;
    lock.vault = ctx.accounts.vault.key();
    lock.amount = amount;
    lock.hashlock = hashlock;
    lock.unlock_time = unlock_time;
    lock.claimed = false;
    lock.lock_bump = ctx.bumps.lock;

    let registry = &mut ctx.accounts.registry;
    registry.next_lock_id = lock_id
        .checked_add(1)
        .ok_or(ErrorCode::LockIdExhausted)?;

    emit!(LockCreated {
        lock_id,
        depositor,
        token_mint,
        amount,
        hashlock,
        unlock_time,
    });

    debug_log_lock("create_lock: complete", lock_id);
    Ok(lock_id)
}
