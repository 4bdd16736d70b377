use anchor_lang::prelude::*;

use crate::errors::ErrorCode;
use crate::events::LockCommitted;
use crate::logging::debug_log_lock;
use crate::state::Lock;
use crate::Commit;

/// Records `digest` as the latest commitment for the lock, replacing any
/// earlier one. The digest is opaque here; it is only checked on reveal.
pub fn handler(ctx: Context<Commit>, lock_id: u64, digest: [u8; 32]) -> Result<u64> {
    debug_log_lock("commit: start", lock_id);
    let lock = Lock::load(&ctx.accounts.lock)?;
    require!(!lock.claimed, ErrorCode::LockAlreadyClaimed);

    let clock = Clock::get()?;
    let committer = ctx.accounts.committer.key();

    let record = &mut ctx.accounts.commitment;
    record.lock_id = lock.id;
    record.committer = committer;
    record.digest = digest;
    record.commit_slot = clock.slot;
    record.bump = ctx.bumps.commitment;

    emit!(LockCommitted {
        lock_id: lock.id,
        committer,
        commitment: digest,
        commit_block: clock.slot,
    });

    debug_log_lock("commit: complete", lock_id);
    Ok(clock.slot)
}
