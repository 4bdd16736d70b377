use anchor_lang::prelude::*;

use crate::state::{Lock, LockView};
use crate::GetLock;

pub fn handler(ctx: Context<GetLock>, _lock_id: u64) -> Result<LockView> {
    let lock = Lock::load(&ctx.accounts.lock)?;
    Ok(LockView::from(&lock))
}
