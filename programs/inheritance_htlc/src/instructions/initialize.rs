use anchor_lang::prelude::*;

use crate::logging::debug_log;
use crate::Initialize;

pub fn handler(ctx: Context<Initialize>, allow_direct_claim: bool) -> Result<()> {
    debug_log("initialize: start");
    let registry = &mut ctx.accounts.registry;
    registry.admin = ctx.accounts.admin.key();
    registry.next_lock_id = 0;
    registry.allow_direct_claim = allow_direct_claim;
    registry.bump = ctx.bumps.registry;

    if allow_direct_claim {
        debug_log("initialize: direct claim enabled");
    }
    debug_log("initialize: complete");
    Ok(())
}
