//! Token movement into and out of lock custody.
//!
//! Each call is a CPI into the token program; a failure aborts the whole
//! instruction, including any state already written.

use anchor_lang::prelude::*;
use anchor_spl::token::{self, Transfer};

use crate::state::Lock;

/// Moves `amount` from the depositor's token account into the lock vault.
pub fn pull<'info>(
    token_program: AccountInfo<'info>,
    from: AccountInfo<'info>,
    vault: AccountInfo<'info>,
    depositor: AccountInfo<'info>,
    amount: u64,
) -> Result<()> {
    let cpi_accounts = Transfer {
        from,
        to: vault,
        authority: depositor,
    };
    let cpi_ctx = CpiContext::new(token_program, cpi_accounts);
    token::transfer(cpi_ctx, amount)
}

/// Releases the full lock amount from the vault, signed by the lock PDA.
pub fn push<'info>(
    token_program: AccountInfo<'info>,
    vault: AccountInfo<'info>,
    to: AccountInfo<'info>,
    lock_account: AccountInfo<'info>,
    lock: &Lock,
) -> Result<()> {
    let id_bytes = lock.id.to_le_bytes();
    let bump = [lock.lock_bump];
    let seeds: &[&[u8]] = &[Lock::SEED_PREFIX, &id_bytes, &bump];
    let signer = &[seeds];

    let cpi_accounts = Transfer {
        from: vault,
        to,
        authority: lock_account,
    };
    let cpi_ctx = CpiContext::new_with_signer(token_program, cpi_accounts, signer);
    token::transfer(cpi_ctx, lock.amount)
}
