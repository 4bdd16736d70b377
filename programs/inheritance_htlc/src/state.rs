use anchor_lang::prelude::*;

use crate::errors::ErrorCode;

/// Program-wide configuration and the lock id allocator.
#[account]
pub struct HtlcRegistry {
    pub admin: Pubkey,
    pub next_lock_id: u64,
    pub allow_direct_claim: bool,
    pub bump: u8,
}

impl HtlcRegistry {
    pub const SIZE: usize = 32 + 8 + 1 + 1;
    pub const LEN: usize = 8 + Self::SIZE;
    pub const SEED_PREFIX: &'static [u8] = b"registry";
}

#[account]
pub struct Lock {
    pub id: u64,
    pub depositor: Pubkey,
    pub token_mint: Pubkey,
    pub vault: Pubkey,
    pub amount: u64,
    pub hashlock: [u8; 32],
    pub unlock_time: i64,
    pub claimed: bool,
    pub lock_bump: u8,
}

impl Lock {
    pub const SIZE: usize = 8 + 32 * 3 + 8 + 32 + 8 + 1 + 1;
    pub const LEN: usize = 8 + Self::SIZE;
    pub const SEED_PREFIX: &'static [u8] = b"lock";
    pub const VAULT_SEED_PREFIX: &'static [u8] = b"vault";

    /// Decodes a lock from an account that is only address-checked, mapping a
    /// missing or foreign account to `LockNotFound`.
    pub fn load(info: &AccountInfo) -> Result<Self> {
        if info.owner != &crate::ID || info.data_is_empty() {
            return err!(ErrorCode::LockNotFound);
        }
        let data = info.try_borrow_data()?;
        Lock::try_deserialize(&mut &data[..])
    }

    pub fn store(&self, info: &AccountInfo) -> Result<()> {
        let mut data = info.try_borrow_mut_data()?;
        let mut writer: &mut [u8] = &mut data[..];
        self.try_serialize(&mut writer)
    }
}

/// The latest pledge recorded against a lock. Only `committer` may reveal.
#[account]
pub struct Commitment {
    pub lock_id: u64,
    pub committer: Pubkey,
    pub digest: [u8; 32],
    pub commit_slot: u64,
    pub bump: u8,
}

impl Commitment {
    pub const SIZE: usize = 8 + 32 + 32 + 8 + 1;
    pub const LEN: usize = 8 + Self::SIZE;
    pub const SEED_PREFIX: &'static [u8] = b"commitment";

    pub fn load(info: &AccountInfo) -> Result<Self> {
        if info.owner != &crate::ID || info.data_is_empty() {
            return err!(ErrorCode::CommitmentNotFound);
        }
        let data = info.try_borrow_data()?;
        Commitment::try_deserialize(&mut &data[..])
    }

    /// First slot at which the reveal may land.
    pub fn reveal_slot(&self) -> u64 {
        self.commit_slot.saturating_add(crate::MIN_COMMIT_DELAY_BLOCKS)
    }

    /// Drains a spent commitment into `destination` and hands the account
    /// back to the system program so the runtime reclaims it.
    pub fn close<'info>(info: &AccountInfo<'info>, destination: &AccountInfo<'info>) -> Result<()> {
        let credited = destination
            .lamports()
            .checked_add(info.lamports())
            .ok_or(ProgramError::ArithmeticOverflow)?;
        **destination.try_borrow_mut_lamports()? = credited;
        **info.try_borrow_mut_lamports()? = 0;
        info.assign(&anchor_lang::system_program::ID);
        info.resize(0)?;
        Ok(())
    }
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct LockView {
    pub depositor: Pubkey,
    pub token_mint: Pubkey,
    pub amount: u64,
    pub hashlock: [u8; 32],
    pub unlock_time: i64,
    pub claimed: bool,
}

impl From<&Lock> for LockView {
    fn from(lock: &Lock) -> Self {
        Self {
            depositor: lock.depositor,
            token_mint: lock.token_mint,
            amount: lock.amount,
            hashlock: lock.hashlock,
            unlock_time: lock.unlock_time,
            claimed: lock.claimed,
        }
    }
}
