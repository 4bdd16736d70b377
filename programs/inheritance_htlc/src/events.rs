use anchor_lang::prelude::*;

#[event]
pub struct LockCreated {
    pub lock_id: u64,
    pub depositor: Pubkey,
    pub token_mint: Pubkey,
    pub amount: u64,
    pub hashlock: [u8; 32],
    pub unlock_time: i64,
}

#[event]
pub struct LockCommitted {
    pub lock_id: u64,
    pub committer: Pubkey,
    pub commitment: [u8; 32],
    pub commit_block: u64,
}

#[event]
pub struct LockClaimed {
    pub lock_id: u64,
    pub claimer: Pubkey,
}
