use anchor_lang::prelude::*;

#[error_code]
pub enum ErrorCode {
    #[msg("Lock not found")]
    LockNotFound,
    #[msg("Amount must be greater than zero")]
    InvalidAmount,
    #[msg("Unlock time must be in the future")]
    InvalidUnlockTime,
    #[msg("Timelock has not expired")]
    TimelockNotExpired,
    #[msg("No commitment recorded for this lock")]
    CommitmentNotFound,
    #[msg("Commit delay has not elapsed")]
    CommitDelayNotElapsed,
    #[msg("Caller is not the committer")]
    CommitterMismatch,
    #[msg("Invalid secret")]
    InvalidSecret,
    #[msg("Revealed data does not match the commitment")]
    CommitmentMismatch,
    #[msg("Lock already claimed")]
    LockAlreadyClaimed,
    #[msg("Direct claim is disabled")]
    DirectClaimDisabled,
    #[msg("Invalid token mint")]
    InvalidTokenMint,
    #[msg("Lock id space exhausted")]
    LockIdExhausted,
}
