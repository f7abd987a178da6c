use anchor_lang::prelude::*;

#[error_code]
pub enum ErrorCode {
    // --- protocol ---
    #[msg("Protocol is paused")]
    ProtocolPaused,
    #[msg("Unauthorized")]
    Unauthorized,

    // --- tournament creation ---
    #[msg("Tournament id must be 1-32 bytes")]
    InvalidTournamentId,
    #[msg("Max participants must be between 2 and 64")]
    InvalidMaxParticipants,
    #[msg("Entry fee exceeds maximum (100 SOL)")]
    EntryFeeTooHigh,

    // --- registration ---
    #[msg("Registration is closed")]
    RegistrationClosed,
    #[msg("Tournament is full")]
    TournamentFull,

    // --- finalize / claim ---
    #[msg("Tournament is already finalized")]
    TournamentFinalized,
    #[msg("Tournament is not finalized yet")]
    TournamentNotFinalized,
    #[msg("Winner is not a registered participant")]
    WinnerNotRegistered,
    #[msg("A player can only hold one placement")]
    DuplicateWinner,
    #[msg("Third place needs a second place")]
    MissingPlacement,
    #[msg("Signer has no unclaimed prize in this tournament")]
    NothingToClaim,

    // --- math ---
    #[msg("Math overflow")]
    MathOverflow,
}
