use anchor_lang::prelude::*;

/// One per (tournament, player). Created with `init`, so a second
/// registration by the same wallet fails at account creation.
/// Seeds: [b"registration", tournament, player]
#[account]
pub struct Registration {
    pub tournament: Pubkey,
    pub player: Pubkey,
    pub amount_paid: u64,
    pub registered_at: i64,
    pub bump: u8,
}

impl Registration {
    pub const SIZE: usize = 8  // discriminator
        + 32  // tournament
        + 32  // player
        + 8   // amount_paid
        + 8   // registered_at
        + 1;  // bump
}
