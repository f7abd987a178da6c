use anchor_lang::prelude::*;
use crate::constants::MAX_TOURNAMENT_ID;

/// SOL entry-fee tournament.
/// Seeds: [b"tournament", tournament_id]
/// Entry fees sit in a system-owned escrow PDA: [b"escrow", tournament_id].
/// The escrow is funded with its rent-exempt minimum at creation, so it
/// always holds that floor plus `total_pool` minus claimed prizes.
#[account]
pub struct Tournament {
    pub authority: Pubkey,
    pub tournament_id: String,
    pub status: TournamentStatus,
    pub entry_fee: u64,           // lamports
    pub total_pool: u64,          // lamports held in escrow
    pub max_participants: u16,
    pub registered: u16,
    pub winners: [Pubkey; 3],     // 1st, 2nd, 3rd, set on finalize; default when unplaced
    pub payouts: [u64; 3],
    pub claimed: [bool; 3],
    pub created_at: i64,
    pub bump: u8,
    pub escrow_bump: u8,
}

impl Tournament {
    pub const SIZE: usize = 8  // discriminator
        + 32                          // authority
        + 4 + MAX_TOURNAMENT_ID       // tournament_id
        + 1                           // status
        + 8                           // entry_fee
        + 8                           // total_pool
        + 2                           // max_participants
        + 2                           // registered
        + 32 * 3                      // winners
        + 8 * 3                       // payouts
        + 3                           // claimed
        + 8                           // created_at
        + 1                           // bump
        + 1;                          // escrow_bump

    pub fn is_full(&self) -> bool {
        self.registered >= self.max_participants
    }

    /// Fixes placements and payouts. Registration closes for good.
    pub fn record_results(&mut self, winners: [Pubkey; 3], payouts: [u64; 3]) {
        self.winners = winners;
        self.payouts = payouts;
        self.claimed = [false; 3];
        self.status = TournamentStatus::Completed;
    }

    /// Unclaimed placements belonging to `wallet`.
    pub fn claimable_for(&self, wallet: &Pubkey) -> Vec<usize> {
        (0..3)
            .filter(|&i| self.winners[i] == *wallet && !self.claimed[i] && self.payouts[i] > 0)
            .collect()
    }
}

/// On-chain lifecycle. Starting the bracket and cancelling are tracked
/// off chain only.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum TournamentStatus {
    Registration,   // accepting players
    Completed,      // payouts fixed, winners can claim
}
