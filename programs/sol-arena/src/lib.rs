pub mod constants;
pub mod error;
pub mod instructions;
pub mod payout;
pub mod state;

use anchor_lang::prelude::*;

pub use constants::*;
pub use instructions::*;
pub use state::*;

declare_id!("FtCr5EcXVcmUouJGmBavqEhqZ2jydYUBc1wn9UADHEvK");

#[program]
pub mod sol_arena {
    use super::*;

    // --- protocol ---

    pub fn initialize_protocol_config(ctx: Context<InitializeProtocolConfig>) -> Result<()> {
        ctx.accounts.handle(&ctx.bumps)
    }

    pub fn set_protocol_active(ctx: Context<SetProtocolActive>, active: bool) -> Result<()> {
        ctx.accounts.handle(active)
    }

    // --- SOL entry-fee tournaments ---

    pub fn create_tournament(
        ctx: Context<CreateTournament>,
        tournament_id: String,
        entry_fee: u64,
        max_participants: u16,
    ) -> Result<()> {
        ctx.accounts
            .handle(tournament_id, entry_fee, max_participants, &ctx.bumps)
    }

    pub fn register_for_tournament(ctx: Context<RegisterForTournament>) -> Result<()> {
        ctx.accounts.handle(&ctx.bumps)
    }

    /// Second and third place are optional for brackets with fewer than
    /// three players; their registrations must be passed when they are set.
    pub fn finalize_tournament(
        ctx: Context<FinalizeTournament>,
        first_place: Pubkey,
        second_place: Option<Pubkey>,
        third_place: Option<Pubkey>,
    ) -> Result<()> {
        ctx.accounts.handle(first_place, second_place, third_place)
    }

    pub fn claim_prize(ctx: Context<ClaimPrize>) -> Result<()> {
        ctx.accounts.handle()
    }
}
