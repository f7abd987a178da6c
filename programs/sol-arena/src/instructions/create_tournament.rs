use anchor_lang::prelude::*;
use crate::constants::*;
use crate::error::ErrorCode;
use crate::state::{ProtocolConfig, Tournament, TournamentStatus};

// ===== ACCOUNTS =====

#[derive(Accounts)]
#[instruction(tournament_id: String)]
pub struct CreateTournament<'info> {
    #[account(
        init,
        payer = authority,
        seeds = [SEED_TOURNAMENT, tournament_seed(&tournament_id)],
        space = Tournament::SIZE,
        bump,
    )]
    pub tournament: Account<'info, Tournament>,

    /// CHECK: escrow PDA, a plain system account that collects entry fees
    #[account(
        mut,
        seeds = [SEED_ESCROW, tournament_seed(&tournament_id)],
        bump,
    )]
    pub tournament_escrow: SystemAccount<'info>,

    #[account(
        seeds = [SEED_PROTOCOL_CONFIG],
        bump = protocol_config.bump,
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,

    #[account(mut)]
    pub authority: Signer<'info>,

    pub system_program: Program<'info, System>,
}

/// Lamports the authority adds so the escrow starts rent exempt. Entry
/// fees and prize claims then move only the pool above this floor.
pub fn escrow_top_up(balance: u64, rent_floor: u64) -> u64 {
    rent_floor.saturating_sub(balance)
}

impl<'info> CreateTournament<'info> {
    pub fn handle(
        &mut self,
        tournament_id: String,
        entry_fee: u64,
        max_participants: u16,
        bumps: &CreateTournamentBumps,
    ) -> Result<()> {
        // --- validate inputs ---
        require!(
            !tournament_id.is_empty() && tournament_id.len() <= MAX_TOURNAMENT_ID,
            ErrorCode::InvalidTournamentId
        );
        require!(
            (MIN_PARTICIPANTS..=MAX_PARTICIPANTS).contains(&max_participants),
            ErrorCode::InvalidMaxParticipants
        );
        require!(entry_fee <= MAX_ENTRY_FEE, ErrorCode::EntryFeeTooHigh);
        require!(self.protocol_config.is_active, ErrorCode::ProtocolPaused);

        // --- fund the escrow up to its rent-exempt floor ---
        let top_up = escrow_top_up(
            self.tournament_escrow.lamports(),
            Rent::get()?.minimum_balance(0),
        );
        if top_up > 0 {
            anchor_lang::system_program::transfer(
                CpiContext::new(
                    self.system_program.to_account_info(),
                    anchor_lang::system_program::Transfer {
                        from: self.authority.to_account_info(),
                        to: self.tournament_escrow.to_account_info(),
                    },
                ),
                top_up,
            )?;
        }

        // --- init tournament ---
        let tournament = &mut self.tournament;
        tournament.authority = self.authority.key();
        tournament.tournament_id = tournament_id;
        tournament.status = TournamentStatus::Registration;
        tournament.entry_fee = entry_fee;
        tournament.total_pool = 0;
        tournament.max_participants = max_participants;
        tournament.registered = 0;
        tournament.winners = [Pubkey::default(); 3];
        tournament.payouts = [0; 3];
        tournament.claimed = [false; 3];
        tournament.created_at = Clock::get()?.unix_timestamp;
        tournament.bump = bumps.tournament;
        tournament.escrow_bump = bumps.tournament_escrow;

        msg!(
            "Tournament '{}' created | {} max | {} lamport entry",
            tournament.tournament_id,
            tournament.max_participants,
            tournament.entry_fee,
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOOR: u64 = 890_880;

    #[test]
    fn empty_escrow_is_topped_up_to_the_floor() {
        assert_eq!(escrow_top_up(0, FLOOR), FLOOR);
    }

    #[test]
    fn prefunded_escrow_needs_nothing_more() {
        assert_eq!(escrow_top_up(1_000, FLOOR), FLOOR - 1_000);
        assert_eq!(escrow_top_up(FLOOR, FLOOR), 0);
        assert_eq!(escrow_top_up(FLOOR * 3, FLOOR), 0);
    }
}
