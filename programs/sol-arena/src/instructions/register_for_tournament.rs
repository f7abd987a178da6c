use anchor_lang::prelude::*;
use crate::constants::*;
use crate::error::ErrorCode;
use crate::state::{ProtocolConfig, Registration, Tournament, TournamentStatus};

// ===== ACCOUNTS =====

#[derive(Accounts)]
pub struct RegisterForTournament<'info> {
    #[account(
        mut,
        seeds = [SEED_TOURNAMENT, tournament.tournament_id.as_bytes()],
        bump = tournament.bump,
        constraint = tournament.status == TournamentStatus::Registration @ ErrorCode::RegistrationClosed,
        constraint = !tournament.is_full() @ ErrorCode::TournamentFull,
    )]
    pub tournament: Account<'info, Tournament>,

    #[account(
        init,
        payer = player,
        seeds = [SEED_REGISTRATION, tournament.key().as_ref(), player.key().as_ref()],
        space = Registration::SIZE,
        bump,
    )]
    pub registration: Account<'info, Registration>,

    /// CHECK: escrow PDA holding entry fees
    #[account(
        mut,
        seeds = [SEED_ESCROW, tournament.tournament_id.as_bytes()],
        bump = tournament.escrow_bump,
    )]
    pub tournament_escrow: SystemAccount<'info>,

    #[account(
        seeds = [SEED_PROTOCOL_CONFIG],
        bump = protocol_config.bump,
        constraint = protocol_config.is_active @ ErrorCode::ProtocolPaused,
    )]
    pub protocol_config: Account<'info, ProtocolConfig>,

    #[account(mut)]
    pub player: Signer<'info>,

    pub system_program: Program<'info, System>,
}

impl<'info> RegisterForTournament<'info> {
    pub fn handle(&mut self, bumps: &RegisterForTournamentBumps) -> Result<()> {
        let entry_fee = self.tournament.entry_fee;

        // --- transfer SOL entry fee to escrow ---
        if entry_fee > 0 {
            anchor_lang::system_program::transfer(
                CpiContext::new(
                    self.system_program.to_account_info(),
                    anchor_lang::system_program::Transfer {
                        from: self.player.to_account_info(),
                        to: self.tournament_escrow.to_account_info(),
                    },
                ),
                entry_fee,
            )?;
        }

        // --- record registration ---
        let registration = &mut self.registration;
        registration.tournament = self.tournament.key();
        registration.player = self.player.key();
        registration.amount_paid = entry_fee;
        registration.registered_at = Clock::get()?.unix_timestamp;
        registration.bump = bumps.registration;

        let tournament = &mut self.tournament;
        tournament.total_pool = tournament
            .total_pool
            .checked_add(entry_fee)
            .ok_or(ErrorCode::MathOverflow)?;
        tournament.registered += 1;

        msg!(
            "Player {} registered | {}/{} | pool {} lamports",
            self.player.key(),
            tournament.registered,
            tournament.max_participants,
            tournament.total_pool,
        );

        Ok(())
    }
}
