use anchor_lang::prelude::*;
use crate::constants::*;
use crate::error::ErrorCode;
use crate::state::{Tournament, TournamentStatus};

// ===== ACCOUNTS =====

#[derive(Accounts)]
pub struct ClaimPrize<'info> {
    #[account(
        mut,
        seeds = [SEED_TOURNAMENT, tournament.tournament_id.as_bytes()],
        bump = tournament.bump,
        constraint = tournament.status == TournamentStatus::Completed @ ErrorCode::TournamentNotFinalized,
    )]
    pub tournament: Account<'info, Tournament>,

    /// CHECK: escrow PDA holding entry fees
    #[account(
        mut,
        seeds = [SEED_ESCROW, tournament.tournament_id.as_bytes()],
        bump = tournament.escrow_bump,
    )]
    pub tournament_escrow: SystemAccount<'info>,

    #[account(mut)]
    pub winner: Signer<'info>,

    pub system_program: Program<'info, System>,
}

impl<'info> ClaimPrize<'info> {
    pub fn handle(&mut self) -> Result<()> {
        let places = self.tournament.claimable_for(&self.winner.key());
        require!(!places.is_empty(), ErrorCode::NothingToClaim);

        let payout = places
            .iter()
            .try_fold(0u64, |acc, &i| acc.checked_add(self.tournament.payouts[i]))
            .ok_or(ErrorCode::MathOverflow)?;

        // --- transfer from escrow (PDA signer) ---
        let tournament_id = self.tournament.tournament_id.clone();
        let signer_seeds: &[&[u8]] = &[
            SEED_ESCROW,
            tournament_id.as_bytes(),
            &[self.tournament.escrow_bump],
        ];

        anchor_lang::system_program::transfer(
            CpiContext::new_with_signer(
                self.system_program.to_account_info(),
                anchor_lang::system_program::Transfer {
                    from: self.tournament_escrow.to_account_info(),
                    to: self.winner.to_account_info(),
                },
                &[signer_seeds],
            ),
            payout,
        )?;

        for i in places {
            self.tournament.claimed[i] = true;
        }

        msg!("Prize claimed: {} lamports to {}", payout, self.winner.key());

        Ok(())
    }
}
