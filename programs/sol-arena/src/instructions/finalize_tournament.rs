use anchor_lang::prelude::*;
use crate::constants::*;
use crate::error::ErrorCode;
use crate::payout::placement_payouts;
use crate::state::{Registration, Tournament, TournamentStatus};

// ===== ACCOUNTS =====

/// Winners must be registered. First place is checked through its PDA;
/// the optional places through the registration's own fields, which the
/// program only ever writes from the same seeds.
#[derive(Accounts)]
#[instruction(first_place: Pubkey)]
pub struct FinalizeTournament<'info> {
    #[account(
        mut,
        seeds = [SEED_TOURNAMENT, tournament.tournament_id.as_bytes()],
        bump = tournament.bump,
        has_one = authority @ ErrorCode::Unauthorized,
        constraint = tournament.status != TournamentStatus::Completed @ ErrorCode::TournamentFinalized,
    )]
    pub tournament: Account<'info, Tournament>,

    #[account(
        seeds = [SEED_REGISTRATION, tournament.key().as_ref(), first_place.as_ref()],
        bump = first_registration.bump,
    )]
    pub first_registration: Account<'info, Registration>,

    pub second_registration: Option<Account<'info, Registration>>,

    pub third_registration: Option<Account<'info, Registration>>,

    pub authority: Signer<'info>,
}

/// Resolves an optional placement against the registration passed for it.
fn placed(
    tournament: &Pubkey,
    place: Option<Pubkey>,
    registration: &Option<Account<'_, Registration>>,
) -> Result<Option<Pubkey>> {
    match (place, registration) {
        (None, None) => Ok(None),
        (Some(player), Some(reg)) => {
            require_keys_eq!(reg.tournament, *tournament, ErrorCode::WinnerNotRegistered);
            require_keys_eq!(reg.player, player, ErrorCode::WinnerNotRegistered);
            Ok(Some(player))
        }
        _ => err!(ErrorCode::WinnerNotRegistered),
    }
}

impl<'info> FinalizeTournament<'info> {
    pub fn handle(
        &mut self,
        first_place: Pubkey,
        second_place: Option<Pubkey>,
        third_place: Option<Pubkey>,
    ) -> Result<()> {
        let key = self.tournament.key();
        let second = placed(&key, second_place, &self.second_registration)?;
        let third = placed(&key, third_place, &self.third_registration)?;
        require!(second.is_some() || third.is_none(), ErrorCode::MissingPlacement);

        let winners = [
            first_place,
            second.unwrap_or_default(),
            third.unwrap_or_default(),
        ];
        require!(
            second != Some(first_place) && third != Some(first_place) && (third.is_none() || third != second),
            ErrorCode::DuplicateWinner
        );

        let places = 1 + usize::from(second.is_some()) + usize::from(third.is_some());
        let payouts = placement_payouts(self.tournament.total_pool, places)
            .ok_or(ErrorCode::MathOverflow)?;

        let tournament = &mut self.tournament;
        tournament.record_results(winners, payouts);

        msg!(
            "Tournament '{}' finalized | {} places | payouts {}/{}/{} lamports",
            tournament.tournament_id,
            places,
            payouts[0],
            payouts[1],
            payouts[2],
        );

        Ok(())
    }
}
