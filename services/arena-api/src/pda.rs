//! Program-derived addresses used by the API.

use solana_sdk::pubkey::Pubkey;

use sol_arena::{
    tournament_seed, SEED_ESCROW, SEED_PROTOCOL_CONFIG, SEED_REGISTRATION, SEED_TOURNAMENT,
};

// ===== SOL ARENA =====

pub fn protocol_config(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[SEED_PROTOCOL_CONFIG], program_id).0
}

pub fn tournament(program_id: &Pubkey, tournament_id: &str) -> Pubkey {
    Pubkey::find_program_address(&[SEED_TOURNAMENT, tournament_seed(tournament_id)], program_id).0
}

/// System-owned account collecting SOL entry fees for a tournament.
pub fn tournament_escrow(program_id: &Pubkey, tournament_id: &str) -> Pubkey {
    Pubkey::find_program_address(&[SEED_ESCROW, tournament_seed(tournament_id)], program_id).0
}

/// A player's registration in a tournament, keyed by the tournament PDA.
pub fn registration(program_id: &Pubkey, tournament: &Pubkey, player: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[SEED_REGISTRATION, tournament.as_ref(), player.as_ref()],
        program_id,
    )
    .0
}

// ===== STREAMFLOW STAKING =====

pub fn stake_pool(staking_program: &Pubkey, mint: &Pubkey, authority: &Pubkey, nonce: u8) -> Pubkey {
    Pubkey::find_program_address(
        &[b"stake_pool", mint.as_ref(), authority.as_ref(), &[nonce]],
        staking_program,
    )
    .0
}

// ===== METEORA DBC =====

pub fn dbc_pool(dbc_program: &Pubkey, config: &Pubkey, base_mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[b"virtual_pool", config.as_ref(), base_mint.as_ref()],
        dbc_program,
    )
    .0
}

pub fn dbc_bonding_curve(dbc_program: &Pubkey, pool: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[b"bonding_curve", pool.as_ref()], dbc_program).0
}

pub fn dbc_pool_authority(dbc_program: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[b"pool_authority"], dbc_program).0
}

pub fn dbc_token_vault(dbc_program: &Pubkey, mint: &Pubkey, pool: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[b"token_vault", mint.as_ref(), pool.as_ref()], dbc_program).0
}

pub fn dbc_event_authority(dbc_program: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[b"__event_authority"], dbc_program).0
}

/// Metaplex token metadata account of `mint`.
pub fn token_metadata(metadata_program: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[b"metadata", metadata_program.as_ref(), mint.as_ref()],
        metadata_program,
    )
    .0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escrow_is_deterministic_per_tournament() {
        let program = sol_arena::ID;
        let a = tournament_escrow(&program, "0f8fad5bd9cb469fa16570867728950e");
        let b = tournament_escrow(&program, "0f8fad5bd9cb469fa16570867728950e");
        let c = tournament_escrow(&program, "7c9e6679742540de944be07fc1f90ae7");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, tournament(&program, "0f8fad5bd9cb469fa16570867728950e"));
    }

    #[test]
    fn long_ids_derive_from_their_first_32_bytes() {
        let program = sol_arena::ID;
        let long = "0f8fad5b-d9cb-469f-a165-70867728950e";
        assert_eq!(tournament_escrow(&program, long), tournament_escrow(&program, &long[..32]));
    }

    #[test]
    fn registrations_are_per_player() {
        let program = sol_arena::ID;
        let cup = tournament(&program, "cup-1");
        let (a, b) = (Pubkey::new_unique(), Pubkey::new_unique());
        assert_ne!(registration(&program, &cup, &a), registration(&program, &cup, &b));
        assert_ne!(
            registration(&program, &cup, &a),
            registration(&program, &tournament(&program, "cup-2"), &a)
        );
    }

    #[test]
    fn stake_pool_depends_on_nonce() {
        let program = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        assert_ne!(
            stake_pool(&program, &mint, &authority, 0),
            stake_pool(&program, &mint, &authority, 1)
        );
    }
}
