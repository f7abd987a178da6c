use anchor_lang::prelude::*;

// ===== SEEDS =====
#[constant]
pub const SEED_PROTOCOL_CONFIG: &[u8] = b"protocol_config";
#[constant]
pub const SEED_TOURNAMENT: &[u8] = b"tournament";
#[constant]
pub const SEED_ESCROW: &[u8] = b"escrow";
pub const SEED_REGISTRATION: &[u8] = b"registration";

// ===== TOURNAMENTS =====
pub const MAX_TOURNAMENT_ID: usize = 32;        // a single PDA seed is capped at 32 bytes
pub const MIN_PARTICIPANTS: u16 = 2;
pub const MAX_PARTICIPANTS: u16 = 64;
pub const MAX_ENTRY_FEE: u64 = 100_000_000_000;  // 100 SOL

// ===== PAYOUTS (basis points) =====
pub const BPS_DENOMINATOR: u64 = 10_000;
pub const PLACEMENT_BPS: [u64; 3] = [6_000, 3_000, 1_000]; // 60 / 30 / 10

/// Seed bytes for a tournament id. Ids created on chain are at most
/// `MAX_TOURNAMENT_ID` bytes, so truncation only affects off-chain ids.
pub fn tournament_seed(tournament_id: &str) -> &[u8] {
    let bytes = tournament_id.as_bytes();
    &bytes[..bytes.len().min(MAX_TOURNAMENT_ID)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_is_truncated_to_32_bytes() {
        let long = "a".repeat(40);
        assert_eq!(tournament_seed(&long).len(), MAX_TOURNAMENT_ID);
        assert_eq!(tournament_seed("cup-1"), b"cup-1");
    }

    #[test]
    fn placement_table_covers_the_whole_pool() {
        assert_eq!(PLACEMENT_BPS.iter().sum::<u64>(), BPS_DENOMINATOR);
    }
}
