//! Integer payout math shared by the program and off-chain clients.

use crate::constants::*;

fn bps_of(amount: u64, bps: u64) -> Option<u64> {
    let scaled = (amount as u128).checked_mul(bps as u128)? / BPS_DENOMINATOR as u128;
    u64::try_from(scaled).ok()
}

/// 60 / 30 / 10 placement payouts of a SOL pool across `places` winners
/// (clamped to 1..=3). Unfilled places pay nothing and their share, like
/// the rounding dust, goes to first place, so the payouts always sum to
/// `pool`.
pub fn placement_payouts(pool: u64, places: usize) -> Option<[u64; 3]> {
    let places = places.clamp(1, 3);
    let mut payouts = [0u64; 3];
    for place in 1..places {
        payouts[place] = bps_of(pool, PLACEMENT_BPS[place])?;
    }
    payouts[0] = pool.checked_sub(payouts[1])?.checked_sub(payouts[2])?;
    Some(payouts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_payouts_follow_60_30_10() {
        assert_eq!(
            placement_payouts(1_000_000_000, 3),
            Some([600_000_000, 300_000_000, 100_000_000])
        );
    }

    #[test]
    fn placement_dust_goes_to_first() {
        let [first, second, third] = placement_payouts(7, 3).unwrap();
        assert_eq!((first, second, third), (5, 2, 0));
        assert_eq!(first + second + third, 7);
    }

    #[test]
    fn missing_places_fold_into_first() {
        assert_eq!(placement_payouts(1_000_000_000, 2), Some([700_000_000, 300_000_000, 0]));
        assert_eq!(placement_payouts(1_000_000_000, 1), Some([1_000_000_000, 0, 0]));
        assert_eq!(placement_payouts(1_000_000_000, 0), placement_payouts(1_000_000_000, 1));
        assert_eq!(placement_payouts(1_000_000_000, 9), placement_payouts(1_000_000_000, 3));
    }

    #[test]
    fn payouts_sum_to_the_pool() {
        for pool in [0u64, 1, 3, 99, 100, 12_345_678, u64::MAX] {
            for places in 1..=3 {
                let payouts = placement_payouts(pool, places).unwrap();
                assert_eq!(payouts.iter().map(|&p| p as u128).sum::<u128>(), pool as u128);
            }
        }
    }
}
