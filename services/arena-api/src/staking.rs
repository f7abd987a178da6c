//! Team token staking against Streamflow stake pools.

use serde::Serialize;

/// Lock-duration to weight schedule of a team stake pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightSchedule {
    pub min_duration_secs: u64,
    pub max_duration_secs: u64,
    pub max_weight: f64,
}

impl Default for WeightSchedule {
    fn default() -> Self {
        Self {
            min_duration_secs: 86_400,       // 1 day
            max_duration_secs: 2_592_000,    // 30 days
            max_weight: 2.0,
        }
    }
}

/// Weight grows linearly from 1x at the minimum lock to `max_weight`
/// at the maximum lock.
pub fn calculate_stake_weight(duration: u64, schedule: &WeightSchedule) -> f64 {
    if duration <= schedule.min_duration_secs {
        return 1.0;
    }
    if duration >= schedule.max_duration_secs {
        return schedule.max_weight;
    }
    let range = (schedule.max_duration_secs - schedule.min_duration_secs) as f64;
    let progress = (duration - schedule.min_duration_secs) as f64;
    1.0 + (schedule.max_weight - 1.0) * progress / range
}
