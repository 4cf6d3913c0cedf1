//! Periodic vesting math.
//!
//! The first period unlocks at `start`, one more after each full
//! `period_duration`, capped at `period_count`:
//!
//!   unlocked_periods = min(floor((now - start) / period_duration) + 1, period_count)
//!   unlocked         = floor(total / period_count) × unlocked_periods
//!
//! The per-period floor is never topped up: when `total` is not a multiple of
//! `period_count`, up to `period_count - 1` units are never unlocked.

use claimgate_core::authorization::VestingConfig;
use claimgate_core::types::{Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// Amount of `total` unlocked at `now`.
pub fn unlocked_amount(
    total: Amount,
    now: Timestamp,
    start: Timestamp,
    period_duration: i64,
    period_count: u32,
) -> Amount {
    if now < start {
        return 0;
    }
    let count = u64::from(period_count);
    if count <= 1 {
        return total;
    }

    let unlocked_periods = if period_duration <= 0 {
        count
    } else {
        // now >= start, so the difference is non-negative.
        let elapsed = (now as i128 - start as i128) / period_duration as i128;
        u64::try_from(elapsed.saturating_add(1))
            .unwrap_or(u64::MAX)
            .min(count)
    };

    ((total / Amount::from(count)) * Amount::from(unlocked_periods)).min(total)
}

// ── UnlockSchedule ───────────────────────────────────────────────────────────

/// Pluggable entitlement policy for the claim engine.
pub trait UnlockSchedule: Send + Sync + 'static {
    /// Short name for logs and RPC responses.
    fn name(&self) -> &'static str;

    /// When unlocking begins, or `None` if the full amount is available
    /// as soon as the authorization is valid.
    fn start(&self, config: &VestingConfig) -> Option<Timestamp>;

    /// Amount of `total` releasable at `now`.
    fn unlocked(&self, total: Amount, now: Timestamp, config: &VestingConfig) -> Amount;
}

/// One-shot release: the whole amount is claimable at once.
#[derive(Clone, Copy, Debug, Default)]
pub struct InstantSchedule;

impl UnlockSchedule for InstantSchedule {
    fn name(&self) -> &'static str {
        "instant"
    }

    fn start(&self, _config: &VestingConfig) -> Option<Timestamp> {
        None
    }

    fn unlocked(&self, total: Amount, _now: Timestamp, _config: &VestingConfig) -> Amount {
        total
    }
}

/// Release in equal steps according to the stored `VestingConfig`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PeriodicVestingSchedule;

impl UnlockSchedule for PeriodicVestingSchedule {
    fn name(&self) -> &'static str {
        "vesting"
    }

    fn start(&self, config: &VestingConfig) -> Option<Timestamp> {
        Some(config.start)
    }

    fn unlocked(&self, total: Amount, now: Timestamp, config: &VestingConfig) -> Amount {
        unlocked_amount(total, now, config.start, config.period_duration, config.period_count)
    }
}

// ── Release listing ──────────────────────────────────────────────────────────

/// One step of a vesting schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// 1-based period index.
    pub index: u32,
    pub unlock_at: Timestamp,
    /// Newly unlocked in this period.
    pub amount: Amount,
    /// Unlocked in total once this period is reached.
    pub cumulative: Amount,
}

/// Every release step for an authorization of `total` under `config`.
pub fn release_schedule(total: Amount, config: &VestingConfig) -> Vec<Release> {
    let count = config.period_count.max(1);
    let mut releases = Vec::with_capacity(count as usize);
    let mut previous: Amount = 0;

    for index in 1..=count {
        let offset = config.period_duration.saturating_mul(i64::from(index - 1));
        let unlock_at = config.start.saturating_add(offset);
        let cumulative = unlocked_amount(
            total,
            unlock_at,
            config.start,
            config.period_duration,
            config.period_count,
        );
        releases.push(Release {
            index,
            unlock_at,
            amount: cumulative - previous,
            cumulative,
        });
        previous = cumulative;
    }

    releases
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: Timestamp = 1_800_000_000;
    const DAY: i64 = 86_400;

    #[test]
    fn nothing_before_start() {
        assert_eq!(unlocked_amount(1_000, START - 1, START, DAY, 4), 0);
    }

    #[test]
    fn first_period_unlocks_at_start() {
        assert_eq!(unlocked_amount(1_000, START, START, DAY, 4), 250);
        assert_eq!(unlocked_amount(1_000, START + DAY - 1, START, DAY, 4), 250);
    }

    #[test]
    fn one_more_period_per_full_duration() {
        assert_eq!(unlocked_amount(1_000, START + DAY, START, DAY, 4), 500);
        assert_eq!(unlocked_amount(1_000, START + 2 * DAY, START, DAY, 4), 750);
        assert_eq!(unlocked_amount(1_000, START + 3 * DAY, START, DAY, 4), 1_000);
    }

    #[test]
    fn capped_at_total() {
        assert_eq!(unlocked_amount(1_000, START + 400 * DAY, START, DAY, 4), 1_000);
        assert_eq!(unlocked_amount(1_000, i64::MAX, START, DAY, 4), 1_000);
    }

    #[test]
    fn remainder_is_truncated() {
        // 1000 / 3 = 333 per period; the 1-unit remainder never unlocks.
        assert_eq!(unlocked_amount(1_000, START, START, DAY, 3), 333);
        assert_eq!(unlocked_amount(1_000, START + DAY, START, DAY, 3), 666);
        assert_eq!(unlocked_amount(1_000, START + 2 * DAY, START, DAY, 3), 999);
        assert_eq!(unlocked_amount(1_000, START + 50 * DAY, START, DAY, 3), 999);
    }

    #[test]
    fn single_period_is_instant() {
        assert_eq!(unlocked_amount(77, START, START, 0, 1), 77);
    }

    #[test]
    fn monotonic_in_time() {
        let mut last = 0;
        for t in (START - DAY..START + 10 * DAY).step_by(3_600) {
            let u = unlocked_amount(700_000, t, START, DAY, 7);
            assert!(u >= last);
            assert!(u <= 700_000);
            last = u;
        }
        assert_eq!(last, 700_000);
    }

    #[test]
    fn instant_schedule_ignores_config() {
        let cfg = VestingConfig::new(START, DAY, 4);
        assert_eq!(InstantSchedule.unlocked(500, 0, &cfg), 500);
        assert_eq!(InstantSchedule.start(&cfg), None);
    }

    #[test]
    fn periodic_schedule_reads_config() {
        let cfg = VestingConfig::new(START, DAY, 4);
        assert_eq!(PeriodicVestingSchedule.start(&cfg), Some(START));
        assert_eq!(PeriodicVestingSchedule.unlocked(1_000, START + DAY, &cfg), 500);
    }

    #[test]
    fn release_schedule_lists_each_period() {
        let cfg = VestingConfig::new(START, DAY, 4);
        let releases = release_schedule(1_000, &cfg);
        assert_eq!(releases.len(), 4);
        assert!(releases.iter().all(|r| r.amount == 250));
        assert_eq!(releases[1].unlock_at, START + DAY);
        assert_eq!(releases[3].cumulative, 1_000);
    }

    #[test]
    fn release_schedule_shows_truncation() {
        let cfg = VestingConfig::new(START, DAY, 3);
        let releases = release_schedule(1_000, &cfg);
        let total: Amount = releases.iter().map(|r| r.amount).sum();
        assert_eq!(total, 999);
    }
}
