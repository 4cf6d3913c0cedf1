//! claimgate-vesting
//!
//! Unlock schedules: how much of an authorization's total may be released
//! at a given time. The engine in claimgate-state is generic over
//! `UnlockSchedule`; the two shipped variants are one-shot (`InstantSchedule`)
//! and periodic vesting (`PeriodicVestingSchedule`).

pub mod schedule;

pub use schedule::{
    release_schedule, unlocked_amount, InstantSchedule, PeriodicVestingSchedule, Release,
    UnlockSchedule,
};
