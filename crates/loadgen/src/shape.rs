//! Stepped arrival-rate shape.
//!
//! Each step spawns users at `rate[i]` per second for `active_duration`, then
//! pauses for `gap_duration` so the backend can settle. The target user
//! count grows only during active phases and holds flat through gaps. After
//! the last step the target stays at the full schedule total with a spawn
//! rate of zero. Every target is capped at `max_users`.
//!
//! This is a pure function of elapsed time. The external scheduler polls it
//! and does the actual spawning.

use serde::Deserialize;
use std::time::Duration;

/// Output of [`ArrivalShape::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeTick {
    /// Concurrent users the scheduler should converge to.
    pub target_users: u64,

    /// Users per second to spawn while converging.
    pub spawn_rate: u32,
}

/// Stepped arrival schedule with stabilization gaps.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ArrivalShape {
    /// Length of each spawning phase.
    #[serde(deserialize_with = "crate::config::deserialize_duration")]
    pub active_duration: Duration,

    /// Length of the idle gap after each spawning phase.
    #[serde(deserialize_with = "crate::config::deserialize_duration")]
    pub gap_duration: Duration,

    /// Users per second for each step.
    pub arrival_rates: Vec<u32>,

    /// Hard cap on concurrent users.
    pub max_users: u64,
}

impl Default for ArrivalShape {
    fn default() -> Self {
        Self {
            active_duration: Duration::from_secs(60),
            gap_duration: Duration::from_secs(10),
            arrival_rates: vec![2, 8, 32, 64, 128, 256, 512, 1024],
            max_users: 30_000,
        }
    }
}

impl ArrivalShape {
    /// Create a shape with the given step rates and the default timings.
    pub fn new(arrival_rates: Vec<u32>) -> Self {
        Self {
            arrival_rates,
            ..Default::default()
        }
    }

    /// Set the spawning phase length.
    pub fn with_active_duration(mut self, duration: Duration) -> Self {
        self.active_duration = duration;
        self
    }

    /// Set the gap length.
    pub fn with_gap_duration(mut self, duration: Duration) -> Self {
        self.gap_duration = duration;
        self
    }

    /// Set the concurrent user cap.
    pub fn with_max_users(mut self, max_users: u64) -> Self {
        self.max_users = max_users;
        self
    }

    /// Length of one step (active phase plus gap), saturating at
    /// `Duration::MAX`.
    pub fn step_duration(&self) -> Duration {
        self.active_duration.saturating_add(self.gap_duration)
    }

    /// Time until the last step's gap ends, saturating at `Duration::MAX`.
    pub fn schedule_duration(&self) -> Duration {
        self.checked_schedule_duration().unwrap_or(Duration::MAX)
    }

    /// Exact schedule length, or `None` if it does not fit in a `Duration`.
    pub fn checked_schedule_duration(&self) -> Option<Duration> {
        let steps = u32::try_from(self.arrival_rates.len()).ok()?;
        self.active_duration
            .checked_add(self.gap_duration)?
            .checked_mul(steps)
    }

    /// Users spawned by the complete schedule, before the cap.
    pub fn total_users(&self) -> u64 {
        accumulate(&self.arrival_rates, self.active_duration)
    }

    /// Target user count and spawn rate at `elapsed` into the run.
    pub fn tick(&self, elapsed: Duration) -> ShapeTick {
        let step_nanos = self.step_duration().as_nanos();
        if step_nanos == 0 {
            return self.finished();
        }

        let step = usize::try_from(elapsed.as_nanos() / step_nanos).unwrap_or(usize::MAX);
        if step >= self.arrival_rates.len() {
            return self.finished();
        }

        // step * step_nanos <= elapsed, so the remainder never exceeds elapsed.
        let rem = elapsed.as_nanos() - step as u128 * step_nanos;
        let into_step = Duration::new((rem / 1_000_000_000) as u64, (rem % 1_000_000_000) as u32);
        let in_active_phase = into_step < self.active_duration;
        let rate = self.arrival_rates[step];

        let completed = accumulate(&self.arrival_rates[..step], self.active_duration);
        let current = users_over(rate, into_step.min(self.active_duration));

        ShapeTick {
            target_users: completed.saturating_add(current).min(self.max_users),
            spawn_rate: if in_active_phase { rate } else { 0 },
        }
    }

    fn finished(&self) -> ShapeTick {
        ShapeTick {
            target_users: self.total_users().min(self.max_users),
            spawn_rate: 0,
        }
    }
}

/// Users spawned at `rate` per second over `span`, rounded down.
fn users_over(rate: u32, span: Duration) -> u64 {
    u64::try_from(rate as u128 * span.as_millis() / 1000).unwrap_or(u64::MAX)
}

fn accumulate(rates: &[u32], span: Duration) -> u64 {
    rates
        .iter()
        .fold(0u64, |total, &rate| total.saturating_add(users_over(rate, span)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uncapped() -> ArrivalShape {
        ArrivalShape::default().with_max_users(u64::MAX)
    }

    #[test]
    fn test_starts_empty() {
        let tick = uncapped().tick(Duration::ZERO);
        assert_eq!(tick.target_users, 0);
        assert_eq!(tick.spawn_rate, 2);
    }

    #[test]
    fn test_ramps_within_first_step() {
        let tick = uncapped().tick(Duration::from_secs(30));
        assert_eq!(tick.target_users, 60);
        assert_eq!(tick.spawn_rate, 2);

        let tick = uncapped().tick(Duration::from_millis(59_500));
        assert_eq!(tick.target_users, 119);
    }

    #[test]
    fn test_end_of_first_active_phase() {
        let tick = uncapped().tick(Duration::from_secs(60));
        assert_eq!(tick.target_users, 120);
        assert_eq!(tick.spawn_rate, 0);
    }

    #[test]
    fn test_gap_holds_target() {
        let shape = uncapped();
        for secs in [61, 65, 69] {
            let tick = shape.tick(Duration::from_secs(secs));
            assert_eq!(tick.target_users, 120, "at {}s", secs);
            assert_eq!(tick.spawn_rate, 0, "at {}s", secs);
        }
    }

    #[test]
    fn test_second_step_accumulates() {
        let shape = uncapped();
        let tick = shape.tick(Duration::from_secs(70));
        assert_eq!(tick.target_users, 120);
        assert_eq!(tick.spawn_rate, 8);

        let tick = shape.tick(Duration::from_secs(80));
        assert_eq!(tick.target_users, 120 + 80);
        assert_eq!(tick.spawn_rate, 8);

        let tick = shape.tick(Duration::from_secs(135));
        assert_eq!(tick.target_users, 120 + 480);
        assert_eq!(tick.spawn_rate, 0);
    }

    #[test]
    fn test_holds_after_schedule() {
        let shape = uncapped();
        let expected = 60 * (2 + 8 + 32 + 64 + 128 + 256 + 512 + 1024);
        assert_eq!(shape.total_users(), expected);

        for elapsed in [
            shape.schedule_duration(),
            shape.schedule_duration() + Duration::from_secs(3600),
        ] {
            let tick = shape.tick(elapsed);
            assert_eq!(tick.target_users, expected);
            assert_eq!(tick.spawn_rate, 0);
        }
    }

    #[test]
    fn test_cap_applies_everywhere() {
        let shape = ArrivalShape::default();
        assert_eq!(shape.max_users, 30_000);

        let late_step = shape.tick(Duration::from_secs(7 * 70 + 30));
        assert_eq!(late_step.target_users, 30_000);
        assert_eq!(late_step.spawn_rate, 1024);

        let done = shape.tick(shape.schedule_duration());
        assert_eq!(done.target_users, 30_000);
        assert_eq!(done.spawn_rate, 0);
    }

    #[test]
    fn test_huge_durations_saturate() {
        let shape = ArrivalShape::new(vec![3, 5])
            .with_active_duration(Duration::MAX)
            .with_gap_duration(Duration::MAX)
            .with_max_users(u64::MAX);

        assert_eq!(shape.step_duration(), Duration::MAX);
        assert_eq!(shape.schedule_duration(), Duration::MAX);
        assert_eq!(shape.checked_schedule_duration(), None);
        assert_eq!(shape.total_users(), u64::MAX);

        let tick = shape.tick(Duration::ZERO);
        assert_eq!(tick.target_users, 0);
        assert_eq!(tick.spawn_rate, 3);

        let later = shape.tick(Duration::from_secs(10));
        assert_eq!(later.target_users, 30);
        assert_eq!(later.spawn_rate, 3);
    }

    #[test]
    fn test_empty_schedule_is_flat() {
        let shape = ArrivalShape::new(Vec::new());
        assert_eq!(
            shape.tick(Duration::from_secs(5)),
            ShapeTick {
                target_users: 0,
                spawn_rate: 0
            }
        );
    }
}
