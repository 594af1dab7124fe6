use std::ops::Range;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::sim::clock::Clock;

/// Whether the occupant is at home during a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Occupancy {
    Home,
    Away,
}

impl Occupancy {
    /// Numeric status code: home = 0, away = 1.
    pub fn code(self) -> u8 {
        match self {
            Self::Home => 0,
            Self::Away => 1,
        }
    }

    pub fn is_away(self) -> bool {
        self == Self::Away
    }
}

/// Daily windows, in minutes since midnight, from which departure and return
/// instants are drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancyWindows {
    /// Departure window (half-open, minutes since midnight).
    pub leave_minutes: Range<u32>,
    /// Return window (half-open, minutes since midnight).
    pub return_minutes: Range<u32>,
}

impl Default for OccupancyWindows {
    /// Leave between 05:00 and 06:00, return between 17:00 and 18:00.
    fn default() -> Self {
        Self {
            leave_minutes: 300..360,
            return_minutes: 1020..1080,
        }
    }
}

/// One day's away interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AwayInterval {
    pub leave: NaiveDateTime,
    pub back: NaiveDateTime,
}

impl AwayInterval {
    fn contains(&self, t: NaiveDateTime) -> bool {
        t >= self.leave && t < self.back
    }
}

/// Precomputed home/away status for every step of a run.
///
/// Generated once before stepping begins and immutable afterwards, so the
/// manager can look up any step index in O(1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccupancySchedule {
    statuses: Vec<Occupancy>,
    intervals: Vec<AwayInterval>,
}

impl OccupancySchedule {
    /// Draws a schedule covering every step of `clock`.
    ///
    /// The horizon is split into calendar days. For each day, a departure
    /// instant is drawn uniformly from `windows.leave_minutes` and, independently,
    /// a return instant from `windows.return_minutes`. Steps whose timestamp
    /// falls in `[leave, return)` are away; every other step is home.
    ///
    /// The random source is injected so runs are reproducible: the same seed
    /// and clock always yield the same schedule.
    ///
    /// # Panics
    ///
    /// Panics if either window is empty.
    pub fn generate<R: Rng>(clock: &Clock, windows: &OccupancyWindows, rng: &mut R) -> Self {
        assert!(!windows.leave_minutes.is_empty(), "leave window must not be empty");
        assert!(!windows.return_minutes.is_empty(), "return window must not be empty");

        let intervals: Vec<AwayInterval> = days_covered(clock)
            .map(|day| {
                let midnight = day.and_time(chrono::NaiveTime::MIN);
                let leave = rng.random_range(windows.leave_minutes.clone());
                let back = rng.random_range(windows.return_minutes.clone());
                AwayInterval {
                    leave: midnight + TimeDelta::minutes(i64::from(leave)),
                    back: midnight + TimeDelta::minutes(i64::from(back)),
                }
            })
            .collect();

        let first_day = clock.start().date();
        let statuses = clock
            .timestamps()
            .map(|t| {
                let day_index = (t.date() - first_day).num_days();
                let away = usize::try_from(day_index)
                    .ok()
                    .and_then(|i| intervals.get(i))
                    .is_some_and(|interval| interval.contains(t));
                if away { Occupancy::Away } else { Occupancy::Home }
            })
            .collect();

        Self {
            statuses,
            intervals,
        }
    }

    /// [`OccupancySchedule::generate`] driven by a `StdRng` seeded with `seed`.
    pub fn seeded(clock: &Clock, windows: &OccupancyWindows, seed: u64) -> Self {
        Self::generate(clock, windows, &mut StdRng::seed_from_u64(seed))
    }

    /// Builds a schedule from explicit statuses (fixtures and replays).
    pub fn from_statuses(statuses: Vec<Occupancy>) -> Self {
        Self {
            statuses,
            intervals: Vec::new(),
        }
    }

    /// Status at step `index`, or `None` past the horizon.
    pub fn status_at(&self, index: usize) -> Option<Occupancy> {
        self.statuses.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// The drawn away interval of each calendar day, in order.
    pub fn away_intervals(&self) -> &[AwayInterval] {
        &self.intervals
    }

    pub fn statuses(&self) -> &[Occupancy] {
        &self.statuses
    }
}

fn days_covered(clock: &Clock) -> impl Iterator<Item = NaiveDate> {
    let first = clock.start().date();
    let last = clock.timestamps().last().map_or(first, |t| t.date());
    first.iter_days().take_while(move |d| *d <= last)
}
