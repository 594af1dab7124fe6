use chrono::{NaiveDateTime, TimeDelta};

/// A simulation clock that maps step indices to wall-clock timestamps.
///
/// The `Clock` advances step-by-step over a fixed number of steps; step `i`
/// is stamped `start + i * dt`.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, TimeDelta};
/// use heatgrid_cosim::sim::clock::Clock;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1)
///     .and_then(|d| d.and_hms_opt(0, 0, 0))
///     .expect("valid date");
/// let mut clock = Clock::new(start, TimeDelta::minutes(30), 3);
/// let mut steps = Vec::new();
///
/// clock.run(|step, _| steps.push(step));
/// assert_eq!(steps, vec![0, 1, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    start: NaiveDateTime,
    dt: TimeDelta,
    /// Current step of the simulation
    current: usize,
    /// Total steps to run in the simulation
    total: usize,
}

impl Clock {
    /// Creates a new clock with a specified total number of steps.
    ///
    /// # Arguments
    ///
    /// * `start` - Timestamp of step 0
    /// * `dt` - Step size
    /// * `total` - The total number of steps the clock will run
    pub fn new(start: NaiveDateTime, dt: TimeDelta, total: usize) -> Self {
        Self {
            start,
            dt,
            current: 0,
            total,
        }
    }

    /// Creates a clock covering `[start, end)` in steps of `dt`.
    ///
    /// The step count is `(end - start) / dt`, truncated; a non-positive span
    /// or step yields an empty clock.
    pub fn spanning(start: NaiveDateTime, end: NaiveDateTime, dt: TimeDelta) -> Self {
        let span = (end - start).num_seconds();
        let step = dt.num_seconds();
        let total = if span > 0 && step > 0 {
            usize::try_from(span / step).unwrap_or(0)
        } else {
            0
        };
        Self::new(start, dt, total)
    }

    /// Advances the clock by one step.
    ///
    /// # Returns
    ///
    /// * `Some((step, timestamp))` - The step number (starting from 0) before advancing
    /// * `None` - If the clock has reached its total steps
    pub fn tick(&mut self) -> Option<(usize, NaiveDateTime)> {
        if self.current < self.total {
            let step = self.current;
            self.current += 1;
            Some((step, self.timestamp_at(step)))
        } else {
            None
        }
    }

    /// Runs a function for each remaining step in the clock.
    pub fn run(&mut self, mut f: impl FnMut(usize, NaiveDateTime)) {
        while let Some((step, t)) = self.tick() {
            f(step, t);
        }
    }

    /// Rewinds the clock to step 0.
    pub fn rewind(&mut self) {
        self.current = 0;
    }

    /// Timestamp of step `index`.
    pub fn timestamp_at(&self, index: usize) -> NaiveDateTime {
        let steps = i32::try_from(index).unwrap_or(i32::MAX);
        self.start + self.dt * steps
    }

    /// All step timestamps, independent of the current position.
    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        (0..self.total).map(|i| self.timestamp_at(i))
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn dt(&self) -> TimeDelta {
        self.dt
    }

    /// Step size in hours.
    pub fn dt_hours(&self) -> f64 {
        self.dt.num_seconds() as f64 / 3600.0
    }

    pub fn total_steps(&self) -> usize {
        self.total
    }
}
