//! Forecasting utilities for the simulator.

use chrono::TimeDelta;

use crate::grid::LoadTable;

/// Naive "tomorrow is today" forecaster.
///
/// Each forecast value is the observed value one lag earlier (one day by
/// default). Timestamps with no earlier observation keep their own value, so
/// the first day of the horizon repeats itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NaiveForecast {
    lag: TimeDelta,
}

impl Default for NaiveForecast {
    fn default() -> Self {
        Self {
            lag: TimeDelta::days(1),
        }
    }
}

impl NaiveForecast {
    pub fn with_lag(lag: TimeDelta) -> Self {
        Self { lag }
    }

    pub fn lag(&self) -> TimeDelta {
        self.lag
    }

    /// Produce a forecast table covering the same timestamps and consumers.
    ///
    /// # Arguments
    ///
    /// * `observed` - Observed loads used as the forecast template
    pub fn forecast(&self, observed: &LoadTable) -> LoadTable {
        observed.lagged(self.lag)
    }
}

#[cfg(test)]
mod tests {
    use super::NaiveForecast;
    use crate::grid::LoadTable;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .expect("valid hour")
    }

    fn observed() -> LoadTable {
        LoadTable::from_rows(
            vec!["a".into(), "b".into()],
            vec![
                (at(1, 0), vec![1.0, 10.0]),
                (at(1, 12), vec![2.0, 20.0]),
                (at(2, 0), vec![3.0, 30.0]),
                (at(2, 12), vec![4.0, 40.0]),
            ],
        )
    }

    #[test]
    fn forecast_keeps_timestamps_and_consumers() {
        let obs = observed();
        let fc = NaiveForecast::default().forecast(&obs);
        assert_eq!(fc.len(), obs.len());
        assert_eq!(fc.consumers(), obs.consumers());
        assert!(fc.timestamps().eq(obs.timestamps()));
    }

    #[test]
    fn second_day_copies_first_day() {
        let fc = NaiveForecast::default().forecast(&observed());
        assert_eq!(fc.row(at(2, 0)), Some(&[1.0, 10.0][..]));
        assert_eq!(fc.row(at(2, 12)), Some(&[2.0, 20.0][..]));
    }

    #[test]
    fn first_day_repeats_itself() {
        let fc = NaiveForecast::default().forecast(&observed());
        assert_eq!(fc.row(at(1, 12)), Some(&[2.0, 20.0][..]));
    }

    #[test]
    fn custom_lag() {
        let fc = NaiveForecast::with_lag(TimeDelta::hours(12)).forecast(&observed());
        assert_eq!(fc.row(at(2, 12)), Some(&[3.0, 30.0][..]));
        assert_eq!(NaiveForecast::with_lag(TimeDelta::hours(12)).lag(), TimeDelta::hours(12));
    }
}
