use chrono::{Local, NaiveDate, NaiveDateTime};

/// Source of the current wall-clock time for `now`, `today` and period anchoring.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    /// Frozen at midday of `date`.
    pub fn at_date(date: NaiveDate) -> Self {
        FixedClock(date.and_time(chrono::NaiveTime::MIN) + chrono::Duration::hours(12))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_today() {
        let date = NaiveDate::from_ymd_opt(2019, 1, 24).unwrap();
        let clock = FixedClock::at_date(date);
        assert_eq!(clock.today(), date);
        assert_eq!(clock.now().format("%H:%M:%S").to_string(), "12:00:00");
    }
}
