use chrono::{Local, NaiveDate, NaiveTime};

/// Source of local date and time of day for the clock faces
pub trait WallClock {
    fn now(&self) -> NaiveTime;

    fn today(&self) -> NaiveDate;
}

/// The system's local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl WallClock for LocalClock {
    fn now(&self) -> NaiveTime {
        Local::now().time()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Frozen date and time, for snapshots and tests
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl FixedClock {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self { date, time }
    }

    /// `time` on the epoch date
    pub fn at(time: NaiveTime) -> Self {
        Self::new(NaiveDate::default(), time)
    }
}

impl WallClock for FixedClock {
    fn now(&self) -> NaiveTime {
        self.time
    }

    fn today(&self) -> NaiveDate {
        self.date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_is_frozen() {
        let t = NaiveTime::from_hms_opt(13, 5, 9).unwrap();
        let d = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let clock = FixedClock::new(d, t);
        assert_eq!(clock.now(), t);
        assert_eq!(clock.now(), t);
        assert_eq!(clock.today(), d);
    }

    #[test]
    fn at_uses_the_epoch_date() {
        let clock = FixedClock::at(NaiveTime::from_hms_opt(1, 2, 3).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
    }
}
