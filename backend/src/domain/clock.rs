//! Source of "now" for attendance marking.

use chrono::{DateTime, Local, NaiveDate, Utc};
#[cfg(test)]
use chrono::TimeZone;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// Local calendar date
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Local wall-clock time as HH:MM:SS
    fn wall_time(&self) -> String {
        self.now().format("%H:%M:%S").to_string()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock pinned to one instant, moved forward by tests
#[cfg(test)]
#[derive(Debug)]
pub struct FixedClock {
    now: std::sync::Mutex<DateTime<Local>>,
}

#[cfg(test)]
impl FixedClock {
    /// Local time at `date` `hour:minute:second`, or `None` if that local
    /// time does not exist (DST gap)
    pub fn at(date: NaiveDate, hour: u32, minute: u32, second: u32) -> Option<Self> {
        let naive = date.and_hms_opt(hour, minute, second)?;
        let now = Local.from_local_datetime(&naive).earliest()?;
        Some(Self {
            now: std::sync::Mutex::new(now),
        })
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_formats_today_and_time() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let clock = FixedClock::at(day, 8, 5, 9).unwrap();

        assert_eq!(clock.today(), day);
        assert_eq!(clock.wall_time(), "08:05:09");
    }

    #[test]
    fn test_fixed_clock_advance() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let clock = FixedClock::at(day, 23, 59, 0).unwrap();

        clock.advance(chrono::Duration::minutes(2));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(clock.wall_time(), "00:01:00");
    }
}
