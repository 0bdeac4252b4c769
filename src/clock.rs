use chrono::{DateTime, Utc};

/// Source of the current time used as the reference point for age filtering.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock of the local machine
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
