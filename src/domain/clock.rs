use chrono::{DateTime, Utc};

/// Source of timestamps for task mutations
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that advances one second per reading (tests only)
#[cfg(test)]
pub struct StepClock {
    next: std::cell::Cell<DateTime<Utc>>,
}

#[cfg(test)]
impl StepClock {
    pub fn new() -> Self {
        let start = DateTime::parse_from_rfc3339("2024-01-01T09:00:00Z")
            .map(|t| t.with_timezone(&Utc))
            .unwrap();
        Self {
            next: std::cell::Cell::new(start),
        }
    }
}

#[cfg(test)]
impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let now = self.next.get();
        self.next.set(now + chrono::Duration::seconds(1));
        now
    }
}
