//! Clock port

use chrono::{DateTime, Utc};

/// Source of the current time for expiry checks.
///
/// Any `Fn() -> DateTime<Utc>` is a clock, so `Utc::now` can be passed
/// directly and tests can pin the time with a closure.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;
}

impl<F> Clock for F
where
    F: Fn() -> DateTime<Utc> + Send + Sync,
{
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_a_clock() {
        let pinned = DateTime::from_timestamp(1_767_225_600, 0).unwrap_or_default();
        let clock: &dyn Clock = &move || pinned;
        assert_eq!(clock.now(), pinned);
    }
}
