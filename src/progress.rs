/// Structured progress callback contract.
///
/// Ordering contract: the transcoder calls `report` with monotonically
/// non-decreasing percentages, issues a final `report(100, …)` immediately
/// before completing, and the task runner resets to `(0, "")` after either
/// completion or failure. No thread affinity is assumed; consumers marshal
/// updates to their own execution context if they need to.
pub trait ProgressReporter: Send {
    fn report(&self, percent: u8, message: &str);
}

/// No-op reporter for direct library calls and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressReporter for NullProgress {
    fn report(&self, _percent: u8, _message: &str) {}
}

/// Percentage of `done` out of `total`, saturating at 100 and treating an
/// empty batch as complete.
pub fn percent_of(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done * 100) / total).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_math() {
        assert_eq!(percent_of(0, 4), 0);
        assert_eq!(percent_of(1, 4), 25);
        assert_eq!(percent_of(4, 4), 100);
        assert_eq!(percent_of(0, 0), 100);
        assert_eq!(percent_of(7, 4), 100);
    }
}
