//! Task progress reporting.
//!
//! Pollers see a whole-number percentage and a short status phrase; both
//! are derived here from the stored counters and status.

use crate::models::TaskStatus;

/// Returns the completion percentage of a task in `0..=100`.
///
/// Zero when `total` is zero; otherwise `processed / total * 100` floored
/// and capped at 100.
///
/// # Examples
///
/// ```
/// use contribution_engine::calculation::progress;
///
/// assert_eq!(progress(0, 0), 0);
/// assert_eq!(progress(5, 10), 50);
/// assert_eq!(progress(2, 3), 66);
/// ```
pub fn progress(processed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }

    let pct = u64::from(processed) * 100 / u64::from(total);
    pct.min(100) as u8
}

/// Returns the human-readable status phrase shown to pollers.
pub fn status_message(status: TaskStatus, pct: u8) -> String {
    match status {
        TaskStatus::Pending => "waiting to start".to_string(),
        TaskStatus::Processing => format!("in progress, {}%", pct),
        TaskStatus::Completed => "finished".to_string(),
        TaskStatus::Failed => "failed".to_string(),
        TaskStatus::Cancelled => "cancelled".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_total_is_zero_percent() {
        assert_eq!(progress(0, 0), 0);
        assert_eq!(progress(5, 0), 0);
    }

    #[test]
    fn test_half_done() {
        assert_eq!(progress(5, 10), 50);
    }

    #[test]
    fn test_all_done() {
        assert_eq!(progress(10, 10), 100);
    }

    #[test]
    fn test_progress_floors() {
        assert_eq!(progress(3, 10), 30);
        assert_eq!(progress(1, 3), 33);
        assert_eq!(progress(2, 3), 66);
        assert_eq!(progress(999, 1000), 99);
    }

    #[test]
    fn test_progress_is_capped() {
        assert_eq!(progress(15, 10), 100);
        assert_eq!(progress(u32::MAX, 1), 100);
    }

    #[test]
    fn test_status_messages() {
        assert_eq!(status_message(TaskStatus::Pending, 0), "waiting to start");
        assert_eq!(status_message(TaskStatus::Processing, 42), "in progress, 42%");
        assert_eq!(status_message(TaskStatus::Completed, 100), "finished");
        assert_eq!(status_message(TaskStatus::Failed, 10), "failed");
        assert_eq!(status_message(TaskStatus::Cancelled, 10), "cancelled");
    }
}
