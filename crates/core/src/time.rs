//! Utility module for working with timestamps: one formatted for human-readable log lines, one
//! formatted for the `conversion_log_<YYYYMMDD_HHMMSS>.txt` filename.

use time::OffsetDateTime;

fn local_or_utc_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Returns a formatted [`String`] with the current time, for prefixing log lines.
///
/// Note that this may be the local time, or may fall back to UTC if the local offset can't be
/// determined.
#[must_use]
#[inline]
pub fn current_time() -> String {
    let time = local_or_utc_now();
    format!(
        "{}-{:02}-{:02} {:02}:{:02}:{:02}",
        time.year(),
        time.month() as u8,
        time.day(),
        time.hour(),
        time.minute(),
        time.second()
    )
}

/// Returns the current time formatted as `YYYYMMDD_HHMMSS`, for naming the per-run conversion log.
#[must_use]
#[inline]
pub fn log_filename_timestamp() -> String {
    let time = local_or_utc_now();
    format!(
        "{:04}{:02}{:02}_{:02}{:02}{:02}",
        time.year(),
        time.month() as u8,
        time.day(),
        time.hour(),
        time.minute(),
        time.second()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_filename_timestamp_has_expected_shape() {
        let stamp = log_filename_timestamp();
        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.as_bytes()[8], b'_');
        assert!(stamp.bytes().enumerate().all(|(i, b)| i == 8 || b.is_ascii_digit()));
    }
}
