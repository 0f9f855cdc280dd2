// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! UTC timestamp helpers.
//!
//! All persisted and wire-visible timestamps are RFC 3339 UTC strings with
//! fixed millisecond precision and a trailing `Z`. The fixed width makes
//! lexicographic comparison equal to chronological comparison, which the
//! queue relies on for lease-expiry checks done in SQL.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};

/// Current UTC instant as an RFC 3339 string, e.g. `2026-08-02T09:15:42.103Z`.
pub fn utc_now() -> String {
    format_utc(Utc::now())
}

/// UTC instant `offset` in the future, same format as [`utc_now`].
pub fn utc_after(offset: Duration) -> String {
    let offset = chrono::TimeDelta::from_std(offset).unwrap_or(chrono::TimeDelta::zero());
    format_utc(Utc::now() + offset)
}

/// Render a UTC instant in the agent's canonical format.
pub fn format_utc(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_fixed_width_utc() {
        let now = utc_now();
        assert_eq!(now.len(), 24, "got: {now}");
        assert!(now.ends_with('Z'));
    }

    #[test]
    fn later_instants_sort_after_earlier_ones() {
        let earlier = utc_now();
        let later = utc_after(Duration::from_secs(5));
        assert!(later > earlier, "{later} should sort after {earlier}");
    }

    #[test]
    fn utc_after_zero_matches_now_to_the_second() {
        let a = utc_now();
        let b = utc_after(Duration::ZERO);
        assert_eq!(&a[..19], &b[..19]);
    }
}
