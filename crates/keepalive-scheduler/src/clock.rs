//! Wall-clock alignment for the digest timer.

use std::time::Duration;

use chrono::{DateTime, NaiveTime, TimeZone};

const ONE_DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Time from `now` until the next occurrence of `at` in `now`'s timezone.
///
/// "Next" is strictly in the future: at exactly `at` the answer is one day.
/// Local times skipped by a DST jump resolve to the following day.
pub fn delay_until_next<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> Duration {
    let tz = now.timezone();
    now.date_naive()
        .iter_days()
        .take(3)
        .filter_map(|day| tz.from_local_datetime(&day.and_time(at)).earliest())
        .find(|candidate| candidate > now)
        .and_then(|next| next.signed_duration_since(now.clone()).to_std().ok())
        .unwrap_or(ONE_DAY)
}
