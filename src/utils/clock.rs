use chrono::{DateTime, SubsecRound, Utc};

/// Current time at millisecond precision, the resolution timestamps have on the wire.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
