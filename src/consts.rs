/// Minutes of tolerance around the expected check-in/check-out before a
/// status is downgraded to late / early-leave.
pub const DEFAULT_GRACE_MINUTES: i64 = 15;

/// School timezone relative to the timestamps held in the store, UTC+7.
pub const DEFAULT_TZ_OFFSET_MINUTES: i32 = 420;
