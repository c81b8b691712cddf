use near_sdk::{require, Timestamp};

use crate::errors::*;
use crate::math;

pub const NANOS_IN_SEC: u64 = 1_000_000_000;

/// Grace period past the refund timestamp before the owner may sweep an
/// abandoned swap.
pub const RELEASE_GRACE: u64 = 7 * 24 * 60 * 60 * NANOS_IN_SEC;

/// The refund timestamp must be strictly in the future at creation.
pub fn assert_refund_timestamp_valid(refund_timestamp: Timestamp, now: Timestamp) {
    require!(refund_timestamp > now, ERR_REFUND_TS_NOT_FUTURE);
}

/// Point after which reward eligibility widens from the assigned watcher to
/// any active watcher. Placed at two thirds of the refund window when the
/// reward rides on redeem, and half a window past the refund timestamp when
/// it rides on refund.
pub fn watcher_deadline(
    now: Timestamp,
    refund_timestamp: Timestamp,
    reward_on_redeem: bool,
) -> Timestamp {
    let window = math::sub_time(refund_timestamp, now);
    if reward_on_redeem {
        math::add_time(now, math::mul_time(window, 2) / 3)
    } else {
        math::add_time(now, math::mul_time(window, 3) / 2)
    }
}

/// The countdown may not exceed the refund window, and its nanosecond
/// conversion must stay representable.
pub fn assert_countdown_valid(countdown: u64, now: Timestamp, refund_timestamp: Timestamp) {
    let countdown_ns = math::mul_time(countdown, NANOS_IN_SEC);
    require!(
        countdown_ns <= math::sub_time(refund_timestamp, now),
        ERR_INVALID_COUNTDOWN
    );
}

/// Start of the terminal incentive window: inside it any redeeming caller
/// earns the payoff.
pub fn countdown_start(refund_timestamp: Timestamp, countdown: u64) -> Timestamp {
    math::sub_time(refund_timestamp, math::mul_time(countdown, NANOS_IN_SEC))
}

pub fn assert_refundable(refund_timestamp: Timestamp, now: Timestamp) {
    require!(now >= refund_timestamp, ERR_REFUND_TS_NOT_COME);
}

pub fn assert_releasable(refund_timestamp: Timestamp, now: Timestamp) {
    require!(
        now >= math::add_time(refund_timestamp, RELEASE_GRACE),
        ERR_RELEASE_NOT_COME
    );
}
