//! Reject reasons surfaced by the contract. Every precondition failure
//! panics with one of these, before any state is written.

// Identity
pub const ERR_NOT_OWNER: &str = "sender is not the owner";
pub const ERR_NOT_INITIATOR: &str = "caller is not the initiator";
pub const ERR_WATCHER_UNKNOWN: &str = "watcher does not exist or is not active";
pub const ERR_WATCHER_NOT_FOUND: &str = "watcher does not exist";

// State
pub const ERR_SWAP_ALREADY_INITIATED: &str = "swap for this ID is already initiated";
pub const ERR_SWAP_EMPTY: &str = "swap for this ID is empty or already spent";
pub const ERR_SWAP_NOT_ACTIVE: &str = "swap is not active";
pub const ERR_WRONG_DELEGATION: &str = "swap does not support this operation";

// Timing
pub const ERR_REFUND_TS_NOT_FUTURE: &str = "refund timestamp must be in the future";
pub const ERR_REFUND_TS_COME: &str = "refund timestamp has already come";
pub const ERR_REFUND_TS_NOT_COME: &str = "refund timestamp has not come";
pub const ERR_RELEASE_NOT_COME: &str = "release grace period has not passed";
pub const ERR_INVALID_COUNTDOWN: &str = "invalid countdown";

// Arithmetic
pub const ERR_VALUE_REQUIRED: &str = "value must be positive";
pub const ERR_VALUE_ADD_OVERFLOW: &str = "value overflow on addition";
pub const ERR_VALUE_SUB_OVERFLOW: &str = "subtraction overflow";
pub const ERR_TIME_ADD_OVERFLOW: &str = "timestamp overflow on addition";
pub const ERR_TIME_SUB_OVERFLOW: &str = "timestamp underflow on subtraction";
pub const ERR_TIME_MUL_OVERFLOW: &str = "timestamp overflow on multiplication";

// Preimage
pub const ERR_SECRET_LENGTH: &str = "secret must be exactly 32 bytes";
pub const ERR_SECRET_MISMATCH: &str = "secret is not correct";

// Custody
pub const ERR_DEPOSIT_REQUIRED: &str = "a positive native deposit must be attached";
pub const ERR_LOCK_FAILED: &str = "token transfer failed; swap not initiated";
pub const ERR_ADD_FAILED: &str = "token transfer failed; value not added";
