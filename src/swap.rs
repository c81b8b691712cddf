use near_sdk::borsh::BorshSerialize;
use near_sdk::json_types::U128;
use near_sdk::{env, near, require, AccountId, CryptoHash, Timestamp};

use crate::errors::*;

/// Unique identifier for a swap. Watcher-delegated swaps derive it from the
/// full counterparty relationship; countdown swaps are keyed by the
/// commitment itself, so one secret backs at most one live swap.
pub type SwapId = CryptoHash;

pub const SECRET_LEN: usize = 32;

/// Per-swap delegation configuration, one arm per engine variant.
#[near(serializers = [json, borsh])]
#[derive(Clone)]
pub enum Delegation {
    /// A registry watcher is assigned at creation. Past `deadline` every
    /// active watcher becomes reward-eligible, not only the assigned one.
    /// `reward_on_redeem` selects which of redeem/refund pays the watcher.
    Watcher {
        watcher: AccountId,
        deadline: Timestamp,
        reward_on_redeem: bool,
    },
    /// No registry; any caller redeeming inside the trailing `countdown`
    /// window (seconds before the refund timestamp) earns the payoff.
    /// A swap created inactive cannot be redeemed until activated.
    Countdown { countdown: u64, active: bool },
}

/// A single locked swap. The record exists only between initiation and
/// settlement; settled and never-created swaps are indistinguishable.
#[near(serializers = [json, borsh])]
#[derive(Clone)]
pub struct Swap {
    pub hashed_secret: CryptoHash,
    pub token: AccountId,
    pub participant: AccountId,
    pub initiator: AccountId,
    pub refund_timestamp: Timestamp,
    // Net amount payable to the recipient; the payoff was split off when the
    // gross value was pulled in.
    pub value: U128,
    pub payoff: U128,
    pub delegation: Delegation,
}

impl Swap {
    pub fn gross(&self) -> u128 {
        crate::math::add_value(self.value.0, self.payoff.0)
    }
}

/// Identifier for a watcher-delegated swap: a structured hash over the full
/// relationship, so the same commitment can back unrelated pairs without
/// colliding. Borsh length-prefixes the account strings.
pub fn derive_id(
    hashed_secret: &CryptoHash,
    token: &AccountId,
    participant: &AccountId,
    initiator: &AccountId,
) -> SwapId {
    let mut buffer = Vec::new();
    (hashed_secret, token, participant, initiator)
        .serialize(&mut buffer)
        .unwrap_or_else(|_| env::panic_str("id serialization failed"));
    env::sha256_array(&buffer)
}

/// The stored commitment is a double SHA-256 of a 32-byte secret.
pub fn commitment(secret: &[u8]) -> CryptoHash {
    env::sha256_array(&env::sha256_array(secret))
}

/// Exact length is checked before the hash comparison runs, with a distinct
/// error per axis.
pub fn validate_secret(secret: &[u8], hashed_secret: &CryptoHash) {
    require!(secret.len() == SECRET_LEN, ERR_SECRET_LENGTH);
    require!(&commitment(secret) == hashed_secret, ERR_SECRET_MISMATCH);
}
