use near_sdk::{bs58, env, AccountId, CryptoHash, NearToken};

use crate::swap::{Delegation, Swap, SwapId};

fn delegation_suffix(delegation: &Delegation) -> String {
    match delegation {
        Delegation::Watcher {
            watcher,
            deadline,
            reward_on_redeem,
        } => format!(
            "watcher='{}', watcher_deadline='{}', reward_on_redeem='{}'",
            watcher, deadline, reward_on_redeem
        ),
        Delegation::Countdown { countdown, active } => {
            format!("countdown='{}', active='{}'", countdown, active)
        }
    }
}

fn encode(hash: &CryptoHash) -> String {
    bs58::encode(hash).into_string()
}

// Helpers for consistent logging; counterparties watch these lines to react
// to transitions without polling full state.

pub fn log_initiated(id: &SwapId, swap: &Swap) {
    env::log_str(&format!(
        "SWAP_INITIATED: id='{}', hashed_secret='{}', token='{}', participant='{}', \
         initiator='{}', refund_timestamp='{}', value='{}', payoff='{}', {}",
        encode(id),
        encode(&swap.hashed_secret),
        swap.token,
        swap.participant,
        swap.initiator,
        swap.refund_timestamp,
        swap.value.0,
        swap.payoff.0,
        delegation_suffix(&swap.delegation),
    ));
}

pub fn log_added(id: &SwapId, sender: &AccountId, value: u128) {
    env::log_str(&format!(
        "SWAP_ADDED: id='{}', sender='{}', value='{}'",
        encode(id),
        sender,
        value
    ));
}

pub fn log_activated(id: &SwapId) {
    env::log_str(&format!("SWAP_ACTIVATED: id='{}'", encode(id)));
}

/// The disclosed preimage becomes public here by construction; the
/// counterparty on the other leg of the swap depends on seeing it.
pub fn log_redeemed(id: &SwapId, hashed_secret: &CryptoHash, secret: &[u8]) {
    env::log_str(&format!(
        "SWAP_REDEEMED: id='{}', hashed_secret='{}', secret='{}'",
        encode(id),
        encode(hashed_secret),
        bs58::encode(secret).into_string(),
    ));
}

pub fn log_refunded(id: &SwapId, hashed_secret: &CryptoHash) {
    env::log_str(&format!(
        "SWAP_REFUNDED: id='{}', hashed_secret='{}'",
        encode(id),
        encode(hashed_secret),
    ));
}

pub fn log_released(id: &SwapId, owner: &AccountId, amount: u128) {
    env::log_str(&format!(
        "SWAP_RELEASED: id='{}', owner='{}', amount='{}'",
        encode(id),
        owner,
        amount
    ));
}

pub fn log_watcher_event(event: &str, watcher: &AccountId, deposit: NearToken) {
    env::log_str(&format!(
        "WATCHER_{}: watcher='{}', deposit='{}'",
        event,
        watcher,
        deposit.as_yoctonear()
    ));
}

pub fn log_lock_returned(id: &SwapId, sender: &AccountId, amount: u128) {
    env::log_str(&format!(
        "SWAP_LOCK_RETURNED: id='{}', sender='{}', amount='{}'",
        encode(id),
        sender,
        amount
    ));
}

pub fn log_add_returned(id: &SwapId, sender: &AccountId, amount: u128) {
    env::log_str(&format!(
        "SWAP_ADD_RETURNED: id='{}', sender='{}', amount='{}'",
        encode(id),
        sender,
        amount
    ));
}

pub fn log_settled(id: &SwapId) {
    env::log_str(&format!("SWAP_SETTLED: id='{}'", encode(id)));
}

pub fn log_settlement_failed(id: &SwapId) {
    env::log_str(&format!(
        "SWAP_SETTLEMENT_FAILED: restored record for id='{}'",
        encode(id)
    ));
}
