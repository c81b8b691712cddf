use near_sdk::json_types::{Base58CryptoHash, Base64VecU8, U128};
use near_sdk::store::IterableMap;
use near_sdk::{
    env, ext_contract, near, require, AccountId, CryptoHash, NearToken, Promise, PromiseError,
    PromiseResult, Timestamp,
};

pub mod errors;
pub mod math;
pub mod registry;
pub mod reward;
pub mod swap;
pub mod timelocks;
pub mod utils;

use errors::*;
use registry::Watcher;
use reward::{Role, SettleOp, Split};
use swap::{Delegation, Swap, SwapId};

const ONE_YOCTO: NearToken = NearToken::from_yoctonear(1);

const MEMO_LOCK: &str = "htlc swap lock";
const MEMO_PAYOUT: &str = "htlc swap payout";
const MEMO_RETURN: &str = "htlc swap return";

// External contract interface: the fungible-token collaborator holding the
// locked balance. Pulls assume the allowance extension (`ft_transfer_from`
// against a pre-approved allowance); any failure it reports aborts the
// enclosing flow.
#[ext_contract(ext_fungible_token)]
pub trait FungibleToken {
    fn ft_transfer(&mut self, receiver_id: AccountId, amount: U128, memo: Option<String>);
    fn ft_transfer_from(
        &mut self,
        owner_id: AccountId,
        new_owner_id: AccountId,
        amount: U128,
        memo: Option<String>,
    );
    fn ft_balance_of(&self, account_id: AccountId) -> U128;
    fn ft_allowance(&self, owner_id: AccountId, spender_id: AccountId) -> U128;
}

#[ext_contract(ext_self)]
pub trait SelfCallbacks {
    fn on_locked(&mut self, id: SwapId, swap: Swap);
    fn on_added(&mut self, id: SwapId, sender: AccountId, token: AccountId, amount: U128);
    fn on_swap_settled(&mut self, id: SwapId, swap: Swap);
}

/// Delegation configuration supplied at initiation; the stored form derives
/// its deadline from the creation time.
#[near(serializers = [json, borsh])]
#[derive(Clone)]
pub enum DelegationParams {
    Watcher {
        watcher: AccountId,
        reward_on_redeem: bool,
    },
    Countdown {
        countdown: u64,
        active: bool,
    },
}

#[near(serializers = [json, borsh])]
#[derive(Clone)]
pub struct InitiateParams {
    pub hashed_secret: Base58CryptoHash,
    pub token: AccountId,
    pub participant: AccountId,
    pub refund_timestamp: Timestamp,
    /// Gross amount pulled from the initiator; the stored record keeps
    /// `value - payoff` as the net recipient share.
    pub value: U128,
    pub payoff: U128,
    pub delegation: DelegationParams,
}

// Define the contract structure
#[near(contract_state)]
pub struct Contract {
    pub owner_id: AccountId,
    // All live swaps, keyed by SwapId; settled swaps are removed, so absence
    // covers both "never existed" and "already spent".
    pub swaps: IterableMap<SwapId, Swap>,
    pub watchers: IterableMap<AccountId, Watcher>,
}

impl Default for Contract {
    fn default() -> Self {
        Self {
            owner_id: env::predecessor_account_id(),
            swaps: IterableMap::new(b"s"),
            watchers: IterableMap::new(b"w"),
        }
    }
}

#[near]
impl Contract {
    #[init]
    pub fn new(owner_id: AccountId) -> Self {
        Self {
            owner_id,
            swaps: IterableMap::new(b"s"),
            watchers: IterableMap::new(b"w"),
        }
    }

    /// Locks `value` of `token` for `participant`, recoverable by preimage
    /// disclosure or refund timeout. The gross amount is pulled from the
    /// caller's pre-approved allowance; the record is written only once the
    /// pull has succeeded.
    pub fn initiate(&mut self, params: InitiateParams) -> Promise {
        let initiator = env::predecessor_account_id();
        let now = env::block_timestamp();
        let token = params.token.clone();
        let value = params.value;

        let (id, swap) = self.prepare_swap(params, initiator.clone(), now);

        ext_fungible_token::ext(token)
            .with_attached_deposit(ONE_YOCTO)
            .with_static_gas(env::prepaid_gas().saturating_div(4))
            .ft_transfer_from(
                initiator,
                env::current_account_id(),
                value,
                Some(MEMO_LOCK.to_string()),
            )
            .then(
                ext_self::ext(env::current_account_id())
                    .with_static_gas(env::prepaid_gas().saturating_div(4))
                    .on_locked(id, swap),
            )
    }

    /// Tops up a countdown swap with additional gross value. Initiator-only,
    /// and only while redemption is still possible.
    pub fn add(&mut self, id: Base58CryptoHash, value: U128) -> Promise {
        let sender = env::predecessor_account_id();
        let now = env::block_timestamp();
        let id: SwapId = id.into();
        require!(value.0 > 0, ERR_VALUE_REQUIRED);

        let swap = self
            .swaps
            .get(&id)
            .unwrap_or_else(|| env::panic_str(ERR_SWAP_EMPTY));
        require!(
            matches!(swap.delegation, Delegation::Countdown { .. }),
            ERR_WRONG_DELEGATION
        );
        require!(sender == swap.initiator, ERR_NOT_INITIATOR);
        require!(now < swap.refund_timestamp, ERR_REFUND_TS_COME);
        let token = swap.token.clone();

        ext_fungible_token::ext(token.clone())
            .with_attached_deposit(ONE_YOCTO)
            .with_static_gas(env::prepaid_gas().saturating_div(4))
            .ft_transfer_from(
                sender.clone(),
                env::current_account_id(),
                value,
                Some(MEMO_LOCK.to_string()),
            )
            .then(
                ext_self::ext(env::current_account_id())
                    .with_static_gas(env::prepaid_gas().saturating_div(4))
                    .on_added(id, sender, token, value),
            )
    }

    /// Opens an inactive countdown swap for redemption. Idempotent.
    pub fn activate(&mut self, id: Base58CryptoHash) {
        let id: SwapId = id.into();
        let swap = self
            .swaps
            .get_mut(&id)
            .unwrap_or_else(|| env::panic_str(ERR_SWAP_EMPTY));
        require!(
            env::predecessor_account_id() == swap.initiator,
            ERR_NOT_INITIATOR
        );
        match &mut swap.delegation {
            Delegation::Countdown { active, .. } => *active = true,
            Delegation::Watcher { .. } => env::panic_str(ERR_WRONG_DELEGATION),
        }
        utils::log_activated(&id);
    }

    /// Settles a swap in the participant's favor against the disclosed
    /// secret. Who pockets the payoff depends on the caller's role and the
    /// position of the current time relative to the swap's windows.
    pub fn redeem(&mut self, id: Base58CryptoHash, secret: Base64VecU8) -> Promise {
        let caller = env::predecessor_account_id();
        let now = env::block_timestamp();
        let id: SwapId = id.into();

        let swap = self
            .swaps
            .get(&id)
            .unwrap_or_else(|| env::panic_str(ERR_SWAP_EMPTY));
        match &swap.delegation {
            // Past the refund timestamp only the initiator may still redeem.
            Delegation::Watcher { .. } => require!(
                now < swap.refund_timestamp || caller == swap.initiator,
                ERR_REFUND_TS_COME
            ),
            Delegation::Countdown { active, .. } => {
                require!(*active, ERR_SWAP_NOT_ACTIVE);
                require!(now < swap.refund_timestamp, ERR_REFUND_TS_COME);
            }
        }
        swap::validate_secret(&secret.0, &swap.hashed_secret);

        let role = self.classify(swap, &caller);
        let split = reward::resolve(SettleOp::Redeem, swap, role, now);

        // Terminal transition: the slot is cleared before any token leaves
        // the contract, so a reentrant call observes an empty record.
        let swap = self
            .swaps
            .remove(&id)
            .unwrap_or_else(|| env::panic_str(ERR_SWAP_EMPTY));
        utils::log_redeemed(&id, &swap.hashed_secret, &secret.0);
        let recipient = swap.participant.clone();
        self.settle(id, swap, recipient, split, caller)
    }

    /// Returns a timed-out swap to its initiator, less the payoff when a
    /// reward-eligible watcher performs the call.
    pub fn refund(&mut self, id: Base58CryptoHash) -> Promise {
        let caller = env::predecessor_account_id();
        let now = env::block_timestamp();
        let id: SwapId = id.into();

        let swap = self
            .swaps
            .get(&id)
            .unwrap_or_else(|| env::panic_str(ERR_SWAP_EMPTY));
        timelocks::assert_refundable(swap.refund_timestamp, now);

        let role = self.classify(swap, &caller);
        let split = reward::resolve(SettleOp::Refund, swap, role, now);

        let swap = self
            .swaps
            .remove(&id)
            .unwrap_or_else(|| env::panic_str(ERR_SWAP_EMPTY));
        utils::log_refunded(&id, &swap.hashed_secret);
        let recipient = swap.initiator.clone();
        self.settle(id, swap, recipient, split, caller)
    }

    /// Emergency sweep of a watcher-delegated swap abandoned by both
    /// counterparties: owner-only, and only well past the refund timestamp.
    pub fn release(&mut self, id: Base58CryptoHash) -> Promise {
        self.assert_owner();
        let now = env::block_timestamp();
        let id: SwapId = id.into();

        let swap = self
            .swaps
            .get(&id)
            .unwrap_or_else(|| env::panic_str(ERR_SWAP_EMPTY));
        require!(
            matches!(swap.delegation, Delegation::Watcher { .. }),
            ERR_WRONG_DELEGATION
        );
        timelocks::assert_releasable(swap.refund_timestamp, now);

        let swap = self
            .swaps
            .remove(&id)
            .unwrap_or_else(|| env::panic_str(ERR_SWAP_EMPTY));
        let amount = swap.gross();
        utils::log_released(&id, &self.owner_id, amount);
        let owner = self.owner_id.clone();
        let split = Split {
            recipient_amount: amount,
            caller_reward: 0,
        };
        self.settle(id, swap, owner.clone(), split, owner)
    }

    // --- WATCHER REGISTRY ---

    /// Self-registration with an attached native stake. Proposed watchers
    /// start inactive; re-proposing adds to the stake.
    #[payable]
    pub fn propose_watcher(&mut self) {
        let watcher_id = env::predecessor_account_id();
        let deposit = env::attached_deposit();
        require!(deposit.as_yoctonear() > 0, ERR_DEPOSIT_REQUIRED);

        match self.watchers.get_mut(&watcher_id) {
            Some(watcher) => {
                watcher.deposit = watcher
                    .deposit
                    .checked_add(deposit)
                    .unwrap_or_else(|| env::panic_str(ERR_VALUE_ADD_OVERFLOW));
                utils::log_watcher_event("PROPOSED", &watcher_id, watcher.deposit);
            }
            None => {
                utils::log_watcher_event("PROPOSED", &watcher_id, deposit);
                self.watchers.insert(watcher_id, Watcher::new(deposit));
            }
        }
    }

    pub fn activate_watcher(&mut self, watcher_id: AccountId) {
        self.assert_owner();
        let watcher = self
            .watchers
            .get_mut(&watcher_id)
            .unwrap_or_else(|| env::panic_str(ERR_WATCHER_NOT_FOUND));
        watcher.active = true;
        utils::log_watcher_event("ACTIVATED", &watcher_id, watcher.deposit);
    }

    pub fn deactivate_watcher(&mut self, watcher_id: AccountId) {
        self.assert_owner();
        let watcher = self
            .watchers
            .get_mut(&watcher_id)
            .unwrap_or_else(|| env::panic_str(ERR_WATCHER_NOT_FOUND));
        watcher.active = false;
        utils::log_watcher_event("DEACTIVATED", &watcher_id, watcher.deposit);
    }

    /// Returns the caller's full stake and deletes the record, whatever its
    /// current active state.
    pub fn withdraw_watcher(&mut self) -> Promise {
        let watcher_id = env::predecessor_account_id();
        let watcher = self
            .watchers
            .remove(&watcher_id)
            .unwrap_or_else(|| env::panic_str(ERR_WATCHER_NOT_FOUND));
        utils::log_watcher_event("WITHDRAWN", &watcher_id, watcher.deposit);
        Promise::new(watcher_id).transfer(watcher.deposit)
    }

    // --- VIEWS ---

    pub fn get_swap(&self, id: Base58CryptoHash) -> Option<Swap> {
        self.swaps.get(&CryptoHash::from(id)).cloned()
    }

    pub fn get_watcher(&self, watcher_id: AccountId) -> Option<Watcher> {
        self.watchers.get(&watcher_id).cloned()
    }

    pub fn get_owner(&self) -> AccountId {
        self.owner_id.clone()
    }

    // --- PRIVATE CALLBACKS ---

    #[private]
    pub fn on_locked(
        &mut self,
        #[callback_result] result: Result<(), PromiseError>,
        id: SwapId,
        swap: Swap,
    ) {
        if result.is_err() {
            env::panic_str(ERR_LOCK_FAILED);
        }
        if self.swaps.contains_key(&id) {
            // Lost the slot to a concurrent initiation while the pull was in
            // flight; hand the tokens back instead of clobbering the record.
            let amount = swap.gross();
            utils::log_lock_returned(&id, &swap.initiator, amount);
            self.transfer_token(&swap.token, &swap.initiator, amount, MEMO_RETURN);
            return;
        }
        utils::log_initiated(&id, &swap);
        self.swaps.insert(id, swap);
    }

    #[private]
    pub fn on_added(
        &mut self,
        #[callback_result] result: Result<(), PromiseError>,
        id: SwapId,
        sender: AccountId,
        token: AccountId,
        amount: U128,
    ) {
        if result.is_err() {
            env::panic_str(ERR_ADD_FAILED);
        }
        match self.swaps.get_mut(&id) {
            Some(swap) => {
                swap.value = U128(math::add_value(swap.value.0, amount.0));
                let value = swap.value.0;
                utils::log_added(&id, &sender, value);
            }
            None => {
                // The swap settled while the pull was in flight.
                utils::log_add_returned(&id, &sender, amount.0);
                self.transfer_token(&token, &sender, amount.0, MEMO_RETURN);
            }
        }
    }

    #[private]
    pub fn on_swap_settled(&mut self, id: SwapId, swap: Swap) {
        let all_ok = (0..env::promise_results_count())
            .all(|i| matches!(env::promise_result(i), PromiseResult::Successful(_)));
        if all_ok {
            utils::log_settled(&id);
        } else {
            // A payout leg failed; restore the record so the funds stay
            // recoverable through the normal paths.
            self.swaps.insert(id, swap);
            utils::log_settlement_failed(&id);
        }
    }
}

impl Contract {
    /// Validates every initiation precondition and builds the record that the
    /// lock callback will install. No state is mutated here.
    fn prepare_swap(
        &self,
        params: InitiateParams,
        initiator: AccountId,
        now: Timestamp,
    ) -> (SwapId, Swap) {
        let hashed_secret: CryptoHash = params.hashed_secret.into();
        require!(params.value.0 > 0, ERR_VALUE_REQUIRED);
        timelocks::assert_refund_timestamp_valid(params.refund_timestamp, now);
        let net = math::sub_value(params.value.0, params.payoff.0);

        let (id, delegation) = match params.delegation {
            DelegationParams::Watcher {
                watcher,
                reward_on_redeem,
            } => {
                require!(self.watcher_is_active(&watcher), ERR_WATCHER_UNKNOWN);
                let deadline =
                    timelocks::watcher_deadline(now, params.refund_timestamp, reward_on_redeem);
                let id = swap::derive_id(
                    &hashed_secret,
                    &params.token,
                    &params.participant,
                    &initiator,
                );
                (
                    id,
                    Delegation::Watcher {
                        watcher,
                        deadline,
                        reward_on_redeem,
                    },
                )
            }
            DelegationParams::Countdown { countdown, active } => {
                timelocks::assert_countdown_valid(countdown, now, params.refund_timestamp);
                // One live swap per commitment in this variant.
                (hashed_secret, Delegation::Countdown { countdown, active })
            }
        };
        require!(!self.swaps.contains_key(&id), ERR_SWAP_ALREADY_INITIATED);

        let swap = Swap {
            hashed_secret,
            token: params.token,
            participant: params.participant,
            initiator,
            refund_timestamp: params.refund_timestamp,
            value: U128(net),
            payoff: params.payoff,
            delegation,
        };
        (id, swap)
    }

    fn classify(&self, swap: &Swap, caller: &AccountId) -> Role {
        if caller == &swap.participant {
            return Role::Participant;
        }
        if caller == &swap.initiator {
            return Role::Initiator;
        }
        if let Delegation::Watcher { watcher, .. } = &swap.delegation {
            if caller == watcher {
                return Role::AssignedWatcher;
            }
            if self.watcher_is_active(caller) {
                return Role::ActiveWatcher;
            }
        }
        Role::Other
    }

    fn watcher_is_active(&self, account_id: &AccountId) -> bool {
        self.watchers
            .get(account_id)
            .map(Watcher::is_active)
            .unwrap_or(false)
    }

    fn assert_owner(&self) {
        require!(env::predecessor_account_id() == self.owner_id, ERR_NOT_OWNER);
    }

    fn transfer_token(
        &self,
        token: &AccountId,
        receiver: &AccountId,
        amount: u128,
        memo: &str,
    ) -> Promise {
        ext_fungible_token::ext(token.clone())
            .with_attached_deposit(ONE_YOCTO)
            .with_static_gas(env::prepaid_gas().saturating_div(4))
            .ft_transfer(receiver.clone(), U128(amount), Some(memo.to_string()))
    }

    /// Issues the payout legs for a settled swap and schedules the
    /// settlement callback. Zero-amount legs are never issued.
    fn settle(
        &self,
        id: SwapId,
        swap: Swap,
        recipient: AccountId,
        split: Split,
        caller: AccountId,
    ) -> Promise {
        let main = (split.recipient_amount > 0)
            .then(|| self.transfer_token(&swap.token, &recipient, split.recipient_amount, MEMO_PAYOUT));
        let reward = (split.caller_reward > 0)
            .then(|| self.transfer_token(&swap.token, &caller, split.caller_reward, MEMO_PAYOUT));

        let transfers = match (main, reward) {
            (Some(main), Some(reward)) => main.and(reward),
            (Some(main), None) => main,
            (None, Some(reward)) => reward,
            // Unreachable: a swap never locks a zero gross value.
            (None, None) => env::panic_str(ERR_VALUE_REQUIRED),
        };
        transfers.then(
            ext_self::ext(env::current_account_id())
                .with_static_gas(env::prepaid_gas().saturating_div(4))
                .on_swap_settled(id, swap),
        )
    }
}
