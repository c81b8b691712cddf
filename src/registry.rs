use near_sdk::{near, NearToken};

/// A registry watcher: a staked agent the owner can toggle in and out of
/// reward eligibility. The stake is native NEAR held by the contract and is
/// independent of any swap. A withdrawn watcher leaves no record, so a
/// zero-stake entry can never exist.
#[near(serializers = [json, borsh])]
#[derive(Clone)]
pub struct Watcher {
    pub deposit: NearToken,
    pub active: bool,
}

impl Watcher {
    pub fn new(deposit: NearToken) -> Self {
        Self {
            deposit,
            active: false,
        }
    }

    /// Eligible to be assigned to new swaps and to earn rewards.
    pub fn is_active(&self) -> bool {
        self.active && !self.deposit.is_zero()
    }
}
