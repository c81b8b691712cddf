use near_sdk::Timestamp;

use crate::swap::{Delegation, Swap};
use crate::timelocks;

/// Caller classification relative to a swap. Classification happens once per
/// call; everything downstream branches on this closed set only.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Role {
    Participant,
    Initiator,
    AssignedWatcher,
    ActiveWatcher,
    Other,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SettleOp {
    Redeem,
    Refund,
}

/// How the locked gross value splits between the rightful recipient (the
/// participant on redeem, the initiator on refund) and the acting caller.
/// Every arm conserves value: `recipient_amount + caller_reward == gross`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Split {
    pub recipient_amount: u128,
    pub caller_reward: u128,
}

/// Single resolution point for the caller-role/time-window payoff matrix.
/// Watcher swaps pay the reward on the operation selected by
/// `reward_on_redeem`: the assigned watcher is eligible for it at any time,
/// any other active watcher only once the deadline has passed. Countdown
/// swaps pay any redeeming caller inside the terminal window.
pub fn resolve(op: SettleOp, swap: &Swap, role: Role, now: Timestamp) -> Split {
    let rewarded = Split {
        recipient_amount: swap.value.0,
        caller_reward: swap.payoff.0,
    };
    let unrewarded = Split {
        recipient_amount: swap.gross(),
        caller_reward: 0,
    };

    match (op, &swap.delegation, role) {
        // The participant absorbs both shares of its own redemption.
        (SettleOp::Redeem, _, Role::Participant) => unrewarded,

        // Self-service redemption past the deadline: the initiator recovers
        // the payoff while the participant still gets the net value.
        (SettleOp::Redeem, Delegation::Watcher { .. }, Role::Initiator)
            if now >= swap.refund_timestamp =>
        {
            rewarded
        }

        (
            SettleOp::Redeem,
            Delegation::Watcher {
                reward_on_redeem: true,
                ..
            },
            Role::AssignedWatcher,
        ) => rewarded,
        (
            SettleOp::Redeem,
            Delegation::Watcher {
                reward_on_redeem: true,
                deadline,
                ..
            },
            Role::ActiveWatcher,
        ) if now >= *deadline => rewarded,
        (SettleOp::Redeem, Delegation::Watcher { .. }, _) => unrewarded,

        (SettleOp::Redeem, Delegation::Countdown { countdown, .. }, _)
            if now >= timelocks::countdown_start(swap.refund_timestamp, *countdown) =>
        {
            rewarded
        }
        (SettleOp::Redeem, Delegation::Countdown { .. }, _) => unrewarded,

        (
            SettleOp::Refund,
            Delegation::Watcher {
                reward_on_redeem: false,
                ..
            },
            Role::AssignedWatcher,
        ) => rewarded,
        (
            SettleOp::Refund,
            Delegation::Watcher {
                reward_on_redeem: false,
                deadline,
                ..
            },
            Role::ActiveWatcher,
        ) if now >= *deadline => rewarded,

        // Everything else refunds the full amount to the initiator.
        (SettleOp::Refund, _, _) => unrewarded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swap::commitment;
    use crate::timelocks::NANOS_IN_SEC;
    use near_sdk::json_types::U128;
    use near_sdk::AccountId;

    const T0: Timestamp = 1_700_000_000 * NANOS_IN_SEC;
    const REFUND: Timestamp = T0 + 60 * NANOS_IN_SEC;

    fn acc(s: &str) -> AccountId {
        s.parse().unwrap()
    }

    fn watcher_swap(reward_on_redeem: bool) -> Swap {
        Swap {
            hashed_secret: commitment(&[0x11u8; 32]),
            token: acc("usdc.near"),
            participant: acc("alice.near"),
            initiator: acc("bob.near"),
            refund_timestamp: REFUND,
            value: U128(99),
            payoff: U128(1),
            delegation: Delegation::Watcher {
                watcher: acc("tower.near"),
                deadline: timelocks::watcher_deadline(T0, REFUND, reward_on_redeem),
                reward_on_redeem,
            },
        }
    }

    fn countdown_swap(countdown: u64) -> Swap {
        Swap {
            hashed_secret: commitment(&[0x11u8; 32]),
            token: acc("usdc.near"),
            participant: acc("alice.near"),
            initiator: acc("bob.near"),
            refund_timestamp: REFUND,
            value: U128(299),
            payoff: U128(1),
            delegation: Delegation::Countdown {
                countdown,
                active: true,
            },
        }
    }

    fn assert_split(split: Split, recipient: u128, reward: u128) {
        assert_eq!(split.recipient_amount, recipient);
        assert_eq!(split.caller_reward, reward);
    }

    #[test]
    fn every_arm_conserves_value() {
        let roles = [
            Role::Participant,
            Role::Initiator,
            Role::AssignedWatcher,
            Role::ActiveWatcher,
            Role::Other,
        ];
        let times = [T0, T0 + 40 * NANOS_IN_SEC, REFUND, REFUND + NANOS_IN_SEC];
        for swap in [watcher_swap(true), watcher_swap(false), countdown_swap(10)] {
            for role in roles {
                for now in times {
                    for op in [SettleOp::Redeem, SettleOp::Refund] {
                        let split = resolve(op, &swap, role, now);
                        assert_eq!(
                            split.recipient_amount + split.caller_reward,
                            swap.gross()
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn assigned_watcher_earns_payoff_immediately() {
        let swap = watcher_swap(true);
        let split = resolve(SettleOp::Redeem, &swap, Role::AssignedWatcher, T0 + 1);
        assert_split(split, 99, 1);
    }

    #[test]
    fn participant_redeem_takes_both_shares() {
        let swap = watcher_swap(true);
        let split = resolve(SettleOp::Redeem, &swap, Role::Participant, T0 + 1);
        assert_split(split, 100, 0);
    }

    #[test]
    fn unprivileged_redeem_forfeits_the_reward_to_the_participant() {
        let swap = watcher_swap(true);
        let split = resolve(SettleOp::Redeem, &swap, Role::Other, T0 + 1);
        assert_split(split, 100, 0);
    }

    #[test]
    fn other_active_watcher_becomes_eligible_at_the_deadline_and_stays() {
        let swap = watcher_swap(true);
        let deadline = T0 + 40 * NANOS_IN_SEC;
        assert_split(
            resolve(SettleOp::Redeem, &swap, Role::ActiveWatcher, deadline - 1),
            100,
            0,
        );
        assert_split(
            resolve(SettleOp::Redeem, &swap, Role::ActiveWatcher, deadline),
            99,
            1,
        );
        assert_split(
            resolve(SettleOp::Redeem, &swap, Role::ActiveWatcher, REFUND - 1),
            99,
            1,
        );
    }

    #[test]
    fn initiator_redeem_before_expiry_pays_the_participant_in_full() {
        let swap = watcher_swap(true);
        let split = resolve(SettleOp::Redeem, &swap, Role::Initiator, T0 + 1);
        assert_split(split, 100, 0);
    }

    #[test]
    fn initiator_redeem_after_expiry_recovers_the_payoff() {
        let swap = watcher_swap(true);
        let split = resolve(SettleOp::Redeem, &swap, Role::Initiator, REFUND);
        assert_split(split, 99, 1);
    }

    #[test]
    fn redeem_pays_no_watcher_when_the_reward_rides_on_refund() {
        let swap = watcher_swap(false);
        assert_split(
            resolve(SettleOp::Redeem, &swap, Role::AssignedWatcher, T0 + 1),
            100,
            0,
        );
        assert_split(
            resolve(SettleOp::Redeem, &swap, Role::ActiveWatcher, REFUND - 1),
            100,
            0,
        );
    }

    #[test]
    fn refund_pays_the_assigned_watcher_when_selected() {
        let swap = watcher_swap(false);
        let split = resolve(SettleOp::Refund, &swap, Role::AssignedWatcher, REFUND + 1);
        assert_split(split, 99, 1);
    }

    #[test]
    fn refund_widens_to_active_watchers_past_the_refund_deadline() {
        let swap = watcher_swap(false);
        let deadline = T0 + 90 * NANOS_IN_SEC;
        assert_split(
            resolve(SettleOp::Refund, &swap, Role::ActiveWatcher, deadline - 1),
            100,
            0,
        );
        assert_split(
            resolve(SettleOp::Refund, &swap, Role::ActiveWatcher, deadline),
            99,
            1,
        );
    }

    #[test]
    fn refund_pays_no_watcher_when_the_reward_rides_on_redeem() {
        let swap = watcher_swap(true);
        assert_split(
            resolve(SettleOp::Refund, &swap, Role::AssignedWatcher, REFUND + 1),
            100,
            0,
        );
    }

    #[test]
    fn refund_defaults_to_the_full_amount_for_the_initiator() {
        let swap = watcher_swap(false);
        assert_split(
            resolve(SettleOp::Refund, &swap, Role::Initiator, REFUND + 1),
            100,
            0,
        );
        assert_split(resolve(SettleOp::Refund, &swap, Role::Other, REFUND + 1), 100, 0);
    }

    #[test]
    fn countdown_redeem_outside_the_window_pays_the_participant_in_full() {
        let swap = countdown_swap(10);
        let window_start = REFUND - 10 * NANOS_IN_SEC;
        let split = resolve(SettleOp::Redeem, &swap, Role::Other, window_start - 1);
        assert_split(split, 300, 0);
    }

    #[test]
    fn countdown_redeem_inside_the_window_rewards_the_caller() {
        let swap = countdown_swap(10);
        let window_start = REFUND - 10 * NANOS_IN_SEC;
        assert_split(
            resolve(SettleOp::Redeem, &swap, Role::Other, window_start),
            299,
            1,
        );
        assert_split(
            resolve(SettleOp::Redeem, &swap, Role::Other, window_start + NANOS_IN_SEC),
            299,
            1,
        );
    }

    #[test]
    fn countdown_refund_never_pays_a_reward() {
        let swap = countdown_swap(10);
        for role in [Role::Participant, Role::Initiator, Role::Other] {
            assert_split(
                resolve(SettleOp::Refund, &swap, role, REFUND + 1),
                300,
                0,
            );
        }
    }
}
