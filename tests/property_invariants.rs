//! Property tests for the universally-quantified invariants: lock-count
//! non-negativity and the idle-timeout clamp. Exercises the same pure
//! helpers `lifecycle::handle_request` calls internally, rather than
//! driving the full threaded FSM — deterministic, no timing dependence.

use power_supervisor::lifecycle::{apply_lock_delta, clamp_idle_timeout};
use power_supervisor::model::RequestKind;
use proptest::prelude::*;

#[derive(Debug, Clone, Copy)]
enum LockOp {
    Acquire,
    Release,
}

fn lock_op_strategy() -> impl Strategy<Value = LockOp> {
    prop_oneof![Just(LockOp::Acquire), Just(LockOp::Release)]
}

proptest! {
    /// For any sequence of lock operations, the running count never goes
    /// negative and always equals `#acquires - min(#acquires, #releases)`.
    #[test]
    fn lock_count_never_negative_and_matches_closed_form(ops in proptest::collection::vec(lock_op_strategy(), 0..200)) {
        let mut count = 0u32;
        let mut acquires = 0u32;
        let mut releases = 0u32;

        for op in &ops {
            let kind = match op {
                LockOp::Acquire => { acquires += 1; RequestKind::ActiveLock }
                LockOp::Release => { releases += 1; RequestKind::ActiveUnlock }
            };
            count = apply_lock_delta(count, kind);
            prop_assert!(count <= acquires);
        }

        let expected = acquires.saturating_sub(acquires.min(releases));
        prop_assert_eq!(count, expected);
    }

    /// `idle_set_timeout(v)` followed by a read always yields
    /// `max(v, IDLE_TIMEOUT_MIN_MS)`, never less than the floor and never
    /// altering a value that already clears it.
    #[test]
    fn idle_timeout_clamp_never_goes_below_minimum(
        requested in 0u32..120_000,
        min in 1u32..120_000,
    ) {
        let effective = clamp_idle_timeout(requested, min);
        prop_assert!(effective >= min);
        if requested >= min {
            prop_assert_eq!(effective, requested);
        } else {
            prop_assert_eq!(effective, min);
        }
    }

    /// Clamping is idempotent: reapplying it to its own output is a no-op.
    #[test]
    fn idle_timeout_clamp_is_idempotent(requested in 0u32..120_000, min in 1u32..120_000) {
        let once = clamp_idle_timeout(requested, min);
        let twice = clamp_idle_timeout(once, min);
        prop_assert_eq!(once, twice);
    }
}
