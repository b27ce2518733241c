//! Property-based tests for the settlement state machine.

use premia_shared::types::ActorId;
use proptest::prelude::*;
use uuid::Uuid;

use super::error::SettlementError;
use super::types::SettlementStatus;
use super::workflow::SettlementWorkflow;

/// Strategy for generating random SettlementStatus values.
fn arb_status() -> impl Strategy<Value = SettlementStatus> {
    prop_oneof![
        Just(SettlementStatus::Pending),
        Just(SettlementStatus::Approved),
        Just(SettlementStatus::Processing),
        Just(SettlementStatus::Completed),
        Just(SettlementStatus::Failed),
        Just(SettlementStatus::Cancelled),
    ]
}

/// Strategy for generating random actor ids.
fn arb_actor() -> impl Strategy<Value = ActorId> {
    any::<u128>().prop_map(|v| ActorId::from_uuid(Uuid::from_u128(v)))
}

/// Strategy for generating non-blank references and reasons.
fn arb_text() -> impl Strategy<Value = String> {
    "[A-Z0-9]{1,20}"
}

/// The five transition attempts, each tagged with its target status.
fn attempt(
    action: u8,
    from: SettlementStatus,
    actor: ActorId,
    text: String,
) -> (SettlementStatus, Result<SettlementStatus, SettlementError>) {
    let (to, result) = match action % 5 {
        0 => (
            SettlementStatus::Approved,
            SettlementWorkflow::approve(from, actor),
        ),
        1 => (
            SettlementStatus::Processing,
            SettlementWorkflow::process(from, text),
        ),
        2 => (
            SettlementStatus::Completed,
            SettlementWorkflow::complete(from, text),
        ),
        3 => (SettlementStatus::Failed, SettlementWorkflow::fail(from, text)),
        _ => (
            SettlementStatus::Cancelled,
            SettlementWorkflow::cancel(from, text),
        ),
    };
    (to, result.map(|a| a.new_status()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A transition succeeds exactly when the edge exists in the machine,
    /// and a success always lands on the requested status.
    #[test]
    fn prop_transition_legality(
        from in arb_status(),
        action in any::<u8>(),
        actor in arb_actor(),
        text in arb_text(),
    ) {
        let (to, result) = attempt(action, from, actor, text);
        if SettlementWorkflow::is_valid_transition(from, to) {
            prop_assert_eq!(result.ok(), Some(to));
        } else {
            let rejected = matches!(
                result,
                Err(SettlementError::InvalidTransition { from: f, to: t }) if f == from && t == to
            );
            prop_assert!(rejected);
        }
    }

    /// Terminal states accept no transition at all.
    #[test]
    fn prop_terminal_states_are_final(
        from in arb_status().prop_filter("terminal", |s| s.is_terminal()),
        action in any::<u8>(),
        actor in arb_actor(),
        text in arb_text(),
    ) {
        let (_, result) = attempt(action, from, actor, text);
        prop_assert!(result.is_err());
    }
}
