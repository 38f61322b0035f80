use payflow::domain::action::{Action, ActorRole};
use payflow::domain::engine::{Pipeline, TransitionEngine};
use payflow::domain::item::{Amount, Item, ItemState};
use payflow::error::LedgerError;
use proptest::prelude::*;
use rust_decimal_macros::dec;

fn any_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        Just(Action::CreateTransaction),
        Just(Action::Move),
        Just(Action::Error),
        Just(Action::Fix),
        Just(Action::Refund),
    ]
}

fn any_role() -> impl Strategy<Value = ActorRole> {
    prop_oneof![Just(ActorRole::Operator), Just(ActorRole::Admin)]
}

fn fresh() -> Item {
    Item::new(Amount::new(dec!(10.00)).unwrap())
}

fn apply_all(engine: &TransitionEngine, mut item: Item, actions: &[Action]) -> Item {
    for action in actions {
        item = engine.apply(&item, *action, ActorRole::Admin).unwrap().next;
    }
    item
}

/// Checks the record-level invariants every reachable item must satisfy.
fn assert_consistent(item: &Item, pipeline: Pipeline) {
    assert!(item.current_stage <= pipeline.terminal_stage());
    assert_eq!(item.error_stage.is_some(), item.state == ItemState::Error);
    if let Some(stage) = item.error_stage {
        assert_eq!(stage, item.current_stage);
    }
    match item.state {
        ItemState::Created | ItemState::Transacting => assert_eq!(item.current_stage, 0),
        ItemState::InProgress => {
            assert!(item.current_stage > 0 && item.current_stage < pipeline.terminal_stage())
        }
        ItemState::Completed => assert_eq!(item.current_stage, pipeline.terminal_stage()),
        _ => {}
    }
}

proptest! {
    #[test]
    fn prop_random_actions_stay_on_the_graph(
        stages in 2u32..8,
        steps in prop::collection::vec((any_action(), any_role()), 0..40),
    ) {
        let pipeline = Pipeline::new(stages).unwrap();
        let engine = TransitionEngine::new(pipeline);
        let mut item = fresh();

        for (action, role) in steps {
            match engine.apply(&item, action, role) {
                Ok(transition) => {
                    prop_assert_eq!(transition.next.version, item.version + 1);
                    prop_assert_eq!(transition.next.id, item.id);
                    prop_assert_eq!(transition.next.amount, item.amount);
                    item = transition.next;
                }
                Err(LedgerError::Unauthorized { .. }) => {
                    prop_assert!(action.requires_admin() && !role.is_admin());
                }
                Err(LedgerError::PipelineExhausted { state }) => {
                    prop_assert!(state.is_terminal());
                    prop_assert_eq!(action, Action::Move);
                }
                Err(LedgerError::IllegalTransition { state, action: refused }) => {
                    prop_assert_eq!(state, item.state);
                    prop_assert_eq!(refused, action);
                }
                Err(other) => prop_assert!(false, "unexpected error {other}"),
            }
            assert_consistent(&item, pipeline);
        }
    }

    #[test]
    fn prop_fix_is_retry_neutral(
        stages in 2u32..10,
        fail_at in 0u32..9,
    ) {
        let pipeline = Pipeline::new(stages).unwrap();
        prop_assume!(fail_at < pipeline.terminal_stage());
        let engine = TransitionEngine::new(pipeline);

        let mut setup = vec![Action::CreateTransaction];
        setup.extend(std::iter::repeat_n(Action::Move, fail_at as usize));
        let before_error = apply_all(&engine, fresh(), &setup);
        let fixed = apply_all(&engine, before_error.clone(), &[Action::Error, Action::Fix]);

        prop_assert_eq!(fixed.current_stage, before_error.current_stage);
        prop_assert_eq!(fixed.state, before_error.state);

        let remaining = (pipeline.terminal_stage() - fail_at) as usize;
        let moves = vec![Action::Move; remaining];
        let with_error = apply_all(&engine, fixed, &moves);
        let without_error = apply_all(&engine, before_error, &moves);
        prop_assert_eq!(with_error.state, ItemState::Completed);
        prop_assert_eq!(without_error.state, ItemState::Completed);

        // One move short stays in progress either way.
        if remaining > 1 {
            let short = apply_all(&engine, apply_all(&engine, fresh(), &setup), &moves[1..]);
            prop_assert_ne!(short.state, ItemState::Completed);
        }
    }

    #[test]
    fn prop_refund_finishes_in_one_move(
        stages in 2u32..10,
        fail_at in 0u32..9,
    ) {
        let pipeline = Pipeline::new(stages).unwrap();
        prop_assume!(fail_at < pipeline.terminal_stage());
        let engine = TransitionEngine::new(pipeline);

        let mut actions = vec![Action::CreateTransaction];
        actions.extend(std::iter::repeat_n(Action::Move, fail_at as usize));
        actions.extend([Action::Error, Action::Refund, Action::Move]);

        let refunded = apply_all(&engine, fresh(), &actions);
        prop_assert_eq!(refunded.state, ItemState::Refunded);
        prop_assert!(matches!(
            engine.apply(&refunded, Action::Move, ActorRole::Admin),
            Err(LedgerError::PipelineExhausted { .. })
        ), "expected PipelineExhausted");
    }
}
