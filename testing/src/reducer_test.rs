//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use inscriptions_core::{effect::Effect, reducer::Reducer};
use smallvec::SmallVec;

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// use inscriptions_testing::{ReducerTest, assertions};
///
/// ReducerTest::new(IntakeReducer::new())
///     .with_env(test_environment())
///     .given_state(IntakeState::default())
///     .when_action(IntakeAction::UserNotified)
///     .then_state(|state| assert_eq!(state.phase, Phase::Received))
///     .then_effects(assertions::assert_no_effects)
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Set the action to test (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the resulting effects (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    pub fn run(self) {
        let _ = self.execute();
    }

    /// Run the test, execute all assertions, then hand back the resulting
    /// state and effects so the caller can drive the effects (see
    /// [`crate::helpers::collect_actions`]).
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[must_use]
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn execute(self) -> (S, SmallVec<[Effect<A>; 4]>) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let action = self.action.expect("Action must be set with when_action()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        let effects = self.reducer.reduce(&mut state, action, &env);

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }

        (state, effects)
    }
}

/// Helper assertions for effects
pub mod assertions {
    use inscriptions_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(Effect::is_none),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::collect_actions;
    use inscriptions_core::effect::Effect;
    use inscriptions_core::reducer::Reducer;
    use inscriptions_core::{SmallVec, async_effect, smallvec};

    #[derive(Clone, Debug)]
    struct TestState {
        count: i32,
    }

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Increment,
        Echo(i32),
    }

    struct TestReducer;

    struct TestEnv;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                TestAction::Increment => {
                    state.count += 1;
                    let count = state.count;
                    smallvec![async_effect! { Some(TestAction::Echo(count)) }]
                }
                TestAction::Echo(_) => SmallVec::new(),
            }
        }
    }

    #[test]
    fn test_reducer_test_runs_assertions() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Increment)
            .then_state(|state| {
                assert_eq!(state.count, 1);
            })
            .then_effects(|effects| {
                assert_eq!(effects.len(), 1);
                assert!(matches!(effects[0], Effect::Future(_)));
            })
            .run();
    }

    #[test]
    fn test_reducer_test_no_effects() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 5 })
            .when_action(TestAction::Echo(3))
            .then_state(|state| {
                assert_eq!(state.count, 5);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn test_execute_hands_back_effects() {
        let (state, effects) = ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 41 })
            .when_action(TestAction::Increment)
            .execute();

        assert_eq!(state.count, 42);
        assert_eq!(collect_actions(effects).await, vec![TestAction::Echo(42)]);
    }

    #[test]
    fn test_assertions_no_effects() {
        assertions::assert_no_effects::<TestAction>(&[Effect::None]);
        assertions::assert_no_effects::<TestAction>(&[]);
    }
}
