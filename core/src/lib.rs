//! # Inscriptions Core
//!
//! Core traits and types for the registration intake workflow.
//!
//! The workflow is written as a reducer: a pure function that takes the
//! current state and an action, updates the state in place and returns
//! descriptions of the side effects to run next. The runtime crate executes
//! those effects and feeds the actions they produce back into the reducer.
//!
//! ## Core Concepts
//!
//! - **State**: Where one workflow currently stands
//! - **Action**: Every input to a reducer (the request itself and the results of I/O)
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies (store, mailer, clock)
//!
//! ## Example
//!
//! ```ignore
//! use inscriptions_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! impl Reducer for IntakeReducer {
//!     type State = IntakeState;
//!     type Action = IntakeAction;
//!     type Environment = IntakeEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut IntakeState,
//!         action: IntakeAction,
//!         env: &IntakeEnvironment,
//!     ) -> SmallVec<[Effect<IntakeAction>; 4]> {
//!         smallvec![Effect::None]
//!     }
//! }
//! ```

pub use smallvec::{SmallVec, smallvec};

mod effect_macros;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They contain all sequencing decisions and are deterministic and testable
/// without any I/O.
pub mod reducer {
    use super::SmallVec;
    use super::effect::Effect;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action against the current state
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        ///
        /// Most actions produce zero or one effect, hence the inline capacity.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects are values returned by reducers. Nothing runs until the runtime
/// picks them up.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Returns `true` for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }

        /// Run the effect to completion and return the action it produces.
        ///
        /// The runtime spawns effects instead; this is for callers that drive
        /// a reducer by hand (tests, one-shot tools).
        pub async fn run(self) -> Option<Action> {
            match self {
                Effect::None => None,
                Effect::Future(fut) => fut.await,
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
