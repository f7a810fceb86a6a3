//! Declarative macros for ergonomic effect construction

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use inscriptions_core::async_effect;
///
/// async_effect! {
///     match mailer.send(&message).await {
///         Ok(()) => Some(IntakeAction::UserNotified),
///         Err(error) => Some(IntakeAction::Rejected { rejection: error.into() }),
///     }
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

#[cfg(test)]
mod tests {
    use crate::effect::Effect;

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        AsyncResult { value: i32 },
    }

    #[tokio::test]
    async fn test_async_effect_macro() {
        let value = 21;
        let effect: Effect<TestAction> = async_effect! {
            Some(TestAction::AsyncResult { value: value * 2 })
        };

        assert!(matches!(effect, Effect::Future(_)));
        assert_eq!(
            effect.run().await,
            Some(TestAction::AsyncResult { value: 42 })
        );
    }
}
