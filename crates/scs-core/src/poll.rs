//! Bounded polling of asynchronous broker operations
//!
//! Fixed attempt count, fixed delay before each attempt. The delay goes
//! through a [`Sleeper`] so the loop can be driven without wall-clock time.

use crate::config::PollPolicy;
use crate::gateway::PlatformGateway;
use crate::types::{LastOperation, OperationState, ServiceInstance};
use async_trait::async_trait;
use std::time::Duration;

/// Suspends the caller between poll attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Result of polling an instance's last operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Operation reached `succeeded`
    Succeeded(ServiceInstance),
    /// Operation reached `failed`
    Failed(Option<LastOperation>),
    /// Attempts exhausted without a terminal state
    TimedOut {
        /// Last operation seen by a successful status read
        last_operation: Option<LastOperation>,
    },
}

/// Poll `guid` until its last operation is terminal or attempts run out
///
/// A status read that errors counts as an attempt that saw no terminal state.
pub async fn await_last_operation<G>(
    gateway: &G,
    sleeper: &dyn Sleeper,
    guid: &str,
    policy: &PollPolicy,
) -> PollOutcome
where
    G: PlatformGateway + ?Sized,
{
    let mut last_operation = None;

    for attempt in 1..=policy.max_attempts {
        sleeper.sleep(policy.delay).await;

        match gateway.service_instance(guid).await {
            Ok(instance) => match instance.last_operation.as_ref().map(|op| op.state) {
                Some(OperationState::Succeeded) => {
                    tracing::debug!(guid, attempt, "operation succeeded");
                    return PollOutcome::Succeeded(instance);
                }
                Some(OperationState::Failed) => {
                    tracing::debug!(guid, attempt, "operation failed");
                    return PollOutcome::Failed(instance.last_operation);
                }
                _ => {
                    tracing::debug!(guid, attempt, "operation still pending");
                    last_operation = instance.last_operation;
                }
            },
            Err(error) => {
                tracing::warn!(guid, attempt, %error, "could not read service instance status");
            }
        }
    }

    PollOutcome::TimedOut { last_operation }
}
