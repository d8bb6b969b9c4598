//! Config Server migration orchestrator
//!
//! Moves one SCS 2.x Config Server instance onto a replacement created with
//! rewritten parameters:
//! 1. Rename the old instance to `<name>-old` and wait for the rename
//! 2. Create the replacement under the original name
//! 3. For each binding: bind the app to the replacement, unbind it from the
//!    old instance, request a restage
//! 4. Optionally delete the old instance
//!
//! Steps run strictly in order and the first failure stops the sequence.
//! Nothing is rolled back; the returned [`MigrationFailure`] records how far
//! the migration got so the remains can be reconciled by hand.

use crate::config::MigrationPolicy;
use crate::error::MigrationError;
use crate::gateway::PlatformGateway;
use crate::payload::ConfigPayload;
use crate::poll::{await_last_operation, PollOutcome, Sleeper, TokioSleeper};
use crate::state_machine::{validate_transition, MigrationState, MigrationStep};
use crate::types::{Binding, LastOperation, NewServiceInstance, ServiceInstance, ServiceSummary};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// What happened to one binding of the old instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingMigration {
    pub app_guid: String,
    pub old_binding_guid: String,
    /// Set once the app is bound to the replacement
    pub new_binding_guid: Option<String>,
    pub old_binding_deleted: bool,
    pub restage_requested: bool,
}

impl BindingMigration {
    fn start(binding: &Binding) -> Self {
        Self {
            app_guid: binding.app_guid.clone(),
            old_binding_guid: binding.guid.clone(),
            new_binding_guid: None,
            old_binding_deleted: false,
            restage_requested: false,
        }
    }

    /// Bound to the replacement, unbound from the old instance and restaged
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.new_binding_guid.is_some() && self.old_binding_deleted && self.restage_requested
    }
}

/// Record of a migration's side effects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationProgress {
    /// Current state
    pub state: MigrationState,
    /// Every state entered, in order, starting with `Started`
    pub history: Vec<MigrationState>,
    /// Name the old instance was asked to take, once the rename request is accepted
    pub rename_requested: Option<String>,
    /// Name the old instance now carries, once the rename is confirmed
    pub renamed_to: Option<String>,
    /// Replacement instance, once created
    pub new_instance: Option<ServiceInstance>,
    /// Bindings that were touched, including a partially moved one
    pub bindings: Vec<BindingMigration>,
    /// Bindings never touched, still on the old instance
    pub untouched_bindings: Vec<Binding>,
    /// Whether the old instance was deleted
    pub old_instance_deleted: bool,
}

impl MigrationProgress {
    fn new(bindings: &[Binding]) -> Self {
        Self {
            state: MigrationState::Started,
            history: vec![MigrationState::Started],
            rename_requested: None,
            renamed_to: None,
            new_instance: None,
            bindings: Vec::new(),
            untouched_bindings: bindings.to_vec(),
            old_instance_deleted: false,
        }
    }

    fn advance(&mut self, next: MigrationState) {
        debug_assert!(
            validate_transition(self.state, next).is_ok(),
            "illegal migration transition {:?} -> {next:?}",
            self.state
        );
        tracing::debug!(from = ?self.state, to = ?next, "migration state");
        self.state = next;
        self.history.push(next);
    }

    /// Bindings fully moved to the replacement
    pub fn migrated_bindings(&self) -> impl Iterator<Item = &BindingMigration> {
        self.bindings.iter().filter(|b| b.is_complete())
    }

    /// A binding left half-moved by the failure, if any
    #[must_use]
    pub fn partial_binding(&self) -> Option<&BindingMigration> {
        self.bindings.iter().find(|b| !b.is_complete())
    }
}

/// A migration that stopped before completing
#[derive(Debug, thiserror::Error)]
#[error("migration of service {service} failed at {step}: {cause}")]
pub struct MigrationFailure {
    pub service: String,
    pub step: MigrationStep,
    #[source]
    pub cause: MigrationError,
    pub progress: MigrationProgress,
}

struct StepError {
    step: MigrationStep,
    cause: MigrationError,
}

impl StepError {
    fn new(step: MigrationStep, cause: MigrationError) -> Self {
        Self { step, cause }
    }
}

/// Sequences the side effects of a Config Server migration
pub struct MigrationOrchestrator {
    gateway: Arc<dyn PlatformGateway>,
    sleeper: Arc<dyn Sleeper>,
    policy: MigrationPolicy,
}

impl MigrationOrchestrator {
    /// Create an orchestrator sleeping on the tokio timer
    #[must_use]
    pub fn new(gateway: Arc<dyn PlatformGateway>, policy: MigrationPolicy) -> Self {
        Self {
            gateway,
            sleeper: Arc::new(TokioSleeper),
            policy,
        }
    }

    /// Replace the sleeper used between rename polls
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Get policy
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &MigrationPolicy {
        &self.policy
    }

    /// Migrate `service` in `space_guid` onto a new instance with `parameters`
    ///
    /// `bindings` are the old instance's bindings; each is moved in order.
    /// `cancel` is checked before every step and before every binding.
    ///
    /// # Errors
    /// [`MigrationFailure`] naming the failed step, its cause, and the
    /// progress made before it.
    pub async fn migrate(
        &self,
        service: &ServiceSummary,
        space_guid: &str,
        parameters: ConfigPayload,
        bindings: &[Binding],
        cancel: &CancellationToken,
    ) -> Result<ServiceInstance, MigrationFailure> {
        tracing::info!(
            service = %service.name,
            guid = %service.guid,
            bindings = bindings.len(),
            "migrating service instance"
        );

        let mut progress = MigrationProgress::new(bindings);
        match self
            .run(service, space_guid, parameters, bindings, cancel, &mut progress)
            .await
        {
            Ok(instance) => {
                tracing::info!(service = %service.name, new_guid = %instance.guid, "migration completed");
                Ok(instance)
            }
            Err(StepError { step, cause }) => {
                tracing::error!(service = %service.name, %step, error = %cause, "migration failed");
                progress.advance(MigrationState::Failed { step });
                Err(MigrationFailure {
                    service: service.name.clone(),
                    step,
                    cause,
                    progress,
                })
            }
        }
    }

    async fn run(
        &self,
        service: &ServiceSummary,
        space_guid: &str,
        parameters: ConfigPayload,
        bindings: &[Binding],
        cancel: &CancellationToken,
        progress: &mut MigrationProgress,
    ) -> Result<ServiceInstance, StepError> {
        let old_name = self.policy.old_name(&service.name);
        self.rename(service, &old_name, cancel, progress).await?;
        progress.renamed_to = Some(old_name);
        progress.advance(MigrationState::Renamed);

        checkpoint(cancel, MigrationStep::Create)?;
        let request = NewServiceInstance {
            name: service.name.clone(),
            service_plan_guid: service.service_plan.guid.clone(),
            space_guid: space_guid.to_owned(),
            parameters,
        };
        let instance = self
            .gateway
            .create_service_instance(&request)
            .await
            .map_err(|source| {
                StepError::new(
                    MigrationStep::Create,
                    MigrationError::Create {
                        service: service.name.clone(),
                        source,
                    },
                )
            })?;
        tracing::info!(name = %instance.name, guid = %instance.guid, "created replacement instance");
        progress.new_instance = Some(instance.clone());
        progress.advance(MigrationState::Recreated);

        let total = bindings.len();
        progress.advance(MigrationState::Rebound { migrated: 0, total });
        for (index, binding) in bindings.iter().enumerate() {
            checkpoint(cancel, MigrationStep::Bind)?;
            progress.untouched_bindings.retain(|b| b.guid != binding.guid);
            progress.bindings.push(BindingMigration::start(binding));
            self.rebind(binding, &instance, progress).await?;
            progress.advance(MigrationState::Rebound {
                migrated: index + 1,
                total,
            });
        }
        // restages were only requested; nothing here waits for them
        progress.advance(MigrationState::RestagePending);

        if self.policy.delete_old_instance {
            checkpoint(cancel, MigrationStep::DeleteOld)?;
            self.gateway
                .delete_service_instance(&service.guid, false, true)
                .await
                .map_err(|source| {
                    StepError::new(
                        MigrationStep::DeleteOld,
                        MigrationError::DeleteOld {
                            service: service.name.clone(),
                            guid: service.guid.clone(),
                            source,
                        },
                    )
                })?;
            tracing::info!(guid = %service.guid, "deleted old service instance");
            progress.old_instance_deleted = true;
        }

        progress.advance(MigrationState::Completed);
        Ok(instance)
    }

    async fn rename(
        &self,
        service: &ServiceSummary,
        old_name: &str,
        cancel: &CancellationToken,
        progress: &mut MigrationProgress,
    ) -> Result<(), StepError> {
        checkpoint(cancel, MigrationStep::Rename)?;
        self.gateway
            .rename_service_instance(&service.guid, old_name)
            .await
            .map_err(|source| {
                StepError::new(
                    MigrationStep::Rename,
                    MigrationError::Rename {
                        service: service.name.clone(),
                        source,
                    },
                )
            })?;
        tracing::info!(guid = %service.guid, new_name = old_name, "rename requested");
        progress.rename_requested = Some(old_name.to_owned());

        checkpoint(cancel, MigrationStep::AwaitRename)?;
        let outcome = await_last_operation(
            self.gateway.as_ref(),
            self.sleeper.as_ref(),
            &service.guid,
            &self.policy.rename_poll,
        )
        .await;

        match outcome {
            PollOutcome::Succeeded(_) => Ok(()),
            PollOutcome::Failed(last_operation) => Err(StepError::new(
                MigrationStep::AwaitRename,
                MigrationError::RenameFailed {
                    guid: service.guid.clone(),
                    last_operation: describe(last_operation.as_ref()),
                },
            )),
            PollOutcome::TimedOut { last_operation } => Err(StepError::new(
                MigrationStep::AwaitRename,
                MigrationError::RenameTimeout {
                    guid: service.guid.clone(),
                    last_operation: describe(last_operation.as_ref()),
                },
            )),
        }
    }

    async fn rebind(
        &self,
        binding: &Binding,
        instance: &ServiceInstance,
        progress: &mut MigrationProgress,
    ) -> Result<(), StepError> {
        let new_binding = self
            .gateway
            .create_service_binding(&binding.app_guid, &instance.guid)
            .await
            .map_err(|source| {
                StepError::new(
                    MigrationStep::Bind,
                    MigrationError::Bind {
                        app_guid: binding.app_guid.clone(),
                        service: instance.name.clone(),
                        source,
                    },
                )
            })?;
        record(progress, |b| b.new_binding_guid = Some(new_binding.guid.clone()));

        self.gateway
            .delete_service_binding(&binding.guid)
            .await
            .map_err(|source| {
                StepError::new(
                    MigrationStep::Unbind,
                    MigrationError::Unbind {
                        binding_guid: binding.guid.clone(),
                        source,
                    },
                )
            })?;
        record(progress, |b| b.old_binding_deleted = true);

        let app = self
            .gateway
            .restage_app(&binding.app_guid)
            .await
            .map_err(|source| {
                StepError::new(
                    MigrationStep::Restage,
                    MigrationError::Restage {
                        app_guid: binding.app_guid.clone(),
                        source,
                    },
                )
            })?;
        record(progress, |b| b.restage_requested = true);
        tracing::info!(app = %app.name, guid = %app.guid, state = ?app.state, "restage requested");

        Ok(())
    }
}

impl std::fmt::Debug for MigrationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationOrchestrator")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn checkpoint(cancel: &CancellationToken, step: MigrationStep) -> Result<(), StepError> {
    if cancel.is_cancelled() {
        return Err(StepError::new(step, MigrationError::Cancelled { step }));
    }
    Ok(())
}

fn record(progress: &mut MigrationProgress, update: impl FnOnce(&mut BindingMigration)) {
    if let Some(current) = progress.bindings.last_mut() {
        update(current);
    }
}

fn describe(last_operation: Option<&LastOperation>) -> String {
    last_operation.map_or_else(|| "none".to_string(), ToString::to_string)
}
