//! Ordered provisioning workflow.
//!
//! `wait_until_ready` is the only retried step. Every later step is best-effort:
//! failures become [`StepOutcome::Warning`] entries in the [`RunReport`] and the
//! run moves on, except where a later step needs an identifier the failed step
//! would have produced. Every create is preceded by a lookup, so re-running the
//! whole workflow against an already provisioned realm changes nothing.

use crate::api::{AdminApi, AdminSession, MappingStatus};
use crate::model::{ClientRepresentation, RoleRepresentation, UserRepresentation};
use crate::report::{RunReport, Step, StepOutcome};
use crate::retry::retry;
use crate::{ProvisionConfig, ProvisionError, ProvisionResult};

/// Drives the provisioning steps against one realm.
pub struct Provisioner {
    api: AdminApi,
    config: ProvisionConfig,
}

impl Provisioner {
    /// Creates a provisioner after validating the configuration.
    pub fn new(config: ProvisionConfig) -> ProvisionResult<Self> {
        config.validate()?;
        let api = AdminApi::new(&config)?;
        Ok(Self { api, config })
    }

    /// Gets the configuration.
    pub fn config(&self) -> &ProvisionConfig {
        &self.config
    }

    /// Exchanges the configured admin credentials for a session. Single attempt.
    pub async fn acquire_session(&self) -> ProvisionResult<AdminSession> {
        self.api
            .acquire_session(
                &self.config.admin_realm,
                &self.config.admin_client_id,
                &self.config.admin_user,
                &self.config.admin_password,
            )
            .await
    }

    /// Polls the token endpoint until a session is granted.
    ///
    /// Exhausting the retry budget yields [`ProvisionError::TimedOut`].
    pub async fn wait_until_ready(&self) -> ProvisionResult<AdminSession> {
        tracing::info!(
            server = self.api.base_url(),
            max_attempts = self.config.retry.max_attempts,
            interval_secs = self.config.retry.interval_secs,
            "waiting for Keycloak"
        );

        match retry(&self.config.retry, |_| self.acquire_session()).await {
            Ok(session) => {
                tracing::info!("Keycloak is ready");
                Ok(session)
            }
            Err(exhausted) => {
                tracing::error!(
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "timed out waiting for Keycloak"
                );
                Err(ProvisionError::TimedOut {
                    attempts: exhausted.attempts,
                })
            }
        }
    }

    /// Creates the client, or replaces it in place when one with the same
    /// `clientId` already exists.
    pub async fn upsert_client(
        &self,
        session: &AdminSession,
        definition: &ClientRepresentation,
    ) -> StepOutcome {
        let client_id = definition.client_id.as_str();

        let existing = match self.api.find_client(session, client_id).await {
            Ok(existing) => existing,
            Err(e) => return warn(Step::Client, client_id, "lookup failed", &e),
        };

        match existing.and_then(|c| c.id) {
            Some(internal_id) => {
                tracing::info!(client_id, %internal_id, "client exists, updating");
                match self.api.update_client(session, &internal_id, definition).await {
                    Ok(()) => StepOutcome::Updated,
                    Err(e) => warn(Step::Client, client_id, "update failed", &e),
                }
            }
            None => {
                tracing::info!(client_id, "creating client");
                match self.api.create_client(session, definition).await {
                    Ok(()) => StepOutcome::Created,
                    Err(e) => warn(Step::Client, client_id, "create failed", &e),
                }
            }
        }
    }

    /// Resolves the client's internal identifier.
    ///
    /// Roles and mappings hang off this identifier, so a miss is fatal.
    pub async fn resolve_client_uuid(
        &self,
        session: &AdminSession,
        client_id: &str,
    ) -> ProvisionResult<String> {
        self.api
            .find_client(session, client_id)
            .await?
            .and_then(|c| c.id)
            .ok_or_else(|| {
                ProvisionError::MissingDependency(format!(
                    "failed to get internal id of client '{client_id}'"
                ))
            })
    }

    /// Creates a client role unless one with the same name exists.
    pub async fn upsert_role(
        &self,
        session: &AdminSession,
        client_uuid: &str,
        role: &RoleRepresentation,
    ) -> StepOutcome {
        let name = role.name.as_str();

        match self.api.get_client_role(session, client_uuid, name).await {
            Ok(Some(_)) => {
                tracing::info!(role = name, "client role exists");
                return StepOutcome::Unchanged;
            }
            Ok(None) => {}
            Err(e) => return warn(Step::Role, name, "lookup failed", &e),
        }

        tracing::info!(role = name, "creating client role");
        match self.api.create_client_role(session, client_uuid, role).await {
            Ok(()) => StepOutcome::Created,
            Err(e) => warn(Step::Role, name, "create failed", &e),
        }
    }

    /// Creates the user unless one with the same username exists.
    ///
    /// Returns the outcome and, when resolvable, the user's internal identifier.
    /// The create response carries no identifier, so a fresh user is looked up
    /// again by username.
    pub async fn upsert_user(
        &self,
        session: &AdminSession,
        definition: &UserRepresentation,
    ) -> (StepOutcome, Option<String>) {
        let username = definition.username.as_str();

        match self.api.find_user(session, username).await {
            Ok(Some(existing)) => {
                tracing::info!(username, "user exists");
                return match existing.id {
                    Some(id) => (StepOutcome::Unchanged, Some(id)),
                    None => (
                        StepOutcome::Warning("existing user has no id".to_string()),
                        None,
                    ),
                };
            }
            Ok(None) => {}
            Err(e) => return (warn(Step::User, username, "lookup failed", &e), None),
        }

        tracing::info!(username, "creating user");
        if let Err(e) = self.api.create_user(session, definition).await {
            return (warn(Step::User, username, "create failed", &e), None);
        }

        match self.api.find_user(session, username).await {
            Ok(Some(UserRepresentation { id: Some(id), .. })) => (StepOutcome::Created, Some(id)),
            Ok(_) => {
                tracing::warn!(username, "created user could not be found");
                (
                    StepOutcome::Warning("failed to get created user id".to_string()),
                    None,
                )
            }
            Err(e) => (
                warn(Step::User, username, "lookup after create failed", &e),
                None,
            ),
        }
    }

    /// Assigns a client role to a user. An existing mapping counts as success.
    pub async fn assign_client_role(
        &self,
        session: &AdminSession,
        user_id: &str,
        client_uuid: &str,
        role_name: &str,
    ) -> StepOutcome {
        let role = match self.api.get_client_role(session, client_uuid, role_name).await {
            Ok(Some(role)) => role,
            Ok(None) => {
                tracing::warn!(role = role_name, "client role not found");
                return StepOutcome::Warning(format!("client role '{role_name}' not found"));
            }
            Err(e) => return warn(Step::RoleMapping, role_name, "role lookup failed", &e),
        };

        match self
            .api
            .add_client_role_mappings(session, user_id, client_uuid, std::slice::from_ref(&role))
            .await
        {
            Ok(MappingStatus::Assigned) => {
                tracing::info!(role = role_name, user_id, "assigned client role");
                StepOutcome::Created
            }
            Ok(MappingStatus::AlreadyAssigned) => {
                tracing::info!(role = role_name, user_id, "client role already assigned");
                StepOutcome::Unchanged
            }
            Err(e) => warn(Step::RoleMapping, role_name, "assignment failed", &e),
        }
    }

    /// Runs the full workflow: readiness, client, roles, user, role mapping.
    ///
    /// Returns `Err` only for readiness timeout or an unresolvable client id.
    pub async fn run(&self) -> ProvisionResult<RunReport> {
        let session = self.wait_until_ready().await?;
        let mut report = RunReport::new();
        let client = &self.config.client;

        let outcome = self.upsert_client(&session, client).await;
        report.record(Step::Client, &client.client_id, outcome);

        if self.config.roles.is_empty() && self.config.user.is_none() {
            return Ok(report);
        }

        let client_uuid = self.resolve_client_uuid(&session, &client.client_id).await?;

        for role in &self.config.roles {
            let outcome = self.upsert_role(&session, &client_uuid, role).await;
            report.record(Step::Role, &role.name, outcome);
        }

        if let Some(assignment) = &self.config.user {
            let username = assignment.user.username.as_str();
            let (outcome, user_id) = self.upsert_user(&session, &assignment.user).await;
            report.record(Step::User, username, outcome);

            let outcome = match user_id {
                Some(user_id) => {
                    self.assign_client_role(
                        &session,
                        &user_id,
                        &client_uuid,
                        &assignment.client_role,
                    )
                    .await
                }
                None => StepOutcome::Skipped(format!("user '{username}' has no resolvable id")),
            };
            report.record(Step::RoleMapping, &assignment.client_role, outcome);
        }

        Ok(report)
    }
}

/// Logs a failed step and turns it into a warning outcome.
fn warn(step: Step, target: &str, action: &str, error: &ProvisionError) -> StepOutcome {
    tracing::warn!(%step, resource = target, error = %error, "{action}");
    StepOutcome::Warning(format!("{action}: {error}"))
}
