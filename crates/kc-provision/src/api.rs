//! Admin REST client.
//!
//! One method per admin endpoint the provisioner touches. Lookups return
//! `Ok(None)` for an absent resource; any status outside a method's expected set
//! is surfaced as [`ProvisionError::UnexpectedStatus`] with the raw body.

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::model::{ClientRepresentation, RoleRepresentation, TokenResponse, UserRepresentation};
use crate::{ProvisionConfig, ProvisionError, ProvisionResult};

/// Bearer credential for the admin API. Obtained once per run, never refreshed.
#[derive(Clone)]
pub struct AdminSession {
    access_token: String,
}

impl AdminSession {
    /// Wraps an access token.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }
}

impl std::fmt::Debug for AdminSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSession")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Result of posting a role mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingStatus {
    /// The mapping was added.
    Assigned,
    /// The server reported the mapping already exists.
    AlreadyAssigned,
}

/// Keycloak admin API client scoped to one realm.
pub struct AdminApi {
    client: reqwest::Client,
    base_url: String,
    realm: String,
}

impl AdminApi {
    /// Creates a new admin API client.
    pub fn new(config: &ProvisionConfig) -> ProvisionResult<Self> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            base_url: config.server_url().to_string(),
            realm: config.realm.clone(),
        })
    }

    /// Gets the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchanges admin credentials for a bearer token via the password grant.
    ///
    /// Any failure, whether transport or rejection, is `AuthUnavailable`. No retry.
    pub async fn acquire_session(
        &self,
        admin_realm: &str,
        client_id: &str,
        username: &str,
        password: &str,
    ) -> ProvisionResult<AdminSession> {
        let url = format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.base_url,
            urlencoding::encode(admin_realm)
        );
        let form = [
            ("client_id", client_id),
            ("username", username),
            ("password", password),
            ("grant_type", "password"),
        ];

        let response = self
            .client
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ProvisionError::AuthUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProvisionError::AuthUnavailable(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProvisionError::AuthUnavailable(format!("invalid token response: {e}")))?;
        tracing::debug!(expires_in = ?token.expires_in, "admin session acquired");
        Ok(AdminSession::new(token.access_token))
    }

    /// Finds a client by its `clientId`.
    pub async fn find_client(
        &self,
        session: &AdminSession,
        client_id: &str,
    ) -> ProvisionResult<Option<ClientRepresentation>> {
        let path = format!("/clients?clientId={}", urlencoding::encode(client_id));
        let clients: Vec<ClientRepresentation> = self.get_json(session, &path).await?;
        Ok(clients.into_iter().find(|c| c.client_id == client_id))
    }

    /// Creates a client. Expects `201 Created`.
    pub async fn create_client(
        &self,
        session: &AdminSession,
        client: &ClientRepresentation,
    ) -> ProvisionResult<()> {
        let response = self.send_json(session, reqwest::Method::POST, "/clients", client).await?;
        expect_status(response, StatusCode::CREATED).await
    }

    /// Replaces a client by internal ID. Expects `204 No Content`.
    pub async fn update_client(
        &self,
        session: &AdminSession,
        internal_id: &str,
        client: &ClientRepresentation,
    ) -> ProvisionResult<()> {
        let path = format!("/clients/{}", urlencoding::encode(internal_id));
        let response = self.send_json(session, reqwest::Method::PUT, &path, client).await?;
        expect_status(response, StatusCode::NO_CONTENT).await
    }

    /// Gets a client role by name. Any non-200 answer counts as absent.
    pub async fn get_client_role(
        &self,
        session: &AdminSession,
        client_uuid: &str,
        role_name: &str,
    ) -> ProvisionResult<Option<RoleRepresentation>> {
        let path = format!(
            "/clients/{}/roles/{}",
            urlencoding::encode(client_uuid),
            urlencoding::encode(role_name)
        );
        let response = self
            .client
            .get(self.admin_url(&path))
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        if response.status() == StatusCode::OK {
            Ok(Some(response.json().await?))
        } else {
            tracing::debug!(
                status = %response.status(),
                role = role_name,
                "client role lookup miss"
            );
            Ok(None)
        }
    }

    /// Creates a client role. Expects `201 Created`.
    pub async fn create_client_role(
        &self,
        session: &AdminSession,
        client_uuid: &str,
        role: &RoleRepresentation,
    ) -> ProvisionResult<()> {
        let path = format!("/clients/{}/roles", urlencoding::encode(client_uuid));
        let response = self.send_json(session, reqwest::Method::POST, &path, role).await?;
        expect_status(response, StatusCode::CREATED).await
    }

    /// Finds a user by exact username.
    pub async fn find_user(
        &self,
        session: &AdminSession,
        username: &str,
    ) -> ProvisionResult<Option<UserRepresentation>> {
        let path = format!("/users?username={}&exact=true", urlencoding::encode(username));
        let users: Vec<UserRepresentation> = self.get_json(session, &path).await?;
        Ok(users
            .into_iter()
            .find(|u| u.username.eq_ignore_ascii_case(username)))
    }

    /// Creates a user. Expects `201 Created`; the response carries no body.
    pub async fn create_user(
        &self,
        session: &AdminSession,
        user: &UserRepresentation,
    ) -> ProvisionResult<()> {
        let response = self.send_json(session, reqwest::Method::POST, "/users", user).await?;
        expect_status(response, StatusCode::CREATED).await
    }

    /// Adds client-role mappings to a user.
    ///
    /// Any 2xx means assigned, `409 Conflict` means already assigned.
    pub async fn add_client_role_mappings(
        &self,
        session: &AdminSession,
        user_id: &str,
        client_uuid: &str,
        roles: &[RoleRepresentation],
    ) -> ProvisionResult<MappingStatus> {
        let path = format!(
            "/users/{}/role-mappings/clients/{}",
            urlencoding::encode(user_id),
            urlencoding::encode(client_uuid)
        );
        let response = self.send_json(session, reqwest::Method::POST, &path, roles).await?;
        let status = response.status();

        if status.is_success() {
            Ok(MappingStatus::Assigned)
        } else if status == StatusCode::CONFLICT {
            Ok(MappingStatus::AlreadyAssigned)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ProvisionError::unexpected(status, body))
        }
    }

    /// Builds a realm-scoped admin URL.
    fn admin_url(&self, path: &str) -> String {
        format!(
            "{}/admin/realms/{}{}",
            self.base_url,
            urlencoding::encode(&self.realm),
            path
        )
    }

    /// Makes an authorized GET request and decodes a 200 body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        session: &AdminSession,
        path: &str,
    ) -> ProvisionResult<T> {
        let response = self
            .client
            .get(self.admin_url(path))
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ProvisionError::unexpected(status, body))
        }
    }

    /// Makes an authorized request with a JSON body.
    async fn send_json<B: Serialize + ?Sized>(
        &self,
        session: &AdminSession,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> ProvisionResult<Response> {
        let response = self
            .client
            .request(method, self.admin_url(path))
            .bearer_auth(&session.access_token)
            .json(body)
            .send()
            .await?;
        Ok(response)
    }
}

/// Accepts exactly `expected`; anything else becomes `UnexpectedStatus`.
async fn expect_status(response: Response, expected: StatusCode) -> ProvisionResult<()> {
    let status = response.status();

    if status == expected {
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ProvisionError::unexpected(status, body))
    }
}
