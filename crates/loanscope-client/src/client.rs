use loanscope_common::{
    LoginRequest, ModelMetrics, NewPrediction, Prediction, ProfileUpdate, Role, SignupRequest,
    TokenResponse, User, UserId,
};
use reqwest::header::AUTHORIZATION;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::credential::CredentialStore;
use crate::error::{extract_detail, ApiError};

/// Typed HTTP client for the loan-approval backend.
///
/// Every request carries `Authorization: Bearer <token>` when the credential
/// store holds one. Calls are never retried: one failed call yields exactly
/// one error.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Arc<str>,
    credentials: Arc<dyn CredentialStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: Arc::from(base_url.trim_end_matches('/')),
            credentials,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, ApiError> {
        let request = match self.credentials.get() {
            Some(credential) => request.header(AUTHORIZATION, credential.bearer()),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("Failed to send {} request: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read body".to_string());
            let err = ApiError::from_status(status, extract_detail(status, &body));
            tracing::debug!("{} failed with status {}: {}", what, status, err.detail());
            return Err(err);
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(format!("Failed to parse {} response: {}", what, e)))
    }

    // ─── Auth ───────────────────────────────────────────────────────────

    #[tracing::instrument(skip(self))]
    pub async fn login(&self, req: &LoginRequest) -> Result<TokenResponse, ApiError> {
        let request = self.client.post(self.url("/auth/login")).json(req);
        self.send(request, "login").await
    }

    #[tracing::instrument(skip(self))]
    pub async fn register(&self, req: &SignupRequest) -> Result<User, ApiError> {
        let request = self.client.post(self.url("/auth/register")).json(req);
        self.send(request, "register").await
    }

    // ─── Users ──────────────────────────────────────────────────────────

    #[tracing::instrument(skip(self))]
    pub async fn get_current_user(&self) -> Result<User, ApiError> {
        let request = self.client.get(self.url("/users/get"));
        self.send(request, "get current user").await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_user(&self, id: UserId) -> Result<User, ApiError> {
        let request = self.client.get(self.url(&format!("/users/get/{}", id)));
        self.send(request, "get user").await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_all_users(&self) -> Result<Vec<User>, ApiError> {
        let request = self.client.get(self.url("/users/get/all"));
        self.send(request, "list users").await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_current_user(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        let request = self.client.put(self.url("/users/update")).json(update);
        self.send(request, "update current user").await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_user(&self, id: UserId, update: &ProfileUpdate) -> Result<User, ApiError> {
        let request = self
            .client
            .put(self.url(&format!("/users/update/{}", id)))
            .json(update);
        self.send(request, "update user").await
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_user_role(&self, id: UserId, role: Role) -> Result<User, ApiError> {
        let request = self
            .client
            .put(self.url(&format!("/users/update/role/{}/{}", id, role.id())))
            .json(&serde_json::json!({}));
        self.send(request, "update user role").await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_current_user(&self) -> Result<User, ApiError> {
        let request = self.client.delete(self.url("/users/delete"));
        self.send(request, "delete current user").await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, id: UserId) -> Result<User, ApiError> {
        let request = self.client.delete(self.url(&format!("/users/delete/{}", id)));
        self.send(request, "delete user").await
    }

    // ─── Predictions ────────────────────────────────────────────────────

    #[tracing::instrument(skip(self))]
    pub async fn create_prediction(&self, req: &NewPrediction) -> Result<Prediction, ApiError> {
        let request = self.client.post(self.url("/predictions/predict")).json(req);
        self.send(request, "create prediction").await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_current_user_predictions(&self) -> Result<Vec<Prediction>, ApiError> {
        let request = self.client.get(self.url("/predictions/get/all"));
        self.send(request, "list own predictions").await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_user_predictions(&self, user_id: UserId) -> Result<Vec<Prediction>, ApiError> {
        let request = self
            .client
            .get(self.url(&format!("/predictions/get/all/{}", user_id)));
        self.send(request, "list user predictions").await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_prediction(&self, id: i64) -> Result<Prediction, ApiError> {
        let request = self.client.get(self.url(&format!("/predictions/get/{}", id)));
        self.send(request, "get prediction").await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_prediction(&self, id: i64) -> Result<Prediction, ApiError> {
        let request = self
            .client
            .delete(self.url(&format!("/predictions/delete/{}", id)));
        self.send(request, "delete prediction").await
    }

    // ─── Model ──────────────────────────────────────────────────────────

    #[tracing::instrument(skip(self))]
    pub async fn get_model_metrics(&self) -> Result<ModelMetrics, ApiError> {
        let request = self.client.get(self.url("/models/get"));
        self.send(request, "get model metrics").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::MemoryCredentialStore;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new(
            "http://localhost:8000/api/",
            Arc::new(MemoryCredentialStore::new()),
        );
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(client.url("/users/get"), "http://localhost:8000/api/users/get");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        // Port 9 (discard) on localhost is not expected to accept HTTP
        let client = ApiClient::new("http://127.0.0.1:9", Arc::new(MemoryCredentialStore::new()));
        let err = client.get_model_metrics().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)), "got: {err:?}");
        assert_eq!(err.status(), None);
    }
}
