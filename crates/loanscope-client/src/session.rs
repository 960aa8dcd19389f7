//! One authenticated client session.
//!
//! [`Session`] owns the entity cache and routes every backend interaction
//! through it. Reads are cached per [`CacheKey`]; mutations check the acting
//! user's capabilities first, then invalidate the keys their target affects.
//! Every result passes the [`SessionMonitor`], so a rejected credential ends
//! the session wherever it is noticed.

use loanscope_common::validation::{
    validate_login, validate_new_prediction, validate_profile, validate_signup,
};
use loanscope_common::{
    LoginRequest, ModelMetrics, NewPrediction, Prediction, ProfileUpdate, Role, SignupRequest,
    User, UserId,
};
use std::future::Future;
use std::sync::Arc;

use crate::cache::{CacheKey, EntityCache, PredictionScope};
use crate::capability::{capabilities, navigation, Capabilities, NavEntry, Target};
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::credential::{CredentialStore, FileCredentialStore};
use crate::error::ApiError;
use crate::gate::AuthorizationGate;
use crate::monitor::SessionMonitor;
use crate::navigation::{Navigator, Route};
use crate::policy::Mutation;

#[derive(Clone)]
pub struct Session {
    api: ApiClient,
    cache: EntityCache,
    credentials: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    gate: AuthorizationGate,
    monitor: SessionMonitor,
}

impl Session {
    pub fn new(
        server_url: &str,
        credentials: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            api: ApiClient::new(server_url, credentials.clone()),
            cache: EntityCache::new(),
            gate: AuthorizationGate::new(credentials.clone(), navigator.clone()),
            monitor: SessionMonitor::new(credentials.clone(), navigator.clone()),
            credentials,
            navigator,
        }
    }

    /// Session backed by the credential file named in `config`
    pub fn from_config(config: &ClientConfig, navigator: Arc<dyn Navigator>) -> Self {
        let store = FileCredentialStore::new(config.credential_path.clone());
        Self::new(&config.server_url, Arc::new(store), navigator)
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &EntityCache {
        &self.cache
    }

    pub fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.get().is_some()
    }

    // ─── Credential lifecycle ───────────────────────────────────────────

    /// Exchange username and password for a credential and start a fresh cache
    pub async fn login(&self, req: &LoginRequest) -> Result<(), ApiError> {
        validate_login(req)?;
        let response = self.api.login(req).await?;

        self.cache.reset();
        self.credentials
            .set(response.token)
            .map_err(|e| ApiError::Storage(format!("{:#}", e)))?;
        tracing::info!("Logged in as {}", req.username);
        Ok(())
    }

    /// Register, then log in with the same username and password
    pub async fn signup(&self, req: &SignupRequest) -> Result<User, ApiError> {
        validate_signup(req)?;
        let user = self.api.register(req).await?;
        tracing::info!("Registered user {} (id {})", user.username, user.id);
        self.login(&req.login()).await?;
        Ok(user)
    }

    pub fn logout(&self) -> Result<(), ApiError> {
        tracing::info!("Logging out");
        self.end_session()
    }

    fn end_session(&self) -> Result<(), ApiError> {
        self.cache.reset();
        self.credentials
            .clear()
            .map_err(|e| ApiError::Storage(format!("{:#}", e)))?;
        self.navigator.redirect(Route::Login);
        Ok(())
    }

    // ─── Reads ──────────────────────────────────────────────────────────

    async fn read<T, F, Fut>(&self, key: CacheKey, call: F) -> Result<Arc<T>, ApiError>
    where
        T: Send + Sync + 'static,
        F: Fn(ApiClient) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let api = self.api.clone();
        let monitor = self.monitor.clone();
        let entry = self
            .cache
            .read(key, move || {
                let fut = call(api.clone());
                let monitor = monitor.clone();
                async move { monitor.watch(fut.await) }
            })
            .await;
        entry.into_result()
    }

    pub async fn current_user(&self) -> Result<Arc<User>, ApiError> {
        self.read(CacheKey::CurrentUser, |api| async move {
            api.get_current_user().await
        })
        .await
    }

    pub async fn user(&self, id: UserId) -> Result<Arc<User>, ApiError> {
        self.read(CacheKey::User(id), move |api| async move { api.get_user(id).await })
            .await
    }

    pub async fn all_users(&self) -> Result<Arc<Vec<User>>, ApiError> {
        self.read(CacheKey::UserList, |api| async move { api.get_all_users().await })
            .await
    }

    pub async fn my_predictions(&self) -> Result<Arc<Vec<Prediction>>, ApiError> {
        self.read(CacheKey::PredictionList(PredictionScope::Own), |api| async move {
            api.get_current_user_predictions().await
        })
        .await
    }

    pub async fn user_predictions(&self, user_id: UserId) -> Result<Arc<Vec<Prediction>>, ApiError> {
        self.read(
            CacheKey::PredictionList(PredictionScope::OfUser(user_id)),
            move |api| async move { api.get_user_predictions(user_id).await },
        )
        .await
    }

    pub async fn predictions(&self, scope: PredictionScope) -> Result<Arc<Vec<Prediction>>, ApiError> {
        match scope {
            PredictionScope::Own => self.my_predictions().await,
            PredictionScope::OfUser(id) => self.user_predictions(id).await,
        }
    }

    pub async fn prediction(&self, id: i64) -> Result<Arc<Prediction>, ApiError> {
        self.read(CacheKey::Prediction(id), move |api| async move {
            api.get_prediction(id).await
        })
        .await
    }

    pub async fn model_metrics(&self) -> Result<Arc<ModelMetrics>, ApiError> {
        self.read(CacheKey::ModelMetrics, |api| async move {
            api.get_model_metrics().await
        })
        .await
    }

    /// Capabilities of the session user on `target`, from a fresh read of
    /// the current user
    pub async fn capabilities(&self, target: Target, owner_id: UserId) -> Result<Capabilities, ApiError> {
        let me = self.current_user().await?;
        Ok(capabilities(&me, target, owner_id))
    }

    pub async fn navigation(&self) -> Result<Vec<NavEntry>, ApiError> {
        let me = self.current_user().await?;
        Ok(navigation(&me))
    }

    // ─── Mutations ──────────────────────────────────────────────────────

    fn apply(&self, mutation: Mutation) {
        for key in mutation.invalidated_keys() {
            self.cache.invalidate(key);
        }
    }

    pub async fn create_prediction(&self, req: &NewPrediction) -> Result<Prediction, ApiError> {
        validate_new_prediction(req)?;
        let created = self.monitor.watch(self.api.create_prediction(req).await)?;
        tracing::info!(
            "Created prediction {} ({})",
            created.id,
            created.outcome_label()
        );
        self.apply(Mutation::CreatePrediction {
            owner_id: created.owner_id(),
        });
        Ok(created)
    }

    pub async fn delete_prediction(&self, id: i64) -> Result<Prediction, ApiError> {
        let prediction = self.prediction(id).await?;
        let owner_id = prediction.owner_id();
        if !self.capabilities(Target::Prediction, owner_id).await?.can_delete() {
            return Err(ApiError::forbidden("delete this prediction"));
        }

        let deleted = self.monitor.watch(self.api.delete_prediction(id).await)?;
        tracing::info!("Deleted prediction {}", id);
        self.apply(Mutation::DeletePrediction {
            prediction_id: id,
            owner_id,
        });
        Ok(deleted)
    }

    /// Update first and last name of `user_id`. The session user's own
    /// profile goes through the self-service call.
    pub async fn update_profile(&self, user_id: UserId, update: &ProfileUpdate) -> Result<User, ApiError> {
        validate_profile(update)?;
        let me = self.current_user().await?;
        if !capabilities(&me, Target::User, user_id).can_edit() {
            return Err(ApiError::forbidden("edit this profile"));
        }

        let is_session_user = me.id == user_id;
        let result = if is_session_user {
            self.api.update_current_user(update).await
        } else {
            self.api.update_user(user_id, update).await
        };
        let updated = self.monitor.watch(result)?;
        tracing::info!("Updated profile of user {}", user_id);
        self.apply(Mutation::UpdateUser {
            user_id,
            is_session_user,
        });
        Ok(updated)
    }

    pub async fn change_role(&self, user_id: UserId, role: Role) -> Result<User, ApiError> {
        let me = self.current_user().await?;
        if !capabilities(&me, Target::User, user_id).can_change_role() {
            return Err(ApiError::forbidden("change roles"));
        }

        let updated = self
            .monitor
            .watch(self.api.update_user_role(user_id, role).await)?;
        tracing::info!("Changed role of user {} to {}", user_id, role);
        self.apply(Mutation::ChangeRole {
            user_id,
            is_session_user: me.id == user_id,
        });
        Ok(updated)
    }

    /// Delete any account (administrators). Deleting one's own account this
    /// way ends the session like [`Session::delete_account`].
    pub async fn delete_user(&self, user_id: UserId) -> Result<User, ApiError> {
        let me = self.current_user().await?;
        if !capabilities(&me, Target::User, user_id).can_delete() {
            return Err(ApiError::forbidden("delete users"));
        }
        if me.id == user_id {
            return self.delete_account().await;
        }

        let deleted = self.monitor.watch(self.api.delete_user(user_id).await)?;
        tracing::info!("Deleted user {}", user_id);
        self.apply(Mutation::DeleteUser { user_id });
        Ok(deleted)
    }

    /// Delete the session user's own account and end the session
    pub async fn delete_account(&self) -> Result<User, ApiError> {
        let deleted = self.monitor.watch(self.api.delete_current_user().await)?;
        tracing::info!("Deleted own account {}", deleted.username);
        self.end_session()?;
        Ok(deleted)
    }
}
