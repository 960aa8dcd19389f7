use parking_lot::Mutex;
use std::sync::Arc;

use crate::credential::CredentialStore;
use crate::error::ApiError;
use crate::navigation::{Navigator, Route};

/// Ends the session when the backend rejects the credential.
///
/// Every read and mutation result passes through [`SessionMonitor::watch`].
/// An authentication rejection clears the credential and redirects to login;
/// the check-and-clear is serialized so simultaneous rejections produce a
/// single redirect. Other failures are returned untouched for the view to show.
#[derive(Clone)]
pub struct SessionMonitor {
    credentials: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    expiry: Arc<Mutex<()>>,
}

impl SessionMonitor {
    pub fn new(credentials: Arc<dyn CredentialStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            credentials,
            navigator,
            expiry: Arc::new(Mutex::new(())),
        }
    }

    /// Returns `true` if this failure ended the session.
    ///
    /// The redirect happens even when the rejected credential could not be
    /// removed; that failure is returned as [`ApiError::Storage`].
    pub fn observe(&self, err: &ApiError) -> Result<bool, ApiError> {
        if !err.is_auth_rejected() {
            return Ok(false);
        }

        let _guard = self.expiry.lock();
        if self.credentials.get().is_none() {
            tracing::debug!("Credential already cleared; ignoring rejection");
            return Ok(false);
        }

        tracing::warn!("Credential rejected by server: {}", err.detail());
        let cleared = self.credentials.clear();
        self.navigator.redirect(Route::Login);
        cleared.map_err(|e| {
            tracing::error!("Failed to clear rejected credential: {:#}", e);
            ApiError::Storage(format!("{:#}", e))
        })?;
        Ok(true)
    }

    pub fn watch<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(err) = &result {
            self.observe(err)?;
        }
        result
    }
}
