use std::future::Future;
use std::sync::Arc;

use crate::credential::CredentialStore;
use crate::error::ApiError;
use crate::navigation::{Navigator, Route};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(Route),
}

/// Result of entering a view through the gate
#[derive(Debug, Clone, PartialEq)]
pub enum ViewOutcome<T> {
    Rendered(T),
    Redirected(Route),
}

impl<T> ViewOutcome<T> {
    pub fn rendered(self) -> Option<T> {
        match self {
            Self::Rendered(value) => Some(value),
            Self::Redirected(_) => None,
        }
    }
}

/// Fail-closed gate in front of every protected view.
///
/// The check is synchronous and only looks at the credential store: without
/// a credential the view is never run, so no protected call can be issued.
#[derive(Clone)]
pub struct AuthorizationGate {
    credentials: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
}

impl AuthorizationGate {
    pub fn new(credentials: Arc<dyn CredentialStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            credentials,
            navigator,
        }
    }

    /// Decide without side effects
    pub fn check(&self, route: Route) -> GateDecision {
        if !route.is_protected() || self.credentials.get().is_some() {
            GateDecision::Allow
        } else {
            GateDecision::Redirect(Route::Login)
        }
    }

    /// Decide and perform the redirect when access is denied
    pub fn enter(&self, route: Route) -> GateDecision {
        let decision = self.check(route);
        if let GateDecision::Redirect(to) = decision {
            tracing::info!("No credential for {}; sending to {}", route, to);
            self.navigator.redirect(to);
        }
        decision
    }

    /// Run `view` only if `route` may be entered
    pub async fn guard<T, F, Fut>(&self, route: Route, view: F) -> Result<ViewOutcome<T>, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match self.enter(route) {
            GateDecision::Allow => view().await.map(ViewOutcome::Rendered),
            GateDecision::Redirect(to) => Ok(ViewOutcome::Redirected(to)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::MemoryCredentialStore;
    use crate::navigation::RecordingNavigator;
    use loanscope_common::Credential;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn gate(credential: Option<&str>) -> (AuthorizationGate, Arc<RecordingNavigator>) {
        let store = match credential {
            Some(token) => MemoryCredentialStore::with_credential(Credential::new(token)),
            None => MemoryCredentialStore::new(),
        };
        let nav = Arc::new(RecordingNavigator::new());
        (AuthorizationGate::new(Arc::new(store), nav.clone()), nav)
    }

    #[tokio::test]
    async fn test_no_credential_redirects_without_running_view() {
        let (gate, nav) = gate(None);
        let runs = AtomicUsize::new(0);

        let outcome = gate
            .guard(Route::Predictions, || async {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(outcome, ViewOutcome::Redirected(Route::Login));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(nav.redirects(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn test_credential_present_renders() {
        let (gate, nav) = gate(Some("tok"));
        let outcome = gate
            .guard(Route::Account, || async { Ok::<_, ApiError>("page") })
            .await
            .unwrap();
        assert_eq!(outcome.rendered(), Some("page"));
        assert!(nav.redirects().is_empty());
    }

    #[test]
    fn test_public_routes_always_allowed() {
        let (gate, nav) = gate(None);
        assert_eq!(gate.enter(Route::Login), GateDecision::Allow);
        assert_eq!(gate.enter(Route::Signup), GateDecision::Allow);
        assert!(nav.redirects().is_empty());
    }

    #[test]
    fn test_every_protected_route_denied_without_credential() {
        let (gate, _) = gate(None);
        for route in [
            Route::Predictions,
            Route::NewPrediction,
            Route::PredictionDetail(1),
            Route::Users,
            Route::UserDetail(1),
            Route::Account,
            Route::AboutModel,
        ] {
            assert_eq!(gate.check(route), GateDecision::Redirect(Route::Login));
        }
    }
}
