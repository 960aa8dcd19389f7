//! Views the client can send the user to, and the seam through which
//! redirects leave the data layer.

use loanscope_common::UserId;
use parking_lot::Mutex;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Signup,
    Predictions,
    NewPrediction,
    PredictionDetail(i64),
    Users,
    UserDetail(UserId),
    Account,
    AboutModel,
}

impl Route {
    /// Every route except login and signup sits behind the authorization gate
    pub fn is_protected(self) -> bool {
        !matches!(self, Self::Login | Self::Signup)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => write!(f, "/"),
            Self::Signup => write!(f, "/signup"),
            Self::Predictions => write!(f, "/predictions"),
            Self::NewPrediction => write!(f, "/predictions/new"),
            Self::PredictionDetail(id) => write!(f, "/predictions/{}", id),
            Self::Users => write!(f, "/users"),
            Self::UserDetail(id) => write!(f, "/users/{}", id),
            Self::Account => write!(f, "/account"),
            Self::AboutModel => write!(f, "/model"),
        }
    }
}

/// Receives redirects issued by the gate and the session-expiry monitor
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: Route);
}

/// Remembers every redirect; used by tests and by callers that poll
#[derive(Default)]
pub struct RecordingNavigator {
    redirects: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirects(&self) -> Vec<Route> {
        self.redirects.lock().clone()
    }

    pub fn count(&self, route: Route) -> usize {
        self.redirects.lock().iter().filter(|r| **r == route).count()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, route: Route) {
        tracing::info!("Redirecting to {}", route);
        self.redirects.lock().push(route);
    }
}
