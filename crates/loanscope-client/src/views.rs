//! Render-ready view models.
//!
//! Each function enters its route through the authorization gate, so without
//! a credential it redirects and issues no call. Capabilities are computed
//! on every call from the current user as read at that moment.

use loanscope_common::{ModelMetrics, NewPrediction, Prediction, User, UserId};
use std::sync::Arc;

use crate::cache::PredictionScope;
use crate::capability::{capabilities, navigation, Capabilities, NavEntry, Target};
use crate::error::ApiError;
use crate::gate::ViewOutcome;
use crate::navigation::Route;
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct PredictionItem {
    pub prediction: Prediction,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone)]
pub struct PredictionListView {
    pub scope: PredictionScope,
    pub items: Vec<PredictionItem>,
}

#[derive(Debug, Clone)]
pub struct PredictionDetailView {
    pub prediction: Arc<Prediction>,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone)]
pub struct UserItem {
    pub user: User,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone)]
pub struct UserListView {
    pub items: Vec<UserItem>,
}

/// Someone's profile. Edit, delete and role controls are rendered only when
/// the matching capability is present.
#[derive(Debug, Clone)]
pub struct UserProfileView {
    pub user: Arc<User>,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone)]
pub struct AccountView {
    pub user: Arc<User>,
    pub navigation: Vec<NavEntry>,
}

#[derive(Debug, Clone)]
pub struct ModelView {
    pub metrics: Arc<ModelMetrics>,
}

pub async fn predictions_view(
    session: &Session,
    scope: PredictionScope,
) -> Result<ViewOutcome<PredictionListView>, ApiError> {
    let route = match scope {
        PredictionScope::Own => Route::Predictions,
        PredictionScope::OfUser(id) => Route::UserDetail(id),
    };
    session
        .gate()
        .guard(route, || async {
            let me = session.current_user().await?;
            let predictions = session.predictions(scope).await?;
            let items = predictions
                .iter()
                .map(|p| PredictionItem {
                    capabilities: capabilities(&me, Target::Prediction, p.owner_id()),
                    prediction: p.clone(),
                })
                .collect();
            Ok::<_, ApiError>(PredictionListView { scope, items })
        })
        .await
}

pub async fn prediction_detail_view(
    session: &Session,
    id: i64,
) -> Result<ViewOutcome<PredictionDetailView>, ApiError> {
    session
        .gate()
        .guard(Route::PredictionDetail(id), || async {
            let me = session.current_user().await?;
            let prediction = session.prediction(id).await?;
            Ok::<_, ApiError>(PredictionDetailView {
                capabilities: capabilities(&me, Target::Prediction, prediction.owner_id()),
                prediction,
            })
        })
        .await
}

/// Role management listing. Regular users are refused without a call.
pub async fn users_view(session: &Session) -> Result<ViewOutcome<UserListView>, ApiError> {
    session
        .gate()
        .guard(Route::Users, || async {
            let me = session.current_user().await?;
            if !me.role.is_administrator() {
                return Err(ApiError::forbidden("manage users"));
            }
            let users = session.all_users().await?;
            let items = users
                .iter()
                .map(|u| UserItem {
                    capabilities: capabilities(&me, Target::User, u.id),
                    user: u.clone(),
                })
                .collect();
            Ok::<_, ApiError>(UserListView { items })
        })
        .await
}

pub async fn user_profile_view(
    session: &Session,
    user_id: UserId,
) -> Result<ViewOutcome<UserProfileView>, ApiError> {
    session
        .gate()
        .guard(Route::UserDetail(user_id), || async {
            let me = session.current_user().await?;
            let user = session.user(user_id).await?;
            Ok::<_, ApiError>(UserProfileView {
                capabilities: capabilities(&me, Target::User, user.id),
                user,
            })
        })
        .await
}

pub async fn account_view(session: &Session) -> Result<ViewOutcome<AccountView>, ApiError> {
    session
        .gate()
        .guard(Route::Account, || async {
            let user = session.current_user().await?;
            Ok::<_, ApiError>(AccountView {
                navigation: navigation(&user),
                user,
            })
        })
        .await
}

pub async fn model_view(session: &Session) -> Result<ViewOutcome<ModelView>, ApiError> {
    session
        .gate()
        .guard(Route::AboutModel, || async {
            let metrics = session.model_metrics().await?;
            Ok::<_, ApiError>(ModelView { metrics })
        })
        .await
}

pub async fn new_prediction_view(
    session: &Session,
    req: &NewPrediction,
) -> Result<ViewOutcome<Prediction>, ApiError> {
    session
        .gate()
        .guard(Route::NewPrediction, || session.create_prediction(req))
        .await
}
