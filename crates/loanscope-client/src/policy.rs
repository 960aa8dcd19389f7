//! Which cache entries a successful mutation makes stale.
//!
//! Keys are derived from the mutation's target only, so unrelated entries
//! keep their value.

use loanscope_common::UserId;

use crate::cache::{CacheKey, PredictionScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    CreatePrediction {
        owner_id: UserId,
    },
    DeletePrediction {
        prediction_id: i64,
        owner_id: UserId,
    },
    UpdateUser {
        user_id: UserId,
        is_session_user: bool,
    },
    ChangeRole {
        user_id: UserId,
        is_session_user: bool,
    },
    DeleteUser {
        user_id: UserId,
    },
}

impl Mutation {
    pub fn invalidated_keys(&self) -> Vec<CacheKey> {
        match *self {
            Self::CreatePrediction { owner_id } => vec![
                CacheKey::PredictionList(PredictionScope::Own),
                CacheKey::PredictionList(PredictionScope::OfUser(owner_id)),
            ],
            Self::DeletePrediction {
                prediction_id,
                owner_id,
            } => vec![
                CacheKey::Prediction(prediction_id),
                CacheKey::PredictionList(PredictionScope::Own),
                CacheKey::PredictionList(PredictionScope::OfUser(owner_id)),
            ],
            Self::UpdateUser {
                user_id,
                is_session_user,
            }
            | Self::ChangeRole {
                user_id,
                is_session_user,
            } => {
                let mut keys = vec![CacheKey::User(user_id), CacheKey::UserList];
                if is_session_user {
                    keys.push(CacheKey::CurrentUser);
                }
                keys
            }
            Self::DeleteUser { user_id } => vec![
                CacheKey::User(user_id),
                CacheKey::UserList,
                CacheKey::PredictionList(PredictionScope::OfUser(user_id)),
            ],
        }
    }
}
