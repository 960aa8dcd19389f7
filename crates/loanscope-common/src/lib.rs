//! Shared wire models and input validation for the loanscope client.
//!
//! Everything in this crate is pure data: the types mirror the JSON the
//! loan-approval backend sends and accepts, and the validators implement the
//! "required field" checks a form performs before anything is submitted.

pub mod models;
pub mod validation;

pub use models::auth::{Credential, LoginRequest, SignupRequest, TokenResponse};
pub use models::model::{EvaluationMetrics, Hyperparameters, ModelMetrics, SplitRatios};
pub use models::prediction::{NewPrediction, Prediction, PredictionInputs};
pub use models::user::{ProfileUpdate, Role, User, UserId};
pub use validation::ValidationError;
