//! Required-field checks run before a form is submitted.
//!
//! Only presence is checked here; everything else (uniqueness, credentials,
//! value ranges) is the backend's call.

use crate::models::auth::{LoginRequest, SignupRequest};
use crate::models::prediction::NewPrediction;
use crate::models::user::ProfileUpdate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} can't be empty")]
pub struct ValidationError {
    pub field: &'static str,
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError { field });
    }
    Ok(())
}

pub fn validate_login(req: &LoginRequest) -> Result<(), ValidationError> {
    require("username", &req.username)?;
    require("password", &req.password)
}

pub fn validate_signup(req: &SignupRequest) -> Result<(), ValidationError> {
    require("username", &req.username)?;
    require("first_name", &req.first_name)?;
    require("last_name", &req.last_name)?;
    require("password", &req.password)
}

pub fn validate_profile(update: &ProfileUpdate) -> Result<(), ValidationError> {
    require("first_name", &update.first_name)?;
    require("last_name", &update.last_name)
}

/// Numeric inputs are typed and therefore always present; only the title can be blank.
pub fn validate_new_prediction(req: &NewPrediction) -> Result<(), ValidationError> {
    require("title", &req.title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::prediction::PredictionInputs;

    fn signup() -> SignupRequest {
        SignupRequest {
            username: "ana".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Lee".to_string(),
            password: "pw".to_string(),
        }
    }

    #[test]
    fn test_valid_signup_passes() {
        assert!(validate_signup(&signup()).is_ok());
    }

    #[test]
    fn test_whitespace_counts_as_empty() {
        let mut req = signup();
        req.last_name = "   ".to_string();
        let err = validate_signup(&req).unwrap_err();
        assert_eq!(err.field, "last_name");
        assert_eq!(err.to_string(), "last_name can't be empty");
    }

    #[test]
    fn test_login_reports_first_missing_field() {
        let req = LoginRequest {
            username: String::new(),
            password: String::new(),
        };
        assert_eq!(validate_login(&req).unwrap_err().field, "username");
    }

    #[test]
    fn test_profile_requires_both_names() {
        let update = ProfileUpdate {
            first_name: "Z".to_string(),
            last_name: String::new(),
        };
        assert_eq!(validate_profile(&update).unwrap_err().field, "last_name");
    }

    #[test]
    fn test_prediction_requires_title() {
        let req = NewPrediction {
            title: "".to_string(),
            inputs: PredictionInputs {
                id: None,
                dependents: 1,
                education: true,
                self_employed: false,
                income: 1,
                loan_amount: 1,
                loan_term: 1,
                credit_score: 1,
                residential_assets_value: 0,
                commercial_assets_value: 0,
                luxury_assets_value: 0,
                bank_asset_value: 0,
            },
        };
        assert_eq!(validate_new_prediction(&req).unwrap_err().field, "title");
    }
}
