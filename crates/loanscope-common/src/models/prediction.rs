use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::user::{User, UserId};

/// The eleven applicant fields the scoring model consumes.
///
/// Field names follow the backend's wire names via `serde(rename)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "no_of_dependents")]
    pub dependents: i64,
    /// Applicant is a graduate
    pub education: bool,
    pub self_employed: bool,
    #[serde(rename = "income_amount")]
    pub income: i64,
    #[serde(rename = "loan_amont")]
    pub loan_amount: i64,
    #[serde(rename = "loan_amont_term")]
    pub loan_term: i64,
    #[serde(rename = "cibil_score")]
    pub credit_score: i64,
    pub residential_assets_value: i64,
    pub commercial_assets_value: i64,
    pub luxury_assets_value: i64,
    pub bank_asset_value: i64,
}

/// A scored loan application. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "de_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    /// `true` when the loan is predicted to be approved
    #[serde(rename = "prediction")]
    pub outcome: bool,
    #[serde(rename = "prediction_inputs")]
    pub inputs: PredictionInputs,
    #[serde(rename = "user")]
    pub owner: User,
}

impl Prediction {
    pub fn owner_id(&self) -> UserId {
        self.owner.id
    }

    pub fn outcome_label(&self) -> &'static str {
        if self.outcome { "approved" } else { "rejected" }
    }
}

/// Body of `POST /predictions/predict`
#[derive(Debug, Clone, Serialize)]
pub struct NewPrediction {
    pub title: String,
    #[serde(flatten)]
    pub inputs: PredictionInputs,
}

/// Accepts RFC 3339 or a naive ISO timestamp, the latter read as UTC.
fn de_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;

    fn sample_json(created_at: &str) -> String {
        format!(
            r#"{{
                "id": 11,
                "title": "Car loan",
                "created_at": {created_at},
                "prediction": true,
                "prediction_inputs": {{
                    "id": 4,
                    "no_of_dependents": 2,
                    "education": true,
                    "self_employed": false,
                    "income_amount": 9600000,
                    "loan_amont": 29900000,
                    "loan_amont_term": 12,
                    "cibil_score": 778,
                    "residential_assets_value": 2400000,
                    "commercial_assets_value": 17600000,
                    "luxury_assets_value": 22700000,
                    "bank_asset_value": 8000000
                }},
                "user": {{
                    "id": 3,
                    "username": "bo",
                    "first_name": "Bo",
                    "last_name": "Ng",
                    "role": {{"id": 1, "role_name": "user"}}
                }}
            }}"#
        )
    }

    #[test]
    fn test_prediction_parses_wire_names() {
        let p: Prediction = serde_json::from_str(&sample_json(r#""2025-03-01T10:15:00Z""#)).unwrap();
        assert_eq!(p.id, 11);
        assert!(p.outcome);
        assert_eq!(p.outcome_label(), "approved");
        assert_eq!(p.inputs.loan_amount, 29_900_000);
        assert_eq!(p.inputs.credit_score, 778);
        assert_eq!(p.owner_id(), 3);
        assert_eq!(p.owner.role, Role::Regular);
        assert_eq!(
            p.created_at.unwrap().to_rfc3339(),
            "2025-03-01T10:15:00+00:00"
        );
    }

    #[test]
    fn test_naive_timestamp_is_utc() {
        let p: Prediction =
            serde_json::from_str(&sample_json(r#""2025-03-01T10:15:00.123456""#)).unwrap();
        let ts = p.created_at.unwrap();
        assert_eq!(ts.format("%Y-%m-%d %H:%M").to_string(), "2025-03-01 10:15");
    }

    #[test]
    fn test_missing_title_and_timestamp_default() {
        let mut value: serde_json::Value =
            serde_json::from_str(&sample_json("null")).unwrap();
        value.as_object_mut().unwrap().remove("title");
        value.as_object_mut().unwrap().remove("created_at");
        let p: Prediction = serde_json::from_value(value).unwrap();
        assert_eq!(p.title, "");
        assert!(p.created_at.is_none());
    }

    #[test]
    fn test_new_prediction_flattens_inputs() {
        let req = NewPrediction {
            title: "Home".to_string(),
            inputs: PredictionInputs {
                id: None,
                dependents: 0,
                education: false,
                self_employed: true,
                income: 1,
                loan_amount: 2,
                loan_term: 3,
                credit_score: 4,
                residential_assets_value: 5,
                commercial_assets_value: 6,
                luxury_assets_value: 7,
                bank_asset_value: 8,
            },
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["title"], "Home");
        assert_eq!(value["loan_amont"], 2);
        assert_eq!(value["cibil_score"], 4);
        assert!(value.get("id").is_none());
        assert!(value.get("inputs").is_none());
    }
}
