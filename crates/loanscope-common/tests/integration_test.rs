use loanscope_common::validation::{validate_new_prediction, validate_signup};
use loanscope_common::{
    ModelMetrics, NewPrediction, Prediction, PredictionInputs, Role, SignupRequest, TokenResponse,
    User,
};
use serde_json::json;

#[test]
fn test_prediction_list_from_backend() {
    // Shape of GET /predictions/get/all as the backend returns it
    let body = json!([
        {
            "id": 1,
            "title": "Car loan",
            "created_at": "2025-03-14T09:26:53.589793",
            "prediction": true,
            "prediction_inputs": {
                "id": 1,
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
            },
            "user": {
                "id": 3,
                "username": "ana",
                "first_name": "Ana",
                "last_name": "Lee",
                "role": { "id": 1, "role_name": "user" }
            }
        },
        {
            "id": 2,
            "prediction": false,
            "prediction_inputs": {
                "id": 2,
                "no_of_dependents": 0,
                "education": false,
                "self_employed": true,
                "income_amount": 4100000,
                "loan_amont": 12200000,
                "loan_amont_term": 8,
                "cibil_score": 417,
                "residential_assets_value": 2700000,
                "commercial_assets_value": 2200000,
                "luxury_assets_value": 8800000,
                "bank_asset_value": 3300000
            },
            "user": {
                "id": 3,
                "username": "ana",
                "first_name": "Ana",
                "last_name": "Lee",
                "role": { "id": 1, "role_name": "user" }
            }
        }
    ]);

    let list: Vec<Prediction> = serde_json::from_value(body).unwrap();
    assert_eq!(list.len(), 2);

    let first = &list[0];
    assert_eq!(first.outcome_label(), "approved");
    assert_eq!(first.inputs.credit_score, 778);
    assert_eq!(first.owner_id(), 3);
    assert_eq!(
        first.created_at.unwrap().to_rfc3339(),
        "2025-03-14T09:26:53.589793+00:00"
    );

    // Older rows carry neither title nor timestamp
    let second = &list[1];
    assert_eq!(second.title, "");
    assert!(second.created_at.is_none());
    assert_eq!(second.outcome_label(), "rejected");
}

#[test]
fn test_role_identity_wins_over_name() {
    let user: User = serde_json::from_value(json!({
        "id": 1,
        "username": "root",
        "first_name": "Root",
        "last_name": "Admin",
        "role": { "id": 2, "role_name": "user" }
    }))
    .unwrap();
    assert_eq!(user.role, Role::Administrator);

    let unknown = serde_json::from_value::<User>(json!({
        "id": 1,
        "username": "root",
        "first_name": "Root",
        "last_name": "Admin",
        "role": { "id": 7, "role_name": "admin" }
    }));
    assert!(unknown.is_err());
}

#[test]
fn test_new_prediction_request_body() {
    let req = NewPrediction {
        title: "House".to_string(),
        inputs: PredictionInputs {
            id: None,
            dependents: 1,
            education: true,
            self_employed: false,
            income: 5_000_000,
            loan_amount: 15_000_000,
            loan_term: 10,
            credit_score: 650,
            residential_assets_value: 0,
            commercial_assets_value: 0,
            luxury_assets_value: 0,
            bank_asset_value: 1_000_000,
        },
    };
    validate_new_prediction(&req).unwrap();

    let body = serde_json::to_value(&req).unwrap();
    let obj = body.as_object().unwrap();
    assert_eq!(obj.len(), 12);
    assert_eq!(body["title"], "House");
    assert_eq!(body["loan_amont"], 15_000_000);
    assert_eq!(body["loan_amont_term"], 10);
    assert_eq!(body["income_amount"], 5_000_000);
    assert!(!obj.contains_key("id"));
    assert!(!obj.contains_key("inputs"));
}

#[test]
fn test_model_metrics_from_backend() {
    let metrics: ModelMetrics = serde_json::from_value(json!({
        "id": 1,
        "hyper_params": { "id": 1, "epochs": 1000, "learning_rate": 0.01 },
        "test_train_split": { "id": 1, "testing": 0.2, "training": 0.8 },
        "params": { "id": 1, "weights": "[0.1, 0.2]", "bias": 0.5 },
        "model_metrics": {
            "id": 1,
            "accuracy": 0.92,
            "precision": 0.93,
            "f1_score": 0.94,
            "recall": 0.95,
            "confusion_matrix": [["498", "33"], ["36", "287"]]
        }
    }))
    .unwrap();

    assert_eq!(metrics.hyperparameters.epochs, 1000);
    assert_eq!(
        metrics.metrics.confusion_matrix,
        vec![vec![498.0, 33.0], vec![36.0, 287.0]]
    );
}

#[test]
fn test_signup_flow_payloads() {
    let signup = SignupRequest {
        username: "cleo".to_string(),
        first_name: "Cleo".to_string(),
        last_name: "Park".to_string(),
        password: "s3cret".to_string(),
    };
    validate_signup(&signup).unwrap();

    let login = serde_json::to_value(signup.login()).unwrap();
    assert_eq!(login, json!({ "username": "cleo", "password": "s3cret" }));

    let token: TokenResponse = serde_json::from_value(json!({ "token": "abc.def" })).unwrap();
    assert_eq!(token.token.bearer(), "Bearer abc.def");
    assert!(!format!("{:?}", token).contains("abc.def"));
}
