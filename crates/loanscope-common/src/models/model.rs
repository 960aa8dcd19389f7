use serde::{Deserialize, Deserializer, Serialize};

/// Read-only snapshot of the deployed scoring model (`GET /models/get`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub id: i64,
    #[serde(rename = "hyper_params")]
    pub hyperparameters: Hyperparameters,
    #[serde(rename = "test_train_split")]
    pub split_ratios: SplitRatios,
    #[serde(rename = "model_metrics")]
    pub metrics: EvaluationMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters {
    pub id: i64,
    pub epochs: i64,
    pub learning_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub id: i64,
    pub testing: f64,
    pub training: f64,
}

/// Scores measured on the held-out test split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub id: i64,
    pub accuracy: f64,
    pub precision: f64,
    pub f1_score: f64,
    pub recall: f64,
    #[serde(deserialize_with = "de_matrix")]
    pub confusion_matrix: Vec<Vec<f64>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Cell {
    Number(f64),
    Text(String),
}

// Cells come back as numbers from the database and as strings from older exports.
fn de_matrix<'de, D>(deserializer: D) -> Result<Vec<Vec<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows: Vec<Vec<Cell>> = Vec::deserialize(deserializer)?;
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| match cell {
                    Cell::Number(n) => Ok(n),
                    Cell::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                        serde::de::Error::custom(format!("non-numeric confusion matrix cell '{s}'"))
                    }),
                })
                .collect()
        })
        .collect()
}
