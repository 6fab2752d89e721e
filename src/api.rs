use anyhow::Context;
use reqwest::{Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::model::{self, ModelList, PredictionResult};
use crate::session::{HttpSession, SessionConfig};

const LATEST_PREDICTION_PATH: &str = "api/input/predict-latest";
const MODELS_PATH: &str = "api/models";
const PREDICT_V2_PATH: &str = "api/inference/predict-latest-v2-phase2";
const BACKEND_TEST_PATH: &str = "api/test";
const RUN_FORECAST_PATH: &str = "api/run-forecast";

/// Uniform outcome of every API client operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Converts back into a `Result`, substituting `fallback` when a failed
    /// envelope carries no message.
    pub fn into_result(self, fallback: &str) -> std::result::Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(self
                .error
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| fallback.to_owned())),
        }
    }
}

impl<T> From<std::result::Result<T, ClientError>> for Envelope<T> {
    fn from(result: std::result::Result<T, ClientError>) -> Self {
        match result {
            Ok(data) => Envelope::ok(data),
            Err(err) => Envelope::failure(err.to_string()),
        }
    }
}

/// Thin client for the solar-flux prediction backend.
///
/// Every public operation issues a single request and never fails past this
/// boundary: transport errors, non-2xx statuses and malformed payloads all end
/// up as a failed [`Envelope`]. Retrying is left to the caller.
#[derive(Debug, Clone)]
pub struct ApiClient {
    session: HttpSession,
}

impl ApiClient {
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let session = HttpSession::new(config).context("building HTTP session")?;
        Ok(Self { session })
    }

    pub fn base_url(&self) -> &Url {
        self.session.base_url()
    }

    /// Latest prediction, passed through as raw JSON.
    pub async fn get_latest_prediction(&self) -> Envelope<Value> {
        self.get_json(LATEST_PREDICTION_PATH, &[]).await.into()
    }

    /// Backend reachability check.
    pub async fn test_connection(&self) -> Envelope<Value> {
        self.get_json(BACKEND_TEST_PATH, &[]).await.into()
    }

    pub async fn get_models(&self) -> Envelope<ModelList> {
        let result = self
            .get_json(MODELS_PATH, &[])
            .await
            .map(|payload| model::normalize_models(&payload));
        if let Ok(list) = &result {
            tracing::debug!("fetched {} models", list.models.len());
        }
        result.into()
    }

    pub async fn make_prediction(
        &self,
        model_id: &str,
        horizon_days: u32,
    ) -> Envelope<PredictionResult> {
        let horizon = horizon_days.to_string();
        let query = [("modelId", model_id), ("horizonDays", horizon.as_str())];
        self.get_json(PREDICT_V2_PATH, &query)
            .await
            .and_then(|payload| model::normalize_prediction(&payload, model_id, horizon_days))
            .into()
    }

    /// Submits forecast parameters collected from a descriptor-driven form.
    pub async fn run_forecast(&self, params: &Value) -> Envelope<Value> {
        self.post_json(RUN_FORECAST_PATH, params).await.into()
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<Value, ClientError> {
        let mut url = self.session.base_url().join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        tracing::debug!("GET {url}");

        let response = self
            .session
            .client()
            .get(url.clone())
            .send()
            .await
            .inspect_err(|err| tracing::warn!("request to {url} failed: {err}"))?;
        read_json(response).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> std::result::Result<Value, ClientError> {
        let url = self.session.base_url().join(path)?;
        tracing::debug!("POST {url}");

        let response = self
            .session
            .client()
            .post(url.clone())
            .json(body)
            .send()
            .await
            .inspect_err(|err| tracing::warn!("request to {url} failed: {err}"))?;
        read_json(response).await
    }
}

async fn read_json(response: Response) -> std::result::Result<Value, ClientError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        tracing::warn!("backend answered {status}");
        return Err(ClientError::Status {
            status: status.as_u16(),
            message: status_message(status.as_u16(), &text),
        });
    }

    Ok(serde_json::from_str(&text)?)
}

/// Error text for a non-2xx response: the body's `detail`, then `message`,
/// then a generic status line.
fn status_message(status: u16, body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).unwrap_or(Value::Null);
    ["detail", "message"]
        .iter()
        .find_map(|key| {
            parsed
                .get(key)
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| format!("HTTP error! status: {status}"))
}
