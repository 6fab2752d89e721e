//! Canonical prediction-service types and the adapter layer that maps the
//! backend's heterogeneous response shapes onto them.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ClientError;

static HORIZON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)horizon_(\d+)").expect("regex should compile"));

static MODEL_FAMILY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(LightGBM|Random Forest|LSTM|XGBoost|Neural Network|SVM|Linear Regression)")
        .expect("regex should compile")
});

/// A prediction model as exposed by `/api/models`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub model_id: String,
    pub family: String,
    pub description: String,
    pub available_horizon_days: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelList {
    pub models: Vec<ModelDescriptor>,
}

/// Normalized outcome of a v2 prediction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_flux: f64,
    pub model_id: String,
    pub horizon_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction_id: Option<String>,
}

/// Extracts every `horizon_<N>` marker from a model identifier.
///
/// The result is sorted ascending, deduplicated, and only keeps `N >= 1`.
pub fn parse_horizon_days(model_id: &str) -> Vec<u32> {
    HORIZON_RE
        .captures_iter(model_id)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().parse::<u32>().ok())
        .filter(|&days| days >= 1)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Maps the `/api/models` payload (a bare array or `{ "models": [...] }`).
///
/// Any other top-level shape yields an empty list; malformed entries degrade to
/// empty strings instead of failing the whole response.
pub fn normalize_models(payload: &Value) -> ModelList {
    let raw = match payload {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => map
            .get("models")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };

    let models = raw.iter().map(normalize_model_entry).collect();
    ModelList { models }
}

fn normalize_model_entry(entry: &Value) -> ModelDescriptor {
    let model_id = string_field(entry, "model_id")
        .or_else(|| string_field(entry, "modelId"))
        .unwrap_or_default();
    let available_horizon_days = parse_horizon_days(&model_id);

    ModelDescriptor {
        family: string_field(entry, "family").unwrap_or_default(),
        description: string_field(entry, "description").unwrap_or_default(),
        available_horizon_days,
        model_id,
    }
}

/// Reconciles the legacy and current field naming of the v2 prediction
/// response. A horizon reported by the backend takes precedence over the one
/// the caller asked for.
pub fn normalize_prediction(
    payload: &Value,
    requested_model: &str,
    requested_horizon: u32,
) -> Result<PredictionResult, ClientError> {
    let predicted_flux = number_field(payload, "predicted_flux")
        .or_else(|| number_field(payload, "predictedValue"))
        .ok_or(ClientError::MissingField("predictedValue"))?;

    let model_id = string_field(payload, "model_id")
        .or_else(|| string_field(payload, "modelId"))
        .unwrap_or_else(|| requested_model.to_owned());

    let horizon_days = horizon_field(payload, "horizon_days")
        .or_else(|| horizon_field(payload, "horizonDays"))
        .unwrap_or(requested_horizon);

    let prediction_id = scalar_field(payload, "predictionId")
        .or_else(|| scalar_field(payload, "prediction_id"));

    Ok(PredictionResult {
        predicted_flux,
        model_id,
        horizon_days,
        prediction_id,
    })
}

/// Short family label for a model, used in selection lists.
pub fn model_short_name(model_id: &str, description: &str) -> String {
    if !description.is_empty() {
        if let Some(family) = MODEL_FAMILY_RE
            .captures(description)
            .and_then(|caps| caps.get(1))
        {
            return family.as_str().to_owned();
        }
        return description
            .split(' ')
            .next()
            .unwrap_or(description)
            .to_owned();
    }

    match model_id {
        "lgb_f107_lag27_ap_lag3" => return "LightGBM".to_owned(),
        "rf-v2-aplags" => return "Random Forest".to_owned(),
        "lstm" => return "LSTM".to_owned(),
        _ => {}
    }

    if model_id.starts_with("lgb_") {
        "LightGBM".to_owned()
    } else if model_id.starts_with("rf_") || model_id.starts_with("rf-") {
        "Random Forest".to_owned()
    } else if model_id.starts_with("lstm_") || model_id.starts_with("lstm-") {
        "LSTM".to_owned()
    } else {
        model_id
            .split('_')
            .next()
            .and_then(|part| part.split('-').next())
            .unwrap_or_default()
            .to_uppercase()
    }
}

/// Plain English name for a model: its description when present, otherwise a
/// known mapping or the title-cased identifier.
pub fn model_display_name(model_id: &str, description: &str) -> String {
    if !description.is_empty() {
        return description.to_owned();
    }

    match model_id {
        "lgb_f107_lag27_ap_lag3" => "LightGBM Model (27-day F10.7 lag, 3-day AP lag)".to_owned(),
        "rf-v2-aplags" => "Random Forest Model v2".to_owned(),
        "lstm" => "LSTM Neural Network Model".to_owned(),
        _ => title_case_words(&model_id.replace('_', " ")),
    }
}

fn title_case_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        let is_word = ch.is_alphanumeric() || ch == '_';
        if is_word && at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = !is_word;
    }
    out
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_owned())
}

fn number_field(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

/// Horizon sent either as a JSON number or a numeric string.
fn horizon_field(value: &Value, key: &str) -> Option<u32> {
    match value.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|days| u32::try_from(days).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn scalar_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
