use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Result;

/// Field-descriptor document consumed by the forecast parameters form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormSpec {
    #[serde(default)]
    pub articles: Vec<FormField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    #[serde(rename = "type", default)]
    pub field_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub options: Vec<FieldOption>,
    #[serde(default)]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub default_values: Option<Value>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldOption {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Slider,
    Select,
    CheckboxGroup,
    RadioGroup,
    Unknown,
}

impl FormField {
    pub fn kind(&self) -> FieldKind {
        match self.field_type.as_str() {
            "slider" => FieldKind::Slider,
            "select" => FieldKind::Select,
            "checkbox-group" => FieldKind::CheckboxGroup,
            "radio-group" => FieldKind::RadioGroup,
            _ => FieldKind::Unknown,
        }
    }
}

impl FormSpec {
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to load {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    /// Starting form state: each field's `defaultValue`, replaced by
    /// `defaultValues` when both are present. Falsy defaults are skipped.
    pub fn initial_values(&self) -> Map<String, Value> {
        let mut values = Map::new();
        for field in &self.articles {
            if let Some(value) = field.default_value.as_ref().filter(|v| is_truthy(v)) {
                values.insert(field.name.clone(), value.clone());
            }
            if let Some(value) = field.default_values.as_ref().filter(|v| is_truthy(v)) {
                values.insert(field.name.clone(), value.clone());
            }
        }
        values
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Renders a scalar option/default value as the string used in HTML forms.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(value: Value) -> FormSpec {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn initial_values_prefer_default_values() {
        let form = descriptor(json!({
            "articles": [
                { "type": "slider", "name": "lag", "defaultValue": 27 },
                { "type": "checkbox-group", "name": "inputs", "defaultValue": "ap", "defaultValues": ["ap", "ssn"] },
                { "type": "select", "name": "model", "defaultValue": "" },
                { "type": "radio-group", "name": "zero", "defaultValue": 0 }
            ]
        }));
        let values = form.initial_values();
        assert_eq!(values.get("lag"), Some(&json!(27)));
        assert_eq!(values.get("inputs"), Some(&json!(["ap", "ssn"])));
        assert!(!values.contains_key("model"));
        assert!(!values.contains_key("zero"));
    }

    #[test]
    fn field_kinds() {
        let form = descriptor(json!({
            "articles": [
                { "type": "slider", "name": "a" },
                { "type": "radio-group", "name": "b" },
                { "type": "textarea", "name": "c" },
                { "name": "d" }
            ]
        }));
        let kinds: Vec<_> = form.articles.iter().map(FormField::kind).collect();
        assert_eq!(
            kinds,
            [FieldKind::Slider, FieldKind::RadioGroup, FieldKind::Unknown, FieldKind::Unknown]
        );
    }

    #[test]
    fn option_values_render_as_text() {
        assert_eq!(value_text(&json!("x")), "x");
        assert_eq!(value_text(&json!(3)), "3");
        assert_eq!(value_text(&Value::Null), "");
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let err = FormSpec::load(Path::new("does/not/exist.json"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to load"));
    }
}
