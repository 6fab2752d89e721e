//! Declarative site content: profile, sections and the articles inside them.

mod form;
mod wrapper;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::Result;

pub(crate) use form::value_text;
pub use form::{FieldKind, FormField, FormSpec};
pub use wrapper::{ArticleDataWrapper, ChartKind};

pub const DEFAULT_LANGUAGE: &str = "en";

/// Per-language field maps, e.g. `{ "en": { "title": "..." } }`.
pub type Locales = BTreeMap<String, Map<String, Value>>;

/// Looks `key` up in the active language, then in [`DEFAULT_LANGUAGE`].
pub fn translation<'a>(locales: &'a Locales, language: &str, key: &str) -> Option<&'a Value> {
    locales
        .get(language)
        .and_then(|fields| fields.get(key))
        .or_else(|| {
            locales
                .get(DEFAULT_LANGUAGE)
                .and_then(|fields| fields.get(key))
        })
        .filter(|value| !value.is_null())
}

/// String flavour of [`translation`]; empty strings count as missing.
pub fn translation_text(locales: &Locales, language: &str, key: &str) -> Option<String> {
    translation(locales, language, key)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}

/// The whole site document loaded from disk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteContent {
    #[serde(default)]
    pub profile: Option<ProfileConfig>,
    #[serde(default)]
    pub sections: Vec<SectionConfig>,
    /// Directory the document was loaded from; relative asset paths resolve
    /// against it.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl SiteContent {
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading content file {}", path.display()))?;
        let mut content = Self::from_json(&raw)
            .with_context(|| format!("parsing content file {}", path.display()))?;
        content.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        tracing::info!(
            "loaded {} sections from {}",
            content.sections.len(),
            path.display()
        );
        Ok(content)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn section(&self, id: &str) -> Option<&SectionConfig> {
        self.sections.iter().find(|section| section.id == id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionConfig {
    #[serde(default, deserialize_with = "scalar_string")]
    pub id: String,
    #[serde(default)]
    pub locales: Locales,
    #[serde(default)]
    pub articles: Vec<ArticleConfig>,
}

impl SectionConfig {
    /// Wraps the section's articles in declaration order.
    pub fn article_wrappers<'a>(&'a self, language: &'a str) -> Vec<ArticleDataWrapper<'a>> {
        self.articles
            .iter()
            .enumerate()
            .map(|(index, article)| {
                let unique_id = article
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("{}-{index}", self.id));
                ArticleDataWrapper::new(article, unique_id, language)
            })
            .collect()
    }

    pub fn title(&self, language: &str) -> Option<String> {
        translation_text(&self.locales, language, "title")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleConfig {
    #[serde(default, deserialize_with = "optional_scalar_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub component: String,
    #[serde(default)]
    pub locales: Locales,
    #[serde(default)]
    pub items: Vec<ItemConfig>,
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
    #[serde(default)]
    pub settings: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemConfig {
    #[serde(default, deserialize_with = "optional_scalar_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "optional_scalar_string")]
    pub category_id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub date_start: Option<String>,
    #[serde(default)]
    pub locales: Locales,
}

impl ItemConfig {
    /// `dateStart` as a calendar date; accepts plain dates and RFC 3339
    /// timestamps.
    pub fn date_start(&self) -> Option<NaiveDate> {
        let raw = self.date_start.as_deref()?.trim();
        raw.get(..10)
            .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryConfig {
    #[serde(default, deserialize_with = "scalar_string")]
    pub id: String,
    #[serde(default)]
    pub locales: Locales,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub locales: Locales,
    /// A single URL, a list of URLs, or a JSON-encoded list of URLs.
    #[serde(default)]
    pub profile_picture_url: Option<Value>,
    #[serde(default)]
    pub image_map: BTreeMap<String, Value>,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub cycle_interval: Option<u64>,
}

pub(crate) const NAME_PLACEHOLDER: &str = "Anonymous";

impl ProfileConfig {
    /// Stylized name, then localized name, then the raw name, then a
    /// placeholder.
    pub fn display_name(&self, language: &str) -> String {
        translation_text(&self.locales, language, "localized_name_stylized")
            .or_else(|| translation_text(&self.locales, language, "localized_name"))
            .or_else(|| Some(self.name.trim().to_owned()).filter(|name| !name.is_empty()))
            .unwrap_or_else(|| NAME_PLACEHOLDER.to_owned())
    }

    pub fn roles(&self, language: &str) -> Vec<String> {
        translation(&self.locales, language, "roles")
            .and_then(Value::as_array)
            .map(|roles| {
                roles
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn optional_scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(scalar_to_string))
}

fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_scalar_string(deserializer)?.unwrap_or_default())
}
