use serde_json::Value;

use super::{translation_text, ArticleConfig, CategoryConfig, ItemConfig};

const DEFAULT_CHART_HEIGHT: u64 = 400;

/// Read-only view over one [`ArticleConfig`] with normalized accessors.
#[derive(Debug, Clone)]
pub struct ArticleDataWrapper<'a> {
    config: &'a ArticleConfig,
    unique_id: String,
    language: &'a str,
}

impl<'a> ArticleDataWrapper<'a> {
    pub fn new(config: &'a ArticleConfig, unique_id: String, language: &'a str) -> Self {
        Self {
            config,
            unique_id,
            language,
        }
    }

    pub fn component(&self) -> &'a str {
        &self.config.component
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn language(&self) -> &'a str {
        self.language
    }

    pub fn categories(&self) -> &'a [CategoryConfig] {
        &self.config.categories
    }

    /// Localized text for `key` in the active language.
    pub fn locale(&self, key: &str) -> Option<String> {
        translation_text(&self.config.locales, self.language, key)
    }

    /// Items in declaration order, optionally restricted to one category.
    pub fn ordered_items_filtered_by(&self, category_id: Option<&str>) -> Vec<&'a ItemConfig> {
        self.config
            .items
            .iter()
            .filter(|item| match category_id {
                Some(wanted) => item.category_id.as_deref() == Some(wanted),
                None => true,
            })
            .collect()
    }

    pub fn setting(&self, key: &str) -> Option<&'a Value> {
        self.config.settings.get(key).filter(|value| !value.is_null())
    }

    pub fn setting_str(&self, key: &str) -> Option<&'a str> {
        self.setting(key)
            .and_then(Value::as_str)
            .filter(|text| !text.is_empty())
    }

    /// Only an explicit `false` disables a toggle.
    pub fn setting_bool(&self, key: &str, default: bool) -> bool {
        match self.setting(key) {
            Some(Value::Bool(flag)) => *flag,
            _ => default,
        }
    }

    /// Positive integer setting; zero, negative and non-numeric values fall
    /// back to `default`. Numeric strings are accepted.
    pub fn setting_u64(&self, key: &str, default: u64) -> u64 {
        let parsed = match self.setting(key) {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        parsed.filter(|&value| value > 0).unwrap_or(default)
    }

    pub fn setting_i32(&self, key: &str) -> Option<i32> {
        match self.setting(key)? {
            Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn chart_settings(&self) -> ChartSettings {
        ChartSettings {
            kind: ChartKind::from_setting(self.setting_str("chartType")),
            height: self.setting_u64("chartHeight", DEFAULT_CHART_HEIGHT),
            show_grid: self.setting_bool("showGrid", true),
            show_legend: self.setting_bool("showLegend", true),
            show_tooltip: self.setting_bool("showTooltip", true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
    Area,
    Pie,
}

impl ChartKind {
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("line") => ChartKind::Line,
            Some("area") => ChartKind::Area,
            Some("pie") => ChartKind::Pie,
            _ => ChartKind::Bar,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Area => "area",
            ChartKind::Pie => "pie",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSettings {
    pub kind: ChartKind,
    pub height: u64,
    pub show_grid: bool,
    pub show_legend: bool,
    pub show_tooltip: bool,
}
