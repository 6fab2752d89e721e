//! Article renderers. Each one turns an [`ArticleDataWrapper`] into an HTML
//! fragment, optionally applying a form interaction aimed at it.

mod chart;
mod chat_box;
mod date_range;
mod forecast_params;
mod latest;
mod not_found;
mod prediction;

use serde::Deserialize;

use crate::content::ArticleDataWrapper;
use crate::section::SectionContext;
use crate::site::RenderServices;
use crate::templates::{render_template, ArticleShell};
use crate::util::escape_html;

pub use chart::ChartArticle;
pub use chat_box::{ChatBoxArticle, ChatStore};
pub use date_range::DateRangeArticle;
pub use forecast_params::ForecastParamsArticle;
pub use latest::LatestPredictionArticle;
pub use not_found::NotFoundArticle;
pub use prediction::{validate_prediction_input, PredictionArticle};

/// Everything a renderer may read while producing one article.
pub struct ArticleContext<'a> {
    pub article: &'a ArticleDataWrapper<'a>,
    pub section: &'a SectionContext,
    pub services: &'a RenderServices,
    pub section_id: &'a str,
    pub index: usize,
    /// Form fields submitted to this article, if the request targets it.
    pub input: Option<&'a FormInput>,
}

impl ArticleContext<'_> {
    /// Endpoint that article forms post back to.
    pub fn action_url(&self) -> String {
        format!("/sections/{}/articles/{}", self.section_id, self.index)
    }

    pub fn input_value(&self, name: &str) -> Option<&str> {
        self.input.and_then(|input| input.get(name))
    }
}

/// URL-encoded form body, keeping repeated keys in submission order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct FormInput(Vec<(String, String)>);

impl FormInput {
    #[cfg(test)]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// First value submitted for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Wraps an article body in the common `<article>` frame with its title.
pub(crate) fn article_frame(
    cx: &ArticleContext<'_>,
    class: &str,
    title: Option<&str>,
    body: &str,
) -> String {
    render_template(&ArticleShell {
        id: cx.article.unique_id(),
        class,
        component: cx.article.component(),
        title: title.filter(|t| !t.is_empty()),
        body,
    })
}

pub(crate) fn error_paragraph(class: &str, message: &str) -> String {
    format!(r#"<p class="{class}">{}</p>"#, escape_html(message))
}
