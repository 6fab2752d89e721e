//! String-keyed dispatch from an article's `component` name to its renderer.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::articles::{
    ArticleContext, ChartArticle, ChatBoxArticle, DateRangeArticle, ForecastParamsArticle,
    LatestPredictionArticle, NotFoundArticle, PredictionArticle,
};

/// Produces the HTML for one article.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Component name this renderer implements.
    fn name(&self) -> &'static str;

    /// Whether rendering writes to the shared section context. Such
    /// articles render ahead of their siblings.
    fn writes_section_context(&self) -> bool {
        false
    }

    async fn render(&self, cx: &ArticleContext<'_>) -> String;
}

pub type RendererCtor = fn() -> Box<dyn Renderer>;

/// Lookup table from component names to renderer constructors.
///
/// Resolution is total: names that are not registered (matching is exact and
/// case-sensitive) resolve to [`NotFoundArticle`].
pub struct ArticleRegistry {
    entries: HashMap<&'static str, RendererCtor>,
}

impl ArticleRegistry {
    /// A registry that only knows the fallback.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register("ArticleChart", || Box::new(ChartArticle));
        registry.register("ArticleDateRange", || Box::new(DateRangeArticle));
        registry.register("ArticleChatBox", || Box::new(ChatBoxArticle));
        registry.register("ArticlePrediction", || Box::new(PredictionArticle));
        registry.register("ArticleCustom", || Box::new(LatestPredictionArticle));
        registry.register("ArticleForecastParams", || Box::new(ForecastParamsArticle));
        registry.register("ArticleNotFound", || Box::new(NotFoundArticle));
        registry
    }

    pub fn register(&mut self, name: &'static str, ctor: RendererCtor) {
        if self.entries.insert(name, ctor).is_some() {
            tracing::debug!("replaced renderer registered as `{name}`");
        }
    }

    pub fn resolve(&self, name: &str) -> Box<dyn Renderer> {
        match self.entries.get(name) {
            Some(ctor) => ctor(),
            None => {
                tracing::debug!("no renderer for component `{name}`; using fallback");
                Box::new(NotFoundArticle)
            }
        }
    }
}

impl Default for ArticleRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_registered_names() {
        let registry = ArticleRegistry::with_builtin();
        for name in [
            "ArticleChart",
            "ArticleDateRange",
            "ArticleChatBox",
            "ArticlePrediction",
            "ArticleCustom",
            "ArticleForecastParams",
        ] {
            assert_eq!(registry.resolve(name).name(), name);
        }
    }

    #[test]
    fn unknown_names_fall_back() {
        let registry = ArticleRegistry::with_builtin();
        for name in ["articlechart", "ArticleChart ", "", "ArticleCards", "<script>"] {
            assert_eq!(registry.resolve(name).name(), "ArticleNotFound");
        }
    }

    #[test]
    fn empty_registry_is_still_total() {
        assert_eq!(ArticleRegistry::empty().resolve("ArticleChart").name(), "ArticleNotFound");
    }

    #[test]
    fn registrations_can_be_replaced() {
        let mut registry = ArticleRegistry::empty();
        registry.register("Widget", || Box::new(ChartArticle));
        registry.register("Widget", || Box::new(ChatBoxArticle));
        assert_eq!(registry.resolve("Widget").name(), "ArticleChatBox");
    }
}
