use async_trait::async_trait;

use super::{article_frame, ArticleContext};
use crate::registry::Renderer;
use crate::util::escape_html;

/// Placeholder rendered for components nobody registered.
pub struct NotFoundArticle;

#[async_trait]
impl Renderer for NotFoundArticle {
    fn name(&self) -> &'static str {
        "ArticleNotFound"
    }

    async fn render(&self, cx: &ArticleContext<'_>) -> String {
        let body = format!(
            r#"<p class="article-not-found-text">Component <code>{}</code> not found.</p>"#,
            escape_html(cx.article.component())
        );
        article_frame(cx, "article-not-found", None, &body)
    }
}
