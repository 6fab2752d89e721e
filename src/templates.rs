//! Askama shells around the hand-assembled article bodies. Every `{{ }}`
//! value is HTML-escaped; `body` and `articles` are already rendered markup.

use askama::Template;

#[derive(Template)]
#[template(path = "page.html")]
pub struct PageShell<'a> {
    pub title: &'a str,
    pub language: &'a str,
    pub body: &'a str,
}

#[derive(Template)]
#[template(path = "section.html")]
pub struct SectionShell<'a> {
    pub id: &'a str,
    pub title: Option<&'a str>,
    pub articles: Vec<String>,
}

#[derive(Template)]
#[template(path = "article.html")]
pub struct ArticleShell<'a> {
    pub id: &'a str,
    pub class: &'a str,
    pub component: &'a str,
    pub title: Option<&'a str>,
    pub body: &'a str,
}

pub struct RoleEntry {
    pub text: String,
    pub image: String,
    pub fallbacks: String,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileCard<'a> {
    pub avatar: &'a str,
    /// JSON array of every avatar source.
    pub sources: &'a str,
    pub cycling: bool,
    pub name: &'a str,
    pub roles: Vec<RoleEntry>,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundBody<'a> {
    pub path: &'a str,
}

/// Renders `template`, falling back to an inline notice when it fails.
pub fn render_template(template: &impl Template) -> String {
    template.render().unwrap_or_else(|err| {
        tracing::error!("template rendering failed: {err}");
        format!("Template error: {err}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_are_escaped_but_bodies_are_not() {
        let html = render_template(&ArticleShell {
            id: "s-0",
            class: "article-chart",
            component: "<Chart>",
            title: Some("Tom & Jerry"),
            body: "<p>kept</p>",
        });
        assert!(html.starts_with(r#"<article id="s-0" class="article article-chart""#));
        assert!(html.contains(r#"data-component="&lt;Chart&gt;""#));
        assert!(html.contains(r#"<h3 class="article-title">Tom &amp; Jerry</h3><p>kept</p></article>"#));
    }

    #[test]
    fn section_without_title_has_no_heading() {
        let html = render_template(&SectionShell {
            id: "about",
            title: None,
            articles: vec!["<article></article>".to_owned(); 2],
        });
        assert!(!html.contains("<h2"));
        assert!(html.contains(r#"<section id="about" class="section"><article></article><article></article></section>"#));
    }
}
