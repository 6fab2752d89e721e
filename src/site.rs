//! Page assembly: the profile card followed by every section, each section
//! rendered article by article through the registry.

use std::path::PathBuf;

use crate::api::ApiClient;
use crate::articles::{ArticleContext, ChatStore, FormInput};
use crate::avatar::{self, DEFAULT_AVATAR};
use crate::content::{ProfileConfig, SectionConfig, SiteContent, DEFAULT_LANGUAGE};
use crate::registry::ArticleRegistry;
use crate::section::SectionContext;
use crate::templates::{
    render_template, NotFoundBody, PageShell, ProfileCard, RoleEntry, SectionShell,
};

const MAX_ANIMATED_ROLES: usize = 2;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub language: String,
    /// Disables avatar cycling and collapses long role lists.
    pub suspend_animations: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_owned(),
            suspend_animations: false,
        }
    }
}

/// Long-lived collaborators shared by every render.
#[derive(Debug, Clone)]
pub struct RenderServices {
    pub api: ApiClient,
    pub chats: ChatStore,
    pub options: RenderOptions,
    /// Root that descriptor documents referenced by articles resolve against.
    pub content_dir: PathBuf,
}

/// Renders one section. `interaction` names the article a submitted form is
/// aimed at; every other article renders in its initial state.
///
/// Articles that write the [`SectionContext`] render first, in document
/// order, so every article observes the section's final shared values
/// wherever it sits. The output keeps document order.
pub async fn render_section(
    section: &SectionConfig,
    services: &RenderServices,
    registry: &ArticleRegistry,
    interaction: Option<(usize, &FormInput)>,
) -> String {
    let language = services.options.language.as_str();
    let context = SectionContext::default();
    let wrappers = section.article_wrappers(language);
    let renderers: Vec<_> = wrappers
        .iter()
        .map(|wrapper| registry.resolve(wrapper.component()))
        .collect();

    let (writers, readers): (Vec<usize>, Vec<usize>) =
        (0..wrappers.len()).partition(|&index| renderers[index].writes_section_context());

    let mut articles = vec![String::new(); wrappers.len()];
    for index in writers.into_iter().chain(readers) {
        let renderer = &renderers[index];
        tracing::debug!(component = renderer.name(), index, "rendering article");
        let input = interaction.and_then(|(target, input)| (target == index).then_some(input));
        let cx = ArticleContext {
            article: &wrappers[index],
            section: &context,
            services,
            section_id: &section.id,
            index,
            input,
        };
        articles[index] = renderer.render(&cx).await;
    }

    let title = section.title(language);
    render_template(&SectionShell {
        id: &section.id,
        title: title.as_deref(),
        articles,
    })
}

/// Profile header. `current_avatar` is the image the cycler currently points
/// at; without one the first configured source is used.
pub fn render_profile(
    profile: &ProfileConfig,
    options: &RenderOptions,
    current_avatar: Option<&str>,
) -> String {
    let language = options.language.as_str();
    let sources = avatar::profile_sources(profile);
    let avatar = current_avatar
        .map(str::to_owned)
        .or_else(|| sources.first().cloned())
        .unwrap_or_else(|| DEFAULT_AVATAR.to_owned());

    let mut roles = profile.roles(language);
    if options.suspend_animations && roles.len() > MAX_ANIMATED_ROLES {
        roles.truncate(1);
    }
    let roles = roles
        .into_iter()
        .map(|role| {
            let image = avatar::find_image_for_word(&role, &sources, &profile.image_map);
            let fallbacks = avatar::fallback_chain(Some(&role), image.as_deref()).join(" ");
            RoleEntry {
                image: image.unwrap_or_default(),
                fallbacks,
                text: role,
            }
        })
        .collect();

    render_template(&ProfileCard {
        avatar: &avatar,
        sources: &serde_json::to_string(&sources).unwrap_or_default(),
        cycling: !options.suspend_animations && sources.len() > 1,
        name: &profile.display_name(language),
        roles,
    })
}

fn page_shell(title: &str, language: &str, body: &str) -> String {
    render_template(&PageShell {
        title,
        language,
        body,
    })
}

pub async fn render_page(
    content: &SiteContent,
    services: &RenderServices,
    registry: &ArticleRegistry,
    current_avatar: Option<&str>,
) -> String {
    let options = &services.options;
    let mut body = String::new();
    let title = match &content.profile {
        Some(profile) => {
            body.push_str(&render_profile(profile, options, current_avatar));
            profile.display_name(&options.language)
        }
        None => "Portfolio".to_owned(),
    };

    body.push_str("<main>");
    for section in &content.sections {
        body.push_str(&render_section(section, services, registry, None).await);
    }
    body.push_str("</main>");

    page_shell(&title, &options.language, &body)
}

/// Page for a single section, optionally applying a form submission.
pub async fn render_section_page(
    section: &SectionConfig,
    services: &RenderServices,
    registry: &ArticleRegistry,
    interaction: Option<(usize, &FormInput)>,
) -> String {
    let language = services.options.language.as_str();
    let title = section.title(language).unwrap_or_else(|| section.id.clone());
    let body = render_section(section, services, registry, interaction).await;
    page_shell(&title, language, &format!(r#"<main>{body}<p><a href="/">Back</a></p></main>"#))
}

pub fn render_not_found(path: &str) -> String {
    page_shell("Not found", DEFAULT_LANGUAGE, &render_template(&NotFoundBody { path }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::articles::testing::services;
    use serde_json::json;

    fn content() -> SiteContent {
        SiteContent::from_json(
            &json!({
                "profile": {
                    "name": "Ada",
                    "locales": { "en": {
                        "localized_name_stylized": "Ada L.",
                        "roles": ["Researcher", "Engineer", "Writer"]
                    }},
                    "profilePictureUrl": ["public/images/a.png", "/images/b.png"]
                },
                "sections": [{
                    "id": "skills",
                    "locales": { "en": { "title": "Skills" } },
                    "articles": [
                        { "component": "ArticleDateRange", "settings": { "default_start": 2021, "default_end": 2021 } },
                        { "component": "ArticleChart", "items": [{ "id": 1, "label": "Rust", "percentage": 90 }] },
                        { "component": "ArticleCards" }
                    ]
                }]
            })
            .to_string(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn later_articles_see_section_range() {
        let content = content();
        let services = services("http://127.0.0.1:9");
        let registry = ArticleRegistry::with_builtin();

        let html = render_section(&content.sections[0], &services, &registry, None).await;
        assert!(html.contains(r#"<h2 class="section-title">Skills</h2>"#));
        assert!(html.contains("2021-01-01 – 2021-12-31"));
        assert!(html.contains("<code>ArticleCards</code>"));

        let chart = html.find("article-chart").unwrap();
        let range = html.find("article-date-range").unwrap();
        assert!(range < chart);
    }

    #[tokio::test]
    async fn earlier_articles_see_range_written_below_them() {
        let content = SiteContent::from_json(
            &json!({
                "sections": [{
                    "id": "flux",
                    "articles": [
                        { "component": "ArticleChart", "items": [{ "id": 1, "label": "Storm", "dateStart": "2021-06-01" }] },
                        { "component": "ArticleDateRange", "settings": { "default_start": 2020, "default_end": 2020 } }
                    ]
                }]
            })
            .to_string(),
        )
        .unwrap();
        let services = services("http://127.0.0.1:9");
        let registry = ArticleRegistry::with_builtin();
        let input = FormInput::from_pairs([("start", "2021-05-01"), ("end", "2021-07-01")]);

        let html =
            render_section(&content.sections[0], &services, &registry, Some((1, &input))).await;
        let chart_at = html.find("article-chart").unwrap();
        let range_at = html.find("article-date-range").unwrap();
        assert!(chart_at < range_at);

        let chart = &html[chart_at..range_at];
        assert!(chart.contains("2021-05-01 – 2021-07-01"));
        assert!(chart.contains(r#"<tr data-id="1" data-in-range="true">"#));

        let initial = render_section(&content.sections[0], &services, &registry, None).await;
        assert!(initial.contains(r#"data-in-range="false""#));
    }

    #[tokio::test]
    async fn interaction_only_reaches_target_article() {
        let content = content();
        let services = services("http://127.0.0.1:9");
        let registry = ArticleRegistry::with_builtin();
        let input = FormInput::from_pairs([("start", "2022-02-01"), ("end", "2022-02-10")]);

        let targeted =
            render_section(&content.sections[0], &services, &registry, Some((0, &input))).await;
        assert!(targeted.contains("2022-02-01 – 2022-02-10"));

        let elsewhere =
            render_section(&content.sections[0], &services, &registry, Some((1, &input))).await;
        assert!(elsewhere.contains("2021-01-01 – 2021-12-31"));
    }

    #[test]
    fn profile_card_collapses_roles_when_suspended() {
        let content = content();
        let profile = content.profile.as_ref().unwrap();

        let animated = render_profile(profile, &RenderOptions::default(), None);
        assert!(animated.contains("Ada L."));
        assert!(animated.contains(r#"a.png" alt="""#));
        assert!(animated.contains(r#"data-cycling="true""#));
        assert_eq!(animated.matches("<li ").count(), 3);

        let options = RenderOptions {
            suspend_animations: true,
            ..RenderOptions::default()
        };
        let still = render_profile(profile, &options, Some("/images/b.png"));
        assert!(still.contains(r#"b.png" alt="""#));
        assert!(still.contains(r#"data-cycling="false""#));
        assert_eq!(still.matches("<li ").count(), 1);
        assert!(still.contains(">Researcher</li>"));
    }

    #[tokio::test]
    async fn page_includes_profile_and_sections() {
        let content = content();
        let services = services("http://127.0.0.1:9");
        let registry = ArticleRegistry::with_builtin();
        let html = render_page(&content, &services, &registry, None).await;
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Ada L.</title>"));
        assert!(html.contains(r#"<section id="skills""#));
    }
}
