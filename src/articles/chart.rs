use std::fmt::Write;

use async_trait::async_trait;
use chrono::NaiveTime;
use serde::Serialize;

use super::{article_frame, ArticleContext};
use crate::content::{translation_text, ChartKind, ItemConfig};
use crate::registry::Renderer;
use crate::util::{escape_html, strip_html_tags, truncate_label};

const AXIS_LABEL_MAX: usize = 10;

/// Data view of an article's items. Drawing is left to the browser; the
/// server emits a table plus a `data-chart` payload.
pub struct ChartArticle;

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ChartPoint {
    pub name: String,
    pub value: f64,
    pub id: String,
}

fn chart_points(items: &[&ItemConfig], language: &str) -> Vec<ChartPoint> {
    items.iter().map(|item| chart_point(item, language)).collect()
}

fn chart_point(item: &ItemConfig, language: &str) -> ChartPoint {
    let id = item.id.clone().unwrap_or_default();
    let name = translation_text(&item.locales, language, "label")
        .or_else(|| translation_text(&item.locales, language, "title"))
        .or_else(|| item.label.clone().filter(|label| !label.is_empty()))
        .unwrap_or_else(|| format!("Item {id}"));

    let value = item
        .percentage
        .or_else(|| {
            item.date_start()
                .map(|day| day.and_time(NaiveTime::MIN).and_utc().timestamp_millis() as f64)
        })
        .or_else(|| id.parse::<f64>().ok())
        .unwrap_or(0.0);

    ChartPoint {
        name: strip_html_tags(&name),
        value,
        id,
    }
}

#[async_trait]
impl Renderer for ChartArticle {
    fn name(&self) -> &'static str {
        "ArticleChart"
    }

    async fn render(&self, cx: &ArticleContext<'_>) -> String {
        let article = cx.article;
        let category = cx.input_value("category").filter(|c| !c.is_empty());
        let settings = article.chart_settings();
        let items = article.ordered_items_filtered_by(category);
        let points = chart_points(&items, article.language());
        let range = cx.section.date_range.value();

        let mut body = String::new();
        body.push_str(&category_filter(cx, category));

        if let Some(range) = range {
            let _ = write!(
                body,
                r#"<p class="article-chart-range">{} – {}</p>"#,
                range.start.format("%Y-%m-%d"),
                range.end.format("%Y-%m-%d"),
            );
        }

        if points.is_empty() {
            body.push_str(r#"<div class="article-chart-empty">No data available for chart</div>"#);
            return article_frame(cx, "article-chart", article.locale("title").as_deref(), &body);
        }

        let payload = serde_json::to_string(&points).unwrap_or_else(|_| "[]".to_owned());
        let _ = write!(
            body,
            r#"<figure class="article-chart-items chart-{}" data-chart="{}" data-height="{}" data-grid="{}" data-legend="{}" data-tooltip="{}">"#,
            settings.kind.as_str(),
            escape_html(&payload),
            settings.height,
            settings.show_grid,
            settings.show_legend,
            settings.show_tooltip,
        );
        body.push_str(r#"<table class="article-chart-table"><tbody>"#);

        let total: f64 = points.iter().map(|p| p.value).sum();
        for (item, point) in items.iter().zip(&points) {
            let label = if settings.kind == ChartKind::Pie {
                truncate_label(&point.name, usize::MAX)
            } else {
                truncate_label(&point.name, AXIS_LABEL_MAX)
            };
            let in_range = match (range, item.date_start()) {
                (Some(range), Some(day)) => format!(r#" data-in-range="{}""#, range.contains(day)),
                _ => String::new(),
            };
            let _ = write!(
                body,
                r#"<tr data-id="{}"{in_range}><th title="{}">{}</th><td>{}</td>"#,
                escape_html(&point.id),
                escape_html(&point.name),
                escape_html(&label),
                point.value,
            );
            if settings.kind == ChartKind::Pie && total > 0.0 {
                let _ = write!(body, "<td>{:.0}%</td>", point.value / total * 100.0);
            }
            body.push_str("</tr>");
        }
        body.push_str("</tbody></table></figure>");

        article_frame(cx, "article-chart", article.locale("title").as_deref(), &body)
    }
}

fn category_filter(cx: &ArticleContext<'_>, selected: Option<&str>) -> String {
    let categories = cx.article.categories();
    if categories.is_empty() {
        return String::new();
    }

    let mut html = String::new();
    let _ = write!(
        html,
        r#"<form class="article-chart-filter" method="post" action="{}">"#,
        cx.action_url()
    );
    let all_class = if selected.is_none() { " active" } else { "" };
    let _ = write!(
        html,
        r#"<button type="submit" name="category" value="" class="filter{all_class}">All</button>"#
    );
    for category in categories {
        let label = translation_text(&category.locales, cx.article.language(), "title")
            .unwrap_or_else(|| category.id.clone());
        let active = if selected == Some(category.id.as_str()) { " active" } else { "" };
        let _ = write!(
            html,
            r#"<button type="submit" name="category" value="{}" class="filter{active}">{}</button>"#,
            escape_html(&category.id),
            escape_html(&label),
        );
    }
    html.push_str("</form>");
    html
}
