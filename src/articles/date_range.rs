use std::fmt::Write;

use async_trait::async_trait;
use chrono::{Datelike, Days, Local, Months, NaiveDate};

use super::{article_frame, ArticleContext};
use crate::registry::Renderer;
use crate::section::DateRange;
use crate::util::escape_html;

const DATE_FORMAT: &str = "%Y-%m-%d";
const INPUT_RANGE_LABELS: [&str; 2] = ["days up to today", "days starting today"];

pub struct DateRangeArticle;

/// Preset ranges relative to `today`. Weeks start on Sunday.
pub fn static_ranges(today: NaiveDate) -> Vec<(&'static str, DateRange)> {
    let yesterday = today.pred_opt().unwrap_or(today);
    let week_start = today - Days::new(u64::from(today.weekday().num_days_from_sunday()));
    let last_week_start = week_start - Days::new(7);
    let month_start = today.with_day(1).unwrap_or(today);
    let month_end = (month_start + Months::new(1)).pred_opt().unwrap_or(today);
    let last_month_start = month_start - Months::new(1);
    let last_month_end = month_start.pred_opt().unwrap_or(month_start);

    vec![
        ("Today", DateRange::new(today, today)),
        ("Yesterday", DateRange::new(yesterday, yesterday)),
        ("This Week", DateRange::new(week_start, week_start + Days::new(6))),
        ("Last Week", DateRange::new(last_week_start, last_week_start + Days::new(6))),
        ("This Month", DateRange::new(month_start, month_end)),
        ("Last Month", DateRange::new(last_month_start, last_month_end)),
    ]
}

/// Range for the `index`-th numeric preset. Anything that is not a positive
/// integer counts as one day, and so does a span past the calendar's limits.
pub fn input_range(index: usize, value: &str, today: NaiveDate) -> Option<DateRange> {
    let days = value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|days| *days >= 1)
        .unwrap_or(1);
    let span = Days::new(days - 1);
    let range = match index {
        0 => today.checked_sub_days(span).map(|start| DateRange::new(start, today)),
        1 => today.checked_add_days(span).map(|end| DateRange::new(today, end)),
        _ => return None,
    };
    Some(range.unwrap_or_else(|| {
        tracing::debug!("input range of {days} days is out of bounds; using one day");
        DateRange::new(today, today)
    }))
}

fn initial_range(cx: &ArticleContext<'_>, current_year: i32) -> Option<DateRange> {
    let start = cx.article.setting_i32("default_start").unwrap_or(current_year);
    let end = cx.article.setting_i32("default_end").unwrap_or(current_year);
    Some(DateRange::new(
        NaiveDate::from_ymd_opt(start, 1, 1)?,
        NaiveDate::from_ymd_opt(end, 12, 31)?,
    ))
}

fn parse_day(value: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value?.trim(), DATE_FORMAT).ok()
}

/// Applies the submitted form, if any, on top of `initial`.
fn selected_range(
    cx: &ArticleContext<'_>,
    initial: Option<DateRange>,
    today: NaiveDate,
) -> Option<DateRange> {
    if cx.input.is_none() {
        return initial;
    }

    if let Some(label) = cx.input_value("preset") {
        if let Some((_, range)) = static_ranges(today).into_iter().find(|(l, _)| *l == label) {
            return Some(range);
        }
    }

    if let Some(index) = cx.input_value("input_range").and_then(|i| i.parse::<usize>().ok()) {
        let value = cx.input_value("input_value").unwrap_or("1");
        if let Some(range) = input_range(index, value, today) {
            return Some(range);
        }
    }

    match (parse_day(cx.input_value("start")), parse_day(cx.input_value("end"))) {
        (Some(start), Some(end)) if start <= end => Some(DateRange::new(start, end)),
        (Some(start), Some(end)) => Some(DateRange::new(end, start)),
        _ => initial,
    }
}

fn format_day(day: Option<NaiveDate>) -> String {
    day.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_owned())
}

#[async_trait]
impl Renderer for DateRangeArticle {
    fn name(&self) -> &'static str {
        "ArticleDateRange"
    }

    fn writes_section_context(&self) -> bool {
        true
    }

    async fn render(&self, cx: &ArticleContext<'_>) -> String {
        let today = Local::now().date_naive();
        let initial = initial_range(cx, today.year());
        let range = selected_range(cx, initial, today);
        if let Some(range) = range {
            cx.section.date_range.set_value(range);
        }

        let action = cx.action_url();
        let mut body = String::new();

        let _ = write!(body, r#"<form class="date-range-presets" method="post" action="{action}">"#);
        for (label, _) in static_ranges(today) {
            let _ = write!(
                body,
                r#"<button type="submit" name="preset" value="{label}">{label}</button>"#
            );
        }
        body.push_str("</form>");

        for (index, label) in INPUT_RANGE_LABELS.iter().enumerate() {
            let current = cx
                .input_value("input_range")
                .filter(|i| *i == index.to_string())
                .and_then(|_| cx.input_value("input_value"))
                .unwrap_or("1");
            let _ = write!(
                body,
                r#"<form class="date-range-input" method="post" action="{action}"><input type="hidden" name="input_range" value="{index}"><input type="number" min="1" name="input_value" value="{}"><button type="submit">{label}</button></form>"#,
                escape_html(current),
            );
        }

        let start = range.map(|r| r.start);
        let end = range.map(|r| r.end);
        let start_label = cx.article.locale("start_label").unwrap_or_default();
        let end_label = cx.article.locale("end_label").unwrap_or_default();
        let _ = write!(
            body,
            r#"<form class="date-range-calendar" method="post" action="{action}"><input type="date" name="start" value="{}"><input type="date" name="end" value="{}"><button type="submit">Apply</button></form>"#,
            start.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default(),
            end.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default(),
        );
        let _ = write!(
            body,
            r#"<div class="date-range-selected"><strong>{}:</strong> {} <br><strong>{}:</strong> {}</div>"#,
            escape_html(&start_label),
            format_day(start),
            escape_html(&end_label),
            format_day(end),
        );

        article_frame(cx, "article-date-range", cx.article.locale("title").as_deref(), &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::articles::testing::services;
    use crate::articles::FormInput;
    use crate::content::{ArticleConfig, ArticleDataWrapper};
    use crate::section::SectionContext;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn presets_around_a_wednesday() {
        let today = day(2024, 3, 13);
        let ranges = static_ranges(today);
        let get = |label| ranges.iter().find(|(l, _)| *l == label).unwrap().1;

        assert_eq!(get("Today"), DateRange::new(today, today));
        assert_eq!(get("Yesterday"), DateRange::new(day(2024, 3, 12), day(2024, 3, 12)));
        assert_eq!(get("This Week"), DateRange::new(day(2024, 3, 10), day(2024, 3, 16)));
        assert_eq!(get("Last Week"), DateRange::new(day(2024, 3, 3), day(2024, 3, 9)));
        assert_eq!(get("This Month"), DateRange::new(day(2024, 3, 1), day(2024, 3, 31)));
        assert_eq!(get("Last Month"), DateRange::new(day(2024, 2, 1), day(2024, 2, 29)));
    }

    #[test]
    fn numeric_presets() {
        let today = day(2024, 1, 10);
        assert_eq!(
            input_range(0, "3", today),
            Some(DateRange::new(day(2024, 1, 8), today))
        );
        assert_eq!(
            input_range(1, "3", today),
            Some(DateRange::new(today, day(2024, 1, 12)))
        );
        assert_eq!(input_range(0, "abc", today), Some(DateRange::new(today, today)));
        assert_eq!(input_range(1, "0", today), Some(DateRange::new(today, today)));
        assert_eq!(input_range(2, "3", today), None);
    }

    #[test]
    fn oversized_numeric_presets_fall_back_to_one_day() {
        let today = day(2024, 1, 10);
        let single = Some(DateRange::new(today, today));
        for value in ["99999999", "18446744073709551615", "99999999999999999999"] {
            assert_eq!(input_range(0, value, today), single, "{value}");
            assert_eq!(input_range(1, value, today), single, "{value}");
        }
    }

    #[tokio::test]
    async fn oversized_submission_still_renders() {
        let config = article(json!({}));
        let wrapper = ArticleDataWrapper::new(&config, "s-0".into(), "en");
        let services = services("http://127.0.0.1:9");
        let section = SectionContext::default();
        let input = FormInput::from_pairs([("input_range", "0"), ("input_value", "99999999")]);
        let cx = ArticleContext {
            article: &wrapper,
            section: &section,
            services: &services,
            section_id: "s",
            index: 0,
            input: Some(&input),
        };

        let html = DateRangeArticle.render(&cx).await;
        let today = Local::now().date_naive();
        assert!(html.contains("article-date-range"));
        assert_eq!(section.date_range.value(), Some(DateRange::new(today, today)));
    }

    fn article(settings: serde_json::Value) -> ArticleConfig {
        serde_json::from_value(json!({
            "component": "ArticleDateRange",
            "locales": { "en": { "title": "Window", "start_label": "From", "end_label": "To" } },
            "settings": settings
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn writes_configured_years_to_section() {
        let config = article(json!({ "default_start": 2020, "default_end": 2022 }));
        let wrapper = ArticleDataWrapper::new(&config, "s-0".into(), "en");
        let services = services("http://127.0.0.1:9");
        let section = SectionContext::default();
        let cx = ArticleContext {
            article: &wrapper,
            section: &section,
            services: &services,
            section_id: "s",
            index: 0,
            input: None,
        };

        let html = DateRangeArticle.render(&cx).await;
        assert_eq!(
            section.date_range.value(),
            Some(DateRange::new(day(2020, 1, 1), day(2022, 12, 31)))
        );
        assert!(html.contains("<strong>From:</strong> 2020-01-01"));
        assert!(html.contains("<strong>To:</strong> 2022-12-31"));
    }

    #[tokio::test]
    async fn explicit_dates_override_initial_range() {
        let config = article(json!({}));
        let wrapper = ArticleDataWrapper::new(&config, "s-0".into(), "en");
        let services = services("http://127.0.0.1:9");
        let section = SectionContext::default();
        let input = FormInput::from_pairs([("start", "2023-05-09"), ("end", "2023-05-01")]);
        let cx = ArticleContext {
            article: &wrapper,
            section: &section,
            services: &services,
            section_id: "s",
            index: 0,
            input: Some(&input),
        };

        DateRangeArticle.render(&cx).await;
        assert_eq!(
            section.date_range.value(),
            Some(DateRange::new(day(2023, 5, 1), day(2023, 5, 9)))
        );
    }
}
