use std::fmt::Write;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{article_frame, error_paragraph, ArticleContext, FormInput};
use crate::content::{value_text, FieldKind, FormField, FormSpec};
use crate::registry::Renderer;
use crate::util::escape_html;

const DEFAULT_FORM_PATH: &str = "data/sections/f10-params.json";

/// Form built from a field-descriptor document; submissions are forwarded to
/// the forecast endpoint.
pub struct ForecastParamsArticle;

/// Form state after applying a submission on top of the descriptor defaults.
fn collect_values(form: &FormSpec, input: &FormInput) -> Map<String, Value> {
    let mut values = form.initial_values();
    for field in &form.articles {
        match field.kind() {
            FieldKind::CheckboxGroup => {
                let checked = input
                    .get_all(&field.name)
                    .into_iter()
                    .map(|v| Value::String(v.to_owned()))
                    .collect();
                values.insert(field.name.clone(), Value::Array(checked));
            }
            FieldKind::Slider => {
                if let Some(raw) = input.get(&field.name) {
                    let value = raw
                        .trim()
                        .parse::<f64>()
                        .ok()
                        .and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                        .unwrap_or_else(|| Value::String(raw.to_owned()));
                    values.insert(field.name.clone(), value);
                }
            }
            FieldKind::Select | FieldKind::RadioGroup => {
                if let Some(raw) = input.get(&field.name) {
                    values.insert(field.name.clone(), Value::String(raw.to_owned()));
                }
            }
            FieldKind::Unknown => {}
        }
    }
    values
}

fn is_selected(current: Option<&Value>, option: &Value) -> bool {
    let option = value_text(option);
    match current {
        Some(Value::Array(items)) => items.iter().any(|item| value_text(item) == option),
        Some(value) => value_text(value) == option,
        None => false,
    }
}

fn render_field(field: &FormField, current: Option<&Value>) -> String {
    let name = escape_html(&field.name);
    let label = escape_html(&field.label);
    let mut html = String::from(r#"<div class="article-forecast-params-item">"#);

    match field.kind() {
        FieldKind::Slider => {
            let value = current.map(value_text).unwrap_or_default();
            let unit = field
                .unit
                .as_deref()
                .map(|u| format!(" ({})", escape_html(u)))
                .unwrap_or_default();
            let bound = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
            let _ = write!(
                html,
                r#"<div class="form-group form-group-slider"><label for="{name}">{label}{unit}</label><div class="slider-wrapper"><input type="range" id="{name}" name="{name}" min="{}" max="{}" step="{}" value="{}"><span class="slider-value">{}</span></div>"#,
                bound(field.min),
                bound(field.max),
                bound(field.step),
                escape_html(&value),
                escape_html(&value),
            );
        }
        FieldKind::Select => {
            let _ = write!(
                html,
                r#"<div class="form-group form-group-select"><label for="{name}">{label}</label><select id="{name}" name="{name}">"#
            );
            for option in &field.options {
                let selected = if is_selected(current, &option.value) { " selected" } else { "" };
                let _ = write!(
                    html,
                    r#"<option value="{}"{selected}>{}</option>"#,
                    escape_html(&value_text(&option.value)),
                    escape_html(&option.label),
                );
            }
            html.push_str("</select>");
        }
        kind @ (FieldKind::CheckboxGroup | FieldKind::RadioGroup) => {
            let (group, input_type) = if kind == FieldKind::CheckboxGroup {
                ("checkbox", "checkbox")
            } else {
                ("radio", "radio")
            };
            let _ = write!(
                html,
                r#"<div class="form-group form-group-{group}"><fieldset><legend>{label}</legend>"#
            );
            for option in &field.options {
                let checked = if is_selected(current, &option.value) { " checked" } else { "" };
                let _ = write!(
                    html,
                    r#"<label class="{group}-label"><input type="{input_type}" name="{name}" value="{}"{checked}>{}</label>"#,
                    escape_html(&value_text(&option.value)),
                    escape_html(&option.label),
                );
            }
            html.push_str("</fieldset>");
        }
        FieldKind::Unknown => {
            let _ = write!(
                html,
                r#"<div class="form-group"><p><strong>Error:</strong> Unknown field type: {}</p></div></div>"#,
                escape_html(&field.field_type),
            );
            return html;
        }
    }

    if let Some(help) = field.help_text.as_deref() {
        let _ = write!(html, r#"<small class="help-text">{}</small>"#, escape_html(help));
    }
    html.push_str("</div></div>");
    html
}

#[async_trait]
impl Renderer for ForecastParamsArticle {
    fn name(&self) -> &'static str {
        "ArticleForecastParams"
    }

    async fn render(&self, cx: &ArticleContext<'_>) -> String {
        let title = cx.article.locale("title");
        let path = cx
            .services
            .content_dir
            .join(cx.article.setting_str("form").unwrap_or(DEFAULT_FORM_PATH));

        let form = match FormSpec::load(&path).await {
            Ok(form) => form,
            Err(err) => {
                tracing::warn!("forecast form unavailable: {err:#}");
                let message = format!("Failed to fetch form data: {err}");
                let body = error_paragraph("error-message", &message);
                return article_frame(cx, "article-forecast-params", title.as_deref(), &body);
            }
        };

        let values = match cx.input {
            Some(input) if !input.is_empty() => collect_values(&form, input),
            _ => form.initial_values(),
        };

        let mut body = String::new();
        let _ = write!(
            body,
            r#"<form class="article-forecast-params-form" method="post" action="{}">"#,
            cx.action_url()
        );
        for field in &form.articles {
            body.push_str(&render_field(field, values.get(&field.name)));
        }
        body.push_str(r#"<button type="submit" class="submit-button">Run Forecast</button></form>"#);

        if cx.input.is_some_and(|input| !input.is_empty()) {
            let params = Value::Object(values);
            tracing::info!("submitting forecast parameters");
            match cx
                .services
                .api
                .run_forecast(&params)
                .await
                .into_result("Failed to run forecast")
            {
                Ok(result) => {
                    let pretty = serde_json::to_string_pretty(&result)
                        .unwrap_or_else(|_| result.to_string());
                    let _ = write!(
                        body,
                        r#"<div class="forecast-result"><h4>Forecast Result</h4><pre>{}</pre></div>"#,
                        escape_html(&pretty)
                    );
                }
                Err(message) => body.push_str(&error_paragraph("error-message", &message)),
            }
        }

        article_frame(cx, "article-forecast-params", title.as_deref(), &body)
    }
}
