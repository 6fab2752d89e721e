use std::fmt::Write;

use async_trait::async_trait;
use serde_json::Value;

use super::{article_frame, error_paragraph, ArticleContext};
use crate::registry::Renderer;
use crate::util::escape_html;

const DEFAULT_TITLE: &str = "Solar Flux Prediction";

/// One-button widget showing the backend's latest prediction.
pub struct LatestPredictionArticle;

fn describe(payload: &Value) -> String {
    let value = payload
        .get("predictedValue")
        .and_then(Value::as_f64)
        .map(|v| format!("{v:.3}"))
        .unwrap_or_else(|| "N/A".to_owned());
    let version = match payload.get("modelVersion") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "N/A".to_owned(),
    };
    format!(
        r#"<div class="prediction-result"><p><strong>Predicted Value:</strong> {value}</p><p><strong>Model Version:</strong> {}</p></div>"#,
        escape_html(&version)
    )
}

#[async_trait]
impl Renderer for LatestPredictionArticle {
    fn name(&self) -> &'static str {
        "ArticleCustom"
    }

    async fn render(&self, cx: &ArticleContext<'_>) -> String {
        let title = cx
            .article
            .locale("title")
            .unwrap_or_else(|| DEFAULT_TITLE.to_owned());

        let mut body = String::new();
        let _ = write!(
            body,
            r#"<div class="article-custom-content"><h3 class="article-custom-title">{}</h3><form class="prediction-widget" method="post" action="{}"><button type="submit" name="predict" value="latest">Predict F10.7 (Latest Data)</button></form>"#,
            escape_html(&title),
            cx.action_url(),
        );

        if cx.input.is_some() {
            match cx
                .services
                .api
                .get_latest_prediction()
                .await
                .into_result("Failed to fetch prediction")
            {
                Ok(payload) => body.push_str(&describe(&payload)),
                Err(message) => body.push_str(&error_paragraph("prediction-error", &message)),
            }
        }
        body.push_str("</div>");

        article_frame(cx, "article-custom", None, &body)
    }
}
