use std::fmt::Write;

use async_trait::async_trait;

use super::{article_frame, error_paragraph, ArticleContext};
use crate::error::ValidationError;
use crate::model::{model_short_name, ModelDescriptor, PredictionResult};
use crate::registry::Renderer;
use crate::util::escape_html;

pub struct PredictionArticle;

/// Checks the prediction form before anything is sent to the backend.
pub fn validate_prediction_input(
    model_id: Option<&str>,
    horizon: &str,
) -> Result<(String, u32), ValidationError> {
    let model_id = model_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(ValidationError::MissingSelection)?;
    let horizon = horizon.trim();
    if horizon.is_empty() {
        return Err(ValidationError::MissingSelection);
    }
    match horizon.parse::<u32>() {
        Ok(days) if days >= 1 => Ok((model_id.to_owned(), days)),
        _ => Err(ValidationError::InvalidHorizon),
    }
}

enum Outcome {
    Pending,
    Predicted(PredictionResult),
    Failed(String),
}

#[async_trait]
impl Renderer for PredictionArticle {
    fn name(&self) -> &'static str {
        "ArticlePrediction"
    }

    async fn render(&self, cx: &ArticleContext<'_>) -> String {
        let title = cx.article.locale("title");
        let models = match cx
            .services
            .api
            .get_models()
            .await
            .into_result("Failed to fetch models")
        {
            Ok(list) => list.models,
            Err(message) => {
                let body = error_paragraph("article-prediction-error", &message);
                return article_frame(cx, "article-prediction", title.as_deref(), &body);
            }
        };

        let selected = cx
            .input_value("modelId")
            .filter(|id| !id.is_empty())
            .or_else(|| models.first().map(|m| m.model_id.as_str()));
        let horizon = cx.input_value("horizonDays").unwrap_or_default();

        let outcome = if cx.input.is_some() {
            match validate_prediction_input(selected, horizon) {
                Ok((model_id, days)) => {
                    tracing::info!("requesting {days}-day prediction from `{model_id}`");
                    match cx
                        .services
                        .api
                        .make_prediction(&model_id, days)
                        .await
                        .into_result("Failed to make prediction")
                    {
                        Ok(result) => Outcome::Predicted(result),
                        Err(message) => Outcome::Failed(message),
                    }
                }
                Err(err) => Outcome::Failed(err.to_string()),
            }
        } else {
            Outcome::Pending
        };

        let mut body = model_form(cx, &models, selected, horizon);
        match outcome {
            Outcome::Pending => {}
            Outcome::Failed(message) => {
                body.push_str(&error_paragraph("article-prediction-error", &message));
            }
            Outcome::Predicted(result) => {
                let _ = write!(
                    body,
                    r#"<div class="article-prediction-result"><p><strong>Predicted Flux:</strong> {:.3}</p><p><strong>Model ID:</strong> {}</p><p><strong>Horizon Days:</strong> {}</p></div>"#,
                    result.predicted_flux,
                    escape_html(&result.model_id),
                    result.horizon_days,
                );
            }
        }

        article_frame(cx, "article-prediction", title.as_deref(), &body)
    }
}

fn model_form(
    cx: &ArticleContext<'_>,
    models: &[ModelDescriptor],
    selected: Option<&str>,
    horizon: &str,
) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<form class="article-prediction-form" method="post" action="{}"><label for="model-select" class="article-prediction-label">Model:</label><select id="model-select" name="modelId">"#,
        cx.action_url()
    );
    if models.is_empty() {
        html.push_str(r#"<option value="">No models available</option>"#);
    }
    for model in models {
        let chosen = if Some(model.model_id.as_str()) == selected { " selected" } else { "" };
        let _ = write!(
            html,
            r#"<option value="{}"{chosen}>{}</option>"#,
            escape_html(&model.model_id),
            escape_html(&model_short_name(&model.model_id, &model.description)),
        );
    }
    html.push_str("</select>");

    if let Some(model) = models.iter().find(|m| Some(m.model_id.as_str()) == selected) {
        if !model.description.is_empty() {
            let _ = write!(
                html,
                r#"<p class="article-prediction-description">{}</p>"#,
                escape_html(&model.description)
            );
        }
        if !model.available_horizon_days.is_empty() {
            let days: Vec<String> = model
                .available_horizon_days
                .iter()
                .map(u32::to_string)
                .collect();
            let _ = write!(
                html,
                r#"<p class="article-prediction-horizons">Available horizons: {} days</p>"#,
                days.join(", ")
            );
        }
    }

    let _ = write!(
        html,
        r#"<label for="horizon-days-input" class="article-prediction-label">Horizon Days:</label><input id="horizon-days-input" type="number" min="1" name="horizonDays" value="{}"><button type="submit">Predict</button></form>"#,
        escape_html(horizon),
    );
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::articles::testing::services;
    use crate::articles::FormInput;
    use crate::content::{ArticleConfig, ArticleDataWrapper};
    use crate::section::SectionContext;
    use assert_matches::assert_matches;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn validation_runs_before_network() {
        assert_eq!(
            validate_prediction_input(Some("lgb"), "7"),
            Ok(("lgb".to_owned(), 7))
        );
        assert_matches!(
            validate_prediction_input(None, "7"),
            Err(ValidationError::MissingSelection)
        );
        assert_matches!(
            validate_prediction_input(Some("lgb"), "  "),
            Err(ValidationError::MissingSelection)
        );
        for bad in ["0", "-3", "abc", "2.5"] {
            assert_matches!(
                validate_prediction_input(Some("lgb"), bad),
                Err(ValidationError::InvalidHorizon)
            );
        }
    }

    fn config() -> ArticleConfig {
        serde_json::from_value(json!({ "component": "ArticlePrediction" })).unwrap()
    }

    #[tokio::test]
    async fn lists_models_and_selects_first() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/models");
                then.status(200).json_body(json!({ "models": [
                    { "model_id": "lgb_horizon_3", "description": "LightGBM model using lags" },
                    { "modelId": "rf-v2-aplags" }
                ]}));
            })
            .await;

        let config = config();
        let wrapper = ArticleDataWrapper::new(&config, "s-0".into(), "en");
        let services = services(&server.base_url());
        let section = SectionContext::default();
        let cx = ArticleContext {
            article: &wrapper,
            section: &section,
            services: &services,
            section_id: "s",
            index: 0,
            input: None,
        };

        let html = PredictionArticle.render(&cx).await;
        assert!(html.contains(r#"<option value="lgb_horizon_3" selected>LightGBM</option>"#));
        assert!(html.contains(r#"<option value="rf-v2-aplags">Random Forest</option>"#));
        assert!(html.contains("Available horizons: 3 days"));
    }

    #[tokio::test]
    async fn submits_prediction() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/models");
                then.status(200).json_body(json!([{ "model_id": "lstm" }]));
            })
            .await;
        let predict = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/inference/predict-latest-v2-phase2")
                    .query_param("modelId", "lstm")
                    .query_param("horizonDays", "5");
                then.status(200)
                    .json_body(json!({ "predictedValue": 151.23456, "modelId": "lstm" }));
            })
            .await;

        let config = config();
        let wrapper = ArticleDataWrapper::new(&config, "s-0".into(), "en");
        let services = services(&server.base_url());
        let section = SectionContext::default();
        let input = FormInput::from_pairs([("modelId", "lstm"), ("horizonDays", "5")]);
        let cx = ArticleContext {
            article: &wrapper,
            section: &section,
            services: &services,
            section_id: "s",
            index: 0,
            input: Some(&input),
        };

        let html = PredictionArticle.render(&cx).await;
        predict.assert_async().await;
        assert!(html.contains("<strong>Predicted Flux:</strong> 151.235"));
        assert!(html.contains("<strong>Horizon Days:</strong> 5"));
    }

    #[tokio::test]
    async fn invalid_horizon_skips_request() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/models");
                then.status(200).json_body(json!([{ "model_id": "lstm" }]));
            })
            .await;
        let predict = server
            .mock_async(|when, then| {
                when.path("/api/inference/predict-latest-v2-phase2");
                then.status(200);
            })
            .await;

        let config = config();
        let wrapper = ArticleDataWrapper::new(&config, "s-0".into(), "en");
        let services = services(&server.base_url());
        let section = SectionContext::default();
        let input = FormInput::from_pairs([("horizonDays", "0")]);
        let cx = ArticleContext {
            article: &wrapper,
            section: &section,
            services: &services,
            section_id: "s",
            index: 0,
            input: Some(&input),
        };

        let html = PredictionArticle.render(&cx).await;
        assert_eq!(predict.hits_async().await, 0);
        assert!(html.contains("Please enter a valid number of horizon days (1 or more)"));
    }

    #[tokio::test]
    async fn unreachable_backend_shows_error() {
        let config = config();
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
        assert!(PredictionArticle
            .render(&cx)
            .await
            .contains("article-prediction-error"));
    }
}
