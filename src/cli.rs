use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::content::DEFAULT_LANGUAGE;
use crate::session::{SessionConfig, DEFAULT_API_BASE};
use crate::site::RenderOptions;

const DEFAULT_CONTENT_PATH: &str = "content/site.json";
const MODES: [&str; 6] = ["serve", "list_models", "predict", "latest", "check_backend", "render"];

/// Command-line options for the portfolio site and prediction client.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Solar flux portfolio site and prediction client", long_about = None)]
pub struct CliArgs {
    /// Base URL of the prediction backend.
    #[arg(long = "api-base", env = "FLUXFOLIO_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Network timeout (seconds) applied to backend requests.
    #[arg(long = "timeout", default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..=300))]
    timeout_secs: u64,

    /// Site content document.
    #[arg(long = "content", value_name = "PATH", default_value = DEFAULT_CONTENT_PATH)]
    pub content: PathBuf,

    /// Preferred content language; missing translations fall back to English.
    #[arg(long = "lang", value_name = "CODE", default_value = DEFAULT_LANGUAGE)]
    pub language: String,

    /// Render without avatar cycling and with a single profile role.
    #[arg(long = "suspend-animations", action = ArgAction::SetTrue)]
    pub suspend_animations: bool,

    /// Serve the site over HTTP.
    #[arg(long = "serve", action = ArgAction::SetTrue, conflicts_with_all = without("serve"))]
    pub serve: bool,

    /// Listen address for the site server (requires `--serve`).
    #[arg(long = "listen", value_name = "ADDR", requires = "serve")]
    pub listen: Option<String>,

    /// List the models offered by the backend (default mode).
    #[arg(long = "list-models", action = ArgAction::SetTrue, conflicts_with_all = without("list_models"))]
    pub list_models: bool,

    /// Request a prediction from the given model.
    #[arg(long = "predict", value_name = "MODEL", requires = "horizon", conflicts_with_all = without("predict"))]
    pub predict: Option<String>,

    /// Prediction horizon in days (requires `--predict`).
    #[arg(long = "horizon", value_name = "DAYS", requires = "predict")]
    pub horizon: Option<String>,

    /// Fetch the backend's latest prediction.
    #[arg(long = "latest", action = ArgAction::SetTrue, conflicts_with_all = without("latest"))]
    pub latest: bool,

    /// Check the backend test endpoint.
    #[arg(long = "check-backend", action = ArgAction::SetTrue, conflicts_with_all = without("check_backend"))]
    pub check_backend: bool,

    /// Render the site once and print the HTML.
    #[arg(long = "render", action = ArgAction::SetTrue, conflicts_with_all = without("render"))]
    pub render: bool,
}

/// Every mode flag except `mode`.
fn without(mode: &str) -> Vec<&'static str> {
    MODES.into_iter().filter(|other| *other != mode).collect()
}

/// What a single invocation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Serve,
    ListModels,
    Predict { model_id: String, horizon: String },
    Latest,
    CheckBackend,
    Render,
}

impl CliArgs {
    /// Returns the configured network timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn mode(&self) -> Mode {
        if self.serve {
            Mode::Serve
        } else if let Some(model_id) = &self.predict {
            Mode::Predict {
                model_id: model_id.clone(),
                horizon: self.horizon.clone().unwrap_or_default(),
            }
        } else if self.latest {
            Mode::Latest
        } else if self.check_backend {
            Mode::CheckBackend
        } else if self.render {
            Mode::Render
        } else {
            Mode::ListModels
        }
    }

    /// Convert CLI arguments into a session configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(self.api_base.clone(), self.timeout())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            language: self.language.clone(),
            suspend_animations: self.suspend_animations,
        }
    }
}
