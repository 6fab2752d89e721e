mod api;
mod articles;
mod avatar;
mod cli;
mod content;
mod error;
mod model;
mod registry;
mod section;
mod server;
mod session;
mod site;
mod templates;
mod util;

use anyhow::anyhow;
use clap::Parser;
use cli::{CliArgs, Mode};
use error::Result;

use crate::api::ApiClient;
use crate::articles::{validate_prediction_input, ChatStore};
use crate::content::SiteContent;
use crate::registry::ArticleRegistry;
use crate::site::RenderServices;

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

async fn run(args: CliArgs) -> Result<()> {
    let api = ApiClient::new(&args.session_config())?;

    match args.mode() {
        Mode::Serve => {
            let content = SiteContent::load(&args.content).await?;
            server::run_site_server(&args, content).await?;
        }
        Mode::ListModels => {
            let list = api
                .get_models()
                .await
                .into_result("Failed to fetch models")
                .map_err(|message| anyhow!(message))?;
            if list.models.is_empty() {
                println!("no models available");
            }
            for entry in &list.models {
                let horizons: Vec<String> = entry
                    .available_horizon_days
                    .iter()
                    .map(u32::to_string)
                    .collect();
                println!(
                    "{}\t{}\thorizons: [{}]",
                    entry.model_id,
                    model::model_display_name(&entry.model_id, &entry.description),
                    horizons.join(", ")
                );
            }
        }
        Mode::Predict { model_id, horizon } => {
            let (model_id, days) = validate_prediction_input(Some(&model_id), &horizon)?;
            let result = api
                .make_prediction(&model_id, days)
                .await
                .into_result("Failed to make prediction")
                .map_err(|message| anyhow!(message))?;
            println!("Predicted Flux: {:.3}", result.predicted_flux);
            println!("Model ID: {}", result.model_id);
            println!("Horizon Days: {}", result.horizon_days);
            if let Some(id) = result.prediction_id {
                println!("Prediction ID: {id}");
            }
        }
        Mode::Latest => {
            let payload = api
                .get_latest_prediction()
                .await
                .into_result("Failed to fetch prediction")
                .map_err(|message| anyhow!(message))?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Mode::CheckBackend => {
            let payload = api
                .test_connection()
                .await
                .into_result("Backend connection failed")
                .map_err(|message| anyhow!(message))?;
            tracing::info!("backend at {} is reachable", api.base_url());
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        Mode::Render => {
            let content = SiteContent::load(&args.content).await?;
            let services = RenderServices {
                api,
                chats: ChatStore::default(),
                options: args.render_options(),
                content_dir: content.base_dir.clone(),
            };
            let registry = ArticleRegistry::with_builtin();
            println!("{}", site::render_page(&content, &services, &registry, None).await);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    let args = CliArgs::parse();

    if let Err(error) = run(args).await {
        tracing::error!("{error:?}");
        std::process::exit(1);
    }
}
