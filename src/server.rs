use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context as AnyhowContext;
use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Response,
    },
    routing::{get, post},
    Form, Json, Router,
};
use futures_util::stream::Stream;
use serde::Deserialize;
use serde_json::json;
use tokio::{net::TcpListener, signal};
use tokio_stream::{wrappers::WatchStream, StreamExt};

use crate::{
    api::{ApiClient, Envelope},
    articles::{validate_prediction_input, ChatStore, FormInput},
    avatar::{self, AvatarTicker, DEFAULT_CYCLE_INTERVAL},
    cli::CliArgs,
    content::SiteContent,
    error::Result,
    model::PredictionResult,
    registry::ArticleRegistry,
    site::{self, RenderOptions, RenderServices},
};

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

/// Everything request handlers share. The avatar ticker lives as long as the
/// state does.
pub struct AppState {
    content: SiteContent,
    services: RenderServices,
    registry: ArticleRegistry,
    avatar: AvatarTicker,
}

type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(content: SiteContent, api: ApiClient, options: RenderOptions) -> Self {
        let sources = content
            .profile
            .as_ref()
            .map(avatar::profile_sources)
            .unwrap_or_default();
        let avatar = if options.suspend_animations {
            AvatarTicker::fixed(sources)
        } else {
            let interval = content
                .profile
                .as_ref()
                .and_then(|profile| profile.cycle_interval)
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_CYCLE_INTERVAL);
            AvatarTicker::spawn(sources, interval)
        };

        let services = RenderServices {
            api,
            chats: ChatStore::default(),
            options,
            content_dir: content.base_dir.clone(),
        };

        Self {
            content,
            services,
            registry: ArticleRegistry::with_builtin(),
            avatar,
        }
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/sections/:section_id", get(section_page))
        .route("/sections/:section_id/articles/:index", post(article_interaction))
        .route("/data/models", get(list_models))
        .route("/data/predict", get(predict))
        .route("/profile/avatar", get(current_avatar))
        .route("/profile/avatar/events", get(avatar_events))
        .fallback(not_found)
        .with_state(state)
}

pub async fn run_site_server(args: &CliArgs, content: SiteContent) -> Result<()> {
    let listen = args
        .listen
        .clone()
        .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_owned());
    let addr: SocketAddr = listen
        .parse()
        .with_context(|| format!("parsing listen address `{listen}`"))?;

    let api = ApiClient::new(&args.session_config())?;
    tracing::info!("using prediction backend at {}", api.base_url());
    let state = Arc::new(AppState::new(content, api, args.render_options()));
    if state.avatar.is_cycling() {
        tracing::info!("cycling {} avatar images", state.avatar.sources().len());
    }

    let listener = TcpListener::bind(addr)
        .await
        .context("binding site server address")?;
    tracing::info!(
        "site listening on http://{}",
        listener.local_addr().unwrap_or(addr)
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(err) = signal::ctrl_c().await {
                tracing::warn!("failed to listen for shutdown signal: {err:?}");
            }
            tracing::info!("shutdown signal received; stopping server");
        })
        .await
        .context("running site server")?;

    Ok(())
}

async fn index(State(state): State<SharedState>) -> Html<String> {
    Html(
        site::render_page(
            &state.content,
            &state.services,
            &state.registry,
            state.avatar.current(),
        )
        .await,
    )
}

async fn section_page(
    State(state): State<SharedState>,
    Path(section_id): Path<String>,
    uri: Uri,
) -> Response {
    let Some(section) = state.content.section(&section_id) else {
        return not_found(uri).await.into_response();
    };
    Html(site::render_section_page(section, &state.services, &state.registry, None).await)
        .into_response()
}

async fn article_interaction(
    State(state): State<SharedState>,
    Path((section_id, index)): Path<(String, usize)>,
    uri: Uri,
    Form(input): Form<FormInput>,
) -> Response {
    let Some(section) = state
        .content
        .section(&section_id)
        .filter(|section| index < section.articles.len())
    else {
        return not_found(uri).await.into_response();
    };
    tracing::debug!("form submitted to {section_id}/{index}");
    Html(
        site::render_section_page(section, &state.services, &state.registry, Some((index, &input)))
            .await,
    )
    .into_response()
}

async fn list_models(State(state): State<SharedState>) -> Response {
    Json(state.services.api.get_models().await).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PredictQuery {
    model_id: Option<String>,
    #[serde(default)]
    horizon_days: String,
}

async fn predict(State(state): State<SharedState>, Query(query): Query<PredictQuery>) -> Response {
    match validate_prediction_input(query.model_id.as_deref(), &query.horizon_days) {
        Ok((model_id, days)) => {
            Json(state.services.api.make_prediction(&model_id, days).await).into_response()
        }
        Err(err) => (
            StatusCode::BAD_REQUEST,
            Json(Envelope::<PredictionResult>::failure(err.to_string())),
        )
            .into_response(),
    }
}

async fn current_avatar(State(state): State<SharedState>) -> Response {
    let avatar = &state.avatar;
    Json(json!({
        "index": avatar.index(),
        "src": avatar.current().unwrap_or(avatar::DEFAULT_AVATAR),
        "sources": avatar.sources(),
        "cycling": avatar.is_cycling(),
    }))
    .into_response()
}

async fn avatar_events(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let sources = state.avatar.sources().to_vec();
    let stream = WatchStream::new(state.avatar.subscribe()).map(move |index| {
        let src = sources
            .get(index)
            .map(String::as_str)
            .unwrap_or(avatar::DEFAULT_AVATAR);
        Ok(Event::default()
            .event("avatar")
            .data(json!({ "index": index, "src": src }).to_string()))
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

async fn not_found(uri: Uri) -> (StatusCode, Html<String>) {
    (StatusCode::NOT_FOUND, Html(site::render_not_found(uri.path())))
}
