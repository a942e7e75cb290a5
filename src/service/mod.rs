//! The InkSpire web page, served with axum.

use std::sync::Arc;

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::{Html, IntoResponse, Redirect, Response},
	routing::{get, post},
	Form, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::{
	storage::MemoryChest, Loom, ModelCache, SessionChestHandler, StoryError, Studio, StudioConfig,
	StudioView, WordBudget, DEFAULT_WORDS,
};

pub mod page;

pub use page::Pages;

/// Shown when the model fails while writing or refining a story.
const FAILURE_MESSAGE: &str =
	"Oh! Something went wrong while writing your story. Please try again in a moment.";

/// Shared state of every request handler.
#[derive(Debug)]
pub struct AppState<C: SessionChestHandler> {
	pub studio: Studio<C>,
	pub pages: Pages,
}

impl<C: SessionChestHandler> AppState<C> {
	pub fn new(studio: Studio<C>) -> Result<Self, StoryError> {
		Ok(Self { studio, pages: Pages::new()? })
	}

	/// Turn the outcome of a studio action into a page.
	///
	/// Unknown sessions start over; any other failure ends the interaction with an error page.
	fn respond(&self, session_id: Uuid, outcome: Result<StudioView, StoryError>) -> Response {
		match outcome.and_then(|view| self.pages.studio(&view)) {
			Ok(html) => Html(html).into_response(),
			Err(StoryError::SessionNotFound(_)) => Redirect::to("/").into_response(),
			Err(e) => {
				error!("Failed to handle request for session {}: {}", session_id, e);

				let body = self
					.pages
					.error(FAILURE_MESSAGE, Some(session_id))
					.unwrap_or_else(|_| FAILURE_MESSAGE.to_string());

				(StatusCode::INTERNAL_SERVER_ERROR, Html(body)).into_response()
			},
		}
	}
}

/// Form posted by the "Generate Story" button.
///
/// `max_words` is kept as typed so that an empty or out-of-range budget still reaches the page.
#[derive(Debug, Deserialize)]
pub struct GenerateForm {
	#[serde(default)]
	pub prompt: String,
	#[serde(default)]
	pub max_words: String,
}

impl GenerateForm {
	/// The requested budget, clamped into range. Anything that is not a whole number falls back to
	/// [`DEFAULT_WORDS`].
	pub fn word_budget(&self) -> WordBudget {
		let words = self
			.max_words
			.trim()
			.parse::<i64>()
			.map(|words| words.clamp(0, i64::from(u16::MAX)) as u16)
			.unwrap_or(DEFAULT_WORDS);

		WordBudget::clamped(words)
	}
}

/// Routes of the InkSpire page.
pub fn router<C: SessionChestHandler>(state: Arc<AppState<C>>) -> Router {
	Router::new()
		.route("/", get(open::<C>))
		.route("/health", get(health))
		.route("/session/{session_id}", get(show::<C>))
		.route("/session/{session_id}/generate", post(generate::<C>))
		.route("/session/{session_id}/refine", post(refine::<C>))
		.route("/session/{session_id}/refresh", post(refresh::<C>))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

async fn health() -> &'static str {
	"Server is running"
}

async fn open<C: SessionChestHandler>(State(state): State<Arc<AppState<C>>>) -> Response {
	match state.studio.open().await {
		Ok(session_id) => Redirect::to(&format!("/session/{}", session_id)).into_response(),
		Err(e) => {
			error!("Failed to open session: {}", e);
			(StatusCode::INTERNAL_SERVER_ERROR, FAILURE_MESSAGE).into_response()
		},
	}
}

async fn show<C: SessionChestHandler>(
	State(state): State<Arc<AppState<C>>>,
	Path(session_id): Path<Uuid>,
) -> Response {
	state.respond(session_id, state.studio.view(session_id).await)
}

#[instrument(skip(state, form))]
async fn generate<C: SessionChestHandler>(
	State(state): State<Arc<AppState<C>>>,
	Path(session_id): Path<Uuid>,
	Form(form): Form<GenerateForm>,
) -> Response {
	let outcome = state.studio.submit(session_id, &form.prompt, form.word_budget()).await;

	state.respond(session_id, outcome)
}

#[instrument(skip(state))]
async fn refine<C: SessionChestHandler>(
	State(state): State<Arc<AppState<C>>>,
	Path(session_id): Path<Uuid>,
) -> Response {
	state.respond(session_id, state.studio.refine(session_id).await)
}

async fn refresh<C: SessionChestHandler>(
	State(state): State<Arc<AppState<C>>>,
	Path(session_id): Path<Uuid>,
) -> Response {
	state.respond(session_id, state.studio.acknowledge(session_id).await)
}

/// Serve InkSpire until interrupted.
///
/// The model is not loaded here; it is loaded by the first request that needs it.
pub async fn serve(config: StudioConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
	let loom = Loom::new(ModelCache::new(config.backend_settings()), config.setting.clone());
	let studio = Studio::new(MemoryChest::new(), loom).with_session_ttl(config.session_ttl());
	let state = Arc::new(AppState::new(studio)?);

	let addr = config.socket_addr();
	let listener = TcpListener::bind(addr).await?;

	info!(
		task = "serve",
		backend = %config.backend,
		model = %config.model,
		"InkSpire listening on http://{}",
		addr
	);

	axum::serve(listener, router(state)).with_graceful_shutdown(shutdown_signal()).await?;

	info!("InkSpire stopped");

	Ok(())
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		error!("Failed to listen for shutdown signal: {}", e);
		std::future::pending::<()>().await;
	}
}
