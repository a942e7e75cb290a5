//! Text-generation backends and the process-wide model cache.

use std::{fmt::Display, sync::Arc};

use clap::{builder::PossibleValue, ValueEnum};
use tokio::sync::OnceCell;
use tracing::{error, info, instrument};

use crate::{Llm, Result};

#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;

/// Model loaded unless configured otherwise.
pub const DEFAULT_MODEL: &str = "TinyLlama/TinyLlama-1.1B-Chat-v1.0";
/// End-of-sequence token id of [`DEFAULT_MODEL`]'s tokenizer.
pub const DEFAULT_EOS_TOKEN_ID: u32 = 2;

/// The kinds of inference endpoints InkSpire can talk to.
#[derive(PartialEq, Eq, Clone, Debug, Copy, Default)]
pub enum Backend {
	/// A Hugging Face text-generation pipeline served over HTTP.
	#[default]
	Pipeline,
	/// An OpenAI-compatible completions endpoint.
	#[cfg(feature = "openai")]
	OpenAI,
}

#[cfg(feature = "openai")]
const BACKENDS: &[Backend] = &[Backend::Pipeline, Backend::OpenAI];
#[cfg(not(feature = "openai"))]
const BACKENDS: &[Backend] = &[Backend::Pipeline];

/// Clap value enum implementation for argument parsing.
impl ValueEnum for Backend {
	fn value_variants<'a>() -> &'a [Self] {
		BACKENDS
	}

	fn to_possible_value(&self) -> Option<PossibleValue> {
		Some(PossibleValue::new(self.name()))
	}
}

impl Backend {
	/// Name used on the command line.
	pub fn name(&self) -> &'static str {
		match self {
			Self::Pipeline => "pipeline",
			#[cfg(feature = "openai")]
			Self::OpenAI => "openai",
		}
	}
}

impl Display for Backend {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.name())
	}
}

/// Everything needed to build a model client.
#[derive(Debug, Clone)]
pub struct BackendSettings {
	pub backend: Backend,
	/// Base URL of the inference endpoint.
	pub endpoint: String,
	/// Credential sent to the endpoint, if it requires one.
	pub api_key: Option<String>,
	/// Model identifier, e.g. [`DEFAULT_MODEL`].
	pub model: String,
	pub eos_token_id: Option<u32>,
}

impl BackendSettings {
	/// Build the client for the configured backend.
	pub fn load(&self) -> Result<Arc<dyn Llm>> {
		Ok(match self.backend {
			Backend::Pipeline => Arc::new(pipeline::PipelineLlm::new(self)?),
			#[cfg(feature = "openai")]
			Backend::OpenAI => Arc::new(openai::OpenAiLlm::new(self)),
		})
	}
}

/// Lazily loads the model on first use and keeps it for the lifetime of the process.
///
/// A failed load is not remembered, so the next caller tries again.
#[derive(Debug)]
pub struct ModelCache {
	settings: Option<BackendSettings>,
	model: OnceCell<Arc<dyn Llm>>,
}

impl ModelCache {
	pub fn new(settings: BackendSettings) -> Self {
		Self { settings: Some(settings), model: OnceCell::new() }
	}

	/// A cache holding an already loaded model.
	pub fn preloaded(model: Arc<dyn Llm>) -> Self {
		Self { settings: None, model: OnceCell::new_with(Some(model)) }
	}

	/// Whether the model has been loaded yet.
	pub fn is_loaded(&self) -> bool {
		self.model.initialized()
	}

	/// The cached model, loading it first if needed.
	#[instrument(skip(self))]
	pub async fn get(&self) -> Result<Arc<dyn Llm>> {
		self.model
			.get_or_try_init(|| async {
				let settings = self.settings.as_ref().ok_or_else(|| {
					crate::LlmError::Load("no backend settings to load a model from".into())
				})?;

				let model = settings.load().map_err(|e| {
					error!("Failed to load model {}: {}", settings.model, e);
					e
				})?;

				info!(backend = %settings.backend, model = model.name(), "model loaded");

				Ok(model)
			})
			.await
			.cloned()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn settings(endpoint: &str) -> BackendSettings {
		BackendSettings {
			backend: Backend::Pipeline,
			endpoint: endpoint.to_string(),
			api_key: None,
			model: DEFAULT_MODEL.to_string(),
			eos_token_id: Some(DEFAULT_EOS_TOKEN_ID),
		}
	}

	#[test]
	fn backend_names_round_trip_through_clap() {
		for backend in Backend::value_variants() {
			assert_eq!(Backend::from_str(backend.name(), false).as_ref(), Ok(backend));
		}
		assert_eq!(Backend::default(), Backend::Pipeline);
	}

	#[tokio::test]
	async fn model_is_loaded_once() {
		let cache = ModelCache::new(settings("http://127.0.0.1:8080"));
		assert!(!cache.is_loaded());

		let first = cache.get().await.unwrap();
		let second = cache.get().await.unwrap();

		assert!(cache.is_loaded());
		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(first.name(), DEFAULT_MODEL);
		assert_eq!(first.eos_token_id(), Some(DEFAULT_EOS_TOKEN_ID));
	}

	#[tokio::test]
	async fn failed_load_is_retried() {
		let cache = ModelCache::new(settings("not a url"));

		assert!(cache.get().await.is_err());
		assert!(!cache.is_loaded());
		assert!(cache.get().await.is_err());
	}
}
