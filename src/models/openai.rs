//! OpenAI-compatible completions endpoint.

use async_openai::{config::OpenAIConfig, types::CreateCompletionRequestArgs, Client};
use async_trait::async_trait;
use tracing::{debug, error, instrument};

use crate::{models::BackendSettings, GenerationParameters, Llm, LlmError, Result};

/// [`Llm`] backed by an OpenAI-compatible `/completions` endpoint.
///
/// The completions API has no fields for `top_k`, `repetition_penalty`, `no_repeat_ngram_size` or
/// an end-of-sequence id, so those parameters are not forwarded. The prompt is echoed back in
/// front of the completion.
#[derive(Debug)]
pub struct OpenAiLlm {
	client: Client<OpenAIConfig>,
	model: String,
	eos_token_id: Option<u32>,
}

impl OpenAiLlm {
	pub fn new(settings: &BackendSettings) -> Self {
		let mut config = OpenAIConfig::new().with_api_base(&settings.endpoint);
		if let Some(api_key) = &settings.api_key {
			config = config.with_api_key(api_key);
		}

		Self {
			client: Client::with_config(config),
			model: settings.model.clone(),
			eos_token_id: settings.eos_token_id,
		}
	}
}

#[async_trait]
impl Llm for OpenAiLlm {
	fn name(&self) -> &str {
		&self.model
	}

	fn eos_token_id(&self) -> Option<u32> {
		self.eos_token_id
	}

	#[instrument(skip(self, prompt))]
	async fn generate(&self, prompt: &str, params: &GenerationParameters) -> Result<String> {
		debug!(
			top_k = params.top_k,
			repetition_penalty = params.repetition_penalty,
			no_repeat_ngram_size = params.no_repeat_ngram_size,
			"Parameters without a completions API field are not forwarded"
		);

		let request = CreateCompletionRequestArgs::default()
			.model(self.model.as_str())
			.prompt(prompt)
			.max_tokens(params.max_new_tokens)
			.temperature(params.temperature)
			.top_p(params.top_p)
			.n(params.num_return_sequences)
			.seed(params.seed as i64)
			.echo(true)
			.build()?;

		let response = self.client.completions().create(request).await.map_err(|e| {
			error!("Failed to prompt {}: {}", self.model, e);
			LlmError::OpenAI(e)
		})?;

		response.choices.into_iter().next().map(|choice| choice.text).ok_or(LlmError::EmptyResponse)
	}
}
