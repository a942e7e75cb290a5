//! Hugging Face text-generation pipeline served over HTTP.
//!
//! Speaks the `{"inputs": ..., "parameters": {...}}` request format of Inference Endpoints and
//! text-generation servers. The parameters are handed to the pipeline as generation keyword
//! arguments, so every serialized field of [`GenerationParameters`] reaches the model unchanged.
//! The seed is left out: `generate` rejects keyword arguments the model does not use.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument, trace};

use crate::{models::BackendSettings, GenerationParameters, Llm, LlmError, Result};

#[derive(Debug, Serialize)]
struct PipelineRequest<'a> {
	inputs: &'a str,
	parameters: PipelineParameters<'a>,
}

#[derive(Debug, Serialize)]
struct PipelineParameters<'a> {
	#[serde(flatten)]
	generation: &'a GenerationParameters,
	/// Echo the prompt in front of the continuation.
	return_full_text: bool,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
	generated_text: String,
}

/// Pipelines answer with a list of sequences; text-generation servers with a single object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PipelineResponse {
	Sequences(Vec<GeneratedText>),
	Single(GeneratedText),
}

impl PipelineResponse {
	fn into_text(self) -> Option<String> {
		match self {
			Self::Sequences(sequences) => sequences.into_iter().next().map(|s| s.generated_text),
			Self::Single(single) => Some(single.generated_text),
		}
	}
}

/// [`Llm`] backed by a text-generation pipeline endpoint.
#[derive(Debug)]
pub struct PipelineLlm {
	client: Client,
	endpoint: Url,
	api_key: Option<String>,
	model: String,
	eos_token_id: Option<u32>,
}

impl PipelineLlm {
	pub fn new(settings: &BackendSettings) -> Result<Self> {
		let endpoint = Url::parse(&settings.endpoint).map_err(|e| {
			LlmError::Load(format!("invalid endpoint {:?}: {}", settings.endpoint, e))
		})?;

		let client = Client::builder()
			.build()
			.map_err(|e| LlmError::Load(format!("failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			endpoint,
			api_key: settings.api_key.clone(),
			model: settings.model.clone(),
			eos_token_id: settings.eos_token_id,
		})
	}
}

#[async_trait]
impl Llm for PipelineLlm {
	fn name(&self) -> &str {
		&self.model
	}

	fn eos_token_id(&self) -> Option<u32> {
		self.eos_token_id
	}

	#[instrument(skip(self, prompt), fields(endpoint = %self.endpoint))]
	async fn generate(&self, prompt: &str, params: &GenerationParameters) -> Result<String> {
		let body = PipelineRequest {
			inputs: prompt,
			parameters: PipelineParameters { generation: params, return_full_text: true },
		};

		trace!("Posting generation request: {:?}", body);

		let mut request = self.client.post(self.endpoint.clone()).json(&body);
		if let Some(api_key) = &self.api_key {
			request = request.bearer_auth(api_key);
		}

		let response = request.send().await?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			error!("Pipeline endpoint returned {}: {}", status, body);
			return Err(LlmError::Status { status: status.as_u16(), body })
		}

		let generated = response.json::<PipelineResponse>().await?;

		debug!("Received generated text from {}", self.model);

		generated.into_text().ok_or(LlmError::EmptyResponse)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		models::{Backend, DEFAULT_MODEL},
		passes::{Pass, StoryPass},
		WordBudget,
	};

	#[test]
	fn request_carries_sampling_parameters() {
		let params = StoryPass::parameters(WordBudget::clamped(150), Some(2));
		let body = PipelineRequest {
			inputs: "Story:",
			parameters: PipelineParameters { generation: &params, return_full_text: true },
		};

		let json = serde_json::to_value(&body).unwrap();
		let parameters = &json["parameters"];

		assert_eq!(json["inputs"], "Story:");
		assert_eq!(parameters["max_new_tokens"], 195);
		assert_eq!(parameters["do_sample"], true);
		assert_eq!(parameters["top_k"], 40);
		assert_eq!(parameters["no_repeat_ngram_size"], 3);
		assert_eq!(parameters["eos_token_id"], 2);
		assert_eq!(parameters["num_return_sequences"], 1);
		assert_eq!(parameters["return_full_text"], true);
	}

	#[test]
	fn seed_is_not_sent_as_a_generation_argument() {
		let params = StoryPass::parameters(WordBudget::default(), Some(2));
		assert_eq!(params.seed, 42);

		let body = PipelineRequest {
			inputs: "Story:",
			parameters: PipelineParameters { generation: &params, return_full_text: true },
		};
		let json = serde_json::to_value(&body).unwrap();

		assert!(json["parameters"].get("seed").is_none());
		assert!(json.get("seed").is_none());
	}

	#[test]
	fn unknown_eos_token_is_omitted() {
		let params = StoryPass::parameters(WordBudget::default(), None);
		let json = serde_json::to_value(&params).unwrap();

		assert!(json.get("eos_token_id").is_none());
	}

	#[test]
	fn both_response_shapes_are_understood() {
		let sequences: PipelineResponse =
			serde_json::from_str(r#"[{"generated_text": "Story: A."}]"#).unwrap();
		assert_eq!(sequences.into_text().as_deref(), Some("Story: A."));

		let single: PipelineResponse =
			serde_json::from_str(r#"{"generated_text": "Story: B."}"#).unwrap();
		assert_eq!(single.into_text().as_deref(), Some("Story: B."));

		let empty: PipelineResponse = serde_json::from_str("[]").unwrap();
		assert_eq!(empty.into_text(), None);
	}

	#[test]
	fn invalid_endpoint_fails_to_load() {
		let settings = BackendSettings {
			backend: Backend::Pipeline,
			endpoint: "::nope::".into(),
			api_key: None,
			model: DEFAULT_MODEL.into(),
			eos_token_id: None,
		};

		assert!(matches!(PipelineLlm::new(&settings), Err(LlmError::Load(_))));
	}
}
