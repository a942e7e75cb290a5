use std::fmt::Display;

use uuid::Uuid;

/// Shown when a story is requested for a blank prompt.
pub const EMPTY_PROMPT_WARNING: &str = "Please enter a prompt to generate a story.";
/// Shown when a refinement is requested before any story exists.
pub const NOTHING_TO_REFINE_WARNING: &str = "Generate a story before refining it.";
/// Shown once a refinement has replaced the story.
pub const REFINED_NOTICE: &str = "Story refined! Click below to refresh and view it.";

/// Failures of the text-generation capability.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
	/// The model could not be loaded or its client could not be built.
	Load(String),
	/// Transport failure talking to the inference endpoint.
	Http(#[from] reqwest::Error),
	/// The inference endpoint answered with a non-success status.
	Status { status: u16, body: String },
	/// Failure reported by the OpenAI-compatible client.
	#[cfg(feature = "openai")]
	OpenAI(#[from] async_openai::error::OpenAIError),
	/// The endpoint returned no generated text.
	EmptyResponse,
	/// The tokenizer used for token counting is unavailable.
	Tokenizer(String),
}

impl Display for LlmError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Load(msg) => write!(f, "Failed to load model: {}", msg),
			Self::Http(e) => write!(f, "Failed to reach inference endpoint: {}", e),
			Self::Status { status, body } =>
				write!(f, "Inference endpoint returned status {}: {}", status, body),
			#[cfg(feature = "openai")]
			Self::OpenAI(e) => write!(f, "Failed to prompt OpenAI-compatible endpoint: {}", e),
			Self::EmptyResponse => write!(f, "Inference endpoint returned no generated text"),
			Self::Tokenizer(msg) => write!(f, "Tokenizer unavailable: {}", msg),
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum StoryError {
	/// The prompt was empty or whitespace only.
	EmptyPrompt,
	/// A refinement was requested before a story was generated.
	NothingToRefine,
	/// No session is stored under the given id.
	SessionNotFound(Uuid),
	/// The generation capability failed.
	Llm(#[from] LlmError),
	/// The page could not be rendered.
	Render(#[from] minijinja::Error),
}

impl Display for StoryError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::EmptyPrompt => write!(f, "{}", EMPTY_PROMPT_WARNING),
			Self::NothingToRefine => write!(f, "{}", NOTHING_TO_REFINE_WARNING),
			Self::SessionNotFound(id) => write!(f, "Session not found: {}", id),
			Self::Llm(e) => write!(f, "{}", e),
			Self::Render(e) => write!(f, "Failed to render page: {}", e),
		}
	}
}
