//! Craft short stories from a one-line premise using any pretrained text-generation model.
//!
//! InkSpire wraps a pretrained causal language model behind a small interactive web page. A user
//! writes a prompt, InkSpire wraps it in an instructional template, asks the model to continue it
//! and shows the cleaned-up story. A one-shot refinement pass can then hand the story back to the
//! same model with an editorial template.
//!
//! The model itself is an external collaborator described by the [`Llm`] trait. Two
//! implementations ship with the crate:
//!
//! - [`models::pipeline::PipelineLlm`] for Hugging Face text-generation pipeline endpoints
//! - [`models::openai::OpenAiLlm`] for OpenAI-compatible completion endpoints (feature `openai`)
//!
//! The prompt templates, the sampling parameters of each pass and the post-processing of the model
//! output live in [`passes`]. A [`Loom`] runs a pass against the model, loading the model lazily
//! through a [`ModelCache`]. The [`Studio`] drives the interaction flow of a single
//! [`StorySession`] and persists it through a [`SessionChestHandler`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use inkspire::{Loom, ModelCache, Prompt, Studio, WordBudget, storage::MemoryChest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loom = Loom::new(ModelCache::new(backend_settings), "a mysterious jungle");
//!     let studio = Studio::new(MemoryChest::new(), loom);
//!
//!     let session_id = studio.open().await?;
//!     let view = studio
//!         .submit(session_id, "A robot discovers human emotions.", WordBudget::clamped(100))
//!         .await?;
//!
//!     println!("{}", view.session.story_text);
//!     Ok(())
//! }
//! ```
use std::fmt::Debug;

use async_trait::async_trait;
use bounded_integer::BoundedU16;
use lazy_static::lazy_static;
use serde::Serialize;
use tiktoken_rs::{p50k_base, CoreBPE};

pub mod architecture;
pub mod config;
pub mod loom;
pub mod models;
pub mod passes;
pub mod service;
pub mod session;
pub mod storage;
pub mod studio;
pub mod types;

#[cfg(test)]
mod mock;

pub use config::StudioConfig;
pub use loom::Loom;
pub use models::{Backend, ModelCache};
pub use session::{Prompt, StoryPhase, StorySession};
pub use storage::SessionChestHandler;
pub use studio::{Notice, Studio, StudioView};
pub use types::{LlmError, StoryError};

pub type Result<T, E = LlmError> = std::result::Result<T, E>;

/// Smallest word budget a story may be requested with.
pub const MIN_WORDS: u16 = 50;
/// Largest word budget a story may be requested with.
pub const MAX_WORDS: u16 = 1000;
/// Word budget used until the user picks one.
pub const DEFAULT_WORDS: u16 = 150;
/// Increment of the word budget control.
pub const WORDS_STEP: u16 = 50;

/// Approximate number of words a story should be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WordBudget(BoundedU16<MIN_WORDS, MAX_WORDS>);

impl WordBudget {
	/// Returns `None` when `words` is outside of `MIN_WORDS..=MAX_WORDS`.
	pub fn new(words: u16) -> Option<Self> {
		BoundedU16::new(words).map(Self)
	}

	/// Saturates `words` into `MIN_WORDS..=MAX_WORDS`.
	pub fn clamped(words: u16) -> Self {
		Self(BoundedU16::new_saturating(words))
	}

	pub fn get(&self) -> u16 {
		self.0.get()
	}
}

impl Default for WordBudget {
	fn default() -> Self {
		Self::clamped(DEFAULT_WORDS)
	}
}

impl Serialize for WordBudget {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		serializer.serialize_u16(self.get())
	}
}

/// Decoding controls passed through unchanged to the generation capability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationParameters {
	/// Upper bound of tokens to generate after the prompt.
	pub max_new_tokens: u16,
	/// Sample from the distribution instead of decoding greedily.
	pub do_sample: bool,
	pub temperature: f32,
	pub top_k: u32,
	pub top_p: f32,
	pub repetition_penalty: f32,
	/// Size of n-grams which may not occur twice in the output.
	pub no_repeat_ngram_size: u32,
	/// End-of-sequence token id of the model's tokenizer, when known.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub eos_token_id: Option<u32>,
	pub num_return_sequences: u8,
	/// Seed re-applied before every call so that identical inputs sample identically.
	///
	/// Not a generation keyword argument, so it is never serialized; backends with a seed field
	/// forward it themselves.
	#[serde(skip)]
	pub seed: u64,
}

lazy_static! {
	/// Tokenizer used to approximate prompt sizes for logging.
	static ref P50K: Option<CoreBPE> = p50k_base().ok();
}

/// A pretrained text-generation capability.
///
/// Implementations only need to accept a fully formatted prompt plus [`GenerationParameters`] and
/// return a single generated text. The returned text is expected to contain the input prompt
/// followed by the continuation, which is how [`passes::Pass::extract`] finds the generated part.
#[async_trait]
pub trait Llm: Debug + Send + Sync {
	/// Identifier of the underlying model.
	fn name(&self) -> &str;

	/// End-of-sequence token id of the model's tokenizer.
	///
	/// Defaults to `None`, leaving the decision to stop to the inference endpoint.
	fn eos_token_id(&self) -> Option<u32> {
		None
	}

	/// Approximate number of tokens in `content`.
	fn count_tokens(&self, content: &str) -> Result<usize> {
		let bpe = P50K
			.as_ref()
			.ok_or_else(|| LlmError::Tokenizer("p50k_base could not be loaded".into()))?;

		Ok(bpe.encode_with_special_tokens(content).len())
	}

	/// Generate one continuation of `prompt`.
	async fn generate(&self, prompt: &str, params: &GenerationParameters) -> Result<String>;
}
