//! Runs prompt passes against the cached model.

use tracing::{debug, error, instrument, trace};

use crate::{
	models::ModelCache,
	passes::{Pass, RefinePass, StoryPass},
	session::Prompt,
	Result, WordBudget,
};

/// The machine that turns prompts into stories.
///
/// Runs a [`Pass`] against the cached model: formats the input with the pass's template, prompts
/// the model with the pass's sampling parameters and extracts the answer from the model output.
#[derive(Debug)]
pub struct Loom {
	models: ModelCache,
	story: StoryPass,
	refine: RefinePass,
}

impl Loom {
	/// Creates a new `Loom` writing stories set in `setting`.
	pub fn new(models: ModelCache, setting: impl Into<String>) -> Self {
		Self { models, story: StoryPass::new(setting), refine: RefinePass }
	}

	pub fn models(&self) -> &ModelCache {
		&self.models
	}

	/// Write a short story from `prompt` of roughly `max_words` words.
	#[instrument(skip(self, prompt), fields(max_words = max_words.get()))]
	pub async fn weave_story(&self, prompt: &Prompt, max_words: WordBudget) -> Result<String> {
		self.run(&self.story, prompt.as_str(), max_words).await
	}

	/// Rewrite `story` for clarity, pacing and flow, in roughly `max_words` words.
	#[instrument(skip(self, story), fields(max_words = max_words.get()))]
	pub async fn refine_story(&self, story: &str, max_words: WordBudget) -> Result<String> {
		self.run(&self.refine, story, max_words).await
	}

	async fn run<P: Pass>(&self, pass: &P, input: &str, max_words: WordBudget) -> Result<String> {
		let model = self.models.get().await?;

		let formatted = pass.format(input);
		let params = P::parameters(max_words, model.eos_token_id());

		debug!(
			model = model.name(),
			prompt_tokens = model.count_tokens(&formatted).unwrap_or_default(),
			max_new_tokens = params.max_new_tokens,
			"Prompting model"
		);

		let output = model.generate(&formatted, &params).await.map_err(|e| {
			error!("Failed to prompt {}: {}", model.name(), e);
			e
		})?;

		let text = P::extract(&output);

		trace!("Extracted {} characters after {:?}", text.len(), P::MARKER);

		Ok(text)
	}
}
