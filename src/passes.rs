//! Prompt templates, sampling parameters and output post-processing.
//!
//! A [`Pass`] is one round-trip to the model: a template that turns some input text into a prompt,
//! the sampling parameters to prompt with, and the marker after which the model's answer starts.
//! [`StoryPass`] writes a new story from a premise; [`RefinePass`] rewrites an existing story.

use crate::{GenerationParameters, WordBudget};

/// Tokens requested per word, expressed as `TOKENS_PER_WORD_NUM / TOKENS_PER_WORD_DEN`.
///
/// A token is roughly three quarters of a word, so a story of `n` words needs about `1.3 * n`
/// tokens.
const TOKENS_PER_WORD_NUM: u32 = 13;
const TOKENS_PER_WORD_DEN: u32 = 10;

/// Setting of generated stories unless configured otherwise.
pub const DEFAULT_SETTING: &str = "a mysterious jungle";

/// Number of new tokens to request for a story of roughly `max_words` words.
///
/// Equivalent to `floor(max_words * 1.3)`.
pub fn max_new_tokens(max_words: WordBudget) -> u16 {
	let tokens = u32::from(max_words.get()) * TOKENS_PER_WORD_NUM / TOKENS_PER_WORD_DEN;

	// MAX_WORDS * 1.3 comfortably fits in a u16
	u16::try_from(tokens).unwrap_or(u16::MAX)
}

/// Text following the first occurrence of `marker`, with surrounding whitespace removed.
///
/// Falls back to the whole trimmed `output` when the marker is absent.
pub fn text_after_marker<'a>(output: &'a str, marker: &str) -> &'a str {
	match output.find(marker) {
		Some(start) => output[start + marker.len()..].trim(),
		None => output.trim(),
	}
}

/// Drops any trailing incomplete sentence by cutting after the last period.
///
/// Text without a period is returned unchanged.
pub fn truncate_to_last_sentence(text: &str) -> &str {
	match text.rfind('.') {
		Some(last_period) => &text[..=last_period],
		None => text,
	}
}

/// One prompt/response round-trip with the model.
pub trait Pass {
	/// Marker closing the prompt; the model's answer begins right after it.
	const MARKER: &'static str;
	/// Sampling temperature. Higher values make the output more random.
	const TEMPERATURE: f32;
	/// Only the `TOP_K` most likely tokens are considered at each step.
	const TOP_K: u32;
	/// Nucleus sampling: the smallest set of tokens whose probability exceeds `TOP_P`.
	const TOP_P: f32;
	/// Penalty applied to tokens which already appear in the text.
	const REPETITION_PENALTY: f32;
	/// Size of n-grams which may only occur once.
	///
	/// Defaults to `3`
	const NO_REPEAT_NGRAM_SIZE: u32 = 3;
	/// Seed applied before every call.
	///
	/// Defaults to `42`
	const SEED: u64 = 42;

	/// Wrap `input` in the pass's template.
	fn format(&self, input: &str) -> String;

	/// Sampling parameters for a text of roughly `max_words` words.
	fn parameters(max_words: WordBudget, eos_token_id: Option<u32>) -> GenerationParameters {
		GenerationParameters {
			max_new_tokens: max_new_tokens(max_words),
			do_sample: true,
			temperature: Self::TEMPERATURE,
			top_k: Self::TOP_K,
			top_p: Self::TOP_P,
			repetition_penalty: Self::REPETITION_PENALTY,
			no_repeat_ngram_size: Self::NO_REPEAT_NGRAM_SIZE,
			eos_token_id,
			num_return_sequences: 1,
			seed: Self::SEED,
		}
	}

	/// The model's answer in `output`, cut back to its last complete sentence.
	fn extract(output: &str) -> String {
		truncate_to_last_sentence(text_after_marker(output, Self::MARKER)).to_string()
	}
}

/// Writes a short story from a premise.
#[derive(Debug, Clone)]
pub struct StoryPass {
	/// Where the story takes place, e.g. [`DEFAULT_SETTING`].
	setting: String,
}

impl StoryPass {
	pub fn new(setting: impl Into<String>) -> Self {
		Self { setting: setting.into() }
	}

	pub fn setting(&self) -> &str {
		&self.setting
	}
}

impl Default for StoryPass {
	fn default() -> Self {
		Self::new(DEFAULT_SETTING)
	}
}

impl Pass for StoryPass {
	const MARKER: &'static str = "Story:";
	const TEMPERATURE: f32 = 0.8;
	const TOP_K: u32 = 40;
	const TOP_P: f32 = 0.92;
	const REPETITION_PENALTY: f32 = 1.4;

	fn format(&self, prompt: &str) -> String {
		format!(
			"\nWrite a fictional short story based on the idea below. The story should be vivid, \
			 adventurous, and set in {}. It should have a clear beginning, middle, and end, and \
			 include at least one named character.\n\nPrompt: {}\n\n{}",
			self.setting,
			prompt,
			Self::MARKER
		)
	}
}

/// Rewrites an existing story for clarity, pacing and flow.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefinePass;

impl Pass for RefinePass {
	const MARKER: &'static str = "Refined Story:";
	const TEMPERATURE: f32 = 0.7;
	const TOP_K: u32 = 30;
	const TOP_P: f32 = 0.9;
	const REPETITION_PENALTY: f32 = 1.3;

	fn format(&self, story: &str) -> String {
		format!(
			"\nYou are a professional fiction editor. Take the story below and rewrite it to \
			 improve clarity, pacing, and flow. Keep the core plot and characters the same, but \
			 enhance the writing with stronger descriptions, smoother transitions, and better \
			 narrative style.\n\n\nStory:\n{}\n\n{}",
			story,
			Self::MARKER
		)
	}
}
