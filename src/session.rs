//! Per-session story state and the interaction state machine.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{StoryError, WordBudget};

/// A story premise supplied by the user.
///
/// Can only be built from text containing at least one non-whitespace character. The text is kept
/// as typed, surrounding whitespace included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
	pub fn parse(input: impl Into<String>) -> Result<Self, StoryError> {
		let input = input.into();
		if input.trim().is_empty() {
			return Err(StoryError::EmptyPrompt)
		}

		Ok(Self(input))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn into_inner(self) -> String {
		self.0
	}
}

/// Where a session stands in the generate / refine / acknowledge flow.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryPhase {
	/// No story yet.
	#[default]
	Idle,
	/// A story was generated from the prompt.
	Generated,
	/// The story was just refined and the user has not acknowledged it yet.
	Refined,
	/// The user acknowledged the refinement.
	Acknowledged,
}

/// Everything remembered about one user's session.
#[derive(Debug, Clone, Serialize)]
pub struct StorySession {
	/// The last prompt a story was generated from.
	pub prompt: String,
	/// The current story. Replaced wholesale by every generation and refinement.
	pub story_text: String,
	/// Word budget the current story was generated with.
	pub max_words: WordBudget,
	pub phase: StoryPhase,
	#[serde(skip)]
	pub updated_at: DateTime<Utc>,
}

impl Default for StorySession {
	fn default() -> Self {
		Self {
			prompt: String::new(),
			story_text: String::new(),
			max_words: WordBudget::default(),
			phase: StoryPhase::Idle,
			updated_at: Utc::now(),
		}
	}
}

impl StorySession {
	pub fn new() -> Self {
		Self::default()
	}

	/// A refinement has completed and awaits acknowledgement.
	pub fn refine_done(&self) -> bool {
		self.phase == StoryPhase::Refined
	}

	pub fn has_story(&self) -> bool {
		!self.story_text.is_empty()
	}

	/// Replace the session's story with a freshly generated one.
	///
	/// Allowed from every phase; moves to [`StoryPhase::Generated`].
	pub fn record_story(&mut self, prompt: Prompt, max_words: WordBudget, story_text: String) {
		self.prompt = prompt.into_inner();
		self.max_words = max_words;
		self.story_text = story_text;
		self.phase = StoryPhase::Generated;
		self.touch();
	}

	/// Overwrite the story with its refined version. The previous text is dropped.
	pub fn record_refinement(&mut self, refined_text: String) -> Result<(), StoryError> {
		if !self.has_story() {
			return Err(StoryError::NothingToRefine)
		}

		self.story_text = refined_text;
		self.phase = StoryPhase::Refined;
		self.touch();

		Ok(())
	}

	/// Acknowledge a completed refinement.
	///
	/// Only moves out of [`StoryPhase::Refined`]; any other phase is left as is.
	pub fn acknowledge(&mut self) {
		if self.phase == StoryPhase::Refined {
			self.phase = StoryPhase::Acknowledged;
			self.touch();
		}
	}

	fn touch(&mut self) {
		self.updated_at = Utc::now();
	}
}
