//! The interaction flow of a story session.
//!
//! Every user action loads the session from the chest, runs to completion and saves the session
//! back. The chest is never locked while the model is working, so sessions do not wait on each
//! other.

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
	types::{EMPTY_PROMPT_WARNING, NOTHING_TO_REFINE_WARNING, REFINED_NOTICE},
	Loom, Prompt, SessionChestHandler, StoryError, StorySession, WordBudget,
};

/// Sessions idle for longer than this are dropped unless configured otherwise.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 3600;

/// A message shown above the story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Notice {
	/// The action was not carried out; the user may try again.
	Warning(&'static str),
	Success(&'static str),
}

/// What the page shows after an action.
#[derive(Debug, Clone, Serialize)]
pub struct StudioView {
	pub session_id: Uuid,
	pub session: StorySession,
	pub notice: Option<Notice>,
	/// Text to prefill the prompt box with.
	pub draft_prompt: String,
	/// Value to prefill the word budget control with.
	pub draft_words: WordBudget,
}

impl StudioView {
	fn new(session_id: Uuid, session: StorySession) -> Self {
		let notice = session.refine_done().then_some(Notice::Success(REFINED_NOTICE));

		Self {
			session_id,
			draft_prompt: session.prompt.clone(),
			draft_words: session.max_words,
			session,
			notice,
		}
	}

	fn warn(mut self, warning: &'static str) -> Self {
		self.notice = Some(Notice::Warning(warning));
		self
	}
}

/// Drives story sessions: generation, refinement and acknowledgement.
#[derive(Debug)]
pub struct Studio<C: SessionChestHandler> {
	chest: C,
	loom: Loom,
	session_ttl: Duration,
}

impl<C: SessionChestHandler> Studio<C> {
	pub fn new(chest: C, loom: Loom) -> Self {
		Self { chest, loom, session_ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS) }
	}

	pub fn with_session_ttl(mut self, session_ttl: Duration) -> Self {
		self.session_ttl = session_ttl;
		self
	}

	pub fn chest(&self) -> &C {
		&self.chest
	}

	pub fn loom(&self) -> &Loom {
		&self.loom
	}

	/// Start a new session, dropping sessions which have been idle for too long.
	#[instrument(skip(self))]
	pub async fn open(&self) -> Result<Uuid, StoryError> {
		self.chest.evict_idle(Utc::now() - self.session_ttl).await?;

		let session_id = self.chest.create_session().await?;

		info!("Opened session {}", session_id);

		Ok(session_id)
	}

	/// The current state of a session.
	pub async fn view(&self, session_id: Uuid) -> Result<StudioView, StoryError> {
		Ok(StudioView::new(session_id, self.load(session_id).await?))
	}

	/// Generate a story from `prompt` and make it the session's story.
	///
	/// A blank prompt never reaches the model; the view carries a warning instead.
	#[instrument(skip(self, prompt))]
	pub async fn submit(
		&self,
		session_id: Uuid,
		prompt: &str,
		max_words: WordBudget,
	) -> Result<StudioView, StoryError> {
		let mut session = self.load(session_id).await?;

		let prompt = match Prompt::parse(prompt) {
			Ok(prompt) => prompt,
			Err(e) => {
				warn!("Rejected prompt for session {}: {}", session_id, e);

				let mut view = StudioView::new(session_id, session);
				view.draft_prompt = prompt.to_string();
				view.draft_words = max_words;

				return Ok(view.warn(EMPTY_PROMPT_WARNING))
			},
		};

		let story = self.loom.weave_story(&prompt, max_words).await?;

		session.record_story(prompt, max_words, story);
		self.chest.save_session(session_id, session.clone()).await?;

		info!("Generated story for session {}", session_id);

		Ok(StudioView::new(session_id, session))
	}

	/// Rewrite the session's story in place. The previous story is discarded.
	///
	/// Uses the word budget the story was generated with.
	#[instrument(skip(self))]
	pub async fn refine(&self, session_id: Uuid) -> Result<StudioView, StoryError> {
		let mut session = self.load(session_id).await?;

		if !session.has_story() {
			return Ok(StudioView::new(session_id, session).warn(NOTHING_TO_REFINE_WARNING))
		}

		let refined = self.loom.refine_story(&session.story_text, session.max_words).await?;

		session.record_refinement(refined)?;
		self.chest.save_session(session_id, session.clone()).await?;

		info!("Refined story for session {}", session_id);

		Ok(StudioView::new(session_id, session))
	}

	/// Acknowledge a completed refinement.
	#[instrument(skip(self))]
	pub async fn acknowledge(&self, session_id: Uuid) -> Result<StudioView, StoryError> {
		let mut session = self.load(session_id).await?;

		session.acknowledge();
		self.chest.save_session(session_id, session.clone()).await?;

		Ok(StudioView::new(session_id, session))
	}

	async fn load(&self, session_id: Uuid) -> Result<StorySession, StoryError> {
		self.chest
			.get_session(session_id)
			.await?
			.ok_or(StoryError::SessionNotFound(session_id))
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;
	use crate::{mock::MockLlm, storage::MemoryChest, ModelCache, StoryPhase};

	fn studio(llm: &Arc<MockLlm>) -> Studio<MemoryChest> {
		Studio::new(
			MemoryChest::new(),
			Loom::new(ModelCache::preloaded(llm.clone()), "a mysterious jungle"),
		)
	}

	#[tokio::test]
	async fn blank_prompt_warns_without_calling_the_model() {
		let llm = Arc::new(MockLlm::counting());
		let studio = studio(&llm);
		let id = studio.open().await.unwrap();

		for blank in ["", "   ", "\n\t "] {
			let view = studio.submit(id, blank, WordBudget::default()).await.unwrap();

			assert_eq!(view.notice, Some(Notice::Warning(EMPTY_PROMPT_WARNING)));
			assert_eq!(view.session.phase, StoryPhase::Idle);
			assert_eq!(view.draft_prompt, blank);
		}

		assert!(llm.calls().is_empty());
	}

	#[tokio::test]
	async fn blank_prompt_keeps_previous_story() {
		let llm = Arc::new(MockLlm::counting());
		let studio = studio(&llm);
		let id = studio.open().await.unwrap();

		studio.submit(id, "A fox.", WordBudget::default()).await.unwrap();
		let view = studio.submit(id, " ", WordBudget::default()).await.unwrap();

		assert_eq!(view.session.prompt, "A fox.");
		assert_eq!(view.session.story_text, "Draft 1.");
		assert_eq!(llm.calls().len(), 1);
	}

	#[tokio::test]
	async fn refine_replaces_story_and_reuses_generation_budget() {
		let llm = Arc::new(MockLlm::counting());
		let studio = studio(&llm);
		let id = studio.open().await.unwrap();

		let generated = studio.submit(id, "A fox.", WordBudget::clamped(300)).await.unwrap();
		assert_eq!(generated.session.story_text, "Draft 1.");
		assert_eq!(generated.notice, None);

		let refined = studio.refine(id).await.unwrap();
		assert_eq!(refined.session.story_text, "Draft 2.");
		assert_eq!(refined.session.phase, StoryPhase::Refined);
		assert_eq!(refined.notice, Some(Notice::Success(REFINED_NOTICE)));
		assert!(!refined.session.story_text.contains("Draft 1."));

		let calls = llm.calls();
		assert!(calls[1].prompt.contains("Story:\nDraft 1.\n\nRefined Story:"));
		assert_eq!(calls[1].params.max_new_tokens, 390);

		// the notice stays until acknowledged
		assert_eq!(studio.view(id).await.unwrap().notice, Some(Notice::Success(REFINED_NOTICE)));

		let acknowledged = studio.acknowledge(id).await.unwrap();
		assert_eq!(acknowledged.session.phase, StoryPhase::Acknowledged);
		assert_eq!(acknowledged.notice, None);
		assert_eq!(acknowledged.session.story_text, "Draft 2.");
	}

	#[tokio::test]
	async fn refine_without_story_warns() {
		let llm = Arc::new(MockLlm::counting());
		let studio = studio(&llm);
		let id = studio.open().await.unwrap();

		let view = studio.refine(id).await.unwrap();

		assert_eq!(view.notice, Some(Notice::Warning(NOTHING_TO_REFINE_WARNING)));
		assert!(llm.calls().is_empty());
	}

	#[tokio::test]
	async fn model_failure_leaves_session_untouched() {
		let llm = Arc::new(MockLlm::failing());
		let studio = studio(&llm);
		let id = studio.open().await.unwrap();

		let result = studio.submit(id, "A robot discovers human emotions.", WordBudget::default()).await;

		assert!(matches!(result, Err(StoryError::Llm(_))));
		let view = studio.view(id).await.unwrap();
		assert_eq!(view.session.phase, StoryPhase::Idle);
		assert!(view.session.prompt.is_empty());
	}

	#[tokio::test]
	async fn unknown_sessions_are_reported() {
		let llm = Arc::new(MockLlm::counting());
		let studio = studio(&llm);
		let id = Uuid::new_v4();

		assert!(matches!(studio.view(id).await, Err(StoryError::SessionNotFound(missing)) if missing == id));
		assert!(matches!(
			studio.submit(id, "A fox.", WordBudget::default()).await,
			Err(StoryError::SessionNotFound(_))
		));
	}

	#[tokio::test]
	async fn opening_a_session_evicts_idle_ones() {
		let llm = Arc::new(MockLlm::counting());
		let studio = studio(&llm).with_session_ttl(Duration::seconds(60));

		let stale = studio.open().await.unwrap();
		let mut session = studio.chest().get_session(stale).await.unwrap().unwrap();
		session.updated_at = Utc::now() - Duration::seconds(120);
		studio.chest().save_session(stale, session).await.unwrap();

		let fresh = studio.open().await.unwrap();

		assert!(matches!(studio.view(stale).await, Err(StoryError::SessionNotFound(_))));
		assert!(studio.view(fresh).await.is_ok());
	}
}
