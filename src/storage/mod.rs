use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{StoryError, StorySession};

mod memory;

pub use memory::MemoryChest;

/// A storage handler trait designed for saving and retrieving story sessions.
///
/// # Usage
///
/// Implementations of `SessionChestHandler` decide where the [`StorySession`]s live for the
/// lifetime of a session. [`MemoryChest`] keeps them in process memory, which is all InkSpire
/// needs since sessions never outlive the process.
#[async_trait]
pub trait SessionChestHandler: Send + Sync + 'static {
	fn new() -> Self
	where
		Self: Sized;

	/// Creates an empty session and returns its identifier.
	async fn create_session(&self) -> crate::Result<Uuid, StoryError>;
	/// Retrieves a session.
	///
	/// Returns `Ok(None)` if no session is stored under `session_id`.
	async fn get_session(&self, session_id: Uuid) -> crate::Result<Option<StorySession>, StoryError>;
	/// Saves a session, replacing any previous state stored under `session_id`.
	async fn save_session(
		&self,
		session_id: Uuid,
		session: StorySession,
	) -> crate::Result<(), StoryError>;
	/// Deletes every session last updated before `cutoff`.
	///
	/// Returns the number of deleted sessions.
	async fn evict_idle(&self, cutoff: DateTime<Utc>) -> crate::Result<usize, StoryError>;
}
