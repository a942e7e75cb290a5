use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::SessionChestHandler;
use crate::{StoryError, StorySession};

/// Default implementation of [`SessionChestHandler`].
///
/// Keeps every session in a map guarded by an async read/write lock.
#[derive(Debug, Default)]
pub struct MemoryChest {
	sessions: RwLock<HashMap<Uuid, StorySession>>,
}

impl MemoryChest {
	/// Number of live sessions.
	pub async fn len(&self) -> usize {
		self.sessions.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.sessions.read().await.is_empty()
	}
}

#[async_trait]
impl SessionChestHandler for MemoryChest {
	fn new() -> Self {
		Self::default()
	}

	#[instrument(skip(self))]
	async fn create_session(&self) -> crate::Result<Uuid, StoryError> {
		let session_id = Uuid::new_v4();
		self.sessions.write().await.insert(session_id, StorySession::new());

		debug!("Created session {}", session_id);

		Ok(session_id)
	}

	async fn get_session(&self, session_id: Uuid) -> crate::Result<Option<StorySession>, StoryError> {
		Ok(self.sessions.read().await.get(&session_id).cloned())
	}

	async fn save_session(
		&self,
		session_id: Uuid,
		session: StorySession,
	) -> crate::Result<(), StoryError> {
		self.sessions.write().await.insert(session_id, session);

		debug!("Saved session {}", session_id);

		Ok(())
	}

	#[instrument(skip(self))]
	async fn evict_idle(&self, cutoff: DateTime<Utc>) -> crate::Result<usize, StoryError> {
		let mut sessions = self.sessions.write().await;
		let before = sessions.len();
		sessions.retain(|_, session| session.updated_at >= cutoff);
		let evicted = before - sessions.len();

		if evicted > 0 {
			debug!("Evicted {} idle sessions", evicted);
		}

		Ok(evicted)
	}
}
