use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use desk_domain::{
	llm::{LlmMessage, as_llm_message},
	metadata,
	role::MessageRole,
	status::SessionStatus,
};
use desk_storage::{messages, models::SupportSession, sessions};

use crate::{DeskService, Error, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateSessionRequest {
	pub user_id: i64,
	#[serde(default)]
	pub metadata: Option<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionView {
	pub session_id: Uuid,
	pub user_id: i64,
	pub status: SessionStatus,
	pub metadata: Value,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListSessionsRequest {
	#[serde(default)]
	pub status: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListSessionsResponse {
	pub sessions: Vec<SessionView>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateSessionStatusRequest {
	pub session_id: Uuid,
	pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
	pub role: MessageRole,
	pub content: String,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationHistoryResponse {
	pub entries: Vec<HistoryEntry>,
}

impl DeskService {
	pub async fn create_session(&self, req: CreateSessionRequest) -> Result<SessionView> {
		let now = OffsetDateTime::now_utc();
		let session = SupportSession {
			session_id: Uuid::new_v4(),
			user_id: req.user_id,
			status: SessionStatus::Active.as_str().to_string(),
			metadata: metadata::normalize_document(req.metadata),
			created_at: now,
			updated_at: now,
		};

		sessions::insert_session(&self.db.pool, &session).await?;

		tracing::debug!(session_id = %session.session_id, "Opened support session.");

		session_view(session)
	}

	pub async fn get_session(&self, session_id: Uuid) -> Result<SessionView> {
		let session = sessions::get_session(&self.db.pool, session_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: "Support session not found.".to_string() })?;

		session_view(session)
	}

	pub async fn list_sessions(&self, req: ListSessionsRequest) -> Result<ListSessionsResponse> {
		let status = parse_status_filter(req.status.as_deref())?;
		let rows =
			sessions::list_sessions(&self.db.pool, status.map(|status| status.as_str())).await?;
		let sessions = rows.into_iter().map(session_view).collect::<Result<Vec<_>>>()?;

		Ok(ListSessionsResponse { sessions })
	}

	/// Any status in the set may replace any other; the surrounding workflow
	/// owns the lifecycle.
	pub async fn update_session_status(
		&self,
		req: UpdateSessionStatusRequest,
	) -> Result<SessionView> {
		let status = SessionStatus::parse(req.status.trim()).ok_or_else(|| {
			Error::InvalidRequest {
				message: "status must be one of active, archived, or closed.".to_string(),
			}
		})?;
		let now = OffsetDateTime::now_utc();
		let updated =
			sessions::update_session_status(&self.db.pool, req.session_id, status.as_str(), now)
				.await?;

		if updated == 0 {
			return Err(Error::NotFound { message: "Support session not found.".to_string() });
		}

		self.get_session(req.session_id).await
	}

	pub async fn delete_session(&self, session_id: Uuid) -> Result<()> {
		let deleted = sessions::delete_session(&self.db.pool, session_id).await?;

		if deleted == 0 {
			return Err(Error::NotFound { message: "Support session not found.".to_string() });
		}

		tracing::debug!(%session_id, "Deleted support session and its dependents.");

		Ok(())
	}

	/// The full conversation in ascending creation order. Materialized
	/// eagerly; conversations stay small.
	pub async fn conversation_history(
		&self,
		session_id: Uuid,
	) -> Result<ConversationHistoryResponse> {
		if sessions::get_session(&self.db.pool, session_id).await?.is_none() {
			return Err(Error::NotFound { message: "Support session not found.".to_string() });
		}

		let rows = messages::list_messages_for_session(&self.db.pool, session_id, None).await?;
		let entries = rows
			.into_iter()
			.map(|message| {
				let role = crate::stored_role(&message.role)?;

				Ok(HistoryEntry { role, content: message.content, created_at: message.created_at })
			})
			.collect::<Result<Vec<_>>>()?;

		Ok(ConversationHistoryResponse { entries })
	}

	/// History reduced to the `{role, content}` pairs a completion API takes.
	pub async fn conversation_as_llm(&self, session_id: Uuid) -> Result<Vec<LlmMessage>> {
		let history = self.conversation_history(session_id).await?;

		Ok(history
			.entries
			.into_iter()
			.map(|entry| as_llm_message(entry.role, &entry.content))
			.collect())
	}
}

pub(crate) fn session_view(session: SupportSession) -> Result<SessionView> {
	let status = crate::stored_session_status(&session.status)?;

	Ok(SessionView {
		session_id: session.session_id,
		user_id: session.user_id,
		status,
		metadata: session.metadata,
		created_at: session.created_at,
		updated_at: session.updated_at,
	})
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<SessionStatus>> {
	let Some(raw) = raw else {
		return Ok(None);
	};

	SessionStatus::parse(raw.trim()).map(Some).ok_or_else(|| Error::InvalidRequest {
		message: "status must be one of active, archived, or closed.".to_string(),
	})
}
