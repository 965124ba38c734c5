use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct SupportSession {
	pub session_id: Uuid,
	pub user_id: i64,
	pub status: String,
	pub metadata: Value,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct Message {
	pub message_id: Uuid,
	pub support_session_id: Uuid,
	pub content: String,
	pub role: String,
	pub metadata: Value,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct AgentTrace {
	pub trace_id: Uuid,
	pub message_id: Uuid,
	pub agent_type: String,
	pub operation_type: String,
	pub input_data: Value,
	pub output_data: Value,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct SupportTicket {
	pub ticket_id: Uuid,
	pub support_session_id: Uuid,
	pub external_ticket_id: String,
	pub status: String,
	pub priority: Option<String>,
	pub description: Option<String>,
	pub metadata: Value,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub struct KnowledgeDocument {
	pub document_id: Uuid,
	pub title: String,
	pub content: String,
	pub metadata: Value,
	pub vector_store_id: Option<String>,
	pub source_url: Option<String>,
	pub document_type: Option<String>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
