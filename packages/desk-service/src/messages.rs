use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use desk_domain::{
	llm::{LlmMessage, as_llm_message},
	metadata,
	role::MessageRole,
};
use desk_storage::{
	messages,
	models::{AgentTrace, Message},
	sessions, traces,
};

use crate::{
	DeskService, Error, Result,
	traces::{TraceView, trace_view},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraceInput {
	pub agent_type: String,
	pub operation_type: String,
	#[serde(default)]
	pub input_data: Option<Value>,
	#[serde(default)]
	pub output_data: Option<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateMessageRequest {
	pub support_session_id: Uuid,
	pub content: String,
	pub role: String,
	#[serde(default)]
	pub metadata: Option<Value>,
	#[serde(default)]
	pub traces: Vec<TraceInput>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageView {
	pub message_id: Uuid,
	pub support_session_id: Uuid,
	pub content: String,
	pub role: MessageRole,
	pub metadata: Value,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
	pub traces: Vec<TraceView>,
}
impl MessageView {
	pub fn as_llm_message(&self) -> LlmMessage {
		as_llm_message(self.role, &self.content)
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListMessagesRequest {
	pub support_session_id: Uuid,
	#[serde(default)]
	pub role: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListMessagesResponse {
	pub messages: Vec<MessageView>,
}

impl DeskService {
	/// Records one conversation turn and the agent operations behind it as a
	/// single unit: either the message and every trace land, or nothing does.
	pub async fn create_message_with_traces(
		&self,
		req: CreateMessageRequest,
	) -> Result<MessageView> {
		if req.content.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "content is required.".to_string() });
		}

		let role = MessageRole::parse(req.role.trim()).ok_or_else(|| Error::InvalidRequest {
			message: "role must be one of user, assistant, or system.".to_string(),
		})?;

		for (idx, trace) in req.traces.iter().enumerate() {
			if trace.agent_type.trim().is_empty() {
				return Err(Error::InvalidRequest {
					message: format!("traces[{idx}].agent_type is required."),
				});
			}
			if trace.operation_type.trim().is_empty() {
				return Err(Error::InvalidRequest {
					message: format!("traces[{idx}].operation_type is required."),
				});
			}
		}

		let now = OffsetDateTime::now_utc();
		let mut tx = self.db.pool.begin().await?;

		if sessions::get_session(&mut *tx, req.support_session_id).await?.is_none() {
			return Err(Error::NotFound { message: "Support session not found.".to_string() });
		}

		let message = Message {
			message_id: Uuid::new_v4(),
			support_session_id: req.support_session_id,
			content: req.content,
			role: role.as_str().to_string(),
			metadata: metadata::normalize_document(req.metadata),
			created_at: now,
			updated_at: now,
		};

		messages::insert_message(&mut *tx, &message).await?;

		let mut recorded = Vec::with_capacity(req.traces.len());

		for input in req.traces {
			let trace = AgentTrace {
				trace_id: Uuid::new_v4(),
				message_id: message.message_id,
				agent_type: input.agent_type,
				operation_type: input.operation_type,
				input_data: metadata::normalize_document(input.input_data),
				output_data: metadata::normalize_document(input.output_data),
				created_at: now,
				updated_at: now,
			};

			traces::insert_trace(&mut *tx, &trace).await?;

			recorded.push(trace);
		}

		tx.commit().await?;

		tracing::debug!(
			message_id = %message.message_id,
			trace_count = recorded.len(),
			"Recorded message with traces."
		);

		message_view(message, recorded)
	}

	pub async fn list_messages(&self, req: ListMessagesRequest) -> Result<ListMessagesResponse> {
		let role = parse_role_filter(req.role.as_deref())?;
		let rows = messages::list_messages_for_session(
			&self.db.pool,
			req.support_session_id,
			role.map(|role| role.as_str()),
		)
		.await?;
		let mut views = Vec::with_capacity(rows.len());

		for row in rows {
			let recorded = traces::list_traces_for_message(&self.db.pool, row.message_id).await?;

			views.push(message_view(row, recorded)?);
		}

		Ok(ListMessagesResponse { messages: views })
	}
}

pub(crate) fn message_view(message: Message, recorded: Vec<AgentTrace>) -> Result<MessageView> {
	let role = crate::stored_role(&message.role)?;

	Ok(MessageView {
		message_id: message.message_id,
		support_session_id: message.support_session_id,
		content: message.content,
		role,
		metadata: message.metadata,
		created_at: message.created_at,
		updated_at: message.updated_at,
		traces: recorded.into_iter().map(trace_view).collect(),
	})
}

fn parse_role_filter(raw: Option<&str>) -> Result<Option<MessageRole>> {
	let Some(raw) = raw else {
		return Ok(None);
	};

	MessageRole::parse(raw.trim()).map(Some).ok_or_else(|| Error::InvalidRequest {
		message: "role must be one of user, assistant, or system.".to_string(),
	})
}
