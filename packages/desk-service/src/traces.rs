use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use desk_domain::metadata;
use desk_storage::{models::AgentTrace, traces};

use crate::{DeskService, Error, Result};

/// Append-only record of one agent operation observed while a message was
/// produced or processed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraceView {
	pub trace_id: Uuid,
	pub message_id: Uuid,
	pub agent_type: String,
	pub operation_type: String,
	pub input_data: Value,
	pub output_data: Value,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}
impl TraceView {
	/// Input document with canonicalized keys; the raw document when it
	/// cannot be canonicalized.
	pub fn input_data_symbolized(&self) -> Value {
		metadata::symbolize(&self.input_data)
	}

	pub fn output_data_symbolized(&self) -> Value {
		metadata::symbolize(&self.output_data)
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListTracesRequest {
	#[serde(default)]
	pub message_id: Option<Uuid>,
	#[serde(default)]
	pub agent_type: Option<String>,
	#[serde(default)]
	pub operation_type: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListTracesResponse {
	pub traces: Vec<TraceView>,
}

impl DeskService {
	pub async fn list_traces(&self, req: ListTracesRequest) -> Result<ListTracesResponse> {
		if let Some(agent_type) = req.agent_type.as_ref()
			&& agent_type.trim().is_empty()
		{
			return Err(Error::InvalidRequest {
				message: "agent_type must not be empty when provided.".to_string(),
			});
		}
		if let Some(operation_type) = req.operation_type.as_ref()
			&& operation_type.trim().is_empty()
		{
			return Err(Error::InvalidRequest {
				message: "operation_type must not be empty when provided.".to_string(),
			});
		}

		let rows = traces::list_traces(
			&self.db.pool,
			req.message_id,
			req.agent_type.as_deref(),
			req.operation_type.as_deref(),
		)
		.await?;
		let traces = rows.into_iter().map(trace_view).collect();

		Ok(ListTracesResponse { traces })
	}
}

pub(crate) fn trace_view(trace: AgentTrace) -> TraceView {
	TraceView {
		trace_id: trace.trace_id,
		message_id: trace.message_id,
		agent_type: trace.agent_type,
		operation_type: trace.operation_type,
		input_data: trace.input_data,
		output_data: trace.output_data,
		created_at: trace.created_at,
	}
}
