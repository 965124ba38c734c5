use serde::{Deserialize, Serialize};

use crate::role::MessageRole;

/// The `{role, content}` projection handed to a completion API. Everything
/// else on a message (metadata, traces, timestamps) stays behind.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct LlmMessage {
	pub role: MessageRole,
	pub content: String,
}

pub fn as_llm_message(role: MessageRole, content: &str) -> LlmMessage {
	LlmMessage { role, content: content.to_string() }
}
