pub mod documents;
pub mod messages;
pub mod sessions;
pub mod tickets;
pub mod time_serde;
pub mod traces;

mod error;

pub use error::{Error, Result};

pub use documents::{
	CreateDocumentRequest, DocumentView, ListDocumentsRequest, ListDocumentsResponse,
	SearchDocumentsRequest, SearchDocumentsResponse, UpdateVectorStoreIdRequest,
};
pub use messages::{
	CreateMessageRequest, ListMessagesRequest, ListMessagesResponse, MessageView, TraceInput,
};
pub use sessions::{
	ConversationHistoryResponse, CreateSessionRequest, HistoryEntry, ListSessionsRequest,
	ListSessionsResponse, SessionView, UpdateSessionStatusRequest,
};
pub use tickets::{
	ListTicketsRequest, ListTicketsResponse, OpenTicketRequest, TicketView,
	UpdateTicketStatusRequest,
};
pub use traces::{ListTracesRequest, ListTracesResponse, TraceView};

use desk_domain::{
	role::MessageRole,
	status::{SessionStatus, TicketStatus},
};
use desk_storage::db::Db;

pub struct DeskService {
	pub db: Db,
}
impl DeskService {
	pub fn new(db: Db) -> Self {
		Self { db }
	}
}

// Stored enum columns are written through the typed parsers, so a failure
// here means the row was corrupted outside this service.

pub(crate) fn stored_role(raw: &str) -> Result<MessageRole> {
	MessageRole::parse(raw)
		.ok_or_else(|| Error::Storage { message: format!("Stored role {raw:?} is not recognized.") })
}

pub(crate) fn stored_session_status(raw: &str) -> Result<SessionStatus> {
	SessionStatus::parse(raw).ok_or_else(|| Error::Storage {
		message: format!("Stored session status {raw:?} is not recognized."),
	})
}

pub(crate) fn stored_ticket_status(raw: &str) -> Result<TicketStatus> {
	TicketStatus::parse(raw).ok_or_else(|| Error::Storage {
		message: format!("Stored ticket status {raw:?} is not recognized."),
	})
}
