use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use desk_domain::{metadata, status::TicketStatus};
use desk_storage::{models::SupportTicket, sessions, tickets};

use crate::{DeskService, Error, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpenTicketRequest {
	pub support_session_id: Uuid,
	pub external_ticket_id: String,
	#[serde(default)]
	pub status: Option<String>,
	#[serde(default)]
	pub priority: Option<String>,
	#[serde(default)]
	pub description: Option<String>,
	#[serde(default)]
	pub metadata: Option<Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TicketView {
	pub ticket_id: Uuid,
	pub support_session_id: Uuid,
	pub external_ticket_id: String,
	pub status: TicketStatus,
	pub priority: Option<String>,
	pub description: Option<String>,
	pub metadata: Value,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl TicketView {
	/// Metadata with canonicalized keys; the raw document when it cannot be
	/// canonicalized.
	pub fn metadata_symbolized(&self) -> Value {
		metadata::symbolize(&self.metadata)
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateTicketStatusRequest {
	pub ticket_id: Uuid,
	pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListTicketsRequest {
	#[serde(default)]
	pub support_session_id: Option<Uuid>,
	#[serde(default)]
	pub status: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListTicketsResponse {
	pub tickets: Vec<TicketView>,
}

impl DeskService {
	/// Opens a ticket against a session. The external ticketing system
	/// supplies `external_ticket_id`; the unique index on that column is what
	/// rejects a duplicate, so two concurrent opens cannot both win.
	pub async fn open_ticket(&self, req: OpenTicketRequest) -> Result<TicketView> {
		let external_ticket_id = req.external_ticket_id.trim();

		if external_ticket_id.is_empty() {
			return Err(Error::InvalidRequest {
				message: "external_ticket_id is required.".to_string(),
			});
		}

		let status = match req.status.as_deref() {
			Some(raw) => TicketStatus::parse(raw.trim()).ok_or_else(|| Error::InvalidRequest {
				message: "status must be one of open, in_progress, resolved, or closed."
					.to_string(),
			})?,
			None => TicketStatus::Open,
		};

		if sessions::get_session(&self.db.pool, req.support_session_id).await?.is_none() {
			return Err(Error::NotFound { message: "Support session not found.".to_string() });
		}

		let now = OffsetDateTime::now_utc();
		let ticket = SupportTicket {
			ticket_id: Uuid::new_v4(),
			support_session_id: req.support_session_id,
			external_ticket_id: external_ticket_id.to_string(),
			status: status.as_str().to_string(),
			priority: req.priority,
			description: req.description,
			metadata: metadata::normalize_document(req.metadata),
			created_at: now,
			updated_at: now,
		};

		match tickets::insert_ticket(&self.db.pool, &ticket).await {
			Ok(()) => {},
			Err(err) if err.is_unique_violation() =>
				return Err(Error::Conflict {
					message: format!(
						"external_ticket_id {:?} is already in use.",
						ticket.external_ticket_id
					),
				}),
			Err(err) => return Err(err.into()),
		}

		tracing::debug!(
			ticket_id = %ticket.ticket_id,
			external_ticket_id = %ticket.external_ticket_id,
			"Opened support ticket."
		);

		ticket_view(ticket)
	}

	pub async fn get_ticket(&self, ticket_id: Uuid) -> Result<TicketView> {
		let ticket = tickets::get_ticket(&self.db.pool, ticket_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: "Support ticket not found.".to_string() })?;

		ticket_view(ticket)
	}

	/// Unconditional status replacement. There is no transition graph:
	/// closed tickets may reopen.
	pub async fn update_ticket_status(
		&self,
		req: UpdateTicketStatusRequest,
	) -> Result<TicketView> {
		let status = TicketStatus::parse(req.status.trim()).ok_or_else(|| {
			Error::InvalidRequest {
				message: "status must be one of open, in_progress, resolved, or closed."
					.to_string(),
			}
		})?;
		let now = OffsetDateTime::now_utc();
		let updated =
			tickets::update_ticket_status(&self.db.pool, req.ticket_id, status.as_str(), now)
				.await?;

		if updated == 0 {
			return Err(Error::NotFound { message: "Support ticket not found.".to_string() });
		}

		self.get_ticket(req.ticket_id).await
	}

	pub async fn list_tickets(&self, req: ListTicketsRequest) -> Result<ListTicketsResponse> {
		let status = parse_status_filter(req.status.as_deref())?;
		let rows = tickets::list_tickets(
			&self.db.pool,
			req.support_session_id,
			status.map(|status| status.as_str()),
		)
		.await?;
		let tickets = rows.into_iter().map(ticket_view).collect::<Result<Vec<_>>>()?;

		Ok(ListTicketsResponse { tickets })
	}
}

pub(crate) fn ticket_view(ticket: SupportTicket) -> Result<TicketView> {
	let status = crate::stored_ticket_status(&ticket.status)?;

	Ok(TicketView {
		ticket_id: ticket.ticket_id,
		support_session_id: ticket.support_session_id,
		external_ticket_id: ticket.external_ticket_id,
		status,
		priority: ticket.priority,
		description: ticket.description,
		metadata: ticket.metadata,
		created_at: ticket.created_at,
		updated_at: ticket.updated_at,
	})
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<TicketStatus>> {
	let Some(raw) = raw else {
		return Ok(None);
	};

	TicketStatus::parse(raw.trim()).map(Some).ok_or_else(|| Error::InvalidRequest {
		message: "status must be one of open, in_progress, resolved, or closed.".to_string(),
	})
}
