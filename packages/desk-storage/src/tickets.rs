use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Result, models::SupportTicket};

/// The unique index on `external_ticket_id` is the uniqueness check; a
/// duplicate insert surfaces as a database error (SQLSTATE 23505) rather
/// than a read-then-write race.
pub async fn insert_ticket<'e, E>(executor: E, ticket: &SupportTicket) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO support_tickets (
\tticket_id,
\tsupport_session_id,
\texternal_ticket_id,
\tstatus,
\tpriority,
\tdescription,
\tmetadata,
\tcreated_at,
\tupdated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)",
	)
	.bind(ticket.ticket_id)
	.bind(ticket.support_session_id)
	.bind(ticket.external_ticket_id.as_str())
	.bind(ticket.status.as_str())
	.bind(ticket.priority.as_deref())
	.bind(ticket.description.as_deref())
	.bind(&ticket.metadata)
	.bind(ticket.created_at)
	.bind(ticket.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn get_ticket<'e, E>(executor: E, ticket_id: Uuid) -> Result<Option<SupportTicket>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, SupportTicket>(
		"\
SELECT
\tticket_id,
\tsupport_session_id,
\texternal_ticket_id,
\tstatus,
\tpriority,
\tdescription,
\tmetadata,
\tcreated_at,
\tupdated_at
FROM support_tickets
WHERE ticket_id = $1
LIMIT 1",
	)
	.bind(ticket_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn update_ticket_status<'e, E>(
	executor: E,
	ticket_id: Uuid,
	status: &str,
	now: OffsetDateTime,
) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE support_tickets
SET status = $1, updated_at = $2
WHERE ticket_id = $3",
	)
	.bind(status)
	.bind(now)
	.bind(ticket_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected())
}

pub async fn list_tickets<'e, E>(
	executor: E,
	support_session_id: Option<Uuid>,
	status: Option<&str>,
) -> Result<Vec<SupportTicket>>
where
	E: PgExecutor<'e>,
{
	let mut builder = sqlx::QueryBuilder::new(
		"SELECT ticket_id, support_session_id, external_ticket_id, status, priority, \
         description, metadata, created_at, updated_at FROM support_tickets WHERE TRUE",
	);

	if let Some(support_session_id) = support_session_id {
		builder.push(" AND support_session_id = ");
		builder.push_bind(support_session_id);
	}
	if let Some(status) = status {
		builder.push(" AND status = ");
		builder.push_bind(status);
	}

	builder.push(" ORDER BY created_at DESC, ticket_id DESC");

	let rows = builder.build_query_as().fetch_all(executor).await?;

	Ok(rows)
}
