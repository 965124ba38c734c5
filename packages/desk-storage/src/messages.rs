use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{Result, models::Message};

pub async fn insert_message<'e, E>(executor: E, message: &Message) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO messages (
\tmessage_id,
\tsupport_session_id,
\tcontent,
\trole,
\tmetadata,
\tcreated_at,
\tupdated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7)",
	)
	.bind(message.message_id)
	.bind(message.support_session_id)
	.bind(message.content.as_str())
	.bind(message.role.as_str())
	.bind(&message.metadata)
	.bind(message.created_at)
	.bind(message.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn get_message<'e, E>(executor: E, message_id: Uuid) -> Result<Option<Message>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, Message>(
		"\
SELECT
\tmessage_id,
\tsupport_session_id,
\tcontent,
\trole,
\tmetadata,
\tcreated_at,
\tupdated_at
FROM messages
WHERE message_id = $1
LIMIT 1",
	)
	.bind(message_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

/// Conversation order: ascending creation time, ties broken by message id so
/// the ordering stays total when timestamps collide.
pub async fn list_messages_for_session<'e, E>(
	executor: E,
	support_session_id: Uuid,
	role: Option<&str>,
) -> Result<Vec<Message>>
where
	E: PgExecutor<'e>,
{
	let mut builder = sqlx::QueryBuilder::new(
		"SELECT message_id, support_session_id, content, role, metadata, created_at, updated_at \
         FROM messages WHERE support_session_id = ",
	);

	builder.push_bind(support_session_id);

	if let Some(role) = role {
		builder.push(" AND role = ");
		builder.push_bind(role);
	}

	builder.push(" ORDER BY created_at ASC, message_id ASC");

	let rows = builder.build_query_as().fetch_all(executor).await?;

	Ok(rows)
}
