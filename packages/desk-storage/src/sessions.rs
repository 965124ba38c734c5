use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Result, models::SupportSession};

pub async fn insert_session<'e, E>(executor: E, session: &SupportSession) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO support_sessions (
\tsession_id,
\tuser_id,
\tstatus,
\tmetadata,
\tcreated_at,
\tupdated_at
)
VALUES ($1,$2,$3,$4,$5,$6)",
	)
	.bind(session.session_id)
	.bind(session.user_id)
	.bind(session.status.as_str())
	.bind(&session.metadata)
	.bind(session.created_at)
	.bind(session.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn get_session<'e, E>(executor: E, session_id: Uuid) -> Result<Option<SupportSession>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, SupportSession>(
		"\
SELECT
\tsession_id,
\tuser_id,
\tstatus,
\tmetadata,
\tcreated_at,
\tupdated_at
FROM support_sessions
WHERE session_id = $1
LIMIT 1",
	)
	.bind(session_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

pub async fn list_sessions<'e, E>(executor: E, status: Option<&str>) -> Result<Vec<SupportSession>>
where
	E: PgExecutor<'e>,
{
	let mut builder = sqlx::QueryBuilder::new(
		"SELECT session_id, user_id, status, metadata, created_at, updated_at \
         FROM support_sessions",
	);

	if let Some(status) = status {
		builder.push(" WHERE status = ");
		builder.push_bind(status);
	}

	builder.push(" ORDER BY created_at DESC, session_id DESC");

	let rows = builder.build_query_as().fetch_all(executor).await?;

	Ok(rows)
}

pub async fn update_session_status<'e, E>(
	executor: E,
	session_id: Uuid,
	status: &str,
	now: OffsetDateTime,
) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE support_sessions
SET status = $1, updated_at = $2
WHERE session_id = $3",
	)
	.bind(status)
	.bind(now)
	.bind(session_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected())
}

/// Messages (and their traces) and tickets go with the session via the
/// cascading foreign keys; the whole removal is one atomic statement.
pub async fn delete_session<'e, E>(executor: E, session_id: Uuid) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM support_sessions WHERE session_id = $1")
		.bind(session_id)
		.execute(executor)
		.await?;

	Ok(result.rows_affected())
}
