use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{Result, models::AgentTrace};

pub async fn insert_trace<'e, E>(executor: E, trace: &AgentTrace) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO agent_traces (
\ttrace_id,
\tmessage_id,
\tagent_type,
\toperation_type,
\tinput_data,
\toutput_data,
\tcreated_at,
\tupdated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8)",
	)
	.bind(trace.trace_id)
	.bind(trace.message_id)
	.bind(trace.agent_type.as_str())
	.bind(trace.operation_type.as_str())
	.bind(&trace.input_data)
	.bind(&trace.output_data)
	.bind(trace.created_at)
	.bind(trace.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn list_traces_for_message<'e, E>(
	executor: E,
	message_id: Uuid,
) -> Result<Vec<AgentTrace>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, AgentTrace>(
		"\
SELECT
\ttrace_id,
\tmessage_id,
\tagent_type,
\toperation_type,
\tinput_data,
\toutput_data,
\tcreated_at,
\tupdated_at
FROM agent_traces
WHERE message_id = $1
ORDER BY created_at ASC, trace_id ASC",
	)
	.bind(message_id)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn list_traces<'e, E>(
	executor: E,
	message_id: Option<Uuid>,
	agent_type: Option<&str>,
	operation_type: Option<&str>,
) -> Result<Vec<AgentTrace>>
where
	E: PgExecutor<'e>,
{
	let mut builder = sqlx::QueryBuilder::new(
		"SELECT trace_id, message_id, agent_type, operation_type, input_data, output_data, \
         created_at, updated_at FROM agent_traces WHERE TRUE",
	);

	if let Some(message_id) = message_id {
		builder.push(" AND message_id = ");
		builder.push_bind(message_id);
	}
	if let Some(agent_type) = agent_type {
		builder.push(" AND agent_type = ");
		builder.push_bind(agent_type);
	}
	if let Some(operation_type) = operation_type {
		builder.push(" AND operation_type = ");
		builder.push_bind(operation_type);
	}

	builder.push(" ORDER BY created_at ASC, trace_id ASC");

	let rows = builder.build_query_as().fetch_all(executor).await?;

	Ok(rows)
}
