use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Result, models::KnowledgeDocument};

pub async fn insert_document<'e, E>(executor: E, doc: &KnowledgeDocument) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
INSERT INTO knowledge_documents (
\tdocument_id,
\ttitle,
\tcontent,
\tmetadata,
\tvector_store_id,
\tsource_url,
\tdocument_type,
\tcreated_at,
\tupdated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)",
	)
	.bind(doc.document_id)
	.bind(doc.title.as_str())
	.bind(doc.content.as_str())
	.bind(&doc.metadata)
	.bind(doc.vector_store_id.as_deref())
	.bind(doc.source_url.as_deref())
	.bind(doc.document_type.as_deref())
	.bind(doc.created_at)
	.bind(doc.updated_at)
	.execute(executor)
	.await?;

	Ok(())
}

pub async fn get_document<'e, E>(
	executor: E,
	document_id: Uuid,
) -> Result<Option<KnowledgeDocument>>
where
	E: PgExecutor<'e>,
{
	let row = sqlx::query_as::<_, KnowledgeDocument>(
		"\
SELECT
\tdocument_id,
\ttitle,
\tcontent,
\tmetadata,
\tvector_store_id,
\tsource_url,
\tdocument_type,
\tcreated_at,
\tupdated_at
FROM knowledge_documents
WHERE document_id = $1
LIMIT 1",
	)
	.bind(document_id)
	.fetch_optional(executor)
	.await?;

	Ok(row)
}

/// Case-insensitive substring match against title or content, evaluated by
/// Postgres. LIKE wildcards in the query are escaped so `%` and `_` match
/// literally.
pub async fn search_documents<'e, E>(executor: E, query: &str) -> Result<Vec<KnowledgeDocument>>
where
	E: PgExecutor<'e>,
{
	let pattern = format!("%{}%", escape_like(query));
	let rows = sqlx::query_as::<_, KnowledgeDocument>(
		"\
SELECT
\tdocument_id,
\ttitle,
\tcontent,
\tmetadata,
\tvector_store_id,
\tsource_url,
\tdocument_type,
\tcreated_at,
\tupdated_at
FROM knowledge_documents
WHERE title ILIKE $1 OR content ILIKE $1
ORDER BY created_at DESC, document_id DESC",
	)
	.bind(pattern.as_str())
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn list_documents<'e, E>(
	executor: E,
	document_type: Option<&str>,
) -> Result<Vec<KnowledgeDocument>>
where
	E: PgExecutor<'e>,
{
	let mut builder = sqlx::QueryBuilder::new(
		"SELECT document_id, title, content, metadata, vector_store_id, source_url, \
         document_type, created_at, updated_at FROM knowledge_documents",
	);

	if let Some(document_type) = document_type {
		builder.push(" WHERE document_type = ");
		builder.push_bind(document_type);
	}

	builder.push(" ORDER BY created_at DESC, document_id DESC");

	let rows = builder.build_query_as().fetch_all(executor).await?;

	Ok(rows)
}

pub async fn update_vector_store_id<'e, E>(
	executor: E,
	document_id: Uuid,
	vector_store_id: &str,
	now: OffsetDateTime,
) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
UPDATE knowledge_documents
SET vector_store_id = $1, updated_at = $2
WHERE document_id = $3",
	)
	.bind(vector_store_id)
	.bind(now)
	.bind(document_id)
	.execute(executor)
	.await?;

	Ok(result.rows_affected())
}

fn escape_like(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for ch in raw.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			out.push('\\');
		}

		out.push(ch);
	}

	out
}

#[cfg(test)]
mod tests {
	use super::escape_like;

	#[test]
	fn escapes_like_wildcards() {
		assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
		assert_eq!(escape_like("plain"), "plain");
	}
}
