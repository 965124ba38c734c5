use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use desk_domain::metadata;
use desk_storage::{documents, models::KnowledgeDocument};

use crate::{DeskService, Error, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateDocumentRequest {
	pub title: String,
	pub content: String,
	#[serde(default)]
	pub metadata: Option<Value>,
	#[serde(default)]
	pub source_url: Option<String>,
	#[serde(default)]
	pub document_type: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DocumentView {
	pub document_id: Uuid,
	pub title: String,
	pub content: String,
	pub metadata: Value,
	pub vector_store_id: Option<String>,
	pub source_url: Option<String>,
	pub document_type: Option<String>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl DocumentView {
	/// Metadata with canonicalized keys; the raw document when it cannot be
	/// canonicalized.
	pub fn metadata_symbolized(&self) -> Value {
		metadata::symbolize(&self.metadata)
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchDocumentsRequest {
	pub query: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchDocumentsResponse {
	pub documents: Vec<DocumentView>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListDocumentsRequest {
	#[serde(default)]
	pub document_type: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListDocumentsResponse {
	pub documents: Vec<DocumentView>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpdateVectorStoreIdRequest {
	pub document_id: Uuid,
	pub vector_store_id: String,
}

impl DeskService {
	pub async fn create_document(&self, req: CreateDocumentRequest) -> Result<DocumentView> {
		if req.title.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "title is required.".to_string() });
		}
		if req.content.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "content is required.".to_string() });
		}

		let now = OffsetDateTime::now_utc();
		let doc = KnowledgeDocument {
			document_id: Uuid::new_v4(),
			title: req.title,
			content: req.content,
			metadata: metadata::normalize_document(req.metadata),
			vector_store_id: None,
			source_url: req.source_url,
			document_type: req.document_type,
			created_at: now,
			updated_at: now,
		};

		documents::insert_document(&self.db.pool, &doc).await?;

		tracing::debug!(document_id = %doc.document_id, "Stored knowledge document.");

		Ok(document_view(doc))
	}

	pub async fn get_document(&self, document_id: Uuid) -> Result<DocumentView> {
		let doc = documents::get_document(&self.db.pool, document_id).await?.ok_or_else(|| {
			Error::NotFound { message: "Knowledge document not found.".to_string() }
		})?;

		Ok(document_view(doc))
	}

	/// Case-folded substring containment against title or content, evaluated
	/// by the database. An empty query matches every document.
	pub async fn search_documents(
		&self,
		req: SearchDocumentsRequest,
	) -> Result<SearchDocumentsResponse> {
		let rows = documents::search_documents(&self.db.pool, &req.query).await?;
		let documents = rows.into_iter().map(document_view).collect();

		Ok(SearchDocumentsResponse { documents })
	}

	pub async fn list_documents(&self, req: ListDocumentsRequest) -> Result<ListDocumentsResponse> {
		if let Some(document_type) = req.document_type.as_ref()
			&& document_type.trim().is_empty()
		{
			return Err(Error::InvalidRequest {
				message: "document_type must not be empty when provided.".to_string(),
			});
		}

		let rows = documents::list_documents(&self.db.pool, req.document_type.as_deref()).await?;
		let documents = rows.into_iter().map(document_view).collect();

		Ok(ListDocumentsResponse { documents })
	}

	/// Records the identifier assigned by the out-of-process indexing
	/// pipeline once it has embedded the document.
	pub async fn update_vector_store_id(
		&self,
		req: UpdateVectorStoreIdRequest,
	) -> Result<DocumentView> {
		let vector_store_id = req.vector_store_id.trim();

		if vector_store_id.is_empty() {
			return Err(Error::InvalidRequest {
				message: "vector_store_id is required.".to_string(),
			});
		}

		let now = OffsetDateTime::now_utc();
		let updated = documents::update_vector_store_id(
			&self.db.pool,
			req.document_id,
			vector_store_id,
			now,
		)
		.await?;

		if updated == 0 {
			return Err(Error::NotFound {
				message: "Knowledge document not found.".to_string(),
			});
		}

		self.get_document(req.document_id).await
	}
}

pub(crate) fn document_view(doc: KnowledgeDocument) -> DocumentView {
	DocumentView {
		document_id: doc.document_id,
		title: doc.title,
		content: doc.content,
		metadata: doc.metadata,
		vector_store_id: doc.vector_store_id,
		source_url: doc.source_url,
		document_type: doc.document_type,
		created_at: doc.created_at,
		updated_at: doc.updated_at,
	}
}
