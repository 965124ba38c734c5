use std::time::Duration;

use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::{HeaderValue, Method, StatusCode, header},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use uuid::Uuid;

use desk_service::{
	ConversationHistoryResponse, CreateDocumentRequest, CreateMessageRequest,
	CreateSessionRequest, DocumentView, ListDocumentsRequest, ListDocumentsResponse,
	ListMessagesRequest, ListMessagesResponse, ListSessionsRequest, ListSessionsResponse,
	ListTicketsRequest, ListTicketsResponse, ListTracesRequest, ListTracesResponse, MessageView,
	OpenTicketRequest, SearchDocumentsRequest, SearchDocumentsResponse, SessionView, TicketView,
	UpdateSessionStatusRequest, UpdateTicketStatusRequest, UpdateVectorStoreIdRequest,
};

use crate::state::AppState;

pub fn router(state: AppState, cors: &desk_config::Cors) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/sessions", post(create_session).get(list_sessions))
		.route("/v1/sessions/{session_id}", get(get_session).delete(delete_session))
		.route("/v1/sessions/{session_id}/status", post(update_session_status))
		.route("/v1/sessions/{session_id}/history", get(conversation_history))
		.route("/v1/messages", post(create_message).get(list_messages))
		.route("/v1/traces", get(list_traces))
		.route("/v1/tickets", post(open_ticket).get(list_tickets))
		.route("/v1/tickets/{ticket_id}", get(get_ticket))
		.route("/v1/tickets/{ticket_id}/status", post(update_ticket_status))
		.route("/v1/documents", post(create_document).get(list_documents))
		.route("/v1/documents/search", post(search_documents))
		.route("/v1/documents/{document_id}", get(get_document))
		.route("/v1/documents/{document_id}/vector_store_id", post(update_vector_store_id))
		.layer(cors_layer(cors))
		.with_state(state)
}

/// CORS is configuration-driven; a wildcard origin list opens the API to any
/// origin but never together with credentials.
fn cors_layer(cors: &desk_config::Cors) -> CorsLayer {
	let wildcard = cors.allowed_origins.iter().any(|origin| origin == "*");
	let origin = if wildcard {
		AllowOrigin::any()
	} else {
		AllowOrigin::list(
			cors.allowed_origins.iter().filter_map(|origin| origin.parse::<HeaderValue>().ok()),
		)
	};
	let layer = CorsLayer::new()
		.allow_origin(origin)
		.allow_methods([
			Method::GET,
			Method::POST,
			Method::PUT,
			Method::PATCH,
			Method::DELETE,
			Method::OPTIONS,
			Method::HEAD,
		])
		.allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
		.max_age(Duration::from_secs(cors.max_age_secs));

	if cors.allow_credentials && !wildcard { layer.allow_credentials(true) } else { layer }
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn create_session(
	State(state): State<AppState>,
	Json(payload): Json<CreateSessionRequest>,
) -> Result<Json<SessionView>, ApiError> {
	let response = state.service.create_session(payload).await?;

	Ok(Json(response))
}

async fn list_sessions(
	State(state): State<AppState>,
	Query(payload): Query<ListSessionsRequest>,
) -> Result<Json<ListSessionsResponse>, ApiError> {
	let response = state.service.list_sessions(payload).await?;

	Ok(Json(response))
}

async fn get_session(
	State(state): State<AppState>,
	Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
	let response = state.service.get_session(session_id).await?;

	Ok(Json(response))
}

async fn delete_session(
	State(state): State<AppState>,
	Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
	state.service.delete_session(session_id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn update_session_status(
	State(state): State<AppState>,
	Path(session_id): Path<Uuid>,
	Json(payload): Json<StatusBody>,
) -> Result<Json<SessionView>, ApiError> {
	let response = state
		.service
		.update_session_status(UpdateSessionStatusRequest { session_id, status: payload.status })
		.await?;

	Ok(Json(response))
}

async fn conversation_history(
	State(state): State<AppState>,
	Path(session_id): Path<Uuid>,
) -> Result<Json<ConversationHistoryResponse>, ApiError> {
	let response = state.service.conversation_history(session_id).await?;

	Ok(Json(response))
}

async fn create_message(
	State(state): State<AppState>,
	Json(payload): Json<CreateMessageRequest>,
) -> Result<Json<MessageView>, ApiError> {
	let response = state.service.create_message_with_traces(payload).await?;

	Ok(Json(response))
}

async fn list_messages(
	State(state): State<AppState>,
	Query(payload): Query<ListMessagesRequest>,
) -> Result<Json<ListMessagesResponse>, ApiError> {
	let response = state.service.list_messages(payload).await?;

	Ok(Json(response))
}

async fn list_traces(
	State(state): State<AppState>,
	Query(payload): Query<ListTracesRequest>,
) -> Result<Json<ListTracesResponse>, ApiError> {
	let response = state.service.list_traces(payload).await?;

	Ok(Json(response))
}

async fn open_ticket(
	State(state): State<AppState>,
	Json(payload): Json<OpenTicketRequest>,
) -> Result<Json<TicketView>, ApiError> {
	let response = state.service.open_ticket(payload).await?;

	Ok(Json(response))
}

async fn list_tickets(
	State(state): State<AppState>,
	Query(payload): Query<ListTicketsRequest>,
) -> Result<Json<ListTicketsResponse>, ApiError> {
	let response = state.service.list_tickets(payload).await?;

	Ok(Json(response))
}

async fn get_ticket(
	State(state): State<AppState>,
	Path(ticket_id): Path<Uuid>,
) -> Result<Json<TicketView>, ApiError> {
	let response = state.service.get_ticket(ticket_id).await?;

	Ok(Json(response))
}

async fn update_ticket_status(
	State(state): State<AppState>,
	Path(ticket_id): Path<Uuid>,
	Json(payload): Json<StatusBody>,
) -> Result<Json<TicketView>, ApiError> {
	let response = state
		.service
		.update_ticket_status(UpdateTicketStatusRequest { ticket_id, status: payload.status })
		.await?;

	Ok(Json(response))
}

async fn create_document(
	State(state): State<AppState>,
	Json(payload): Json<CreateDocumentRequest>,
) -> Result<Json<DocumentView>, ApiError> {
	let response = state.service.create_document(payload).await?;

	Ok(Json(response))
}

async fn list_documents(
	State(state): State<AppState>,
	Query(payload): Query<ListDocumentsRequest>,
) -> Result<Json<ListDocumentsResponse>, ApiError> {
	let response = state.service.list_documents(payload).await?;

	Ok(Json(response))
}

async fn get_document(
	State(state): State<AppState>,
	Path(document_id): Path<Uuid>,
) -> Result<Json<DocumentView>, ApiError> {
	let response = state.service.get_document(document_id).await?;

	Ok(Json(response))
}

async fn search_documents(
	State(state): State<AppState>,
	Json(payload): Json<SearchDocumentsRequest>,
) -> Result<Json<SearchDocumentsResponse>, ApiError> {
	let response = state.service.search_documents(payload).await?;

	Ok(Json(response))
}

async fn update_vector_store_id(
	State(state): State<AppState>,
	Path(document_id): Path<Uuid>,
	Json(payload): Json<VectorStoreBody>,
) -> Result<Json<DocumentView>, ApiError> {
	let response = state
		.service
		.update_vector_store_id(UpdateVectorStoreIdRequest {
			document_id,
			vector_store_id: payload.vector_store_id,
		})
		.await?;

	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct StatusBody {
	status: String,
}

#[derive(Debug, Deserialize)]
struct VectorStoreBody {
	vector_store_id: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: String,
}

struct ApiError(desk_service::Error);

impl From<desk_service::Error> for ApiError {
	fn from(err: desk_service::Error) -> Self {
		Self(err)
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = match &self.0 {
			desk_service::Error::InvalidRequest { .. } => StatusCode::UNPROCESSABLE_ENTITY,
			desk_service::Error::NotFound { .. } => StatusCode::NOT_FOUND,
			desk_service::Error::Conflict { .. } => StatusCode::CONFLICT,
			desk_service::Error::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
		};

		if status == StatusCode::INTERNAL_SERVER_ERROR {
			tracing::error!(error = %self.0, "Request failed in storage.");
		}

		(status, Json(ErrorBody { error: self.0.to_string() })).into_response()
	}
}
