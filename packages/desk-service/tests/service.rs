use serde_json::json;
use uuid::Uuid;

use desk_config::Postgres;
use desk_service::{
	CreateDocumentRequest, CreateMessageRequest, CreateSessionRequest, DeskService, Error,
	ListMessagesRequest, ListSessionsRequest, ListTracesRequest, OpenTicketRequest,
	SearchDocumentsRequest, TraceInput, UpdateSessionStatusRequest, UpdateTicketStatusRequest,
	UpdateVectorStoreIdRequest,
};
use desk_storage::db::Db;
use desk_testkit::TestDatabase;

async fn service_on(test_db: &TestDatabase) -> DeskService {
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	DeskService::new(db)
}

fn user_turn(session_id: Uuid, content: &str) -> CreateMessageRequest {
	CreateMessageRequest {
		support_session_id: session_id,
		content: content.to_string(),
		role: "user".to_string(),
		metadata: None,
		traces: Vec::new(),
	}
}

async fn count(service: &DeskService, table: &str) -> i64 {
	sqlx::query_scalar(&format!("SELECT count(*) FROM {table}"))
		.fetch_one(&service.db.pool)
		.await
		.expect("Failed to count rows.")
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DESK_PG_DSN to run."]
async fn create_message_with_traces_persists_the_whole_unit() {
	let Some(base_dsn) = desk_testkit::env_dsn() else {
		eprintln!("Skipping; set DESK_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_on(&test_db).await;
	let session = service
		.create_session(CreateSessionRequest { user_id: 11, metadata: None })
		.await
		.expect("Failed to create session.");
	let message = service
		.create_message_with_traces(CreateMessageRequest {
			support_session_id: session.session_id,
			content: "I was double charged.".to_string(),
			role: "user".to_string(),
			metadata: Some(json!({ "channel": "email" })),
			traces: vec![
				TraceInput {
					agent_type: "billing_agent".to_string(),
					operation_type: "lookup_invoice".to_string(),
					input_data: Some(json!({ "invoice": "INV-7" })),
					output_data: Some(json!({ "amount": 42 })),
				},
				TraceInput {
					agent_type: "billing_agent".to_string(),
					operation_type: "draft_reply".to_string(),
					input_data: None,
					output_data: None,
				},
			],
		})
		.await
		.expect("Failed to create message with traces.");

	assert_eq!(message.traces.len(), 2);
	assert_eq!(message.traces[0].operation_type, "lookup_invoice");
	assert_eq!(message.traces[1].input_data, json!({}));
	assert_eq!(count(&service, "messages").await, 1);
	assert_eq!(count(&service, "agent_traces").await, 2);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DESK_PG_DSN to run."]
async fn create_message_with_invalid_trace_persists_nothing() {
	let Some(base_dsn) = desk_testkit::env_dsn() else {
		eprintln!("Skipping; set DESK_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_on(&test_db).await;
	let session = service
		.create_session(CreateSessionRequest { user_id: 12, metadata: None })
		.await
		.expect("Failed to create session.");
	let err = service
		.create_message_with_traces(CreateMessageRequest {
			support_session_id: session.session_id,
			content: "Please escalate.".to_string(),
			role: "user".to_string(),
			metadata: None,
			traces: vec![
				TraceInput {
					agent_type: "escalation_agent".to_string(),
					operation_type: "classify".to_string(),
					input_data: None,
					output_data: None,
				},
				TraceInput {
					agent_type: " ".to_string(),
					operation_type: "classify".to_string(),
					input_data: None,
					output_data: None,
				},
			],
		})
		.await
		.expect_err("An invalid trace must fail the whole unit.");

	assert!(matches!(err, Error::InvalidRequest { .. }), "Unexpected error: {err:?}");
	assert_eq!(count(&service, "messages").await, 0);
	assert_eq!(count(&service, "agent_traces").await, 0);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DESK_PG_DSN to run."]
async fn create_message_rejects_unknown_session_and_bad_role() {
	let Some(base_dsn) = desk_testkit::env_dsn() else {
		eprintln!("Skipping; set DESK_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_on(&test_db).await;
	let missing = service
		.create_message_with_traces(user_turn(Uuid::new_v4(), "Hello?"))
		.await
		.expect_err("Unknown session must be rejected.");

	assert!(matches!(missing, Error::NotFound { .. }));

	let session = service
		.create_session(CreateSessionRequest { user_id: 13, metadata: None })
		.await
		.expect("Failed to create session.");
	let mut req = user_turn(session.session_id, "Hello?");

	req.role = "moderator".to_string();

	let bad_role = service
		.create_message_with_traces(req)
		.await
		.expect_err("Unknown role must be rejected.");

	assert!(matches!(bad_role, Error::InvalidRequest { .. }));
	assert_eq!(count(&service, "messages").await, 0);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DESK_PG_DSN to run."]
async fn conversation_history_is_ordered_and_complete() {
	let Some(base_dsn) = desk_testkit::env_dsn() else {
		eprintln!("Skipping; set DESK_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_on(&test_db).await;
	let session = service
		.create_session(CreateSessionRequest { user_id: 14, metadata: None })
		.await
		.expect("Failed to create session.");

	for (role, content) in [
		("user", "My order never arrived."),
		("assistant", "Let me check the shipment."),
		("user", "Thanks."),
	] {
		let mut req = user_turn(session.session_id, content);

		req.role = role.to_string();

		service
			.create_message_with_traces(req)
			.await
			.expect("Failed to record conversation turn.");
	}

	let history = service
		.conversation_history(session.session_id)
		.await
		.expect("Failed to read history.");
	let contents = history.entries.iter().map(|entry| entry.content.as_str()).collect::<Vec<_>>();

	assert_eq!(
		contents,
		vec!["My order never arrived.", "Let me check the shipment.", "Thanks."]
	);

	for pair in history.entries.windows(2) {
		assert!(pair[0].created_at <= pair[1].created_at);
	}

	let llm = service
		.conversation_as_llm(session.session_id)
		.await
		.expect("Failed to project history.");

	assert_eq!(llm.len(), 3);
	assert_eq!(llm[1].role, desk_domain::role::MessageRole::Assistant);
	assert_eq!(llm[1].content, "Let me check the shipment.");

	let absent = service
		.conversation_history(Uuid::new_v4())
		.await
		.expect_err("Unknown session must be NotFound.");

	assert!(matches!(absent, Error::NotFound { .. }));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DESK_PG_DSN to run."]
async fn session_status_scopes_and_updates() {
	let Some(base_dsn) = desk_testkit::env_dsn() else {
		eprintln!("Skipping; set DESK_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_on(&test_db).await;
	let first = service
		.create_session(CreateSessionRequest { user_id: 21, metadata: None })
		.await
		.expect("Failed to create session.");
	let second = service
		.create_session(CreateSessionRequest { user_id: 22, metadata: None })
		.await
		.expect("Failed to create session.");

	service
		.update_session_status(UpdateSessionStatusRequest {
			session_id: second.session_id,
			status: "archived".to_string(),
		})
		.await
		.expect("Failed to archive session.");

	let active = service
		.list_sessions(ListSessionsRequest { status: Some("active".to_string()) })
		.await
		.expect("Failed to list active sessions.");

	assert_eq!(active.sessions.len(), 1);
	assert_eq!(active.sessions[0].session_id, first.session_id);

	let archived = service
		.list_sessions(ListSessionsRequest { status: Some("archived".to_string()) })
		.await
		.expect("Failed to list archived sessions.");

	assert_eq!(archived.sessions.len(), 1);

	let invalid = service
		.list_sessions(ListSessionsRequest { status: Some("escalated".to_string()) })
		.await
		.expect_err("Unknown status filter must be rejected.");

	assert!(matches!(invalid, Error::InvalidRequest { .. }));

	let bad_update = service
		.update_session_status(UpdateSessionStatusRequest {
			session_id: first.session_id,
			status: "escalated".to_string(),
		})
		.await
		.expect_err("Unknown status must be rejected.");

	assert!(matches!(bad_update, Error::InvalidRequest { .. }));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DESK_PG_DSN to run."]
async fn duplicate_external_ticket_ids_conflict() {
	let Some(base_dsn) = desk_testkit::env_dsn() else {
		eprintln!("Skipping; set DESK_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_on(&test_db).await;
	let session = service
		.create_session(CreateSessionRequest { user_id: 31, metadata: None })
		.await
		.expect("Failed to create session.");
	let open = |external: &str| OpenTicketRequest {
		support_session_id: session.session_id,
		external_ticket_id: external.to_string(),
		status: None,
		priority: None,
		description: None,
		metadata: None,
	};

	// Both racers hit the unique index; exactly one can win.
	let (left, right) =
		tokio::join!(service.open_ticket(open("ZD-9001")), service.open_ticket(open("ZD-9001")));
	let successes = [&left, &right].iter().filter(|result| result.is_ok()).count();

	assert_eq!(successes, 1, "left: {left:?}, right: {right:?}");

	let failure = if left.is_err() { left } else { right };

	assert!(matches!(failure, Err(Error::Conflict { .. })), "Unexpected: {failure:?}");
	assert_eq!(count(&service, "support_tickets").await, 1);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DESK_PG_DSN to run."]
async fn ticket_defaults_and_permissive_status_updates() {
	let Some(base_dsn) = desk_testkit::env_dsn() else {
		eprintln!("Skipping; set DESK_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_on(&test_db).await;
	let session = service
		.create_session(CreateSessionRequest { user_id: 32, metadata: None })
		.await
		.expect("Failed to create session.");
	let ticket = service
		.open_ticket(OpenTicketRequest {
			support_session_id: session.session_id,
			external_ticket_id: "ZD-100".to_string(),
			status: None,
			priority: None,
			description: None,
			metadata: None,
		})
		.await
		.expect("Failed to open ticket.");

	assert_eq!(ticket.status, desk_domain::status::TicketStatus::Open);
	assert_eq!(ticket.metadata, json!({}));

	// No transition graph: closed tickets may reopen.
	for status in ["closed", "open", "in_progress", "resolved"] {
		let updated = service
			.update_ticket_status(UpdateTicketStatusRequest {
				ticket_id: ticket.ticket_id,
				status: status.to_string(),
			})
			.await
			.expect("Status update must be accepted.");

		assert_eq!(updated.status.as_str(), status);
	}

	let rejected = service
		.update_ticket_status(UpdateTicketStatusRequest {
			ticket_id: ticket.ticket_id,
			status: "reopened".to_string(),
		})
		.await
		.expect_err("Unknown status must be rejected.");

	assert!(matches!(rejected, Error::InvalidRequest { .. }));

	let current = service.get_ticket(ticket.ticket_id).await.expect("Failed to fetch ticket.");

	assert_eq!(current.status, desk_domain::status::TicketStatus::Resolved);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DESK_PG_DSN to run."]
async fn ticket_requires_external_id_and_known_session() {
	let Some(base_dsn) = desk_testkit::env_dsn() else {
		eprintln!("Skipping; set DESK_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_on(&test_db).await;
	let session = service
		.create_session(CreateSessionRequest { user_id: 33, metadata: None })
		.await
		.expect("Failed to create session.");
	let blank = service
		.open_ticket(OpenTicketRequest {
			support_session_id: session.session_id,
			external_ticket_id: "  ".to_string(),
			status: None,
			priority: None,
			description: None,
			metadata: None,
		})
		.await
		.expect_err("Blank external_ticket_id must be rejected.");

	assert!(matches!(blank, Error::InvalidRequest { .. }));

	let orphan = service
		.open_ticket(OpenTicketRequest {
			support_session_id: Uuid::new_v4(),
			external_ticket_id: "ZD-404".to_string(),
			status: None,
			priority: None,
			description: None,
			metadata: None,
		})
		.await
		.expect_err("Unknown session must be rejected.");

	assert!(matches!(orphan, Error::NotFound { .. }));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DESK_PG_DSN to run."]
async fn document_search_is_case_insensitive_substring() {
	let Some(base_dsn) = desk_testkit::env_dsn() else {
		eprintln!("Skipping; set DESK_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_on(&test_db).await;
	let create = |title: &str, content: &str| CreateDocumentRequest {
		title: title.to_string(),
		content: content.to_string(),
		metadata: None,
		source_url: None,
		document_type: Some("faq".to_string()),
	};

	service.create_document(create("Foobar", "Returns policy.")).await.expect("create");
	service.create_document(create("Shipping", "the FOO is here")).await.expect("create");
	service.create_document(create("Billing", "Invoices and receipts.")).await.expect("create");

	let hits = service
		.search_documents(SearchDocumentsRequest { query: "foo".to_string() })
		.await
		.expect("Failed to search documents.");
	let mut titles =
		hits.documents.iter().map(|doc| doc.title.as_str()).collect::<Vec<_>>();

	titles.sort_unstable();

	assert_eq!(titles, vec!["Foobar", "Shipping"]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DESK_PG_DSN to run."]
async fn document_search_treats_wildcards_literally() {
	let Some(base_dsn) = desk_testkit::env_dsn() else {
		eprintln!("Skipping; set DESK_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_on(&test_db).await;
	let create = |title: &str| CreateDocumentRequest {
		title: title.to_string(),
		content: "filler".to_string(),
		metadata: None,
		source_url: None,
		document_type: None,
	};

	service.create_document(create("100% satisfaction")).await.expect("create");
	service.create_document(create("100x satisfaction")).await.expect("create");

	let hits = service
		.search_documents(SearchDocumentsRequest { query: "100%".to_string() })
		.await
		.expect("Failed to search documents.");

	assert_eq!(hits.documents.len(), 1);
	assert_eq!(hits.documents[0].title, "100% satisfaction");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DESK_PG_DSN to run."]
async fn symbolized_accessors_follow_the_fallback_contract() {
	let Some(base_dsn) = desk_testkit::env_dsn() else {
		eprintln!("Skipping; set DESK_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_on(&test_db).await;
	let session = service
		.create_session(CreateSessionRequest { user_id: 51, metadata: None })
		.await
		.expect("Failed to create session.");
	let mut req = user_turn(session.session_id, "Symbolize me.");

	req.traces = vec![
		TraceInput {
			agent_type: "kb_agent".to_string(),
			operation_type: "retrieve".to_string(),
			input_data: Some(json!({ "Query Text": "refunds" })),
			output_data: Some(json!("plain scalar payload")),
		},
	];

	let message =
		service.create_message_with_traces(req).await.expect("Failed to create message.");
	let listed = service
		.list_traces(ListTracesRequest {
			message_id: Some(message.message_id),
			agent_type: None,
			operation_type: None,
		})
		.await
		.expect("Failed to list traces.");

	assert_eq!(listed.traces.len(), 1);
	assert_eq!(listed.traces[0].input_data_symbolized(), json!({ "query_text": "refunds" }));
	// Non-document payloads come back untouched.
	assert_eq!(listed.traces[0].output_data_symbolized(), json!("plain scalar payload"));

	let ticket = service
		.open_ticket(OpenTicketRequest {
			support_session_id: session.session_id,
			external_ticket_id: "ZD-777".to_string(),
			status: None,
			priority: None,
			description: None,
			metadata: Some(json!({ "a": 1 })),
		})
		.await
		.expect("Failed to open ticket.");

	assert_eq!(ticket.metadata_symbolized(), json!({ "a": 1 }));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DESK_PG_DSN to run."]
async fn deleting_a_session_removes_the_aggregate() {
	let Some(base_dsn) = desk_testkit::env_dsn() else {
		eprintln!("Skipping; set DESK_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_on(&test_db).await;
	let session = service
		.create_session(CreateSessionRequest { user_id: 61, metadata: None })
		.await
		.expect("Failed to create session.");
	let mut req = user_turn(session.session_id, "Trace this.");

	req.traces = vec![TraceInput {
		agent_type: "router".to_string(),
		operation_type: "route".to_string(),
		input_data: None,
		output_data: None,
	}];

	service.create_message_with_traces(req).await.expect("Failed to create message.");
	service
		.open_ticket(OpenTicketRequest {
			support_session_id: session.session_id,
			external_ticket_id: "ZD-616".to_string(),
			status: None,
			priority: None,
			description: None,
			metadata: None,
		})
		.await
		.expect("Failed to open ticket.");

	service.delete_session(session.session_id).await.expect("Failed to delete session.");

	assert_eq!(count(&service, "messages").await, 0);
	assert_eq!(count(&service, "agent_traces").await, 0);
	assert_eq!(count(&service, "support_tickets").await, 0);

	let gone = service
		.conversation_history(session.session_id)
		.await
		.expect_err("History of a deleted session must be NotFound.");

	assert!(matches!(gone, Error::NotFound { .. }));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DESK_PG_DSN to run."]
async fn vector_store_id_is_recorded_after_indexing() {
	let Some(base_dsn) = desk_testkit::env_dsn() else {
		eprintln!("Skipping; set DESK_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_on(&test_db).await;
	let doc = service
		.create_document(CreateDocumentRequest {
			title: "Warranty".to_string(),
			content: "Two years on everything.".to_string(),
			metadata: Some(json!({ "Region Code": "eu" })),
			source_url: Some("https://support.example.com/warranty".to_string()),
			document_type: Some("policy".to_string()),
		})
		.await
		.expect("Failed to create document.");

	assert_eq!(doc.vector_store_id, None);
	assert_eq!(doc.metadata_symbolized(), json!({ "region_code": "eu" }));

	let updated = service
		.update_vector_store_id(UpdateVectorStoreIdRequest {
			document_id: doc.document_id,
			vector_store_id: "vs_abc123".to_string(),
		})
		.await
		.expect("Failed to record vector store id.");

	assert_eq!(updated.vector_store_id.as_deref(), Some("vs_abc123"));

	let missing = service
		.update_vector_store_id(UpdateVectorStoreIdRequest {
			document_id: Uuid::new_v4(),
			vector_store_id: "vs_zzz".to_string(),
		})
		.await
		.expect_err("Unknown document must be NotFound.");

	assert!(matches!(missing, Error::NotFound { .. }));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set DESK_PG_DSN to run."]
async fn role_scoped_message_listing() {
	let Some(base_dsn) = desk_testkit::env_dsn() else {
		eprintln!("Skipping; set DESK_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_on(&test_db).await;
	let session = service
		.create_session(CreateSessionRequest { user_id: 71, metadata: None })
		.await
		.expect("Failed to create session.");

	for (role, content) in
		[("system", "You are a support assistant."), ("user", "Hi."), ("assistant", "Hello!")]
	{
		let mut req = user_turn(session.session_id, content);

		req.role = role.to_string();

		service.create_message_with_traces(req).await.expect("Failed to create message.");
	}

	let assistant = service
		.list_messages(ListMessagesRequest {
			support_session_id: session.session_id,
			role: Some("assistant".to_string()),
		})
		.await
		.expect("Failed to list assistant messages.");

	assert_eq!(assistant.messages.len(), 1);
	assert_eq!(assistant.messages[0].content, "Hello!");
	assert_eq!(assistant.messages[0].as_llm_message().content, "Hello!");

	let invalid = service
		.list_messages(ListMessagesRequest {
			support_session_id: session.session_id,
			role: Some("moderator".to_string()),
		})
		.await
		.expect_err("Unknown role filter must be rejected.");

	assert!(matches!(invalid, Error::InvalidRequest { .. }));

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
