//! Organization flow end to end: HTTP, dispatch, aggregate, publish and the
//! audit trail.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header::{AUTHORIZATION, USER_AGENT};
use actix_web::{test as actix_test, web};
use rstest::rstest;
use serde_json::{Value, json};
use switchboard::RequestContextLayer;
use switchboard::domain::AuditAction;
use switchboard::domain::ports::{AuditLogRepository, FIXTURE_TOKEN, FIXTURE_USER_ID};
use switchboard::inbound::http::state::HttpState;
use switchboard::logging::LogLevel;
use switchboard::middleware::REQUEST_ID_HEADER;
use switchboard::outbound::memory::InMemoryAuditLog;
use switchboard::server::{Adapters, build_app, build_dispatcher};
use switchboard::test_support::{FixtureClock, MemorySink, memory_logger};

struct World {
    audit_log: Arc<InMemoryAuditLog>,
    sink: Arc<MemorySink>,
    state: web::Data<HttpState>,
    logger: switchboard::logging::Logger,
}

fn world() -> World {
    let (logger, sink) = memory_logger();
    let audit_log = Arc::new(InMemoryAuditLog::new());
    let adapters = Adapters {
        audit_log: audit_log.clone(),
        clock: Arc::new(FixtureClock::epoch()),
        ..Adapters::in_memory()
    };
    let dispatcher = build_dispatcher(&logger, &adapters).expect("wiring");
    World {
        audit_log,
        sink,
        state: web::Data::new(HttpState::new(dispatcher, adapters.authenticator)),
        logger,
    }
}

fn bearer() -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {FIXTURE_TOKEN}"))
}

#[rstest]
#[actix_web::test]
async fn create_and_rename_leave_an_audit_trail_tied_to_each_request() {
    let world = world();
    let layer = RequestContextLayer::new(
        actix_web::http::header::HeaderName::from_static("x-correlation-id"),
        &world.logger,
    );
    let app = actix_test::init_service(build_app(world.state.clone(), layer)).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/organizations")
            .insert_header(bearer())
            .insert_header((USER_AGENT, "flow-test/1.0"))
            .set_json(json!({ "name": "Acme" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let create_request_id = res
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .expect("request id");
    let created: Value = actix_test::read_body_json(res).await;
    let id = created["id"].as_str().expect("id").to_owned();
    assert_eq!(created["ownerId"], FIXTURE_USER_ID);

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::patch()
            .uri(&format!("/api/v1/organizations/{id}"))
            .insert_header(bearer())
            .set_json(json!({ "name": "Acme Ltd" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let entries = world
        .audit_log
        .list_for_entity("organization", &id)
        .await
        .expect("audit entries");
    let actions: Vec<_> = entries.iter().map(|entry| entry.action()).collect();
    assert_eq!(actions, vec![AuditAction::Create, AuditAction::Update]);

    let first = &entries[0];
    assert_eq!(
        first.request_id().map(|id| id.to_string()).as_deref(),
        Some(create_request_id.as_str())
    );
    assert_eq!(
        first.performed_by_id().map(|id| id.to_string()).as_deref(),
        Some(FIXTURE_USER_ID)
    );
    assert_eq!(first.user_agent(), Some("flow-test/1.0"));
    assert_ne!(entries[1].request_id(), first.request_id());

    let activity: Vec<_> = world
        .sink
        .entries()
        .into_iter()
        .filter(|entry| entry.fields.get("component") == Some(&json!("OrganizationActivity")))
        .collect();
    assert_eq!(activity.len(), 2);
    assert_eq!(activity[0].fields["requestId"], create_request_id.as_str());
    assert_eq!(activity[0].fields["userId"], FIXTURE_USER_ID);
}

#[rstest]
#[actix_web::test]
async fn rejected_commands_publish_nothing() {
    let world = world();
    let app = actix_test::init_service(build_app(
        world.state.clone(),
        RequestContextLayer::default(),
    ))
    .await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/organizations")
            .insert_header(bearer())
            .set_json(json!({ "name": " " }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(world.audit_log.entries().await.is_empty());
    assert!(world.sink.at_level(LogLevel::Error).is_empty());
}

#[rstest]
#[actix_web::test]
async fn anonymous_reads_succeed_but_writes_do_not() {
    let world = world();
    let app = actix_test::init_service(build_app(
        world.state.clone(),
        RequestContextLayer::default(),
    ))
    .await;

    let created: Value = actix_test::call_and_read_body_json(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/organizations")
            .insert_header(bearer())
            .set_json(json!({ "name": "Acme" }))
            .to_request(),
    )
    .await;
    let uri = format!("/api/v1/organizations/{}", created["id"].as_str().expect("id"));

    let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::patch()
            .uri(&uri)
            .set_json(json!({ "name": "Hijacked" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(world.audit_log.entries().await.len(), 1);
}
