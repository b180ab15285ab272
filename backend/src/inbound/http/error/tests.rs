//! Tests for HTTP error mapping.

use super::*;
use crate::domain::{RequestContext, RequestOrigin};
use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::rstest;
use serde_json::{Value, json};
use std::sync::Arc;

const REQUEST_ID: &str = "00000000-0000-0000-0000-000000000000";

async fn body_of(error: &Error) -> Value {
    let response = ResponseError::error_response(error);
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    serde_json::from_slice(&bytes).expect("error JSON parses")
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no auth"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("taken"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] error: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), status);
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted_but_keep_the_request_id() {
    let error = Error::internal("db password leaked")
        .with_details(json!({"secret": "x"}))
        .try_with_request_id(REQUEST_ID)
        .expect("request id");

    let response = ResponseError::error_response(&error);
    assert_eq!(
        response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok()),
        Some(REQUEST_ID)
    );

    let body = body_of(&error).await;
    assert_eq!(body["code"], "internal_error");
    assert_eq!(body["message"], "Internal server error");
    assert_eq!(body["requestId"], REQUEST_ID);
    assert!(body.get("details").is_none());
}

#[rstest]
#[actix_web::test]
async fn client_errors_keep_message_and_details() {
    let error = Error::invalid_request("bad").with_details(json!({"field": "name"}));

    let body = body_of(&error).await;
    assert_eq!(body["message"], "bad");
    assert_eq!(body["details"]["field"], "name");
    assert!(body.get("requestId").is_none());
    assert!(ResponseError::error_response(&error)
        .headers()
        .get(REQUEST_ID_HEADER)
        .is_none());
}

#[rstest]
#[actix_web::test]
async fn errors_raised_in_scope_report_the_scoped_request_id() {
    let ctx = Arc::new(RequestContext::new(None, RequestOrigin::default()));
    let expected = ctx.request_id().to_string();

    let error = RequestContext::sync_scope(ctx, || Error::not_found("gone"));

    assert_eq!(body_of(&error).await["requestId"], expected.as_str());
}

#[rstest]
fn actix_errors_become_opaque_internal_errors() {
    let actix = actix_web::error::ErrorBadGateway("upstream exploded");
    let error = Error::from(actix);
    assert_eq!(error.code(), ErrorCode::InternalError);
    assert_eq!(error.message(), "Internal server error");
}
