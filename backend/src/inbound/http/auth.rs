//! Bearer authentication for HTTP handlers.
//!
//! [`AuthenticatedUser`] resolves the `Authorization` header through the
//! [`Authenticator`](crate::domain::ports::Authenticator) port and attaches
//! the resulting identity to the ambient [`RequestContext`], so everything
//! dispatched afterwards can read the acting user.

use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::ports::BearerToken;
use crate::domain::{Error, Identity, RequestContext, UserId};

use super::state::HttpState;

const BEARER_PREFIX: &str = "bearer ";

/// Extractor for handlers that require an authenticated caller.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(Identity);

impl AuthenticatedUser {
    /// Resolved identity.
    pub fn identity(&self) -> &Identity {
        &self.0
    }

    /// Shortcut for the caller's user id.
    pub fn user_id(&self) -> &UserId {
        self.0.user_id()
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<BearerToken, Error> {
    let raw = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing bearer token"))?
        .to_str()
        .map_err(|_| Error::unauthorized("malformed authorization header"))?;
    let prefix = raw.get(..BEARER_PREFIX.len()).unwrap_or_default();
    if !prefix.eq_ignore_ascii_case(BEARER_PREFIX) {
        return Err(Error::unauthorized("authorization scheme must be Bearer"));
    }
    BearerToken::new(raw.get(BEARER_PREFIX.len()..).unwrap_or_default())
        .ok_or_else(|| Error::unauthorized("missing bearer token"))
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req.headers());
        let authenticator = req
            .app_data::<web::Data<HttpState>>()
            .map(|state| state.authenticator.clone());
        Box::pin(async move {
            let token = token?;
            let authenticator =
                authenticator.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let identity = authenticator.authenticate(&token).await?;
            if !RequestContext::attach_identity(identity.clone()) {
                warn!(user_id = %identity.user_id(), "identity not attached to request context");
            }
            Ok(Self(identity))
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{FIXTURE_TOKEN, FIXTURE_USER_ID, MockAuthenticator};
    use crate::inbound::http::test_utils::{http_state_with, parse_error};
    use crate::middleware::RequestContextLayer;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test as actix_test};
    use rstest::rstest;
    use std::sync::Arc;

    async fn whoami(user: AuthenticatedUser) -> HttpResponse {
        let attached = RequestContext::with_current(|ctx| ctx.user_id().cloned()).flatten();
        HttpResponse::Ok().body(format!(
            "{} {}",
            user.user_id(),
            attached.map(|id| id.to_string()).unwrap_or_default()
        ))
    }

    #[rstest]
    #[case(None)]
    #[case(Some("Basic abc"))]
    #[case(Some("Bearer   "))]
    #[case(Some("Bear"))]
    fn malformed_headers_are_unauthorized(#[case] raw: Option<&str>) {
        let mut headers = HeaderMap::new();
        if let Some(raw) = raw {
            headers.insert(
                AUTHORIZATION,
                actix_web::http::header::HeaderValue::from_str(raw).expect("header value"),
            );
        }
        let err = bearer_token(&headers).expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[rstest]
    fn scheme_matching_ignores_case() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            actix_web::http::header::HeaderValue::from_static("bEaReR  tok "),
        );
        let token = bearer_token(&headers).expect("token");
        assert_eq!(token.expose(), "tok");
    }

    #[actix_web::test]
    async fn valid_tokens_attach_the_identity_to_the_context() {
        let app = actix_test::init_service(
            App::new()
                .app_data(http_state_with(Arc::new(
                    crate::domain::ports::FixtureAuthenticator,
                )))
                .wrap(RequestContextLayer::default())
                .route("/me", actix_web::web::get().to(whoami)),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, format!("Bearer {FIXTURE_TOKEN}")))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = actix_test::read_body(res).await;
        assert_eq!(
            std::str::from_utf8(&body).expect("utf8"),
            format!("{FIXTURE_USER_ID} {FIXTURE_USER_ID}")
        );
    }

    #[actix_web::test]
    async fn rejected_tokens_return_401_with_the_request_id() {
        let mut authenticator = MockAuthenticator::new();
        authenticator
            .expect_authenticate()
            .times(1)
            .returning(|_| Err(Error::unauthorized("invalid bearer token")));
        let app = actix_test::init_service(
            App::new()
                .app_data(http_state_with(Arc::new(authenticator)))
                .wrap(RequestContextLayer::default())
                .route("/me", actix_web::web::get().to(whoami)),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, "Bearer nope"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let header = res
            .headers()
            .get(crate::middleware::REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .expect("request id header");
        let error = parse_error(res).await;
        assert_eq!(error.code(), ErrorCode::Unauthorized);
        assert_eq!(error.request_id(), Some(header.as_str()));
    }
}
