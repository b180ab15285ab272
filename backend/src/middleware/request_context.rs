//! Middleware entering a [`RequestContext`] scope for every inbound request.
//!
//! Each request gets a fresh context: a new request id, the caller's
//! correlation id when the configured header carries a valid one, and the
//! request origin. The inner service is invoked inside the scope, so
//! extractors, handlers, dispatched commands and log calls all observe the
//! same context. Every response carries `X-Request-ID` and
//! `X-Correlation-ID`.
//!
//! Tokio task-locals are not inherited by spawned tasks; wrap spawned work
//! with [`RequestContext::propagate`].

use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use chrono::Utc;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use serde_json::json;
use tracing::{Instrument, error, info_span};

use crate::domain::{CorrelationId, RequestContext, RequestOrigin};
use crate::logging::{Logger, RedactionPolicy};

/// Response header carrying the generated request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";
/// Response header carrying the effective correlation id.
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Middleware creating one [`RequestContext`] per request.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use switchboard::RequestContextLayer;
///
/// let app = App::new().wrap(RequestContextLayer::default());
/// ```
#[derive(Clone)]
pub struct RequestContextLayer {
    correlation_header: HeaderName,
    logger: Logger,
}

impl RequestContextLayer {
    /// Read correlation ids from `correlation_header` and log request
    /// completion through a child of `logger`.
    pub fn new(correlation_header: HeaderName, logger: &Logger) -> Self {
        Self {
            correlation_header,
            logger: logger.child("HTTP"),
        }
    }
}

impl Default for RequestContextLayer {
    fn default() -> Self {
        Self::new(
            HeaderName::from_static(CORRELATION_ID_HEADER),
            &Logger::tracing(RedactionPolicy::default()),
        )
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestContextLayer
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestContextMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestContextMiddleware {
            service: Rc::new(service),
            correlation_header: self.correlation_header.clone(),
            logger: self.logger.clone(),
        }))
    }
}

/// Service wrapper produced by [`RequestContextLayer`].
///
/// Applications should not use this type directly.
pub struct RequestContextMiddleware<S> {
    service: Rc<S>,
    correlation_header: HeaderName,
    logger: Logger,
}

impl<S> RequestContextMiddleware<S> {
    fn context_for(&self, req: &ServiceRequest) -> RequestContext {
        let correlation_id = req
            .headers()
            .get(&self.correlation_header)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| CorrelationId::new(value).ok());
        let origin = RequestOrigin {
            method: req.method().to_string(),
            path: req.path().to_owned(),
            client_ip: req
                .connection_info()
                .realip_remote_addr()
                .map(str::to_owned),
            user_agent: req
                .headers()
                .get(header::USER_AGENT)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned),
        };
        RequestContext::new(correlation_id, origin)
    }
}

impl<S, B> Service<ServiceRequest> for RequestContextMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let context = Arc::new(self.context_for(&req));
        let span = info_span!(
            "request",
            request_id = %context.request_id(),
            correlation_id = %context.correlation_id(),
            method = %context.origin().method,
            path = %context.origin().path,
        );
        let request = req.request().clone();
        let fut = {
            let _entered = span.enter();
            let service = Rc::clone(&self.service);
            RequestContext::sync_scope(Arc::clone(&context), move || service.call(req))
        };
        let logger = self.logger.clone();
        let scoped = Arc::clone(&context);

        Box::pin(
            RequestContext::scope(scoped, async move {
                // Inner errors still get the context headers and a completion record.
                let mut res = match fut.await {
                    Ok(res) => res.map_into_boxed_body(),
                    Err(err) => ServiceResponse::new(request, err.error_response()),
                };
                let headers = res.response_mut().headers_mut();
                insert_header(headers, REQUEST_ID_HEADER, &context.request_id().to_string());
                insert_header(headers, CORRELATION_ID_HEADER, context.correlation_id().as_str());

                let status = res.status();
                let elapsed = Utc::now().signed_duration_since(context.started_at());
                let metadata = Some(json!({
                    "method": context.origin().method,
                    "path": context.origin().path,
                    "status": status.as_u16(),
                    "durationMs": elapsed.num_milliseconds().max(0),
                }));
                if status.is_server_error() {
                    logger.error("request failed", metadata);
                } else if status.is_client_error() {
                    logger.warn("request rejected", metadata);
                } else {
                    logger.log("request completed", metadata);
                }
                Ok::<_, Error>(res)
            })
            .instrument(span),
        )
    }
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(HeaderName::from_static(name), value);
        }
        Err(error) => {
            error!(%error, header = name, "failed to encode request context header");
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::test_support::memory_logger;
    use actix_web::{App, HttpResponse, test as actix_test, web};

    fn layer() -> RequestContextLayer {
        let (logger, _sink) = memory_logger();
        RequestContextLayer::new(HeaderName::from_static(CORRELATION_ID_HEADER), &logger)
    }

    async fn echo_context() -> HttpResponse {
        match RequestContext::current() {
            Some(ctx) => HttpResponse::Ok().body(format!(
                "{} {}",
                ctx.request_id(),
                ctx.correlation_id()
            )),
            None => HttpResponse::InternalServerError().finish(),
        }
    }

    fn header<B>(res: &ServiceResponse<B>, name: &str) -> String {
        res.headers()
            .get(name)
            .expect("header present")
            .to_str()
            .expect("header is ascii")
            .to_owned()
    }

    #[actix_web::test]
    async fn handlers_observe_the_context_named_in_the_headers() {
        let app = actix_test::init_service(
            App::new()
                .wrap(layer())
                .route("/", web::get().to(echo_context)),
        )
        .await;
        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/").to_request()).await;

        let request_id = header(&res, REQUEST_ID_HEADER);
        let correlation_id = header(&res, CORRELATION_ID_HEADER);
        let body = actix_test::read_body(res).await;
        assert_eq!(
            std::str::from_utf8(&body).expect("utf8 body"),
            format!("{request_id} {correlation_id}")
        );
    }

    #[actix_web::test]
    async fn blank_or_oversized_correlation_ids_are_replaced() {
        let app = actix_test::init_service(
            App::new()
                .wrap(layer())
                .route("/", web::get().to(echo_context)),
        )
        .await;
        for supplied in ["   ".to_owned(), "x".repeat(129)] {
            let req = actix_test::TestRequest::get()
                .uri("/")
                .insert_header((CORRELATION_ID_HEADER, supplied))
                .to_request();
            let res = actix_test::call_service(&app, req).await;
            assert_eq!(
                header(&res, REQUEST_ID_HEADER),
                header(&res, CORRELATION_ID_HEADER)
            );
        }
    }

    #[actix_web::test]
    async fn a_custom_correlation_header_is_honoured() {
        let (logger, _sink) = memory_logger();
        let app = actix_test::init_service(
            App::new()
                .wrap(RequestContextLayer::new(
                    HeaderName::from_static("x-trace"),
                    &logger,
                ))
                .route("/", web::get().to(echo_context)),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri("/")
            .insert_header(("X-Trace", "trace-9"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(header(&res, CORRELATION_ID_HEADER), "trace-9");
    }

    #[actix_web::test]
    async fn completion_is_logged_inside_the_scope() {
        let (logger, sink) = memory_logger();
        let app = actix_test::init_service(
            App::new()
                .wrap(RequestContextLayer::new(
                    HeaderName::from_static(CORRELATION_ID_HEADER),
                    &logger,
                ))
                .route(
                    "/missing",
                    web::get().to(|| async { HttpResponse::NotFound().finish() }),
                ),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri("/missing")
            .insert_header((header::USER_AGENT, "curl/8.4.0"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        let request_id = header(&res, REQUEST_ID_HEADER);

        let entry = sink.find("request rejected").expect("completion logged");
        assert_eq!(entry.fields["requestId"], request_id.as_str());
        assert_eq!(entry.fields["status"], 404);
        assert_eq!(entry.fields["component"], "HTTP");
    }

    #[actix_web::test]
    async fn inner_service_errors_still_carry_context_headers() {
        let (logger, sink) = memory_logger();
        let app = actix_test::init_service(
            App::new()
                .wrap_fn(|_req, _srv| async {
                    Err::<ServiceResponse, _>(actix_web::error::ErrorBadRequest("rejected upstream"))
                })
                .wrap(RequestContextLayer::new(
                    HeaderName::from_static(CORRELATION_ID_HEADER),
                    &logger,
                ))
                .route("/", web::get().to(echo_context)),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri("/")
            .insert_header((CORRELATION_ID_HEADER, "abc-123"))
            .to_request();
        let res = actix_test::call_service(&app, req).await;

        assert_eq!(res.status(), actix_web::http::StatusCode::BAD_REQUEST);
        assert_eq!(header(&res, CORRELATION_ID_HEADER), "abc-123");
        let request_id = header(&res, REQUEST_ID_HEADER);
        let entry = sink.find("request rejected").expect("completion logged");
        assert_eq!(entry.fields["requestId"], request_id.as_str());
        assert_eq!(entry.fields["status"], 400);
    }
}
