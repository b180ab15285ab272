//! Request middleware.
//!
//! Purpose: enter the per-request context scope that the dispatch core and
//! the logger read from.

pub mod request_context;

pub use request_context::{
    CORRELATION_ID_HEADER, REQUEST_ID_HEADER, RequestContextLayer, RequestContextMiddleware,
};
