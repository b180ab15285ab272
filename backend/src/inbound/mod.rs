//! Inbound adapters that translate external requests into dispatched
//! commands and queries while keeping framework details at the edge.
//!
//! HTTP handlers live under [`http`].

pub mod http;
