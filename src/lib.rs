//! http10 - minimal HTTP/1.0 client
//!
//! This crate provides a small HTTP/1.0 client that talks over whichever
//! transport is available on the platform (Unix domain sockets, blocking TCP,
//! TLS over TCP, or an async event loop) while exposing one synchronous
//! request/response contract.

pub mod http;
