//! A local, single-tenant, password-authenticated query server for an
//! embedded logic-programming engine, reachable over loopback TCP or a
//! Unix domain socket.
//!
//! The session engine (listener, supervisor, communication/goal worker
//! pair, frame codec, reply serializer) is generic over a host-supplied
//! [`engine::Engine`]; embedding hosts depend on this crate directly and
//! supply their own engine. The `logicd` binary wires up [`engine::mock`]
//! for standalone use.

pub mod app;
pub mod engine;
pub mod errors;
pub mod listener;
pub mod session;
pub mod supervisor;
pub mod utils;
pub mod wire;

pub use errors::Error;
