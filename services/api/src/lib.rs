//! Coursecraft API Library Crate
//!
//! This library contains all the core logic for the coursecraft web service:
//! the application state, the in-memory session store, the SSE wire
//! protocol, API handlers, and routing. The `api` binary is a thin wrapper
//! around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod protocol;
pub mod router;
pub mod state;
pub mod store;
