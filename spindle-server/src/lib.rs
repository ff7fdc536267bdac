//! Spindle coordinator library: the HTTP route tree, shared app state, and
//! auth middleware, factored out of the binary so integration tests can
//! build the router directly against an in-memory store.

pub mod auth;
pub mod errors;
pub mod routes;
pub mod state;
