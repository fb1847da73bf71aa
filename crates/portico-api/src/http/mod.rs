//! HTTP interface module.
//!
//! Provides the endpoints around the kernel bridge:
//! - Page load with the session cookie
//! - Kernel info and connection close
//! - Readiness and liveness probes

pub mod control;
pub mod monitoring;
pub mod page;
pub mod routes;
