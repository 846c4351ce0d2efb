//! Operations exposed to the REST layer.
//!
//! Each function fetches its snapshot from the store (and the invoicing
//! provider where needed), runs the pure core, and writes back through the
//! store. Routing, auth, and serialization stay outside the crate.

pub mod reconcile;
pub mod reports;
