//! Core library for the location-audit command line application.
//!
//! The library exposes the pieces that power the CLI as well as the
//! integration tests. The modules are structured to keep responsibilities
//! narrow and composable: Excel IO adapters live under [`io`], the expected
//! location templating in [`template`], the monitoring API client in
//! [`client`], the DNS fallback in [`dns`], and the row-by-row reconciliation
//! driver in [`reconcile`].

pub mod client;
pub mod compliance;
pub mod dns;
pub mod error;
pub mod io;
pub mod model;
pub mod reconcile;
pub mod template;

pub use error::{Result, ToolError};
