//! Artifact pool workflows.
//!
//! - [`resolve`] picks the latest version of every artifact in a listing.
//! - [`generate`] fills catalog entries that have no artifact yet.
//! - [`publish`] pushes the latest artifact per key to the remote store and
//!   records its public URL.
//!
//! Both workflows expose an event [`Stream`](futures::Stream) and a
//! convenience wrapper that collects it into a report.

pub mod error;
pub mod generate;
pub mod publish;
pub mod resolve;

pub use crate::resolve::{Classified, Resolution, classify, list_pool, resolve};
