//! Artifact generation.
//!
//! Works out which catalog entries have no artifact in the pool yet and asks
//! the [`ImageGenerator`](mnemo_imagegen::ImageGenerator) to draw them, one
//! key at a time. A [`Driver`] is either live or a dry run; the mode is picked
//! once, when the driver is built.
//!
//! The primary entry point is [`generate`], which streams one
//! [`GenerateEvent`] per key. [`Driver::generate_batch`] collects that stream
//! into a [`BatchReport`].

pub mod error;
mod file;
mod select;
mod stream;

pub use self::file::{Driver, GenerateOutcome, GenerateStatus};
pub use self::select::{Selection, Status, list_missing, select_batch, status};
pub use self::stream::{BatchReport, GenerateEvent, generate};
