//! Configuration loading and validation.
//!
//! Configuration is layered with [figment]; see [`ConfigLoader`] for the
//! sources and their precedence. Credentials are optional at load time and
//! only required by the commands that talk to a remote service.

pub mod error;
mod loader;
mod models;

pub use crate::loader::{ConfigLoader, load_dotenv};
pub use crate::models::{Config, GeneratorConfig, RemoteConfig, RemoteCredentials};
