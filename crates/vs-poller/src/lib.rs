//! # VS Poller
//!
//! Waits for vector store resources to settle on the provider.
//!
//! ## Components
//!
//! - `ProviderClient`: reqwest client for the provider's vector store API
//! - `poller`: capped linear backoff sessions with a wall-clock deadline
//! - `VectorStoreService`: validate, forward, then poll non-terminal results
//! - `ScriptedGateway`: in-memory gateway with scripted statuses
//!
//! ## Usage
//!
//! ```rust,ignore
//! let client = ProviderClient::new(&config.provider)?;
//! let options = PollOptions::from_config(&config.poller);
//!
//! let store = wait_for_vector_store(&client, "vs_abc", &options).await?;
//! ```

pub mod backoff;
pub mod client;
pub mod poller;
pub mod scripted;
pub mod service;

pub use backoff::*;
pub use client::*;
pub use poller::*;
pub use scripted::*;
pub use service::*;
