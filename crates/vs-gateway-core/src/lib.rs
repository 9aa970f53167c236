//! # Vector Store Gateway Core
//!
//! Core types, validators and strategy traits shared by the vector store
//! gateway binaries.
//!
//! - **Constraint validation**: filter expressions, chunking policies and
//!   metadata maps checked against structural and numeric rules
//! - **Resource models**: vector stores, their files and file batches, with
//!   per-kind terminal statuses
//! - **Strategies**: the provider seam used by the poller and service
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Request   │────►│  Validator  │────►│  Provider   │
//! │   payload   │     │             │     │  (create)   │
//! └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                │ non-terminal
//!                                          ┌─────▼─────┐
//!                                          │  Poller   │
//!                                          └───────────┘
//! ```

pub mod chunking;
pub mod config;
pub mod error;
pub mod filter;
pub mod limits;
pub mod metadata;
pub mod metrics;
pub mod request;
pub mod resource;
pub mod strategy;
pub mod validate;

pub use chunking::*;
pub use config::*;
pub use error::*;
pub use filter::*;
pub use limits::*;
pub use metadata::*;
pub use metrics::*;
pub use request::*;
pub use resource::*;
pub use strategy::*;
pub use validate::*;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::GatewayConfig;
    pub use crate::error::{GatewayError, Result};
    pub use crate::resource::{
        FileBatch, PollableResource, ResourceKind, VectorStore, VectorStoreFile,
    };
    pub use crate::strategy::{HealthCheck, ResourceGateway, VectorStoreGateway};
    pub use crate::validate::ConstraintValidator;
}
