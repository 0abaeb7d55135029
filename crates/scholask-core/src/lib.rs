//! # Scholask Core
//!
//! Shared, runtime-free logic for Scholask: data models, chunking, the
//! dense and sparse similarity backends, ranking, citation context
//! assembly, grounding prompts, and the tenant store abstraction.
//!
//! This crate contains no tokio, filesystem I/O, or HTTP dependencies.
//! External capabilities (embedding, text generation) are consumed
//! through the traits in [`embedding`] and [`generation`]; persistence
//! goes through [`store::TenantStore`].

pub mod backend;
pub mod chunk;
pub mod context;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod grounding;
pub mod models;
pub mod search;
pub mod sparse;
pub mod store;
pub mod tenant;

pub use error::RagError;
