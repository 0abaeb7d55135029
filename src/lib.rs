//! # Scholask
//!
//! Per-tenant document retrieval for a grounded-answer assistant.
//!
//! Raw text is split into bounded passages, indexed per tenant with either
//! dense embeddings (online) or a sparse TF-IDF fit (offline), and
//! retrieved to build a citation-annotated context for answer generation.
//!
//! ## Architecture
//!
//! ```text
//! ingest:  text ─▶ chunker ─▶ Indexer ──(rebuild + atomic publish)──▶ tenant dir
//!                                                                        │
//! query:   question ─▶ Searcher ─▶ context [#n] ─▶ AnswerPipeline ◀──────┘
//!                                                   ├─ generate (LLM)
//!                                                   └─ extract  (offline)
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`engine`] | Wires configuration into store, indexer, searcher, pipeline |
//! | [`indexer`] | Per-tenant serialized rebuild protocol |
//! | [`search`] | Snapshot loading and top-k retrieval |
//! | [`locks`] | Per-tenant rebuild and publish locks |
//! | [`answer`] | Answer pipeline and outcomes |
//! | [`facts`] | Starter quick facts per tenant |
//! | [`fs_store`] | Filesystem tenant store with atomic publish |
//! | [`embedding`] | OpenAI embedding provider |
//! | [`generation`] | OpenAI chat completion provider |
//! | [`http`] | Retry/backoff for capability calls |
//! | [`loader`] | Plain-text directory loader |
//! | [`commands`] | CLI command implementations |
//!
//! Runtime-free building blocks (chunker, backends, ranking, context
//! assembly, prompts, store trait) live in the `scholask-core` crate.

pub mod answer;
pub mod commands;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod facts;
pub mod fs_store;
pub mod generation;
pub mod http;
pub mod indexer;
pub mod loader;
pub mod locks;
pub mod search;
