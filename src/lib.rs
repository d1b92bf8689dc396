//! Meshline - a data product registry and lineage graph engine
//!
//! Meshline is a single-binary tool that maintains an authoritative
//! catalog of data products and a directed lineage graph between them,
//! answering direct and transitive dependency questions and persisting
//! the whole registry as a crash-consistent snapshot.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - The registry engine: serializes mutations, drives persistence
//! - [`core`] - Domain types, catalog, lineage graph, snapshot schema, config
//! - [`store`] - Durable store adapter: snapshot file and store lock
//!
//! # Correctness Invariants
//!
//! Meshline maintains the following invariants:
//!
//! 1. Product names are unique and immutable for a product's lifetime
//! 2. All mutations flow through the engine and are mutually exclusive
//! 3. A persisted snapshot is always internally consistent; a torn state
//!    is never serialized
//! 4. An unreadable snapshot is a fatal startup error, never silently
//!    replaced with an empty registry

pub mod cli;
pub mod core;
pub mod engine;
pub mod store;
