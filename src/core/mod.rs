//! core
//!
//! Core domain types and components for meshline.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ProductName, Semver, Confidence, etc.
//! - [`product`] - Data product records and creation/patch inputs
//! - [`catalog`] - The owned set of data products
//! - [`lineage`] - The lineage multigraph and its traversals
//! - [`snapshot`] - Registry snapshot schema
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at construction time
//! - Persisted documents are strict and self-describing
//! - Opaque payloads are stored verbatim, never interpreted

pub mod catalog;
pub mod config;
pub mod lineage;
pub mod product;
pub mod snapshot;
pub mod types;
