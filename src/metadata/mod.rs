//! Class-file metadata model and the annotation index.
//!
//! This module contains everything above the byte layer: the componentized name
//! representation and its intern table, the constant-pool decoder, the type and member
//! descriptor model, annotation instances with their typed value trees, the
//! single-pass class-file reader, and the index builder with its frozen read surface.
//!
//! # Key Components
//!
//! - [`names::DotName`] - Memory-efficient shared representation of qualified names
//! - [`typesystem::Type`] - Java types as they appear in signatures and `Class` values
//! - [`classinfo::ClassInfo`] - Per-class descriptor with fields and methods
//! - [`annotations::AnnotationInstance`] - One applied annotation with typed values
//! - [`index::Indexer`] and [`index::Index`] - The build-phase accumulator and the
//!   frozen, concurrently readable result
//! - [`diagnostics::Diagnostics`] - What a lenient build skipped or replaced

pub mod annotations;
pub mod classinfo;
pub mod diagnostics;
pub mod index;
pub mod names;
pub(crate) mod pool;
pub(crate) mod reader;
pub mod typesystem;
