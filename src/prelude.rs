//! Convenient re-exports of the most commonly used types.
//!
//! This module provides a curated selection of the most frequently used types from
//! across the library, allowing for convenient glob imports.
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use annodex::prelude::*;
//!
//! let mut indexer = Indexer::lenient();
//! let data = std::fs::read("Sample.class")?;
//! indexer.index(&data)?;
//! let index = indexer.build();
//! println!("indexed {} classes", index.known_classes().count());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use crate::{
    AccessFlags, AnnotationInstance, AnnotationTarget, AnnotationValue, ClassInfo, ClassInfoRc,
    DotName, Error, FieldInfo, Index, Indexer, IndexingPolicy, MethodInfo, PrimitiveType, Result,
    Type, TypeKind, ValueKind,
};
