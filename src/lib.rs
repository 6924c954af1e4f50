// Copyright 2026 the annodex contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![deny(missing_docs)]
#![allow(dead_code)]

//! # annodex
//!
//! A library that scans compiled Java class files and builds a compact, read-only
//! **annotation index** over a collection of classes. Consumers — build tools,
//! application-server deployers, dependency injection frameworks — use the index to
//! answer, in constant time, questions like "which classes, methods, fields, or
//! parameters bear annotation X?", "what are the direct subclasses of Y?", and "which
//! implementors of interface Z were seen?" without re-parsing class files on each
//! query.
//!
//! # Architecture
//!
//! The library is organized in two layers with a strictly one-way data flow:
//!
//! - **File layer** ([`Parser`]): bounds-checked big-endian reads over a
//!   caller-provided byte buffer, plus modified-UTF-8 decoding. No I/O happens here —
//!   walking directories or jars and handing buffers in is the driver's concern.
//! - **Metadata layer** ([`crate::metadata`]): the constant-pool decoder, the
//!   class-file reader producing one [`ClassInfo`] plus its [`AnnotationInstance`]s
//!   per class file, and the [`Indexer`] that accumulates those into a frozen
//!   [`Index`].
//!
//! The [`Indexer::build`] call is the publication barrier: the build phase is
//! single-writer, and everything inside the resulting [`Index`] is immutable, so any
//! number of threads may query it concurrently without locking.
//!
//! # Usage
//!
//! ```rust,no_run
//! use annodex::{DotName, Indexer};
//!
//! let mut indexer = Indexer::new();
//! let data = std::fs::read("target/classes/pkg/A.class")?;
//! indexer.index(&data)?;
//! let index = indexer.build();
//!
//! for instance in index.annotations(&DotName::simple("pkg.Ann")) {
//!     println!("{}: {}", instance.name(), instance.target().unwrap());
//! }
//! for subclass in index.known_direct_subclasses(&DotName::simple("pkg.Base")) {
//!     println!("extends pkg.Base: {}", subclass.name);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Malformed input is handled by policy: a strict [`Indexer::new`] fails the
//! offending `index()` call, while a lenient [`Indexer::lenient`] skips the class
//! file and records a diagnostic. See [`crate::metadata::index`] for details.
//!
//! # Scope
//!
//! The index is a snapshot of exactly the class files fed in. Type references to
//! classes outside the input set stay symbolic names; subclass and implementor edges
//! are direct, never transitive; annotation defaults declared on annotation types are
//! not evaluated; class files are never rewritten.
//!
//! # Thread Safety
//!
//! [`Index`] and every value reachable from it are [`Send`] and [`Sync`]. The
//! [`Indexer`] is a single-writer builder; to parallelize, run independent indexers
//! over disjoint inputs.

#[macro_use]
pub(crate) mod error;
pub(crate) mod file;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

pub mod metadata;
pub mod prelude;

pub use error::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

pub use file::Parser;
pub use metadata::annotations::{AnnotationInstance, AnnotationValue, ValueKind};
pub use metadata::classinfo::{
    AccessFlags, AnnotationTarget, ClassInfo, ClassInfoRc, FieldInfo, MethodInfo,
};
pub use metadata::diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics,
};
pub use metadata::index::{Index, Indexer, IndexingPolicy};
pub use metadata::names::DotName;
pub use metadata::typesystem::{PrimitiveType, Type, TypeKind};
