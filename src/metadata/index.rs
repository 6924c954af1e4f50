//! The index builder and the frozen, concurrently readable index.
//!
//! [`Indexer`] is the single-writer accumulator: the driver feeds it one class-file
//! byte buffer at a time, and [`Indexer::build`] freezes the result into an [`Index`].
//! The transition is the publication barrier — everything inside an `Index` is
//! immutable, so reads from any number of threads need no locking.
//!
//! The index answers four questions in O(1): which sites carry a given annotation,
//! which class has a given name, which scanned classes directly extend a given class,
//! and which scanned classes directly implement a given interface. Edges are direct
//! only; computing transitive closures is the caller's concern, as is feeding in every
//! class file the closure should cover.
//!
//! # Indexing policy
//!
//! A **strict** indexer ([`Indexer::new`]) turns every malformed class file and every
//! duplicate class name into an error on the [`Indexer::index`] call. A **lenient**
//! indexer ([`Indexer::lenient`]) skips malformed class files and lets a duplicate
//! class name replace the earlier descriptor (bumping a replacement counter); both
//! outcomes are recorded as [`Diagnostics`].
//!
//! # Example
//!
//! ```rust,no_run
//! use annodex::{DotName, Indexer};
//!
//! let mut indexer = Indexer::new();
//! for bytes in load_class_files() {
//!     indexer.index(&bytes)?;
//! }
//! let index = indexer.build();
//!
//! for annotation in index.annotations(&DotName::simple("javax.inject.Inject")) {
//!     println!("{}", annotation.target().unwrap());
//! }
//! # fn load_class_files() -> Vec<Vec<u8>> { Vec::new() }
//! # Ok::<(), annodex::Error>(())
//! ```

use std::io::{self, Write};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::{
    metadata::{
        annotations::AnnotationInstance,
        classinfo::ClassInfoRc,
        diagnostics::{DiagnosticCategory, Diagnostics},
        names::{DotName, NameTable},
        reader::{ClassFileReader, ScannedClass},
    },
    Error, Result,
};

/// How the builder reacts to malformed class files and duplicate class names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexingPolicy {
    /// Every problem is an error on the offending [`Indexer::index`] call.
    Strict,
    /// Malformed class files are skipped and duplicate names replace the earlier
    /// class; both are recorded as diagnostics.
    Lenient,
}

/// The single-writer accumulator producing an [`Index`].
pub struct Indexer {
    policy: IndexingPolicy,
    names: NameTable,
    annotations: IndexMap<DotName, Vec<AnnotationInstance>>,
    subclasses: IndexMap<DotName, Vec<ClassInfoRc>>,
    implementors: IndexMap<DotName, Vec<ClassInfoRc>>,
    classes: IndexMap<DotName, ClassInfoRc>,
    diagnostics: Diagnostics,
    replaced: u32,
}

impl Indexer {
    /// Create a strict indexer.
    #[must_use]
    pub fn new() -> Self {
        Indexer::with_policy(IndexingPolicy::Strict)
    }

    /// Create a lenient indexer.
    #[must_use]
    pub fn lenient() -> Self {
        Indexer::with_policy(IndexingPolicy::Lenient)
    }

    /// Create an indexer with an explicit policy.
    #[must_use]
    pub fn with_policy(policy: IndexingPolicy) -> Self {
        Indexer {
            policy,
            names: NameTable::new(),
            annotations: IndexMap::new(),
            subclasses: IndexMap::new(),
            implementors: IndexMap::new(),
            classes: IndexMap::new(),
            diagnostics: Diagnostics::new(),
            replaced: 0,
        }
    }

    /// Parse one class file and add it to the index under construction.
    ///
    /// Returns the scanned class, or `None` when a lenient indexer skipped a
    /// malformed class file (the cause is recorded as a diagnostic).
    ///
    /// # Errors
    /// In strict mode, any [`Error::Malformed`]/[`Error::OutOfBounds`]/
    /// [`Error::UnsupportedVersion`] from the class-file reader, and
    /// [`Error::DuplicateClass`] when the class name was already indexed. A failed
    /// call leaves the index under construction unchanged.
    pub fn index(&mut self, data: &[u8]) -> Result<Option<ClassInfoRc>> {
        match ClassFileReader::new(data, &mut self.names).read() {
            Ok(scanned) => self.append(scanned).map(Some),
            Err(error) if self.policy == IndexingPolicy::Lenient => {
                self.diagnostics.error(
                    DiagnosticCategory::ClassFile,
                    format!("class file skipped: {error}"),
                );
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// Record one scanned class: the `classes` entry, the superclass and interface
    /// edges, and every annotation instance under its type name.
    fn append(&mut self, scanned: ScannedClass) -> Result<ClassInfoRc> {
        let ScannedClass { class, annotations } = scanned;

        if let Some(previous) = self.classes.get(&class.name).cloned() {
            if self.policy == IndexingPolicy::Strict {
                return Err(Error::DuplicateClass(class.name.clone()));
            }
            self.scrub(&previous);
            self.replaced += 1;
            self.diagnostics.warning(
                DiagnosticCategory::Index,
                format!("class {} replaced by a later class file", previous.name),
            );
        }

        self.classes.insert(class.name.clone(), class.clone());
        if let Some(super_name) = &class.super_name {
            self.subclasses
                .entry(super_name.clone())
                .or_default()
                .push(class.clone());
        }
        for interface in &class.interfaces {
            self.implementors
                .entry(interface.clone())
                .or_default()
                .push(class.clone());
        }
        for annotation in annotations {
            self.annotations
                .entry(annotation.name().clone())
                .or_default()
                .push(annotation);
        }

        Ok(class)
    }

    /// Remove a replaced class's edges and annotations, so the frozen index never
    /// holds entries pointing at a class that is no longer in `classes`.
    fn scrub(&mut self, previous: &ClassInfoRc) {
        if let Some(super_name) = &previous.super_name {
            if let Some(list) = self.subclasses.get_mut(super_name) {
                list.retain(|class| !Arc::ptr_eq(class, previous));
            }
        }
        for interface in &previous.interfaces {
            if let Some(list) = self.implementors.get_mut(interface) {
                list.retain(|class| !Arc::ptr_eq(class, previous));
            }
        }
        for list in self.annotations.values_mut() {
            list.retain(|annotation| {
                annotation
                    .target()
                    .map_or(true, |target| !Arc::ptr_eq(target.class_info(), previous))
            });
        }

        // Drop keys whose lists emptied out, keeping dump output meaningful
        self.subclasses.retain(|_, list| !list.is_empty());
        self.implementors.retain(|_, list| !list.is_empty());
        self.annotations.retain(|_, list| !list.is_empty());
    }

    /// Number of classes indexed so far.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Freeze the accumulated maps into an immutable [`Index`] and discard the name
    /// intern table.
    #[must_use]
    pub fn build(self) -> Index {
        Index {
            annotations: freeze(self.annotations),
            subclasses: freeze(self.subclasses),
            implementors: freeze(self.implementors),
            classes: self.classes,
            diagnostics: self.diagnostics,
            replaced: self.replaced,
        }
    }
}

impl Default for Indexer {
    fn default() -> Self {
        Indexer::new()
    }
}

fn freeze<V>(map: IndexMap<DotName, Vec<V>>) -> IndexMap<DotName, Box<[V]>> {
    map.into_iter()
        .map(|(key, list)| (key, list.into_boxed_slice()))
        .collect()
}

/// The read-only annotation index over one scan.
///
/// All lookups are O(1) map accesses returning borrowed, immutable data; absent keys
/// yield empty slices, never errors. `Index` is `Send + Sync` and requires no locking
/// for concurrent reads. Iteration over any map or list follows insertion order during
/// the scan, so output is reproducible for a fixed input order.
pub struct Index {
    annotations: IndexMap<DotName, Box<[AnnotationInstance]>>,
    subclasses: IndexMap<DotName, Box<[ClassInfoRc]>>,
    implementors: IndexMap<DotName, Box<[ClassInfoRc]>>,
    classes: IndexMap<DotName, ClassInfoRc>,
    diagnostics: Diagnostics,
    replaced: u32,
}

impl Index {
    /// Every instance of the named annotation across the scan, in scan order. Valid
    /// targets are classes, fields, methods, and method parameters.
    #[must_use]
    pub fn annotations(&self, annotation_name: &DotName) -> &[AnnotationInstance] {
        match self.annotations.get(annotation_name) {
            Some(list) => list,
            None => &[],
        }
    }

    /// All known classes that directly extend the named class. This covers only what
    /// was scanned — in a multi-jar environment several indexes may need to be
    /// consulted — and never subclasses of subclasses.
    #[must_use]
    pub fn known_direct_subclasses(&self, class_name: &DotName) -> &[ClassInfoRc] {
        match self.subclasses.get(class_name) {
            Some(list) => list,
            None => &[],
        }
    }

    /// All known classes that directly implement the named interface. The list may
    /// itself contain interfaces, since an interface extending another is recorded
    /// here; walk the relation recursively for the full assignable set.
    #[must_use]
    pub fn known_direct_implementors(&self, interface_name: &DotName) -> &[ClassInfoRc] {
        match self.implementors.get(interface_name) {
            Some(list) => list,
            None => &[],
        }
    }

    /// The class (or interface, or annotation type) scanned under the given name.
    #[must_use]
    pub fn class_by_name(&self, class_name: &DotName) -> Option<&ClassInfoRc> {
        self.classes.get(class_name)
    }

    /// Iterate over every scanned class, in scan order.
    pub fn known_classes(&self) -> impl Iterator<Item = &ClassInfoRc> {
        self.classes.values()
    }

    /// Diagnostics recorded during a lenient build; empty after a strict build.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// How many classes were replaced by a later class file of the same name during a
    /// lenient build.
    #[must_use]
    pub fn replaced_classes(&self) -> u32 {
        self.replaced
    }

    /// Write every annotation known by this index to the given sink.
    ///
    /// The format is one `name:` header per annotation type, one indented
    /// `Kind: target` line per instance, and an extra parenthesized line with the
    /// instance's values when it has any.
    ///
    /// # Errors
    /// Propagates write failures from the sink
    pub fn write_annotations(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Annotations:")?;
        for (name, instances) in &self.annotations {
            writeln!(out, "{name}:")?;
            for instance in instances.iter() {
                let Some(target) = instance.target() else {
                    continue;
                };
                writeln!(out, "    {}: {}", target.kind_name(), target)?;

                let values = instance.values();
                if values.is_empty() {
                    continue;
                }
                let mut line = String::from("        (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        line.push_str(", ");
                    }
                    line.push_str(&value.to_string());
                }
                line.push(')');
                writeln!(out, "{line}")?;
            }
        }
        Ok(())
    }

    /// Write all classes that have known subclasses, and those subclasses, to the
    /// given sink.
    ///
    /// # Errors
    /// Propagates write failures from the sink
    pub fn write_subclasses(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Subclasses:")?;
        for (name, subclasses) in &self.subclasses {
            writeln!(out, "{name}:")?;
            for class in subclasses.iter() {
                writeln!(out, "    {}", class.name)?;
            }
        }
        Ok(())
    }

    /// [`Index::write_annotations`] against standard output.
    ///
    /// # Errors
    /// Propagates write failures from standard output
    pub fn print_annotations(&self) -> io::Result<()> {
        self.write_annotations(&mut io::stdout().lock())
    }

    /// [`Index::write_subclasses`] against standard output.
    ///
    /// # Errors
    /// Propagates write failures from standard output
    pub fn print_subclasses(&self) -> io::Result<()> {
        self.write_subclasses(&mut io::stdout().lock())
    }
}
