//! Componentized dotted names and the per-build intern table.
//!
//! Every qualified Java name the index touches — class names, superclass names,
//! annotation type names, enum type names — is represented as a [`DotName`]: an
//! immutable, reference-counted chain of `(prefix, local)` components. Indexing a jar
//! repeats package prefixes thousands of times; sharing the prefix chain keeps one
//! `java.lang` node alive instead of one copy per class, and makes equality checks
//! cheap via a precomputed hash.
//!
//! Two construction forms exist:
//!
//! - **Componentized** names are built one package component at a time and share their
//!   prefix chains through a [`NameTable`]. This is the form the indexer produces.
//! - **Simple** names wrap a flat string (which may itself contain dots) without any
//!   decomposition. This is the convenient form for queries against a finished index.
//!
//! The two forms are interchangeable: a simple `DotName::simple("java.lang.String")`
//! is equal to, and hashes identically to, the componentized chain for the same name.
//!
//! # Example
//!
//! ```rust
//! use annodex::DotName;
//!
//! let name = DotName::simple("java.util.Map");
//! assert_eq!(name.to_string(), "java.util.Map");
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHashSet;

/// An immutable Java qualified name, stored as a shared component chain.
///
/// Equality is structural over the rendered dotted form, so a componentized name and a
/// simple name describing the same class compare equal and hash identically. Cloning is
/// cheap (one reference count bump).
#[derive(Clone)]
pub struct DotName {
    inner: Arc<Inner>,
}

struct Inner {
    prefix: Option<DotName>,
    local: Box<str>,
    componentized: bool,
    hash: u32,
}

impl DotName {
    /// Create a simple name from a flat string, without decomposing it into components.
    ///
    /// The string may contain dots (`"java.lang.String"`) or not (`"int"`); either way
    /// the resulting node has no prefix chain. Use this form for index queries.
    #[must_use]
    pub fn simple(name: impl Into<Box<str>>) -> Self {
        let local = name.into();
        let hash = rolling_hash(0, local.bytes());
        DotName {
            inner: Arc::new(Inner {
                prefix: None,
                local,
                componentized: false,
                hash,
            }),
        }
    }

    /// Create a componentized name from an optional prefix chain and one local
    /// component. The local component must not contain a dot.
    #[must_use]
    pub fn componentized(prefix: Option<DotName>, local: impl Into<Box<str>>) -> Self {
        let local = local.into();
        debug_assert!(!local.contains('.'), "component must not contain a dot");
        let hash = match &prefix {
            Some(p) => rolling_hash(rolling_hash(p.inner.hash, [b'.']), local.bytes()),
            None => rolling_hash(0, local.bytes()),
        };
        DotName {
            inner: Arc::new(Inner {
                prefix,
                local,
                componentized: true,
                hash,
            }),
        }
    }

    /// The prefix chain of this name, absent for the first component and for simple
    /// names.
    #[must_use]
    pub fn prefix(&self) -> Option<&DotName> {
        self.inner.prefix.as_ref()
    }

    /// The rightmost component of this name (or the whole string for a simple name).
    #[must_use]
    pub fn local(&self) -> &str {
        &self.inner.local
    }

    /// Whether this node was built component by component and shares its prefix chain.
    #[must_use]
    pub fn is_componentized(&self) -> bool {
        self.inner.componentized
    }

    /// Collect the chain segments root-first. A simple name yields one segment that may
    /// itself contain dots.
    fn segments(&self) -> Vec<&str> {
        let mut segments = Vec::new();
        let mut current = Some(self);
        while let Some(name) = current {
            segments.push(&*name.inner.local);
            current = name.inner.prefix.as_ref();
        }
        segments.reverse();
        segments
    }

    /// Iterate the bytes of the rendered dotted form without allocating.
    fn rendered_bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.segments()
            .into_iter()
            .enumerate()
            .flat_map(|(i, segment)| {
                (i > 0)
                    .then_some(b'.')
                    .into_iter()
                    .chain(segment.bytes())
            })
    }
}

/// Java-style 31-based rolling hash over the rendered bytes. Continuing the prefix hash
/// with `'.'` and the local bytes yields the same value a flat string would, which is
/// what keeps simple and componentized forms hash-equal.
fn rolling_hash(seed: u32, bytes: impl IntoIterator<Item = u8>) -> u32 {
    bytes
        .into_iter()
        .fold(seed, |hash, byte| hash.wrapping_mul(31).wrapping_add(u32::from(byte)))
}

impl PartialEq for DotName {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            return true;
        }
        self.inner.hash == other.inner.hash && self.rendered_bytes().eq(other.rendered_bytes())
    }
}

impl Eq for DotName {}

impl Hash for DotName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.inner.hash);
    }
}

impl fmt::Display for DotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments().into_iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl fmt::Debug for DotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DotName({})", self)
    }
}

/// The deduplicating intern table for one index build.
///
/// Interning is monotonic: nodes are only ever added, and the whole table is dropped
/// together with the [`crate::Indexer`] that owns it. Distinct interning calls that
/// describe the same name return clones of the same shared node.
pub(crate) struct NameTable {
    names: FxHashSet<DotName>,
}

impl NameTable {
    pub(crate) fn new() -> Self {
        NameTable {
            names: FxHashSet::default(),
        }
    }

    /// Intern a flat dotted string (`"java.lang.String"`), reusing every existing
    /// prefix node.
    pub(crate) fn intern(&mut self, name: &str) -> DotName {
        let mut prefix = None;
        for component in name.split('.') {
            prefix = Some(self.intern_component(prefix, component));
        }
        // `split` yields at least one (possibly empty) component
        prefix.expect("split always yields a component")
    }

    /// Compose one component onto an already interned prefix. This is the path used
    /// while converting slash-delimited internal names, which are already decomposed.
    pub(crate) fn intern_component(&mut self, prefix: Option<DotName>, local: &str) -> DotName {
        let candidate = DotName::componentized(prefix, local);
        match self.names.get(&candidate) {
            Some(existing) => existing.clone(),
            None => {
                self.names.insert(candidate.clone());
                candidate
            }
        }
    }
}
