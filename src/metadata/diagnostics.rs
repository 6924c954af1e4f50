//! Diagnostics collection for lenient index builds.
//!
//! A lenient build keeps going when a class file is malformed or a class name is seen
//! twice; what happened is recorded here instead of aborting the scan. The container is
//! owned by the [`crate::Indexer`] during the build phase (single writer) and handed to
//! the frozen [`crate::Index`] read-only, so consumers can report what was skipped or
//! replaced.
//!
//! A strict build never records anything: every problem is returned as an error
//! instead.

use std::fmt;

use crate::metadata::names::DotName;

/// Severity level of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticSeverity {
    /// Informational message, not indicating a problem.
    Info,

    /// Warning about a scan that continued with altered results, such as a duplicate
    /// class being replaced.
    Warning,

    /// Error indicating a class file that could not be indexed at all. In strict mode
    /// this would have aborted the scan.
    Error,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Info => write!(f, "INFO"),
            DiagnosticSeverity::Warning => write!(f, "WARN"),
            DiagnosticSeverity::Error => write!(f, "ERROR"),
        }
    }
}

/// Category indicating the source of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// Issues with the class-file structure: magic, version, member tables,
    /// attribute lengths.
    ClassFile,

    /// Issues inside the constant pool: unknown tags, bad indirections, illegal
    /// modified UTF-8.
    ConstantPool,

    /// Issues while decoding annotation attributes and element values.
    Annotation,

    /// Issues while accumulating the index itself, such as duplicate class names.
    Index,
}

impl fmt::Display for DiagnosticCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticCategory::ClassFile => write!(f, "ClassFile"),
            DiagnosticCategory::ConstantPool => write!(f, "ConstantPool"),
            DiagnosticCategory::Annotation => write!(f, "Annotation"),
            DiagnosticCategory::Index => write!(f, "Index"),
        }
    }
}

/// A single diagnostic entry with context information.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level of this diagnostic.
    pub severity: DiagnosticSeverity,

    /// Category indicating the source of this diagnostic.
    pub category: DiagnosticCategory,

    /// Human-readable description of the issue.
    pub message: String,

    /// The affected class, when it was known by the time the issue was found.
    pub class_name: Option<DotName>,
}

impl Diagnostic {
    /// Creates a new diagnostic entry.
    pub fn new(
        severity: DiagnosticSeverity,
        category: DiagnosticCategory,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            severity,
            category,
            message: message.into(),
            class_name: None,
        }
    }

    /// Attach the affected class name.
    #[must_use]
    pub fn with_class(mut self, class_name: DotName) -> Self {
        self.class_name = Some(class_name);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.category, self.message)?;
        if let Some(class_name) = &self.class_name {
            write!(f, " ({class_name})")?;
        }
        Ok(())
    }
}

/// Container for diagnostics collected during one index build.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub(crate) fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub(crate) fn warning(&mut self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Warning,
            category,
            message,
        ));
    }

    pub(crate) fn error(&mut self, category: DiagnosticCategory, message: impl Into<String>) {
        self.push(Diagnostic::new(
            DiagnosticSeverity::Error,
            category,
            message,
        ));
    }

    /// Iterate over all collected entries, in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Number of collected entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when at least one [`DiagnosticSeverity::Error`] entry was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.severity == DiagnosticSeverity::Error)
    }

    /// Number of [`DiagnosticSeverity::Error`] entries.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.severity == DiagnosticSeverity::Error)
            .count()
    }
}
