//! Class, field, and method descriptors plus annotation target references.
//!
//! One [`ClassInfo`] is produced per scanned class file and owns its member descriptors
//! in declaration order. The descriptors are immutable once the class is built and are
//! shared through [`ClassInfoRc`]; an [`AnnotationTarget`] refers to members by index
//! into the owning class's vectors, which keeps the whole structure free of ownership
//! cycles and cheap to move.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::metadata::{names::DotName, typesystem::Type};

bitflags! {
    /// JVMS access and property flags, preserved verbatim from the class file.
    ///
    /// The same bit means different things depending on the declaration context
    /// (`0x0020` is `ACC_SUPER` on a class but `ACC_SYNCHRONIZED` on a method); both
    /// names are provided where JVMS defines both. Unknown bits from newer class-file
    /// versions are retained untouched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AccessFlags: u16 {
        /// Declared public
        const PUBLIC = 0x0001;
        /// Declared private
        const PRIVATE = 0x0002;
        /// Declared protected
        const PROTECTED = 0x0004;
        /// Declared static
        const STATIC = 0x0008;
        /// Declared final
        const FINAL = 0x0010;
        /// Treat superclass methods specially on `invokespecial` (class context)
        const SUPER = 0x0020;
        /// Declared synchronized (method context)
        const SYNCHRONIZED = 0x0020;
        /// Declared volatile (field context)
        const VOLATILE = 0x0040;
        /// Compiler-generated bridge method (method context)
        const BRIDGE = 0x0040;
        /// Declared transient (field context)
        const TRANSIENT = 0x0080;
        /// Declared with variable arity (method context)
        const VARARGS = 0x0080;
        /// Declared native
        const NATIVE = 0x0100;
        /// Is an interface
        const INTERFACE = 0x0200;
        /// Declared abstract
        const ABSTRACT = 0x0400;
        /// Declared strictfp
        const STRICT = 0x0800;
        /// Not present in the source code
        const SYNTHETIC = 0x1000;
        /// Declared as an annotation type
        const ANNOTATION = 0x2000;
        /// Declared as an enum type
        const ENUM = 0x4000;
    }
}

/// A reference-counted pointer to a [`ClassInfo`]
pub type ClassInfoRc = Arc<ClassInfo>;

/// One scanned class (or interface, or annotation type).
///
/// Instances are immutable and shared between the index's `classes` map, its edge
/// lists, and every annotation target that points into them.
#[derive(Debug)]
pub struct ClassInfo {
    /// Canonical dotted name of this class
    pub name: DotName,
    /// Superclass name; absent only for `java.lang.Object`
    pub super_name: Option<DotName>,
    /// Directly declared interfaces, in declaration order
    pub interfaces: Vec<DotName>,
    /// Raw JVMS access flags
    pub flags: AccessFlags,
    /// Declared fields, in class-file order
    pub fields: Vec<FieldInfo>,
    /// Declared methods, in class-file order
    pub methods: Vec<MethodInfo>,
}

impl fmt::Display for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// One declared field.
#[derive(Debug)]
pub struct FieldInfo {
    /// Field name
    pub name: Box<str>,
    /// Declared type
    pub field_type: Type,
    /// Raw JVMS access flags
    pub flags: AccessFlags,
}

impl fmt::Display for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field_type, self.name)
    }
}

/// One declared method.
#[derive(Debug)]
pub struct MethodInfo {
    /// Method name (`<init>` and `<clinit>` appear verbatim)
    pub name: Box<str>,
    /// Declared return type
    pub return_type: Type,
    /// Declared parameter types, in order
    pub parameters: Vec<Type>,
    /// Raw JVMS access flags
    pub flags: AccessFlags,
}

impl fmt::Display for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.return_type, self.name)?;
        for (i, parameter) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{parameter}")?;
        }
        f.write_str(")")
    }
}

/// The program element an annotation instance is attached to.
///
/// Members are referenced as indices into the owning [`ClassInfo`]'s vectors; the
/// variants therefore stay valid for exactly as long as the class they point into,
/// which the embedded [`ClassInfoRc`] guarantees.
#[derive(Debug, Clone)]
pub enum AnnotationTarget {
    /// The class declaration itself
    Class(ClassInfoRc),
    /// A field, by position in [`ClassInfo::fields`]
    Field(ClassInfoRc, usize),
    /// A method, by position in [`ClassInfo::methods`]
    Method(ClassInfoRc, usize),
    /// A method parameter: method position plus 0-based parameter index
    MethodParameter(ClassInfoRc, usize, u8),
}

impl AnnotationTarget {
    /// The class this target lives in.
    #[must_use]
    pub fn class_info(&self) -> &ClassInfoRc {
        match self {
            AnnotationTarget::Class(class)
            | AnnotationTarget::Field(class, _)
            | AnnotationTarget::Method(class, _)
            | AnnotationTarget::MethodParameter(class, _, _) => class,
        }
    }

    /// The field descriptor, when this target is a field.
    #[must_use]
    pub fn field(&self) -> Option<&FieldInfo> {
        match self {
            AnnotationTarget::Field(class, index) => class.fields.get(*index),
            _ => None,
        }
    }

    /// The method descriptor, when this target is a method or one of its parameters.
    #[must_use]
    pub fn method(&self) -> Option<&MethodInfo> {
        match self {
            AnnotationTarget::Method(class, index)
            | AnnotationTarget::MethodParameter(class, index, _) => class.methods.get(*index),
            _ => None,
        }
    }

    /// The 0-based parameter index, when this target is a method parameter.
    #[must_use]
    pub fn parameter_index(&self) -> Option<u8> {
        match self {
            AnnotationTarget::MethodParameter(_, _, parameter) => Some(*parameter),
            _ => None,
        }
    }

    /// The dump label for this target kind (`"Class"`, `"Field"`, ...).
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            AnnotationTarget::Class(_) => "Class",
            AnnotationTarget::Field(_, _) => "Field",
            AnnotationTarget::Method(_, _) => "Method",
            AnnotationTarget::MethodParameter(_, _, _) => "Parameter",
        }
    }
}

impl fmt::Display for AnnotationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationTarget::Class(class) => write!(f, "{}", class.name),
            AnnotationTarget::Field(class, index) => match class.fields.get(*index) {
                Some(field) => write!(f, "{} {}.{}", field.field_type, class.name, field.name),
                None => write!(f, "{}.<unknown field>", class.name),
            },
            AnnotationTarget::Method(class, index) => fmt_method(f, class, *index),
            AnnotationTarget::MethodParameter(class, index, parameter) => {
                fmt_method(f, class, *index)?;
                write!(f, "#{parameter}")
            }
        }
    }
}

fn fmt_method(f: &mut fmt::Formatter<'_>, class: &ClassInfo, index: usize) -> fmt::Result {
    match class.methods.get(index) {
        Some(method) => {
            write!(f, "{} {}.{}(", method.return_type, class.name, method.name)?;
            for (i, parameter) in method.parameters.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{parameter}")?;
            }
            f.write_str(")")
        }
        None => write!(f, "{}.<unknown method>", class.name),
    }
}
