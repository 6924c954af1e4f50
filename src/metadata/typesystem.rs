//! Java type representation and descriptor decoding.
//!
//! Types appear in two places the index cares about: field/method signatures on class
//! members, and `Class` annotation values (`@A(c = String[][].class)`). Both arrive as
//! class-file descriptor strings (JVMS §4.3) — `I`, `[[D`, `Ljava/lang/String;` — and
//! decode into the immutable [`Type`] value.
//!
//! Arrays are represented as the element's base kind plus a dimension count, so
//! `[[Ljava/lang/String;` decodes to name `java.lang.String`, kind [`TypeKind::Class`],
//! and two dimensions.

use std::fmt;

use crate::{
    metadata::names::{DotName, NameTable},
    Result,
};

/// The eight Java primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum PrimitiveType {
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
    Boolean,
}

impl PrimitiveType {
    /// The Java keyword for this primitive (`"int"`, `"boolean"`, ...).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Char => "char",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::Boolean => "boolean",
        }
    }

    fn from_descriptor(byte: u8) -> Option<PrimitiveType> {
        match byte {
            b'B' => Some(PrimitiveType::Byte),
            b'S' => Some(PrimitiveType::Short),
            b'I' => Some(PrimitiveType::Int),
            b'J' => Some(PrimitiveType::Long),
            b'C' => Some(PrimitiveType::Char),
            b'F' => Some(PrimitiveType::Float),
            b'D' => Some(PrimitiveType::Double),
            b'Z' => Some(PrimitiveType::Boolean),
            _ => None,
        }
    }
}

/// The base kind of a [`Type`], before array dimensions are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A class or interface reference
    Class,
    /// One of the eight primitives
    Primitive(PrimitiveType),
    /// The `void` pseudo-type (method returns and `Void.TYPE` class values)
    Void,
}

/// An immutable Java type as it appears in member signatures and annotation `Class`
/// values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    name: DotName,
    kind: TypeKind,
    dimensions: u8,
}

impl Type {
    pub(crate) fn new(name: DotName, kind: TypeKind, dimensions: u8) -> Self {
        Type {
            name,
            kind,
            dimensions,
        }
    }

    /// The dotted name of the element type (`java.lang.String` for `String[][]`,
    /// `int` for `int[]`).
    #[must_use]
    pub fn name(&self) -> &DotName {
        &self.name
    }

    /// The base kind of the element type.
    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Number of array dimensions; zero for non-array types.
    #[must_use]
    pub fn dimensions(&self) -> u8 {
        self.dimensions
    }

    /// Whether this type is an array.
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.dimensions > 0
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for _ in 0..self.dimensions {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

/// Decode one field-style type descriptor (`I`, `[[D`, `Ljava/lang/String;`).
///
/// The whole string must be consumed; trailing bytes are a malformation.
pub(crate) fn parse_type_descriptor(descriptor: &str, names: &mut NameTable) -> Result<Type> {
    let bytes = descriptor.as_bytes();
    let mut position = 0;
    let parsed = parse_next_type(bytes, &mut position, names)?;
    if position != bytes.len() {
        return Err(malformed_error!(
            "Trailing bytes after type descriptor - {}",
            descriptor
        ));
    }
    Ok(parsed)
}

/// Decode a method descriptor (`(Ljava/lang/String;I)V`) into parameter types and the
/// return type.
pub(crate) fn parse_method_descriptor(
    descriptor: &str,
    names: &mut NameTable,
) -> Result<(Vec<Type>, Type)> {
    let bytes = descriptor.as_bytes();
    if bytes.first() != Some(&b'(') {
        return Err(malformed_error!("Bad method descriptor - {}", descriptor));
    }

    let mut position = 1;
    let mut parameters = Vec::new();
    loop {
        match bytes.get(position) {
            Some(b')') => {
                position += 1;
                break;
            }
            Some(_) => parameters.push(parse_next_type(bytes, &mut position, names)?),
            None => return Err(malformed_error!("Bad method descriptor - {}", descriptor)),
        }
    }

    let return_type = parse_next_type(bytes, &mut position, names)?;
    if position != bytes.len() {
        return Err(malformed_error!(
            "Trailing bytes after method descriptor - {}",
            descriptor
        ));
    }
    Ok((parameters, return_type))
}

/// Decode the type starting at `*position`, advancing past it.
fn parse_next_type(bytes: &[u8], position: &mut usize, names: &mut NameTable) -> Result<Type> {
    let mut dimensions = 0u32;
    while bytes.get(*position) == Some(&b'[') {
        dimensions += 1;
        *position += 1;
    }
    // JVMS limits array types to 255 dimensions
    if dimensions > 255 {
        return Err(malformed_error!("Array type exceeds 255 dimensions"));
    }

    let Some(&lead) = bytes.get(*position) else {
        return Err(malformed_error!("Truncated type descriptor"));
    };

    if let Some(primitive) = PrimitiveType::from_descriptor(lead) {
        *position += 1;
        let name = names.intern(primitive.name());
        return Ok(Type::new(
            name,
            TypeKind::Primitive(primitive),
            dimensions as u8,
        ));
    }

    match lead {
        b'V' => {
            *position += 1;
            if dimensions > 0 {
                return Err(malformed_error!("Array of void is not a type"));
            }
            Ok(Type::new(names.intern("void"), TypeKind::Void, 0))
        }
        b'L' => {
            let start = *position + 1;
            let Some(end) = bytes[start..].iter().position(|&b| b == b';') else {
                return Err(malformed_error!("Unterminated class type descriptor"));
            };
            let internal = std::str::from_utf8(&bytes[start..start + end])
                .map_err(|_| malformed_error!("Class type descriptor is not UTF-8"))?;
            if internal.is_empty() {
                return Err(malformed_error!("Empty class type descriptor"));
            }
            *position = start + end + 1;

            let mut prefix = None;
            for component in internal.split('/') {
                prefix = Some(names.intern_component(prefix, component));
            }
            Ok(Type::new(
                prefix.expect("split always yields a component"),
                TypeKind::Class,
                dimensions as u8,
            ))
        }
        other => Err(malformed_error!(
            "Unknown type descriptor prefix 0x{:02X}",
            other
        )),
    }
}
