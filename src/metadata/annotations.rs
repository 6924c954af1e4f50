//! Annotation instances and their typed value trees.
//!
//! An [`AnnotationInstance`] is one applied annotation at one site: its type name, the
//! target it is attached to (absent for annotations nested inside another annotation's
//! values), and an ordered list of [`AnnotationValue`]s. Values form a tagged sum over
//! the Java primitive kinds, strings, `Class` references, enum constants, nested
//! annotations, and arrays of any of these.
//!
//! To read a value, use the typed accessor matching the annotation parameter's declared
//! kind. The numeric accessors additionally convert between numeric kinds exactly as a
//! Java cast would: casts from floating point truncate toward zero (with NaN becoming
//! zero and out-of-range values saturating), integral narrowing keeps the low bits, and
//! narrowing a floating-point value to `short` or `byte` goes through `int` first. Any
//! accessor used against a non-matching kind returns
//! [`Error::InvalidValueAccess`](crate::Error::InvalidValueAccess).
//!
//! Everything in this module is immutable and can be shared between threads without
//! synchronization.

use std::fmt;

use crate::{
    metadata::classinfo::AnnotationTarget, metadata::names::DotName, metadata::typesystem::Type,
    Error, Result,
};

/// An applied annotation: type name, optional target, ordered values.
#[derive(Debug, Clone)]
pub struct AnnotationInstance {
    name: DotName,
    target: Option<AnnotationTarget>,
    values: Vec<AnnotationValue>,
}

impl AnnotationInstance {
    /// Create an annotation instance. `target` is `None` only for annotations nested
    /// inside another annotation's values.
    #[must_use]
    pub fn new(
        name: DotName,
        target: Option<AnnotationTarget>,
        values: Vec<AnnotationValue>,
    ) -> Self {
        AnnotationInstance {
            name,
            target,
            values,
        }
    }

    /// The annotation type name.
    #[must_use]
    pub fn name(&self) -> &DotName {
        &self.name
    }

    /// The annotated program element; absent for nested annotations.
    #[must_use]
    pub fn target(&self) -> Option<&AnnotationTarget> {
        self.target.as_ref()
    }

    /// The annotation's values, in class-file order. Parameters left at their default
    /// are not present (defaults live in the annotation type declaration, which this
    /// library does not evaluate).
    #[must_use]
    pub fn values(&self) -> &[AnnotationValue] {
        &self.values
    }

    /// Look up a value by parameter name.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&AnnotationValue> {
        self.values.iter().find(|value| value.name() == name)
    }
}

impl fmt::Display for AnnotationInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}(", self.name)?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str(")")
    }
}

/// The kind and payload of one annotation value.
#[derive(Debug, Clone)]
pub enum ValueKind {
    /// `byte` constant
    Byte(i8),
    /// `short` constant
    Short(i16),
    /// `int` constant
    Int(i32),
    /// `long` constant
    Long(i64),
    /// `char` constant
    Char(char),
    /// `float` constant
    Float(f32),
    /// `double` constant
    Double(f64),
    /// `boolean` constant
    Boolean(bool),
    /// String constant
    String(Box<str>),
    /// `Class` reference
    Class(Type),
    /// Enum constant: the enum type and the constant's name
    Enum {
        /// The enum type
        type_name: DotName,
        /// The constant name, as `Enum::name()` would return it
        constant: Box<str>,
    },
    /// A nested annotation; its instance has no target
    Nested(AnnotationInstance),
    /// An array of values; elements are homogeneous except for the empty array
    Array(Vec<AnnotationValue>),
}

/// Internal view over the numeric kinds, so the widening rules live in one place.
enum Numeric {
    Integral(i64),
    Floating(f64),
}

/// A named annotation value.
///
/// `name` is the annotation parameter name, or the empty string when this value is an
/// element of an enclosing array.
#[derive(Debug, Clone)]
pub struct AnnotationValue {
    name: Box<str>,
    kind: ValueKind,
}

impl AnnotationValue {
    /// Create a value. Array elements use the empty string as their name.
    #[must_use]
    pub fn new(name: impl Into<Box<str>>, kind: ValueKind) -> Self {
        AnnotationValue {
            name: name.into(),
            kind,
        }
    }

    /// The annotation parameter name, or `""` for an array element.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tagged kind and payload.
    #[must_use]
    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    fn kind_name(&self) -> &'static str {
        match &self.kind {
            ValueKind::Byte(_) => "byte",
            ValueKind::Short(_) => "short",
            ValueKind::Int(_) => "int",
            ValueKind::Long(_) => "long",
            ValueKind::Char(_) => "char",
            ValueKind::Float(_) => "float",
            ValueKind::Double(_) => "double",
            ValueKind::Boolean(_) => "boolean",
            ValueKind::String(_) => "string",
            ValueKind::Class(_) => "class",
            ValueKind::Enum { .. } => "enum",
            ValueKind::Nested(_) => "nested annotation",
            ValueKind::Array(_) => "array",
        }
    }

    fn access_error(&self, expected: &'static str) -> Error {
        Error::InvalidValueAccess {
            expected,
            actual: self.kind_name(),
        }
    }

    fn numeric(&self) -> Option<Numeric> {
        match &self.kind {
            ValueKind::Byte(v) => Some(Numeric::Integral(i64::from(*v))),
            ValueKind::Short(v) => Some(Numeric::Integral(i64::from(*v))),
            ValueKind::Int(v) => Some(Numeric::Integral(i64::from(*v))),
            ValueKind::Long(v) => Some(Numeric::Integral(*v)),
            ValueKind::Float(v) => Some(Numeric::Floating(f64::from(*v))),
            ValueKind::Double(v) => Some(Numeric::Floating(*v)),
            _ => None,
        }
    }

    /// Convert the underlying numeric value to `int` as a Java cast would.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not numeric
    pub fn as_int(&self) -> Result<i32> {
        match self.numeric() {
            Some(Numeric::Integral(v)) => Ok(v as i32),
            Some(Numeric::Floating(v)) => Ok(v as i32),
            None => Err(self.access_error("numeric")),
        }
    }

    /// Convert the underlying numeric value to `long` as a Java cast would.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not numeric
    pub fn as_long(&self) -> Result<i64> {
        match self.numeric() {
            Some(Numeric::Integral(v)) => Ok(v),
            Some(Numeric::Floating(v)) => Ok(v as i64),
            None => Err(self.access_error("numeric")),
        }
    }

    /// Convert the underlying numeric value to `short` as a Java cast would.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not numeric
    pub fn as_short(&self) -> Result<i16> {
        match self.numeric() {
            Some(Numeric::Integral(v)) => Ok(v as i16),
            // Java narrows floating point to short through int
            Some(Numeric::Floating(v)) => Ok((v as i32) as i16),
            None => Err(self.access_error("numeric")),
        }
    }

    /// Convert the underlying numeric value to `byte` as a Java cast would.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not numeric
    pub fn as_byte(&self) -> Result<i8> {
        match self.numeric() {
            Some(Numeric::Integral(v)) => Ok(v as i8),
            Some(Numeric::Floating(v)) => Ok((v as i32) as i8),
            None => Err(self.access_error("numeric")),
        }
    }

    /// Convert the underlying numeric value to `float` as a Java cast would.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not numeric
    pub fn as_float(&self) -> Result<f32> {
        match self.numeric() {
            Some(Numeric::Integral(v)) => Ok(v as f32),
            Some(Numeric::Floating(v)) => Ok(v as f32),
            None => Err(self.access_error("numeric")),
        }
    }

    /// Convert the underlying numeric value to `double` as a Java cast would.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not numeric
    pub fn as_double(&self) -> Result<f64> {
        match self.numeric() {
            Some(Numeric::Integral(v)) => Ok(v as f64),
            Some(Numeric::Floating(v)) => Ok(v),
            None => Err(self.access_error("numeric")),
        }
    }

    /// The underlying `char` value.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not a character
    pub fn as_char(&self) -> Result<char> {
        match &self.kind {
            ValueKind::Char(v) => Ok(*v),
            _ => Err(self.access_error("char")),
        }
    }

    /// The underlying `boolean` value.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not a boolean
    pub fn as_bool(&self) -> Result<bool> {
        match &self.kind {
            ValueKind::Boolean(v) => Ok(*v),
            _ => Err(self.access_error("boolean")),
        }
    }

    /// A string rendering of the underlying value. String values return their content
    /// unquoted; every other kind renders the way it would appear in a diagnostic dump.
    #[must_use]
    pub fn as_string(&self) -> String {
        match &self.kind {
            ValueKind::String(v) => v.to_string(),
            _ => format!("{}", DisplayValue(&self.kind)),
        }
    }

    /// The constant name of the underlying enum value.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not an enum
    pub fn as_enum(&self) -> Result<&str> {
        match &self.kind {
            ValueKind::Enum { constant, .. } => Ok(constant),
            _ => Err(self.access_error("enum")),
        }
    }

    /// The type name of the underlying enum value.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not an enum
    pub fn as_enum_type(&self) -> Result<&DotName> {
        match &self.kind {
            ValueKind::Enum { type_name, .. } => Ok(type_name),
            _ => Err(self.access_error("enum")),
        }
    }

    /// The underlying `Class` value. Any erased type a method could return is valid
    /// here, including primitives (`int.class`), `void.class`, and array classes.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not a class
    pub fn as_class(&self) -> Result<&Type> {
        match &self.kind {
            ValueKind::Class(v) => Ok(v),
            _ => Err(self.access_error("class")),
        }
    }

    /// The underlying nested annotation. It has no target, but may itself carry
    /// arbitrarily nested values.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not a nested annotation
    pub fn as_nested(&self) -> Result<&AnnotationInstance> {
        match &self.kind {
            ValueKind::Nested(v) => Ok(v),
            _ => Err(self.access_error("nested annotation")),
        }
    }

    /// The underlying array elements.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not an array
    pub fn as_array(&self) -> Result<&[AnnotationValue]> {
        match &self.kind {
            ValueKind::Array(v) => Ok(v),
            _ => Err(self.access_error("array")),
        }
    }

    /// Convert a numeric array to `int` elements, Java cast semantics per element.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not an array of numbers
    pub fn as_int_array(&self) -> Result<Vec<i32>> {
        self.array_of("numeric array", AnnotationValue::as_int)
    }

    /// Convert a numeric array to `long` elements, Java cast semantics per element.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not an array of numbers
    pub fn as_long_array(&self) -> Result<Vec<i64>> {
        self.array_of("numeric array", AnnotationValue::as_long)
    }

    /// Convert a numeric array to `short` elements, Java cast semantics per element.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not an array of numbers
    pub fn as_short_array(&self) -> Result<Vec<i16>> {
        self.array_of("numeric array", AnnotationValue::as_short)
    }

    /// Convert a numeric array to `byte` elements, Java cast semantics per element.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not an array of numbers
    pub fn as_byte_array(&self) -> Result<Vec<i8>> {
        self.array_of("numeric array", AnnotationValue::as_byte)
    }

    /// Convert a numeric array to `float` elements, Java cast semantics per element.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not an array of numbers
    pub fn as_float_array(&self) -> Result<Vec<f32>> {
        self.array_of("numeric array", AnnotationValue::as_float)
    }

    /// Convert a numeric array to `double` elements, Java cast semantics per element.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not an array of numbers
    pub fn as_double_array(&self) -> Result<Vec<f64>> {
        self.array_of("numeric array", AnnotationValue::as_double)
    }

    /// The elements of a `char` array.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not a character array
    pub fn as_char_array(&self) -> Result<Vec<char>> {
        self.array_of("character array", AnnotationValue::as_char)
    }

    /// The elements of a `boolean` array.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not a boolean array
    pub fn as_bool_array(&self) -> Result<Vec<bool>> {
        self.array_of("boolean array", AnnotationValue::as_bool)
    }

    /// String renderings of every array element, as [`AnnotationValue::as_string`]
    /// would produce them.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not an array
    pub fn as_string_array(&self) -> Result<Vec<String>> {
        self.array_of("array", |element| Ok(element.as_string()))
    }

    /// The constant names of every element of an enum array.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not an enum array
    pub fn as_enum_array(&self) -> Result<Vec<&str>> {
        self.array_of("enum array", AnnotationValue::as_enum)
    }

    /// The type names of every element of an enum array. Note that an empty array
    /// carries no type information at all.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not an enum array
    pub fn as_enum_type_array(&self) -> Result<Vec<&DotName>> {
        self.array_of("enum array", AnnotationValue::as_enum_type)
    }

    /// The types of every element of a class array.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not a class array
    pub fn as_class_array(&self) -> Result<Vec<&Type>> {
        self.array_of("class array", AnnotationValue::as_class)
    }

    /// The instances of every element of a nested-annotation array.
    ///
    /// # Errors
    /// Returns [`Error::InvalidValueAccess`] if the value is not an annotation array
    pub fn as_nested_array(&self) -> Result<Vec<&AnnotationInstance>> {
        self.array_of("nested annotation array", AnnotationValue::as_nested)
    }

    fn array_of<'a, T>(
        &'a self,
        expected: &'static str,
        convert: impl Fn(&'a AnnotationValue) -> Result<T>,
    ) -> Result<Vec<T>> {
        let ValueKind::Array(elements) = &self.kind else {
            return Err(self.access_error(expected));
        };
        elements.iter().map(convert).collect()
    }
}

/// Renders a value payload without its parameter name.
struct DisplayValue<'a>(&'a ValueKind);

impl fmt::Display for DisplayValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            ValueKind::Byte(v) => write!(f, "{v}"),
            ValueKind::Short(v) => write!(f, "{v}"),
            ValueKind::Int(v) => write!(f, "{v}"),
            ValueKind::Long(v) => write!(f, "{v}"),
            ValueKind::Char(v) => write!(f, "{v}"),
            ValueKind::Float(v) => write!(f, "{v}"),
            ValueKind::Double(v) => write!(f, "{v}"),
            ValueKind::Boolean(v) => write!(f, "{v}"),
            ValueKind::String(v) => write!(f, "\"{v}\""),
            ValueKind::Class(v) => write!(f, "{v}"),
            ValueKind::Enum { constant, .. } => write!(f, "{constant}"),
            ValueKind::Nested(v) => write!(f, "{v}"),
            ValueKind::Array(elements) => {
                f.write_str("[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.name.is_empty() {
            write!(f, "{} = ", self.name)?;
        }
        write!(f, "{}", DisplayValue(&self.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::names::NameTable;
    use crate::metadata::typesystem::parse_type_descriptor;

    fn value(kind: ValueKind) -> AnnotationValue {
        AnnotationValue::new("v", kind)
    }

    #[test]
    fn integral_widening_and_narrowing() {
        let v = value(ValueKind::Byte(-3));
        assert_eq!(v.as_int().unwrap(), -3);
        assert_eq!(v.as_long().unwrap(), -3);
        assert_eq!(v.as_double().unwrap(), -3.0);

        // (int) of a long keeps the low 32 bits
        let v = value(ValueKind::Long(0x1_2345_6789));
        assert_eq!(v.as_int().unwrap(), 0x2345_6789);
        // (short) of an int keeps the low 16 bits
        let v = value(ValueKind::Int(0x1_FFFF));
        assert_eq!(v.as_short().unwrap(), -1);
        assert_eq!(v.as_byte().unwrap(), -1);
    }

    #[test]
    fn floating_point_casts_match_java() {
        // Truncation toward zero
        let v = value(ValueKind::Double(-2.9));
        assert_eq!(v.as_int().unwrap(), -2);
        assert_eq!(v.as_long().unwrap(), -2);

        // NaN casts to zero
        let v = value(ValueKind::Double(f64::NAN));
        assert_eq!(v.as_int().unwrap(), 0);

        // Out-of-range saturates at the int bound ...
        let v = value(ValueKind::Double(1e12));
        assert_eq!(v.as_int().unwrap(), i32::MAX);
        // ... but short/byte narrow through int, so the low bits of i32::MAX survive
        assert_eq!(v.as_short().unwrap(), -1);
        assert_eq!(v.as_byte().unwrap(), -1);

        let v = value(ValueKind::Float(127.9));
        assert_eq!(v.as_byte().unwrap(), 127);
        assert_eq!(v.as_double().unwrap(), f64::from(127.9f32));
    }

    #[test]
    fn kind_discipline() {
        let v = value(ValueKind::String("hi".into()));
        assert!(v.as_int().is_err());
        assert!(v.as_bool().is_err());
        assert!(v.as_char().is_err());
        assert!(v.as_enum().is_err());
        assert!(v.as_class().is_err());
        assert!(v.as_nested().is_err());
        assert!(v.as_array().is_err());
        assert_eq!(v.as_string(), "hi");

        let v = value(ValueKind::Char('x'));
        assert_eq!(v.as_char().unwrap(), 'x');
        // char does not participate in numeric conversion
        assert!(v.as_int().is_err());

        let v = value(ValueKind::Boolean(true));
        assert!(v.as_bool().unwrap());
        assert!(v.as_int().is_err());

        let err = value(ValueKind::Int(1)).as_bool().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Annotation value is not boolean - found int"
        );
    }

    #[test]
    fn enum_values() {
        let mut names = NameTable::new();
        let v = value(ValueKind::Enum {
            type_name: names.intern("java.time.DayOfWeek"),
            constant: "MONDAY".into(),
        });
        assert_eq!(v.as_enum().unwrap(), "MONDAY");
        assert_eq!(v.as_enum_type().unwrap().to_string(), "java.time.DayOfWeek");
        assert_eq!(v.as_string(), "MONDAY");
    }

    #[test]
    fn array_conversions() {
        let elements = vec![
            AnnotationValue::new("", ValueKind::Int(1)),
            AnnotationValue::new("", ValueKind::Int(2)),
            AnnotationValue::new("", ValueKind::Int(3)),
        ];
        let v = value(ValueKind::Array(elements));

        assert_eq!(v.as_int_array().unwrap(), vec![1, 2, 3]);
        assert_eq!(v.as_long_array().unwrap(), vec![1, 2, 3]);
        assert_eq!(v.as_double_array().unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(v.as_string_array().unwrap(), vec!["1", "2", "3"]);
        assert!(v.as_bool_array().is_err());
        assert!(v.as_enum_array().is_err());

        let empty = value(ValueKind::Array(Vec::new()));
        assert!(empty.as_int_array().unwrap().is_empty());
        assert!(empty.as_enum_array().unwrap().is_empty());

        assert!(value(ValueKind::Int(1)).as_int_array().is_err());
    }

    #[test]
    fn rendering() {
        assert_eq!(
            AnnotationValue::new("x", ValueKind::Int(42)).to_string(),
            "x = 42"
        );
        assert_eq!(
            AnnotationValue::new("name", ValueKind::String("hi".into())).to_string(),
            "name = \"hi\""
        );
        // Array elements carry no name
        assert_eq!(AnnotationValue::new("", ValueKind::Int(7)).to_string(), "7");

        let array = AnnotationValue::new(
            "v",
            ValueKind::Array(vec![
                AnnotationValue::new("", ValueKind::Int(1)),
                AnnotationValue::new("", ValueKind::Int(2)),
            ]),
        );
        assert_eq!(array.to_string(), "v = [1,2]");

        let mut names = NameTable::new();
        let class_value = AnnotationValue::new(
            "c",
            ValueKind::Class(parse_type_descriptor("[[Ljava/lang/String;", &mut names).unwrap()),
        );
        assert_eq!(class_value.to_string(), "c = java.lang.String[][]");
    }

    #[test]
    fn nested_instances() {
        let mut names = NameTable::new();
        let inner = AnnotationInstance::new(
            names.intern("pkg.Inner"),
            None,
            vec![AnnotationValue::new("v", ValueKind::Int(5))],
        );
        let v = value(ValueKind::Nested(inner));

        let nested = v.as_nested().unwrap();
        assert!(nested.target().is_none());
        assert_eq!(nested.name().to_string(), "pkg.Inner");
        assert_eq!(nested.value("v").unwrap().as_int().unwrap(), 5);
        assert!(nested.value("missing").is_none());
        assert_eq!(v.to_string(), "v = @pkg.Inner(v = 5)");
    }
}
