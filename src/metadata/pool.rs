//! Constant pool (`constant_pool[]`) decoding for class files.
//!
//! The constant pool is the indexed table at the head of every class file holding all
//! literal strings, numbers, class references, and member references used by the rest
//! of the file (JVMS §4.4). This module parses the pool into resolved entries and
//! exposes tag-checked random access for the class-file reader.
//!
//! Pool indices are 1-based; index 0 is reserved and never valid. `CONSTANT_Long` and
//! `CONSTANT_Double` entries occupy two consecutive slots, and the second slot is
//! unusable — reading it is a malformation in the referencing structure, not in the
//! pool itself.
//!
//! Strings are stored in modified UTF-8 and are decoded once at parse time; `Class` and
//! `String` entries are indirections into UTF-8 entries and resolve on demand.

use crate::{
    file::Parser,
    metadata::names::{DotName, NameTable},
    Result,
};

/// Constant-pool tags recognized by this reader (JVMS table 4.4-A).
const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACE_METHODREF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;

/// One parsed constant-pool entry.
#[derive(Debug, Clone)]
pub(crate) enum PoolEntry {
    /// Decoded modified-UTF-8 string
    Utf8(Box<str>),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    /// Indirect class reference; `name_index` points at the internal name
    Class { name_index: u16 },
    /// Indirect string literal; payload points at the UTF-8 entry
    String { string_index: u16 },
    FieldRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    MethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    InterfaceMethodRef {
        class_index: u16,
        name_and_type_index: u16,
    },
    NameAndType {
        name_index: u16,
        descriptor_index: u16,
    },
    /// The slot shadowed by a preceding `Long` or `Double` entry
    Unusable,
}

impl PoolEntry {
    fn tag_name(&self) -> &'static str {
        match self {
            PoolEntry::Utf8(_) => "Utf8",
            PoolEntry::Integer(_) => "Integer",
            PoolEntry::Float(_) => "Float",
            PoolEntry::Long(_) => "Long",
            PoolEntry::Double(_) => "Double",
            PoolEntry::Class { .. } => "Class",
            PoolEntry::String { .. } => "String",
            PoolEntry::FieldRef { .. } => "Fieldref",
            PoolEntry::MethodRef { .. } => "Methodref",
            PoolEntry::InterfaceMethodRef { .. } => "InterfaceMethodref",
            PoolEntry::NameAndType { .. } => "NameAndType",
            PoolEntry::Unusable => "unusable slot",
        }
    }
}

/// The decoded constant pool of one class file.
pub(crate) struct ConstantPool {
    entries: Vec<PoolEntry>,
}

impl ConstantPool {
    /// Parse the pool from the cursor, which must stand on `constant_pool_count`.
    ///
    /// On return the cursor stands on `access_flags`.
    pub(crate) fn parse(parser: &mut Parser<'_>) -> Result<ConstantPool> {
        let count = parser.read_be::<u16>()?;
        let mut entries = Vec::with_capacity(count as usize);
        // Index 0 is reserved by the format
        entries.push(PoolEntry::Unusable);

        // u32 so a wide entry in the last slot cannot overflow the counter
        let mut index: u32 = 1;
        while index < u32::from(count) {
            let tag = parser.read_be::<u8>()?;
            let entry = match tag {
                TAG_UTF8 => PoolEntry::Utf8(parser.read_string_mutf8()?.into_boxed_str()),
                TAG_INTEGER => PoolEntry::Integer(parser.read_be::<i32>()?),
                TAG_FLOAT => PoolEntry::Float(parser.read_be::<f32>()?),
                TAG_LONG => PoolEntry::Long(parser.read_be::<i64>()?),
                TAG_DOUBLE => PoolEntry::Double(parser.read_be::<f64>()?),
                TAG_CLASS => PoolEntry::Class {
                    name_index: parser.read_be::<u16>()?,
                },
                TAG_STRING => PoolEntry::String {
                    string_index: parser.read_be::<u16>()?,
                },
                TAG_FIELDREF => PoolEntry::FieldRef {
                    class_index: parser.read_be::<u16>()?,
                    name_and_type_index: parser.read_be::<u16>()?,
                },
                TAG_METHODREF => PoolEntry::MethodRef {
                    class_index: parser.read_be::<u16>()?,
                    name_and_type_index: parser.read_be::<u16>()?,
                },
                TAG_INTERFACE_METHODREF => PoolEntry::InterfaceMethodRef {
                    class_index: parser.read_be::<u16>()?,
                    name_and_type_index: parser.read_be::<u16>()?,
                },
                TAG_NAME_AND_TYPE => PoolEntry::NameAndType {
                    name_index: parser.read_be::<u16>()?,
                    descriptor_index: parser.read_be::<u16>()?,
                },
                _ => {
                    // Unknown tags have unknown sizes, so the rest of the pool is lost
                    return Err(malformed_error!(
                        "Unknown constant pool tag {} at index {}",
                        tag,
                        index
                    ));
                }
            };

            let wide = matches!(entry, PoolEntry::Long(_) | PoolEntry::Double(_));
            entries.push(entry);
            if wide {
                entries.push(PoolEntry::Unusable);
                index += 2;
            } else {
                index += 1;
            }
        }

        Ok(ConstantPool { entries })
    }

    fn entry(&self, index: u16) -> Result<&PoolEntry> {
        if index == 0 || index as usize >= self.entries.len() {
            return Err(malformed_error!(
                "Constant pool index {} out of range (pool size {})",
                index,
                self.entries.len()
            ));
        }
        Ok(&self.entries[index as usize])
    }

    fn mismatch(index: u16, expected: &str, found: &PoolEntry) -> crate::Error {
        malformed_error!(
            "Expected {} at constant pool index {} - found {}",
            expected,
            index,
            found.tag_name()
        )
    }

    /// Resolve a `CONSTANT_Utf8` entry to its decoded string.
    pub(crate) fn utf8(&self, index: u16) -> Result<&str> {
        match self.entry(index)? {
            PoolEntry::Utf8(value) => Ok(value),
            other => Err(Self::mismatch(index, "Utf8", other)),
        }
    }

    /// Resolve a `CONSTANT_Class` entry to a componentized dotted name. The referenced
    /// UTF-8 holds the internal (slash-delimited) form.
    pub(crate) fn class_name(&self, index: u16, names: &mut NameTable) -> Result<DotName> {
        let name_index = match self.entry(index)? {
            PoolEntry::Class { name_index } => *name_index,
            other => return Err(Self::mismatch(index, "Class", other)),
        };

        let internal = self.utf8(name_index)?;
        let mut prefix = None;
        for component in internal.split('/') {
            prefix = Some(names.intern_component(prefix, component));
        }
        Ok(prefix.expect("split always yields a component"))
    }

    /// Tag-checked `CONSTANT_Integer` accessor.
    pub(crate) fn integer(&self, index: u16) -> Result<i32> {
        match self.entry(index)? {
            PoolEntry::Integer(value) => Ok(*value),
            other => Err(Self::mismatch(index, "Integer", other)),
        }
    }

    /// Tag-checked `CONSTANT_Long` accessor.
    pub(crate) fn long(&self, index: u16) -> Result<i64> {
        match self.entry(index)? {
            PoolEntry::Long(value) => Ok(*value),
            other => Err(Self::mismatch(index, "Long", other)),
        }
    }

    /// Tag-checked `CONSTANT_Float` accessor.
    pub(crate) fn float(&self, index: u16) -> Result<f32> {
        match self.entry(index)? {
            PoolEntry::Float(value) => Ok(*value),
            other => Err(Self::mismatch(index, "Float", other)),
        }
    }

    /// Tag-checked `CONSTANT_Double` accessor.
    pub(crate) fn double(&self, index: u16) -> Result<f64> {
        match self.entry(index)? {
            PoolEntry::Double(value) => Ok(*value),
            other => Err(Self::mismatch(index, "Double", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(bytes: &[u8]) -> Result<ConstantPool> {
        let mut parser = Parser::new(bytes);
        ConstantPool::parse(&mut parser)
    }

    #[test]
    fn crafted_pool() {
        #[rustfmt::skip]
        let data: Vec<u8> = vec![
            0x00, 0x08,                                     // count = 8 (7 usable slots)
            0x01, 0x00, 0x03, b'A', b'b', b'c',             // 1: Utf8 "Abc"
            0x03, 0x00, 0x00, 0x00, 0x2A,                   // 2: Integer 42
            0x05, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, // 3: Long 1<<32 (slot 4 unusable)
            0x07, 0x00, 0x01,                               // 5: Class -> #1
            0x04, 0x3F, 0x80, 0x00, 0x00,                   // 6: Float 1.0
            0x0C, 0x00, 0x01, 0x00, 0x01,                   // 7: NameAndType
        ];

        let pool = parse(&data).unwrap();
        assert_eq!(pool.utf8(1).unwrap(), "Abc");
        assert_eq!(pool.integer(2).unwrap(), 42);
        assert_eq!(pool.long(3).unwrap(), 1 << 32);
        assert_eq!(pool.float(6).unwrap(), 1.0);

        let mut names = NameTable::new();
        assert_eq!(pool.class_name(5, &mut names).unwrap().to_string(), "Abc");
    }

    #[test]
    fn internal_names_componentize() {
        #[rustfmt::skip]
        let data: Vec<u8> = vec![
            0x00, 0x03,
            0x01, 0x00, 0x10, b'j', b'a', b'v', b'a', b'/', b'l', b'a', b'n', b'g',
                              b'/', b'O', b'b', b'j', b'e', b'c', b't',   // 1: Utf8
            0x07, 0x00, 0x01,                                             // 2: Class
        ];

        let pool = parse(&data).unwrap();
        let mut names = NameTable::new();
        let name = pool.class_name(2, &mut names).unwrap();
        assert_eq!(name.to_string(), "java.lang.Object");
        assert_eq!(name.local(), "Object");
        assert!(name.is_componentized());
    }

    #[test]
    fn wrong_tag_access_is_rejected() {
        let data: Vec<u8> = vec![0x00, 0x02, 0x03, 0x00, 0x00, 0x00, 0x07];
        let pool = parse(&data).unwrap();

        assert_eq!(pool.integer(1).unwrap(), 7);
        assert!(pool.utf8(1).is_err());
        assert!(pool.long(1).is_err());
    }

    #[test]
    fn long_reserves_following_slot() {
        #[rustfmt::skip]
        let data: Vec<u8> = vec![
            0x00, 0x04,
            0x06, 0x40, 0x09, 0x21, 0xFB, 0x54, 0x44, 0x2D, 0x18, // 1: Double pi (slot 2 unusable)
            0x03, 0x00, 0x00, 0x00, 0x01,                          // 3: Integer 1
        ];
        let pool = parse(&data).unwrap();

        assert!((pool.double(1).unwrap() - std::f64::consts::PI).abs() < 1e-15);
        assert!(pool.double(2).is_err());
        assert!(pool.integer(2).is_err());
        assert_eq!(pool.integer(3).unwrap(), 1);
    }

    #[test]
    fn index_zero_and_out_of_range_are_rejected() {
        let data: Vec<u8> = vec![0x00, 0x02, 0x03, 0x00, 0x00, 0x00, 0x07];
        let pool = parse(&data).unwrap();

        assert!(pool.integer(0).is_err());
        assert!(pool.integer(2).is_err());
        assert!(pool.integer(u16::MAX).is_err());
    }

    #[test]
    fn unknown_tag_fails_parse() {
        let data: Vec<u8> = vec![0x00, 0x02, 0x0F, 0x00, 0x00];
        assert!(parse(&data).is_err());
    }

    #[test]
    fn truncated_pool_fails_parse() {
        let data: Vec<u8> = vec![0x00, 0x03, 0x03, 0x00, 0x00, 0x00, 0x07, 0x01, 0x00, 0x20];
        assert!(parse(&data).is_err());
    }
}
