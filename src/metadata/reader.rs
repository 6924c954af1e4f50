//! Single-pass class-file reader.
//!
//! One [`ClassFileReader`] consumes one class-file byte buffer and produces the class
//! descriptor plus every annotation instance discovered on the class, its fields, its
//! methods, and its method parameters. Parsing is all-or-nothing: any malformation
//! discards the partially built descriptor and surfaces an error to the indexer, which
//! decides (by policy) whether the whole scan fails or the class file is skipped.
//!
//! The pass follows the JVMS §4.1 layout: magic and version, constant pool, access
//! flags, this/super/interfaces, fields, methods, class attributes. Of the attribute
//! universe only the four annotation attributes are decoded —
//! `RuntimeVisibleAnnotations`, `RuntimeInvisibleAnnotations`, and their
//! per-parameter counterparts; visibility is not preserved in the model, and every
//! other attribute (including ones from newer class-file versions) is skipped by its
//! declared length. A decoded attribute must consume exactly its declared length.

use std::sync::Arc;

use crate::{
    file::Parser,
    metadata::{
        annotations::{AnnotationInstance, AnnotationValue, ValueKind},
        classinfo::{AccessFlags, AnnotationTarget, ClassInfo, ClassInfoRc, FieldInfo, MethodInfo},
        names::{DotName, NameTable},
        pool::ConstantPool,
        typesystem::{parse_method_descriptor, parse_type_descriptor},
    },
    Error, Result,
};

const CLASS_FILE_MAGIC: u32 = 0xCAFE_BABE;
/// JDK 1.0.2 class files are version 45
const MIN_MAJOR_VERSION: u16 = 45;
/// Maximum recursion depth for nested annotations and arrays
const MAX_NESTING_DEPTH: usize = 50;

const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
const RUNTIME_INVISIBLE_ANNOTATIONS: &str = "RuntimeInvisibleAnnotations";
const RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS: &str = "RuntimeVisibleParameterAnnotations";
const RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS: &str = "RuntimeInvisibleParameterAnnotations";

/// The result of reading one class file: the finished descriptor plus its annotations
/// with their targets bound.
pub(crate) struct ScannedClass {
    pub(crate) class: ClassInfoRc,
    pub(crate) annotations: Vec<AnnotationInstance>,
}

/// Which declaration's attribute table is being walked.
#[derive(Clone, Copy)]
enum AttributeContext {
    Class,
    Field(usize),
    Method(usize),
}

/// Target recorded while the owning [`ClassInfo`] is still under construction; bound
/// to a real [`AnnotationTarget`] once the descriptor is complete.
enum PendingTarget {
    Class,
    Field(usize),
    Method(usize),
    MethodParameter(usize, u8),
}

struct PendingAnnotation {
    target: PendingTarget,
    name: DotName,
    values: Vec<AnnotationValue>,
}

/// Reader over one class-file byte buffer.
pub(crate) struct ClassFileReader<'a, 'n> {
    parser: Parser<'a>,
    names: &'n mut NameTable,
}

impl<'a, 'n> ClassFileReader<'a, 'n> {
    pub(crate) fn new(data: &'a [u8], names: &'n mut NameTable) -> Self {
        ClassFileReader {
            parser: Parser::new(data),
            names,
        }
    }

    /// Run the pass. Consumes the reader; the cursor must cover exactly one class file.
    pub(crate) fn read(mut self) -> Result<ScannedClass> {
        let magic = self.parser.read_be::<u32>()?;
        if magic != CLASS_FILE_MAGIC {
            return Err(malformed_error!(
                "Invalid class file magic - 0x{:08X}",
                magic
            ));
        }

        let _minor = self.parser.read_be::<u16>()?;
        let major = self.parser.read_be::<u16>()?;
        if major < MIN_MAJOR_VERSION {
            return Err(Error::UnsupportedVersion(major));
        }

        let pool = ConstantPool::parse(&mut self.parser)?;

        let flags = AccessFlags::from_bits_retain(self.parser.read_be::<u16>()?);
        let this_index = self.parser.read_be::<u16>()?;
        let name = pool.class_name(this_index, self.names)?;

        let super_index = self.parser.read_be::<u16>()?;
        let super_name = if super_index == 0 {
            None
        } else {
            Some(pool.class_name(super_index, self.names)?)
        };

        let interface_count = self.parser.read_be::<u16>()?;
        let mut interfaces = Vec::with_capacity(interface_count as usize);
        for _ in 0..interface_count {
            let interface_index = self.parser.read_be::<u16>()?;
            interfaces.push(pool.class_name(interface_index, self.names)?);
        }

        // Class-level annotations are recorded ahead of member annotations even though
        // their attribute table is physically last in the file
        let mut class_pending = Vec::new();
        let mut member_pending = Vec::new();

        let field_count = self.parser.read_be::<u16>()?;
        let mut fields = Vec::with_capacity(field_count as usize);
        for index in 0..field_count as usize {
            let flags = AccessFlags::from_bits_retain(self.parser.read_be::<u16>()?);
            let name_index = self.parser.read_be::<u16>()?;
            let descriptor_index = self.parser.read_be::<u16>()?;
            let field_type = parse_type_descriptor(pool.utf8(descriptor_index)?, self.names)?;
            fields.push(FieldInfo {
                name: pool.utf8(name_index)?.into(),
                field_type,
                flags,
            });
            self.read_attributes(&pool, AttributeContext::Field(index), &mut member_pending)?;
        }

        let method_count = self.parser.read_be::<u16>()?;
        let mut methods = Vec::with_capacity(method_count as usize);
        for index in 0..method_count as usize {
            let flags = AccessFlags::from_bits_retain(self.parser.read_be::<u16>()?);
            let name_index = self.parser.read_be::<u16>()?;
            let descriptor_index = self.parser.read_be::<u16>()?;
            let (parameters, return_type) =
                parse_method_descriptor(pool.utf8(descriptor_index)?, self.names)?;
            methods.push(MethodInfo {
                name: pool.utf8(name_index)?.into(),
                return_type,
                parameters,
                flags,
            });
            self.read_attributes(&pool, AttributeContext::Method(index), &mut member_pending)?;
        }

        self.read_attributes(&pool, AttributeContext::Class, &mut class_pending)?;

        if self.parser.has_more_data() {
            return Err(malformed_error!(
                "Extra bytes at end of class file - {} of {}",
                self.parser.pos(),
                self.parser.len()
            ));
        }

        let class = Arc::new(ClassInfo {
            name,
            super_name,
            interfaces,
            flags,
            fields,
            methods,
        });

        let annotations = class_pending
            .into_iter()
            .chain(member_pending)
            .map(|annotation| {
                let target = match annotation.target {
                    PendingTarget::Class => AnnotationTarget::Class(class.clone()),
                    PendingTarget::Field(index) => AnnotationTarget::Field(class.clone(), index),
                    PendingTarget::Method(index) => AnnotationTarget::Method(class.clone(), index),
                    PendingTarget::MethodParameter(index, parameter) => {
                        AnnotationTarget::MethodParameter(class.clone(), index, parameter)
                    }
                };
                AnnotationInstance::new(annotation.name, Some(target), annotation.values)
            })
            .collect();

        Ok(ScannedClass { class, annotations })
    }

    /// Walk one `attributes[]` table, decoding the annotation attributes and skipping
    /// everything else by declared length.
    fn read_attributes(
        &mut self,
        pool: &ConstantPool,
        context: AttributeContext,
        pending: &mut Vec<PendingAnnotation>,
    ) -> Result<()> {
        let count = self.parser.read_be::<u16>()?;
        for _ in 0..count {
            let name_index = self.parser.read_be::<u16>()?;
            let length = self.parser.read_be::<u32>()? as usize;
            let attribute_name = pool.utf8(name_index)?;
            let start = self.parser.pos();

            match attribute_name {
                RUNTIME_VISIBLE_ANNOTATIONS | RUNTIME_INVISIBLE_ANNOTATIONS => {
                    let annotation_count = self.parser.read_be::<u16>()?;
                    for _ in 0..annotation_count {
                        let (name, values) = self.read_annotation(pool, 0)?;
                        pending.push(PendingAnnotation {
                            target: match context {
                                AttributeContext::Class => PendingTarget::Class,
                                AttributeContext::Field(index) => PendingTarget::Field(index),
                                AttributeContext::Method(index) => PendingTarget::Method(index),
                            },
                            name,
                            values,
                        });
                    }
                }
                RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS | RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS
                    if matches!(context, AttributeContext::Method(_)) =>
                {
                    let AttributeContext::Method(method) = context else {
                        unreachable!("guard matched a method context");
                    };
                    let parameter_count = self.parser.read_be::<u8>()?;
                    for parameter in 0..parameter_count {
                        let annotation_count = self.parser.read_be::<u16>()?;
                        for _ in 0..annotation_count {
                            let (name, values) = self.read_annotation(pool, 0)?;
                            pending.push(PendingAnnotation {
                                target: PendingTarget::MethodParameter(method, parameter),
                                name,
                                values,
                            });
                        }
                    }
                }
                _ => self.parser.skip(length)?,
            }

            // Both the decoded and the skipped paths must land exactly on the boundary
            if self.parser.pos() - start != length {
                return Err(malformed_error!(
                    "Attribute {} consumed {} bytes but declared {}",
                    attribute_name,
                    self.parser.pos() - start,
                    length
                ));
            }
        }
        Ok(())
    }

    /// Read one `annotation` structure: the type descriptor and its
    /// `element_value_pairs`.
    fn read_annotation(
        &mut self,
        pool: &ConstantPool,
        depth: usize,
    ) -> Result<(DotName, Vec<AnnotationValue>)> {
        if depth > MAX_NESTING_DEPTH {
            return Err(malformed_error!(
                "Annotation nesting exceeds {} levels",
                MAX_NESTING_DEPTH
            ));
        }

        let type_index = self.parser.read_be::<u16>()?;
        let name = self.descriptor_to_name(pool.utf8(type_index)?)?;

        let pair_count = self.parser.read_be::<u16>()?;
        let mut values = Vec::with_capacity(pair_count as usize);
        for _ in 0..pair_count {
            let element_name_index = self.parser.read_be::<u16>()?;
            let element_name = pool.utf8(element_name_index)?;
            values.push(self.read_element_value(pool, element_name, depth)?);
        }

        Ok((name, values))
    }

    /// Read one tag-dispatched `element_value`.
    fn read_element_value(
        &mut self,
        pool: &ConstantPool,
        name: &str,
        depth: usize,
    ) -> Result<AnnotationValue> {
        let tag = self.parser.read_be::<u8>()?;
        let kind = match tag {
            // boolean, byte, short and char constants are stored as Integer entries
            b'B' => ValueKind::Byte(pool.integer(self.parser.read_be::<u16>()?)? as i8),
            b'S' => ValueKind::Short(pool.integer(self.parser.read_be::<u16>()?)? as i16),
            b'I' => ValueKind::Int(pool.integer(self.parser.read_be::<u16>()?)?),
            b'J' => ValueKind::Long(pool.long(self.parser.read_be::<u16>()?)?),
            b'F' => ValueKind::Float(pool.float(self.parser.read_be::<u16>()?)?),
            b'D' => ValueKind::Double(pool.double(self.parser.read_be::<u16>()?)?),
            b'Z' => ValueKind::Boolean(pool.integer(self.parser.read_be::<u16>()?)? != 0),
            b'C' => {
                let unit = pool.integer(self.parser.read_be::<u16>()?)?;
                let Some(value) = u32::try_from(unit).ok().and_then(char::from_u32) else {
                    return Err(malformed_error!("Bad char constant - {}", unit));
                };
                ValueKind::Char(value)
            }
            b's' => ValueKind::String(pool.utf8(self.parser.read_be::<u16>()?)?.into()),
            b'e' => {
                let type_name_index = self.parser.read_be::<u16>()?;
                let const_name_index = self.parser.read_be::<u16>()?;
                ValueKind::Enum {
                    type_name: self.descriptor_to_name(pool.utf8(type_name_index)?)?,
                    constant: pool.utf8(const_name_index)?.into(),
                }
            }
            b'c' => {
                let class_info_index = self.parser.read_be::<u16>()?;
                ValueKind::Class(parse_type_descriptor(
                    pool.utf8(class_info_index)?,
                    self.names,
                )?)
            }
            b'@' => {
                let (nested_name, nested_values) = self.read_annotation(pool, depth + 1)?;
                ValueKind::Nested(AnnotationInstance::new(nested_name, None, nested_values))
            }
            b'[' => {
                let element_count = self.parser.read_be::<u16>()?;
                let mut elements = Vec::with_capacity(element_count as usize);
                for _ in 0..element_count {
                    // Array elements have no parameter name of their own
                    elements.push(self.read_element_value(pool, "", depth + 1)?);
                }
                ValueKind::Array(elements)
            }
            other => {
                return Err(malformed_error!("Unknown element value tag 0x{:02X}", other));
            }
        };

        Ok(AnnotationValue::new(name, kind))
    }

    /// Convert an object type descriptor (`Lpkg/Name;`) to an interned dotted name.
    /// Used for annotation type references and enum type references, which JVMS
    /// guarantees are class types.
    fn descriptor_to_name(&mut self, descriptor: &str) -> Result<DotName> {
        let internal = descriptor
            .strip_prefix('L')
            .and_then(|rest| rest.strip_suffix(';'))
            .filter(|rest| !rest.is_empty())
            .ok_or_else(|| malformed_error!("Bad object type descriptor - {}", descriptor))?;

        let mut prefix = None;
        for component in internal.split('/') {
            prefix = Some(self.names.intern_component(prefix, component));
        }
        Ok(prefix.expect("split always yields a component"))
    }
}
