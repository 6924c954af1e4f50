//! Shared functionality for crafting class-file byte buffers in tests.
//!
//! [`ClassBytes`] assembles a minimal but fully valid class file: constant pool, class
//! header, member tables, and annotation attributes. Pool entries are appended on
//! demand while the body is serialized, so tests never deal with pool indices
//! themselves.

use crate::metadata::classinfo::AccessFlags;

/// One annotation to emit, as a type descriptor plus named element values.
pub(crate) struct Annotation {
    type_descriptor: &'static str,
    values: Vec<(&'static str, Ev)>,
}

impl Annotation {
    pub(crate) fn new(type_descriptor: &'static str) -> Self {
        Annotation {
            type_descriptor,
            values: Vec::new(),
        }
    }

    pub(crate) fn value(mut self, name: &'static str, value: Ev) -> Self {
        self.values.push((name, value));
        self
    }
}

/// Element-value payloads understood by the builder.
pub(crate) enum Ev {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Char(char),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Str(&'static str),
    /// `(type descriptor, constant name)`
    Enum(&'static str, &'static str),
    /// A type descriptor decoded as a `Class` value
    ClassDesc(&'static str),
    Nested(Annotation),
    Array(Vec<Ev>),
}

struct Field {
    name: &'static str,
    descriptor: &'static str,
    annotations: Vec<Annotation>,
}

struct Method {
    name: &'static str,
    descriptor: &'static str,
    annotations: Vec<Annotation>,
    parameter_annotations: Option<Vec<Vec<Annotation>>>,
}

/// Builder for one crafted class file.
pub(crate) struct ClassBytes {
    minor: u16,
    major: u16,
    access: u16,
    this_class: &'static str,
    super_class: Option<&'static str>,
    interfaces: Vec<&'static str>,
    fields: Vec<Field>,
    methods: Vec<Method>,
    class_annotations: Option<(bool, Vec<Annotation>)>,
    unknown_attributes: Vec<(&'static str, Vec<u8>)>,
}

impl ClassBytes {
    pub(crate) fn new(this_class: &'static str) -> Self {
        ClassBytes {
            minor: 0,
            major: 50,
            access: (AccessFlags::PUBLIC | AccessFlags::SUPER).bits(),
            this_class,
            super_class: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            class_annotations: None,
            unknown_attributes: Vec::new(),
        }
    }

    pub(crate) fn version(&mut self, minor: u16, major: u16) -> &mut Self {
        self.minor = minor;
        self.major = major;
        self
    }

    pub(crate) fn access(&mut self, access: u16) -> &mut Self {
        self.access = access;
        self
    }

    pub(crate) fn super_class(&mut self, internal_name: &'static str) -> &mut Self {
        self.super_class = Some(internal_name);
        self
    }

    /// Emit a zero `super_class` index, as `java.lang.Object` does.
    pub(crate) fn no_super_class(&mut self) -> &mut Self {
        self.super_class = None;
        self
    }

    pub(crate) fn interface(&mut self, internal_name: &'static str) -> &mut Self {
        self.interfaces.push(internal_name);
        self
    }

    pub(crate) fn field(
        &mut self,
        name: &'static str,
        descriptor: &'static str,
        annotations: Vec<Annotation>,
    ) -> &mut Self {
        self.fields.push(Field {
            name,
            descriptor,
            annotations,
        });
        self
    }

    pub(crate) fn method(
        &mut self,
        name: &'static str,
        descriptor: &'static str,
        annotations: Vec<Annotation>,
    ) -> &mut Self {
        self.methods.push(Method {
            name,
            descriptor,
            annotations,
            parameter_annotations: None,
        });
        self
    }

    /// Add a method carrying a `RuntimeVisibleParameterAnnotations` table, one inner
    /// vector per declared parameter.
    pub(crate) fn method_with_parameter_annotations(
        &mut self,
        name: &'static str,
        descriptor: &'static str,
        parameter_annotations: Vec<Vec<Annotation>>,
    ) -> &mut Self {
        self.methods.push(Method {
            name,
            descriptor,
            annotations: Vec::new(),
            parameter_annotations: Some(parameter_annotations),
        });
        self
    }

    pub(crate) fn class_annotations(
        &mut self,
        visible: bool,
        annotations: Vec<Annotation>,
    ) -> &mut Self {
        self.class_annotations = Some((visible, annotations));
        self
    }

    /// Attach an arbitrary (unparsed) class attribute, to exercise skip-by-length.
    pub(crate) fn unknown_class_attribute(
        &mut self,
        name: &'static str,
        payload: &[u8],
    ) -> &mut Self {
        self.unknown_attributes.push((name, payload.to_vec()));
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut pool = PoolWriter::new();
        let mut body = Vec::new();

        push_u16(&mut body, self.access);
        let this_index = pool.class(self.this_class);
        push_u16(&mut body, this_index);
        let super_index = match self.super_class {
            Some(internal) => pool.class(internal),
            None => 0,
        };
        push_u16(&mut body, super_index);

        push_u16(&mut body, self.interfaces.len() as u16);
        for interface in &self.interfaces {
            let index = pool.class(interface);
            push_u16(&mut body, index);
        }

        push_u16(&mut body, self.fields.len() as u16);
        for field in &self.fields {
            push_u16(&mut body, 0); // access_flags
            let name_index = pool.utf8(field.name);
            push_u16(&mut body, name_index);
            let descriptor_index = pool.utf8(field.descriptor);
            push_u16(&mut body, descriptor_index);
            if field.annotations.is_empty() {
                push_u16(&mut body, 0);
            } else {
                push_u16(&mut body, 1);
                write_annotations_attribute(&mut pool, &mut body, true, &field.annotations);
            }
        }

        push_u16(&mut body, self.methods.len() as u16);
        for method in &self.methods {
            push_u16(&mut body, 0); // access_flags
            let name_index = pool.utf8(method.name);
            push_u16(&mut body, name_index);
            let descriptor_index = pool.utf8(method.descriptor);
            push_u16(&mut body, descriptor_index);

            let mut attribute_count = 0u16;
            if !method.annotations.is_empty() {
                attribute_count += 1;
            }
            if method.parameter_annotations.is_some() {
                attribute_count += 1;
            }
            push_u16(&mut body, attribute_count);
            if !method.annotations.is_empty() {
                write_annotations_attribute(&mut pool, &mut body, true, &method.annotations);
            }
            if let Some(parameter_annotations) = &method.parameter_annotations {
                write_parameter_annotations_attribute(&mut pool, &mut body, parameter_annotations);
            }
        }

        let mut class_attribute_count = self.unknown_attributes.len() as u16;
        if self.class_annotations.is_some() {
            class_attribute_count += 1;
        }
        push_u16(&mut body, class_attribute_count);
        for (name, payload) in &self.unknown_attributes {
            let name_index = pool.utf8(name);
            push_u16(&mut body, name_index);
            push_u32(&mut body, payload.len() as u32);
            body.extend_from_slice(payload);
        }
        if let Some((visible, annotations)) = &self.class_annotations {
            write_annotations_attribute(&mut pool, &mut body, *visible, annotations);
        }

        let mut out = Vec::new();
        push_u32(&mut out, 0xCAFE_BABE);
        push_u16(&mut out, self.minor);
        push_u16(&mut out, self.major);
        push_u16(&mut out, pool.next);
        out.extend_from_slice(&pool.bytes);
        out.extend_from_slice(&body);
        out
    }
}

/// Append-only constant pool serializer. `next` is the next free 1-based index and
/// doubles as the `constant_pool_count` value to emit.
struct PoolWriter {
    bytes: Vec<u8>,
    next: u16,
}

impl PoolWriter {
    fn new() -> Self {
        PoolWriter {
            bytes: Vec::new(),
            next: 1,
        }
    }

    fn utf8(&mut self, value: &str) -> u16 {
        // All builder strings are BMP without NUL, where standard UTF-8 and the JVM's
        // modified UTF-8 coincide
        self.bytes.push(1);
        push_u16(&mut self.bytes, value.len() as u16);
        self.bytes.extend_from_slice(value.as_bytes());
        self.claim(1)
    }

    fn class(&mut self, internal_name: &str) -> u16 {
        let name_index = self.utf8(internal_name);
        self.bytes.push(7);
        push_u16(&mut self.bytes, name_index);
        self.claim(1)
    }

    fn integer(&mut self, value: i32) -> u16 {
        self.bytes.push(3);
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self.claim(1)
    }

    fn long(&mut self, value: i64) -> u16 {
        self.bytes.push(5);
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self.claim(2)
    }

    fn float(&mut self, value: f32) -> u16 {
        self.bytes.push(4);
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self.claim(1)
    }

    fn double(&mut self, value: f64) -> u16 {
        self.bytes.push(6);
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self.claim(2)
    }

    fn claim(&mut self, slots: u16) -> u16 {
        let index = self.next;
        self.next += slots;
        index
    }
}

fn write_annotations_attribute(
    pool: &mut PoolWriter,
    out: &mut Vec<u8>,
    visible: bool,
    annotations: &[Annotation],
) {
    let attribute_name = if visible {
        "RuntimeVisibleAnnotations"
    } else {
        "RuntimeInvisibleAnnotations"
    };
    let name_index = pool.utf8(attribute_name);

    let mut payload = Vec::new();
    push_u16(&mut payload, annotations.len() as u16);
    for annotation in annotations {
        encode_annotation(pool, &mut payload, annotation);
    }

    push_u16(out, name_index);
    push_u32(out, payload.len() as u32);
    out.extend_from_slice(&payload);
}

fn write_parameter_annotations_attribute(
    pool: &mut PoolWriter,
    out: &mut Vec<u8>,
    parameters: &[Vec<Annotation>],
) {
    let name_index = pool.utf8("RuntimeVisibleParameterAnnotations");

    let mut payload = Vec::new();
    payload.push(parameters.len() as u8);
    for annotations in parameters {
        push_u16(&mut payload, annotations.len() as u16);
        for annotation in annotations {
            encode_annotation(pool, &mut payload, annotation);
        }
    }

    push_u16(out, name_index);
    push_u32(out, payload.len() as u32);
    out.extend_from_slice(&payload);
}

fn encode_annotation(pool: &mut PoolWriter, out: &mut Vec<u8>, annotation: &Annotation) {
    let type_index = pool.utf8(annotation.type_descriptor);
    push_u16(out, type_index);
    push_u16(out, annotation.values.len() as u16);
    for (name, value) in &annotation.values {
        let name_index = pool.utf8(name);
        push_u16(out, name_index);
        encode_element_value(pool, out, value);
    }
}

fn encode_element_value(pool: &mut PoolWriter, out: &mut Vec<u8>, value: &Ev) {
    match value {
        Ev::Byte(v) => {
            out.push(b'B');
            let index = pool.integer(i32::from(*v));
            push_u16(out, index);
        }
        Ev::Short(v) => {
            out.push(b'S');
            let index = pool.integer(i32::from(*v));
            push_u16(out, index);
        }
        Ev::Int(v) => {
            out.push(b'I');
            let index = pool.integer(*v);
            push_u16(out, index);
        }
        Ev::Long(v) => {
            out.push(b'J');
            let index = pool.long(*v);
            push_u16(out, index);
        }
        Ev::Char(v) => {
            out.push(b'C');
            let index = pool.integer(*v as i32);
            push_u16(out, index);
        }
        Ev::Float(v) => {
            out.push(b'F');
            let index = pool.float(*v);
            push_u16(out, index);
        }
        Ev::Double(v) => {
            out.push(b'D');
            let index = pool.double(*v);
            push_u16(out, index);
        }
        Ev::Boolean(v) => {
            out.push(b'Z');
            let index = pool.integer(i32::from(*v));
            push_u16(out, index);
        }
        Ev::Str(v) => {
            out.push(b's');
            let index = pool.utf8(v);
            push_u16(out, index);
        }
        Ev::Enum(type_descriptor, constant) => {
            out.push(b'e');
            let type_index = pool.utf8(type_descriptor);
            push_u16(out, type_index);
            let constant_index = pool.utf8(constant);
            push_u16(out, constant_index);
        }
        Ev::ClassDesc(descriptor) => {
            out.push(b'c');
            let index = pool.utf8(descriptor);
            push_u16(out, index);
        }
        Ev::Nested(annotation) => {
            out.push(b'@');
            encode_annotation(pool, out, annotation);
        }
        Ev::Array(elements) => {
            out.push(b'[');
            push_u16(out, elements.len() as u16);
            for element in elements {
                encode_element_value(pool, out, element);
            }
        }
    }
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}
