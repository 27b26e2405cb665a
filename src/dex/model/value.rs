use crate::dex::{EncodedAnnotation, FieldRef, MethodRef, Prototype, TypeDescriptor};

/// Constant values stored in annotations and static field initializers
///
/// [0]: https://source.android.com/docs/core/runtime/dex-format#encoding
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedValue {
    Byte(i8),
    Short(i16),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    MethodType(Prototype),
    MethodHandle(MethodHandle),
    String(String),
    Type(TypeDescriptor),
    Field(FieldRef),
    Method(MethodRef),
    Enum(FieldRef),
    Array(Vec<EncodedValue>),
    Annotation(EncodedAnnotation),
    Null,
    Boolean(bool),
}

impl EncodedValue {
    /// Value a static field holds when it has no explicit initializer
    pub fn default_for(field_type: &TypeDescriptor) -> EncodedValue {
        match field_type.as_str() {
            "Z" => EncodedValue::Boolean(false),
            "B" => EncodedValue::Byte(0),
            "S" => EncodedValue::Short(0),
            "C" => EncodedValue::Char(0),
            "I" => EncodedValue::Int(0),
            "J" => EncodedValue::Long(0),
            "F" => EncodedValue::Float(0.0),
            "D" => EncodedValue::Double(0.0),
            _ => EncodedValue::Null,
        }
    }
}

/// Kind of method handle (as in a `method_handle_item`)
#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub enum MethodHandleKind {
    StaticPut,
    StaticGet,
    InstancePut,
    InstanceGet,
    InvokeStatic,
    InvokeInstance,
    InvokeConstructor,
    InvokeDirect,
    InvokeInterface,
}

impl MethodHandleKind {
    pub fn from_code(code: u16) -> Option<MethodHandleKind> {
        Some(match code {
            0x00 => MethodHandleKind::StaticPut,
            0x01 => MethodHandleKind::StaticGet,
            0x02 => MethodHandleKind::InstancePut,
            0x03 => MethodHandleKind::InstanceGet,
            0x04 => MethodHandleKind::InvokeStatic,
            0x05 => MethodHandleKind::InvokeInstance,
            0x06 => MethodHandleKind::InvokeConstructor,
            0x07 => MethodHandleKind::InvokeDirect,
            0x08 => MethodHandleKind::InvokeInterface,
            _ => return None,
        })
    }

    pub fn code(&self) -> u16 {
        match self {
            MethodHandleKind::StaticPut => 0x00,
            MethodHandleKind::StaticGet => 0x01,
            MethodHandleKind::InstancePut => 0x02,
            MethodHandleKind::InstanceGet => 0x03,
            MethodHandleKind::InvokeStatic => 0x04,
            MethodHandleKind::InvokeInstance => 0x05,
            MethodHandleKind::InvokeConstructor => 0x06,
            MethodHandleKind::InvokeDirect => 0x07,
            MethodHandleKind::InvokeInterface => 0x08,
        }
    }

    /// Field accessors point at a `field_id_item`, the rest at a `method_id_item`
    pub fn is_field_accessor(&self) -> bool {
        self.code() <= 0x03
    }
}

#[derive(Clone, Hash, Eq, PartialEq, Debug)]
pub enum MethodHandleMember {
    Field(FieldRef),
    Method(MethodRef),
}

#[derive(Clone, Hash, Eq, PartialEq, Debug)]
pub struct MethodHandle {
    pub kind: MethodHandleKind,
    pub member: MethodHandleMember,
}
