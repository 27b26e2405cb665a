use crate::jvm::class_file::{
    ClassConstantIndex, ConstantIndex, Serialize, Utf8ConstantIndex,
};
use byteorder::WriteBytesExt;

/// Attributes (used in classes, fields, and methods)
///
/// The representation is designed to be easily extended with custom attributes.
/// While some attributes aren't essential, others are really important (eg. the
/// code attribute for including the actual bytecode).
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7
#[derive(Debug)]
pub struct Attribute {
    pub name_index: Utf8ConstantIndex,
    pub info: Vec<u8>,
}

impl Serialize for Attribute {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.name_index.serialize(writer)?;

        // Attribute info length is 4 bytes
        (self.info.len() as u32).serialize(writer)?;
        writer.write_all(&self.info)?;

        Ok(())
    }
}

/// Attributes are all stored in the same way (see `Attribute`), but internally
/// they represent very different things. This trait is implemented by things
/// which can be turned into attributes.
pub trait AttributeLike: Serialize {
    /// Name of the attribute
    const NAME: &'static str;
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.2
#[derive(Debug)]
pub struct ConstantValue(pub ConstantIndex);

impl Serialize for ConstantValue {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

impl AttributeLike for ConstantValue {
    const NAME: &'static str = "ConstantValue";
}

/// Code attribute without exception handlers
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.3
#[derive(Debug)]
pub struct Code {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code_array: BytecodeArray,
    pub attributes: Vec<Attribute>,
}

impl Serialize for Code {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.max_stack.serialize(writer)?;
        self.max_locals.serialize(writer)?;
        self.code_array.serialize(writer)?;

        // Empty exception table
        0u16.serialize(writer)?;
        self.attributes.serialize(writer)?;
        Ok(())
    }
}

impl AttributeLike for Code {
    const NAME: &'static str = "Code";
}

/// Encoded bytecode instructions
#[derive(Debug)]
pub struct BytecodeArray(pub Vec<u8>);

impl Serialize for BytecodeArray {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        let len = self.0.len() as u32;
        len.serialize(writer)?;
        writer.write_all(&self.0)?;
        Ok(())
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.10
#[derive(Debug)]
pub struct SourceFile(pub Utf8ConstantIndex);

impl AttributeLike for SourceFile {
    const NAME: &'static str = "SourceFile";
}

impl Serialize for SourceFile {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

#[derive(Debug)]
pub struct Signature {
    pub signature: Utf8ConstantIndex,
}

impl AttributeLike for Signature {
    const NAME: &'static str = "Signature";
}

impl Serialize for Signature {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.signature.serialize(writer)?;
        Ok(())
    }
}

/// Checked exceptions a method may throw
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.5
#[derive(Debug)]
pub struct Exceptions(pub Vec<ClassConstantIndex>);

impl AttributeLike for Exceptions {
    const NAME: &'static str = "Exceptions";
}

impl Serialize for Exceptions {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.16
#[derive(Debug)]
pub struct RuntimeVisibleAnnotations(pub Vec<Annotation>);

impl AttributeLike for RuntimeVisibleAnnotations {
    const NAME: &'static str = "RuntimeVisibleAnnotations";
}

impl Serialize for RuntimeVisibleAnnotations {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.17
#[derive(Debug)]
pub struct RuntimeInvisibleAnnotations(pub Vec<Annotation>);

impl AttributeLike for RuntimeInvisibleAnnotations {
    const NAME: &'static str = "RuntimeInvisibleAnnotations";
}

impl Serialize for RuntimeInvisibleAnnotations {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

/// One list of annotations per declared parameter
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.18
#[derive(Debug)]
pub struct RuntimeVisibleParameterAnnotations(pub Vec<Vec<Annotation>>);

impl AttributeLike for RuntimeVisibleParameterAnnotations {
    const NAME: &'static str = "RuntimeVisibleParameterAnnotations";
}

impl Serialize for RuntimeVisibleParameterAnnotations {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        serialize_parameter_annotations(&self.0, writer)
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.19
#[derive(Debug)]
pub struct RuntimeInvisibleParameterAnnotations(pub Vec<Vec<Annotation>>);

impl AttributeLike for RuntimeInvisibleParameterAnnotations {
    const NAME: &'static str = "RuntimeInvisibleParameterAnnotations";
}

impl Serialize for RuntimeInvisibleParameterAnnotations {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        serialize_parameter_annotations(&self.0, writer)
    }
}

/// Parameter count is a `u8` here, not the usual `u16`
fn serialize_parameter_annotations<W: WriteBytesExt>(
    parameters: &[Vec<Annotation>],
    writer: &mut W,
) -> std::io::Result<()> {
    (parameters.len() as u8).serialize(writer)?;
    for annotations in parameters {
        annotations.serialize(writer)?;
    }
    Ok(())
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.16
#[derive(Debug, Clone)]
pub struct Annotation {
    /// Field descriptor of the annotation interface
    pub type_index: Utf8ConstantIndex,
    pub elements: Vec<ElementValuePair>,
}

impl Serialize for Annotation {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.type_index.serialize(writer)?;
        self.elements.serialize(writer)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ElementValuePair {
    pub name_index: Utf8ConstantIndex,
    pub value: ElementValue,
}

impl Serialize for ElementValuePair {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.name_index.serialize(writer)?;
        self.value.serialize(writer)?;
        Ok(())
    }
}

/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.16.1
#[derive(Debug, Clone)]
pub enum ElementValue {
    /// Primitive or string constant, tagged with its descriptor character (or `s` for strings)
    Constant { tag: u8, value: ConstantIndex },

    /// Enum constant, given by the enum's field descriptor and the constant's simple name
    Enum {
        type_name: Utf8ConstantIndex,
        const_name: Utf8ConstantIndex,
    },

    /// Class literal, given by a return descriptor (so `V` is allowed)
    Class(Utf8ConstantIndex),

    Annotation(Annotation),
    Array(Vec<ElementValue>),
}

impl Serialize for ElementValue {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            ElementValue::Constant { tag, value } => {
                tag.serialize(writer)?;
                value.serialize(writer)?;
            }
            ElementValue::Enum {
                type_name,
                const_name,
            } => {
                b'e'.serialize(writer)?;
                type_name.serialize(writer)?;
                const_name.serialize(writer)?;
            }
            ElementValue::Class(class_info) => {
                b'c'.serialize(writer)?;
                class_info.serialize(writer)?;
            }
            ElementValue::Annotation(annotation) => {
                b'@'.serialize(writer)?;
                annotation.serialize(writer)?;
            }
            ElementValue::Array(values) => {
                b'['.serialize(writer)?;
                values.serialize(writer)?;
            }
        };
        Ok(())
    }
}
