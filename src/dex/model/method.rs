use crate::dex::{
    decode_instructions, encode_instructions, Annotation, Instruction, InstructionError,
    MethodAccessFlags, MethodRef, Prototype, RenderDescriptor, TypeDescriptor,
};
use std::fmt::{Display, Error as FmtError, Formatter};

/// Method declared by a class
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    /// Declaring class
    pub class: TypeDescriptor,
    pub name: String,
    pub prototype: Prototype,
    pub access_flags: MethodAccessFlags,
    pub annotations: Vec<Annotation>,

    /// One entry per parameter (possibly empty); an empty outer vector means no parameter
    /// annotations at all
    pub parameter_annotations: Vec<Vec<Annotation>>,

    /// Code, absent for abstract and native methods
    pub implementation: Option<MethodImplementation>,
}

impl Method {
    pub fn reference(&self) -> MethodRef {
        MethodRef {
            class: self.class.clone(),
            name: self.name.clone(),
            prototype: self.prototype.clone(),
        }
    }

    pub fn is_static(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::STATIC)
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::ABSTRACT)
    }

    pub fn is_native(&self) -> bool {
        self.access_flags.contains(MethodAccessFlags::NATIVE)
    }

    /// Registers taken up by incoming arguments, including the receiver for instance methods
    pub fn ins_size(&self) -> u32 {
        let receiver = if self.is_static() { 0 } else { 1 };
        receiver + self.prototype.parameter_registers()
    }
}

/// Renders as `Lcom/example/Foo;->bar(IJ)V`
impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        let mut rendered = String::new();
        self.class.render_to(&mut rendered);
        rendered.push_str("->");
        rendered.push_str(&self.name);
        self.prototype.render_to(&mut rendered);
        f.write_str(&rendered)
    }
}

/// Method body (as in a `code_item`)
///
/// Instructions are kept as raw code units. Try blocks and debug information are never carried
/// over, only whether there were any try blocks.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MethodImplementation {
    /// Number of registers used by the code
    pub registers_size: u16,

    /// Number of words of incoming arguments (the last `ins_size` registers)
    pub ins_size: u16,

    /// Number of words of outgoing argument space needed for invocations
    pub outs_size: u16,

    /// Number of try blocks in the original body
    pub tries_size: u16,

    /// Code units
    pub insns: Vec<u16>,
}

impl MethodImplementation {
    /// Construct a body without try blocks from a list of instructions
    pub fn from_instructions(
        registers_size: u16,
        ins_size: u16,
        instructions: &[Instruction],
    ) -> Result<MethodImplementation, InstructionError> {
        Ok(MethodImplementation {
            registers_size,
            ins_size,
            outs_size: 0,
            tries_size: 0,
            insns: encode_instructions(instructions)?,
        })
    }

    /// Decode the body, provided it only uses instructions without constant-pool references
    pub fn instructions(&self) -> Result<Vec<Instruction>, InstructionError> {
        decode_instructions(&self.insns)
    }
}
