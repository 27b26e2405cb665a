//! JVM bytecode instructions that push a constant or return
//!
//! The representation mirrors the usual presentation, except that `ldc` and `ldc_w` are merged:
//! the wide form is picked while serializing, depending on the constant index.

use crate::jvm::class_file::{ConstantIndex, Serialize};
use crate::jvm::Error;
use byteorder::WriteBytesExt;
use std::convert::TryFrom;
use std::io::Result;

/// Non-branching JVM bytecode instruction
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Instruction {
    AConstNull,
    IConstM1,
    IConst0,
    IConst1,
    IConst2,
    IConst3,
    IConst4,
    IConst5,
    LConst0,
    LConst1,
    FConst0,
    FConst1,
    FConst2,
    DConst0,
    DConst1,
    BiPush(i8),
    SiPush(i16),
    Ldc(ConstantIndex), // covers both `ldc` and `ldc_w`
    Ldc2(ConstantIndex),
    IReturn,
    LReturn,
    FReturn,
    DReturn,
    AReturn,
    Return,
}

impl Instruction {
    /// Number of bytes in the serialized instruction
    pub fn width(&self) -> usize {
        match self {
            Instruction::AConstNull
            | Instruction::IConstM1
            | Instruction::IConst0
            | Instruction::IConst1
            | Instruction::IConst2
            | Instruction::IConst3
            | Instruction::IConst4
            | Instruction::IConst5
            | Instruction::LConst0
            | Instruction::LConst1
            | Instruction::FConst0
            | Instruction::FConst1
            | Instruction::FConst2
            | Instruction::DConst0
            | Instruction::DConst1
            | Instruction::IReturn
            | Instruction::LReturn
            | Instruction::FReturn
            | Instruction::DReturn
            | Instruction::AReturn
            | Instruction::Return => 1,

            Instruction::BiPush(_) | Instruction::Ldc(ConstantIndex(0..=255)) => 2,

            Instruction::SiPush(_)
            | Instruction::Ldc(_)
            | Instruction::Ldc2(_) // always wide, unlike `ldc` vs. `ldc_w`
            => 3,
        }
    }

    /// Stack slots pushed by the instruction (`long` and `double` take two)
    pub fn pushed_slots(&self) -> u16 {
        match self {
            Instruction::LConst0
            | Instruction::LConst1
            | Instruction::DConst0
            | Instruction::DConst1
            | Instruction::Ldc2(_) => 2,

            Instruction::IReturn
            | Instruction::LReturn
            | Instruction::FReturn
            | Instruction::DReturn
            | Instruction::AReturn
            | Instruction::Return => 0,

            _ => 1,
        }
    }

    /// Smallest instruction pushing an `int` (also used for `boolean`, `byte`, `short`, `char`)
    ///
    /// Returns `None` when the value needs a constant pool entry.
    pub fn push_small_int(value: i32) -> Option<Instruction> {
        Some(match value {
            -1 => Instruction::IConstM1,
            0 => Instruction::IConst0,
            1 => Instruction::IConst1,
            2 => Instruction::IConst2,
            3 => Instruction::IConst3,
            4 => Instruction::IConst4,
            5 => Instruction::IConst5,
            -128..=127 => Instruction::BiPush(value as i8),
            -32768..=32767 => Instruction::SiPush(value as i16),
            _ => return None,
        })
    }
}

impl Serialize for Instruction {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> Result<()> {
        match self {
            Instruction::AConstNull => 0x01u8.serialize(writer)?,
            Instruction::IConstM1 => 0x02u8.serialize(writer)?,
            Instruction::IConst0 => 0x03u8.serialize(writer)?,
            Instruction::IConst1 => 0x04u8.serialize(writer)?,
            Instruction::IConst2 => 0x05u8.serialize(writer)?,
            Instruction::IConst3 => 0x06u8.serialize(writer)?,
            Instruction::IConst4 => 0x07u8.serialize(writer)?,
            Instruction::IConst5 => 0x08u8.serialize(writer)?,
            Instruction::LConst0 => 0x09u8.serialize(writer)?,
            Instruction::LConst1 => 0x0au8.serialize(writer)?,
            Instruction::FConst0 => 0x0bu8.serialize(writer)?,
            Instruction::FConst1 => 0x0cu8.serialize(writer)?,
            Instruction::FConst2 => 0x0du8.serialize(writer)?,
            Instruction::DConst0 => 0x0eu8.serialize(writer)?,
            Instruction::DConst1 => 0x0fu8.serialize(writer)?,
            Instruction::BiPush(b) => {
                0x10u8.serialize(writer)?;
                b.serialize(writer)?;
            }
            Instruction::SiPush(s) => {
                0x11u8.serialize(writer)?;
                s.serialize(writer)?;
            }
            Instruction::Ldc(ConstantIndex(idx)) => match u8::try_from(*idx) {
                Ok(b) => {
                    0x12u8.serialize(writer)?;
                    b.serialize(writer)?;
                }
                Err(_) => {
                    0x13u8.serialize(writer)?;
                    idx.serialize(writer)?;
                }
            },
            Instruction::Ldc2(ConstantIndex(idx)) => {
                0x14u8.serialize(writer)?;
                idx.serialize(writer)?;
            }
            Instruction::IReturn => 0xacu8.serialize(writer)?,
            Instruction::LReturn => 0xadu8.serialize(writer)?,
            Instruction::FReturn => 0xaeu8.serialize(writer)?,
            Instruction::DReturn => 0xafu8.serialize(writer)?,
            Instruction::AReturn => 0xb0u8.serialize(writer)?,
            Instruction::Return => 0xb1u8.serialize(writer)?,
        };
        Ok(())
    }
}

/// Serialize a straight-line instruction sequence into a code array
pub fn encode_code(instructions: &[Instruction]) -> std::result::Result<Vec<u8>, Error> {
    let mut code = Vec::with_capacity(instructions.iter().map(Instruction::width).sum());
    for instruction in instructions {
        instruction.serialize(&mut code)?;
    }
    if code.len() > u16::MAX as usize {
        return Err(Error::MethodCodeOverflow(code.len()));
    }
    Ok(code)
}

/// Largest operand stack depth reached by a straight-line sequence with no pops besides returns
pub fn max_stack(instructions: &[Instruction]) -> u16 {
    instructions.iter().map(Instruction::pushed_slots).sum()
}
