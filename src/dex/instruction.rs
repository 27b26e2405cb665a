use std::fmt::{Display, Error as FmtError, Formatter};

/// Register in a method's register file (`vN`)
#[derive(Copy, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub struct Register(pub u16);

impl Display for Register {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "v{}", self.0)
    }
}

/// Dalvik instructions that carry no constant-pool references
///
/// This is the subset needed to express (and re-read) stub bodies. Since none of these refer to
/// strings, types, fields, or methods, their encoding does not depend on the index tables of the
/// container they end up in.
///
/// [0]: https://source.android.com/docs/core/runtime/dalvik-bytecode
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Instruction {
    /// `return-void` (format 10x)
    ReturnVoid,

    /// `return vAA` (format 11x)
    Return(Register),

    /// `return-wide vAA` (format 11x), returns the pair `vAA`, `vAA+1`
    ReturnWide(Register),

    /// `return-object vAA` (format 11x)
    ReturnObject(Register),

    /// `const/4 vA, #+B` (format 11n), 4-bit register and 4-bit signed literal
    Const4(Register, i8),

    /// `const/16 vAA, #+BBBB` (format 21s)
    Const16(Register, i16),

    /// `const-wide/16 vAA, #+BBBB` (format 21s), writes the pair `vAA`, `vAA+1`
    ConstWide16(Register, i16),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum InstructionError {
    /// Register does not fit in the instruction's register field
    RegisterOutOfRange {
        mnemonic: &'static str,
        register: Register,
    },

    /// Literal does not fit in the instruction's literal field
    LiteralOutOfRange { mnemonic: &'static str, value: i64 },

    /// Opcode outside of the supported subset
    UnsupportedOpcode { opcode: u8, offset: usize },

    /// Code units ended in the middle of an instruction
    Truncated { offset: usize },
}

impl Display for InstructionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            InstructionError::RegisterOutOfRange { mnemonic, register } => {
                write!(f, "register {} does not fit in `{}`", register, mnemonic)
            }
            InstructionError::LiteralOutOfRange { mnemonic, value } => {
                write!(f, "literal {} does not fit in `{}`", value, mnemonic)
            }
            InstructionError::UnsupportedOpcode { opcode, offset } => {
                write!(f, "unsupported opcode {:#04x} at code unit {}", opcode, offset)
            }
            InstructionError::Truncated { offset } => {
                write!(f, "instruction truncated at code unit {}", offset)
            }
        }
    }
}

impl std::error::Error for InstructionError {}

impl Instruction {
    pub fn opcode(&self) -> u8 {
        match self {
            Instruction::ReturnVoid => 0x0e,
            Instruction::Return(_) => 0x0f,
            Instruction::ReturnWide(_) => 0x10,
            Instruction::ReturnObject(_) => 0x11,
            Instruction::Const4(_, _) => 0x12,
            Instruction::Const16(_, _) => 0x13,
            Instruction::ConstWide16(_, _) => 0x16,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::ReturnVoid => "return-void",
            Instruction::Return(_) => "return",
            Instruction::ReturnWide(_) => "return-wide",
            Instruction::ReturnObject(_) => "return-object",
            Instruction::Const4(_, _) => "const/4",
            Instruction::Const16(_, _) => "const/16",
            Instruction::ConstWide16(_, _) => "const-wide/16",
        }
    }

    /// Size of the encoded instruction in 16-bit code units
    pub fn code_units(&self) -> usize {
        match self {
            Instruction::ReturnVoid
            | Instruction::Return(_)
            | Instruction::ReturnWide(_)
            | Instruction::ReturnObject(_)
            | Instruction::Const4(_, _) => 1,
            Instruction::Const16(_, _) | Instruction::ConstWide16(_, _) => 2,
        }
    }

    /// Register operand, if any
    pub fn register(&self) -> Option<Register> {
        match self {
            Instruction::ReturnVoid => None,
            Instruction::Return(reg)
            | Instruction::ReturnWide(reg)
            | Instruction::ReturnObject(reg)
            | Instruction::Const4(reg, _)
            | Instruction::Const16(reg, _)
            | Instruction::ConstWide16(reg, _) => Some(*reg),
        }
    }

    /// Number of consecutive registers touched starting at [`Self::register`]
    pub fn register_width(&self) -> u16 {
        match self {
            Instruction::ReturnVoid => 0,
            Instruction::ReturnWide(_) | Instruction::ConstWide16(_, _) => 2,
            _ => 1,
        }
    }

    /// Highest register index read or written by the instruction
    pub fn highest_register(&self) -> Option<u32> {
        self.register()
            .map(|Register(reg)| reg as u32 + self.register_width() as u32 - 1)
    }

    /// Append the encoded instruction to `out`
    pub fn encode_to(&self, out: &mut Vec<u16>) -> Result<(), InstructionError> {
        let opcode = self.opcode() as u16;
        match *self {
            Instruction::ReturnVoid => out.push(opcode),
            Instruction::Return(reg)
            | Instruction::ReturnWide(reg)
            | Instruction::ReturnObject(reg) => {
                out.push(self.register_aa(reg)? << 8 | opcode);
            }
            Instruction::Const4(reg, value) => {
                if reg.0 > 0x0F {
                    return Err(InstructionError::RegisterOutOfRange {
                        mnemonic: self.mnemonic(),
                        register: reg,
                    });
                }
                if !(-8..=7).contains(&value) {
                    return Err(InstructionError::LiteralOutOfRange {
                        mnemonic: self.mnemonic(),
                        value: value as i64,
                    });
                }
                out.push(((value as u16) & 0x0F) << 12 | reg.0 << 8 | opcode);
            }
            Instruction::Const16(reg, value) | Instruction::ConstWide16(reg, value) => {
                out.push(self.register_aa(reg)? << 8 | opcode);
                out.push(value as u16);
            }
        }
        Ok(())
    }

    /// Check that a register fits in an 8-bit `vAA` field
    fn register_aa(&self, reg: Register) -> Result<u16, InstructionError> {
        if reg.0 > 0xFF {
            Err(InstructionError::RegisterOutOfRange {
                mnemonic: self.mnemonic(),
                register: reg,
            })
        } else {
            Ok(reg.0)
        }
    }

    /// Decode one instruction starting at `offset`, returning it along with its size
    pub fn decode(units: &[u16], offset: usize) -> Result<(Instruction, usize), InstructionError> {
        let first = *units
            .get(offset)
            .ok_or(InstructionError::Truncated { offset })?;
        let opcode = (first & 0xFF) as u8;
        let aa = Register(first >> 8);
        let second = || {
            units
                .get(offset + 1)
                .copied()
                .ok_or(InstructionError::Truncated { offset })
        };

        let insn = match opcode {
            0x0e => Instruction::ReturnVoid,
            0x0f => Instruction::Return(aa),
            0x10 => Instruction::ReturnWide(aa),
            0x11 => Instruction::ReturnObject(aa),
            0x12 => {
                let reg = Register(first >> 8 & 0x0F);
                // sign-extend the high nibble
                let value = ((first >> 8) as u8 as i8) >> 4;
                Instruction::Const4(reg, value)
            }
            0x13 => Instruction::Const16(aa, second()? as i16),
            0x16 => Instruction::ConstWide16(aa, second()? as i16),
            _ => return Err(InstructionError::UnsupportedOpcode { opcode, offset }),
        };
        let size = insn.code_units();
        Ok((insn, size))
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Instruction::ReturnVoid => f.write_str(self.mnemonic()),
            Instruction::Return(reg)
            | Instruction::ReturnWide(reg)
            | Instruction::ReturnObject(reg) => write!(f, "{} {}", self.mnemonic(), reg),
            Instruction::Const4(reg, value) => write!(f, "{} {}, #{}", self.mnemonic(), reg, value),
            Instruction::Const16(reg, value) | Instruction::ConstWide16(reg, value) => {
                write!(f, "{} {}, #{}", self.mnemonic(), reg, value)
            }
        }
    }
}

/// Encode a sequence of instructions into code units
pub fn encode_instructions(instructions: &[Instruction]) -> Result<Vec<u16>, InstructionError> {
    let mut units = Vec::with_capacity(instructions.iter().map(Instruction::code_units).sum());
    for insn in instructions {
        insn.encode_to(&mut units)?;
    }
    Ok(units)
}

/// Decode code units into instructions, failing on anything outside the supported subset
pub fn decode_instructions(units: &[u16]) -> Result<Vec<Instruction>, InstructionError> {
    let mut instructions = vec![];
    let mut offset = 0;
    while offset < units.len() {
        let (insn, size) = Instruction::decode(units, offset)?;
        instructions.push(insn);
        offset += size;
    }
    Ok(instructions)
}
