use crate::dex::Register;
use crate::stub::StubShape;

/// Most argument registers (receiver included) a method can declare
pub const MAX_ARGUMENT_REGISTERS: u32 = 255;

/// Register file layout of a stub body
///
/// The receiver (if any) and parameters come first, followed by whatever the stub needs for the
/// value it returns. The total is the exact number of registers the body has to declare.
///
/// This numbering is not the one Dalvik uses: in a method frame the incoming arguments sit in the
/// highest registers. [`RegisterPlan::physical`] translates between the two.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct RegisterPlan {
    /// 1 for instance methods (the implicit `this`), 0 for static methods
    pub receiver: u16,

    /// Registers used to hold the returned constant
    pub shape_overhead: u16,

    /// Registers taken up by parameters (wide parameters count twice)
    pub parameters: u16,
}

impl RegisterPlan {
    pub fn new(shape: StubShape, is_static: bool, parameter_registers: u8) -> RegisterPlan {
        RegisterPlan {
            receiver: if is_static { 0 } else { 1 },
            shape_overhead: shape.overhead(),
            parameters: u16::from(parameter_registers),
        }
    }

    pub fn total(&self) -> u16 {
        self.receiver + self.shape_overhead + self.parameters
    }

    /// Registers holding incoming arguments
    pub fn ins(&self) -> u16 {
        self.receiver + self.parameters
    }

    /// First register past the receiver and parameters
    pub fn scratch_register(&self) -> Register {
        Register(self.receiver + self.parameters)
    }

    /// Register in the method frame
    ///
    /// Arguments move up past the returned value, which lands in `v0`.
    pub fn physical(&self, register: Register) -> Register {
        let ins = self.ins();
        if register.0 < ins {
            Register(register.0 + self.shape_overhead)
        } else {
            Register(register.0 - ins)
        }
    }
}
