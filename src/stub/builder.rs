use crate::dex::{Instruction, InstructionError, MethodImplementation, Register};
use crate::stub::{RegisterPlan, StubShape};

/// Synthesized method body
///
/// Never has try blocks or debug information. Instructions are numbered as in the
/// [`RegisterPlan`]; they are moved into the method frame when encoded.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct StubBody {
    pub plan: RegisterPlan,
    pub instructions: Vec<Instruction>,
}

impl StubBody {
    pub fn register_count(&self) -> u16 {
        self.plan.total()
    }

    /// Registers holding incoming arguments (the receiver and parameters)
    pub fn ins_size(&self) -> u16 {
        self.plan.ins()
    }

    /// Instructions renumbered into the method frame, where arguments take the last registers
    pub fn frame_instructions(&self) -> Vec<Instruction> {
        let physical = |register| self.plan.physical(register);
        self.instructions
            .iter()
            .map(|instruction| match *instruction {
                Instruction::ReturnVoid => Instruction::ReturnVoid,
                Instruction::Return(register) => Instruction::Return(physical(register)),
                Instruction::ReturnWide(register) => Instruction::ReturnWide(physical(register)),
                Instruction::ReturnObject(register) => {
                    Instruction::ReturnObject(physical(register))
                }
                Instruction::Const4(register, value) => {
                    load_literal(physical(register), i16::from(value))
                }
                Instruction::Const16(register, value) => load_literal(physical(register), value),
                Instruction::ConstWide16(register, value) => {
                    Instruction::ConstWide16(physical(register), value)
                }
            })
            .collect()
    }

    /// Encode into a body the container can hold
    pub fn into_implementation(self) -> Result<MethodImplementation, InstructionError> {
        MethodImplementation::from_instructions(
            self.register_count(),
            self.ins_size(),
            &self.frame_instructions(),
        )
    }
}

/// Build the smallest body satisfying a stub shape
///
/// `parameter_registers` counts wide parameters twice. The constant being returned goes in the
/// first register past the receiver and parameters.
pub fn build(shape: StubShape, is_static: bool, parameter_registers: u8) -> StubBody {
    let plan = RegisterPlan::new(shape, is_static, parameter_registers);
    let scratch = plan.scratch_register();
    let instructions = match shape {
        StubShape::VoidReturn => vec![Instruction::ReturnVoid],
        StubShape::ZeroPrimitive => vec![load_literal(scratch, 0), Instruction::Return(scratch)],
        StubShape::ZeroWidePrimitive => vec![
            Instruction::ConstWide16(scratch, 0),
            Instruction::ReturnWide(scratch),
        ],
        StubShape::NullReference => vec![
            load_literal(scratch, 0),
            Instruction::ReturnObject(scratch),
        ],
    };
    StubBody { plan, instructions }
}

/// `const/4` only has room for registers `v0` to `v15` and literals `-8` to `7`
fn load_literal(register: Register, value: i16) -> Instruction {
    match i8::try_from(value) {
        Ok(small) if register.0 <= 0x0F && (-8..=7).contains(&small) => {
            Instruction::Const4(register, small)
        }
        _ => Instruction::Const16(register, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dex::Instruction::*;

    #[test]
    fn static_void_without_parameters() {
        let body = build(StubShape::VoidReturn, true, 0);
        assert_eq!(body.instructions, vec![ReturnVoid]);
        assert_eq!(body.register_count(), 0);
    }

    #[test]
    fn instance_int_without_parameters() {
        let body = build(StubShape::ZeroPrimitive, false, 0);
        assert_eq!(
            body.instructions,
            vec![Const4(Register(1), 0), Return(Register(1))]
        );
        assert_eq!(body.register_count(), 2);
    }

    #[test]
    fn static_long_with_int_parameter() {
        let body = build(StubShape::ZeroWidePrimitive, true, 1);
        assert_eq!(
            body.instructions,
            vec![ConstWide16(Register(1), 0), ReturnWide(Register(1))]
        );
        assert_eq!(body.register_count(), 3);
    }

    #[test]
    fn instance_array_without_parameters() {
        let body = build(StubShape::NullReference, false, 0);
        assert_eq!(
            body.instructions,
            vec![Const4(Register(1), 0), ReturnObject(Register(1))]
        );
        assert_eq!(body.register_count(), 2);
    }

    #[test]
    fn registers_are_sufficient() {
        for shape in StubShape::ALL {
            for is_static in [true, false] {
                for parameters in 0..=u8::MAX {
                    let body = build(shape, is_static, parameters);
                    for insn in &body.instructions {
                        if let Some(highest) = insn.highest_register() {
                            assert!(
                                highest < body.register_count() as u32,
                                "{} exceeds {} registers ({:?}, static: {}, parameters: {})",
                                insn,
                                body.register_count(),
                                shape,
                                is_static,
                                parameters
                            );
                        }
                    }
                    assert!(body.ins_size() <= body.register_count());
                }
            }
        }
    }

    #[test]
    fn returned_value_stays_clear_of_arguments() {
        for shape in StubShape::ALL {
            for is_static in [true, false] {
                for parameters in 0..=u8::MAX {
                    let body = build(shape, is_static, parameters);
                    let first_argument = (body.register_count() - body.ins_size()) as u32;
                    for insn in body.frame_instructions() {
                        if let Some(highest) = insn.highest_register() {
                            assert!(
                                highest < first_argument,
                                "{} overwrites an argument ({:?}, static: {}, parameters: {})",
                                insn,
                                shape,
                                is_static,
                                parameters
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn frame_places_returned_value_first() {
        let body = build(StubShape::ZeroPrimitive, false, 0);
        assert_eq!(
            body.frame_instructions(),
            vec![Const4(Register(0), 0), Return(Register(0))]
        );

        let body = build(StubShape::ZeroWidePrimitive, true, 1);
        assert_eq!(
            body.frame_instructions(),
            vec![ConstWide16(Register(0), 0), ReturnWide(Register(0))]
        );

        let body = build(StubShape::NullReference, false, 2);
        assert_eq!(body.register_count(), 4);
        assert_eq!(body.ins_size(), 3);
        assert_eq!(
            body.frame_instructions(),
            vec![Const4(Register(0), 0), ReturnObject(Register(0))]
        );
    }

    #[test]
    fn bodies_are_encodable() {
        for shape in StubShape::ALL {
            for is_static in [true, false] {
                for parameters in [0, 1, 14, 15, 16, 200, 254, 255] {
                    let body = build(shape, is_static, parameters);
                    let expected = body.frame_instructions();
                    let implementation = body.into_implementation().unwrap();
                    assert_eq!(implementation.instructions().unwrap(), expected);
                }
            }
        }
    }

    #[test]
    fn high_scratch_register_uses_wider_constant() {
        let body = build(StubShape::ZeroPrimitive, false, 15);
        assert_eq!(
            body.instructions,
            vec![Const16(Register(16), 0), Return(Register(16))]
        );
        assert_eq!(
            body.frame_instructions(),
            vec![Const4(Register(0), 0), Return(Register(0))]
        );
    }
}
