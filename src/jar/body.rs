use crate::dex::{Instruction as DexInstruction, Method, Register};
use crate::jar::ConversionError;
use crate::jvm::class_file::{BytecodeArray, Code, ConstantsPool};
use crate::jvm::{encode_code, max_stack, Instruction};
use std::collections::HashMap;

/// What a register is known to hold while walking a stub body
#[derive(Copy, Clone, Debug, PartialEq)]
enum RegisterValue {
    /// 32-bit constant (the bits are untyped, as in Dalvik)
    Narrow(i32),

    /// Low half of a 64-bit constant, the high half being the next register
    WideLow(i64),

    WideHigh,
}

/// Translate a stub body into a JVM `Code` attribute
///
/// The body must be a straight line of constant loads ending in a return. The constant the
/// returned register holds is re-expressed as the smallest JVM push for the method's declared
/// return type.
pub fn translate_body(method: &Method, pool: &mut ConstantsPool) -> Result<Code, ConversionError> {
    let implementation = match &method.implementation {
        Some(implementation) => implementation,
        None => {
            return Err(ConversionError::MissingCode {
                method: method.to_string(),
            })
        }
    };
    let instructions =
        implementation
            .instructions()
            .map_err(|reason| ConversionError::UnsupportedBody {
                method: method.to_string(),
                reason,
            })?;

    let mut registers: HashMap<u16, RegisterValue> = HashMap::new();
    let mut code: Option<Vec<Instruction>> = None;
    for instruction in instructions {
        if code.is_some() {
            return Err(ConversionError::UnreachableInstructions {
                method: method.to_string(),
            });
        }
        match instruction {
            DexInstruction::Const4(Register(reg), value) => {
                store(&mut registers, reg, RegisterValue::Narrow(value as i32))
            }
            DexInstruction::Const16(Register(reg), value) => {
                store(&mut registers, reg, RegisterValue::Narrow(value as i32))
            }
            DexInstruction::ConstWide16(Register(reg), value) => {
                store(&mut registers, reg, RegisterValue::WideLow(value as i64));
                store(&mut registers, reg + 1, RegisterValue::WideHigh);
            }
            DexInstruction::ReturnVoid
            | DexInstruction::Return(_)
            | DexInstruction::ReturnWide(_)
            | DexInstruction::ReturnObject(_) => {
                code = Some(translate_return(method, instruction, &registers, pool)?);
            }
        }
    }

    let code = code.ok_or_else(|| ConversionError::MissingReturn {
        method: method.to_string(),
    })?;
    let receiver = if method.is_static() { 0 } else { 1 };
    let parameters: u16 = method
        .prototype
        .parameters
        .iter()
        .map(|param| param.register_width())
        .sum();

    Ok(Code {
        max_stack: max_stack(&code),
        max_locals: receiver + parameters,
        code_array: BytecodeArray(encode_code(&code)?),
        attributes: vec![],
    })
}

/// Write a register, forgetting any wide value it was part of
fn store(registers: &mut HashMap<u16, RegisterValue>, reg: u16, value: RegisterValue) {
    match registers.insert(reg, value) {
        Some(RegisterValue::WideLow(_)) => {
            registers.remove(&(reg + 1));
        }
        Some(RegisterValue::WideHigh) if reg > 0 => {
            registers.remove(&(reg - 1));
        }
        _ => (),
    }
}

fn translate_return(
    method: &Method,
    instruction: DexInstruction,
    registers: &HashMap<u16, RegisterValue>,
    pool: &mut ConstantsPool,
) -> Result<Vec<Instruction>, ConversionError> {
    let return_type = &method.prototype.return_type;
    let mismatch = || ConversionError::ReturnMismatch {
        method: method.to_string(),
        descriptor: return_type.to_string(),
        instruction: instruction.mnemonic(),
    };
    let uninitialized = |Register(register): Register| ConversionError::UninitializedRegister {
        method: method.to_string(),
        register,
    };
    let narrow = |reg: Register| match registers.get(&reg.0) {
        Some(RegisterValue::Narrow(value)) => Ok(*value),
        _ => Err(uninitialized(reg)),
    };
    let wide = |reg: Register| match registers.get(&reg.0) {
        Some(RegisterValue::WideLow(value)) => Ok(*value),
        _ => Err(uninitialized(reg)),
    };

    let shorty = return_type.shorty().ok_or_else(mismatch)?;
    let code = match (instruction, shorty) {
        (DexInstruction::ReturnVoid, 'V') => vec![Instruction::Return],
        (DexInstruction::Return(reg), 'Z' | 'B' | 'S' | 'C' | 'I') => {
            vec![push_int(narrow(reg)?, pool)?, Instruction::IReturn]
        }
        (DexInstruction::Return(reg), 'F') => {
            let float = f32::from_bits(narrow(reg)? as u32);
            vec![push_float(float, pool)?, Instruction::FReturn]
        }
        (DexInstruction::ReturnWide(reg), 'J') => {
            vec![push_long(wide(reg)?, pool)?, Instruction::LReturn]
        }
        (DexInstruction::ReturnWide(reg), 'D') => {
            let double = f64::from_bits(wide(reg)? as u64);
            vec![push_double(double, pool)?, Instruction::DReturn]
        }

        // The only reference constant a stub can hold is `null`
        (DexInstruction::ReturnObject(reg), 'L') => match narrow(reg)? {
            0 => vec![Instruction::AConstNull, Instruction::AReturn],
            _ => return Err(mismatch()),
        },
        _ => return Err(mismatch()),
    };
    Ok(code)
}

fn push_int(value: i32, pool: &mut ConstantsPool) -> Result<Instruction, ConversionError> {
    match Instruction::push_small_int(value) {
        Some(instruction) => Ok(instruction),
        None => Ok(Instruction::Ldc(pool.get_integer(value)?)),
    }
}

fn push_float(value: f32, pool: &mut ConstantsPool) -> Result<Instruction, ConversionError> {
    Ok(match value.to_bits() {
        0x0000_0000 => Instruction::FConst0,
        0x3f80_0000 => Instruction::FConst1,
        0x4000_0000 => Instruction::FConst2,
        _ => Instruction::Ldc(pool.get_float(value)?),
    })
}

fn push_long(value: i64, pool: &mut ConstantsPool) -> Result<Instruction, ConversionError> {
    Ok(match value {
        0 => Instruction::LConst0,
        1 => Instruction::LConst1,
        _ => Instruction::Ldc2(pool.get_long(value)?),
    })
}

fn push_double(value: f64, pool: &mut ConstantsPool) -> Result<Instruction, ConversionError> {
    Ok(match value.to_bits() {
        0x0000_0000_0000_0000 => Instruction::DConst0,
        0x3ff0_0000_0000_0000 => Instruction::DConst1,
        _ => Instruction::Ldc2(pool.get_double(value)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dex::{MethodAccessFlags, MethodImplementation, Prototype, TypeDescriptor};
    use crate::stub::{build, classify};

    fn method(return_type: &str, parameters: &[&str], instructions: &[DexInstruction]) -> Method {
        let prototype = Prototype::new(
            TypeDescriptor::from(return_type),
            parameters.iter().map(|p| TypeDescriptor::from(*p)).collect(),
        );
        Method {
            class: TypeDescriptor::from("Lcom/example/Foo;"),
            name: String::from("foo"),
            prototype,
            access_flags: MethodAccessFlags::PUBLIC,
            annotations: vec![],
            parameter_annotations: vec![],
            implementation: Some(
                MethodImplementation::from_instructions(8, 0, instructions).unwrap(),
            ),
        }
    }

    fn stubbed(return_type: &str, parameters: &[&str]) -> Method {
        let mut stub = method(return_type, parameters, &[]);
        let shape = classify(&stub.prototype.return_type).unwrap();
        let registers = stub.prototype.parameter_registers() as u8;
        stub.implementation = Some(build(shape, false, registers).into_implementation().unwrap());
        stub
    }

    #[test]
    fn stubs_become_smallest_pushes() {
        let expectations: &[(&str, Vec<u8>, u16)] = &[
            ("V", vec![0xb1], 0),
            ("I", vec![0x03, 0xac], 1),
            ("Z", vec![0x03, 0xac], 1),
            ("F", vec![0x0b, 0xae], 1),
            ("J", vec![0x09, 0xad], 2),
            ("D", vec![0x0e, 0xaf], 2),
            ("Ljava/lang/String;", vec![0x01, 0xb0], 1),
            ("[I", vec![0x01, 0xb0], 1),
        ];
        for (return_type, bytes, stack) in expectations {
            let mut pool = ConstantsPool::new();
            let code = translate_body(&stubbed(return_type, &["J", "I"]), &mut pool).unwrap();
            assert_eq!(&code.code_array.0, bytes, "{}", return_type);
            assert_eq!(code.max_stack, *stack, "{}", return_type);
            assert_eq!(code.max_locals, 4, "{}", return_type);
            assert!(pool.is_empty());
        }
    }

    #[test]
    fn large_constants_go_through_the_pool() {
        let mut pool = ConstantsPool::new();
        let body = method(
            "I",
            &[],
            &[
                DexInstruction::Const16(Register(0), 1000),
                DexInstruction::Return(Register(0)),
            ],
        );
        let code = translate_body(&body, &mut pool).unwrap();
        assert_eq!(code.code_array.0, vec![0x11, 0x03, 0xe8, 0xac]);

        let body = method(
            "J",
            &[],
            &[
                DexInstruction::ConstWide16(Register(2), -7),
                DexInstruction::ReturnWide(Register(2)),
            ],
        );
        let code = translate_body(&body, &mut pool).unwrap();
        assert_eq!(code.code_array.0, vec![0x14, 0x00, 0x01, 0xad]);
    }

    #[test]
    fn return_must_match_descriptor() {
        let mut pool = ConstantsPool::new();
        let body = method(
            "J",
            &[],
            &[
                DexInstruction::Const4(Register(0), 0),
                DexInstruction::Return(Register(0)),
            ],
        );
        assert!(matches!(
            translate_body(&body, &mut pool),
            Err(ConversionError::ReturnMismatch { instruction: "return", .. })
        ));

        let body = method(
            "Ljava/lang/Object;",
            &[],
            &[
                DexInstruction::Const4(Register(0), 1),
                DexInstruction::ReturnObject(Register(0)),
            ],
        );
        assert!(matches!(
            translate_body(&body, &mut pool),
            Err(ConversionError::ReturnMismatch { .. })
        ));
    }

    #[test]
    fn overwritten_wide_pair_is_forgotten() {
        let mut pool = ConstantsPool::new();
        let body = method(
            "J",
            &[],
            &[
                DexInstruction::ConstWide16(Register(0), 0),
                DexInstruction::Const4(Register(1), 0),
                DexInstruction::ReturnWide(Register(0)),
            ],
        );
        assert!(matches!(
            translate_body(&body, &mut pool),
            Err(ConversionError::UninitializedRegister { register: 0, .. })
        ));
    }

    #[test]
    fn body_shape_errors() {
        let mut pool = ConstantsPool::new();
        let body = method("V", &[], &[DexInstruction::Const4(Register(0), 0)]);
        assert!(matches!(
            translate_body(&body, &mut pool),
            Err(ConversionError::MissingReturn { .. })
        ));

        let body = method(
            "V",
            &[],
            &[DexInstruction::ReturnVoid, DexInstruction::ReturnVoid],
        );
        assert!(matches!(
            translate_body(&body, &mut pool),
            Err(ConversionError::UnreachableInstructions { .. })
        ));

        let mut body = method("V", &[], &[]);
        body.implementation = None;
        assert!(matches!(
            translate_body(&body, &mut pool),
            Err(ConversionError::MissingCode { .. })
        ));

        let mut body = method("V", &[], &[]);
        if let Some(implementation) = body.implementation.as_mut() {
            implementation.insns = vec![0x106e, 0x0000, 0x0000];
        }
        assert!(matches!(
            translate_body(&body, &mut pool),
            Err(ConversionError::UnsupportedBody { .. })
        ));
    }
}
