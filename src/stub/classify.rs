use crate::dex::TypeDescriptor;
use std::fmt::{Display, Error as FmtError, Formatter};

/// Kind of minimal body a method needs, based only on its return type
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum StubShape {
    /// `return-void`
    VoidReturn,

    /// Load a 32-bit zero and return it (`boolean`, `byte`, `short`, `char`, `float`, `int`)
    ZeroPrimitive,

    /// Load a 64-bit zero into a register pair and return it (`long`, `double`)
    ZeroWidePrimitive,

    /// Load `null` and return it (objects and arrays)
    NullReference,
}

impl StubShape {
    pub const ALL: [StubShape; 4] = [
        StubShape::VoidReturn,
        StubShape::ZeroPrimitive,
        StubShape::ZeroWidePrimitive,
        StubShape::NullReference,
    ];

    /// Registers needed for the constant being returned
    pub fn overhead(&self) -> u16 {
        match self {
            StubShape::VoidReturn => 0,
            StubShape::ZeroPrimitive | StubShape::NullReference => 1,
            StubShape::ZeroWidePrimitive => 2,
        }
    }
}

/// Return type that is neither `V`, a primitive, an object, nor an array
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct UnsupportedReturnType {
    pub descriptor: String,
}

impl Display for UnsupportedReturnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "unsupported return type '{}'", self.descriptor)
    }
}

impl std::error::Error for UnsupportedReturnType {}

/// Pick the stub shape for a return type
///
/// There is deliberately no fallback shape: anything outside of the four descriptor classes is
/// an error.
pub fn classify(return_type: &TypeDescriptor) -> Result<StubShape, UnsupportedReturnType> {
    match return_type.shorty() {
        Some('V') => Ok(StubShape::VoidReturn),
        Some('Z' | 'B' | 'S' | 'C' | 'F' | 'I') => Ok(StubShape::ZeroPrimitive),
        Some('J' | 'D') => Ok(StubShape::ZeroWidePrimitive),
        Some('L') => Ok(StubShape::NullReference),
        _ => Err(UnsupportedReturnType {
            descriptor: return_type.as_str().to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_str(descriptor: &str) -> Result<StubShape, UnsupportedReturnType> {
        classify(&TypeDescriptor::from(descriptor))
    }

    #[test]
    fn every_valid_descriptor_has_a_shape() {
        assert_eq!(classify_str("V"), Ok(StubShape::VoidReturn));
        for primitive in ["Z", "B", "S", "C", "F", "I"] {
            assert_eq!(classify_str(primitive), Ok(StubShape::ZeroPrimitive));
        }
        for wide in ["J", "D"] {
            assert_eq!(classify_str(wide), Ok(StubShape::ZeroWidePrimitive));
        }
        for reference in [
            "Ljava/lang/Object;",
            "Lcom/example/Outer$Inner;",
            "L;",
            "[I",
            "[[J",
            "[Ljava/lang/String;",
            "[",
        ] {
            assert_eq!(classify_str(reference), Ok(StubShape::NullReference));
        }
    }

    #[test]
    fn malformed_descriptors_are_rejected() {
        for descriptor in ["", "X", "II", "VV", "Ljava/lang/Object", "L", "java/lang/Object;"] {
            assert_eq!(
                classify_str(descriptor),
                Err(UnsupportedReturnType {
                    descriptor: descriptor.to_owned()
                })
            );
        }
    }

    #[test]
    fn overhead_matches_value_width() {
        assert_eq!(StubShape::VoidReturn.overhead(), 0);
        assert_eq!(StubShape::ZeroPrimitive.overhead(), 1);
        assert_eq!(StubShape::ZeroWidePrimitive.overhead(), 2);
        assert_eq!(StubShape::NullReference.overhead(), 1);
    }
}
