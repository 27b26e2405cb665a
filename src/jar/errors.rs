use crate::dex::{DecodeError, InstructionError};
use crate::jvm::class_file::ConstantPoolOverflow;
use std::fmt::{Display, Error as FmtError, Formatter};

#[derive(Debug)]
pub enum ConversionError {
    /// Converted container could not be read back
    Decode(DecodeError),

    /// Type descriptor that does not name a class (eg. a primitive as a superclass)
    InvalidClassName(String),

    /// Two class definitions for the same class
    DuplicateClass(String),

    /// Body uses instructions outside of the stub subset
    UnsupportedBody {
        method: String,
        reason: InstructionError,
    },

    /// Register is read without holding a constant of the right width
    UninitializedRegister { method: String, register: u16 },

    /// Return instruction does not agree with the declared return type
    ReturnMismatch {
        method: String,
        descriptor: String,
        instruction: &'static str,
    },

    /// Body falls off the end without returning
    MissingReturn { method: String },

    /// Instructions after the return
    UnreachableInstructions { method: String },

    /// Concrete method without a body
    MissingCode { method: String },

    ClassFile(crate::jvm::Error),
    Zip(zip::result::ZipError),
    IoError(std::io::Error),
}

impl From<DecodeError> for ConversionError {
    fn from(err: DecodeError) -> ConversionError {
        ConversionError::Decode(err)
    }
}

impl From<crate::jvm::Error> for ConversionError {
    fn from(err: crate::jvm::Error) -> ConversionError {
        ConversionError::ClassFile(err)
    }
}

impl From<ConstantPoolOverflow> for ConversionError {
    fn from(overflow: ConstantPoolOverflow) -> ConversionError {
        ConversionError::ClassFile(overflow.into())
    }
}

impl From<zip::result::ZipError> for ConversionError {
    fn from(err: zip::result::ZipError) -> ConversionError {
        ConversionError::Zip(err)
    }
}

impl From<std::io::Error> for ConversionError {
    fn from(err: std::io::Error) -> ConversionError {
        ConversionError::IoError(err)
    }
}

impl Display for ConversionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            ConversionError::Decode(err) => write!(f, "cannot read container: {}", err),
            ConversionError::InvalidClassName(descriptor) => {
                write!(f, "'{}' is not a class type", descriptor)
            }
            ConversionError::DuplicateClass(name) => write!(f, "class {} is defined twice", name),
            ConversionError::UnsupportedBody { method, reason } => {
                write!(f, "cannot convert body of {}: {}", method, reason)
            }
            ConversionError::UninitializedRegister { method, register } => write!(
                f,
                "{} returns v{} which holds no constant of the right width",
                method, register
            ),
            ConversionError::ReturnMismatch {
                method,
                descriptor,
                instruction,
            } => write!(
                f,
                "{} uses {} but is declared to return {}",
                method, instruction, descriptor
            ),
            ConversionError::MissingReturn { method } => {
                write!(f, "{} does not end with a return", method)
            }
            ConversionError::UnreachableInstructions { method } => {
                write!(f, "{} has instructions after its return", method)
            }
            ConversionError::MissingCode { method } => {
                write!(f, "{} is neither abstract nor native but has no code", method)
            }
            ConversionError::ClassFile(err) => write!(f, "class file error: {}", err),
            ConversionError::Zip(err) => write!(f, "ZIP error: {}", err),
            ConversionError::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for ConversionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConversionError::Decode(err) => Some(err),
            ConversionError::UnsupportedBody { reason, .. } => Some(reason),
            ConversionError::ClassFile(err) => Some(err),
            ConversionError::Zip(err) => Some(err),
            ConversionError::IoError(err) => Some(err),
            _ => None,
        }
    }
}
