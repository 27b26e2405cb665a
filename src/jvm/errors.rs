use crate::jvm::class_file::{Constant, ConstantPoolOverflow};
use std::fmt::{Display, Error as FmtError, Formatter};

#[derive(Debug)]
pub enum Error {
    ConstantPoolOverflow { constant: Constant, offset: u16 },
    IoError(std::io::Error),

    /// Code array is longer than the 65535 bytes a method may have
    MethodCodeOverflow(usize),
}

impl From<ConstantPoolOverflow> for Error {
    fn from(overflow: ConstantPoolOverflow) -> Error {
        Error::ConstantPoolOverflow {
            constant: overflow.constant,
            offset: overflow.offset,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::IoError(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Error::ConstantPoolOverflow { constant, offset } => write!(
                f,
                "constant pool is full (adding {:?} at offset {})",
                constant, offset
            ),
            Error::IoError(err) => write!(f, "I/O error: {}", err),
            Error::MethodCodeOverflow(len) => {
                write!(f, "method code is {} bytes long", len)
            }
        }
    }
}

impl std::error::Error for Error {}
