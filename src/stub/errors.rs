use crate::dex::{DecodeError, EncodeError, InstructionError};
use crate::jar::ConversionError;
use std::fmt::{Display, Error as FmtError, Formatter};

#[derive(Debug)]
pub enum Error {
    /// Method whose return type has no stub shape
    UnsupportedReturnType {
        class: String,
        method: String,
        descriptor: String,
    },

    /// Method with more parameter registers than a body can declare
    TooManyParameters { method: String, registers: u32 },

    /// Stub could not be encoded as a method body
    StubEncoding {
        method: String,
        reason: InstructionError,
    },

    CodecDecode(DecodeError),
    CodecEncode(EncodeError),
    Conversion(ConversionError),

    /// Reading the input or writing outputs
    Io(std::io::Error),
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Error {
        Error::CodecDecode(err)
    }
}

impl From<EncodeError> for Error {
    fn from(err: EncodeError) -> Error {
        Error::CodecEncode(err)
    }
}

impl From<ConversionError> for Error {
    fn from(err: ConversionError) -> Error {
        Error::Conversion(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Error::UnsupportedReturnType {
                class,
                method,
                descriptor,
            } => write!(
                f,
                "method {} in {} has unsupported return type '{}'",
                method, class, descriptor
            ),
            Error::TooManyParameters { method, registers } => write!(
                f,
                "method {} needs {} parameter registers",
                method, registers
            ),
            Error::StubEncoding { method, reason } => {
                write!(f, "cannot encode stub for {}: {}", method, reason)
            }
            Error::CodecDecode(err) => write!(f, "failed to decode container: {}", err),
            Error::CodecEncode(err) => write!(f, "failed to encode container: {}", err),
            Error::Conversion(err) => write!(f, "failed to convert container: {}", err),
            Error::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::CodecDecode(err) => Some(err),
            Error::CodecEncode(err) => Some(err),
            Error::Conversion(err) => Some(err),
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}
