use crate::dex::InstructionError;
use std::fmt::{Display, Error as FmtError, Formatter};

/// Ways decoding a DEX file can fail
#[derive(Debug)]
pub enum DecodeError {
    /// Reading ran off the end of the data, or a variable-length value was malformed
    IoError(std::io::Error),

    /// First bytes are not `dex\n`
    BadMagic([u8; 8]),

    UnsupportedVersion(String),

    /// Only little-endian files are supported
    BadEndianTag(u32),

    /// Header claims more bytes than there are
    FileSizeMismatch { header: u32, actual: usize },

    ChecksumMismatch { expected: u32, actual: u32 },

    /// Index into one of the id tables is out of range
    IndexOutOfRange { table: &'static str, index: u32 },

    MalformedString { offset: u32, reason: String },

    /// Encoded value has an unknown type or an invalid size
    MalformedValue { value_type: u8, value_arg: u8 },

    /// Access flags with bits that have no meaning for that kind of item
    UnknownAccessFlags { item: String, flags: u32 },

    /// Anything else that does not match the format
    Malformed(String),
}

/// Ways encoding a DEX file can fail
#[derive(Debug)]
pub enum EncodeError {
    IoError(std::io::Error),

    /// Descriptor that has no shorty form (and so cannot be part of a prototype)
    MalformedDescriptor(String),

    /// Too many entries in an id table for the width of the indices pointing into it
    TooManyItems { table: &'static str, count: usize },

    /// Method body refers to the original file's index tables or has try blocks
    UnsupportedBody {
        method: String,
        reason: InstructionError,
    },

    /// Method body with try blocks, which are not carried by the model
    TryBlocks { method: String },

    /// Class extends or implements itself through classes in the same file
    CyclicHierarchy(String),
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> DecodeError {
        DecodeError::IoError(err)
    }
}

impl From<std::io::Error> for EncodeError {
    fn from(err: std::io::Error) -> EncodeError {
        EncodeError::IoError(err)
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            DecodeError::IoError(err) => write!(f, "truncated or unreadable data: {}", err),
            DecodeError::BadMagic(magic) => write!(f, "not a DEX file (magic {:02x?})", magic),
            DecodeError::UnsupportedVersion(version) => {
                write!(f, "unsupported DEX version '{}'", version)
            }
            DecodeError::BadEndianTag(tag) => write!(f, "unsupported endian tag {:#010x}", tag),
            DecodeError::FileSizeMismatch { header, actual } => write!(
                f,
                "header declares {} bytes but only {} are available",
                header, actual
            ),
            DecodeError::ChecksumMismatch { expected, actual } => write!(
                f,
                "checksum mismatch (header {:#010x}, computed {:#010x})",
                expected, actual
            ),
            DecodeError::IndexOutOfRange { table, index } => {
                write!(f, "index {} out of range for {} table", index, table)
            }
            DecodeError::MalformedString { offset, reason } => {
                write!(f, "malformed string data at {:#x}: {}", offset, reason)
            }
            DecodeError::MalformedValue {
                value_type,
                value_arg,
            } => write!(
                f,
                "malformed encoded value (type {:#04x}, arg {})",
                value_type, value_arg
            ),
            DecodeError::UnknownAccessFlags { item, flags } => {
                write!(f, "unknown access flags {:#x} on {}", flags, item)
            }
            DecodeError::Malformed(msg) => f.write_str(msg),
        }
    }
}

impl Display for EncodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            EncodeError::IoError(err) => write!(f, "I/O error: {}", err),
            EncodeError::MalformedDescriptor(descriptor) => {
                write!(f, "malformed type descriptor '{}'", descriptor)
            }
            EncodeError::TooManyItems { table, count } => {
                write!(f, "{} entries do not fit in the {} table", count, table)
            }
            EncodeError::UnsupportedBody { method, reason } => {
                write!(f, "cannot encode body of {}: {}", method, reason)
            }
            EncodeError::TryBlocks { method } => {
                write!(f, "cannot encode body of {}: it has try blocks", method)
            }
            EncodeError::CyclicHierarchy(class) => {
                write!(f, "class hierarchy of {} is cyclic", class)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl std::error::Error for EncodeError {}
