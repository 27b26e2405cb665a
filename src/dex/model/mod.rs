//! In-memory model of a DEX file
//!
//! The model is fully resolved: wherever the binary format stores an index into one of its id
//! tables, the model holds the value itself (a string, a [`TypeDescriptor`], a [`FieldRef`], ...).
//! This means a model can be freely rewritten and then re-encoded without worrying about index
//! bookkeeping, which is all handled by the writer.
//!
//!   - __File__ is represented using [`DexFile`]
//!   - __Class__ is represented using [`ClassDef`]
//!   - __Method__ is represented using [`Method`] (body in [`MethodImplementation`])
//!   - __Field__ is represented using [`Field`]
//!
//! [`TypeDescriptor`]: crate::dex::TypeDescriptor

mod annotation;
mod class;
mod field;
mod method;
mod references;
mod value;

pub use annotation::*;
pub use class::*;
pub use field::*;
pub use method::*;
pub use references::*;
pub use value::*;

use std::fmt::{Display, Error as FmtError, Formatter};

/// Format version from the file magic (`dex\n035\0` is version 35)
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct DexVersion(pub u16);

impl DexVersion {
    pub const V035: DexVersion = DexVersion(35);

    /// First version with method handles and call sites
    pub const V038: DexVersion = DexVersion(38);

    pub const V039: DexVersion = DexVersion(39);
}

impl Default for DexVersion {
    fn default() -> DexVersion {
        DexVersion::V035
    }
}

impl Display for DexVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "{:03}", self.0)
    }
}

/// Contents of a whole DEX file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DexFile {
    pub version: DexVersion,
    pub classes: Vec<ClassDef>,
}

impl DexFile {
    pub fn new(classes: Vec<ClassDef>) -> DexFile {
        DexFile {
            version: DexVersion::default(),
            classes,
        }
    }

    /// Find a class by its descriptor
    pub fn class(&self, descriptor: &str) -> Option<&ClassDef> {
        self.classes
            .iter()
            .find(|class| class.class.as_str() == descriptor)
    }
}
