//! Write JVM class files
//!
//! This only covers the subset of the class file format needed to express classes whose method
//! bodies load a constant and return it: there are no branches, so no stack map frames are ever
//! needed (the classes target Java 8, where frames are only required at branch targets).
//!
//! Building a class goes through a [`class_file::ConstantsPool`]: every name, descriptor, and
//! constant is interned there first, and the rest of the class file refers to it by index.

mod access_flags;
mod bytecode;
pub mod class_file;
mod errors;

pub use access_flags::*;
pub use bytecode::*;
pub use class_file::Version;
pub use errors::*;
