//! Converting a (stubbed) DEX container into a JAR
//!
//! Each class definition becomes one class file. The conversion only understands the bodies the
//! stubber produces: a constant load followed by a return.

mod annotations;
mod archive;
mod body;
mod class_translator;
mod converter;
mod errors;

pub use annotations::SystemAnnotations;
pub use archive::*;
pub use body::translate_body;
pub use class_translator::*;
pub use converter::*;
pub use errors::*;
