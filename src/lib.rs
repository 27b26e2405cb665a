//! Replace every method body in a DEX file with a minimal stub, and package the stubbed classes
//! as a JAR.
//!
//! The work is split into:
//!
//!   - [`stub`]: classifying return types, building stub bodies, rewriting a whole file
//!   - [`dex`]: decoding and encoding DEX containers
//!   - [`jar`]: converting a stubbed container into a JAR of class files
//!   - [`jvm`]: the class file format used by that conversion

pub mod dex;
pub mod jar;
pub mod jvm;
pub mod stub;
pub mod util;
