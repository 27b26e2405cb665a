//! Replacing method bodies with stubs
//!
//! Every concrete method gets the smallest body that still satisfies its return type:
//!
//!   - [`classify`] maps the return type to a [`StubShape`]
//!   - [`build`] turns a shape into instructions and a register count (see [`RegisterPlan`])
//!   - [`rewrite_file`] applies that to every method of a decoded container
//!
//! [`Pipeline`] strings this together with a [`ContainerCodec`] and a [`FormatConverter`].

mod builder;
mod classify;
mod errors;
mod pipeline;
mod registers;
mod rewrite;
mod settings;

pub use builder::*;
pub use classify::*;
pub use errors::*;
pub use pipeline::*;
pub use registers::*;
pub use rewrite::*;
pub use settings::*;
