mod leb128;
mod mutf8;

pub use leb128::*;
pub use mutf8::*;
