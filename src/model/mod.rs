// Symbol model shared by the loader, processors and renderer

pub mod docstring;
pub mod reference;
pub mod symbol;

pub use docstring::*;
pub use reference::*;
pub use symbol::*;
