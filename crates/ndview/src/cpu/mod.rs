mod assign;
mod binary;
mod dispatch;
mod map;
mod reduce;

pub use dispatch::*;
pub use map::*;
