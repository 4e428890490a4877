mod broadcast;
mod index_select;
mod permute;
mod reshape;
mod slice;

pub use broadcast::*;
pub use index_select::*;
pub use permute::*;
pub use reshape::*;
pub use slice::*;
