mod compare;
mod config;
mod cpu;
mod dtype;
mod error;
mod op;
mod ops;
mod shape;
mod storage;
mod strides;
mod tensor;
mod view;

pub use config::*;
pub use cpu::*;
pub use dtype::*;
pub use error::*;
pub use op::*;
pub use ops::*;
pub use shape::*;
pub use storage::*;
pub use strides::*;
pub use tensor::*;
pub use view::*;

use smallvec::SmallVec;
pub type RVec<T> = SmallVec<[T; 4]>;

//https://github.com/sonos/tract/blob/main/data/src/macros.rs#L2
#[macro_export]
macro_rules! rvec {
    (@one $x:expr) => (1usize);
    ($elem:expr; $n:expr) => ({
        $crate::RVec::from_elem($elem, $n)
    });
    ($($x:expr),*$(,)*) => ({
        let count = 0usize $(+ rvec![@one $x])*;
        #[allow(unused_mut)]
        let mut vec = $crate::RVec::new();
        if count <= vec.inline_size() {
            $(vec.push($x);)*
            vec
        } else {
            $crate::RVec::from_vec(vec![$($x,)*])
        }
    });
}

#[macro_export]
macro_rules! shape {
    ($($x:expr),*$(,)*) => ({
        use $crate::rvec;
        $crate::Shape::new(rvec![$($x,)*])
    });
}

/// Builds a slice list for [`Tensor::slice`].
///
/// Every argument goes through `SliceArg::from`, so integers select a single
/// index, Rust ranges select a unit-step range and [`NEW_AXIS`] inserts an axis:
///
/// ```ignore
/// let v = a.slice(&s![1..3, SliceArg::from(..).step_by(-1), NEW_AXIS])?;
/// ```
#[macro_export]
macro_rules! s {
    ($($x:expr),*$(,)*) => ([$($crate::SliceArg::from($x),)*]);
}

pub mod prelude {
    pub use crate::{
        rvec, s, shape, ArrayError, Bound, CopyPolicy, ErrorKind, Lane, LaneMut, Shape, SliceArg,
        Tensor, TensorDType, Tolerance, NEW_AXIS,
    };
}
