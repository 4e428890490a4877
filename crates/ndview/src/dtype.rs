use half::{bf16, f16};
use num_traits::{NumCast, NumOps, One, ToPrimitive, Zero};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Hash)]
pub enum DType {
    F16,
    BF16,
    #[default]
    F32,
    F64,
    I32,
    I64,
    U32,
    U8,
}

impl DType {
    /// Returns the size of the type in bytes.
    pub fn size_of(self) -> usize {
        match self {
            DType::U8 => 1,
            DType::F16 | DType::BF16 => 2,
            DType::F32 | DType::I32 | DType::U32 => 4,
            DType::F64 | DType::I64 => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, DType::F16 | DType::BF16 | DType::F32 | DType::F64)
    }
}

/// Absolute and relative tolerance used when comparing floating point values.
///
/// Two values `x` and `y` are close when `|x - y| < abs` or
/// `2|x - y| / (|x| + |y|) < rel`. Integer types ignore the tolerance.
#[derive(derive_new::new, Debug, Clone, Copy, PartialEq, Default)]
pub struct Tolerance {
    pub abs: f64,
    pub rel: f64,
}

impl Tolerance {
    pub const fn exact() -> Self {
        Self { abs: 0.0, rel: 0.0 }
    }

    pub fn is_close(&self, x: f64, y: f64) -> bool {
        if x == y {
            return true;
        }
        let diff = (x - y).abs();
        diff < self.abs || 2.0 * diff / (x.abs() + y.abs()) < self.rel
    }
}

/// Element types a [`Tensor`](crate::Tensor) can hold.
///
/// Operator selection happens through this bound at compile time; every
/// kernel is monomorphised per element type.
pub trait TensorDType:
    Copy
    + std::fmt::Debug
    + std::fmt::Display
    + PartialEq
    + PartialOrd
    + 'static
    + Zero
    + One
    + NumOps
    + NumCast
    + Send
    + Sync
    + bytemuck::Pod
{
    fn dt() -> DType;

    /// Whether `self` and `other` compare equal under `tol`.
    fn is_close(self, other: Self, tol: &Tolerance) -> bool;

    fn as_f64(self) -> f64 {
        ToPrimitive::to_f64(&self).unwrap_or(f64::NAN)
    }
}

macro_rules! map_int_type {
    ($t:ty, $v:ident) => {
        impl TensorDType for $t {
            fn dt() -> DType {
                DType::$v
            }

            fn is_close(self, other: Self, _tol: &Tolerance) -> bool {
                self == other
            }
        }
    };
}

macro_rules! map_float_type {
    ($t:ty, $v:ident) => {
        impl TensorDType for $t {
            fn dt() -> DType {
                DType::$v
            }

            fn is_close(self, other: Self, tol: &Tolerance) -> bool {
                tol.is_close(self.as_f64(), other.as_f64())
            }
        }
    };
}

map_float_type!(f32, F32);
map_float_type!(f64, F64);
map_float_type!(f16, F16);
map_float_type!(bf16, BF16);
map_int_type!(i32, I32);
map_int_type!(i64, I64);
map_int_type!(u32, U32);
map_int_type!(u8, U8);
