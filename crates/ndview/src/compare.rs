use crate::{broadcast_shape, ArrayError, RVec, SliceArg, Tensor, TensorDType, Tolerance};

impl<T: TensorDType> Tensor<T> {
    /// View with trailing unit axes indexed away.
    fn without_trailing_ones(&self) -> Result<Tensor<T>, ArrayError> {
        let keep = self.shape().trimmed_rank();
        let args: RVec<SliceArg> = (0..self.rank())
            .map(|axis| {
                if axis < keep {
                    SliceArg::full()
                } else {
                    SliceArg::Index(0)
                }
            })
            .collect();
        self.slice(&args)
    }

    /// Value equality under `tol`.
    ///
    /// Shapes are compared with trailing unit axes trimmed and need only be
    /// broadcast compatible; every element pair of the broadcast must then be
    /// close.
    pub fn values_eq(&self, other: &Tensor<T>, tol: &Tolerance) -> bool {
        let (lhs, rhs) = match (self.without_trailing_ones(), other.without_trailing_ones()) {
            (Ok(l), Ok(r)) => (l, r),
            _ => return false,
        };
        if broadcast_shape(lhs.shape(), rhs.shape()).is_err() {
            return false;
        }
        match lhs.zip_map(&rhs, |x, y| u8::from(x.is_close(y, tol))) {
            Ok(flags) => flags.fold(true, |all, f| all && f == 1),
            Err(_) => false,
        }
    }

    /// Like [`Tensor::values_eq`] but with matching shapes required, and a
    /// failure describing how far apart the values are.
    pub fn all_close(&self, other: &Self, tol: Tolerance) -> anyhow::Result<()> {
        if self.shape() != other.shape() {
            anyhow::bail!("Shape mismatch {:?} != {:?}", self.shape(), other.shape())
        }

        let mut stats = CloseStats::new(tol);
        for (flat, (a, b)) in self.to_vec().into_iter().zip(other.to_vec()).enumerate() {
            stats.update(a, b, flat);
        }

        if stats.fail_count > 0 {
            anyhow::bail!(
                "{} samples not close - AVGE={} MAE={} at {:?}",
                stats.fail_count,
                stats.avg_error(),
                stats.max_abs_error,
                stats.max_abs_error_at.map(|flat| self.shape().unravel(flat)),
            );
        }
        log::debug!(
            "All close - AVGE={} MAE={} at {:?}",
            stats.avg_error(),
            stats.max_abs_error,
            stats.max_abs_error_at.map(|flat| self.shape().unravel(flat)),
        );
        Ok(())
    }
}

impl<T: TensorDType> PartialEq for Tensor<T> {
    /// Exact value equality, see [`Tensor::values_eq`].
    fn eq(&self, other: &Self) -> bool {
        self.values_eq(other, &Tolerance::exact())
    }
}

struct CloseStats {
    total_error: f64,
    max_abs_error: f64,
    max_abs_error_at: Option<usize>,
    element_count: usize,
    fail_count: usize,
    tol: Tolerance,
}

impl CloseStats {
    fn new(tol: Tolerance) -> Self {
        Self {
            total_error: 0.0,
            max_abs_error: 0.0,
            max_abs_error_at: None,
            element_count: 0,
            fail_count: 0,
            tol,
        }
    }

    fn update<T: TensorDType>(&mut self, a: T, b: T, flat: usize) {
        let abs_diff = (a.as_f64() - b.as_f64()).abs();
        self.element_count += 1;
        if abs_diff.is_finite() {
            self.total_error += abs_diff;
        }
        if abs_diff > self.max_abs_error {
            self.max_abs_error = abs_diff;
            self.max_abs_error_at = Some(flat);
        }
        if !self.is_close(a, b) {
            self.fail_count += 1;
        }
    }

    fn avg_error(&self) -> f64 {
        if self.element_count == 0 {
            return 0.0;
        }
        self.total_error / self.element_count as f64
    }

    fn is_close<T: TensorDType>(&self, a: T, b: T) -> bool {
        let (x, y) = (a.as_f64(), b.as_f64());
        (x.is_nan() && y.is_nan())
            || (x.is_infinite() && y.is_infinite() && x.signum() == y.signum())
            || a.is_close(b, &self.tol)
    }
}
