//! Dense row-major tensors and scoped inference buffers.
//!
//! The model contract is shape-based: inputs are `[batch, window, features]`,
//! outputs are `[batch, 1]`. `Tensor` checks the element count against its
//! shape on construction so shape errors surface before the model runs.
//!
//! `TensorPool` hands out `PooledTensor` guards for short-lived inference
//! inputs. A guard releases its buffer when dropped, so a buffer is returned
//! on every exit path of the code that holds it, including `?` returns.

use std::cell::Cell;
use std::ops::Deref;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl Tensor {
    pub fn from_vec(shape: Vec<usize>, data: Vec<f64>) -> Result<Self, AppError> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(AppError::training(format!(
                "Tensor shape {shape:?} needs {expected} values, got {}.",
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Size of the leading (batch) dimension.
    pub fn batch(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    /// All values belonging to batch entry `b`.
    pub fn row(&self, b: usize) -> &[f64] {
        let stride: usize = self.shape.iter().skip(1).product();
        &self.data[b * stride..(b + 1) * stride]
    }

    /// Element `[b, t, f]` of a rank-3 tensor.
    pub fn get3(&self, b: usize, t: usize, f: usize) -> f64 {
        let (steps, feats) = (self.shape[1], self.shape[2]);
        self.data[(b * steps + t) * feats + f]
    }
}

/// Tracks inference buffers that are currently alive.
#[derive(Debug, Default)]
pub struct TensorPool {
    live: Cell<usize>,
    peak: Cell<usize>,
    acquired: Cell<usize>,
}

impl TensorPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `tensor` until the returned guard is dropped.
    pub fn acquire(&self, tensor: Tensor) -> PooledTensor<'_> {
        let live = self.live.get() + 1;
        self.live.set(live);
        self.peak.set(self.peak.get().max(live));
        self.acquired.set(self.acquired.get() + 1);
        PooledTensor { tensor, pool: self }
    }

    /// Buffers acquired and not yet released.
    pub fn live(&self) -> usize {
        self.live.get()
    }

    /// Highest number of simultaneously live buffers.
    pub fn peak(&self) -> usize {
        self.peak.get()
    }

    pub fn total_acquired(&self) -> usize {
        self.acquired.get()
    }
}

/// A tensor on loan from a `TensorPool`.
#[derive(Debug)]
pub struct PooledTensor<'a> {
    tensor: Tensor,
    pool: &'a TensorPool,
}

impl Deref for PooledTensor<'_> {
    type Target = Tensor;

    fn deref(&self) -> &Tensor {
        &self.tensor
    }
}

impl Drop for PooledTensor<'_> {
    fn drop(&mut self) {
        self.pool.live.set(self.pool.live.get().saturating_sub(1));
        log::trace!("released inference buffer {:?}", self.tensor.shape());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_must_match_data() {
        assert!(Tensor::from_vec(vec![2, 3, 2], vec![0.0; 12]).is_ok());
        assert!(Tensor::from_vec(vec![2, 3, 2], vec![0.0; 11]).is_err());
    }

    #[test]
    fn indexing_is_row_major() {
        let t = Tensor::from_vec(vec![2, 2, 2], (0..8).map(f64::from).collect()).unwrap();
        assert_eq!(t.batch(), 2);
        assert_eq!(t.row(1), &[4.0, 5.0, 6.0, 7.0]);
        assert_eq!(t.get3(1, 0, 1), 5.0);
        assert_eq!(t.get3(0, 1, 0), 2.0);
    }

    #[test]
    fn guards_release_on_drop() {
        let pool = TensorPool::new();
        {
            let a = pool.acquire(Tensor::from_vec(vec![1, 1], vec![1.0]).unwrap());
            let _b = pool.acquire(Tensor::from_vec(vec![1, 1], vec![2.0]).unwrap());
            assert_eq!(a.data(), &[1.0]);
            assert_eq!(pool.live(), 2);
        }
        assert_eq!(pool.live(), 0);
        assert_eq!(pool.peak(), 2);
        assert_eq!(pool.total_acquired(), 2);
    }

    #[test]
    fn guards_release_on_early_return() {
        fn fails(pool: &TensorPool) -> Result<(), AppError> {
            let _buf = pool.acquire(Tensor::from_vec(vec![1, 1], vec![0.0]).unwrap());
            Err(AppError::training("boom"))
        }

        let pool = TensorPool::new();
        assert!(fails(&pool).is_err());
        assert_eq!(pool.live(), 0);
    }
}
