#![doc = include_str!("../README.md")]

mod blocks;
mod brain;
mod tensor;

pub use blocks::{Q2K, Q4K, Q4_0, Q4_1, Q6K, Q8_0};
pub use brain::{from_brain, to_brain};
pub use tensor::{tensor_to_bf16, tensor_to_f16, tensor_to_f32, DequantizeError};

pub use ::half::{bf16, f16};

use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use std::slice::from_raw_parts;

/// A packed block of weights: the atomic unit of a quantization format.
pub trait DataBlock: Sized + 'static {
    const COUNT: usize;
    const ZEROS: Self;
}

/// Recovers the block's weights as 32-bit floats.
pub trait Dequantize<const N: usize>: DataBlock {
    fn dequantize(&self) -> [f32; N];
}

/// Packs 32-bit floats into a block. Only the simple formats encode;
/// the K-quants are decode-only.
pub trait Quantize<const N: usize>: Dequantize<N> {
    fn quantize(data: &[f32; N]) -> Self;
}

/// Narrows a decoded `f32` weight into the output element type.
pub trait StoreFloat: Copy + Send + Sync + 'static {
    fn store(f: f32) -> Self;
}

impl StoreFloat for f32 {
    #[inline(always)]
    fn store(f: f32) -> Self {
        f
    }
}

impl StoreFloat for f16 {
    #[inline(always)]
    fn store(f: f32) -> Self {
        f16::from_f32(f)
    }
}

impl StoreFloat for bf16 {
    #[inline(always)]
    fn store(f: f32) -> Self {
        to_brain(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantizeError {
    Indivisible,
    LengthMismatch,
}

/// Packs `src` block by block into `dst`. The source length must be a
/// block multiple; partial blocks only exist on the decode side.
pub fn quantize_slice<Blk, const N: usize>(
    dst: &mut [Blk],
    src: &[f32],
) -> Result<(), QuantizeError>
where
    Blk: Quantize<N> + Send,
{
    if src.len() % N != 0 {
        return Err(QuantizeError::Indivisible);
    }
    if dst.len() != src.len() / N {
        return Err(QuantizeError::LengthMismatch);
    }
    let src = unsafe { from_raw_parts(src.as_ptr().cast::<[f32; N]>(), dst.len()) };
    dst.into_par_iter()
        .zip(src)
        .for_each(|(dst, src)| *dst = Blk::quantize(src));
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_utils {
    use std::fmt;

    pub struct Diff {
        pub abs: f32,
        pub rel: f32,
    }

    impl Diff {
        pub fn new(a: f32, b: f32) -> Self {
            let abs = (a - b).abs();
            let rel = abs / (a.abs() + b.abs() + f32::EPSILON);
            Self { abs, rel }
        }
    }

    pub struct ErrorCollector {
        threshold: Diff,
        max_diff: Diff,
        outliers: Vec<usize>,
        count: usize,
    }

    impl ErrorCollector {
        pub fn new(abs: f32, rel: f32) -> Self {
            Self {
                threshold: Diff { abs, rel },
                max_diff: Diff { abs: 0.0, rel: 0.0 },
                outliers: vec![],
                count: 0,
            }
        }

        pub fn push(&mut self, diff: Diff) {
            self.max_diff.abs = f32::max(self.max_diff.abs, diff.abs);
            self.max_diff.rel = f32::max(self.max_diff.rel, diff.rel);

            if diff.abs > self.threshold.abs && diff.rel > self.threshold.rel {
                self.outliers.push(self.count);
            }

            self.count += 1;
        }

        pub fn outliers(&self) -> &[usize] {
            &self.outliers
        }
    }

    impl fmt::Display for ErrorCollector {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(
                f,
                "abs: {:.3e}, rel: {:.3e}, outliers: {}/{}",
                self.max_diff.abs,
                self.max_diff.rel,
                self.outliers.len(),
                self.count,
            )
        }
    }
}
