mod half;
mod q2_k;
mod q4_0;
mod q4_1;
mod q4_k;
mod q6_k;
mod q8_0;

pub use q2_k::Q2K;
pub use q4_0::Q4_0;
pub use q4_1::Q4_1;
pub use q4_k::Q4K;
pub use q6_k::Q6K;
pub use q8_0::Q8_0;

use ::half::f16;

/// The delta/min coefficient pair shared by the biased formats.
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug)]
#[repr(C)]
struct DeltaMin {
    delta: f16,
    min: f16,
}

impl DeltaMin {
    const ZERO: Self = Self {
        delta: f16::ZERO,
        min: f16::ZERO,
    };

    #[inline]
    fn new(delta: f32, min: f32) -> Self {
        Self {
            delta: f16::from_f32(delta),
            min: f16::from_f32(min),
        }
    }

    #[inline]
    fn no_delta(min: f32) -> Self {
        Self {
            delta: f16::ZERO,
            min: f16::from_f32(min),
        }
    }

    #[inline]
    fn to_f32(self) -> (f32, f32) {
        (self.delta.to_f32(), self.min.to_f32())
    }
}

#[inline]
fn max_abs(data: &[f32]) -> f32 {
    data.iter().fold(0., |acc, x| acc.max(x.abs()))
}

#[inline]
fn max_by_abs(data: &[f32]) -> f32 {
    data.iter()
        .fold(0., |acc, &x| if x.abs() > acc.abs() { x } else { acc })
}

#[inline]
fn min_max(data: &[f32]) -> (f32, f32) {
    data.iter().fold((f32::MAX, f32::MIN), |(min, max), &x| {
        (min.min(x), max.max(x))
    })
}

pub(crate) const _1: usize = 1;
pub(crate) const _32: usize = 32;
pub(crate) const _256: usize = 256;
