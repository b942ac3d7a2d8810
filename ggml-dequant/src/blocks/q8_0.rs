use super::{max_abs, _32};
use crate::{DataBlock, Dequantize, Quantize};
use half::f16;

#[repr(C)]
pub struct Q8_0 {
    delta: f16,
    quants: [i8; _32],
}

impl DataBlock for Q8_0 {
    const COUNT: usize = _32;
    const ZEROS: Self = Self {
        delta: f16::ZERO,
        quants: [0; _32],
    };
}

impl Quantize<_32> for Q8_0 {
    fn quantize(data: &[f32; _32]) -> Self {
        let amax = max_abs(data);
        if amax == 0. {
            return Self::ZEROS;
        }

        let delta = amax / i8::MAX as f32;
        let recip = delta.recip();
        Self {
            delta: f16::from_f32(delta),
            quants: data.map(|x| (x * recip).round() as _),
        }
    }
}

impl Dequantize<_32> for Q8_0 {
    #[inline]
    fn dequantize(&self) -> [f32; _32] {
        let delta = self.delta.to_f32();
        self.quants.map(|x| x as f32 * delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Diff, ErrorCollector};
    use rand::Rng;
    use std::iter::zip;

    #[test]
    fn known_block() {
        let mut quants = [0i8; _32];
        quants[..3].copy_from_slice(&[2, -4, 0]);
        let block = Q8_0 {
            delta: f16::from_f32(0.5),
            quants,
        };
        assert_eq!(&block.dequantize()[..3], [1.0, -2.0, 0.0]);
    }

    #[test]
    fn round_trip_stays_within_scale() {
        let mut data = [0.0f32; _32];
        rand::thread_rng().fill(&mut data);

        let q8_0 = Q8_0::quantize(&data);
        let deq = q8_0.dequantize();

        // One quantization step is max|v| / 127.
        let bound = super::max_abs(&data) / 127.;
        let mut ec = ErrorCollector::new(bound, 0.);
        for (a, b) in zip(data, deq) {
            ec.push(Diff::new(a, b))
        }
        println!("{ec}");
        assert!(ec.outliers().is_empty());
    }
}
