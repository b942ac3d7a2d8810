use super::{min_max, DeltaMin, _32};
use crate::{DataBlock, Dequantize, Quantize};
use std::array::from_fn;

#[repr(C)]
pub struct Q4_1 {
    delta_min: DeltaMin,
    quants: [u8; _32 / 2],
}

impl DataBlock for Q4_1 {
    const COUNT: usize = _32;
    const ZEROS: Self = Self {
        delta_min: DeltaMin::ZERO,
        quants: [0; _32 / 2],
    };
}

impl Quantize<_32> for Q4_1 {
    fn quantize(data: &[f32; _32]) -> Self {
        let (min, max) = min_max(data);
        if min == max {
            return Self {
                delta_min: DeltaMin::no_delta(min),
                quants: [0; _32 / 2],
            };
        }

        let delta = (max - min) / ((1 << 4) - 1) as f32;
        let recip = delta.recip();
        let f = |x: f32| (((x - min) * recip + 0.5) as u8).min(15);

        let (l, h) = data.split_at(_32 / 2);
        Self {
            delta_min: DeltaMin::new(delta, min),
            quants: from_fn(|i| (f(h[i]) << 4) | f(l[i])),
        }
    }
}

impl Dequantize<_32> for Q4_1 {
    /// Same nibble layout as Q4_0, but the quant is unbiased and a
    /// per-block minimum is added back.
    fn dequantize(&self) -> [f32; _32] {
        let (delta, min) = self.delta_min.to_f32();
        let f = |x: u8| x as f32 * delta + min;

        let mut ans = [0.; _32];
        let (l, h) = ans.split_at_mut(_32 / 2);
        for (i, &x) in self.quants.iter().enumerate() {
            l[i] = f(x & 0xf);
            h[i] = f(x >> 4);
        }
        ans
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Diff, ErrorCollector};
    use rand::Rng;
    use std::iter::zip;

    #[test]
    fn round_trip() {
        let mut data = [0.0f32; _32];
        rand::thread_rng().fill(&mut data);

        let q4_1 = Q4_1::quantize(&data);
        let deq = q4_1.dequantize();

        let mut ec = ErrorCollector::new(4e-2, 0.);
        for (a, b) in zip(data, deq) {
            ec.push(Diff::new(a, b))
        }
        println!("{ec}");
        assert!(ec.outliers().is_empty());
    }

    #[test]
    fn constant_block_keeps_its_bias() {
        let data = [2.5f32; _32];
        let deq = Q4_1::quantize(&data).dequantize();
        for x in deq {
            assert_eq!(x, 2.5);
        }
    }
}
