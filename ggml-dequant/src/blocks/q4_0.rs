use super::{max_by_abs, _32};
use crate::{DataBlock, Dequantize, Quantize};
use half::f16;
use std::array::from_fn;

#[repr(C)]
pub struct Q4_0 {
    delta: f16,
    quants: [u8; _32 / 2],
}

impl DataBlock for Q4_0 {
    const COUNT: usize = _32;
    const ZEROS: Self = Self {
        delta: f16::ZERO,
        quants: [0; _32 / 2],
    };
}

impl Quantize<_32> for Q4_0 {
    fn quantize(data: &[f32; _32]) -> Self {
        let max = max_by_abs(data);
        if max == 0. {
            return Self::ZEROS;
        }

        let delta = max / -8.;
        let recip = delta.recip();
        let f = |x: f32| ((x * recip + 8.5) as u8).min(15);

        let (l, h) = data.split_at(_32 / 2);
        Self {
            delta: f16::from_f32(delta),
            quants: from_fn(|i| (f(h[i]) << 4) | f(l[i])),
        }
    }
}

impl Dequantize<_32> for Q4_0 {
    /// Weights 0..16 sit in the low nibbles, 16..32 in the high nibbles,
    /// each biased by 8.
    fn dequantize(&self) -> [f32; _32] {
        let delta = self.delta.to_f32();
        let f = |x: u8| (x as i8 - 8) as f32 * delta;

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
    fn nibble_layout() {
        // First byte 0x87: weight 0 is the low nibble 7, weight 16 the
        // high nibble 8.
        let mut quants = [0x88; _32 / 2];
        quants[0] = 0x87;
        let block = Q4_0 {
            delta: f16::from_f32(1.0),
            quants,
        };
        let deq = block.dequantize();
        assert_eq!(deq[0], -1.0);
        assert_eq!(deq[16], 0.0);
        assert_eq!(deq[1], 0.0);
    }

    #[test]
    fn round_trip() {
        let mut data = [0.0f32; _32];
        rand::thread_rng().fill(&mut data);

        let q4_0 = Q4_0::quantize(&data);
        let deq = q4_0.dequantize();

        let mut ec = ErrorCollector::new(8e-2, 0.);
        for (a, b) in zip(data, deq) {
            ec.push(Diff::new(a, b))
        }
        println!("{ec}");
        assert!(ec.outliers().is_empty());
    }
}
