use super::{DeltaMin, _256};
use crate::{DataBlock, Dequantize};

/// 256 weights in 16 sub-blocks of 16. Each sub-block has a 4-bit scale
/// and 4-bit min, both stretched by a super-block coefficient pair.
#[repr(C)]
pub struct Q2K {
    scales: [u8; _256 / 16],
    qs: [u8; _256 / 4],
    delta_min: DeltaMin,
}

impl DataBlock for Q2K {
    const COUNT: usize = _256;
    const ZEROS: Self = Self {
        scales: [0; _256 / 16],
        qs: [0; _256 / 4],
        delta_min: DeltaMin::ZERO,
    };
}

impl Dequantize<_256> for Q2K {
    fn dequantize(&self) -> [f32; _256] {
        let (delta, min) = self.delta_min.to_f32();

        // The 2-bit quant of weight i lives in byte i%32 of its 128-weight
        // cluster, at bit position 2 * (i%128 / 32).
        let mut ans = [0.; _256];
        for (b, chunk) in ans.chunks_mut(16).enumerate() {
            let scale = delta * (self.scales[b] & 0xf) as f32;
            let min = min * (self.scales[b] >> 4) as f32;
            for (j, y) in chunk.iter_mut().enumerate() {
                let i = b * 16 + j;
                let q = self.qs[i % 32 + i / 128 * 32] >> (i % 128 / 32 * 2) & 3;
                *y = q as f32 * scale - min;
            }
        }
        ans
    }
}
