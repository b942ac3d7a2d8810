use super::_256;
use crate::{DataBlock, Dequantize};
use half::f16;

/// 256 weights in 16 sub-blocks of 16, no mins. Quants are 6 bits, split
/// into a low-nibble array and a high-2-bit array, stored as unsigned
/// plus 32; sub-block scales are signed bytes under one f16 super-scale.
#[repr(C)]
pub struct Q6K {
    ql: [u8; _256 / 2],
    qh: [u8; _256 / 4],
    scales: [i8; _256 / 16],
    delta: f16,
}

impl DataBlock for Q6K {
    const COUNT: usize = _256;
    const ZEROS: Self = Self {
        ql: [0; _256 / 2],
        qh: [0; _256 / 4],
        scales: [0; _256 / 16],
        delta: f16::ZERO,
    };
}

impl Dequantize<_256> for Q6K {
    fn dequantize(&self) -> [f32; _256] {
        let delta = self.delta.to_f32();

        // Two 128-weight clusters; within one, weight j takes its low
        // 4 bits from ql[j%64] (shifted by j/64*4) and its high 2 bits
        // from qh[j%32] (shifted by j/32*2).
        let mut ans = [0.; _256];
        for cluster in 0..2 {
            let ql = &self.ql[cluster * 64..][..64];
            let qh = &self.qh[cluster * 32..][..32];
            let scales = &self.scales[cluster * 8..][..8];
            for j in 0..128 {
                let low = ql[j % 64] >> (j / 64 * 4) & 0xf;
                let high = qh[j % 32] >> (j / 32 * 2) & 3;
                let q = (low | high << 4) as i32 - 32;
                ans[cluster * 128 + j] = delta * scales[j / 16] as f32 * q as f32;
            }
        }
        ans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_bit_layout() {
        let mut block = Q6K::ZEROS;
        block.delta = f16::from_f32(1.0);
        block.ql[0] = 5;
        block.qh[0] = 1;
        block.scales[0] = 2;
        block.scales[4] = 1;
        block.scales[8] = -1;

        let deq = block.dequantize();
        // Weight 0: 6-bit quant 5 | 1 << 4 = 21, minus the 32 bias.
        assert_eq!(deq[0], 2.0 * (21 - 32) as f32);
        // Weight 64 reads the high nibble of ql[0] and bits 4..6 of qh[0].
        assert_eq!(deq[64], 1.0 * (0 - 32) as f32);
        // Second cluster, all-zero quants give -32 at negative scale.
        assert_eq!(deq[128], -1.0 * -32.0);
        assert_eq!(deq[255], 0.0);
    }

    #[test]
    fn block_geometry_matches_the_registry() {
        assert_eq!(size_of::<Q6K>(), 210);
        assert_eq!(Q6K::COUNT, 256);
    }
}
