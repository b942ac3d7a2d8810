use super::{DeltaMin, _256};
use crate::{DataBlock, Dequantize};

/// 256 weights in 8 sub-blocks of 32. Sub-block scales and mins are 6-bit
/// values packed into 12 bytes, stretched by the super-block pair.
#[repr(C)]
pub struct Q4K {
    delta_min: DeltaMin,
    scales: [u8; 12],
    qs: [u8; _256 / 2],
}

impl DataBlock for Q4K {
    const COUNT: usize = _256;
    const ZEROS: Self = Self {
        delta_min: DeltaMin::ZERO,
        scales: [0; 12],
        qs: [0; _256 / 2],
    };
}

impl Dequantize<_256> for Q4K {
    fn dequantize(&self) -> [f32; _256] {
        let (delta, min) = self.delta_min.to_f32();

        // Unpack the 8 6-bit scale/min pairs. The first 4 pairs use the
        // low 6 bits of bytes 0..8; the last 4 recombine the low nibbles
        // of bytes 8..12 with the spilled high 2 bits of bytes 0..8.
        let pk = &self.scales;
        let mut scales = [0.; 8];
        let mut mins = [0.; 8];
        for j in 0..8 {
            let (d, m) = if j < 4 {
                (pk[j] & 63, pk[j + 4] & 63)
            } else {
                (
                    pk[j + 4] & 0xf | (pk[j - 4] >> 6) << 4,
                    pk[j + 4] >> 4 | (pk[j] >> 6) << 4,
                )
            };
            scales[j] = delta * d as f32;
            mins[j] = min * m as f32;
        }

        // Sub-blocks come in pairs sharing 32 payload bytes: the first
        // sub-block of a pair is the low nibbles, the second the high.
        let mut ans = [0.; _256];
        for pair in 0..4 {
            let qs = &self.qs[pair * 32..][..32];
            let lo = pair * 64;
            let hi = lo + 32;
            for (j, &q) in qs.iter().enumerate() {
                ans[lo + j] = (q & 0xf) as f32 * scales[pair * 2] - mins[pair * 2];
                ans[hi + j] = (q >> 4) as f32 * scales[pair * 2 + 1] - mins[pair * 2 + 1];
            }
        }
        ans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_scales_and_nibble_pairs() {
        let mut block = Q4K::ZEROS;
        block.delta_min = DeltaMin::new(1.0, 1.0);

        // Sub-block 0: scale 1 with its high bits spilling into sub-block
        // 4's scale; sub-block 0 min 2.
        block.scales[0] = 0b0100_0001;
        block.scales[4] = 2;
        // Sub-block 4's low scale nibble.
        block.scales[8] = 0x02;
        // Sub-block 1: scale/min zero. Shared payload byte: low nibble for
        // sub-block 0, high nibble for sub-block 1.
        block.qs[0] = 0x53;
        // Pair 2 covers weights 128..192; sub-block 4 is its low half.
        block.qs[64] = 0x01;

        let deq = block.dequantize();
        assert_eq!(deq[0], 3.0 * 1.0 - 2.0);
        assert_eq!(deq[32], 0.0);
        // scale 4 = low nibble 2 | spilled bits 01 << 4 = 18.
        assert_eq!(deq[128], 18.0);
        assert_eq!(deq[255], 0.0);
    }

    #[test]
    fn block_geometry_matches_the_registry() {
        assert_eq!(size_of::<Q4K>(), 144);
        assert_eq!(Q4K::COUNT, 256);
    }
}
