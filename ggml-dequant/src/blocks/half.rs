use super::_1;
use crate::{from_brain, to_brain, DataBlock, Dequantize, Quantize};
use half::{bf16, f16};

impl DataBlock for f32 {
    const COUNT: usize = _1;
    const ZEROS: Self = 0.;
}

impl Dequantize<_1> for f32 {
    #[inline]
    fn dequantize(&self) -> [f32; _1] {
        [*self]
    }
}

impl Quantize<_1> for f32 {
    #[inline]
    fn quantize(&[data]: &[f32; _1]) -> Self {
        data
    }
}

impl DataBlock for f16 {
    const COUNT: usize = _1;
    const ZEROS: Self = f16::ZERO;
}

impl Dequantize<_1> for f16 {
    #[inline]
    fn dequantize(&self) -> [f32; _1] {
        [self.to_f32()]
    }
}

impl Quantize<_1> for f16 {
    #[inline]
    fn quantize(&[data]: &[f32; _1]) -> Self {
        f16::from_f32(data)
    }
}

impl DataBlock for bf16 {
    const COUNT: usize = _1;
    const ZEROS: Self = bf16::ZERO;
}

impl Dequantize<_1> for bf16 {
    #[inline]
    fn dequantize(&self) -> [f32; _1] {
        [from_brain(*self)]
    }
}

impl Quantize<_1> for bf16 {
    #[inline]
    fn quantize(&[data]: &[f32; _1]) -> Self {
        to_brain(data)
    }
}
