use crate::{bf16, f16, Dequantize, Q2K, Q4K, Q4_0, Q4_1, Q6K, Q8_0, StoreFloat};
use gguf_file::{GGmlType, GGufTensorInfo};
use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};
use std::{error::Error, fmt};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DequantizeError {
    UnsupportedType(GGmlType),
}

impl fmt::Display for DequantizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedType(ty) => write!(f, "no decoder for tensor type {ty}"),
        }
    }
}

impl Error for DequantizeError {}

/// Decodes packed blocks from `src` into `dst`, one block per chunk of
/// the destination. The final chunk may be shorter than a block; the
/// decoder still reads the whole block and keeps only the leading
/// weights. Blocks are read unaligned since mapped payloads only carry
/// the container alignment.
pub fn dequantize_blocks<Blk, T, const N: usize>(dst: &mut [T], src: &[u8])
where
    Blk: Dequantize<N>,
    T: StoreFloat,
{
    assert_eq!(src.len(), dst.len().div_ceil(N) * size_of::<Blk>());
    dst.par_chunks_mut(N).enumerate().for_each(|(i, chunk)| {
        let block = unsafe { src.as_ptr().add(i * size_of::<Blk>()).cast::<Blk>().read_unaligned() };
        let weights = block.dequantize();
        for (y, &w) in chunk.iter_mut().zip(&weights) {
            *y = T::store(w);
        }
    });
}

fn dequantize_any<T: StoreFloat>(ty: GGmlType, src: &[u8], dst: &mut [T]) -> Result<(), DequantizeError> {
    use GGmlType as Ty;
    match ty {
        Ty::F32 => dequantize_blocks::<f32, T, 1>(dst, src),
        Ty::F16 => dequantize_blocks::<f16, T, 1>(dst, src),
        Ty::BF16 => dequantize_blocks::<bf16, T, 1>(dst, src),
        Ty::Q4_0 => dequantize_blocks::<Q4_0, T, 32>(dst, src),
        Ty::Q4_1 => dequantize_blocks::<Q4_1, T, 32>(dst, src),
        Ty::Q8_0 => dequantize_blocks::<Q8_0, T, 32>(dst, src),
        Ty::Q2K => dequantize_blocks::<Q2K, T, 256>(dst, src),
        Ty::Q4K => dequantize_blocks::<Q4K, T, 256>(dst, src),
        Ty::Q6K => dequantize_blocks::<Q6K, T, 256>(dst, src),
        _ => return Err(DequantizeError::UnsupportedType(ty)),
    }
    Ok(())
}

/// Dequantizes a whole tensor to 32-bit floats.
pub fn tensor_to_f32(tensor: &GGufTensorInfo) -> Result<Vec<f32>, DequantizeError> {
    let mut dst = vec![0f32; tensor.nelements() as usize];
    if tensor.ggml_type() == GGmlType::F32 {
        // Already the destination format.
        let src = tensor.data();
        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), dst.as_mut_ptr().cast::<u8>(), src.len());
        }
    } else {
        dequantize_any(tensor.ggml_type(), tensor.data(), &mut dst)?;
    }
    Ok(dst)
}

/// Dequantizes a whole tensor, narrowing every weight to IEEE binary16.
pub fn tensor_to_f16(tensor: &GGufTensorInfo) -> Result<Vec<f16>, DequantizeError> {
    let mut dst = vec![f16::ZERO; tensor.nelements() as usize];
    dequantize_any(tensor.ggml_type(), tensor.data(), &mut dst)?;
    Ok(dst)
}

/// Dequantizes a whole tensor, narrowing every weight to bfloat16.
pub fn tensor_to_bf16(tensor: &GGufTensorInfo) -> Result<Vec<bf16>, DequantizeError> {
    let mut dst = vec![bf16::ZERO; tensor.nelements() as usize];
    dequantize_any(tensor.ggml_type(), tensor.data(), &mut dst)?;
    Ok(dst)
}
