use crate::GGmlType;

/// Tensors are stored with at most this many dimensions; missing
/// dimensions are logically 1.
pub const MAX_DIMS: usize = 4;

/// Descriptor of one tensor, with the offset already translated from
/// data-section-relative to absolute, and the payload bytes attached.
#[derive(Clone, Copy, Debug)]
pub struct GGufTensorInfo<'a> {
    pub(crate) name: &'a str,
    pub(crate) ndim: usize,
    pub(crate) shape: [u64; MAX_DIMS],
    pub(crate) ty: GGmlType,
    pub(crate) offset: u64,
    pub(crate) data: &'a [u8],
}

impl<'a> GGufTensorInfo<'a> {
    #[inline]
    pub fn name(&self) -> &'a str {
        self.name
    }

    #[inline]
    pub fn shape(&self) -> &[u64] {
        &self.shape[..self.ndim]
    }

    #[inline]
    pub fn ggml_type(&self) -> GGmlType {
        self.ty
    }

    /// Absolute offset of the payload in the file.
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of weights, the product of all dimensions.
    #[inline]
    pub fn nelements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Bytes the payload occupies on disk. A final block holding fewer
    /// than `items_per_block` weights is still stored at full length.
    pub fn nbytes(&self) -> u64 {
        let tf = self.ty.features();
        self.nelements().div_ceil(tf.items_per_block as u64) * tf.bytes_per_block as u64
    }

    /// The payload bytes, `nbytes` long, borrowed from the mapped file.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }
}
