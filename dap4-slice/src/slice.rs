use std::fmt::{Display, Formatter};

use dap4_error::{Dap4Result, dap4_bail, dap4_err};

/// An arithmetic progression of indices along one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slice {
    first: u64,
    count: u64,
    stride: u64,
}

impl Slice {
    /// Select `count` indices starting at `first`, `stride` apart. The stride must be positive.
    pub fn new(first: u64, count: u64, stride: u64) -> Dap4Result<Self> {
        if stride == 0 {
            dap4_bail!("slice stride must be at least 1");
        }
        if count > 0 {
            (count - 1)
                .checked_mul(stride)
                .and_then(|span| span.checked_add(first))
                .ok_or_else(|| {
                    dap4_err!(
                        "slice of {} elements from {} by {} overflows",
                        count,
                        first,
                        stride
                    )
                })?;
        }
        Ok(Self {
            first,
            count,
            stride,
        })
    }

    /// Select every index of a dimension of `size`.
    pub const fn whole(size: u64) -> Self {
        Self {
            first: 0,
            count: size,
            stride: 1,
        }
    }

    /// Select the single index `index`.
    pub const fn single(index: u64) -> Self {
        Self {
            first: index,
            count: 1,
            stride: 1,
        }
    }

    /// Select `first..=last` by `stride`, the form used in DAP4 constraint expressions.
    pub fn from_bounds(first: u64, last: u64, stride: u64) -> Dap4Result<Self> {
        if stride == 0 {
            dap4_bail!("slice stride must be at least 1");
        }
        if last < first {
            dap4_bail!("slice [{}:{}:{}] ends before it starts", first, stride, last);
        }
        Self::new(first, (last - first) / stride + 1, stride)
    }

    /// The first selected index.
    #[inline]
    pub fn first(&self) -> u64 {
        self.first
    }

    /// The number of selected indices.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// The distance between consecutive selected indices.
    #[inline]
    pub fn stride(&self) -> u64 {
        self.stride
    }

    /// The last selected index, or `None` for an empty slice.
    pub fn last(&self) -> Option<u64> {
        (self.count > 0).then(|| self.first + (self.count - 1) * self.stride)
    }

    /// The `i`th selected index.
    #[inline]
    pub fn index(&self, i: u64) -> u64 {
        self.first + i * self.stride
    }

    /// Check that every selected index lies within a dimension of `size`.
    pub fn validate(&self, size: u64) -> Dap4Result<()> {
        match self.last() {
            Some(last) if last >= size => Err(dap4_err!(
                OutOfBounds: usize::try_from(last).unwrap_or(usize::MAX),
                0,
                usize::try_from(size).unwrap_or(usize::MAX)
            )),
            _ => Ok(()),
        }
    }

    /// Whether the slice selects every index of a dimension of `size`, in order.
    pub fn is_whole(&self, size: u64) -> bool {
        self.first == 0 && self.count == size && (self.stride == 1 || self.count <= 1)
    }

    /// Whether the slice selects adjacent indices.
    pub fn is_dense(&self) -> bool {
        self.stride == 1 || self.count <= 1
    }
}

impl Display for Slice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.last() {
            None => write!(f, "[]"),
            Some(_) if self.count == 1 => write!(f, "[{}]", self.first),
            Some(last) if self.stride == 1 => write!(f, "[{}:{}]", self.first, last),
            Some(last) => write!(f, "[{}:{}:{}]", self.first, self.stride, last),
        }
    }
}
