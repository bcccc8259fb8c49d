use std::ops::Range;

use dap4_error::{Dap4Result, dap4_bail, dap4_err};
use itertools::{Itertools, izip};

use crate::Slice;

/// Walks the selected elements of a multi-dimensional variable in row-major order.
///
/// Each step yields the linear offset of an element, counted in elements from the start of the
/// variable. A scalar has rank zero and yields the single offset 0.
#[derive(Debug, Clone)]
pub struct Odometer {
    dim_sizes: Vec<u64>,
    slices: Vec<Slice>,
    /// The number of elements one step along each dimension skips.
    dim_strides: Vec<u64>,
    counters: Vec<u64>,
    total: u64,
    remaining: u64,
}

impl Odometer {
    /// An odometer over `slices` of a variable shaped `dim_sizes`.
    ///
    /// An empty slice list selects the whole variable. Otherwise there must be one slice per
    /// dimension and every slice must lie within its dimension.
    pub fn new(dim_sizes: &[u64], slices: &[Slice]) -> Dap4Result<Self> {
        let slices = if slices.is_empty() {
            dim_sizes.iter().map(|&size| Slice::whole(size)).collect_vec()
        } else {
            if slices.len() != dim_sizes.len() {
                dap4_bail!(
                    "expected {} slices for a rank {} variable, got {}",
                    dim_sizes.len(),
                    dim_sizes.len(),
                    slices.len()
                );
            }
            for (slice, &size) in slices.iter().zip(dim_sizes) {
                slice.validate(size)?;
            }
            slices.to_vec()
        };

        let too_large =
            || dap4_err!("selection of shape [{}] is too large", dim_sizes.iter().format(", "));

        let mut dim_strides = vec![1u64; dim_sizes.len()];
        for d in (0..dim_sizes.len().saturating_sub(1)).rev() {
            dim_strides[d] = dim_strides[d + 1]
                .checked_mul(dim_sizes[d + 1])
                .ok_or_else(too_large)?;
        }
        if let (Some(&outer), Some(&size)) = (dim_strides.first(), dim_sizes.first()) {
            outer.checked_mul(size).ok_or_else(too_large)?;
        }

        let total = slices
            .iter()
            .try_fold(1u64, |acc, s| acc.checked_mul(s.count()).ok_or_else(too_large))?;

        Ok(Self {
            dim_sizes: dim_sizes.to_vec(),
            counters: vec![0; slices.len()],
            slices,
            dim_strides,
            total,
            remaining: total,
        })
    }

    /// The rank of the variable.
    pub fn rank(&self) -> usize {
        self.slices.len()
    }

    /// The total number of selected elements.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// The per-dimension indices of the element the next step yields.
    pub fn indices(&self) -> Vec<u64> {
        izip!(&self.slices, &self.counters)
            .map(|(slice, &i)| slice.index(i))
            .collect()
    }

    /// If the selection is one run of adjacent elements, the range of linear offsets it covers.
    ///
    /// This holds when every dimension inside some dimension `d` is selected whole, `d` itself is
    /// selected densely, and every dimension outside `d` selects a single index.
    pub fn contiguous_run(&self) -> Option<Range<u64>> {
        if self.total == 0 {
            return Some(0..0);
        }

        let mut d = self.rank();
        while d > 0 && self.slices[d - 1].is_whole(self.dim_sizes[d - 1]) {
            d -= 1;
        }
        if d > 0 {
            if !self.slices[d - 1].is_dense() {
                return None;
            }
            d -= 1;
        }
        if self.slices[..d].iter().any(|s| s.count() != 1) {
            return None;
        }

        let start = self.offset_of(&vec![0; self.rank()]);
        Some(start..start + self.total)
    }

    fn offset_of(&self, counters: &[u64]) -> u64 {
        izip!(&self.slices, counters, &self.dim_strides)
            .map(|(slice, &i, &stride)| slice.index(i) * stride)
            .sum()
    }

    fn advance(&mut self) {
        for d in (0..self.counters.len()).rev() {
            self.counters[d] += 1;
            if self.counters[d] < self.slices[d].count() {
                return;
            }
            self.counters[d] = 0;
        }
    }
}

impl Iterator for Odometer {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let offset = self.offset_of(&self.counters);
        self.remaining -= 1;
        self.advance();
        Some(offset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use rstest::rstest;

    use super::*;

    #[test]
    fn scalar_yields_zero() {
        let odometer = Odometer::new(&[], &[]).unwrap();
        assert_eq!(odometer.total(), 1);
        assert_eq!(odometer.contiguous_run(), Some(0..1));
        assert_eq!(odometer.collect_vec(), vec![0]);
    }

    #[test]
    fn whole_variable_is_row_major() {
        let odometer = Odometer::new(&[2, 3], &[]).unwrap();
        assert_eq!(odometer.contiguous_run(), Some(0..6));
        assert_eq!(odometer.collect_vec(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn strided_two_dimensional() {
        let slices = [Slice::from_bounds(0, 2, 2).unwrap(), Slice::new(1, 2, 1).unwrap()];
        let mut odometer = Odometer::new(&[3, 4], &slices).unwrap();
        assert_eq!(odometer.total(), 4);
        assert_eq!(odometer.contiguous_run(), None);
        assert_eq!(odometer.indices(), vec![0, 1]);
        assert_eq!(odometer.next(), Some(1));
        assert_eq!(odometer.indices(), vec![0, 2]);
        assert_eq!(odometer.collect_vec(), vec![2, 9, 10]);
    }

    #[rstest]
    #[case(&[10], &[Slice::new(1, 3, 1).unwrap()], Some(1..4))]
    #[case(&[10], &[Slice::new(1, 3, 2).unwrap()], None)]
    #[case(&[3, 4], &[Slice::new(1, 2, 1).unwrap(), Slice::whole(4)], Some(4..12))]
    #[case(&[3, 4], &[Slice::single(2), Slice::new(1, 2, 1).unwrap()], Some(9..11))]
    #[case(&[3, 4], &[Slice::new(0, 2, 1).unwrap(), Slice::new(1, 2, 1).unwrap()], None)]
    #[case(&[2, 3, 4], &[Slice::single(1), Slice::whole(3), Slice::whole(4)], Some(12..24))]
    #[case(&[5], &[Slice::new(2, 0, 1).unwrap()], Some(0..0))]
    fn contiguity(
        #[case] dims: &[u64],
        #[case] slices: &[Slice],
        #[case] expected: Option<Range<u64>>,
    ) {
        let odometer = Odometer::new(dims, slices).unwrap();
        if let Some(run) = &expected {
            let offsets = odometer.clone().collect_vec();
            assert_eq!(offsets, run.clone().collect_vec());
        }
        assert_eq!(odometer.contiguous_run(), expected);
    }

    #[test]
    fn rejects_bad_selection() {
        assert!(Odometer::new(&[4], &[Slice::whole(4), Slice::whole(1)]).is_err());
        assert!(Odometer::new(&[4], &[Slice::new(2, 3, 1).unwrap()]).is_err());
        assert!(Odometer::new(&[u64::MAX, 4], &[]).is_err());
    }
}
