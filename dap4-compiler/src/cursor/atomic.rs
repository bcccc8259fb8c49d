use bytes::Bytes;
use dap4_buffer::COUNT_SIZE;
use dap4_dtype::{AtomicType, DapType, Value, Vector};
use dap4_error::{Dap4Result, dap4_err};
use dap4_slice::{Odometer, Slice};

use crate::cursor::Handle;
use crate::node::{AtomicLayout, Elements, NodeKind};

/// A cursor over the elements of an atomic variable.
///
/// Elements are addressed by their row-major linear index, or selected with one [`Slice`] per
/// dimension.
#[derive(Debug, Clone, Copy)]
pub struct AtomicCursor<'a>(pub(crate) Handle<'a>);

impl<'a> AtomicCursor<'a> {
    fn layout(&self) -> Dap4Result<&'a AtomicLayout> {
        match &self.0.node().kind {
            NodeKind::Atomic(layout) => Ok(layout),
            _ => Err(dap4_err!(
                "{} is not an atomic variable",
                self.0.template().name()
            )),
        }
    }

    /// The declared type, which may be an enumeration.
    pub fn dtype(&self) -> Option<&'a DapType> {
        self.0.template().base_type()
    }

    /// The primitive type elements are serialized as.
    pub fn atomic_type(&self) -> Dap4Result<AtomicType> {
        Ok(self.layout()?.atype)
    }

    /// The number of elements: the product of the dimension sizes.
    pub fn element_count(&self) -> Dap4Result<u64> {
        Ok(self.layout()?.count)
    }

    /// The start of each element's length prefix, for variable-length types.
    ///
    /// Empty for fixed-width types.
    pub fn offsets(&self) -> &'a [usize] {
        match self.layout().map(|layout| &layout.elements) {
            Ok(Elements::Variable(offsets)) => offsets,
            _ => &[],
        }
    }

    /// Read the element at a row-major linear index.
    pub fn read(&self, index: u64) -> Dap4Result<Value> {
        let layout = self.layout()?;
        if index >= layout.count {
            return Err(dap4_err!(
                OutOfBounds: usize::try_from(index).unwrap_or(usize::MAX),
                0,
                usize::try_from(layout.count).unwrap_or(usize::MAX)
            ));
        }
        let buffer = self.0.data.buffer();
        // The index is below the element count, which was checked to fit the buffer.
        let index = usize::try_from(index)
            .map_err(|_| dap4_err!(Layout: "element {} is out of address range", index))?;

        match &layout.elements {
            Elements::Fixed { offset, width } => {
                let start = offset + index * width;
                let bytes = buffer.slice_ref(start..start + width)?;
                Value::decode_fixed(layout.atype, bytes, buffer.order())
            }
            Elements::Variable(offsets) => {
                let prefix = offsets[index];
                let len = usize::try_from(buffer.read_count(prefix)?)
                    .map_err(|_| dap4_err!(Layout: "value at {} is too large", prefix))?;
                let start = prefix + COUNT_SIZE;
                let bytes = buffer.slice(start..start + len)?;
                variable_value(layout.atype, bytes)
            }
        }
    }

    /// Read the elements selected by `slices`, one slice per dimension.
    ///
    /// An empty slice list selects every element. A selection that is a single run of adjacent
    /// fixed-width elements is decoded in one pass, anything else element by element.
    pub fn read_slices(&self, slices: &[Slice]) -> Dap4Result<Vector> {
        let layout = self.layout()?;
        let odometer = Odometer::new(&self.0.template().dim_sizes(), slices)?;
        if let (Elements::Fixed { offset, width }, Some(run)) =
            (&layout.elements, odometer.contiguous_run())
        {
            let buffer = self.0.data.buffer();
            let start = to_offset(run.start, *width, *offset)?;
            let end = to_offset(run.end, *width, *offset)?;
            return Vector::decode_fixed(
                layout.atype,
                buffer.slice_ref(start..end)?,
                buffer.order(),
            );
        }
        self.collect(layout, odometer)
    }

    /// Read the elements selected by `slices` one at a time.
    ///
    /// Always yields the same result as [`AtomicCursor::read_slices`].
    pub fn read_each(&self, slices: &[Slice]) -> Dap4Result<Vector> {
        let layout = self.layout()?;
        let odometer = Odometer::new(&self.0.template().dim_sizes(), slices)?;
        self.collect(layout, odometer)
    }

    /// Read every element.
    pub fn read_all(&self) -> Dap4Result<Vector> {
        self.read_slices(&[])
    }

    /// Read the elements selected by `slices`, converted to `dst`.
    pub fn read_as(&self, slices: &[Slice], dst: AtomicType) -> Dap4Result<Vector> {
        self.read_slices(slices)?.convert(dst)
    }

    fn collect(&self, layout: &AtomicLayout, odometer: Odometer) -> Dap4Result<Vector> {
        let capacity = usize::try_from(odometer.total())
            .map_err(|_| dap4_err!("selection of {} elements is too large", odometer.total()))?;
        let mut vector = Vector::with_capacity(layout.atype, capacity);
        for index in odometer {
            vector.push(self.read(index)?)?;
        }
        Ok(vector)
    }
}

fn to_offset(index: u64, width: usize, base: usize) -> Dap4Result<usize> {
    usize::try_from(index)
        .ok()
        .and_then(|index| index.checked_mul(width))
        .and_then(|len| len.checked_add(base))
        .ok_or_else(|| dap4_err!(Layout: "element {} is out of address range", index))
}

fn variable_value(atype: AtomicType, bytes: Bytes) -> Dap4Result<Value> {
    match atype {
        AtomicType::String => Ok(Value::String(std::str::from_utf8(&bytes)?.to_string())),
        AtomicType::Url => Ok(Value::Url(std::str::from_utf8(&bytes)?.to_string())),
        AtomicType::Opaque => Ok(Value::Opaque(bytes)),
        other => Err(dap4_err!(Conversion: "{} is not a variable length type", other)),
    }
}
