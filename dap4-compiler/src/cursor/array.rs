use dap4_error::{Dap4Result, dap4_bail, dap4_err};
use itertools::{Itertools, izip};

use crate::cursor::{Cursor, Handle};

/// A cursor over an array of structures or sequences.
///
/// Elements are stored row-major, one complete instance after another.
#[derive(Debug, Clone, Copy)]
pub struct ArrayCursor<'a>(pub(crate) Handle<'a>);

impl<'a> ArrayCursor<'a> {
    /// The number of elements: the product of the dimension sizes.
    pub fn len(&self) -> usize {
        self.0.children().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.children().is_empty()
    }

    /// The element at a row-major linear index.
    pub fn element(&self, index: usize) -> Dap4Result<Cursor<'a>> {
        let elements = self.0.children();
        if index >= elements.len() {
            dap4_bail!(OutOfBounds: index, 0, elements.len());
        }
        Ok(self.0.cursor(elements[index]))
    }

    /// The element at one index per dimension.
    pub fn element_at(&self, indices: &[u64]) -> Dap4Result<Cursor<'a>> {
        let template = self.0.template();
        let dims = template.dim_sizes();
        if indices.len() != dims.len() {
            dap4_bail!(
                "{} has {} dimensions, got indices [{}]",
                template.name(),
                dims.len(),
                indices.iter().format(", ")
            );
        }

        let mut linear = 0u64;
        for (&index, &size) in izip!(indices, &dims) {
            if index >= size {
                dap4_bail!(
                    OutOfBounds: usize::try_from(index).unwrap_or(usize::MAX),
                    0,
                    usize::try_from(size).unwrap_or(usize::MAX)
                );
            }
            // The product of the dimension sizes was checked when compiling.
            linear = linear * size + index;
        }
        let linear = usize::try_from(linear)
            .map_err(|_| dap4_err!(OutOfBounds: usize::MAX, 0, self.len()))?;
        self.element(linear)
    }

    /// Every element, row-major.
    pub fn elements(&self) -> impl Iterator<Item = Cursor<'a>> + use<'a> {
        let handle = self.0;
        handle.children().iter().map(move |&id| handle.cursor(id))
    }
}

#[cfg(test)]
mod tests {
    use dap4_buffer::DataWriter;
    use dap4_dmr::{Dataset, Dimension, Group, Variable};
    use dap4_dtype::{AtomicType, ByteOrder, Value};
    use dap4_error::ErrorCategory;

    use crate::{ChecksumMode, CompileOptions, Scheme, compile};

    #[test]
    fn structure_array() {
        let ds = Dataset::new(
            "test",
            Group::new("/").with_variable(Variable::structure(
                "points",
                [
                    Variable::atomic("x", AtomicType::Int8, []),
                    Variable::atomic("y", AtomicType::Int8, []),
                ],
                [Dimension::new("r", 2), Dimension::new("c", 3)],
            )),
        );
        let mut writer = DataWriter::new(ByteOrder::LittleEndian);
        for v in 0..6i8 {
            writer.put(v).put(-v);
        }
        let options = CompileOptions::default().with_checksum_mode(ChecksumMode::None);
        let data = compile(&ds, writer.finish(), &options).unwrap();

        let points = data.variable("points").unwrap();
        assert_eq!(points.scheme(), Scheme::StructArray);
        let points = points.as_array().unwrap();
        assert_eq!(points.len(), 6);

        let p = points.element_at(&[1, 2]).unwrap();
        assert_eq!(p.scheme(), Scheme::Structure);
        assert_eq!(p.byte_range(), 10..12);
        let y = p.as_structure().unwrap().field("y").unwrap();
        assert_eq!(y.as_atomic().unwrap().read(0).unwrap(), Value::Int8(-5));

        assert_eq!(points.elements().count(), 6);
        assert_eq!(points.element(6).unwrap_err().category(), ErrorCategory::Access);
        assert_eq!(
            points.element_at(&[2, 0]).unwrap_err().category(),
            ErrorCategory::Access
        );
        assert!(points.element_at(&[1]).is_err());
    }

    #[test]
    fn sequence_array_instances_have_their_own_counts() {
        let ds = Dataset::new(
            "test",
            Group::new("/").with_variable(Variable::sequence(
                "tracks",
                [Variable::atomic("v", AtomicType::UInt16, [])],
                [Dimension::anonymous(2)],
            )),
        );
        let mut writer = DataWriter::new(ByteOrder::BigEndian);
        writer.put_count(2).put(1u16).put(2u16).put_count(1).put(3u16);
        let options = CompileOptions::default().with_checksum_mode(ChecksumMode::None);
        let data = compile(&ds, writer.finish(), &options).unwrap();

        let tracks = data.variable("tracks").unwrap();
        assert_eq!(tracks.scheme(), Scheme::SeqArray);
        let counts = tracks
            .as_array()
            .unwrap()
            .elements()
            .map(|e| e.as_sequence().unwrap().record_count())
            .collect::<Vec<_>>();
        assert_eq!(counts, vec![2, 1]);
    }
}
