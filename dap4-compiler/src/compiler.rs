use dap4_buffer::{BufferCursor, CHECKSUM_SIZE, COUNT_SIZE, Checksum, DataBuffer};
use dap4_dmr::{Dataset, Sort, Variable};
use dap4_dtype::TypeSize;
use dap4_error::{Dap4Result, dap4_bail, dap4_err};

use crate::node::{AtomicLayout, Elements, Node, NodeId, NodeKind};
use crate::{CompileOptions, CompiledData};

/// Compiles data responses for one dataset.
///
/// Compiling walks the top-level variables of the dataset in serialization order and records
/// where every instance of every variable lives in the buffer. No values are decoded: the
/// resulting [`CompiledData`] hands out cursors that decode on demand.
#[derive(Debug, Clone)]
pub struct DataCompiler<'a> {
    dataset: &'a Dataset,
    options: CompileOptions,
}

impl<'a> DataCompiler<'a> {
    pub fn new(dataset: &'a Dataset, options: CompileOptions) -> Self {
        Self { dataset, options }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile a data buffer. The buffer must hold the data of exactly one response.
    pub fn compile(&self, buffer: DataBuffer) -> Dap4Result<CompiledData<'a>> {
        let variables = self.dataset.top_variables();
        let mut arena = Arena::default();
        let mut roots = Vec::with_capacity(variables.len());
        let mut checksums = Vec::with_capacity(variables.len());

        let mut cursor = BufferCursor::new(&buffer);
        for variable in variables {
            let start = cursor.position();
            let id = arena
                .compile_variable(variable, None, &mut cursor)
                .map_err(|e| {
                    e.with_context(format!("compiling {} at offset {}", variable.name(), start))
                })?;
            roots.push(id);
            checksums.push(self.read_checksum(variable, start, &mut cursor)?);
            log::trace!(
                "compiled {} over bytes {}..{}",
                variable.name(),
                start,
                cursor.position()
            );
        }

        if !cursor.is_at_end() && self.options.warn_on_trailing_bytes() {
            log::warn!(
                "{} trailing bytes after the last variable of {}",
                cursor.remaining(),
                self.dataset.name()
            );
        }
        log::debug!(
            "compiled {} variables into {} nodes from {} bytes",
            roots.len(),
            arena.nodes.len(),
            buffer.len()
        );

        Ok(CompiledData::new(
            self.dataset,
            buffer,
            arena.nodes,
            roots,
            checksums,
        ))
    }

    /// Consume the checksum after a top-level variable whose data began at `start`.
    fn read_checksum(
        &self,
        variable: &Variable,
        start: usize,
        cursor: &mut BufferCursor,
    ) -> Dap4Result<Option<Checksum>> {
        if !self.options.reads_checksums() {
            return Ok(None);
        }

        let end = cursor.position();
        let raw = cursor.take(CHECKSUM_SIZE).map_err(|e| {
            e.with_context(format!(
                "missing checksum for {} at offset {}",
                variable.name(),
                end
            ))
        })?;
        let stored = Checksum::decode(raw, cursor.buffer().order());

        if self.options.verify_checksums() {
            let computed = Checksum::compute(cursor.buffer().slice_ref(start..end)?);
            if computed != stored {
                dap4_bail!(
                    Checksum: "{} stores {} but its data hashes to {}",
                    variable.name(),
                    stored,
                    computed
                );
            }
        }
        Ok(Some(stored))
    }
}

/// Compile `buffer` against `dataset` with the given options.
pub fn compile<'a>(
    dataset: &'a Dataset,
    buffer: DataBuffer,
    options: &CompileOptions,
) -> Dap4Result<CompiledData<'a>> {
    DataCompiler::new(dataset, options.clone()).compile(buffer)
}

#[derive(Default)]
struct Arena<'a> {
    nodes: Vec<Node<'a>>,
}

impl<'a> Arena<'a> {
    fn push(
        &mut self,
        template: &'a Variable,
        container: Option<NodeId>,
        start: usize,
        kind: NodeKind,
    ) -> NodeId {
        self.nodes.push(Node {
            template,
            container,
            byte_range: start..start,
            kind,
        });
        self.nodes.len() - 1
    }

    /// Fill in a node pushed before its children were compiled.
    fn complete(&mut self, id: NodeId, end: usize, kind: NodeKind) {
        let node = &mut self.nodes[id];
        node.byte_range.end = end;
        node.kind = kind;
    }

    fn compile_variable(
        &mut self,
        variable: &'a Variable,
        container: Option<NodeId>,
        cursor: &mut BufferCursor,
    ) -> Dap4Result<NodeId> {
        match (variable.sort(), variable.is_scalar()) {
            (Sort::Atomic, _) => self.compile_atomic(variable, container, cursor),
            (Sort::Structure, true) => self.compile_structure(variable, container, cursor),
            (Sort::Sequence, true) => self.compile_sequence(variable, container, cursor),
            (Sort::Structure, false) | (Sort::Sequence, false) => {
                self.compile_array(variable, container, cursor)
            }
        }
    }

    fn compile_atomic(
        &mut self,
        variable: &'a Variable,
        container: Option<NodeId>,
        cursor: &mut BufferCursor,
    ) -> Dap4Result<NodeId> {
        let dtype = variable
            .base_type()
            .ok_or_else(|| dap4_err!(Layout: "atomic variable {} has no type", variable.name()))?;
        let atype = dtype.primitive();
        let count = variable.element_count()?;
        let start = cursor.position();

        let elements = match atype.serial_size() {
            TypeSize::Fixed(width) => {
                let len = count
                    .checked_mul(width as u64)
                    .and_then(|len| usize::try_from(len).ok())
                    .ok_or_else(|| {
                        dap4_err!(Layout: "{} values of {} do not fit in memory", count, atype)
                    })?;
                cursor.skip(len)?;
                Elements::Fixed {
                    offset: start,
                    width,
                }
            }
            TypeSize::Variable => {
                let mut scan = *cursor;
                let mut offsets = Vec::with_capacity(capacity_hint(count, scan.remaining()));
                for _ in 0..count {
                    offsets.push(scan.position());
                    let len = scan.read_count()?;
                    let len = usize::try_from(len)
                        .map_err(|_| dap4_err!(Layout: "{} byte value is too large", len))?;
                    scan.skip(len)?;
                }
                cursor.advance_to(scan.position())?;
                Elements::Variable(offsets)
            }
        };

        let id = self.push(
            variable,
            container,
            start,
            NodeKind::Atomic(AtomicLayout {
                atype,
                count,
                elements,
            }),
        );
        self.nodes[id].byte_range.end = cursor.position();
        Ok(id)
    }

    fn compile_structure(
        &mut self,
        variable: &'a Variable,
        container: Option<NodeId>,
        cursor: &mut BufferCursor,
    ) -> Dap4Result<NodeId> {
        let id = self.push(
            variable,
            container,
            cursor.position(),
            NodeKind::Structure(Vec::new()),
        );
        let fields = self.compile_fields(variable, id, cursor)?;
        self.complete(id, cursor.position(), NodeKind::Structure(fields));
        Ok(id)
    }

    fn compile_sequence(
        &mut self,
        variable: &'a Variable,
        container: Option<NodeId>,
        cursor: &mut BufferCursor,
    ) -> Dap4Result<NodeId> {
        let start = cursor.position();
        let id = self.push(variable, container, start, NodeKind::Sequence(Vec::new()));

        let count = cursor.read_count()?;
        let record_size = variable.fields().iter().try_fold(0u64, |acc, field| {
            acc.checked_add(field.min_serial_size()?)
                .ok_or_else(|| dap4_err!(Layout: "record size of {} overflows", variable.name()))
        })?;
        // A record with no bytes still costs a node, so it is charged one byte.
        let needed = count.checked_mul(record_size.max(1));
        if needed.is_none_or(|needed| needed > cursor.remaining() as u64) {
            dap4_bail!(
                Layout: "sequence {} at offset {} claims {} records, only {} bytes remain",
                variable.name(),
                start,
                count,
                cursor.remaining()
            );
        }

        let mut records = Vec::with_capacity(capacity_hint(count, cursor.remaining()));
        for _ in 0..count {
            let record = self.push(
                variable,
                Some(id),
                cursor.position(),
                NodeKind::Record(Vec::new()),
            );
            let fields = self.compile_fields(variable, record, cursor)?;
            self.complete(record, cursor.position(), NodeKind::Record(fields));
            records.push(record);
        }

        self.complete(id, cursor.position(), NodeKind::Sequence(records));
        Ok(id)
    }

    fn compile_array(
        &mut self,
        variable: &'a Variable,
        container: Option<NodeId>,
        cursor: &mut BufferCursor,
    ) -> Dap4Result<NodeId> {
        let count = variable.element_count()?;
        let structures = variable.sort() == Sort::Structure;
        let kind = |elements| {
            if structures {
                NodeKind::StructArray(elements)
            } else {
                NodeKind::SeqArray(elements)
            }
        };

        let id = self.push(variable, container, cursor.position(), kind(Vec::new()));
        let mut elements = Vec::with_capacity(capacity_hint(count, cursor.remaining()));
        for _ in 0..count {
            let element = if structures {
                self.compile_structure(variable, Some(id), cursor)?
            } else {
                self.compile_sequence(variable, Some(id), cursor)?
            };
            elements.push(element);
        }
        self.complete(id, cursor.position(), kind(elements));
        Ok(id)
    }

    fn compile_fields(
        &mut self,
        variable: &'a Variable,
        container: NodeId,
        cursor: &mut BufferCursor,
    ) -> Dap4Result<Vec<NodeId>> {
        variable
            .fields()
            .iter()
            .map(|field| {
                let start = cursor.position();
                self.compile_variable(field, Some(container), cursor)
                    .map_err(|e| {
                        e.with_context(format!(
                            "compiling field {} at offset {}",
                            field.name(),
                            start
                        ))
                    })
            })
            .collect()
    }
}

/// Bound a preallocation by what the remaining bytes could possibly hold.
fn capacity_hint(count: u64, remaining: usize) -> usize {
    usize::try_from(count)
        .unwrap_or(usize::MAX)
        .min(remaining / COUNT_SIZE + 1)
}

#[cfg(test)]
mod tests {
    use dap4_buffer::DataWriter;
    use dap4_dmr::{Dimension, Group};
    use dap4_dtype::{AtomicType, ByteOrder};
    use std::ops::Range;

    use dap4_error::ErrorCategory;
    use rstest::rstest;

    use super::*;
    use crate::{ChecksumMode, Cursor};

    fn dataset(variables: impl IntoIterator<Item = Variable>) -> Dataset {
        let root = variables
            .into_iter()
            .fold(Group::new("/"), |group, v| group.with_variable(v));
        Dataset::new("test", root)
    }

    fn no_checksums() -> CompileOptions {
        CompileOptions::default().with_checksum_mode(ChecksumMode::None)
    }

    #[test]
    fn fixed_width_layout() {
        let ds = dataset([
            Variable::atomic("a", AtomicType::Int32, [Dimension::new("n", 3)]),
            Variable::atomic("b", AtomicType::Char, []),
        ]);
        let mut writer = DataWriter::new(ByteOrder::LittleEndian);
        writer.put(1i32).put(2i32).put(3i32).put_char(b'x');

        let data = compile(&ds, writer.finish(), &no_checksums()).unwrap();
        let a = data.variable("a").unwrap();
        let b = data.variable("b").unwrap();
        assert_eq!(a.byte_range(), 0..12);
        assert_eq!(b.byte_range(), 12..13);
    }

    #[test]
    fn variable_width_prescan() {
        let ds = dataset([
            Variable::atomic("s", AtomicType::String, [Dimension::anonymous(2)]),
            Variable::atomic("after", AtomicType::UInt8, []),
        ]);
        let mut writer = DataWriter::new(ByteOrder::BigEndian);
        writer.put_str("ab").put_str("").put(7u8);

        let data = compile(&ds, writer.finish(), &no_checksums()).unwrap();
        let s = data.variable("s").unwrap().as_atomic().unwrap();
        assert_eq!(s.offsets(), &[0, 10]);
        assert_eq!(data.variable("after").unwrap().byte_range(), 18..19);
    }

    #[test]
    fn zero_length_strings_consume_nothing() {
        let ds = dataset([
            Variable::atomic("s", AtomicType::String, [Dimension::new("n", 0)]),
            Variable::atomic("after", AtomicType::UInt8, []),
        ]);
        let mut writer = DataWriter::new(ByteOrder::BigEndian);
        writer.put(7u8);

        let data = compile(&ds, writer.finish(), &no_checksums()).unwrap();
        let s = data.variable("s").unwrap();
        assert_eq!(s.byte_range(), 0..0);
        assert!(s.as_atomic().unwrap().offsets().is_empty());
        assert_eq!(data.variable("after").unwrap().byte_range(), 0..1);
    }

    fn leaf_ranges(cursor: Cursor<'_>) -> Vec<Range<usize>> {
        if let Some(structure) = cursor.as_structure() {
            return structure.fields().map(|f| f.byte_range()).collect();
        }
        match cursor.as_sequence() {
            Some(sequence) => sequence
                .records()
                .flat_map(|r| r.fields())
                .map(|f| f.byte_range())
                .collect(),
            None => unreachable!("{cursor} is not a structure or sequence"),
        }
    }

    #[rstest]
    #[case::structure(Sort::Structure)]
    #[case::sequence(Sort::Sequence)]
    fn scalar_lays_out_like_a_single_element_array(#[case] sort: Sort) {
        let variable = |dimensions: Vec<Dimension>| match sort {
            Sort::Structure => Variable::structure(
                "v",
                [
                    Variable::atomic("i", AtomicType::Int32, []),
                    Variable::atomic("d", AtomicType::Float64, []),
                ],
                dimensions,
            ),
            _ => Variable::sequence(
                "v",
                [Variable::atomic("x", AtomicType::Int16, [])],
                dimensions,
            ),
        };
        let mut writer = DataWriter::new(ByteOrder::BigEndian);
        match sort {
            Sort::Structure => writer.put(7i32).put(0.5f64),
            _ => writer.put_count(2).put(1i16).put(2i16),
        };
        let buffer = writer.finish();

        let scalar_ds = dataset([variable(vec![])]);
        let array_ds = dataset([variable(vec![Dimension::anonymous(1)])]);
        let scalar_data = compile(&scalar_ds, buffer.clone(), &no_checksums()).unwrap();
        let array_data = compile(&array_ds, buffer, &no_checksums()).unwrap();

        let scalar = scalar_data.variable("v").unwrap();
        let array = array_data.variable("v").unwrap();
        let element = array.as_array().unwrap().element(0).unwrap();
        assert_eq!(element.scheme(), scalar.scheme());
        assert_eq!(scalar.byte_range(), 0..12);
        assert_eq!(element.byte_range(), scalar.byte_range());
        assert_eq!(array.byte_range(), scalar.byte_range());
        assert_eq!(leaf_ranges(element), leaf_ranges(scalar));
    }

    #[test]
    fn truncated_fixed_width_is_a_layout_fault() {
        let ds = dataset([Variable::atomic(
            "a",
            AtomicType::Float64,
            [Dimension::anonymous(2)],
        )]);
        let buffer = DataBuffer::new(vec![0u8; 12], ByteOrder::LittleEndian);
        let err = compile(&ds, buffer, &no_checksums()).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Layout);
        assert!(err.to_string().contains("compiling a at offset 0"));
    }

    #[test]
    fn absurd_sequence_count_is_a_layout_fault() {
        let ds = dataset([Variable::sequence(
            "seq",
            [Variable::atomic("x", AtomicType::Int32, [])],
            [],
        )]);
        let mut writer = DataWriter::new(ByteOrder::LittleEndian);
        writer.put_count(1 << 40).put(1i32);
        let err = compile(&ds, writer.finish(), &no_checksums()).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Layout);
    }

    #[test]
    fn empty_records_are_bounded_by_remaining_bytes() {
        let ds = dataset([Variable::sequence(
            "s",
            [Variable::atomic(
                "x",
                AtomicType::Int32,
                [Dimension::anonymous(0)],
            )],
            [],
        )]);
        let mut writer = DataWriter::new(ByteOrder::LittleEndian);
        writer.put_count(u64::MAX);
        let err = compile(&ds, writer.finish(), &no_checksums()).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Layout);
        assert!(err.to_string().contains("claims 18446744073709551615 records"));

        let mut writer = DataWriter::new(ByteOrder::LittleEndian);
        writer.put_count(2).put(9u8).put(9u8);
        let data = compile(&ds, writer.finish(), &no_checksums()).unwrap();
        let s = data.variable("s").unwrap();
        assert_eq!(s.as_sequence().unwrap().record_count(), 2);
        assert_eq!(s.byte_range(), 0..8);
    }

    #[test]
    fn missing_checksum_is_a_layout_fault() {
        let ds = dataset([Variable::atomic("a", AtomicType::Int16, [])]);
        let mut writer = DataWriter::new(ByteOrder::LittleEndian);
        writer.put(5i16).put_raw(&[0, 0]);
        let err = compile(&ds, writer.finish(), &CompileOptions::default()).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Layout);
        assert!(err.to_string().contains("missing checksum for a"));
    }

    #[test]
    fn checksum_verification() {
        let ds = dataset([Variable::atomic("a", AtomicType::Int32, [])]);
        let options = CompileOptions::default().with_verify_checksums(true);

        let mut writer = DataWriter::new(ByteOrder::BigEndian);
        writer.put(42i32).put_checksum(0);
        let buffer = writer.finish();
        let data = compile(&ds, buffer.clone(), &options).unwrap();
        assert_eq!(
            data.checksum("a").unwrap(),
            Some(Checksum::compute(&42i32.to_be_bytes()))
        );

        let mut corrupt = buffer.as_slice().to_vec();
        corrupt[0] ^= 0xff;
        let err = compile(&ds, DataBuffer::new(corrupt, ByteOrder::BigEndian), &options)
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Layout);
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn suppressed_stream_checksums_are_not_read() {
        let ds = dataset([Variable::atomic("a", AtomicType::Int32, [])]);
        let mut writer = DataWriter::new(ByteOrder::BigEndian);
        writer.put(42i32);
        let options = CompileOptions::default().with_stream_checksums(false);
        let data = compile(&ds, writer.finish(), &options).unwrap();
        assert_eq!(data.checksum("a").unwrap(), None);
    }

    #[test]
    fn empty_dataset() {
        let ds = dataset([]);
        let data = compile(&ds, DataBuffer::empty(ByteOrder::BigEndian), &no_checksums()).unwrap();
        assert_eq!(data.len(), 0);
        assert!(data.is_empty());
    }
}
