use dap4_error::{Dap4Result, dap4_bail};

use crate::cursor::{Handle, StructureCursor};

/// A cursor over one sequence instance.
///
/// The number of records is read from the data, so it can differ between instances of the same
/// sequence.
#[derive(Debug, Clone, Copy)]
pub struct SequenceCursor<'a>(pub(crate) Handle<'a>);

impl<'a> SequenceCursor<'a> {
    pub fn record_count(&self) -> usize {
        self.0.children().len()
    }

    /// The record at `index`.
    pub fn record(&self, index: usize) -> Dap4Result<StructureCursor<'a>> {
        let records = self.0.children();
        if index >= records.len() {
            dap4_bail!(OutOfBounds: index, 0, records.len());
        }
        Ok(StructureCursor(self.0.child(records[index])))
    }

    pub fn records(&self) -> impl Iterator<Item = StructureCursor<'a>> + use<'a> {
        let handle = self.0;
        handle
            .children()
            .iter()
            .map(move |&id| StructureCursor(handle.child(id)))
    }
}

#[cfg(test)]
mod tests {
    use dap4_buffer::DataWriter;
    use dap4_dmr::{Dataset, Group, Variable};
    use dap4_dtype::{AtomicType, ByteOrder, Value};
    use dap4_error::ErrorCategory;

    use crate::{ChecksumMode, CompileOptions, compile};

    #[test]
    fn record_count_comes_from_the_data() {
        let ds = Dataset::new(
            "test",
            Group::new("/")
                .with_variable(Variable::sequence(
                    "obs",
                    [
                        Variable::atomic("id", AtomicType::Int16, []),
                        Variable::atomic("name", AtomicType::String, []),
                    ],
                    [],
                ))
                .with_variable(Variable::atomic("after", AtomicType::Char, [])),
        );
        let mut writer = DataWriter::new(ByteOrder::BigEndian);
        writer.put_count(3);
        for (id, name) in [(1i16, "a"), (2, "bb"), (3, "")] {
            writer.put(id).put_str(name);
        }
        writer.put_char(b'!');
        let options = CompileOptions::default().with_checksum_mode(ChecksumMode::None);
        let data = compile(&ds, writer.finish(), &options).unwrap();

        let obs = data.variable("obs").unwrap().as_sequence().unwrap();
        assert_eq!(obs.record_count(), 3);
        let second = obs.record(1).unwrap();
        assert_eq!(
            second.field("name").unwrap().as_atomic().unwrap().read(0).unwrap(),
            Value::from("bb")
        );
        let ids = obs
            .records()
            .map(|r| r.field("id").unwrap().as_atomic().unwrap().read(0).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![Value::Int16(1), Value::Int16(2), Value::Int16(3)]);

        assert_eq!(obs.record(3).unwrap_err().category(), ErrorCategory::Access);
        assert_eq!(
            data.variable("after").unwrap().as_atomic().unwrap().read(0).unwrap(),
            Value::Char(b'!')
        );
    }

    #[test]
    fn empty_sequence() {
        let ds = Dataset::new(
            "test",
            Group::new("/").with_variable(Variable::sequence(
                "obs",
                [Variable::atomic("id", AtomicType::Int16, [])],
                [],
            )),
        );
        let mut writer = DataWriter::new(ByteOrder::LittleEndian);
        writer.put_count(0);
        let options = CompileOptions::default().with_checksum_mode(ChecksumMode::None);
        let data = compile(&ds, writer.finish(), &options).unwrap();
        let obs = data.variable("obs").unwrap().as_sequence().unwrap();
        assert_eq!(obs.record_count(), 0);
        assert_eq!(obs.records().count(), 0);
    }
}
