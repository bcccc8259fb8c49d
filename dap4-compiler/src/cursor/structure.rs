use dap4_dmr::Field;
use dap4_error::{Dap4Result, dap4_bail, dap4_err};

use crate::cursor::{Cursor, Handle};

/// A cursor over one structure instance, or one record of a sequence.
#[derive(Debug, Clone, Copy)]
pub struct StructureCursor<'a>(pub(crate) Handle<'a>);

impl<'a> StructureCursor<'a> {
    /// The number of fields.
    pub fn field_count(&self) -> usize {
        self.0.children().len()
    }

    /// Select a field by name or position.
    pub fn field(&self, field: impl Into<Field>) -> Dap4Result<Cursor<'a>> {
        let template = self.0.template();
        let field = field.into();
        let idx = match &field {
            Field::Index(idx) => {
                if *idx >= self.field_count() {
                    dap4_bail!(OutOfBounds: *idx, 0, self.field_count());
                }
                *idx
            }
            Field::Name(_) => template
                .field(&field)
                .map(|(idx, _)| idx)
                .ok_or_else(|| dap4_err!(Lookup: "{} has no field {}", template.name(), field))?,
        };
        Ok(self.0.cursor(self.0.children()[idx]))
    }

    /// Every field, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = Cursor<'a>> + use<'a> {
        let handle = self.0;
        handle.children().iter().map(move |&id| handle.cursor(id))
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
    fn fields_are_packed_in_order() {
        let ds = Dataset::new(
            "test",
            Group::new("/").with_variable(Variable::structure(
                "s",
                [
                    Variable::atomic("i", AtomicType::Int32, []),
                    Variable::atomic("d", AtomicType::Float64, []),
                ],
                [],
            )),
        );
        let mut writer = DataWriter::new(ByteOrder::LittleEndian);
        writer.put(7i32).put(2.5f64);
        let options = CompileOptions::default().with_checksum_mode(ChecksumMode::None);
        let data = compile(&ds, writer.finish(), &options).unwrap();

        let s = data.variable("s").unwrap().as_structure().unwrap();
        assert_eq!(s.field_count(), 2);
        let d = s.field("d").unwrap();
        assert_eq!(d.byte_range(), 4..12);
        assert_eq!(d.as_atomic().unwrap().read(0).unwrap(), Value::Float64(2.5));
        assert_eq!(
            s.field(0usize).unwrap().as_atomic().unwrap().read(0).unwrap(),
            Value::Int32(7)
        );
        assert_eq!(
            s.fields().map(|f| f.template().name()).collect::<Vec<_>>(),
            vec!["i", "d"]
        );

        assert_eq!(s.field("x").unwrap_err().category(), ErrorCategory::Access);
        assert!(matches!(
            s.field(2usize),
            Err(dap4_error::Dap4Error::OutOfBounds(2, 0, 2, _))
        ));
    }
}
