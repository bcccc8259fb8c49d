use bytes::{Bytes, BytesMut};
use dap4_buffer::DataBuffer;
use dap4_dtype::ByteOrder;

/// A complete DAP4 response: the DMR text and the data that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dap4Response {
    dmr: String,
    data: DataBuffer,
    checksums: bool,
}

impl Dap4Response {
    /// Assemble a response.
    pub fn new(dmr: String, data: DataBuffer, checksums: bool) -> Self {
        Self {
            dmr,
            data,
            checksums,
        }
    }

    /// The DMR text.
    pub fn dmr(&self) -> &str {
        &self.dmr
    }

    /// The serialized data.
    pub fn data(&self) -> &DataBuffer {
        &self.data
    }

    /// The byte order of the data.
    pub fn order(&self) -> ByteOrder {
        self.data.order()
    }

    /// Whether the data carries checksums.
    pub fn checksums(&self) -> bool {
        self.checksums
    }

    /// Split into the DMR text and the data.
    pub fn into_parts(self) -> (String, DataBuffer) {
        (self.dmr, self.data)
    }
}

/// Join data chunk payloads, without copying when there is only one.
pub(crate) fn concat_payloads(mut payloads: Vec<Bytes>) -> Bytes {
    match payloads.len() {
        0 => Bytes::new(),
        1 => payloads.pop().unwrap_or_default(),
        _ => {
            let len = payloads.iter().map(Bytes::len).sum();
            let mut joined = BytesMut::with_capacity(len);
            for payload in payloads {
                joined.extend_from_slice(&payload);
            }
            joined.freeze()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat() {
        assert!(concat_payloads(vec![]).is_empty());

        let single = Bytes::from_static(b"abc");
        assert_eq!(concat_payloads(vec![single.clone()]).as_ptr(), single.as_ptr());

        let joined = concat_payloads(vec![Bytes::from_static(b"ab"), Bytes::from_static(b"c")]);
        assert_eq!(joined.as_ref(), b"abc");
    }
}
