use std::fmt::{Display, Formatter};
use std::io::Read;
use std::str::FromStr;

use dap4_error::{Dap4Error, Dap4Result, dap4_err};
use futures_util::{AsyncRead, AsyncReadExt};

/// The kind of response requested from a DAP4 server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RequestMode {
    /// Metadata only. The whole response is the DMR text, with no chunk framing.
    Dmr,
    /// Metadata and data, in chunked framing.
    #[default]
    Dap,
}

impl RequestMode {
    /// The file extension used to request this mode.
    pub fn extension(&self) -> &'static str {
        match self {
            RequestMode::Dmr => "dmr",
            RequestMode::Dap => "dap",
        }
    }
}

impl Display for RequestMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for RequestMode {
    type Err = Dap4Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dmr" => Ok(RequestMode::Dmr),
            "dap" => Ok(RequestMode::Dap),
            _ => Err(dap4_err!("unknown request mode {}", s)),
        }
    }
}

/// Decode DMR text: UTF-8, with line endings normalized and surrounding whitespace removed.
pub fn decode_dmr_text(bytes: &[u8]) -> Dap4Result<String> {
    let text = std::str::from_utf8(bytes)?;
    Ok(text.replace("\r\n", "\n").trim().to_string())
}

/// Read an unframed metadata-only response in full.
pub fn read_dmr_only<R: Read>(mut read: R) -> Dap4Result<String> {
    let mut bytes = Vec::new();
    read.read_to_end(&mut bytes)?;
    log::debug!("read {} byte metadata-only response", bytes.len());
    decode_dmr_text(&bytes)
}

/// Read an unframed metadata-only response in full from an async stream.
pub async fn read_dmr_only_async<R: AsyncRead + Unpin>(mut read: R) -> Dap4Result<String> {
    let mut bytes = Vec::new();
    read.read_to_end(&mut bytes).await?;
    log::debug!("read {} byte metadata-only response", bytes.len());
    decode_dmr_text(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes() {
        assert_eq!("DAP".parse::<RequestMode>().unwrap(), RequestMode::Dap);
        assert_eq!("dmr".parse::<RequestMode>().unwrap(), RequestMode::Dmr);
        assert!("dods".parse::<RequestMode>().is_err());
        assert_eq!(RequestMode::default().to_string(), "dap");
    }

    #[test]
    fn metadata_only() {
        let dmr = read_dmr_only(&b"  <Dataset>\r\n</Dataset>\r\n"[..]).unwrap();
        assert_eq!(dmr, "<Dataset>\n</Dataset>");
        assert!(read_dmr_only(&[0xff, 0xfe][..]).is_err());
    }

    #[tokio::test]
    async fn metadata_only_async() {
        let dmr = read_dmr_only_async(&b"<Dataset/>\n"[..]).await.unwrap();
        assert_eq!(dmr, "<Dataset/>");
    }
}
