use std::fmt::{Display, Formatter};
use std::str::FromStr;

use dap4_error::{Dap4Error, dap4_err};

/// Which parts of a response carry a CRC-32 checksum, as agreed with the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ChecksumMode {
    /// No checksums.
    None,
    /// Only the metadata carries checksums. The data has none.
    Dmr,
    /// Every top-level variable in the data is followed by a checksum.
    #[default]
    Dap,
    /// Both the metadata and the data carry checksums.
    All,
}

impl ChecksumMode {
    /// Whether top-level variables in the data are followed by a checksum.
    pub fn carries_data_checksums(&self) -> bool {
        matches!(self, ChecksumMode::Dap | ChecksumMode::All)
    }
}

impl Display for ChecksumMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ChecksumMode::None => write!(f, "none"),
            ChecksumMode::Dmr => write!(f, "dmr"),
            ChecksumMode::Dap => write!(f, "dap"),
            ChecksumMode::All => write!(f, "all"),
        }
    }
}

impl FromStr for ChecksumMode {
    type Err = Dap4Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "false" => Ok(ChecksumMode::None),
            "dmr" => Ok(ChecksumMode::Dmr),
            "dap" | "data" => Ok(ChecksumMode::Dap),
            "all" | "both" | "true" => Ok(ChecksumMode::All),
            other => Err(dap4_err!("unknown checksum mode {}", other)),
        }
    }
}

/// Options controlling how a data response is compiled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompileOptions {
    checksum_mode: ChecksumMode,
    stream_checksums: bool,
    verify_checksums: bool,
    warn_on_trailing_bytes: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            checksum_mode: ChecksumMode::default(),
            stream_checksums: true,
            verify_checksums: false,
            warn_on_trailing_bytes: true,
        }
    }
}

impl CompileOptions {
    /// Set the negotiated checksum mode.
    pub fn with_checksum_mode(mut self, mode: ChecksumMode) -> Self {
        self.checksum_mode = mode;
        self
    }

    /// Record whether the response stream carries checksums.
    ///
    /// A server can suppress checksums for one response through the chunk flags. This overrides
    /// the negotiated mode.
    pub fn with_stream_checksums(mut self, present: bool) -> Self {
        self.stream_checksums = present;
        self
    }

    /// Recompute the checksum of every top-level variable and compare it with the stored one.
    pub fn with_verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    /// Log a warning when bytes are left over after the last variable.
    pub fn with_warn_on_trailing_bytes(mut self, warn: bool) -> Self {
        self.warn_on_trailing_bytes = warn;
        self
    }

    /// The negotiated checksum mode.
    pub fn checksum_mode(&self) -> ChecksumMode {
        self.checksum_mode
    }

    /// Whether the compiler consumes a checksum after each top-level variable.
    pub fn reads_checksums(&self) -> bool {
        self.stream_checksums && self.checksum_mode.carries_data_checksums()
    }

    /// Whether stored checksums are verified.
    pub fn verify_checksums(&self) -> bool {
        self.verify_checksums
    }

    /// Whether leftover bytes are reported.
    pub fn warn_on_trailing_bytes(&self) -> bool {
        self.warn_on_trailing_bytes
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("none", ChecksumMode::None)]
    #[case("DMR", ChecksumMode::Dmr)]
    #[case("dap", ChecksumMode::Dap)]
    #[case("both", ChecksumMode::All)]
    #[case(" all ", ChecksumMode::All)]
    fn parse_mode(#[case] text: &str, #[case] mode: ChecksumMode) {
        assert_eq!(text.parse::<ChecksumMode>().unwrap(), mode);
    }

    #[test]
    fn parse_unknown_mode() {
        assert!("sometimes".parse::<ChecksumMode>().is_err());
    }

    #[test]
    fn reads_checksums() {
        let options = CompileOptions::default();
        assert!(options.reads_checksums());
        assert!(!options.clone().with_stream_checksums(false).reads_checksums());
        assert!(
            !options
                .with_checksum_mode(ChecksumMode::Dmr)
                .reads_checksums()
        );
        assert_eq!(ChecksumMode::All.to_string(), "all");
    }
}
