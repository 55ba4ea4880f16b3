/// Encoding of the `$Nodes` and `$Elements` sections of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileType {
    #[default]
    Ascii,
    Binary,
}

/// Contents of the `$MeshFormat` section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshFormat {
    pub version: f64,
    pub file_type: FileType,
    pub data_size: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum MeshFormatParseError {
    #[error("Malformed format line: {0:?}")]
    Malformed(String),
    #[error("Unknown file type flag: {0}")]
    UnsupportedFileType(i64),
    #[error("Unsupported floating point size: {0} (only 8 is supported)")]
    UnsupportedDataSize(i64),
    #[error("File was written with the opposite byte order")]
    ByteOrderMismatch,
    #[error("Byte order sentinel has unexpected value {0}")]
    BadSentinel(i32),
}

impl FileType {
    pub const fn flag(self) -> u8 {
        match self {
            FileType::Ascii => 0,
            FileType::Binary => 1,
        }
    }

    pub const fn from_flag(flag: i64) -> Option<Self> {
        match flag {
            0 => Some(FileType::Ascii),
            1 => Some(FileType::Binary),
            _ => None,
        }
    }
}

impl MeshFormat {
    /// Integer written right after a binary format line so that readers can
    /// detect a byte order mismatch.
    pub const SENTINEL: i32 = 1;

    pub fn current(file_type: FileType) -> Self {
        Self {
            version: 2.2,
            file_type,
            data_size: crate::DATA_SIZE,
        }
    }

    pub fn is_binary(&self) -> bool {
        self.file_type == FileType::Binary
    }

    /// Parses the `version file_type data_size` line.
    pub fn from_tokens(tokens: &[&str]) -> Result<Self, MeshFormatParseError> {
        let malformed = || MeshFormatParseError::Malformed(tokens.join(" "));
        let [version, flag, size] = tokens else {
            return Err(malformed());
        };
        let version: f64 = version.parse().map_err(|_| malformed())?;
        let flag: i64 = flag.parse().map_err(|_| malformed())?;
        let size: i64 = size.parse().map_err(|_| malformed())?;
        let file_type = FileType::from_flag(flag)
            .ok_or(MeshFormatParseError::UnsupportedFileType(flag))?;
        if size != crate::DATA_SIZE as i64 {
            return Err(MeshFormatParseError::UnsupportedDataSize(size));
        }
        Ok(Self {
            version,
            file_type,
            data_size: size as u32,
        })
    }

    pub fn to_line(&self) -> String {
        format!("{} {} {}", self.version, self.file_type.flag(), self.data_size)
    }

    pub fn sentinel_bytes() -> [u8; 4] {
        Self::SENTINEL.to_ne_bytes()
    }

    pub fn verify_sentinel(bytes: [u8; 4]) -> Result<(), MeshFormatParseError> {
        match i32::from_ne_bytes(bytes) {
            Self::SENTINEL => Ok(()),
            v if v == Self::SENTINEL.swap_bytes() => {
                Err(MeshFormatParseError::ByteOrderMismatch)
            }
            v => Err(MeshFormatParseError::BadSentinel(v)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ascii_and_binary_lines() {
        let f = MeshFormat::from_tokens(&["2.2", "0", "8"]).unwrap();
        assert_eq!(f, MeshFormat::current(FileType::Ascii));
        let f = MeshFormat::from_tokens(&["2.2", "1", "8"]).unwrap();
        assert!(f.is_binary());
        assert_eq!(f.to_line(), "2.2 1 8");
    }

    #[test]
    fn rejects_bad_lines() {
        assert!(matches!(
            MeshFormat::from_tokens(&["2.2", "2", "8"]),
            Err(MeshFormatParseError::UnsupportedFileType(2))
        ));
        assert!(matches!(
            MeshFormat::from_tokens(&["2.2", "0", "4"]),
            Err(MeshFormatParseError::UnsupportedDataSize(4))
        ));
        assert!(matches!(
            MeshFormat::from_tokens(&["two", "0", "8"]),
            Err(MeshFormatParseError::Malformed(_))
        ));
    }

    #[test]
    fn sentinel_detects_swapped_order() {
        assert!(MeshFormat::verify_sentinel(MeshFormat::sentinel_bytes()).is_ok());
        let mut swapped = MeshFormat::sentinel_bytes();
        swapped.reverse();
        assert!(matches!(
            MeshFormat::verify_sentinel(swapped),
            Err(MeshFormatParseError::ByteOrderMismatch)
        ));
        assert!(matches!(
            MeshFormat::verify_sentinel(7i32.to_ne_bytes()),
            Err(MeshFormatParseError::BadSentinel(7))
        ));
    }
}
