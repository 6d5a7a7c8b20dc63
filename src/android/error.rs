/// Result alias for the strict binary XML path.
pub type AxmlResult<T> = Result<T, AxmlError>;

/// Reasons the strict binary XML walker gives up on a document.
///
/// None of these are fatal for the caller: [`crate::parse_manifest`] treats
/// every variant as a cue to try the heuristic decoder instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxmlError {
    /// The buffer does not open with an XML document chunk.
    NotBinaryXml(u16),
    /// A read ran past the end of the buffer.
    Truncated(String),
    /// A chunk header is internally inconsistent.
    InvalidChunk(String),
    /// The string pool header or offset table is unusable.
    MalformedStringPool(String),
    /// The chunk stream was consumed but no package name turned up.
    MissingPackage,
}

impl std::fmt::Display for AxmlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AxmlError::NotBinaryXml(chunk_type) => {
                write!(f, "Not a binary XML document (leading chunk type 0x{chunk_type:04x})")
            }
            AxmlError::Truncated(msg) => write!(f, "Truncated binary XML: {msg}"),
            AxmlError::InvalidChunk(msg) => write!(f, "Invalid chunk: {msg}"),
            AxmlError::MalformedStringPool(msg) => write!(f, "Malformed string pool: {msg}"),
            AxmlError::MissingPackage => write!(f, "Manifest does not declare a package name"),
        }
    }
}

impl std::error::Error for AxmlError {}
