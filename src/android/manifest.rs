use crate::android::binary_xml;
use crate::android::error::AxmlResult;
use crate::android::fallback;
use crate::types::ManifestInfo;
use log::debug;

/// Knobs for [`ManifestParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Fall back to string-pool heuristics when the strict walk fails.
    pub heuristic_fallback: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            heuristic_fallback: true,
        }
    }
}

/// Decodes `AndroidManifest.xml` bytes into a [`ManifestInfo`].
///
/// # Examples
///
/// ```
/// use apkmeta::android::manifest::ManifestParser;
///
/// let parser = ManifestParser::new().with_heuristic_fallback(false);
/// assert!(parser.parse(b"not a manifest").is_none());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestParser {
    options: ParseOptions,
}

impl ManifestParser {
    pub fn new() -> Self {
        ManifestParser::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        ManifestParser { options }
    }

    pub fn with_heuristic_fallback(mut self, enabled: bool) -> Self {
        self.options.heuristic_fallback = enabled;
        self
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// Strict decoding only.
    pub fn walk(&self, data: &[u8]) -> AxmlResult<ManifestInfo> {
        binary_xml::walk(data)
    }

    /// Strict decoding, then heuristics if allowed. `None` means neither
    /// path recovered anything.
    pub fn parse(&self, data: &[u8]) -> Option<ManifestInfo> {
        match binary_xml::walk(data) {
            Ok(info) => Some(info),
            Err(err) => {
                debug!("binary manifest walk failed: {err}");
                if !self.options.heuristic_fallback {
                    return None;
                }
                let recovered = fallback::recover(data);
                if recovered.is_none() {
                    debug!("no manifest data recovered from {} bytes", data.len());
                }
                recovered
            }
        }
    }
}
