//! # apkmeta
//!
//! Read package metadata out of Android build artifacts without an Android
//! toolchain: the binary `AndroidManifest.xml` (AXML) and the type table of
//! `classes.dex`.
//!
use crate::android::manifest::ManifestParser;
use crate::types::ManifestInfo;

pub mod android;
pub mod dex;
#[cfg(test)]
mod tests;
pub mod types;

/// Decode a binary manifest, falling back to string-pool heuristics when
/// the document cannot be walked.
///
/// Returns `None` only when nothing at all could be recovered.
///
/// # Examples
///
/// ```no_run
///  use apkmeta::parse_manifest;
///
///  let bytes = std::fs::read("AndroidManifest.xml").unwrap();
///  if let Some(info) = parse_manifest(&bytes) {
///      println!("{:?} declares {} permissions", info.package_name, info.permissions.len());
///  }
/// ```
pub fn parse_manifest(data: &[u8]) -> Option<ManifestInfo> {
    ManifestParser::new().parse(data)
}

/// Dotted names of the classes referenced by a dex file's type table.
pub fn extract_class_descriptors(data: &[u8]) -> Vec<String> {
    dex::descriptors::extract_class_descriptors(data)
}
