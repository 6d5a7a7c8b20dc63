//! Best-effort recovery for manifests the strict walker cannot read.
//!
//! Only a string pool is needed: the pool is located by scanning for a
//! plausible chunk header anywhere in the buffer, and the manifest fields are
//! guessed from the shape of the strings it holds.

use crate::android::chunk::{read_chunk_header, ChunkType};
use crate::android::reader::ByteReader;
use crate::android::string_pool::StringPool;
use crate::types::{push_unique, ManifestInfo};
use log::{debug, trace};

/// `ResStringPool_header` size; scanned chunks must declare it.
const STRING_POOL_HEADER_SIZE: usize = 28;

/// Strings searched before/after `application` for a label.
const LABEL_WINDOW_BEFORE: usize = 5;
const LABEL_WINDOW_AFTER: usize = 25;

/// Entries after `minSdkVersion`/`targetSdkVersion` searched for a number.
const SDK_WINDOW: usize = 5;

const PERMISSION_MARKER: &str = ".permission.";
const ANDROID_PERMISSION_PREFIX: &str = "android.permission.";

/// Class names under a `.permission.` package, not permissions.
const COMPONENT_CLASS_SUFFIXES: &[&str] = &["Activity", "Service", "Receiver", "Provider"];

/// Structural words that show up capitalized in pools but are never labels.
const EXCLUDED_LABELS: &[&str] = &[
    "name", "label", "application", "activity", "service", "receiver", "provider", "release",
    "debug", "main", "launcher", "default", "browsable", "view", "version", "sdk", "min", "max",
    "target", "true", "false", "null", "value", "config", "string", "layout", "drawable",
    "color", "dimen", "style", "array", "integer", "bool", "id", "attr", "anim", "menu", "raw",
    "xml", "font", "navigation", "transition",
];

/// Recover what can be recovered from the first usable string pool.
///
/// Returns `None` when no string pool is found or none of its strings look
/// like manifest data.
pub fn recover(data: &[u8]) -> Option<ManifestInfo> {
    let Some(pool) = find_string_pool(data) else {
        debug!("no string pool found in {} bytes", data.len());
        return None;
    };
    let info = recover_from_strings(pool.strings());
    if info.is_empty() {
        debug!("string pool of {} entries held no manifest data", pool.len());
        None
    } else {
        Some(info)
    }
}

/// Scan 4-byte aligned offsets for a string pool chunk that decodes to at
/// least one string.
pub fn find_string_pool(data: &[u8]) -> Option<StringPool> {
    let reader = ByteReader::new(data);
    let mut offset = 0;
    while offset + STRING_POOL_HEADER_SIZE <= data.len() {
        if reader.read_u16(offset) == Some(0x0001)
            && reader.read_u16(offset + 2) == Some(STRING_POOL_HEADER_SIZE as u16)
        {
            if let Ok(header) = read_chunk_header(&reader, offset) {
                if header.chunk_type == ChunkType::StringPool {
                    match StringPool::parse(&reader, &header) {
                        Ok(pool) if pool.strings().iter().any(|s| !s.is_empty()) => {
                            trace!("string pool found at offset {offset}");
                            return Some(pool);
                        }
                        Ok(_) => {}
                        Err(err) => trace!("candidate pool at offset {offset}: {err}"),
                    }
                }
            }
        }
        offset += 4;
    }
    None
}

/// Apply every heuristic to a flat list of pool strings.
pub fn recover_from_strings(strings: &[String]) -> ManifestInfo {
    let mut info = ManifestInfo::new();
    for permission in strings.iter().filter(|s| is_permission(s)) {
        push_unique(&mut info.permissions, permission.clone());
    }
    info.version_code = version_code(strings);
    info.version_name = version_name(strings);
    info.package_name = package_name(strings);
    info.app_label = app_label(strings).or_else(|| {
        info.package_name
            .as_deref()
            .and_then(label_from_package)
    });
    info.min_sdk = sdk_after(strings, "minSdkVersion");
    info.target_sdk = sdk_after(strings, "targetSdkVersion");
    info
}

pub fn is_permission(s: &str) -> bool {
    if s.starts_with(ANDROID_PERMISSION_PREFIX) {
        return true;
    }
    if !s.contains(PERMISSION_MARKER) {
        return false;
    }
    !COMPONENT_CLASS_SUFFIXES
        .iter()
        .any(|suffix| s.ends_with(suffix))
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn version_code(strings: &[String]) -> Option<String> {
    strings
        .iter()
        .filter(|s| (3..=12).contains(&s.len()) && is_all_digits(s))
        .filter_map(|s| s.parse::<u64>().ok().map(|n| (n, s)))
        .max_by_key(|(n, _)| *n)
        .map(|(_, s)| s.clone())
}

fn version_name(strings: &[String]) -> Option<String> {
    strings
        .iter()
        .find(|s| {
            s.len() <= 60
                && (s.contains('.') || s.contains('-'))
                && s.chars().next().is_some_and(|c| c.is_ascii_digit())
        })
        .cloned()
}

fn is_package_candidate(s: &str) -> bool {
    if !(3..=200).contains(&s.len()) || is_permission(s) {
        return false;
    }
    let Some(first) = s.chars().next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    if !s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.') {
        return false;
    }
    s.split('.').count() >= 2 && s.split('.').all(|segment| !segment.is_empty())
}

/// Packages that own custom permissions such as `com.acme.app.permission.X`.
fn permission_owners(strings: &[String]) -> Vec<&str> {
    let mut owners = vec![];
    for s in strings.iter().filter(|s| is_permission(s)) {
        if s.starts_with(ANDROID_PERMISSION_PREFIX) {
            continue;
        }
        if let Some((owner, _)) = s.split_once(PERMISSION_MARKER) {
            if owner.contains('.') {
                push_unique(&mut owners, owner);
            }
        }
    }
    owners
}

/// Score a package candidate; higher is better.
pub fn package_score(candidate: &str, strings: &[String], owners: &[&str]) -> i64 {
    let dotted = format!("{candidate}.");
    let shared_prefix = strings
        .iter()
        .filter(|s| s.as_str() != candidate && s.starts_with(&dotted))
        .count() as i64;

    let mut score = shared_prefix * 10;
    for owner in owners {
        if *owner == candidate {
            score += 100;
        } else if owner.starts_with(&dotted) || candidate.starts_with(&format!("{owner}.")) {
            score += 40;
        }
    }
    if candidate.starts_with("android.") {
        score -= 50;
    }
    score
}

fn package_name(strings: &[String]) -> Option<String> {
    let owners = permission_owners(strings);
    let mut best: Option<(i64, usize, &String)> = None;
    for candidate in strings.iter().filter(|s| is_package_candidate(s)) {
        let score = package_score(candidate, strings, &owners);
        let segments = candidate.split('.').count();
        let better = match best {
            None => true,
            Some((best_score, best_segments, _)) => {
                (score, segments) > (best_score, best_segments)
            }
        };
        if better {
            best = Some((score, segments, candidate));
        }
    }
    best.map(|(_, _, name)| name.clone())
}

fn is_excluded_label(s: &str) -> bool {
    EXCLUDED_LABELS.iter().any(|e| e.eq_ignore_ascii_case(s))
}

fn starts_capitalized(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_uppercase())
}

fn is_near_label(s: &str) -> bool {
    (2..=50).contains(&s.chars().count())
        && starts_capitalized(s)
        && s.contains(' ')
        && !s.contains('/')
        && !is_excluded_label(s)
}

fn is_loose_label(s: &str) -> bool {
    (3..=50).contains(&s.chars().count())
        && starts_capitalized(s)
        && !s.starts_with("android")
        && !s.starts_with("com.")
        && !s.contains('/')
        && !s.contains('.')
        && !is_excluded_label(s)
}

fn app_label(strings: &[String]) -> Option<String> {
    if let Some(app) = strings.iter().position(|s| s == "application") {
        let after = (app + 1..strings.len()).take(LABEL_WINDOW_AFTER);
        let before = (app.saturating_sub(LABEL_WINDOW_BEFORE)..app).rev();
        if let Some(idx) = after.chain(before).find(|&i| is_near_label(&strings[i])) {
            return Some(strings[idx].clone());
        }
    }
    strings.iter().find(|s| is_loose_label(s)).cloned()
}

fn label_from_package(package: &str) -> Option<String> {
    let last = package.rsplit('.').next()?;
    let mut chars = last.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

fn sdk_after(strings: &[String], keyword: &str) -> Option<String> {
    let idx = strings.iter().position(|s| s == keyword)?;
    strings
        .iter()
        .skip(idx + 1)
        .take(SDK_WINDOW)
        .find(|s| is_all_digits(s))
        .cloned()
}
