//! Reading the text report of an external badging tool.
//!
//! Running the tool is the caller's business; this module only turns its
//! output into a [`ManifestInfo`] that can be merged with the binary decoder's
//! result, and offers [`ToolAvailability`] to remember whether the tool exists.

use crate::types::{push_unique, ManifestInfo};
use log::trace;
use nom::branch::alt;
use nom::bytes::complete::{escaped, tag, take_while1};
use nom::character::complete::{char, none_of, one_of, space0};
use nom::combinator::{all_consuming, map};
use nom::multi::many0;
use nom::sequence::{delimited, preceded, separated_pair, terminated};
use nom::IResult;
use once_cell::sync::OnceCell;

/// One value on a badging line: `key='value'` or a bare `'value'`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum BadgingValue<'a> {
    Named(&'a str, String),
    Bare(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BadgingLine<'a> {
    key: &'a str,
    values: Vec<BadgingValue<'a>>,
}

impl<'a> BadgingLine<'a> {
    fn named(&self, key: &str) -> Option<&str> {
        self.values.iter().find_map(|value| match value {
            BadgingValue::Named(k, v) if *k == key && !v.is_empty() => Some(v.as_str()),
            _ => None,
        })
    }

    fn bare(&self) -> Vec<&str> {
        self.values
            .iter()
            .filter_map(|value| match value {
                BadgingValue::Bare(v) if !v.is_empty() => Some(v.as_str()),
                _ => None,
            })
            .collect()
    }
}

fn quoted(i: &str) -> IResult<&str, String> {
    let esc = escaped(none_of("\\'"), '\\', one_of("'\\"));
    let esc_or_empty = alt((esc, tag("")));
    map(delimited(char('\''), esc_or_empty, char('\'')), |raw: &str| {
        raw.replace("\\'", "'").replace("\\\\", "\\")
    })(i)
}

fn attribute_key(i: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_')(i)
}

fn value(i: &str) -> IResult<&str, BadgingValue<'_>> {
    alt((
        map(separated_pair(attribute_key, char('='), quoted), |(k, v)| {
            BadgingValue::Named(k, v)
        }),
        map(quoted, BadgingValue::Bare),
    ))(i)
}

fn line(i: &str) -> IResult<&str, BadgingLine<'_>> {
    let (rest, key) = terminated(take_while1(|c: char| c != ':'), char(':'))(i)?;
    let (rest, values) = all_consuming(terminated(many0(preceded(space0, value)), space0))(rest)?;
    Ok((rest, BadgingLine { key, values }))
}

/// Parse a badging report. Unrecognized lines are skipped.
pub fn parse_badging(text: &str) -> ManifestInfo {
    let mut info = ManifestInfo::new();
    for raw in text.lines().map(str::trim_end).filter(|l| !l.is_empty()) {
        let parsed = match line(raw) {
            Ok((_, parsed)) => parsed,
            Err(_) => {
                trace!("skipping badging line {raw:?}");
                continue;
            }
        };
        apply_line(&mut info, &parsed);
    }
    info
}

fn set(slot: &mut Option<String>, value: Option<&str>) {
    if slot.is_none() {
        *slot = value.map(str::to_string);
    }
}

fn apply_line(info: &mut ManifestInfo, line: &BadgingLine<'_>) {
    let bare = line.bare();
    let first_bare = bare.first().copied();
    match line.key {
        "package" => {
            set(&mut info.package_name, line.named("name"));
            set(&mut info.version_code, line.named("versionCode"));
            set(&mut info.version_name, line.named("versionName"));
        }
        "sdkVersion" => set(&mut info.min_sdk, first_bare),
        "targetSdkVersion" => set(&mut info.target_sdk, first_bare),
        "maxSdkVersion" => set(&mut info.max_sdk, first_bare),
        "uses-permission" | "uses-permission-sdk-23" => {
            if let Some(name) = line.named("name") {
                info.add_permission(name);
            }
        }
        "application-label" => set(&mut info.app_label, first_bare),
        "application" => {
            set(&mut info.app_label, line.named("label"));
            set(&mut info.icon, line.named("icon"));
        }
        "launchable-activity" => set(&mut info.launchable_activity, line.named("name")),
        "supports-screens" => {
            for screen in &bare {
                push_unique(&mut info.supported_screens, screen.to_string());
            }
        }
        "locales" => {
            for locale in &bare {
                push_unique(&mut info.supported_locales, locale.to_string());
            }
        }
        "densities" => {
            for density in &bare {
                push_unique(&mut info.densities, density.to_string());
            }
        }
        "uses-feature" => {
            if let Some(name) = line.named("name") {
                push_unique(&mut info.required_features, name.to_string());
            }
        }
        "uses-feature-not-required" => {
            if let Some(name) = line.named("name") {
                push_unique(&mut info.optional_features, name.to_string());
            }
        }
        _ => {}
    }
}

/// Whether an external badging tool can be used, probed at most once.
///
/// Owned by the caller and shared by reference between analyses instead of
/// living in a global.
#[derive(Debug, Default)]
pub struct ToolAvailability {
    available: OnceCell<bool>,
}

impl ToolAvailability {
    pub fn new() -> Self {
        ToolAvailability::default()
    }

    /// A capability that is already known.
    pub fn known(available: bool) -> Self {
        ToolAvailability {
            available: OnceCell::with_value(available),
        }
    }

    /// Run `probe` the first time this is asked, then reuse the answer.
    pub fn is_available(&self, probe: impl FnOnce() -> bool) -> bool {
        *self.available.get_or_init(probe)
    }

    /// The cached answer, if a probe has run.
    pub fn cached(&self) -> Option<bool> {
        self.available.get().copied()
    }
}
