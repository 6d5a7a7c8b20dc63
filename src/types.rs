/* Public model of what can be read out of a manifest */

use serde::{Deserialize, Serialize};
use std::fmt;

pub const ACTION_MAIN: &str = "android.intent.action.MAIN";
pub const ACTION_VIEW: &str = "android.intent.action.VIEW";
pub const CATEGORY_LAUNCHER: &str = "android.intent.category.LAUNCHER";
pub const CATEGORY_BROWSABLE: &str = "android.intent.category.BROWSABLE";

/// The kinds of application component a manifest can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Activity,
    ActivityAlias,
    Service,
    Receiver,
    Provider,
}

impl ComponentKind {
    /// Map a manifest element name to a component kind.
    pub fn from_tag(tag: &str) -> Option<ComponentKind> {
        match tag {
            "activity" => Some(ComponentKind::Activity),
            "activity-alias" => Some(ComponentKind::ActivityAlias),
            "service" => Some(ComponentKind::Service),
            "receiver" => Some(ComponentKind::Receiver),
            "provider" => Some(ComponentKind::Provider),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ComponentKind::Activity => "activity",
            ComponentKind::ActivityAlias => "activity-alias",
            ComponentKind::Service => "service",
            ComponentKind::Receiver => "receiver",
            ComponentKind::Provider => "provider",
        }
    }

    /// Only activities (and their aliases) can be targets of browsable links.
    pub fn is_activity(&self) -> bool {
        matches!(self, ComponentKind::Activity | ComponentKind::ActivityAlias)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// One `<data>` element of an intent filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentData {
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub path: Option<String>,
    pub path_prefix: Option<String>,
    pub path_pattern: Option<String>,
    pub mime_type: Option<String>,
}

impl IntentData {
    /// True when the element says anything about the URI it matches.
    pub fn has_uri_parts(&self) -> bool {
        self.scheme.is_some()
            || self.host.is_some()
            || self.path.is_some()
            || self.path_prefix.is_some()
            || self.path_pattern.is_some()
    }

    /// Exact path first, then the prefix, then the pattern.
    pub fn display_path(&self) -> Option<String> {
        if let Some(path) = &self.path {
            Some(path.clone())
        } else if let Some(prefix) = &self.path_prefix {
            Some(format!("prefix:{prefix}"))
        } else {
            self.path_pattern
                .as_ref()
                .map(|pattern| format!("pattern:{pattern}"))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentFilter {
    pub actions: Vec<String>,
    pub categories: Vec<String>,
    pub data: Vec<IntentData>,
}

impl IntentFilter {
    pub fn has_action(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    pub fn is_browsable_view(&self) -> bool {
        self.has_action(ACTION_VIEW) && self.has_category(CATEGORY_BROWSABLE)
    }

    pub fn is_launcher(&self) -> bool {
        self.has_action(ACTION_MAIN) && self.has_category(CATEGORY_LAUNCHER)
    }
}

/// A declared activity, service, receiver or provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub kind: ComponentKind,
    /// Fully-qualified class name.
    pub name: String,
    pub label: Option<String>,
    pub exported: Option<bool>,
    pub permission: Option<String>,
    /// Resolved `targetActivity` of an `activity-alias`.
    pub target_activity: Option<String>,
    pub intent_filters: Vec<IntentFilter>,
}

impl Component {
    /// Deep links advertised by this component's browsable intent filters.
    ///
    /// A browsable filter without any `<data>` element still produces one
    /// entry with every field empty.
    pub fn deep_links(&self) -> Vec<DeepLink> {
        if !self.kind.is_activity() {
            return vec![];
        }

        let mut links = vec![];
        for filter in self.intent_filters.iter().filter(|f| f.is_browsable_view()) {
            if filter.data.is_empty() {
                links.push(DeepLink {
                    component: self.name.clone(),
                    scheme: None,
                    host: None,
                    path: None,
                    mime_type: None,
                });
                continue;
            }
            for data in filter.data.iter().filter(|d| d.has_uri_parts()) {
                links.push(DeepLink {
                    component: self.name.clone(),
                    scheme: data.scheme.clone(),
                    host: data.host.clone(),
                    path: data.display_path(),
                    mime_type: data.mime_type.clone(),
                });
            }
        }
        links
    }
}

/// A URL an activity claims to handle from a browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepLink {
    pub component: String,
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub path: Option<String>,
    pub mime_type: Option<String>,
}

impl fmt::Display for DeepLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = self.scheme.as_deref().unwrap_or("*");
        let host = self.host.as_deref().unwrap_or("*");
        let path = self.path.as_deref().unwrap_or("");
        write!(f, "{scheme}://{host}{path} -> {}", self.component)
    }
}

/// Everything recovered from one manifest.
///
/// Scalar fields are absent when the source did not say; list fields are
/// empty instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestInfo {
    pub package_name: Option<String>,
    pub version_name: Option<String>,
    pub version_code: Option<String>,
    pub app_label: Option<String>,
    pub min_sdk: Option<String>,
    pub target_sdk: Option<String>,
    pub max_sdk: Option<String>,
    pub icon: Option<String>,
    pub launchable_activity: Option<String>,
    pub permissions: Vec<String>,
    pub supported_locales: Vec<String>,
    pub supported_screens: Vec<String>,
    pub densities: Vec<String>,
    pub required_features: Vec<String>,
    pub optional_features: Vec<String>,
    pub components: Vec<Component>,
    pub deep_links: Vec<DeepLink>,
}

impl ManifestInfo {
    pub fn new() -> Self {
        ManifestInfo::default()
    }

    /// Add a permission unless it is already listed.
    pub fn add_permission(&mut self, name: impl Into<String>) {
        push_unique(&mut self.permissions, name.into());
    }

    pub fn version_code_number(&self) -> Option<u64> {
        self.version_code.as_deref().and_then(|v| v.trim().parse().ok())
    }

    pub fn min_sdk_level(&self) -> Option<u32> {
        self.min_sdk.as_deref().and_then(|v| v.trim().parse().ok())
    }

    pub fn target_sdk_level(&self) -> Option<u32> {
        self.target_sdk.as_deref().and_then(|v| v.trim().parse().ok())
    }

    pub fn components_of(&self, kind: ComponentKind) -> impl Iterator<Item = &Component> {
        self.components.iter().filter(move |c| c.kind == kind)
    }

    /// True when nothing at all was recovered.
    pub fn is_empty(&self) -> bool {
        *self == ManifestInfo::default()
    }

    /// Combine two independently sourced descriptions of the same package.
    ///
    /// Scalars keep `self`'s value when present and fall back to `other`'s.
    /// Lists are unioned, `self`'s entries first.
    pub fn merge(mut self, other: ManifestInfo) -> ManifestInfo {
        fn first<T>(slot: &mut Option<T>, other: Option<T>) {
            if slot.is_none() {
                *slot = other;
            }
        }
        fn union<T: PartialEq>(list: &mut Vec<T>, other: Vec<T>) {
            for item in other {
                push_unique(list, item);
            }
        }

        first(&mut self.package_name, other.package_name);
        first(&mut self.version_name, other.version_name);
        first(&mut self.version_code, other.version_code);
        first(&mut self.app_label, other.app_label);
        first(&mut self.min_sdk, other.min_sdk);
        first(&mut self.target_sdk, other.target_sdk);
        first(&mut self.max_sdk, other.max_sdk);
        first(&mut self.icon, other.icon);
        first(&mut self.launchable_activity, other.launchable_activity);
        union(&mut self.permissions, other.permissions);
        union(&mut self.supported_locales, other.supported_locales);
        union(&mut self.supported_screens, other.supported_screens);
        union(&mut self.densities, other.densities);
        union(&mut self.required_features, other.required_features);
        union(&mut self.optional_features, other.optional_features);
        union(&mut self.components, other.components);
        union(&mut self.deep_links, other.deep_links);
        self
    }
}

pub(crate) fn push_unique<T: PartialEq>(list: &mut Vec<T>, item: T) {
    if !list.contains(&item) {
        list.push(item);
    }
}

/// Resolve a component class name declared in the manifest.
///
/// `.Foo` and `Foo` are relative to the package; anything else containing a
/// dot is taken as already qualified. Without a package the fragment is kept.
pub fn resolve_component_name(package: Option<&str>, raw: &str) -> String {
    match package.filter(|p| !p.is_empty()) {
        Some(package) if raw.starts_with('.') => format!("{package}{raw}"),
        Some(package) if !raw.contains('.') => format!("{package}.{raw}"),
        _ => raw.to_string(),
    }
}
