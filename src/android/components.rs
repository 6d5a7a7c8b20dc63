use crate::types::{resolve_component_name, Component, ComponentKind, IntentData, IntentFilter};
use log::trace;

/// A decoded attribute of a start-element chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub prefix: Option<String>,
    pub name: String,
    /// Text form of the value; absent for null values.
    pub value: Option<String>,
}

impl Attribute {
    pub fn new(prefix: Option<&str>, name: &str, value: Option<&str>) -> Self {
        Attribute {
            prefix: prefix.map(str::to_string),
            name: name.to_string(),
            value: value.map(str::to_string),
        }
    }

    /// Value with empty strings treated as absent.
    pub fn text(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.is_empty())
    }

    pub fn flag(&self) -> Option<bool> {
        match self.text()? {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Collects one `<intent-filter>` while its children stream past.
#[derive(Clone, Debug, Default)]
pub struct IntentFilterBuilder {
    actions: Vec<String>,
    categories: Vec<String>,
    data: Vec<IntentData>,
}

impl IntentFilterBuilder {
    pub fn new() -> Self {
        IntentFilterBuilder::default()
    }

    pub fn add_action(&mut self, attributes: &[Attribute]) {
        if let Some(name) = find(attributes, "name") {
            self.actions.push(name.to_string());
        }
    }

    pub fn add_category(&mut self, attributes: &[Attribute]) {
        if let Some(name) = find(attributes, "name") {
            self.categories.push(name.to_string());
        }
    }

    pub fn add_data(&mut self, attributes: &[Attribute]) {
        let mut data = IntentData::default();
        for attr in attributes {
            let slot = match attr.name.as_str() {
                "scheme" => &mut data.scheme,
                "host" => &mut data.host,
                "port" => &mut data.port,
                "path" => &mut data.path,
                "pathPrefix" => &mut data.path_prefix,
                "pathPattern" => &mut data.path_pattern,
                "mimeType" => &mut data.mime_type,
                _ => continue,
            };
            *slot = attr.text().map(str::to_string);
        }
        self.data.push(data);
    }

    pub fn finish(self) -> IntentFilter {
        IntentFilter {
            actions: self.actions,
            categories: self.categories,
            data: self.data,
        }
    }
}

/// Collects one component element until its end tag.
#[derive(Clone, Debug)]
pub struct ComponentBuilder {
    kind: ComponentKind,
    raw_name: Option<String>,
    label: Option<String>,
    exported: Option<bool>,
    permission: Option<String>,
    target_activity: Option<String>,
    intent_filters: Vec<IntentFilter>,
}

impl ComponentBuilder {
    pub fn new(kind: ComponentKind) -> Self {
        ComponentBuilder {
            kind,
            raw_name: None,
            label: None,
            exported: None,
            permission: None,
            target_activity: None,
            intent_filters: vec![],
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn apply(&mut self, attr: &Attribute) {
        match attr.name.as_str() {
            "name" => self.raw_name = attr.text().map(str::to_string),
            "label" => self.label = attr.text().map(str::to_string),
            "exported" => self.exported = attr.flag(),
            "permission" => self.permission = attr.text().map(str::to_string),
            "targetActivity" => self.target_activity = attr.text().map(str::to_string),
            _ => {}
        }
    }

    pub fn add_intent_filter(&mut self, filter: IntentFilter) {
        self.intent_filters.push(filter);
    }

    /// Resolve the class name and build the component. Components without
    /// a usable name are dropped.
    pub fn finish(self, package: Option<&str>) -> Option<Component> {
        let Some(raw_name) = self.raw_name.as_deref().map(str::trim).filter(|n| !n.is_empty())
        else {
            trace!("dropping unnamed {} element", self.kind);
            return None;
        };
        let name = resolve_component_name(package, raw_name);
        let target_activity = self
            .target_activity
            .as_deref()
            .map(|target| resolve_component_name(package, target));
        Some(Component {
            kind: self.kind,
            name,
            label: self.label,
            exported: self.exported,
            permission: self.permission,
            target_activity,
            intent_filters: self.intent_filters,
        })
    }
}

/// First non-empty value of the attribute with local name `name`.
pub fn find<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .filter(|attr| attr.name == name)
        .find_map(|attr| attr.text())
}
