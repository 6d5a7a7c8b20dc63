use crate::android::chunk::{read_chunk_header, ChunkHeader, ChunkType};
use crate::android::components::{find, Attribute, ComponentBuilder, IntentFilterBuilder};
use crate::android::error::{AxmlError, AxmlResult};
use crate::android::reader::ByteReader;
use crate::android::resource_map::{framework_attribute_name, ResourceMap};
use crate::android::string_pool::StringPool;
use crate::android::typed_value::TypedValue;
use crate::types::{push_unique, ComponentKind, ManifestInfo};
use log::{debug, trace};

pub const ANDROID_NAMESPACE_URI: &str = "http://schemas.android.com/apk/res/android";
const ANDROID_NAMESPACE_PREFIX: &str = "android";

/// Size of one `ResXMLTree_attribute`.
const ATTRIBUTE_SIZE: usize = 20;

/// Walk a binary XML manifest and collect what it declares.
///
/// Fails when the buffer does not open with an XML document chunk, or when
/// the stream ends without a package name having been seen. Unknown chunks
/// are skipped whole; a broken inner chunk header ends the walk early.
pub fn walk(data: &[u8]) -> AxmlResult<ManifestInfo> {
    walk_state(data)?.finish()
}

/// Run the chunk loop and hand back the element state it built.
///
/// The loop runs to the end of the buffer, not to the end the document
/// chunk declares; every inner header is still checked against the buffer.
pub(crate) fn walk_state(data: &[u8]) -> AxmlResult<ManifestState> {
    let reader = ByteReader::new(data);
    let outer = read_chunk_header(&reader, 0)?;
    if outer.chunk_type != ChunkType::Xml {
        return Err(AxmlError::NotBinaryXml(reader.read_u16(0).unwrap_or_default()));
    }
    if outer.end() < reader.len() {
        trace!("document chunk declares {} of {} bytes", outer.end(), reader.len());
    }

    let mut walker = Walker::new(reader);
    let mut cursor = outer.body_start();
    while cursor < reader.len() {
        let chunk = match read_chunk_header(&reader, cursor) {
            Ok(chunk) => chunk,
            Err(err) => {
                debug!("stopping binary XML walk: {err}");
                break;
            }
        };
        walker.dispatch(&chunk);
        cursor = chunk.end();
    }

    Ok(walker.manifest)
}

#[derive(Clone, Debug)]
struct NamespaceFrame {
    prefix: String,
    uri: String,
}

struct Walker<'a> {
    reader: ByteReader<'a>,
    pool: StringPool,
    resource_map: ResourceMap,
    namespaces: Vec<NamespaceFrame>,
    manifest: ManifestState,
}

impl<'a> Walker<'a> {
    fn new(reader: ByteReader<'a>) -> Self {
        Walker {
            reader,
            pool: StringPool::default(),
            resource_map: ResourceMap::default(),
            namespaces: vec![],
            manifest: ManifestState::default(),
        }
    }

    fn dispatch(&mut self, chunk: &ChunkHeader) {
        match chunk.chunk_type {
            ChunkType::StringPool => match StringPool::parse(&self.reader, chunk) {
                Ok(pool) => self.pool = pool,
                Err(err) => debug!("ignoring string pool at offset {}: {err}", chunk.start),
            },
            ChunkType::ResourceMap => {
                self.resource_map = ResourceMap::parse(&self.reader, chunk, &self.pool);
            }
            ChunkType::StartNamespace => self.start_namespace(chunk),
            ChunkType::EndNamespace => {
                self.namespaces.pop();
            }
            ChunkType::StartElement => self.start_element(chunk),
            ChunkType::EndElement => self.end_element(chunk),
            ChunkType::Xml | ChunkType::CData | ChunkType::Other(_) => {}
        }
    }

    fn string_at(&self, offset: usize) -> Option<&str> {
        self.reader.read_u32(offset).and_then(|idx| self.pool.get(idx))
    }

    fn start_namespace(&mut self, chunk: &ChunkHeader) {
        let body = chunk.body_start();
        let prefix = self.string_at(body).unwrap_or_default().to_string();
        let uri = self.string_at(body + 4).unwrap_or_default().to_string();
        self.namespaces.push(NamespaceFrame { prefix, uri });
    }

    fn resolve_prefix(&self, uri: Option<&str>) -> Option<String> {
        let uri = uri.filter(|u| !u.is_empty())?;
        self.namespaces
            .iter()
            .rev()
            .find(|frame| frame.uri == uri)
            .map(|frame| frame.prefix.clone())
            .or_else(|| (uri == ANDROID_NAMESPACE_URI).then(|| ANDROID_NAMESPACE_PREFIX.to_string()))
    }

    /// Attribute local name, recovered from the resource id when the pool
    /// entry has been blanked.
    fn attribute_name(&self, name_idx: u32) -> Option<String> {
        match self.pool.get(name_idx) {
            Some(name) if !name.is_empty() => Some(name.to_string()),
            _ => self
                .resource_map
                .id_at(name_idx)
                .and_then(framework_attribute_name)
                .map(str::to_string),
        }
    }

    fn start_element(&mut self, chunk: &ChunkHeader) {
        let ext = chunk.body_start();
        let reader = self.reader;
        let (Some(name_idx), Some(attr_start), Some(attr_size), Some(attr_count)) = (
            reader.read_u32(ext + 4),
            reader.read_u16(ext + 8),
            reader.read_u16(ext + 10),
            reader.read_u16(ext + 12),
        ) else {
            trace!("start element at offset {} is truncated", chunk.start);
            return;
        };
        let Some(tag) = self.pool.get(name_idx).map(str::to_string) else {
            trace!("start element at offset {} has no name", chunk.start);
            return;
        };

        let stride = attr_size as usize;
        let mut attributes = Vec::with_capacity(attr_count as usize);
        if stride < ATTRIBUTE_SIZE {
            trace!("<{tag}> has attribute stride {stride}, skipping its attributes");
        } else {
            let first = ext + attr_start as usize;
            for i in 0..attr_count as usize {
                let offset = first + i * stride;
                if offset + ATTRIBUTE_SIZE > chunk.end() {
                    trace!("<{tag}> attribute {i} runs past its chunk");
                    break;
                }
                if let Some(attr) = self.read_attribute(offset) {
                    attributes.push(attr);
                }
            }
        }

        self.manifest.start_element(&tag, &attributes);
    }

    fn read_attribute(&self, offset: usize) -> Option<Attribute> {
        let reader = self.reader;
        let ns_idx = reader.read_u32(offset)?;
        let name_idx = reader.read_u32(offset + 4)?;
        let raw_value_idx = reader.read_u32(offset + 8)?;
        let data_type = reader.read_u8(offset + 15)?;
        let data = reader.read_u32(offset + 16)?;

        let Some(name) = self.attribute_name(name_idx) else {
            trace!("skipping attribute with unresolvable name index {name_idx}");
            return None;
        };
        let prefix = self.resolve_prefix(self.pool.get(ns_idx));
        let value = match self.pool.get(raw_value_idx) {
            Some(raw) => Some(raw.to_string()),
            None => TypedValue::new(data_type, data).to_text(&self.pool),
        };
        Some(Attribute {
            prefix,
            name,
            value,
        })
    }

    fn end_element(&mut self, chunk: &ChunkHeader) {
        let tag = self.string_at(chunk.body_start() + 4).map(str::to_string);
        match tag {
            Some(tag) => self.manifest.end_element(&tag),
            None => trace!("end element at offset {} has no name", chunk.start),
        }
    }
}

/// Element-level state: what has been collected so far plus the open
/// component and intent-filter builders.
#[derive(Default)]
pub(crate) struct ManifestState {
    pub(crate) info: ManifestInfo,
    components: Vec<ComponentBuilder>,
    filters: Vec<IntentFilterBuilder>,
    /// Every start element with its decoded attributes, in stream order.
    #[cfg(test)]
    pub(crate) elements: Vec<(String, Vec<Attribute>)>,
}

impl ManifestState {
    fn finish(self) -> AxmlResult<ManifestInfo> {
        let info = self.info;
        match info.package_name.as_deref() {
            Some(package) if !package.is_empty() => Ok(info),
            _ => Err(AxmlError::MissingPackage),
        }
    }

    pub(crate) fn start_element(&mut self, tag: &str, attributes: &[Attribute]) {
        #[cfg(test)]
        self.elements.push((tag.to_string(), attributes.to_vec()));

        let text = |name: &str| find(attributes, name).map(str::to_string);

        match tag {
            "manifest" => {
                self.info.package_name = text("package").or(self.info.package_name.take());
                self.info.version_code = text("versionCode").or(self.info.version_code.take());
                self.info.version_name = text("versionName").or(self.info.version_name.take());
            }
            "uses-sdk" => {
                self.info.min_sdk = text("minSdkVersion").or(self.info.min_sdk.take());
                self.info.target_sdk = text("targetSdkVersion").or(self.info.target_sdk.take());
                self.info.max_sdk = text("maxSdkVersion").or(self.info.max_sdk.take());
            }
            "uses-permission" | "uses-permission-sdk-23" => {
                if let Some(name) = text("name") {
                    self.info.add_permission(name);
                }
            }
            "uses-feature" => {
                if let Some(name) = text("name") {
                    let required = attributes
                        .iter()
                        .find(|attr| attr.name == "required")
                        .and_then(Attribute::flag)
                        .unwrap_or(true);
                    let list = if required {
                        &mut self.info.required_features
                    } else {
                        &mut self.info.optional_features
                    };
                    push_unique(list, name);
                }
            }
            "supports-screens" => {
                for (attr, screen) in [
                    ("smallScreens", "small"),
                    ("normalScreens", "normal"),
                    ("largeScreens", "large"),
                    ("xlargeScreens", "xlarge"),
                ] {
                    let enabled = attributes
                        .iter()
                        .find(|a| a.name == attr)
                        .and_then(Attribute::flag);
                    if enabled == Some(true) {
                        push_unique(&mut self.info.supported_screens, screen.to_string());
                    }
                }
            }
            "application" => {
                self.info.app_label = text("label").or(self.info.app_label.take());
                self.info.icon = text("icon").or(self.info.icon.take());
            }
            "intent-filter" => {
                if self.components.is_empty() {
                    trace!("ignoring intent-filter outside of a component");
                } else {
                    self.filters.push(IntentFilterBuilder::new());
                }
            }
            "action" => {
                if let Some(filter) = self.filters.last_mut() {
                    filter.add_action(attributes);
                }
            }
            "category" => {
                if let Some(filter) = self.filters.last_mut() {
                    filter.add_category(attributes);
                }
            }
            "data" => {
                if let Some(filter) = self.filters.last_mut() {
                    filter.add_data(attributes);
                }
            }
            other => {
                if let Some(kind) = ComponentKind::from_tag(other) {
                    let mut builder = ComponentBuilder::new(kind);
                    for attr in attributes {
                        builder.apply(attr);
                    }
                    self.components.push(builder);
                }
            }
        }
    }

    pub(crate) fn end_element(&mut self, tag: &str) {
        if tag == "intent-filter" {
            if let Some(filter) = self.filters.pop() {
                if let Some(component) = self.components.last_mut() {
                    component.add_intent_filter(filter.finish());
                }
            }
            return;
        }

        let Some(kind) = ComponentKind::from_tag(tag) else {
            return;
        };
        if self.components.last().map(ComponentBuilder::kind) != Some(kind) {
            trace!("</{tag}> does not close the open component");
            return;
        }
        let Some(builder) = self.components.pop() else {
            return;
        };
        let Some(component) = builder.finish(self.info.package_name.as_deref()) else {
            return;
        };

        if self.info.launchable_activity.is_none()
            && component.kind.is_activity()
            && component.intent_filters.iter().any(|f| f.is_launcher())
        {
            self.info.launchable_activity = Some(component.name.clone());
        }
        self.info.deep_links.extend(component.deep_links());
        self.info.components.push(component);
    }
}
