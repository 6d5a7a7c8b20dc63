use crate::android::chunk::ChunkHeader;
use crate::android::reader::ByteReader;
use crate::android::string_pool::StringPool;
use std::collections::HashMap;

/// Resource ids for the attribute names of the string pool.
///
/// Entry `k` of the resource map chunk is the id of the attribute whose
/// name is `pool[k]`. The map carries no indices of its own, so this
/// positional pairing is the only link between the two tables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceMap {
    ids: Vec<u32>,
    names: HashMap<u32, String>,
}

impl ResourceMap {
    pub fn parse(reader: &ByteReader<'_>, header: &ChunkHeader, pool: &StringPool) -> Self {
        let count = (header.end() - header.body_start()) / 4;
        let ids: Vec<u32> = (0..count)
            .map_while(|k| reader.read_u32(header.body_start() + k * 4))
            .collect();
        ResourceMap::from_ids(ids, pool)
    }

    pub fn from_ids(ids: Vec<u32>, pool: &StringPool) -> Self {
        let names = ids
            .iter()
            .enumerate()
            .filter_map(|(k, id)| {
                pool.get(k as u32)
                    .filter(|name| !name.is_empty())
                    .map(|name| (*id, name.to_string()))
            })
            .collect();
        ResourceMap { ids, names }
    }

    /// Resource id paired with pool index `index`.
    pub fn id_at(&self, index: u32) -> Option<u32> {
        self.ids.get(index as usize).copied().filter(|id| *id != 0)
    }

    /// Pool name paired with resource id `id`.
    pub fn name_for_id(&self, id: u32) -> Option<&str> {
        self.names.get(&id).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Well-known framework attribute ids, for manifests whose attribute name
/// strings were blanked out.
pub fn framework_attribute_name(id: u32) -> Option<&'static str> {
    let name = match id {
        0x0101_0001 => "label",
        0x0101_0002 => "icon",
        0x0101_0003 => "name",
        0x0101_0006 => "permission",
        0x0101_0010 => "exported",
        0x0101_0026 => "mimeType",
        0x0101_0027 => "scheme",
        0x0101_0028 => "host",
        0x0101_0029 => "port",
        0x0101_002a => "path",
        0x0101_002b => "pathPrefix",
        0x0101_002c => "pathPattern",
        0x0101_0202 => "targetActivity",
        0x0101_020c => "minSdkVersion",
        0x0101_021b => "versionCode",
        0x0101_021c => "versionName",
        0x0101_0270 => "targetSdkVersion",
        0x0101_0271 => "maxSdkVersion",
        0x0101_0284 => "smallScreens",
        0x0101_0285 => "normalScreens",
        0x0101_0286 => "largeScreens",
        0x0101_028e => "required",
        0x0101_02bf => "xlargeScreens",
        _ => return None,
    };
    Some(name)
}
