//! Resource - Collection Names and Entity Kinds

use serde::{Deserialize, Serialize};

/// A named collection served under `/api/{name}/`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Hangars,
    Droppoints,
}

impl ResourceKind {
    /// URL path segment for this collection
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Hangars => "hangars",
            ResourceKind::Droppoints => "droppoints",
        }
    }

    /// Kind of entity produced from this collection's records
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            ResourceKind::Hangars => EntityKind::Hangar,
            ResourceKind::Droppoints => EntityKind::Droppoint,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity kind, also used to tag overlays in the registry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Hangar,
    Droppoint,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Hangar => "hangar",
            EntityKind::Droppoint => "droppoint",
        }
    }

    pub fn resource(&self) -> ResourceKind {
        match self {
            EntityKind::Hangar => ResourceKind::Hangars,
            EntityKind::Droppoint => ResourceKind::Droppoints,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
