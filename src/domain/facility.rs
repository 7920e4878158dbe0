//! Facility - Raw Collection Records and the Geofence Entities Built From Them

use std::sync::Arc;

use ahash::AHashMap;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::geo::LatLng;
use crate::domain::resource::{EntityKind, ResourceKind};

/// A record that could not be turned into an entity
///
/// Reported alongside a sync result; never fatal for the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub resource: ResourceKind,
    /// Identifier of the offending record, when one could be read
    pub key: Option<Arc<str>>,
    pub reason: String,
}

impl ValidationError {
    pub(crate) fn new(resource: ResourceKind, key: Option<Arc<str>>, reason: impl Into<String>) -> Self {
        Self {
            resource,
            key,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid {} record {}: {}",
            self.resource,
            self.key.as_deref().unwrap_or("<unkeyed>"),
            self.reason
        )
    }
}

impl std::error::Error for ValidationError {}

/// A record as decoded from the `results` array
///
/// Fields unknown to this crate (e.g. `altitude`) are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FacilityRecord {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius: Option<f64>,
    #[serde(default = "default_available")]
    pub is_available: bool,
    pub description: Option<String>,
}

fn default_available() -> bool {
    true
}

/// Key of an entity within its kind's index
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    /// Hangars are keyed by numeric id
    Id(i64),
    /// Droppoints are keyed by name
    Name(Arc<str>),
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKey::Id(id) => write!(f, "{id}"),
            EntityKey::Name(name) => f.write_str(name),
        }
    }
}

impl From<i64> for EntityKey {
    fn from(id: i64) -> Self {
        EntityKey::Id(id)
    }
}

impl From<&str> for EntityKey {
    fn from(name: &str) -> Self {
        EntityKey::Name(name.into())
    }
}

/// A facility as displayed on the map
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceEntity {
    pub key: EntityKey,
    pub center: LatLng,
    /// True geofence radius; the drawn circle uses a scaled value
    pub radius_meters: Option<f64>,
    pub availability: bool,
    pub description: Option<Arc<str>>,
    pub name: Option<Arc<str>>,
    pub kind: EntityKind,
}

/// Entities of one kind, indexed by key
pub type GeofenceIndex = AHashMap<EntityKey, GeofenceEntity>;

impl FacilityRecord {
    /// Decode one element of `results`
    pub fn decode(resource: ResourceKind, value: Value) -> Result<Self, ValidationError> {
        let key = raw_key(resource, &value);
        serde_json::from_value(value)
            .map_err(|e| ValidationError::new(resource, key, format!("malformed record: {e}")))
    }

    /// Turn the record into an entity of the kind served by `resource`
    pub fn into_entity(self, resource: ResourceKind) -> Result<GeofenceEntity, ValidationError> {
        match resource {
            ResourceKind::Hangars => self.into_hangar(),
            ResourceKind::Droppoints => self.into_droppoint(),
        }
    }

    fn into_hangar(self) -> Result<GeofenceEntity, ValidationError> {
        let resource = ResourceKind::Hangars;
        let Some(id) = self.id else {
            return Err(ValidationError::new(resource, None, "missing id"));
        };
        let key_label: Arc<str> = id.to_string().into();

        let center = self.center(resource, &key_label)?;
        let radius = match self.radius {
            Some(r) if r.is_finite() && r >= 0.0 => r,
            Some(r) => {
                return Err(ValidationError::new(
                    resource,
                    Some(key_label),
                    format!("invalid radius {r}"),
                ));
            }
            None => return Err(ValidationError::new(resource, Some(key_label), "missing radius")),
        };

        Ok(GeofenceEntity {
            key: EntityKey::Id(id),
            center,
            radius_meters: Some(radius),
            availability: self.is_available,
            description: self.description.map(Arc::from),
            name: self.name.map(Arc::from),
            kind: EntityKind::Hangar,
        })
    }

    fn into_droppoint(self) -> Result<GeofenceEntity, ValidationError> {
        let resource = ResourceKind::Droppoints;
        let name: Arc<str> = match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.into(),
            _ => {
                let key = self.id.map(|id| Arc::from(id.to_string()));
                return Err(ValidationError::new(resource, key, "missing name"));
            }
        };

        let center = self.center(resource, &name)?;

        Ok(GeofenceEntity {
            key: EntityKey::Name(name.clone()),
            center,
            radius_meters: None,
            availability: self.is_available,
            description: self.description.map(Arc::from),
            name: Some(name),
            kind: EntityKind::Droppoint,
        })
    }

    fn center(&self, resource: ResourceKind, key: &Arc<str>) -> Result<LatLng, ValidationError> {
        let (Some(lat), Some(lng)) = (self.latitude, self.longitude) else {
            return Err(ValidationError::new(
                resource,
                Some(key.clone()),
                "missing latitude or longitude",
            ));
        };
        LatLng::new(lat, lng)
            .map_err(|e| ValidationError::new(resource, Some(key.clone()), e.to_string()))
    }
}

/// Best-effort key of a record that may not decode
fn raw_key(resource: ResourceKind, value: &Value) -> Option<Arc<str>> {
    let field = match resource {
        ResourceKind::Hangars => "id",
        ResourceKind::Droppoints => "name",
    };
    match value.get(field)? {
        Value::String(s) => Some(s.as_str().into()),
        Value::Null => None,
        other => Some(other.to_string().into()),
    }
}
