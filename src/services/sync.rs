//! Geofence Sync
//!
//! Drives one sync cycle per resource kind:
//!
//! ```text
//! CollectionFetcher::fetch ──► decode + validate ──► build index
//!        (await)                                        │
//!                                                       ▼
//!                        remove_kind ──► add overlays ──► swap index
//! ```
//!
//! The fetch is the only suspension point. Everything after it runs without
//! yielding, and every cycle holds `&mut self`, so two cycles can never
//! interleave on the same instance. Nothing is touched until the fetch has
//! succeeded: a failed fetch leaves the previous index and overlays in place.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

use crate::domain::config::DisplayConfig;
use crate::domain::facility::{
    EntityKey, FacilityRecord, GeofenceEntity, GeofenceIndex, ValidationError,
};
use crate::domain::overlay::{
    CircleOverlay, FillStyle, InfoPopup, Overlay, PointOverlay, StrokeStyle, display_radius,
};
use crate::domain::resource::{EntityKind, ResourceKind};
use crate::error::{Error, Result};
use crate::services::events::SyncEvent;
use crate::services::fetcher::CollectionFetcher;
use crate::services::registry::OverlayRegistry;
use crate::services::surface::MapSurface;

/// Result of a successful sync cycle
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub kind: EntityKind,
    /// The index as it stands after the cycle
    pub entities: GeofenceIndex,
    /// Records that were skipped
    pub warnings: Vec<ValidationError>,
    pub synced_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Keeps the per-kind indexes and the overlay registry in step with the API
#[derive(Debug)]
pub struct GeofenceSync<F, S> {
    fetcher: F,
    registry: OverlayRegistry<S>,
    hangars: GeofenceIndex,
    droppoints: GeofenceIndex,
    radius_scale: f64,
    droppoint_icon: Option<Arc<str>>,
    events: Option<Sender<SyncEvent>>,
}

impl<F: CollectionFetcher, S: MapSurface> GeofenceSync<F, S> {
    pub fn new(fetcher: F, registry: OverlayRegistry<S>, display: &DisplayConfig) -> Result<Self> {
        if !display.radius_scale.is_finite() || display.radius_scale <= 0.0 {
            return Err(Error::Invalid {
                message: format!("radius_scale must be positive, got {}", display.radius_scale),
            });
        }

        Ok(Self {
            fetcher,
            registry,
            hangars: GeofenceIndex::default(),
            droppoints: GeofenceIndex::default(),
            radius_scale: display.radius_scale,
            droppoint_icon: display.droppoint_icon.as_deref().map(Arc::from),
            events: None,
        })
    }

    /// Emit a [`SyncEvent`] after every cycle
    pub fn with_events(mut self, tx: Sender<SyncEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Refresh hangars; one circle per hangar
    pub async fn sync_hangars(&mut self) -> Result<SyncReport> {
        self.sync(ResourceKind::Hangars).await
    }

    /// Refresh droppoints; one marker with an info popup per droppoint
    pub async fn sync_droppoints(&mut self) -> Result<SyncReport> {
        self.sync(ResourceKind::Droppoints).await
    }

    /// Refresh whichever kind `kind` names
    pub async fn sync_kind(&mut self, kind: EntityKind) -> Result<SyncReport> {
        self.sync(kind.resource()).await
    }

    /// Reserved for meteo stations; currently does nothing
    pub fn sync_weather_stations(&mut self) {
        debug!("weather station sync is not available yet");
    }

    /// Refresh both kinds; a failure of one does not stop the other
    pub async fn sync_all(&mut self) -> (Result<SyncReport>, Result<SyncReport>) {
        let hangars = self.sync_hangars().await;
        let droppoints = self.sync_droppoints().await;
        (hangars, droppoints)
    }

    async fn sync(&mut self, resource: ResourceKind) -> Result<SyncReport> {
        let kind = resource.entity_kind();

        let records = match self.fetcher.fetch(resource).await {
            Ok(records) => records,
            Err(e) => {
                warn!("{resource}: sync failed, keeping previous state: {e}");
                self.emit(SyncEvent::Failed {
                    kind,
                    message: e.to_string().into(),
                    at: Utc::now(),
                });
                return Err(e);
            }
        };

        let total = records.len();
        let (mut index, order, mut warnings) = build_index(resource, records);

        // Every overlay is built before anything is torn down
        let mut overlays = Vec::with_capacity(order.len());
        for key in &order {
            let Some(entity) = index.get(key) else {
                continue;
            };
            match self.overlay_for(entity) {
                Ok(overlay) => overlays.push(overlay),
                Err(warning) => {
                    index.remove(key);
                    warnings.push(warning);
                }
            }
        }
        for warning in &warnings {
            warn!("{warning}");
        }

        // Replace this kind's overlays, then its index
        self.registry.remove_kind(kind);
        for (overlay, popup) in overlays {
            let handle = self.registry.add(kind, overlay)?;
            if let Some(popup) = popup {
                self.registry.bind_popup(handle, &popup)?;
            }
        }

        let slot = match kind {
            EntityKind::Hangar => &mut self.hangars,
            EntityKind::Droppoint => &mut self.droppoints,
        };
        *slot = index;

        let report = SyncReport {
            kind,
            entities: slot.clone(),
            warnings,
            synced_at: Utc::now(),
        };

        info!(
            "{resource}: synced {} entities from {total} records ({} skipped)",
            report.entities.len(),
            report.warnings.len()
        );
        self.emit(SyncEvent::Synced {
            kind,
            entities: report.entities.len(),
            warnings: report.warnings.clone(),
            at: report.synced_at,
        });

        Ok(report)
    }

    /// Overlay and optional popup for one entity
    ///
    /// Fails when the drawn radius would not be a finite distance.
    fn overlay_for(
        &self,
        entity: &GeofenceEntity,
    ) -> Result<(Overlay, Option<InfoPopup>), ValidationError> {
        let title: Arc<str> = entity.kind.as_str().into();
        match entity.kind {
            EntityKind::Hangar => {
                let radius = entity.radius_meters.unwrap_or_default();
                let drawn = display_radius(radius, self.radius_scale);
                if !drawn.is_finite() {
                    return Err(ValidationError::new(
                        entity.kind.resource(),
                        Some(entity.key.to_string().into()),
                        format!("radius {radius} cannot be drawn at scale {}", self.radius_scale),
                    ));
                }
                let circle = CircleOverlay {
                    center: entity.center,
                    radius_meters: drawn,
                    stroke: StrokeStyle::hangar(),
                    fill: FillStyle::hangar(),
                    title: Some(title),
                };
                Ok((circle.into(), None))
            }
            EntityKind::Droppoint => {
                let point = PointOverlay {
                    position: entity.center,
                    icon: self.droppoint_icon.clone(),
                    title: Some(title),
                };
                let popup = InfoPopup::new(
                    entity.name.clone().unwrap_or_else(|| entity.key.to_string().into()),
                    entity.description.clone().unwrap_or_else(|| "".into()),
                );
                Ok((point.into(), Some(popup)))
            }
        }
    }

    fn emit(&self, event: SyncEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    pub fn hangars(&self) -> &GeofenceIndex {
        &self.hangars
    }

    pub fn droppoints(&self) -> &GeofenceIndex {
        &self.droppoints
    }

    pub fn index(&self, kind: EntityKind) -> &GeofenceIndex {
        match kind {
            EntityKind::Hangar => &self.hangars,
            EntityKind::Droppoint => &self.droppoints,
        }
    }

    pub fn registry(&self) -> &OverlayRegistry<S> {
        &self.registry
    }

    /// Direct registry access, e.g. for `clear_all`/`show_all` toggles
    pub fn registry_mut(&mut self) -> &mut OverlayRegistry<S> {
        &mut self.registry
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }
}

/// Decode a batch into an index, keeping first-seen key order for overlay
/// placement. A later record with the same key replaces the earlier one.
fn build_index(
    resource: ResourceKind,
    records: Vec<serde_json::Value>,
) -> (GeofenceIndex, Vec<EntityKey>, Vec<ValidationError>) {
    let mut index = GeofenceIndex::default();
    let mut order = Vec::with_capacity(records.len());
    let mut warnings = Vec::new();

    for value in records {
        let entity = FacilityRecord::decode(resource, value)
            .and_then(|record| record.into_entity(resource));
        match entity {
            Ok(entity) => {
                let key = entity.key.clone();
                if index.insert(key.clone(), entity).is_none() {
                    order.push(key);
                }
            }
            Err(warning) => warnings.push(warning),
        }
    }

    (index, order, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::geo::LatLng;
    use crate::services::fetcher::testing::ScriptedFetcher;
    use crate::services::surface::RecordingSurface;
    use serde_json::json;

    type TestSync = GeofenceSync<ScriptedFetcher, RecordingSurface>;

    fn new_sync() -> TestSync {
        GeofenceSync::new(
            ScriptedFetcher::new(),
            OverlayRegistry::new(RecordingSurface::new()),
            &DisplayConfig::default(),
        )
        .expect("valid display config")
    }

    fn hangar(id: i64, lat: f64, lng: f64, radius: f64) -> serde_json::Value {
        json!({"id": id, "latitude": lat, "longitude": lng, "radius": radius, "is_available": true})
    }

    fn respond(sync: &TestSync, resource: ResourceKind, results: Vec<serde_json::Value>) {
        sync.fetcher().respond(resource, json!({"count": results.len(), "results": results}));
    }

    /// Every index entry of `kind` has exactly one overlay and vice versa
    fn assert_consistent(sync: &TestSync, kind: EntityKind) {
        assert_eq!(sync.registry().count(kind), sync.index(kind).len());
    }

    #[tokio::test]
    async fn test_hangar_scenario() {
        let mut sync = new_sync();
        respond(&sync, ResourceKind::Hangars, vec![hangar(1, 10.0, 20.0, 50.0)]);

        let report = sync.sync_hangars().await.expect("sync");
        assert!(report.is_clean());

        let entity = sync.hangars().get(&EntityKey::Id(1)).expect("hangar 1");
        assert_eq!(entity.center, LatLng::new(10.0, 20.0).expect("valid"));
        assert_eq!(entity.radius_meters, Some(50.0));
        assert!(entity.availability);
        assert_eq!(entity.kind, EntityKind::Hangar);

        let handles = sync.registry().handles(EntityKind::Hangar);
        assert_eq!(handles.len(), 1);
        let circle = sync
            .registry()
            .get(handles[0])
            .and_then(Overlay::as_circle)
            .expect("circle overlay");
        assert_eq!(circle.center, entity.center);
        assert_eq!(circle.radius_meters, 50.0_f64.sqrt() * 28.0);
        assert_eq!(circle.title.as_deref(), Some("hangar"));
    }

    #[tokio::test]
    async fn test_droppoint_scenario() {
        let mut sync = new_sync();
        respond(
            &sync,
            ResourceKind::Droppoints,
            vec![json!({
                "name": "north", "latitude": 5, "longitude": 5,
                "is_available": false, "description": "closed"
            })],
        );

        sync.sync_droppoints().await.expect("sync");

        let entity = sync.droppoints().get(&EntityKey::from("north")).expect("north");
        assert!(!entity.availability);

        let handles = sync.registry().handles(EntityKind::Droppoint);
        assert_eq!(handles.len(), 1);
        assert!(sync.registry().get(handles[0]).and_then(Overlay::as_point).is_some());

        let surface_handle = sync.registry().surface_handle(handles[0]).expect("placed");
        let html = sync.registry().surface().click(surface_handle).expect("popup");
        assert!(html.contains(">north</h5>"));
        assert!(html.contains("<p>closed</p>"));
    }

    #[tokio::test]
    async fn test_repeated_identical_sync_is_idempotent() {
        let mut sync = new_sync();
        let batch = vec![hangar(1, 1.0, 1.0, 4.0), hangar(2, 2.0, 2.0, 9.0)];
        respond(&sync, ResourceKind::Hangars, batch.clone());
        respond(&sync, ResourceKind::Hangars, batch);

        sync.sync_hangars().await.expect("first");
        sync.sync_hangars().await.expect("second");

        assert_eq!(sync.hangars().len(), 2);
        assert_eq!(sync.registry().count(EntityKind::Hangar), 2);
        assert_eq!(sync.registry().surface().len(), 2);
    }

    #[tokio::test]
    async fn test_disjoint_syncs_leave_only_latest() {
        let mut sync = new_sync();
        respond(&sync, ResourceKind::Hangars, vec![hangar(1, 1.0, 1.0, 4.0), hangar(2, 2.0, 2.0, 4.0)]);
        respond(&sync, ResourceKind::Hangars, vec![hangar(3, 3.0, 3.0, 4.0)]);

        sync.sync_hangars().await.expect("first");
        sync.sync_hangars().await.expect("second");

        let keys: Vec<_> = sync.hangars().keys().cloned().collect();
        assert_eq!(keys, vec![EntityKey::Id(3)]);
        assert_consistent(&sync, EntityKind::Hangar);
        assert_eq!(sync.registry().surface().len(), 1);

        let handle = sync.registry().handles(EntityKind::Hangar)[0];
        let position = sync.registry().get(handle).map(Overlay::position);
        assert_eq!(position, Some(LatLng::new(3.0, 3.0).expect("valid")));
    }

    #[tokio::test]
    async fn test_invalid_records_reported_and_skipped() {
        let mut sync = new_sync();
        respond(
            &sync,
            ResourceKind::Hangars,
            vec![
                hangar(1, 10.0, 20.0, 50.0),
                hangar(2, 120.0, 0.0, 5.0),
                json!({"id": 3, "latitude": "north", "longitude": 0.0, "radius": 1.0}),
                json!({"id": 4, "longitude": 0.0, "radius": 1.0}),
            ],
        );

        let report = sync.sync_hangars().await.expect("sync");

        let skipped: Vec<_> = report.warnings.iter().map(|w| w.key.as_deref()).collect();
        assert_eq!(skipped, vec![Some("2"), Some("3"), Some("4")]);
        assert!(report.warnings.iter().all(|w| w.resource == ResourceKind::Hangars));
        assert_eq!(report.entities.len(), 1);
        assert!(sync.hangars().contains_key(&EntityKey::Id(1)));
        assert_consistent(&sync, EntityKind::Hangar);
    }

    #[tokio::test]
    async fn test_invalid_droppoints_reported_and_skipped() {
        let mut sync = new_sync();
        respond(
            &sync,
            ResourceKind::Droppoints,
            vec![
                json!({"name": "north", "latitude": 5.0, "longitude": 5.0}),
                json!({"name": "south", "latitude": 0.0, "longitude": 200.0}),
            ],
        );

        let report = sync.sync_droppoints().await.expect("sync");

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].resource, ResourceKind::Droppoints);
        assert_eq!(report.warnings[0].key.as_deref(), Some("south"));
        assert!(sync.droppoints().contains_key(&EntityKey::from("north")));
        assert!(!sync.droppoints().contains_key(&EntityKey::from("south")));
        assert_consistent(&sync, EntityKind::Droppoint);
    }

    #[tokio::test]
    async fn test_undrawable_radius_is_a_warning() {
        let display = DisplayConfig {
            radius_scale: 1e300,
            ..Default::default()
        };
        let mut sync = GeofenceSync::new(
            ScriptedFetcher::new(),
            OverlayRegistry::new(RecordingSurface::new()),
            &display,
        )
        .expect("valid display config");
        respond(&sync, ResourceKind::Hangars, vec![hangar(1, 1.0, 1.0, 4.0)]);
        respond(
            &sync,
            ResourceKind::Hangars,
            vec![hangar(2, 2.0, 2.0, 4.0), hangar(3, 3.0, 3.0, 1e300)],
        );

        sync.sync_hangars().await.expect("first");
        let report = sync.sync_hangars().await.expect("second");

        let skipped: Vec<_> = report.warnings.iter().map(|w| w.key.as_deref()).collect();
        assert_eq!(skipped, vec![Some("3")]);
        let keys: Vec<_> = sync.hangars().keys().cloned().collect();
        assert_eq!(keys, vec![EntityKey::Id(2)]);
        assert_consistent(&sync, EntityKind::Hangar);

        let positions: Vec<_> = sync
            .registry()
            .handles(EntityKind::Hangar)
            .into_iter()
            .filter_map(|h| sync.registry().get(h).map(Overlay::position))
            .collect();
        assert_eq!(positions, vec![LatLng::new(2.0, 2.0).expect("valid")]);
        assert_eq!(sync.registry().surface().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_error_keeps_previous_state() {
        let mut sync = new_sync();
        respond(&sync, ResourceKind::Hangars, vec![hangar(1, 1.0, 1.0, 4.0)]);
        sync.fetcher().fail(ResourceKind::Hangars, "connection refused");

        sync.sync_hangars().await.expect("first");
        let index_before = sync.hangars().clone();
        let handles_before = sync.registry().handles(EntityKind::Hangar);

        let err = sync.sync_hangars().await.expect_err("second fails");
        assert!(matches!(
            err,
            Error::Fetch {
                resource: ResourceKind::Hangars,
                ..
            }
        ));
        assert_eq!(**sync.hangars(), *index_before);
        assert_eq!(sync.registry().handles(EntityKind::Hangar), handles_before);
        assert_eq!(sync.registry().visible_count(), 1);
    }

    #[tokio::test]
    async fn test_kinds_do_not_touch_each_other() {
        let mut sync = new_sync();
        respond(&sync, ResourceKind::Hangars, vec![hangar(1, 1.0, 1.0, 4.0)]);
        respond(
            &sync,
            ResourceKind::Droppoints,
            vec![json!({"name": "a", "latitude": 0.0, "longitude": 0.0, "description": ""})],
        );
        respond(&sync, ResourceKind::Droppoints, vec![]);

        sync.sync_hangars().await.expect("hangars");
        let hangar_handles = sync.registry().handles(EntityKind::Hangar);

        sync.sync_droppoints().await.expect("droppoints");
        assert_eq!(sync.registry().count(EntityKind::Droppoint), 1);

        let report = sync.sync_droppoints().await.expect("empty droppoints");
        assert!(report.entities.is_empty());
        assert_eq!(sync.registry().count(EntityKind::Droppoint), 0);
        assert_eq!(sync.registry().handles(EntityKind::Hangar), hangar_handles);
        assert_eq!(sync.hangars().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_keys_last_write_wins() {
        let mut sync = new_sync();
        respond(
            &sync,
            ResourceKind::Hangars,
            vec![hangar(1, 1.0, 1.0, 4.0), hangar(2, 2.0, 2.0, 4.0), hangar(1, 5.0, 5.0, 9.0)],
        );

        sync.sync_hangars().await.expect("sync");

        let entity = sync.hangars().get(&EntityKey::Id(1)).expect("hangar 1");
        assert_eq!(entity.center, LatLng::new(5.0, 5.0).expect("valid"));
        assert_consistent(&sync, EntityKind::Hangar);

        // first-seen order is kept for placement
        let positions: Vec<_> = sync
            .registry()
            .handles(EntityKind::Hangar)
            .into_iter()
            .filter_map(|h| sync.registry().get(h).map(Overlay::position))
            .collect();
        assert_eq!(
            positions,
            vec![
                LatLng::new(5.0, 5.0).expect("valid"),
                LatLng::new(2.0, 2.0).expect("valid")
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_results_is_empty_collection() {
        let mut sync = new_sync();
        sync.fetcher().respond(ResourceKind::Hangars, json!({"detail": "nothing here"}));

        let report = sync.sync_hangars().await.expect("empty is not an error");
        assert!(report.entities.is_empty());
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_events_are_emitted() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut sync = new_sync().with_events(tx);
        respond(&sync, ResourceKind::Hangars, vec![hangar(1, 1.0, 1.0, 4.0), hangar(2, 99.0, 0.0, 1.0)]);
        sync.fetcher().fail(ResourceKind::Droppoints, "timeout");

        let (hangars, droppoints) = sync.sync_all().await;
        assert!(hangars.is_ok());
        assert!(droppoints.is_err());

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            SyncEvent::Synced {
                kind,
                entities,
                warnings,
                ..
            } => {
                assert_eq!(*kind, EntityKind::Hangar);
                assert_eq!(*entities, 1);
                assert_eq!(warnings.len(), 1);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(events[1].is_failure());
        assert_eq!(events[1].kind(), EntityKind::Droppoint);
    }

    #[tokio::test]
    async fn test_clear_and_show_survive_sync_state() {
        let mut sync = new_sync();
        respond(&sync, ResourceKind::Hangars, vec![hangar(1, 1.0, 1.0, 4.0)]);
        sync.sync_hangars().await.expect("sync");

        let visible = sync.registry().visible_handles();
        sync.registry_mut().clear_all();
        assert_eq!(sync.registry().visible_count(), 0);
        sync.registry_mut().show_all();
        assert_eq!(sync.registry().visible_handles(), visible);
        assert_eq!(sync.fetcher().calls(), 1);
    }

    #[test]
    fn test_weather_station_sync_is_noop() {
        let mut sync = new_sync();
        sync.sync_weather_stations();
        assert!(sync.registry().is_empty());
        assert_eq!(sync.fetcher().calls(), 0);
    }

    #[test]
    fn test_rejects_non_positive_radius_scale() {
        let display = DisplayConfig {
            radius_scale: 0.0,
            ..Default::default()
        };
        let result = GeofenceSync::new(
            ScriptedFetcher::new(),
            OverlayRegistry::new(RecordingSurface::new()),
            &display,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_droppoint_icon_from_config() {
        let display = DisplayConfig {
            droppoint_icon: Some("/static/img/drop.png".into()),
            ..Default::default()
        };
        let sync = GeofenceSync::new(
            ScriptedFetcher::new(),
            OverlayRegistry::new(RecordingSurface::new()),
            &display,
        )
        .expect("valid");
        let entity = GeofenceEntity {
            key: EntityKey::from("a"),
            center: LatLng::new(0.0, 0.0).expect("valid"),
            radius_meters: None,
            availability: true,
            description: None,
            name: Some("a".into()),
            kind: EntityKind::Droppoint,
        };
        let (overlay, popup) = sync.overlay_for(&entity).expect("drawable");
        assert_eq!(
            overlay.as_point().and_then(|p| p.icon.as_deref()),
            Some("/static/img/drop.png")
        );
        assert_eq!(popup.map(|p| p.description), Some(Arc::from("")));
    }
}
