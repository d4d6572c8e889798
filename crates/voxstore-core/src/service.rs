//! Cache-aside lookup service over the voice catalog
//!
//! Read path: consult [`LookupCache`] first, fall back to [`VoiceStore`] and
//! populate the cache on the way out. Write path: mutate the store, then
//! invalidate the affected detail key. The store is authoritative
//! throughout; every cache interaction is best-effort and a cache failure
//! downgrades to a store read, never to an operation failure.
//!
//! Absent data is `Ok(None)`, never an error, and never cached.

use crate::catalog::{ModelCatalog, PermissiveCatalog};
use crate::error::CoreError;
use crate::models::{
    Page, PageQuery, TimbreDetails, TimbreFilter, TimbreRecord, TimbreUpsert, UserId, VoiceId,
    VoiceName,
};
use crate::store::VoiceStore;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};
use voxstore_cache::{LookupCache, keys};

/// Tunables for [`TimbreService`]
#[derive(Debug, Clone)]
pub struct TimbreServiceConfig {
    /// Marker prepended to clone-derived display names
    pub clone_name_prefix: String,
}

impl Default for TimbreServiceConfig {
    fn default() -> Self {
        Self {
            clone_name_prefix: "[Cloned] ".to_string(),
        }
    }
}

/// Data-access service for timbre records.
///
/// Single-item detail and name lookups are cached; listings always go to
/// the store. Concurrent calls are safe but uncoordinated: two updates to
/// the same id race, and the last cache invalidation wins.
pub struct TimbreService {
    store: Arc<VoiceStore>,
    cache: Arc<LookupCache>,
    catalog: Arc<dyn ModelCatalog>,
    config: TimbreServiceConfig,
}

impl TimbreService {
    /// Create a service that accepts any TTS model id.
    pub fn new(store: Arc<VoiceStore>, cache: Arc<LookupCache>) -> Self {
        Self {
            store,
            cache,
            catalog: Arc::new(PermissiveCatalog),
            config: TimbreServiceConfig::default(),
        }
    }

    /// Validate writes against a model registry.
    pub fn with_catalog(mut self, catalog: Arc<dyn ModelCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_config(mut self, config: TimbreServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// One page of detail projections for a model, optionally filtered by
    /// a name substring. List results are never cached.
    pub fn page(
        &self,
        filter: &TimbreFilter,
        query: &PageQuery,
    ) -> Result<Page<TimbreDetails>, CoreError> {
        let (records, total) = self.store.page(filter, query)?;
        let items = records.iter().map(TimbreRecord::details).collect();
        Ok(Page::new(items, total, *query))
    }

    /// Detail projection for one timbre, cache-aside on `timbre:details:{id}`.
    ///
    /// A cached projection is returned as-is without store re-validation.
    /// Blank ids and missing records are `Ok(None)` and leave no cache
    /// entry behind.
    pub fn details(&self, id: &str) -> Result<Option<TimbreDetails>, CoreError> {
        if is_blank(id) {
            return Ok(None);
        }

        let key = keys::timbre_details(id);
        if let Some(details) = self.cache_get::<TimbreDetails>(&key) {
            return Ok(Some(details));
        }

        let Some(record) = self.store.get(id)? else {
            return Ok(None);
        };

        let details = record.details();
        self.cache_set(&key, &details);
        Ok(Some(details))
    }

    /// Insert a new timbre under a freshly minted id.
    ///
    /// The model id is validated first, so a rejected write leaves the
    /// store untouched.
    pub fn create(&self, data: &TimbreUpsert) -> Result<VoiceId, CoreError> {
        self.ensure_known_model(&data.tts_model_id)?;

        let id = VoiceId::generate();
        let record = TimbreRecord::from_upsert(id.clone(), data, Utc::now());
        self.store.insert(&record)?;

        debug!(id = %id, model = %data.tts_model_id, "Timbre created");
        Ok(id)
    }

    /// Overwrite the timbre at `id` with `data`, then drop its detail key.
    ///
    /// Identity comes from the caller, never from the payload. An id with
    /// no stored row is a no-op, not an error; the invalidation still runs
    /// so the next read repopulates lazily either way.
    pub fn update(&self, id: &str, data: &TimbreUpsert) -> Result<(), CoreError> {
        self.ensure_known_model(&data.tts_model_id)?;

        let record = TimbreRecord::from_upsert(VoiceId::from(id), data, Utc::now());
        let updated = self.store.update(&record)?;
        if !updated {
            debug!(id, "Timbre update matched no row");
        }

        self.cache.delete(&keys::timbre_details(id));
        Ok(())
    }

    /// Batch-delete timbres, returning how many rows were removed.
    ///
    /// Detail keys are left in the cache, so [`Self::details`] can keep
    /// serving a deleted id's old projection until its TTL lapses. It is
    /// never re-populated once the row is gone.
    pub fn delete(&self, ids: &[VoiceId]) -> Result<usize, CoreError> {
        let removed = self.store.delete_many(ids)?;
        debug!(requested = ids.len(), removed, "Timbres deleted");
        Ok(removed)
    }

    /// Id/name entries for a model: the caller's trained clones first (in
    /// clone-query order, newest first), then stored timbres in `(sort, id)`
    /// order. An empty combined result is `Ok(None)`.
    ///
    /// Clone names get the configured prefix and are pinned under
    /// `timbre:name:{id}` with no expiry, so the synthesis path can resolve
    /// them without touching the clone store. Stored-timbre names are not
    /// cached here.
    pub fn voice_names(
        &self,
        tts_model_id: &str,
        name_like: Option<&str>,
        caller: Option<UserId>,
    ) -> Result<Option<Vec<VoiceName>>, CoreError> {
        // Stored rows under a blank model id live at the empty string; the
        // clone query keys on the raw model id.
        let filter = TimbreFilter {
            tts_model_id: if is_blank(tts_model_id) {
                String::new()
            } else {
                tts_model_id.to_string()
            },
            name_like: name_like.filter(|s| !is_blank(s)).map(str::to_string),
        };
        let stored = self.store.list(&filter)?;

        let mut names = Vec::new();
        if let Some(user) = caller {
            for clone in self.store.trained_clones(tts_model_id, user)? {
                let name = format!("{}{}", self.config.clone_name_prefix, clone.name);
                self.cache_set_forever(&keys::timbre_name(clone.id.as_str()), &name);
                names.push(VoiceName::new(clone.id, name));
            }
        }
        names.extend(
            stored
                .into_iter()
                .map(|record| VoiceName::new(record.id, record.name)),
        );

        if names.is_empty() { Ok(None) } else { Ok(Some(names)) }
    }

    /// Display name for a voice id, cache-aside on `timbre:name:{id}`.
    ///
    /// A non-blank cached value is returned immediately. Otherwise the
    /// timbre store is consulted; a found record's name is returned as-is
    /// and cached only when non-blank. Ids absent from the timbre store
    /// fall back to the clone store, where a hit yields the prefixed clone
    /// name pinned with no expiry.
    pub fn name_by_id(&self, id: &str) -> Result<Option<String>, CoreError> {
        if is_blank(id) {
            return Ok(None);
        }

        let key = keys::timbre_name(id);
        if let Some(cached) = self.cache_get::<String>(&key) {
            if !is_blank(&cached) {
                return Ok(Some(cached));
            }
        }

        if let Some(record) = self.store.get(id)? {
            if !is_blank(&record.name) {
                self.cache_set(&key, &record.name);
            }
            return Ok(Some(record.name));
        }

        if let Some(clone) = self.store.clone_by_id(id)? {
            let name = format!("{}{}", self.config.clone_name_prefix, clone.name);
            self.cache_set_forever(&key, &name);
            return Ok(Some(name));
        }

        Ok(None)
    }

    /// First `(sort, id)`-ordered match for a model's voice code, never
    /// cached. A blank code is `Ok(None)` regardless of store contents.
    pub fn by_voice_code(
        &self,
        tts_model_id: &str,
        voice_code: &str,
    ) -> Result<Option<VoiceName>, CoreError> {
        if is_blank(voice_code) {
            return Ok(None);
        }

        let found = self.store.find_by_voice_code(tts_model_id, voice_code)?;
        Ok(found.map(|record| VoiceName::new(record.id, record.name)))
    }

    fn ensure_known_model(&self, model_id: &str) -> Result<(), CoreError> {
        if self.catalog.contains(model_id) {
            Ok(())
        } else {
            Err(CoreError::UnknownTtsModel {
                model_id: model_id.to_string(),
            })
        }
    }

    fn cache_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    fn cache_set<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.cache.set(key, value) {
            warn!(key, error = %e, "Cache write failed");
        }
    }

    fn cache_set_forever<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.cache.set_forever(key, value) {
            warn!(key, error = %e, "Cache write failed");
        }
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RegistryCatalog;
    use crate::models::{TrainStatus, VoiceCloneRecord};

    fn service() -> (TimbreService, Arc<VoiceStore>, Arc<LookupCache>) {
        let store = Arc::new(VoiceStore::open_in_memory().unwrap());
        let cache = Arc::new(LookupCache::with_defaults());
        let service = TimbreService::new(Arc::clone(&store), Arc::clone(&cache));
        (service, store, cache)
    }

    fn upsert(model: &str, name: &str) -> TimbreUpsert {
        TimbreUpsert {
            tts_model_id: model.to_string(),
            name: name.to_string(),
            voice_code: format!("code-{name}"),
            languages: None,
            remark: None,
            sort: 0,
        }
    }

    #[test]
    fn test_details_blank_id_is_none() {
        let (service, store, _cache) = service();
        assert!(service.details("").unwrap().is_none());
        assert!(service.details("   ").unwrap().is_none());
        assert_eq!(store.lookup_count(), 0);
    }

    #[test]
    fn test_create_rejects_unknown_model() {
        let (service, store, _cache) = service();
        let service = service.with_catalog(Arc::new(RegistryCatalog::with_models(["known"])));

        let err = service.create(&upsert("unknown", "Luna")).unwrap_err();
        assert!(matches!(err, CoreError::UnknownTtsModel { .. }));
        assert_eq!(store.timbre_count().unwrap(), 0);

        service.create(&upsert("known", "Luna")).unwrap();
        assert_eq!(store.timbre_count().unwrap(), 1);
    }

    #[test]
    fn test_update_forces_payload_identity() {
        let (service, _store, _cache) = service();
        let id = service.create(&upsert("m", "Luna")).unwrap();

        service.update(id.as_str(), &upsert("m", "Nova")).unwrap();

        let details = service.details(id.as_str()).unwrap().unwrap();
        assert_eq!(details.id, id);
        assert_eq!(details.name, "Nova");
    }

    #[test]
    fn test_update_missing_id_is_noop() {
        let (service, store, _cache) = service();
        service.update("t-404", &upsert("m", "Ghost")).unwrap();
        assert_eq!(store.timbre_count().unwrap(), 0);
    }

    #[test]
    fn test_voice_names_normalizes_blank_model() {
        let (service, _store, _cache) = service();
        service.create(&upsert("", "Unfiled")).unwrap();
        service.create(&upsert("m", "Filed")).unwrap();

        let names = service.voice_names("   ", None, None).unwrap().unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].name, "Unfiled");
    }

    #[test]
    fn test_voice_names_empty_is_none() {
        let (service, _store, _cache) = service();
        assert!(service.voice_names("m", None, None).unwrap().is_none());
    }

    #[test]
    fn test_name_by_id_blank_cached_value_falls_through() {
        let (service, _store, cache) = service();
        let id = service.create(&upsert("m", "Luna")).unwrap();

        // A blank cached name must not shadow the stored one.
        cache.set(&keys::timbre_name(id.as_str()), &"  ").unwrap();

        let name = service.name_by_id(id.as_str()).unwrap();
        assert_eq!(name.as_deref(), Some("Luna"));
    }

    #[test]
    fn test_name_by_id_blank_store_name_not_cached() {
        let (service, _store, cache) = service();
        let id = service.create(&upsert("m", "")).unwrap();

        let name = service.name_by_id(id.as_str()).unwrap();
        assert_eq!(name.as_deref(), Some(""));
        assert!(!cache.contains(&keys::timbre_name(id.as_str())));
    }

    #[test]
    fn test_name_by_id_clone_fallback_uses_prefix() {
        let (service, store, cache) = service();
        store
            .insert_clone(&VoiceCloneRecord {
                id: VoiceId::from("c-1"),
                tts_model_id: "m".to_string(),
                user_id: UserId::new(7),
                name: "my voice".to_string(),
                train_status: TrainStatus::Success,
                created_at: Utc::now(),
            })
            .unwrap();

        let name = service.name_by_id("c-1").unwrap();
        assert_eq!(name.as_deref(), Some("[Cloned] my voice"));
        assert!(cache.contains(&keys::timbre_name("c-1")));
    }

    #[test]
    fn test_custom_clone_prefix() {
        let (service, store, _cache) = service();
        let service = service.with_config(TimbreServiceConfig {
            clone_name_prefix: "(clone) ".to_string(),
        });
        store
            .insert_clone(&VoiceCloneRecord {
                id: VoiceId::from("c-1"),
                tts_model_id: "m".to_string(),
                user_id: UserId::new(7),
                name: "mine".to_string(),
                train_status: TrainStatus::Success,
                created_at: Utc::now(),
            })
            .unwrap();

        let name = service.name_by_id("c-1").unwrap();
        assert_eq!(name.as_deref(), Some("(clone) mine"));
    }
}
