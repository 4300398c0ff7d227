use anyhow::Result;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

use crate::model::{
    App, Collection, CollectionUpdate, DailyStat, DateRange, Id, NewCollection, SiteSeries,
    UsageField,
};
use crate::store::traits::{
    AppStore, CollectionStore, GrantStore, MembershipChange, StatsStore, Store,
};

/// Update count row: active users plus every breakdown column
#[derive(Debug, Clone, Default)]
struct UpdateRow {
    count: i64,
    breakdowns: HashMap<UsageField, BTreeMap<String, i64>>,
}

#[derive(Debug, Default)]
struct Inner {
    next_collection_id: Id,
    collections: BTreeMap<Id, Collection>,
    apps: HashMap<Id, App>,
    grants: HashMap<String, Vec<String>>,
    downloads: HashMap<Id, BTreeMap<chrono::NaiveDate, DailyStat>>,
    updates: HashMap<Id, BTreeMap<chrono::NaiveDate, UpdateRow>>,
    globals: HashMap<SiteSeries, BTreeMap<chrono::NaiveDate, i64>>,
}

/// In-process store used for development and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_downloads(&self, addon_id: Id, stat: DailyStat) {
        self.inner
            .write()
            .downloads
            .entry(addon_id)
            .or_default()
            .insert(stat.date, stat);
    }

    pub fn record_updates(
        &self,
        addon_id: Id,
        date: chrono::NaiveDate,
        count: i64,
        breakdowns: impl IntoIterator<Item = (UsageField, BTreeMap<String, i64>)>,
    ) {
        let row = UpdateRow {
            count,
            breakdowns: breakdowns.into_iter().collect(),
        };
        self.inner
            .write()
            .updates
            .entry(addon_id)
            .or_default()
            .insert(date, row);
    }

    pub fn record_global(&self, series: SiteSeries, date: chrono::NaiveDate, count: i64) {
        self.inner
            .write()
            .globals
            .entry(series)
            .or_default()
            .insert(date, count);
    }
}

#[async_trait::async_trait]
impl CollectionStore for MemoryStore {
    async fn get_collection(&self, id: Id) -> Result<Option<Collection>> {
        Ok(self.inner.read().collections.get(&id).cloned())
    }

    async fn list_collections(&self, limit: usize, offset: usize) -> Result<Vec<Collection>> {
        Ok(self
            .inner
            .read()
            .collections
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_collections(&self) -> Result<usize> {
        Ok(self.inner.read().collections.len())
    }

    async fn create_collection(&self, collection: NewCollection) -> Result<Collection> {
        let mut inner = self.inner.write();
        inner.next_collection_id += 1;
        let created = Collection::new(
            inner.next_collection_id,
            collection.name,
            collection.description,
        );
        inner.collections.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_collection(
        &self,
        id: Id,
        update: CollectionUpdate,
    ) -> Result<Option<Collection>> {
        let mut inner = self.inner.write();
        let Some(collection) = inner.collections.get_mut(&id) else {
            return Ok(None);
        };
        collection.apply(update);
        Ok(Some(collection.clone()))
    }

    async fn delete_collection(&self, id: Id) -> Result<bool> {
        Ok(self.inner.write().collections.remove(&id).is_some())
    }

    async fn add_app(&self, collection_id: Id, app_id: Id) -> Result<MembershipChange> {
        let mut inner = self.inner.write();
        let Some(collection) = inner.collections.get_mut(&collection_id) else {
            return Ok(MembershipChange::CollectionMissing);
        };
        if collection.contains_app(app_id) {
            return Ok(MembershipChange::AlreadyIn);
        }
        collection.apps.push(app_id);
        collection.modified_at = crate::model::now_rfc3339();
        Ok(MembershipChange::Applied(collection.clone()))
    }

    async fn remove_app(&self, collection_id: Id, app_id: Id) -> Result<MembershipChange> {
        let mut inner = self.inner.write();
        let Some(collection) = inner.collections.get_mut(&collection_id) else {
            return Ok(MembershipChange::CollectionMissing);
        };
        let Some(position) = collection.apps.iter().position(|id| *id == app_id) else {
            return Ok(MembershipChange::NotIn);
        };
        collection.apps.remove(position);
        collection.modified_at = crate::model::now_rfc3339();
        Ok(MembershipChange::Applied(collection.clone()))
    }
}

#[async_trait::async_trait]
impl AppStore for MemoryStore {
    async fn get_app(&self, id: Id) -> Result<Option<App>> {
        Ok(self.inner.read().apps.get(&id).cloned())
    }

    async fn upsert_app(&self, app: App) -> Result<()> {
        self.inner.write().apps.insert(app.id, app);
        Ok(())
    }
}

#[async_trait::async_trait]
impl GrantStore for MemoryStore {
    async fn rules_for_user(&self, user_id: &str) -> Result<Vec<String>> {
        Ok(self
            .inner
            .read()
            .grants
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn grant(&self, user_id: &str, rules: &str) -> Result<()> {
        self.inner
            .write()
            .grants
            .entry(user_id.to_string())
            .or_default()
            .push(rules.to_string());
        Ok(())
    }
}

#[async_trait::async_trait]
impl StatsStore for MemoryStore {
    async fn download_counts(&self, addon_id: Id, range: DateRange) -> Result<Vec<DailyStat>> {
        let inner = self.inner.read();
        let Some(rows) = inner.downloads.get(&addon_id) else {
            return Ok(Vec::new());
        };
        Ok(rows
            .range(range.start..=range.end)
            .map(|(_, stat)| stat.clone())
            .collect())
    }

    async fn update_counts(
        &self,
        addon_id: Id,
        range: DateRange,
        field: Option<UsageField>,
    ) -> Result<Vec<DailyStat>> {
        let inner = self.inner.read();
        let Some(rows) = inner.updates.get(&addon_id) else {
            return Ok(Vec::new());
        };
        Ok(rows
            .range(range.start..=range.end)
            .map(|(date, row)| DailyStat {
                date: *date,
                count: row.count,
                breakdown: field
                    .and_then(|f| row.breakdowns.get(&f).cloned())
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn global_counts(&self, series: SiteSeries, range: DateRange) -> Result<Vec<DailyStat>> {
        let inner = self.inner.read();
        let Some(rows) = inner.globals.get(&series) else {
            return Ok(Vec::new());
        };
        Ok(rows
            .range(range.start..=range.end)
            .map(|(date, count)| DailyStat::new(*date, *count))
            .collect())
    }
}

impl Store for MemoryStore {}
