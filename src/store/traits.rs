use crate::model::{
    App, Collection, CollectionUpdate, DailyStat, DateRange, Id, NewCollection, SiteSeries,
    UsageField,
};
use anyhow::Result;

/// Outcome of a membership mutation, decided inside the store so the
/// membership check and the write happen atomically.
#[derive(Debug, Clone, PartialEq)]
pub enum MembershipChange {
    Applied(Collection),
    AlreadyIn,
    NotIn,
    CollectionMissing,
}

#[async_trait::async_trait]
pub trait CollectionStore: Send + Sync {
    async fn get_collection(&self, id: Id) -> Result<Option<Collection>>;
    /// Collections ordered by id, one page at a time
    async fn list_collections(&self, limit: usize, offset: usize) -> Result<Vec<Collection>>;
    async fn count_collections(&self) -> Result<usize>;
    async fn create_collection(&self, collection: NewCollection) -> Result<Collection>;
    /// Returns `None` when the collection does not exist
    async fn update_collection(
        &self,
        id: Id,
        update: CollectionUpdate,
    ) -> Result<Option<Collection>>;
    async fn delete_collection(&self, id: Id) -> Result<bool>;
    /// Append an app to the end of the membership list
    async fn add_app(&self, collection_id: Id, app_id: Id) -> Result<MembershipChange>;
    async fn remove_app(&self, collection_id: Id, app_id: Id) -> Result<MembershipChange>;
}

#[async_trait::async_trait]
pub trait AppStore: Send + Sync {
    async fn get_app(&self, id: Id) -> Result<Option<App>>;
    async fn upsert_app(&self, app: App) -> Result<()>;
}

/// Permission rules granted to users, e.g. `Apps:Publisher`
#[async_trait::async_trait]
pub trait GrantStore: Send + Sync {
    async fn rules_for_user(&self, user_id: &str) -> Result<Vec<String>>;
    async fn grant(&self, user_id: &str, rules: &str) -> Result<()>;
}

/// Read access to the precomputed statistics tables
#[async_trait::async_trait]
pub trait StatsStore: Send + Sync {
    /// Daily downloads of an addon, broken down by download source
    async fn download_counts(&self, addon_id: Id, range: DateRange) -> Result<Vec<DailyStat>>;
    /// Daily active users of an addon, optionally broken down by `field`
    async fn update_counts(
        &self,
        addon_id: Id,
        range: DateRange,
        field: Option<UsageField>,
    ) -> Result<Vec<DailyStat>>;
    /// Daily values of a site-wide series
    async fn global_counts(&self, series: SiteSeries, range: DateRange) -> Result<Vec<DailyStat>>;
}

pub trait Store: CollectionStore + AppStore + GrantStore + StatsStore + Send + Sync {}
