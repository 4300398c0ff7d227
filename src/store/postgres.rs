use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, PgConnection, PgPool, Row};
use std::collections::{BTreeMap, HashMap};

use crate::model::{
    App, Collection, CollectionUpdate, DailyStat, DateRange, Id, NewCollection, SiteSeries,
    UsageField,
};
use crate::store::traits::{
    AppStore, CollectionStore, GrantStore, MembershipChange, StatsStore, Store,
};

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Run the embedded database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }
}

fn collection_from_row(row: &sqlx::postgres::PgRow, apps: Vec<Id>) -> Collection {
    let created_at: DateTime<Utc> = row.get("created_at");
    let modified_at: DateTime<Utc> = row.get("modified_at");
    Collection {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        apps,
        created_at: created_at.to_rfc3339(),
        modified_at: modified_at.to_rfc3339(),
    }
}

async fn load_collection(conn: &mut PgConnection, id: Id) -> Result<Option<Collection>> {
    let row = sqlx::query(
        "SELECT id, name, description, created_at, modified_at FROM collections WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .context("Failed to fetch collection")?;

    let Some(row) = row else {
        return Ok(None);
    };

    let apps: Vec<Id> = sqlx::query_scalar(
        "SELECT app_id FROM collection_apps WHERE collection_id = $1 ORDER BY position",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await
    .context("Failed to fetch collection apps")?;

    Ok(Some(collection_from_row(&row, apps)))
}

/// Lock the collection row for the rest of the transaction
async fn lock_collection(conn: &mut PgConnection, id: Id) -> Result<bool> {
    let locked = sqlx::query("SELECT id FROM collections WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to lock collection")?;
    Ok(locked.is_some())
}

async fn touch_collection(conn: &mut PgConnection, id: Id) -> Result<()> {
    sqlx::query("UPDATE collections SET modified_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await
        .context("Failed to update collection timestamp")?;
    Ok(())
}

#[async_trait::async_trait]
impl CollectionStore for PostgresStore {
    async fn get_collection(&self, id: Id) -> Result<Option<Collection>> {
        let mut conn = self.pool.acquire().await.context("Failed to acquire connection")?;
        load_collection(&mut conn, id).await
    }

    async fn list_collections(&self, limit: usize, offset: usize) -> Result<Vec<Collection>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, created_at, modified_at FROM collections
            ORDER BY id LIMIT $1 OFFSET $2
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list collections")?;

        let ids: Vec<Id> = rows.iter().map(|row| row.get("id")).collect();
        let members = sqlx::query(
            r#"
            SELECT collection_id, app_id FROM collection_apps
            WHERE collection_id = ANY($1) ORDER BY position
            "#,
        )
        .bind(ids.as_slice())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list collection apps")?;

        let mut apps_by_collection: HashMap<Id, Vec<Id>> = HashMap::new();
        for member in members {
            apps_by_collection
                .entry(member.get("collection_id"))
                .or_default()
                .push(member.get("app_id"));
        }

        let collections = rows
            .iter()
            .map(|row| {
                let id: Id = row.get("id");
                collection_from_row(row, apps_by_collection.remove(&id).unwrap_or_default())
            })
            .collect();

        Ok(collections)
    }

    async fn count_collections(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM collections")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count collections")?;
        Ok(count as usize)
    }

    async fn create_collection(&self, collection: NewCollection) -> Result<Collection> {
        let row = sqlx::query(
            r#"
            INSERT INTO collections (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at, modified_at
            "#,
        )
        .bind(&collection.name)
        .bind(&collection.description)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create collection")?;

        Ok(collection_from_row(&row, Vec::new()))
    }

    async fn update_collection(
        &self,
        id: Id,
        update: CollectionUpdate,
    ) -> Result<Option<Collection>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let result = sqlx::query(
            r#"
            UPDATE collections SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                modified_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.name)
        .bind(update.description)
        .execute(&mut *tx)
        .await
        .context("Failed to update collection")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let collection = load_collection(&mut tx, id).await?;
        tx.commit().await.context("Failed to commit collection update")?;
        Ok(collection)
    }

    async fn delete_collection(&self, id: Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM collections WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete collection")?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_app(&self, collection_id: Id, app_id: Id) -> Result<MembershipChange> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        if !lock_collection(&mut tx, collection_id).await? {
            return Ok(MembershipChange::CollectionMissing);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO collection_apps (collection_id, app_id)
            VALUES ($1, $2)
            ON CONFLICT (collection_id, app_id) DO NOTHING
            "#,
        )
        .bind(collection_id)
        .bind(app_id)
        .execute(&mut *tx)
        .await
        .context("Failed to add app to collection")?;

        if inserted.rows_affected() == 0 {
            return Ok(MembershipChange::AlreadyIn);
        }

        touch_collection(&mut tx, collection_id).await?;
        let collection = load_collection(&mut tx, collection_id)
            .await?
            .context("Collection vanished while locked")?;
        tx.commit().await.context("Failed to commit app addition")?;

        Ok(MembershipChange::Applied(collection))
    }

    async fn remove_app(&self, collection_id: Id, app_id: Id) -> Result<MembershipChange> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        if !lock_collection(&mut tx, collection_id).await? {
            return Ok(MembershipChange::CollectionMissing);
        }

        let removed = sqlx::query(
            "DELETE FROM collection_apps WHERE collection_id = $1 AND app_id = $2",
        )
        .bind(collection_id)
        .bind(app_id)
        .execute(&mut *tx)
        .await
        .context("Failed to remove app from collection")?;

        if removed.rows_affected() == 0 {
            return Ok(MembershipChange::NotIn);
        }

        touch_collection(&mut tx, collection_id).await?;
        let collection = load_collection(&mut tx, collection_id)
            .await?
            .context("Collection vanished while locked")?;
        tx.commit().await.context("Failed to commit app removal")?;

        Ok(MembershipChange::Applied(collection))
    }
}

#[async_trait::async_trait]
impl AppStore for PostgresStore {
    async fn get_app(&self, id: Id) -> Result<Option<App>> {
        let row = sqlx::query("SELECT id, name, slug FROM apps WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch app")?;

        Ok(row.map(|row| App {
            id: row.get("id"),
            name: row.get("name"),
            slug: row.get("slug"),
        }))
    }

    async fn upsert_app(&self, app: App) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO apps (id, name, slug)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                slug = EXCLUDED.slug
            "#,
        )
        .bind(app.id)
        .bind(&app.name)
        .bind(&app.slug)
        .execute(&self.pool)
        .await
        .context("Failed to upsert app")?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl GrantStore for PostgresStore {
    async fn rules_for_user(&self, user_id: &str) -> Result<Vec<String>> {
        let rules =
            sqlx::query_scalar("SELECT rules FROM user_grants WHERE user_id = $1 ORDER BY id")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .context("Failed to fetch user grants")?;
        Ok(rules)
    }

    async fn grant(&self, user_id: &str, rules: &str) -> Result<()> {
        sqlx::query("INSERT INTO user_grants (user_id, rules) VALUES ($1, $2)")
            .bind(user_id)
            .bind(rules)
            .execute(&self.pool)
            .await
            .context("Failed to insert user grant")?;
        Ok(())
    }
}

type Breakdown = Option<Json<BTreeMap<String, i64>>>;

#[async_trait::async_trait]
impl StatsStore for PostgresStore {
    async fn download_counts(&self, addon_id: Id, range: DateRange) -> Result<Vec<DailyStat>> {
        let rows = sqlx::query(
            r#"
            SELECT date, count, sources FROM download_counts
            WHERE addon_id = $1 AND date BETWEEN $2 AND $3
            ORDER BY date
            "#,
        )
        .bind(addon_id)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch download counts")?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let sources: Breakdown = row.get("sources");
                DailyStat {
                    date: row.get::<NaiveDate, _>("date"),
                    count: row.get("count"),
                    breakdown: sources.map(|json| json.0).unwrap_or_default(),
                }
            })
            .collect())
    }

    async fn update_counts(
        &self,
        addon_id: Id,
        range: DateRange,
        field: Option<UsageField>,
    ) -> Result<Vec<DailyStat>> {
        // Column names come from a closed enum, never from the request.
        let breakdown_column = field.map(|f| f.as_str()).unwrap_or("NULL::jsonb");
        let sql = format!(
            r#"
            SELECT date, count, {} AS breakdown FROM update_counts
            WHERE addon_id = $1 AND date BETWEEN $2 AND $3
            ORDER BY date
            "#,
            breakdown_column
        );

        let rows = sqlx::query(&sql)
            .bind(addon_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch update counts")?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let breakdown: Breakdown = row.get("breakdown");
                DailyStat {
                    date: row.get::<NaiveDate, _>("date"),
                    count: row.get("count"),
                    breakdown: breakdown.map(|json| json.0).unwrap_or_default(),
                }
            })
            .collect())
    }

    async fn global_counts(&self, series: SiteSeries, range: DateRange) -> Result<Vec<DailyStat>> {
        let rows = sqlx::query(
            r#"
            SELECT date, count FROM global_stats
            WHERE name = $1 AND date BETWEEN $2 AND $3
            ORDER BY date
            "#,
        )
        .bind(series.as_str())
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch global stats")?;

        Ok(rows
            .into_iter()
            .map(|row| DailyStat::new(row.get("date"), row.get("count")))
            .collect())
    }
}

impl Store for PostgresStore {}
