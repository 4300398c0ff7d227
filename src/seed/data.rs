use crate::model::{App, Collection, NewCollection};
use crate::store::traits::Store;
use anyhow::Result;

/// User granted publisher rights by the seed data
pub const SEED_PUBLISHER: &str = "dev-publisher";

const SEED_APPS: [(i64, &str); 5] = [
    (337141, "Twitter"),
    (337142, "Cut the Rope"),
    (337143, "Soundboard"),
    (337144, "Where's My Water?"),
    (337145, "Chess Free"),
];

/// Load a small catalogue for local development: a handful of apps, one
/// publisher and a collection holding the games.
pub async fn load_seed_data<S: Store>(store: &S) -> Result<Collection> {
    for (id, name) in SEED_APPS {
        store.upsert_app(App::new(id, name)).await?;
    }

    store.grant(SEED_PUBLISHER, "Apps:Publisher").await?;

    let collection = store
        .create_collection(NewCollection {
            name: "My Favorite Games".to_string(),
            description: "A collection of my favorite games".to_string(),
        })
        .await?;

    let mut latest = collection;
    for app_id in [337142, 337144, 337145] {
        if let crate::store::MembershipChange::Applied(updated) =
            store.add_app(latest.id, app_id).await?
        {
            latest = updated;
        }
    }

    Ok(latest)
}
