use serde_json::{Map, Value};

use crate::model::{Collection, CollectionUpdate, Id, NewCollection};
use crate::store::traits::{MembershipChange, Store};

/// JSON object sent as the body of a write request
pub type Payload = Map<String, Value>;

/// Everything a collection write can fail with.
///
/// The membership variants form a fixed vocabulary; their messages are
/// part of the API and must not change.
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("`app` was not provided.")]
    NotProvided,
    #[error("`app` does not exist.")]
    DoesntExist,
    #[error("`app` already exists in collection.")]
    AlreadyIn,
    #[error("`app` not in collection.")]
    NotIn,
    #[error("Collection apps may not be updated using this endpoint.")]
    CantUpdate,
    #[error("Not found.")]
    NotFound,
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl CollectionError {
    /// Stable key of the error, as used in logs and client code
    pub fn key(&self) -> &'static str {
        match self {
            CollectionError::NotProvided => "not_provided",
            CollectionError::DoesntExist => "doesnt_exist",
            CollectionError::AlreadyIn => "already_in",
            CollectionError::NotIn => "not_in",
            CollectionError::CantUpdate => "cant_update",
            CollectionError::NotFound => "not_found",
            CollectionError::Invalid(_) => "invalid",
            CollectionError::Store(_) => "store",
        }
    }
}

/// Read the `app` identifier of an add/remove request.
///
/// Absent and falsy values (`null`, `false`, `""`, `0`) count as not
/// provided. Values that can never name an app are reported as not existing.
pub fn app_identifier(payload: &Payload) -> Result<Id, CollectionError> {
    let value = match payload.get("app") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => {
            return Err(CollectionError::NotProvided)
        }
        Some(value) => value,
    };

    let id = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) if s.trim().is_empty() => return Err(CollectionError::NotProvided),
        Value::String(s) => s.trim().parse::<Id>().ok(),
        _ => None,
    };

    match id {
        Some(0) => Err(CollectionError::NotProvided),
        Some(id) if id > 0 => Ok(id),
        _ => Err(CollectionError::DoesntExist),
    }
}

fn string_field(payload: &Payload, key: &str) -> Result<Option<String>, CollectionError> {
    match payload.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(CollectionError::Invalid(format!(
            "{}: Not a valid string.",
            key
        ))),
    }
}

fn required_name(name: Option<String>) -> Result<String, CollectionError> {
    match name {
        Some(name) if !name.trim().is_empty() => Ok(name),
        _ => Err(CollectionError::Invalid(
            "name: This field is required.".to_string(),
        )),
    }
}

async fn existing<S: Store + ?Sized>(store: &S, id: Id) -> Result<Collection, CollectionError> {
    store
        .get_collection(id)
        .await?
        .ok_or(CollectionError::NotFound)
}

pub async fn create_collection<S: Store + ?Sized>(
    store: &S,
    payload: &Payload,
) -> Result<Collection, CollectionError> {
    if payload.contains_key("apps") {
        return Err(CollectionError::CantUpdate);
    }

    let new_collection = NewCollection {
        name: required_name(string_field(payload, "name")?)?,
        description: string_field(payload, "description")?.unwrap_or_default(),
    };

    Ok(store.create_collection(new_collection).await?)
}

/// Partial update of `name` and `description`. Membership can only change
/// through [`add_app`] and [`remove_app`].
pub async fn edit_collection<S: Store + ?Sized>(
    store: &S,
    id: Id,
    payload: &Payload,
) -> Result<Collection, CollectionError> {
    existing(store, id).await?;

    if payload.contains_key("apps") {
        return Err(CollectionError::CantUpdate);
    }

    let name = match string_field(payload, "name")? {
        Some(name) => Some(required_name(Some(name))?),
        None => None,
    };
    let update = CollectionUpdate {
        name,
        description: string_field(payload, "description")?,
    };

    store
        .update_collection(id, update)
        .await?
        .ok_or(CollectionError::NotFound)
}

pub async fn add_app<S: Store + ?Sized>(
    store: &S,
    collection_id: Id,
    payload: &Payload,
) -> Result<Collection, CollectionError> {
    existing(store, collection_id).await?;
    let app_id = app_identifier(payload)?;

    if store.get_app(app_id).await?.is_none() {
        return Err(CollectionError::DoesntExist);
    }

    membership_result(store.add_app(collection_id, app_id).await?)
}

pub async fn remove_app<S: Store + ?Sized>(
    store: &S,
    collection_id: Id,
    payload: &Payload,
) -> Result<Collection, CollectionError> {
    existing(store, collection_id).await?;
    let app_id = app_identifier(payload)?;

    if store.get_app(app_id).await?.is_none() {
        return Err(CollectionError::DoesntExist);
    }

    membership_result(store.remove_app(collection_id, app_id).await?)
}

fn membership_result(change: MembershipChange) -> Result<Collection, CollectionError> {
    match change {
        MembershipChange::Applied(collection) => Ok(collection),
        MembershipChange::AlreadyIn => Err(CollectionError::AlreadyIn),
        MembershipChange::NotIn => Err(CollectionError::NotIn),
        MembershipChange::CollectionMissing => Err(CollectionError::NotFound),
    }
}
