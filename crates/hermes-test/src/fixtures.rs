//! HAL and token fixtures.

use hermes_core::{Action, Store, Token};
use serde_json::{json, Value};

/// Builds a HAL entity: `fields` plus `_type` and `id`.
///
/// ```
/// use hermes_test::fixtures::hal_entity;
/// use serde_json::json;
///
/// let app = hal_entity("app", 1, json!({ "handle": "web" }));
/// assert_eq!(app["_type"], "app");
/// assert_eq!(app["handle"], "web");
/// ```
#[must_use]
pub fn hal_entity(kind: &str, id: u64, fields: Value) -> Value {
    let mut entity = match fields {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    entity.insert("_type".to_string(), json!(kind));
    entity.insert("id".to_string(), json!(id));
    Value::Object(entity)
}

/// Builds one page of a paginated HAL collection.
///
/// `collection` is the `_embedded` member name (`apps`), `kind` the
/// entity `_type` (`app`). Ids are derived from the page so pages never
/// collide.
#[must_use]
pub fn hal_page(
    collection: &str,
    kind: &str,
    current_page: u64,
    total_count: u64,
    per_page: u64,
) -> Value {
    let first = (current_page - 1) * per_page;
    let last = (first + per_page).min(total_count);
    let items: Vec<Value> = (first..last)
        .map(|index| hal_entity(kind, index + 1, json!({ "page": current_page })))
        .collect();

    json!({
        "_embedded": { collection: items },
        "current_page": current_page,
        "total_count": total_count,
        "per_page": per_page,
    })
}

/// A session token that has not expired.
#[must_use]
pub fn token(access_token: &str) -> Token {
    Token::from_resource(&json!({
        "access_token": access_token,
        "id": "1",
        "expires_at": "2999-01-01T00:00:00Z",
        "_links": { "user": { "href": "https://auth.test/users/1" } },
    }))
    .unwrap_or_else(|| Token::new(access_token))
}

/// A store already holding a session token.
#[must_use]
pub fn store_with_token(access_token: &str) -> Store {
    let store = Store::new();
    store.dispatch(Action::SetToken(token(access_token)));
    store
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hal_page_last_page_is_short() {
        let page = hal_page("apps", "app", 5, 97, 20);
        let items = page["_embedded"]["apps"].as_array().unwrap();
        assert_eq!(items.len(), 17);
        assert_eq!(items[0]["id"], 81);
        assert_eq!(page["current_page"], 5);
    }

    #[test]
    fn test_store_with_token() {
        let store = store_with_token("abc");
        assert_eq!(store.access_token().as_deref(), Some("abc"));
        assert!(token("abc").expires_at.is_some());
    }
}
