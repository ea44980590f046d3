//! HAL entity extraction.
//!
//! After a successful call, walks the response body and every resource
//! nested under `_embedded`. Each object carrying both `_type` and `id` is
//! upserted into the store entity table named by its `_type`. The response
//! itself is left untouched.

use crate::middleware::{Middleware, Next};
use hermes_core::{Action, ApiCtx, BoxFuture, HermesResult, Store};
use serde_json::Value;
use std::collections::BTreeMap;

/// Collects HAL entities from a response body, grouped by `_type`.
///
/// Entities keep their fields apart from `_embedded`, whose members are
/// collected on their own.
///
/// ```
/// use hermes_middleware::stages::extract_entities;
/// use serde_json::json;
///
/// let body = json!({
///     "_embedded": {
///         "apps": [
///             { "_type": "app", "id": 1, "handle": "web" },
///             { "_type": "app", "id": 2, "handle": "worker" }
///         ]
///     }
/// });
///
/// let entities = extract_entities(&body);
/// assert_eq!(entities["app"].len(), 2);
/// ```
#[must_use]
pub fn extract_entities(body: &Value) -> BTreeMap<String, Vec<Value>> {
    let mut found = BTreeMap::new();
    collect(body, &mut found);
    found
}

fn collect(value: &Value, found: &mut BTreeMap<String, Vec<Value>>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect(item, found);
            }
        }
        Value::Object(object) => {
            let kind = object.get("_type").and_then(Value::as_str);
            if let (Some(kind), Some(_)) = (kind, object.get("id")) {
                let mut entity = object.clone();
                entity.remove("_embedded");
                found
                    .entry(kind.to_string())
                    .or_default()
                    .push(Value::Object(entity));
            }
            if let Some(embedded) = object.get("_embedded") {
                match embedded {
                    Value::Object(members) => {
                        for member in members.values() {
                            collect(member, found);
                        }
                    }
                    other => collect(other, found),
                }
            }
        }
        _ => {}
    }
}

/// Upserts HAL entities from successful responses.
#[derive(Debug, Clone)]
pub struct HalParserMiddleware {
    store: Store,
}

impl HalParserMiddleware {
    /// Creates the stage writing to `store`.
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

impl Middleware for HalParserMiddleware {
    fn name(&self) -> &'static str {
        "hal_parser"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut ApiCtx,
        next: Next<'a>,
    ) -> BoxFuture<'a, HermesResult<()>> {
        Box::pin(async move {
            next.run(ctx).await?;

            let Some(Ok(body)) = ctx.json() else {
                return Ok(());
            };
            for (kind, entities) in extract_entities(body) {
                tracing::trace!(kind = %kind, count = entities.len(), "upserting entities");
                self.store.dispatch(Action::UpsertEntities { kind, entities });
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FnMiddleware;
    use hermes_core::ApiFailure;
    use serde_json::json;

    #[test]
    fn test_nested_embedded_resources() {
        let body = json!({
            "_type": "database",
            "id": "10",
            "handle": "pg",
            "_embedded": {
                "service": { "_type": "service", "id": 3, "container_count": 1 },
                "disk": { "_type": "disk", "id": 4, "size": 10, "_embedded": {
                    "backups": [{ "_type": "backup", "id": 5 }]
                } },
                "noise": { "label": "no id" }
            }
        });

        let entities = extract_entities(&body);
        assert_eq!(entities.keys().collect::<Vec<_>>(), ["backup", "database", "disk", "service"]);
        assert!(entities["database"][0].get("_embedded").is_none());
        assert_eq!(entities["disk"][0]["size"], 10);
    }

    #[test]
    fn test_plain_json_has_no_entities() {
        assert!(extract_entities(&json!({ "data": [1, 2, 3] })).is_empty());
        assert!(extract_entities(&Value::Null).is_empty());
    }

    #[tokio::test]
    async fn test_upserts_on_success_only() {
        let store = Store::new();
        let stage = HalParserMiddleware::new(store.clone());

        let ok = FnMiddleware::new("ok", |ctx, _next| {
            Box::pin(async move {
                ctx.set_json(Ok(json!({ "_type": "app", "id": 1, "handle": "web" })));
                Ok(())
            })
        });
        let mut ctx = ApiCtx::new("x", Value::Null);
        stage.process(&mut ctx, Next::new(&ok, Next::end())).await.unwrap();
        assert_eq!(store.entity("app", "1").unwrap()["handle"], "web");

        let failed = FnMiddleware::new("failed", |ctx, _next| {
            Box::pin(async move {
                let mut failure = ApiFailure::new("nope");
                failure.body = json!({ "_type": "app", "id": 2 });
                ctx.set_json(Err(failure));
                Ok(())
            })
        });
        let mut ctx = ApiCtx::new("x", Value::Null);
        stage.process(&mut ctx, Next::new(&failed, Next::end())).await.unwrap();
        assert!(store.entity("app", "2").is_none());
    }
}
