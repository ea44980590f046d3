//! Standard dashboard endpoints.
//!
//! Names follow the `METHOD /path` convention so a call reads like the
//! route it hits. Paginated list endpoints accept a `page` payload field
//! and have a `fetch_all_*` helper built on
//! [`ApiClient::call_all_pages`].

use hermes_core::{Action, ApiFailure, Credentials, Store, Token};
use serde_json::{json, Value};

use crate::api::ApiClient;
use crate::endpoint::Endpoint;
use crate::pagination::CombinedPages;
use crate::service::ServiceKind;

/// Apps, paginated.
pub const FETCH_APPS: &str = "GET /apps";
/// One app.
pub const FETCH_APP: &str = "GET /apps/:id";
/// Databases, paginated.
pub const FETCH_DATABASES: &str = "GET /databases";
/// One database.
pub const FETCH_DATABASE: &str = "GET /databases/:id";
/// Environments, paginated.
pub const FETCH_ENVIRONMENTS: &str = "GET /accounts";
/// Stacks, paginated.
pub const FETCH_STACKS: &str = "GET /stacks";
/// Operations of one database, paginated.
pub const FETCH_DATABASE_OPERATIONS: &str = "GET /databases/:id/operations";
/// Operations of one app, paginated.
pub const FETCH_APP_OPERATIONS: &str = "GET /apps/:id/operations";
/// Start an operation on a database.
pub const CREATE_DATABASE_OPERATION: &str = "POST /databases/:id/operations";
/// Endpoints (vhosts), paginated.
pub const FETCH_ENDPOINTS: &str = "GET /vhosts";
/// Log drains, paginated.
pub const FETCH_LOG_DRAINS: &str = "GET /log_drains";
/// Metric drains, paginated.
pub const FETCH_METRIC_DRAINS: &str = "GET /metric_drains";

/// The token of the current session.
pub const FETCH_CURRENT_TOKEN: &str = "GET /current_token";
/// Log in: create a session token from credentials.
pub const CREATE_TOKEN: &str = "POST /tokens";
/// Step-up: create an elevated token.
pub const CREATE_ELEVATED_TOKEN: &str = "create-elevated-token";
/// Log out: revoke a token.
pub const REVOKE_TOKEN: &str = "DELETE /tokens/:id";
/// Roles of an organization, paginated.
pub const FETCH_ROLES: &str = "GET /organizations/:org_id/roles";
/// Update a user. Needs the elevated token.
pub const UPDATE_USER: &str = "PUT /users/:id";

/// Billing detail of an organization.
pub const FETCH_BILLING_DETAIL: &str = "GET /billing_details/:id";

fn route(name: &'static str) -> (&'static str, &'static str) {
    name.split_once(' ').unwrap_or(("GET", name))
}

fn list(name: &'static str) -> Endpoint {
    let (_, path) = route(name);
    Endpoint::get(name, path).paginated()
}

fn one(name: &'static str) -> Endpoint {
    let (_, path) = route(name);
    Endpoint::get(name, path)
}

fn store_token(store: &Store, body: &Value) {
    if let Some(token) = Token::from_resource(body) {
        store.dispatch(Action::SetToken(token));
    }
}

fn store_elevated_token(store: &Store, body: &Value) {
    if let Some(token) = Token::from_resource(body) {
        store.dispatch(Action::SetElevatedToken(token));
    }
}

/// Main API endpoints.
#[must_use]
pub fn api_endpoints() -> Vec<Endpoint> {
    vec![
        list(FETCH_APPS),
        one(FETCH_APP),
        list(FETCH_DATABASES),
        one(FETCH_DATABASE),
        list(FETCH_ENVIRONMENTS),
        list(FETCH_STACKS),
        list(FETCH_DATABASE_OPERATIONS),
        list(FETCH_APP_OPERATIONS),
        Endpoint::post(CREATE_DATABASE_OPERATION, route(CREATE_DATABASE_OPERATION).1),
        list(FETCH_ENDPOINTS),
        list(FETCH_LOG_DRAINS),
        list(FETCH_METRIC_DRAINS),
    ]
}

/// Auth endpoints.
#[must_use]
pub fn auth_endpoints() -> Vec<Endpoint> {
    vec![
        one(FETCH_CURRENT_TOKEN).on_success(store_token),
        Endpoint::post(CREATE_TOKEN, "/tokens")
            .no_token()
            .credentials(Credentials::Include)
            .on_success(store_token),
        Endpoint::post(CREATE_ELEVATED_TOKEN, "/tokens")
            .no_token()
            .on_success(store_elevated_token),
        Endpoint::delete(REVOKE_TOKEN, "/tokens/:id")
            .on_success(|store, _| store.dispatch(Action::ResetToken)),
        list(FETCH_ROLES),
        Endpoint::put(UPDATE_USER, "/users/:id").elevated(),
    ]
}

/// Billing endpoints.
#[must_use]
pub fn billing_endpoints() -> Vec<Endpoint> {
    vec![one(FETCH_BILLING_DETAIL)]
}

/// Returns the standard endpoints of a service.
#[must_use]
pub fn endpoints_for(kind: ServiceKind) -> Vec<Endpoint> {
    match kind {
        ServiceKind::Api => api_endpoints(),
        ServiceKind::Auth => auth_endpoints(),
        ServiceKind::Billing => billing_endpoints(),
        ServiceKind::MetricTunnel | ServiceKind::Portal | ServiceKind::Ai => Vec::new(),
    }
}

/// Every app.
///
/// # Errors
///
/// Returns the page-1 failure.
pub async fn fetch_all_apps(api: &ApiClient) -> Result<CombinedPages, ApiFailure> {
    api.call_all_pages(FETCH_APPS, Value::Null).await
}

/// Every database.
///
/// # Errors
///
/// Returns the page-1 failure.
pub async fn fetch_all_databases(api: &ApiClient) -> Result<CombinedPages, ApiFailure> {
    api.call_all_pages(FETCH_DATABASES, Value::Null).await
}

/// Every environment.
///
/// # Errors
///
/// Returns the page-1 failure.
pub async fn fetch_all_environments(api: &ApiClient) -> Result<CombinedPages, ApiFailure> {
    api.call_all_pages(FETCH_ENVIRONMENTS, Value::Null).await
}

/// Every stack.
///
/// # Errors
///
/// Returns the page-1 failure.
pub async fn fetch_all_stacks(api: &ApiClient) -> Result<CombinedPages, ApiFailure> {
    api.call_all_pages(FETCH_STACKS, Value::Null).await
}

/// Every endpoint (vhost).
///
/// # Errors
///
/// Returns the page-1 failure.
pub async fn fetch_all_endpoints(api: &ApiClient) -> Result<CombinedPages, ApiFailure> {
    api.call_all_pages(FETCH_ENDPOINTS, Value::Null).await
}

/// Every log drain.
///
/// # Errors
///
/// Returns the page-1 failure.
pub async fn fetch_all_log_drains(api: &ApiClient) -> Result<CombinedPages, ApiFailure> {
    api.call_all_pages(FETCH_LOG_DRAINS, Value::Null).await
}

/// Every metric drain.
///
/// # Errors
///
/// Returns the page-1 failure.
pub async fn fetch_all_metric_drains(api: &ApiClient) -> Result<CombinedPages, ApiFailure> {
    api.call_all_pages(FETCH_METRIC_DRAINS, Value::Null).await
}

/// Every operation of one database.
///
/// # Errors
///
/// Returns the page-1 failure.
pub async fn fetch_all_database_operations(
    api: &ApiClient,
    database_id: &str,
) -> Result<CombinedPages, ApiFailure> {
    api.call_all_pages(FETCH_DATABASE_OPERATIONS, json!({ "id": database_id }))
        .await
}

/// Every operation of one app.
///
/// # Errors
///
/// Returns the page-1 failure.
pub async fn fetch_all_app_operations(
    api: &ApiClient,
    app_id: &str,
) -> Result<CombinedPages, ApiFailure> {
    api.call_all_pages(FETCH_APP_OPERATIONS, json!({ "id": app_id })).await
}

/// Every role of one organization.
///
/// # Errors
///
/// Returns the page-1 failure.
pub async fn fetch_all_roles(auth: &ApiClient, org_id: &str) -> Result<CombinedPages, ApiFailure> {
    auth.call_all_pages(FETCH_ROLES, json!({ "org_id": org_id })).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_names_match_routes() {
        for endpoint in api_endpoints().iter().chain(&billing_endpoints()) {
            let (method, path) = route_of(endpoint.endpoint_name());
            assert_eq!(endpoint.method().as_str(), method);
            assert_eq!(endpoint.path(), path);
        }
    }

    fn route_of(name: &str) -> (&str, &str) {
        name.split_once(' ').unwrap()
    }

    #[test]
    fn test_list_endpoints_are_paginated() {
        let endpoints = api_endpoints();
        let apps = endpoints
            .iter()
            .find(|e| e.endpoint_name() == FETCH_APPS)
            .unwrap();
        assert!(apps.is_paginated());

        let app = endpoints
            .iter()
            .find(|e| e.endpoint_name() == FETCH_APP)
            .unwrap();
        assert!(!app.is_paginated());
    }

    #[test]
    fn test_auth_endpoints() {
        let endpoints = auth_endpoints();
        let elevated = endpoints
            .iter()
            .find(|e| e.endpoint_name() == CREATE_ELEVATED_TOKEN)
            .unwrap();
        assert_eq!(elevated.method(), &Method::POST);
        assert_eq!(elevated.path(), "/tokens");
        assert_eq!(endpoints_for(ServiceKind::Portal).len(), 0);
    }
}
