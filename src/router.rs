use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

/// Build the application router with all routes
pub fn build(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::healthcheck))
        // Provisioning routes
        .route("/api/provision/cables", post(handlers::provision::connect_cables))
        .route("/api/provision/vlans", post(handlers::provision::create_vlan))
        .route("/api/provision/vlan-membership", post(handlers::provision::set_vlan_membership))
        .route("/api/runs", get(handlers::provision::list_runs))
        .route("/api/runs/:id", get(handlers::provision::get_run))
        // Tenancy routes
        .route("/api/tenants", get(handlers::inventory::list_tenants))
        .route("/api/tenants", post(handlers::inventory::create_tenant))
        // DCIM routes
        .route("/api/locations", get(handlers::inventory::list_locations))
        .route("/api/locations", post(handlers::inventory::create_location))
        .route("/api/racks", post(handlers::inventory::create_rack))
        .route("/api/devices", get(handlers::inventory::list_devices))
        .route("/api/devices", post(handlers::inventory::create_device))
        .route("/api/devices/:id/interfaces", get(handlers::inventory::list_device_interfaces))
        .route("/api/interfaces", post(handlers::inventory::create_interface))
        .route("/api/rear-ports", post(handlers::inventory::create_rear_port))
        .route("/api/front-ports", post(handlers::inventory::create_front_port))
        .route("/api/cables", get(handlers::inventory::list_cables))
        .route("/api/cables", post(handlers::inventory::create_cable))
        // IPAM routes
        .route("/api/vlans", get(handlers::inventory::list_vlans))
        .route("/api/vrfs", get(handlers::inventory::list_vrfs))
        .route("/api/prefixes", get(handlers::inventory::list_prefixes))
        .route("/api/ip-addresses", get(handlers::inventory::list_ip_addresses))
        .route("/api/fhrp-groups", get(handlers::inventory::list_fhrp_groups))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::{Config, ProvisionPolicy};
    use crate::db::Store;
    use crate::provision::Provisioner;

    const SECRET: &str = "test-secret";

    async fn app() -> Router {
        let store = Store::in_memory().await.unwrap();
        let config = Config {
            db_path: ":memory:".to_string(),
            db_max_connections: 1,
            listen_addr: "127.0.0.1:0".to_string(),
            jwt_secret: SECRET.to_string(),
            policy: ProvisionPolicy::default(),
        };
        store.seed(&config.policy).await.unwrap();
        let provisioner = Provisioner::new(store.clone(), config.policy.clone());
        build(Arc::new(AppState { store, config, provisioner }))
    }

    fn request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let token = crate::auth::issue_token(SECRET, "tester", 1).unwrap();
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token));
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_needs_no_token() {
        let resp = app()
            .await
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let resp = app()
            .await
            .oneshot(Request::builder().uri("/api/devices").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(resp).await["error"], "Missing authentication token");
    }

    #[tokio::test]
    async fn test_invalid_vlan_request_is_bad_request() {
        let body = serde_json::json!({ "vlan_name": "Lab_1", "vlan_id": 100, "tenant": 1 });
        let resp = app()
            .await
            .oneshot(request("POST", "/api/provision/vlans", Some(body)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let err = json_body(resp).await["error"].as_str().unwrap().to_string();
        assert!(err.starts_with("invalid vlan_name"), "{}", err);
    }

    #[tokio::test]
    async fn test_dry_run_vlan_over_http() {
        let app = app().await;
        let tenants = json_body(app.clone().oneshot(request("GET", "/api/tenants", None)).await.unwrap()).await;
        let tenant_id = tenants[0]["id"].as_i64().unwrap();

        let body = serde_json::json!({
            "vlan_name": "lab",
            "vlan_id": 100,
            "tenant": tenant_id,
            "net4": "10.0.0.0/24",
            "commit": false,
        });
        let resp = app
            .clone()
            .oneshot(request("POST", "/api/provision/vlans", Some(body)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let run = json_body(resp).await;
        assert_eq!(run["status"], "dry-run");
        assert_eq!(run["summary"], "VLAN lab (100) ready on 0 exit switches");

        let vlans = json_body(app.clone().oneshot(request("GET", "/api/vlans", None)).await.unwrap()).await;
        assert_eq!(vlans.as_array().unwrap().len(), 0);

        let run_id = run["id"].as_str().unwrap();
        let resp = app
            .oneshot(request("GET", &format!("/api/runs/{}", run_id), None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_topology_error_is_conflict() {
        let app = app().await;
        let location = json_body(
            app.clone()
                .oneshot(request("POST", "/api/locations", Some(serde_json::json!({ "name": "lab" }))))
                .await
                .unwrap(),
        )
        .await;
        let location_id = location["id"].as_i64().unwrap();
        let device = serde_json::json!({
            "name": "12.3",
            "device_type": "RJ45 access port",
            "role": "access port",
            "location_id": location_id,
        });
        let resp = app
            .clone()
            .oneshot(request("POST", "/api/devices", Some(device)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body = serde_json::json!({ "locations": [location_id] });
        let resp = app
            .oneshot(request("POST", "/api/provision/cables", Some(body)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
