//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the gateway's own endpoints
//! - Fall back to the dispatcher for everything else
//! - Wire up middleware (CORS, request ID, tracing)
//! - Swap in a new route table when the configuration changes
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::AuthGate;
use crate::config::{CorsConfig, GatewayConfig};
use crate::error::GatewayError;
use crate::http::pipeline::{AuthStage, ForwardedHeadersStage, Pipeline};
use crate::http::proxy::proxy_handler;
use crate::http::registration::{RegistrationHandler, UpstreamRegistration};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::upstream::Upstream;
use crate::observability::metrics;
use crate::routing::{ConfigurationError, RouteTable};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<ArcSwap<RouteTable>>,
    pub pipeline: Arc<Pipeline>,
    pub upstream: Upstream,
    pub registration: Option<Arc<dyn RegistrationHandler>>,
}

/// The gateway's HTTP front end.
pub struct GatewayServer {
    state: AppState,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Assemble the server from a compiled route table.
    ///
    /// Registration is relayed to `registration.url` when it is set.
    pub fn new(
        config: GatewayConfig,
        routes: RouteTable,
        gate: Arc<AuthGate>,
    ) -> Result<Self, ConfigurationError> {
        let upstream = Upstream::new(&config.timeouts);

        let registration: Option<Arc<dyn RegistrationHandler>> = match &config.registration.url {
            Some(url) => Some(Arc::new(UpstreamRegistration::new(url, upstream.clone())?)),
            None => {
                tracing::warn!("No registration service configured, /api/register is not served");
                None
            }
        };

        let pipeline = Pipeline::new()
            .with(AuthStage::new(gate, config.forwarding.forward_authorization))
            .with(ForwardedHeadersStage);

        let state = AppState {
            routes: Arc::new(ArcSwap::from_pointee(routes)),
            pipeline: Arc::new(pipeline),
            upstream,
            registration,
        };

        Ok(Self { state, config })
    }

    /// Replace the registration collaborator.
    pub fn with_registration(mut self, handler: Arc<dyn RegistrationHandler>) -> Self {
        self.state.registration = Some(handler);
        self
    }

    /// Build the Axum router with all middleware layers.
    pub fn router(&self) -> Router {
        let mut router = Router::new().route("/health", get(health_handler));
        if self.state.registration.is_some() {
            router = router.route("/api/register", post(register_handler));
        }

        router
            .fallback(proxy_handler)
            .with_state(self.state.clone())
            .layer(cors_layer(&self.config.cors))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// The live route table.
    pub fn routes(&self) -> Arc<RouteTable> {
        self.state.routes.load_full()
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configurations received on `config_updates` replace the route table;
    /// other sections take effect on restart.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GatewayConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.state.routes.load().len(),
            "HTTP server starting"
        );

        let routes = self.state.routes.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                reload_routes(&routes, &config);
            }
        });

        let app = self
            .router()
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Swap in routes built from `config`. A bad configuration keeps the current table.
pub fn reload_routes(routes: &ArcSwap<RouteTable>, config: &GatewayConfig) -> bool {
    match RouteTable::build(&config.services) {
        Ok(table) => {
            tracing::info!(routes = table.len(), "Route table reloaded");
            routes.store(Arc::new(table));
            metrics::record_route_reload("success");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Rejected route table reload, keeping current routes");
            metrics::record_route_reload("failure");
            false
        }
    }
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn register_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    match &state.registration {
        Some(handler) => handler.handle(request).await,
        None => GatewayError::RouteNotFound.into_response(),
    }
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origin = if cors.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            cors.allowed_origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };
    let headers = cors
        .allowed_headers
        .iter()
        .filter_map(|h| HeaderName::from_bytes(h.as_bytes()).ok());

    CorsLayer::new()
        .allow_origin(origin)
        .allow_headers(AllowHeaders::list(headers))
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{KeyCache, StaticKeySource};
    use crate::config::{IdentityConfig, ProxyRule, ServiceConfig};
    use jsonwebtoken::jwk::JwkSet;
    use std::time::Duration;
    use tower::ServiceExt;

    fn service(name: &str, prefix: &str, rewrite: &str) -> ServiceConfig {
        ServiceConfig {
            name: name.to_string(),
            url: "http://127.0.0.1:9".to_string(),
            replicas: Vec::new(),
            proxy: ProxyRule {
                prefix: prefix.to_string(),
                rewrite: rewrite.to_string(),
            },
        }
    }

    fn server(config: GatewayConfig) -> GatewayServer {
        let keys = KeyCache::new(
            Arc::new(StaticKeySource::new(JwkSet { keys: Vec::new() })),
            Duration::from_secs(300),
            Duration::from_secs(30),
        );
        let gate = Arc::new(AuthGate::new(keys, "http://id.test", &IdentityConfig::default()));
        let routes = RouteTable::build(&config.services).unwrap();
        GatewayServer::new(config, routes, gate).unwrap()
    }

    fn config(services: Vec<ServiceConfig>) -> GatewayConfig {
        GatewayConfig {
            services,
            ..GatewayConfig::default()
        }
    }

    async fn send(router: Router, method: Method, path: &str) -> Response {
        router
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(path)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn health_needs_no_credentials() {
        let server = server(config(vec![service("t", "/api", "/tournaments")]));
        let response = send(server.router(), Method::GET, "/health").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let server = server(config(vec![service("t", "/api", "/tournaments")]));
        let response = send(server.router(), Method::GET, "/api/players/1").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn protected_route_without_token_is_unauthorized() {
        let server = server(config(vec![service("t", "/api", "/tournaments")]));
        let response = send(server.router(), Method::GET, "/api/tournaments/5").await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()["www-authenticate"], "Bearer");
    }

    #[tokio::test]
    async fn register_absent_without_registration_service() {
        let server = server(config(vec![service("t", "/api", "/tournaments")]));
        let response = send(server.router(), Method::POST, "/api/register").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    struct Created;

    #[async_trait::async_trait]
    impl RegistrationHandler for Created {
        async fn handle(&self, _request: Request<Body>) -> Response {
            StatusCode::CREATED.into_response()
        }
    }

    #[tokio::test]
    async fn register_uses_collaborator_without_auth() {
        let server = server(config(vec![service("t", "/api", "/tournaments")]))
            .with_registration(Arc::new(Created));
        let response = send(server.router(), Method::POST, "/api/register").await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn reload_swaps_valid_tables_only() {
        let routes = ArcSwap::from_pointee(
            RouteTable::build(&[service("t", "/api", "/tournaments")]).unwrap(),
        );

        let grown = config(vec![
            service("t", "/api", "/tournaments"),
            service("p", "/api", "/players"),
        ]);
        assert!(reload_routes(&routes, &grown));
        assert_eq!(routes.load().len(), 2);

        let duplicate = config(vec![
            service("a", "/api", "/players"),
            service("b", "/api", "/players"),
        ]);
        assert!(!reload_routes(&routes, &duplicate));
        assert_eq!(routes.load().len(), 2);
    }
}
