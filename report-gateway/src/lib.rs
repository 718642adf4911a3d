pub mod aggregate;
pub mod auth;
pub mod config;
pub mod errors;
pub mod filters;
pub mod metrics_defs;
pub mod pipeline;
pub mod projection;
pub mod remote;
pub mod reports;
pub mod router;
pub mod store;

#[cfg(test)]
mod testutils;

use crate::auth::{KeyStore, StaticKeyStore};
use crate::config::Config;
use crate::errors::GatewayError;
use crate::filters::ReportParams;
use crate::pipeline::{Pipeline, error_response};
use crate::projection::ReportContext;
use crate::remote::RemoteFetcher;
use crate::router::{EndpointRegistry, Route};
use crate::store::{LocalStore, SnapshotStore};
use hyper::body::Incoming;
use hyper::header::AUTHORIZATION;
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use shared::admin_service::AdminService;
use shared::http::{ResponseBody, run_http_service, serve_listener};
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpListener;

/// Serves the report endpoints of one instance
pub struct Gateway {
    registry: EndpointRegistry,
    pipeline: Pipeline,
}

impl Gateway {
    pub fn new(
        config: &Config,
        store: Arc<dyn LocalStore>,
        keys: Arc<dyn KeyStore>,
    ) -> Result<Self, GatewayError> {
        let ctx = Arc::new(ReportContext::from_config(config));
        let registry = EndpointRegistry::new(config, reports::all_reports(ctx))?;
        let fetcher = RemoteFetcher::new(&config.remote)?;

        Ok(Self {
            registry,
            pipeline: Pipeline::new(store, keys, fetcher),
        })
    }

    pub async fn handle<B>(&self, req: Request<B>) -> Response<ResponseBody> {
        let path = req.uri().path();

        match self.registry.route(req.method(), path) {
            Route::Report(endpoint) => {
                let credential = req
                    .headers()
                    .get(AUTHORIZATION)
                    .and_then(|v| v.to_str().ok());
                let params = ReportParams::from_query(req.uri().query());
                self.pipeline.handle(endpoint, credential, &params).await
            }
            Route::MethodNotAllowed => {
                tracing::debug!(method = %req.method(), path, "method not allowed");
                error_response(
                    StatusCode::METHOD_NOT_ALLOWED,
                    "Method Not Allowed",
                    format!("{} is not supported on {path}", req.method()),
                )
            }
            Route::NotFound => {
                tracing::debug!(path, "no report at path");
                error_response(
                    StatusCode::NOT_FOUND,
                    "Not Found",
                    format!("No report at {path}"),
                )
            }
        }
    }
}

struct GatewayService {
    gateway: Arc<Gateway>,
}

impl Service<Request<Incoming>> for GatewayService {
    type Response = Response<ResponseBody>;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let gateway = self.gateway.clone();
        Box::pin(async move { Ok(gateway.handle(req).await) })
    }
}

/// Loads the local snapshot and serves the report and admin listeners until
/// either fails.
pub async fn run(config: Config) -> Result<(), GatewayError> {
    config.validate()?;

    let store = SnapshotStore::load(config.store.snapshot_path.clone()).await?;
    let keys = StaticKeyStore::new(&config.api_keys);
    let gateway = Gateway::new(&config, Arc::new(store), Arc::new(keys))?;

    let ready = Arc::new(AtomicBool::new(false));
    let admin_ready = ready.clone();
    let admin_service = AdminService::new(move || admin_ready.load(Ordering::Relaxed));

    let listener =
        TcpListener::bind(format!("{}:{}", config.listener.host, config.listener.port)).await?;
    tracing::info!(
        host = %config.listener.host,
        port = config.listener.port,
        instance = %config.instance,
        remote = %config.remote.base_url,
        "report gateway listening"
    );
    ready.store(true, Ordering::Relaxed);

    let gateway_task = serve_listener(
        listener,
        GatewayService {
            gateway: Arc::new(gateway),
        },
    );
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(gateway_task, admin_task)?;
    Ok(())
}
