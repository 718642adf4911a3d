//! The request pipeline shared by every report endpoint.

use crate::aggregate::concat;
use crate::auth::{KeyStore, authorize, validate_api_key};
use crate::errors::ReportError;
use crate::filters::ReportParams;
use crate::metrics_defs::{REPORT_RECORDS, REPORT_REQUEST_DURATION};
use crate::remote::{RemoteFetcher, RemoteStatus};
use crate::router::Endpoint;
use crate::store::LocalStore;
use http::header::HeaderValue;
use hyper::{Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use shared::histogram;
use shared::http::{ResponseBody, make_json_response};
use std::sync::Arc;
use std::time::Instant;

/// Response header telling callers whether the remote contribution is
/// complete
pub const REMOTE_STATUS_HEADER: &str = "x-remote-status";

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    details: String,
}

/// JSON error response in the shape every endpoint uses
pub fn error_response(status: StatusCode, error: &str, details: String) -> Response<ResponseBody> {
    make_json_response(status, &ErrorBody { error, details })
}

pub struct Pipeline {
    store: Arc<dyn LocalStore>,
    keys: Arc<dyn KeyStore>,
    fetcher: RemoteFetcher,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn LocalStore>,
        keys: Arc<dyn KeyStore>,
        fetcher: RemoteFetcher,
    ) -> Self {
        Self {
            store,
            keys,
            fetcher,
        }
    }

    /// Runs one report request end to end and renders the response.
    pub async fn handle(
        &self,
        endpoint: &Endpoint,
        credential: Option<&str>,
        params: &ReportParams,
    ) -> Response<ResponseBody> {
        let kind = endpoint.kind();
        let start = Instant::now();

        let response = match self.execute(endpoint, credential, params).await {
            Ok((records, remote_status)) => {
                let mut response = make_json_response(StatusCode::OK, &records);
                response.headers_mut().insert(
                    REMOTE_STATUS_HEADER,
                    HeaderValue::from_static(remote_status.as_str()),
                );
                response
            }
            Err(e) => {
                let details = match &e {
                    ReportError::InternalFailure(cause) => {
                        tracing::error!(report = kind.as_str(), error = %cause, "report failed");
                        self.store.rollback().await;
                        format!("Error fetching {}: {cause}", kind.label())
                    }
                    _ => {
                        tracing::info!(
                            report = kind.as_str(),
                            error = %e,
                            "report request rejected"
                        );
                        e.to_string()
                    }
                };
                error_response(e.status(), e.kind(), details)
            }
        };

        histogram!(
            REPORT_REQUEST_DURATION,
            "report" => kind.as_str(),
            "status" => response.status().as_str().to_string()
        )
        .record(start.elapsed().as_secs_f64());

        response
    }

    async fn execute(
        &self,
        endpoint: &Endpoint,
        credential: Option<&str>,
        params: &ReportParams,
    ) -> Result<(Vec<Value>, RemoteStatus), ReportError> {
        let report = &endpoint.report;
        let kind = report.kind();

        // No data access before the caller is known
        let principal = validate_api_key(credential, self.keys.as_ref())?;
        authorize(&principal, endpoint.require_admin)?;

        let forwarded = params.forwarded(report.parameters());
        let (local, remote) = tokio::join!(
            report.local_records(self.store.as_ref(), params),
            self.fetcher.fetch(kind, &endpoint.remote_url, &forwarded),
        );
        let local = local?;

        let remote_records: Vec<Value> = remote
            .records
            .into_iter()
            .filter(|record| report.keep_remote(record))
            .collect();

        histogram!(REPORT_RECORDS, "report" => kind.as_str(), "source" => "local")
            .record(local.len() as f64);
        histogram!(REPORT_RECORDS, "report" => kind.as_str(), "source" => "remote")
            .record(remote_records.len() as f64);
        tracing::info!(
            report = kind.as_str(),
            user = %principal.user,
            local = local.len(),
            remote = remote_records.len(),
            remote_status = remote.status.as_str(),
            "report served"
        );

        let records = report.finish(concat(local, remote_records));
        Ok((records, remote.status))
    }
}
