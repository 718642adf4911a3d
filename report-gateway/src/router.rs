use crate::config::Config;
use crate::reports::{Report, ReportKind};
use hyper::Method;
use std::sync::Arc;
use url::Url;

/// One report endpoint with its settings resolved from configuration
pub struct Endpoint {
    pub report: Arc<dyn Report>,
    /// Where the remote copy of the report is fetched from
    pub remote_url: Url,
    pub require_admin: bool,
}

impl Endpoint {
    pub fn kind(&self) -> ReportKind {
        self.report.kind()
    }
}

#[derive(Debug, PartialEq)]
pub enum Route<'a> {
    Report(&'a Endpoint),
    MethodNotAllowed,
    NotFound,
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("kind", &self.kind())
            .field("remote_url", &self.remote_url.as_str())
            .field("require_admin", &self.require_admin)
            .finish()
    }
}

impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind()
    }
}

/// Resolves request paths to report endpoints
pub struct EndpointRegistry {
    endpoints: Vec<Endpoint>,
}

impl EndpointRegistry {
    /// Builds one endpoint per report. The remote URL is the per-report
    /// override if configured, else the report path joined onto
    /// `remote.base_url`.
    pub fn new(config: &Config, reports: Vec<Arc<dyn Report>>) -> Result<Self, url::ParseError> {
        let mut endpoints = Vec::with_capacity(reports.len());

        for report in reports {
            let kind = report.kind();
            let overrides = config.endpoints.get(&kind);

            let remote_url = match overrides.and_then(|o| o.remote_url.clone()) {
                Some(url) => url,
                None => config.remote.base_url.join(kind.path())?,
            };
            let require_admin = overrides
                .and_then(|o| o.require_admin)
                .unwrap_or(kind.requires_admin());

            tracing::debug!(
                report = kind.as_str(),
                remote_url = %remote_url,
                require_admin,
                "registered report endpoint"
            );
            endpoints.push(Endpoint {
                report,
                remote_url,
                require_admin,
            });
        }

        Ok(Self { endpoints })
    }

    pub fn get(&self, kind: ReportKind) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.kind() == kind)
    }

    /// Matches a request. A single trailing slash is ignored; only GET is
    /// served.
    pub fn route(&self, method: &Method, path: &str) -> Route<'_> {
        let path = match path.strip_suffix('/') {
            Some(stripped) if !stripped.is_empty() => stripped,
            _ => path,
        };

        match self.endpoints.iter().find(|e| e.kind().path() == path) {
            Some(endpoint) if method == Method::GET => Route::Report(endpoint),
            Some(_) => Route::MethodNotAllowed,
            None => Route::NotFound,
        }
    }
}
