use shared::metrics_defs::{MetricDef, MetricType};

pub const REPORT_REQUEST_DURATION: MetricDef = MetricDef {
    name: "report.request.duration",
    metric_type: MetricType::Histogram,
    description: "Report request duration in seconds. Tagged with report, status.",
};

pub const REPORT_RECORDS: MetricDef = MetricDef {
    name: "report.records",
    metric_type: MetricType::Histogram,
    description: "Records returned per report response. Tagged with report, source.",
};

pub const REMOTE_FETCH_DURATION: MetricDef = MetricDef {
    name: "remote.fetch.duration",
    metric_type: MetricType::Histogram,
    description: "Duration of the remote instance fetch in seconds. Tagged with report, outcome.",
};

pub const REMOTE_FETCH_DEGRADED: MetricDef = MetricDef {
    name: "remote.fetch.degraded",
    metric_type: MetricType::Counter,
    description: "Remote fetches that contributed no records because of a failure. Tagged with report, reason.",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REPORT_REQUEST_DURATION,
    REPORT_RECORDS,
    REMOTE_FETCH_DURATION,
    REMOTE_FETCH_DEGRADED,
];
