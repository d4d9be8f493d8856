use serde::{Deserialize, Serialize};
use validator::Validate;

/// Window the dashboard counts are restricted to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardRange {
    Day,
    Week,
    #[default]
    Month,
    Year,
    All,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct DashboardQuery {
    #[serde(default)]
    pub range: DashboardRange,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetricCount {
    pub total: i64,
    pub range_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub prayer_requests: MetricCount,
    pub events: MetricCount,
    pub members: MetricCount,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub range: DashboardRange,
    /// RFC 3339, `null` for `all`.
    pub range_start: Option<String>,
    pub metrics: DashboardMetrics,
}
