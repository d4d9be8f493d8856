use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, SecondsFormat, TimeZone, Utc};
use sqlx::PgPool;
use tracing::instrument;

use crate::dtos::{DashboardMetrics, DashboardRange, DashboardStats, MetricCount};
use crate::services::ServiceError;

/// Start of `range` relative to `now`, at local midnight. Weeks start on
/// Monday. `None` for [`DashboardRange::All`].
pub fn range_start<Tz: TimeZone>(
    range: DashboardRange,
    now: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    let today = now.date_naive();
    let first_day = match range {
        DashboardRange::Day => today,
        DashboardRange::Week => {
            today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
        }
        DashboardRange::Month => NaiveDate::from_ymd_opt(today.year(), today.month(), 1)?,
        DashboardRange::Year => NaiveDate::from_ymd_opt(today.year(), 1, 1)?,
        DashboardRange::All => return None,
    };

    // A DST gap at midnight has no local instant; take the earliest valid one.
    now.timezone()
        .from_local_datetime(&first_day.and_hms_opt(0, 0, 0)?)
        .earliest()
}

#[derive(Debug, sqlx::FromRow)]
struct CountRow {
    total: i64,
    range_count: i64,
}

impl From<CountRow> for MetricCount {
    fn from(row: CountRow) -> Self {
        Self {
            total: row.total,
            range_count: row.range_count,
        }
    }
}

#[derive(Clone)]
pub struct DashboardService {
    pool: PgPool,
}

impl DashboardService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn stats(&self, range: DashboardRange) -> Result<DashboardStats, ServiceError> {
        let start = range_start(range, &Local::now());
        let start_utc = start.as_ref().map(|s| s.with_timezone(&Utc));
        let start_date = start.as_ref().map(|s| s.date_naive());

        let prayer_requests = sqlx::query_as::<_, CountRow>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE $1::date IS NULL OR date >= $1) AS range_count
            FROM prayers_requests
            "#,
        )
        .bind(start_date)
        .fetch_one(&self.pool);

        let events = sqlx::query_as::<_, CountRow>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (
                       WHERE $1::timestamptz IS NULL OR start_date_time >= $1
                   ) AS range_count
            FROM events
            "#,
        )
        .bind(start_utc)
        .fetch_one(&self.pool);

        let members = sqlx::query_as::<_, CountRow>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE $1::date IS NULL OR join_date >= $1) AS range_count
            FROM members
            "#,
        )
        .bind(start_date)
        .fetch_one(&self.pool);

        let (prayer_requests, events, members) =
            tokio::try_join!(prayer_requests, events, members)?;

        Ok(DashboardStats {
            range,
            range_start: start_utc.map(|s| s.to_rfc3339_opts(SecondsFormat::Millis, true)),
            metrics: DashboardMetrics {
                prayer_requests: prayer_requests.into(),
                events: events.into(),
                members: members.into(),
            },
        })
    }
}
