use crate::{auth::auth::AuthUser, error::ApiError};
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ReportQuery {
    /// Substring match against the owning user's name
    #[schema(example = "ali")]
    pub name: Option<String>,
    /// Start of the check-in date window (YYYY-MM-DD); only applied
    /// together with dateTo
    #[serde(rename = "dateFrom")]
    #[schema(example = "2025-10-01")]
    pub date_from: Option<String>,
    /// End of the check-in date window (YYYY-MM-DD); only applied
    /// together with dateFrom
    #[serde(rename = "dateTo")]
    #[schema(example = "2025-10-31")]
    pub date_to: Option<String>,
}

/// Parsed filter values, decoupled from the query-string representation
/// so the predicate builder can be exercised without a store.
#[derive(Debug, Default, PartialEq)]
pub struct ReportFilter {
    pub name: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl ReportFilter {
    fn from_query(query: &ReportQuery) -> Result<Self, ApiError> {
        Ok(Self {
            name: query.name.clone().filter(|n| !n.is_empty()),
            date_from: parse_date_param("dateFrom", query.date_from.as_deref())?,
            date_to: parse_date_param("dateTo", query.date_to.as_deref())?,
        })
    }
}

fn parse_date_param(
    param: &str,
    value: Option<&str>,
) -> Result<Option<NaiveDate>, ApiError> {
    match value {
        None => Ok(None),
        Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                ApiError::InvalidInput(format!("{} must be a YYYY-MM-DD date", param))
            }),
    }
}

#[derive(Debug, PartialEq)]
enum BindValue {
    Text(String),
    Timestamp(DateTime<Utc>),
}

/// Lowers the filter into a WHERE fragment plus its bind values, in bind
/// order. Predicates combine conjunctively; an absent filter contributes
/// nothing.
fn build_report_query(filter: &ReportFilter) -> (String, Vec<BindValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut binds: Vec<BindValue> = Vec::new();

    if let Some(name) = filter.name.as_deref() {
        where_sql.push_str(" AND u.name LIKE ?");
        binds.push(BindValue::Text(format!("%{}%", name)));
    }

    // Both bounds or nothing: a partial range is ignored, not opened up.
    if let (Some(from), Some(to)) = (filter.date_from, filter.date_to) {
        let start = from.and_time(NaiveTime::MIN).and_utc();
        let end = to.and_time(NaiveTime::MIN).and_utc() + Duration::days(1);
        where_sql.push_str(" AND p.check_in_at >= ? AND p.check_in_at < ?");
        binds.push(BindValue::Timestamp(start));
        binds.push(BindValue::Timestamp(end));
    }

    (where_sql, binds)
}

/// Flattened, user-joined projection of one attendance record.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct ReportRow {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 42)]
    pub user_id: u64,
    #[schema(example = "Natalia")]
    pub user_name: String,
    #[schema(example = "2025-10-07T08:01:12Z", format = "date-time", value_type = String)]
    pub check_in_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = String, nullable = true)]
    pub check_out_at: Option<DateTime<Utc>>,
    pub check_in_lat: f64,
    pub check_in_lng: f64,
    #[schema(nullable = true)]
    pub check_out_lat: Option<f64>,
    #[schema(nullable = true)]
    pub check_out_lng: Option<f64>,
    #[schema(example = "uploads/selfie-42.jpg", nullable = true)]
    pub photo: Option<String>,
}

/// Filters actually applied, echoed back with null for the omitted ones.
#[derive(Debug, Serialize, ToSchema)]
pub struct FilterEcho {
    pub name: Option<String>,
    #[serde(rename = "dateFrom")]
    #[schema(value_type = String, format = "date", nullable = true)]
    pub date_from: Option<NaiveDate>,
    #[serde(rename = "dateTo")]
    #[schema(value_type = String, format = "date", nullable = true)]
    pub date_to: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct ReportResponse {
    #[serde(rename = "reportDate")]
    #[schema(format = "date-time", value_type = String)]
    pub report_date: DateTime<Utc>,
    #[serde(rename = "totalData")]
    #[schema(example = 3)]
    pub total_data: usize,
    pub filter: FilterEcho,
    pub data: Vec<ReportRow>,
}

/// Attendance report endpoint
#[utoipa::path(
    get,
    path = "/api/reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Joined attendance report", body = ReportResponse),
        (status = 400, description = "Malformed date filter"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Report query failed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Reports"
)]
pub async fn attendance_report(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let filter = ReportFilter::from_query(&query)?;
    let (where_sql, binds) = build_report_query(&filter);

    // No ORDER BY: rows come back in store order, which is not guaranteed
    // to be chronological.
    let data_sql = format!(
        r#"
        SELECT p.id, p.user_id, u.name AS user_name,
               p.check_in_at, p.check_out_at,
               p.check_in_lat, p.check_in_lng,
               p.check_out_lat, p.check_out_lng,
               p.check_in_photo AS photo
        FROM presensi p
        INNER JOIN users u ON u.id = p.user_id{}
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, ReportRow>(&data_sql);
    for bind in &binds {
        data_q = match bind {
            BindValue::Text(v) => data_q.bind(v.clone()),
            BindValue::Timestamp(v) => data_q.bind(*v),
        };
    }

    let rows = data_q.fetch_all(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, sql = %data_sql, "Report query failed");
        ApiError::QueryFailed(e.to_string())
    })?;

    Ok(HttpResponse::Ok().json(ReportResponse {
        report_date: Utc::now(),
        total_data: rows.len(),
        filter: FilterEcho {
            name: filter.name,
            date_from: filter.date_from,
            date_to: filter.date_to,
        },
        data: rows,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn no_filters_matches_everything() {
        let (sql, binds) = build_report_query(&ReportFilter::default());
        assert_eq!(sql, " WHERE 1=1");
        assert!(binds.is_empty());
    }

    #[test]
    fn name_filter_becomes_substring_like() {
        let filter = ReportFilter {
            name: Some("ali".into()),
            ..Default::default()
        };
        let (sql, binds) = build_report_query(&filter);
        assert_eq!(sql, " WHERE 1=1 AND u.name LIKE ?");
        assert_eq!(binds, vec![BindValue::Text("%ali%".into())]);
    }

    #[test]
    fn full_date_range_covers_both_boundary_days() {
        let filter = ReportFilter {
            date_from: Some(date("2025-10-01")),
            date_to: Some(date("2025-10-31")),
            ..Default::default()
        };
        let (sql, binds) = build_report_query(&filter);
        assert_eq!(sql, " WHERE 1=1 AND p.check_in_at >= ? AND p.check_in_at < ?");

        // The end bound is the first instant of the day after dateTo, so
        // all of 2025-10-31 is in range and 2025-11-01 is out.
        match &binds[..] {
            [BindValue::Timestamp(start), BindValue::Timestamp(end)] => {
                assert_eq!(start.to_rfc3339(), "2025-10-01T00:00:00+00:00");
                assert_eq!(end.to_rfc3339(), "2025-11-01T00:00:00+00:00");
            }
            other => panic!("unexpected binds: {:?}", other),
        }
    }

    #[test]
    fn partial_date_range_is_ignored() {
        let only_from = ReportFilter {
            date_from: Some(date("2025-10-01")),
            ..Default::default()
        };
        let only_to = ReportFilter {
            date_to: Some(date("2025-10-31")),
            ..Default::default()
        };

        for filter in [only_from, only_to] {
            let (sql, binds) = build_report_query(&filter);
            assert_eq!(sql, " WHERE 1=1");
            assert!(binds.is_empty());
        }
    }

    #[test]
    fn filters_combine_conjunctively() {
        let filter = ReportFilter {
            name: Some("ali".into()),
            date_from: Some(date("2025-10-01")),
            date_to: Some(date("2025-10-31")),
        };
        let (sql, binds) = build_report_query(&filter);
        assert_eq!(
            sql,
            " WHERE 1=1 AND u.name LIKE ? AND p.check_in_at >= ? AND p.check_in_at < ?"
        );
        assert_eq!(binds.len(), 3);
    }

    #[test]
    fn malformed_dates_are_rejected() {
        assert!(parse_date_param("dateFrom", Some("31-10-2025")).is_err());
        assert!(parse_date_param("dateFrom", Some("not-a-date")).is_err());

        let err = parse_date_param("dateTo", Some("2025-13-01")).unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[test]
    fn absent_or_blank_dates_parse_to_none() {
        assert_eq!(parse_date_param("dateFrom", None).unwrap(), None);
        assert_eq!(parse_date_param("dateFrom", Some("")).unwrap(), None);
        assert_eq!(
            parse_date_param("dateTo", Some("2025-10-31")).unwrap(),
            Some(date("2025-10-31"))
        );
    }

    #[test]
    fn blank_name_param_is_not_a_filter() {
        let query = ReportQuery {
            name: Some(String::new()),
            date_from: None,
            date_to: None,
        };
        let filter = ReportFilter::from_query(&query).unwrap();
        assert_eq!(filter.name, None);
    }
}
