use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One check-in/check-out cycle. `check_out_at` stays NULL while the
/// record is open; at most one open record may exist per user (enforced
/// by the `uniq_presensi_open` index).
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 42)]
    pub user_id: u64,

    #[schema(example = "2025-10-07T08:01:12Z", format = "date-time", value_type = String)]
    pub check_in_at: DateTime<Utc>,

    #[schema(example = -7.7956)]
    pub check_in_lat: f64,

    #[schema(example = 110.3695)]
    pub check_in_lng: f64,

    #[schema(example = "uploads/selfie-42.jpg", nullable = true)]
    pub check_in_photo: Option<String>,

    #[schema(example = "2025-10-07T16:58:40Z", format = "date-time", value_type = String, nullable = true)]
    pub check_out_at: Option<DateTime<Utc>>,

    #[schema(nullable = true)]
    pub check_out_lat: Option<f64>,

    #[schema(nullable = true)]
    pub check_out_lng: Option<f64>,
}
