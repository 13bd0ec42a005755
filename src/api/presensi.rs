use crate::{
    auth::auth::AuthUser,
    error::ApiError,
    model::attendance::Attendance,
    utils::db_utils::{build_update_sql, execute_update},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CheckInReq {
    #[schema(example = -7.7956)]
    pub latitude: Option<f64>,
    #[schema(example = 110.3695)]
    pub longitude: Option<f64>,
    /// Opaque reference returned by the photo store; the binary never
    /// passes through this service.
    #[schema(example = "uploads/selfie-42.jpg", nullable = true)]
    pub photo: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CheckOutReq {
    #[schema(example = -7.7956, nullable = true)]
    pub latitude: Option<f64>,
    #[schema(example = 110.3695, nullable = true)]
    pub longitude: Option<f64>,
}

/// Check-in requires both coordinates; absence is a client error, never
/// defaulted.
fn require_location(lat: Option<f64>, lng: Option<f64>) -> Result<(f64, f64), ApiError> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => {
            check_range(lat, lng)?;
            Ok((lat, lng))
        }
        _ => Err(ApiError::InvalidInput(
            "latitude and longitude are required".into(),
        )),
    }
}

/// Check-out location is optional, but a lone coordinate is rejected.
fn optional_location(
    lat: Option<f64>,
    lng: Option<f64>,
) -> Result<Option<(f64, f64)>, ApiError> {
    match (lat, lng) {
        (None, None) => Ok(None),
        (Some(lat), Some(lng)) => {
            check_range(lat, lng)?;
            Ok(Some((lat, lng)))
        }
        _ => Err(ApiError::InvalidInput(
            "latitude and longitude must be supplied together".into(),
        )),
    }
}

fn check_range(lat: f64, lng: f64) -> Result<(), ApiError> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(ApiError::InvalidInput(format!(
            "latitude {} is out of range",
            lat
        )));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(ApiError::InvalidInput(format!(
            "longitude {} is out of range",
            lng
        )));
    }
    Ok(())
}

/// The token is trusted for identity, but the ledger still refuses to
/// write rows for a user id with no backing row.
async fn ensure_user_exists(pool: &MySqlPool, user_id: u64) -> Result<(), ApiError> {
    let found = sqlx::query_scalar::<_, u64>("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id, "Failed to look up user");
            ApiError::Internal
        })?;

    match found {
        Some(_) => Ok(()),
        None => Err(ApiError::UserNotFound),
    }
}

async fn fetch_record(pool: &MySqlPool, id: u64) -> Result<Attendance, ApiError> {
    sqlx::query_as::<_, Attendance>(
        r#"
        SELECT id, user_id, check_in_at, check_in_lat, check_in_lng,
               check_in_photo, check_out_at, check_out_lat, check_out_lng
        FROM presensi
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, id, "Failed to fetch attendance record");
        ApiError::Internal
    })
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/presensi/check-in",
    request_body = CheckInReq,
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully",
            "record": { "id": 1, "user_id": 42 }
        })),
        (status = 400, description = "Already checked in, or missing coordinates", body = Object, example = json!({
            "kind": "already_checked_in",
            "message": "Already checked in, check out first"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Presensi"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CheckInReq>,
) -> actix_web::Result<impl Responder> {
    let user_id = auth.user_id;

    let (lat, lng) = require_location(payload.latitude, payload.longitude)?;
    ensure_user_exists(pool.get_ref(), user_id).await?;

    // Single atomic insert: a second open record for the same user trips
    // the uniq_presensi_open index instead of racing a prior lookup.
    let result = sqlx::query(
        r#"
        INSERT INTO presensi (user_id, check_in_at, check_in_lat, check_in_lng, check_in_photo)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(Utc::now())
    .bind(lat)
    .bind(lng)
    .bind(payload.photo.as_deref())
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(done) => {
            let record = fetch_record(pool.get_ref(), done.last_insert_id()).await?;
            Ok(HttpResponse::Ok().json(json!({
                "message": "Checked in successfully",
                "record": record
            })))
        }

        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Err(ApiError::AlreadyCheckedIn.into());
                }
            }

            tracing::error!(error = %e, user_id, "Check-in failed");
            Err(ApiError::Internal.into())
        }
    }
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/presensi/check-out",
    request_body = CheckOutReq,
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully",
            "record": { "id": 1, "user_id": 42 }
        })),
        (status = 400, description = "No open attendance session", body = Object, example = json!({
            "kind": "no_open_session",
            "message": "No open attendance session to check out"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Presensi"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CheckOutReq>,
) -> actix_web::Result<impl Responder> {
    let user_id = auth.user_id;

    let location = optional_location(payload.latitude, payload.longitude)?;
    ensure_user_exists(pool.get_ref(), user_id).await?;

    let open_id = sqlx::query_scalar::<_, u64>(
        "SELECT id FROM presensi WHERE user_id = ? AND check_out_at IS NULL",
    )
    .bind(user_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id, "Failed to look up open session");
        ApiError::Internal
    })?
    .ok_or(ApiError::NoOpenSession)?;

    let (out_lat, out_lng) = match location {
        Some((lat, lng)) => (Some(lat), Some(lng)),
        None => (None, None),
    };

    // The IS NULL guard keeps the first stamp authoritative: a record
    // closed between the lookup and this update affects zero rows.
    let result = sqlx::query(
        r#"
        UPDATE presensi
        SET check_out_at = ?, check_out_lat = ?, check_out_lng = ?
        WHERE id = ?
        AND check_out_at IS NULL
        "#,
    )
    .bind(Utc::now())
    .bind(out_lat)
    .bind(out_lng)
    .bind(open_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id, "Check-out failed");
        ApiError::Internal
    })?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NoOpenSession.into());
    }

    let record = fetch_record(pool.get_ref(), open_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Checked out successfully",
        "record": record
    })))
}

/// Administrative override: partial update of an attendance record
#[utoipa::path(
    put,
    path = "/api/presensi/{record_id}",
    params(
        ("record_id", Path, description = "Attendance record ID")
    ),
    responses(
        (status = 200, description = "Attendance record updated"),
        (status = 400, description = "Empty or malformed payload"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Attendance record not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Presensi"
)]
pub async fn update_presensi(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let record_id = path.into_inner();

    let update = build_update_sql("presensi", &body, "id", record_id as i64)?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        tracing::error!(error = %e, record_id, "Failed to update attendance record");
        ApiError::Internal
    })?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Attendance record not found"
        })));
    }

    let record = fetch_record(pool.get_ref(), record_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Attendance record updated",
        "record": record
    })))
}

/// Administrative override: delete an attendance record
#[utoipa::path(
    delete,
    path = "/api/presensi/{record_id}",
    params(
        ("record_id", Path, description = "Attendance record ID")
    ),
    responses(
        (status = 200, description = "Attendance record deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Attendance record not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Presensi"
)]
pub async fn delete_presensi(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let record_id = path.into_inner();

    let result = sqlx::query("DELETE FROM presensi WHERE id = ?")
        .bind(record_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) => {
            if res.rows_affected() == 0 {
                return Ok(HttpResponse::NotFound().json(json!({
                    "message": "Attendance record not found"
                })));
            }

            Ok(HttpResponse::Ok().json(json!({
                "message": "Attendance record deleted"
            })))
        }

        Err(e) => {
            tracing::error!(error = %e, record_id, "Failed to delete attendance record");
            Err(ApiError::Internal.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_in_requires_both_coordinates() {
        assert!(require_location(Some(-7.79), Some(110.36)).is_ok());
        assert!(require_location(None, Some(110.36)).is_err());
        assert!(require_location(Some(-7.79), None).is_err());
        assert!(require_location(None, None).is_err());
    }

    #[test]
    fn check_out_location_is_optional_but_paired() {
        assert_eq!(optional_location(None, None).unwrap(), None);
        assert_eq!(
            optional_location(Some(-7.79), Some(110.36)).unwrap(),
            Some((-7.79, 110.36))
        );
        assert!(optional_location(Some(-7.79), None).is_err());
        assert!(optional_location(None, Some(110.36)).is_err());
    }

    #[test]
    fn coordinates_must_be_in_range() {
        assert!(check_range(90.0, 180.0).is_ok());
        assert!(check_range(-90.0, -180.0).is_ok());
        assert!(check_range(90.1, 0.0).is_err());
        assert!(check_range(0.0, -180.5).is_err());
    }

    #[test]
    fn missing_coordinates_report_invalid_input() {
        let err = require_location(None, None).unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }
}
