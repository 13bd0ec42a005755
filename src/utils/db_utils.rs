use crate::error::ApiError;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use sqlx::MySqlPool;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    id_column: &str,
    id_value: i64,
) -> Result<SqlUpdate, ApiError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ApiError::InvalidInput("Payload must be a JSON object".into()))?;

    if obj.is_empty() {
        return Err(ApiError::InvalidInput(
            "No fields provided for update".into(),
        ));
    }

    // Build SET clause
    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values = Vec::with_capacity(obj.len() + 1);

    // Convert JSON values → SqlValue; ISO-8601 strings bind as dates
    for value in obj.values() {
        match value {
            Value::String(s) => {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    values.push(SqlValue::Date(d));
                } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                    values.push(SqlValue::DateTime(dt));
                } else {
                    values.push(SqlValue::String(s.clone()));
                }
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    values.push(SqlValue::I64(i));
                } else if let Some(f) = n.as_f64() {
                    values.push(SqlValue::F64(f));
                }
            }
            Value::Bool(b) => values.push(SqlValue::Bool(*b)),
            Value::Null => values.push(SqlValue::Null),
            _ => {
                return Err(ApiError::InvalidInput(
                    "Unsupported JSON value type".into(),
                ));
            }
        }
    }

    // WHERE id = ?
    values.push(SqlValue::I64(id_value));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_set_clause_with_trailing_id_bind() {
        let payload = json!({ "check_out_lat": -7.79 });
        let update = build_update_sql("presensi", &payload, "id", 5).unwrap();

        assert_eq!(update.sql, "UPDATE presensi SET check_out_lat = ? WHERE id = ?");
        assert_eq!(
            update.values,
            vec![SqlValue::F64(-7.79), SqlValue::I64(5)]
        );
    }

    #[test]
    fn iso_strings_bind_as_dates() {
        let payload = json!({
            "check_in_at": "2025-10-07T08:01:12",
            "note": "manual correction"
        });
        let update = build_update_sql("presensi", &payload, "id", 1).unwrap();

        assert!(update.values.contains(&SqlValue::DateTime(
            NaiveDateTime::parse_from_str("2025-10-07T08:01:12", "%Y-%m-%dT%H:%M:%S").unwrap()
        )));
        assert!(update
            .values
            .contains(&SqlValue::String("manual correction".into())));
    }

    #[test]
    fn empty_payload_is_rejected() {
        let err = build_update_sql("presensi", &json!({}), "id", 1).unwrap_err();
        assert_eq!(err.kind(), "invalid_input");
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(build_update_sql("presensi", &json!([1, 2]), "id", 1).is_err());
        assert!(build_update_sql("presensi", &json!("x"), "id", 1).is_err());
    }

    #[test]
    fn null_clears_a_column() {
        let payload = json!({ "check_in_photo": null });
        let update = build_update_sql("presensi", &payload, "id", 9).unwrap();
        assert_eq!(update.values[0], SqlValue::Null);
    }
}
