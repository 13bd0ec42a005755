use crate::api::presensi::{CheckInReq, CheckOutReq};
use crate::api::report::{FilterEcho, ReportQuery, ReportResponse, ReportRow};
use crate::model::attendance::Attendance;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Presensi API",
        version = "1.0.0",
        description = r#"
## Presensi (Attendance) Service

This API powers a campus attendance system: students check in and out with
geolocation and a selfie reference, and administrators pull filtered reports.

### 🔹 Key Features
- **Attendance Ledger**
  - Check-in with coordinates and optional photo evidence
  - Check-out closing the open session (one open session per user, enforced)
  - Administrative correction and deletion of records
- **Reports**
  - Name-substring and check-in date-range filtering
  - Joined user identity in every row, with generation time and match count

### 🔐 Security
Endpoints under the API prefix are protected with **JWT Bearer authentication**.
Reports and record overrides require the **admin** role.

### 📦 Response Format
- JSON-based RESTful responses
- Errors carry a machine-readable `kind` and a human-readable `message`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::presensi::check_in,
        crate::api::presensi::check_out,
        crate::api::presensi::update_presensi,
        crate::api::presensi::delete_presensi,

        crate::api::report::attendance_report,
    ),
    components(
        schemas(
            CheckInReq,
            CheckOutReq,
            Attendance,
            ReportQuery,
            ReportRow,
            FilterEcho,
            ReportResponse
        )
    ),
    tags(
        (name = "Presensi", description = "Check-in / check-out APIs"),
        (name = "Reports", description = "Attendance reporting APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
