//! OpenAPI description of the posture report.

use utoipa::OpenApi;

use crate::report::{
    AccessControl, BranchProtectionRules, Posture, PostureReport, Scope, SecurityFeatures,
};

#[derive(OpenApi)]
#[openapi(
    info(title = "orgposture report", description = "GitHub organization security posture"),
    components(
        schemas(
            PostureReport,
            Scope,
            Posture,
            AccessControl,
            BranchProtectionRules,
            SecurityFeatures
        )
    )
)]
/// OpenAPI document carrying the report component schemas.
pub struct ReportSchema;

/// Render the report schema as pretty-printed JSON.
pub fn render_schema_json() -> Result<String, serde_json::Error> {
    ReportSchema::openapi().to_pretty_json()
}
