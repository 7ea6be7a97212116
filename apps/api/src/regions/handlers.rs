use axum::{extract::State, Json};

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::regions::assignment::{assign_regions, AssignmentReport};
use crate::state::AppState;

/// POST /api/v1/admin/regions/assign
pub async fn handle_assign_regions(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<AssignmentReport>, AppError> {
    current.require_admin()?;
    Ok(Json(assign_regions(&state.db).await?))
}
