use axum::{
    Json,
    extract::{Path, State},
};

use callboard_db::models::Call;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn get_call(
    State(state): State<AppState>,
    Path(call_sid): Path<String>,
) -> Result<Json<Call>, ApiError> {
    match state.calls.find(&call_sid).await {
        Ok(Some(call)) => Ok(Json(call)),
        Ok(None) => Err(ApiError::NotFound(format!("No call with sid {call_sid}"))),
        Err(e) => Err(ApiError::Internal(e.to_string())),
    }
}
