use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::domain::device::models::device::{DeleteDeviceError, DeviceId};
use crate::domain::device::ports::DeviceService;
use crate::inbound::http::AppState;
use crate::inbound::http::responses::ApiError;

impl From<DeleteDeviceError> for ApiError {
    fn from(e: DeleteDeviceError) -> Self {
        match e {
            DeleteDeviceError::NotFound { id } => {
                Self::NotFound(format!("device with id {} not found", id))
            }
            e @ DeleteDeviceError::InUse { .. } => Self::BadRequest(e.to_string()),
            DeleteDeviceError::Unknown(cause) => cause.into(),
        }
    }
}

pub async fn delete_device<DS: DeviceService>(
    Path(id): Path<String>,
    State(state): State<AppState<DS>>,
) -> Result<StatusCode, ApiError> {
    let id = DeviceId::new(&id)?;

    state
        .device_service
        .delete_device(&id)
        .await
        .map_err(ApiError::from)
        .map(|_| StatusCode::NO_CONTENT)
}
