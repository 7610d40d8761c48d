use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::domain::device::models::device::{DeviceId, GetDeviceError};
use crate::domain::device::ports::DeviceService;
use crate::inbound::http::AppState;
use crate::inbound::http::responses::{ApiError, ApiSuccess, DeviceResponseData};

impl From<GetDeviceError> for ApiError {
    fn from(e: GetDeviceError) -> Self {
        match e {
            GetDeviceError::NotFound { id } => {
                Self::NotFound(format!("device with id {} not found", id))
            }
            GetDeviceError::Unknown(cause) => cause.into(),
        }
    }
}

pub async fn get_device<DS: DeviceService>(
    Path(id): Path<String>,
    State(state): State<AppState<DS>>,
) -> Result<ApiSuccess<DeviceResponseData>, ApiError> {
    let id = DeviceId::new(&id)?;

    state
        .device_service
        .get_device(&id)
        .await
        .map_err(ApiError::from)
        .map(|ref device| ApiSuccess::new(StatusCode::OK, device.into()))
}
