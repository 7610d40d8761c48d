use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::domain::device::models::device::{DeviceId, ReplaceDeviceError, ReplaceDeviceRequest};
use crate::domain::device::ports::DeviceService;
use crate::inbound::http::AppState;
use crate::inbound::http::handlers::{ParseDeviceHttpRequestError, parse_device_fields};
use crate::inbound::http::responses::ApiError;

impl From<ReplaceDeviceError> for ApiError {
    fn from(e: ReplaceDeviceError) -> Self {
        match e {
            ReplaceDeviceError::NotFound { id } => {
                Self::NotFound(format!("device with id {} not found", id))
            }
            e @ ReplaceDeviceError::InUse { .. } => Self::BadRequest(e.to_string()),
            ReplaceDeviceError::Unknown(cause) => cause.into(),
        }
    }
}

/// Full replacement body; every mutable field is required.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplaceDeviceHttpRequestBody {
    name: String,
    brand: String,
    state: String,
}

impl ReplaceDeviceHttpRequestBody {
    fn try_into_domain(self) -> Result<ReplaceDeviceRequest, ParseDeviceHttpRequestError> {
        let (name, brand, state) =
            parse_device_fields(&self.name, &self.brand, Some(self.state.as_str()))?;

        Ok(ReplaceDeviceRequest::new(name, brand, state))
    }
}

pub async fn replace_device<DS: DeviceService>(
    Path(id): Path<String>,
    State(state): State<AppState<DS>>,
    Json(body): Json<ReplaceDeviceHttpRequestBody>,
) -> Result<StatusCode, ApiError> {
    let id = DeviceId::new(&id)?;
    let domain_req = body.try_into_domain()?;

    state
        .device_service
        .replace_device(&id, &domain_req)
        .await
        .map_err(ApiError::from)
        .map(|_| StatusCode::NO_CONTENT)
}
