use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde::Deserialize;

use crate::domain::device::models::device::{
    DeviceFilter, DeviceState, DeviceStateError, ListDevicesError,
};
use crate::domain::device::ports::DeviceService;
use crate::inbound::http::AppState;
use crate::inbound::http::responses::{ApiError, ApiSuccess, DeviceResponseData};

impl From<ListDevicesError> for ApiError {
    fn from(e: ListDevicesError) -> Self {
        match e {
            ListDevicesError::Unknown(cause) => cause.into(),
        }
    }
}

impl From<DeviceStateError> for ApiError {
    fn from(e: DeviceStateError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListDevicesQuery {
    brand: Option<String>,
    state: Option<String>,
}

impl ListDevicesQuery {
    fn try_into_domain(self) -> Result<DeviceFilter, DeviceStateError> {
        let state = self
            .state
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<DeviceState>)
            .transpose()?;

        Ok(DeviceFilter::new(self.brand.as_deref(), state))
    }
}

pub async fn list_devices<DS: DeviceService>(
    Query(query): Query<ListDevicesQuery>,
    State(state): State<AppState<DS>>,
) -> Result<ApiSuccess<Vec<DeviceResponseData>>, ApiError> {
    let filter = query.try_into_domain()?;

    state
        .device_service
        .list_devices(&filter)
        .await
        .map_err(ApiError::from)
        .map(|devices| {
            ApiSuccess::new(
                StatusCode::OK,
                devices.iter().map(DeviceResponseData::from).collect(),
            )
        })
}
