use axum::Json;
use axum::extract::State;
use axum::http::{HeaderName, StatusCode, header};
use serde::Deserialize;

use crate::domain::device::models::device::{CreateDeviceError, CreateDeviceRequest};
use crate::domain::device::ports::DeviceService;
use crate::inbound::http::AppState;
use crate::inbound::http::handlers::{ParseDeviceHttpRequestError, parse_device_fields};
use crate::inbound::http::responses::{ApiError, ApiSuccess, DeviceResponseData};

impl From<CreateDeviceError> for ApiError {
    fn from(e: CreateDeviceError) -> Self {
        match e {
            CreateDeviceError::Duplicate { id } => {
                Self::Conflict(format!("device with id {} already exists", id))
            }
            CreateDeviceError::Unknown(cause) => cause.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateDeviceHttpRequestBody {
    name: String,
    brand: String,
    #[serde(default)]
    state: Option<String>,
}

impl CreateDeviceHttpRequestBody {
    fn try_into_domain(self) -> Result<CreateDeviceRequest, ParseDeviceHttpRequestError> {
        let (name, brand, state) =
            parse_device_fields(&self.name, &self.brand, self.state.as_deref())?;

        Ok(CreateDeviceRequest::new(name, brand, state))
    }
}

pub async fn create_device<DS: DeviceService>(
    State(state): State<AppState<DS>>,
    Json(body): Json<CreateDeviceHttpRequestBody>,
) -> Result<([(HeaderName, String); 1], ApiSuccess<DeviceResponseData>), ApiError> {
    let domain_req = body.try_into_domain()?;
    state
        .device_service
        .create_device(&domain_req)
        .await
        .map_err(ApiError::from)
        .map(|ref device| {
            let location = format!("/api/devices/{}", device.id());
            (
                [(header::LOCATION, location)],
                ApiSuccess::new(StatusCode::CREATED, device.into()),
            )
        })
}
