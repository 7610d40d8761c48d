use thiserror::Error;

use crate::domain::device::models::device::{
    DeviceBrand, DeviceBrandError, DeviceName, DeviceNameError, DeviceState, DeviceStateError,
};
use crate::inbound::http::responses::ApiError;

pub mod create_device;
pub mod delete_device;
pub mod get_device;
pub mod list_devices;
pub mod patch_device;
pub mod replace_device;

#[derive(Debug, Clone, Error)]
enum ParseDeviceHttpRequestError {
    #[error(transparent)]
    Name(#[from] DeviceNameError),
    #[error(transparent)]
    Brand(#[from] DeviceBrandError),
    #[error(transparent)]
    State(#[from] DeviceStateError),
}

impl From<ParseDeviceHttpRequestError> for ApiError {
    fn from(e: ParseDeviceHttpRequestError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

/// Validates the fields shared by the create and replace bodies. A missing
/// state falls back to [DeviceState::Available].
fn parse_device_fields(
    name: &str,
    brand: &str,
    state: Option<&str>,
) -> Result<(DeviceName, DeviceBrand, DeviceState), ParseDeviceHttpRequestError> {
    let name = DeviceName::new(name)?;
    let brand = DeviceBrand::new(brand)?;
    let state = state
        .map(str::parse::<DeviceState>)
        .transpose()?
        .unwrap_or_default();

    Ok((name, brand, state))
}
