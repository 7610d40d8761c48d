use std::future::Future;

use crate::domain::device::models::device::{
    CreateDeviceError, DeleteDeviceError, GetDeviceError, ListDevicesError, PatchDeviceError,
    ReplaceDeviceError,
};
use crate::domain::device::models::device::{
    CreateDeviceRequest, Device, DeviceFilter, DeviceId, DevicePatch, ReplaceDeviceRequest,
};

/// `DeviceService` is the public API for the device domain.
pub trait DeviceService: Clone + Send + Sync + 'static {
    fn create_device(
        &self,
        req: &CreateDeviceRequest,
    ) -> impl Future<Output = Result<Device, CreateDeviceError>> + Send;

    fn get_device(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<Device, GetDeviceError>> + Send;

    fn list_devices(
        &self,
        filter: &DeviceFilter,
    ) -> impl Future<Output = Result<Vec<Device>, ListDevicesError>> + Send;

    fn replace_device(
        &self,
        id: &DeviceId,
        req: &ReplaceDeviceRequest,
    ) -> impl Future<Output = Result<Device, ReplaceDeviceError>> + Send;

    fn patch_device(
        &self,
        id: &DeviceId,
        patch: &DevicePatch,
    ) -> impl Future<Output = Result<Device, PatchDeviceError>> + Send;

    fn delete_device(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = Result<(), DeleteDeviceError>> + Send;
}

/// `DeviceRepository` represents a store of device data.
///
/// Implementations hold no business rules; every write is a full row
/// overwrite keyed by [DeviceId].
pub trait DeviceRepository: Send + Sync + Clone + 'static {
    fn insert_device(
        &self,
        device: &Device,
    ) -> impl Future<Output = Result<(), CreateDeviceError>> + Send;

    fn find_device_by_id(
        &self,
        id: &DeviceId,
    ) -> impl Future<Output = anyhow::Result<Option<Device>>> + Send;

    fn find_devices(
        &self,
        filter: &DeviceFilter,
    ) -> impl Future<Output = anyhow::Result<Vec<Device>>> + Send;

    fn update_device(&self, device: &Device) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn delete_device(&self, id: &DeviceId) -> impl Future<Output = anyhow::Result<()>> + Send;
}
