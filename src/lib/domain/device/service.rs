use chrono::Utc;

use crate::domain::device::models::device::{
    CreateDeviceError, DeleteDeviceError, DevicePatchRejection, GetDeviceError,
    ListDevicesError, PatchDeviceError, ReplaceDeviceError, StateUpdate,
};
use crate::domain::device::models::device::{
    CreateDeviceRequest, Device, DeviceFilter, DeviceId, DevicePatch, ReplaceDeviceRequest,
};
use crate::domain::device::ports::{DeviceRepository, DeviceService};

/// Canonical implementation of the [DeviceService] port, through which the device domain API is
/// consumed.
///
/// Every mutating operation loads the current row, runs the state policy on
/// [Device] and only then writes, so a rejected operation never reaches the
/// repository.
#[derive(Debug, Clone)]
pub struct Service<R: DeviceRepository> {
    repo: R,
}

impl<R: DeviceRepository> Service<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    async fn load(&self, id: &DeviceId) -> anyhow::Result<Option<Device>> {
        self.repo.find_device_by_id(id).await
    }
}

impl<R: DeviceRepository> DeviceService for Service<R> {
    async fn create_device(&self, req: &CreateDeviceRequest) -> Result<Device, CreateDeviceError> {
        let device = Device::new(
            DeviceId::generate(),
            req.name().clone(),
            req.brand().clone(),
            req.state(),
            Utc::now(),
        );

        self.repo.insert_device(&device).await?;

        tracing::info!(id = %device.id(), state = %device.state(), "device created");

        Ok(device)
    }

    async fn get_device(&self, id: &DeviceId) -> Result<Device, GetDeviceError> {
        self.load(id)
            .await?
            .ok_or(GetDeviceError::NotFound { id: *id })
    }

    async fn list_devices(&self, filter: &DeviceFilter) -> Result<Vec<Device>, ListDevicesError> {
        let devices = self.repo.find_devices(filter).await?;

        tracing::debug!(count = devices.len(), ?filter, "listed devices");

        Ok(devices)
    }

    async fn replace_device(
        &self,
        id: &DeviceId,
        req: &ReplaceDeviceRequest,
    ) -> Result<Device, ReplaceDeviceError> {
        let mut device = self
            .load(id)
            .await?
            .ok_or(ReplaceDeviceError::NotFound { id: *id })?;

        device.replace(req).map_err(|_| {
            tracing::warn!(%id, "rejected name or brand change of in-use device");
            ReplaceDeviceError::InUse { id: *id }
        })?;

        self.repo.update_device(&device).await?;

        tracing::info!(%id, state = %device.state(), "device replaced");

        Ok(device)
    }

    async fn patch_device(
        &self,
        id: &DeviceId,
        patch: &DevicePatch,
    ) -> Result<Device, PatchDeviceError> {
        let mut device = self
            .load(id)
            .await?
            .ok_or(PatchDeviceError::NotFound { id: *id })?;

        device.apply_patch(patch).map_err(|rejection| {
            tracing::warn!(%id, %rejection, "rejected device patch");
            match rejection {
                DevicePatchRejection::CreationTimeImmutable => {
                    PatchDeviceError::CreationTimeImmutable { id: *id }
                }
                DevicePatchRejection::InUse(_) => PatchDeviceError::InUse { id: *id },
                DevicePatchRejection::Name(e) => PatchDeviceError::InvalidName(e),
                DevicePatchRejection::Brand(e) => PatchDeviceError::InvalidBrand(e),
            }
        })?;

        if let Some(StateUpdate::Unrecognized(raw)) = patch.state() {
            tracing::warn!(%id, state = %raw, "ignoring unrecognized device state");
        }

        self.repo.update_device(&device).await?;

        tracing::info!(%id, state = %device.state(), "device patched");

        Ok(device)
    }

    async fn delete_device(&self, id: &DeviceId) -> Result<(), DeleteDeviceError> {
        let device = self
            .load(id)
            .await?
            .ok_or(DeleteDeviceError::NotFound { id: *id })?;

        device.ensure_deletable().map_err(|_| {
            tracing::warn!(%id, "rejected deletion of in-use device");
            DeleteDeviceError::InUse { id: *id }
        })?;

        self.repo.delete_device(id).await?;

        tracing::info!(%id, "device deleted");

        Ok(())
    }
}
