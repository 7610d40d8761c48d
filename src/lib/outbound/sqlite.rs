use std::str::FromStr;

use anyhow::{Context, anyhow, bail};
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder, SqlitePool};

use crate::domain::device::models::device::CreateDeviceError;
use crate::domain::device::models::device::{
    Device, DeviceBrand, DeviceFilter, DeviceId, DeviceName, DeviceState,
};
use crate::domain::device::ports::DeviceRepository;

static MIGRATOR: Migrator = sqlx::migrate!();

const SELECT_DEVICES: &str = "SELECT id, name, brand, state, creation_time FROM devices";

#[derive(Debug, Clone)]
pub struct Sqlite {
    pool: SqlitePool,
}

impl Sqlite {
    pub async fn new(path: &str) -> Result<Sqlite, anyhow::Error> {
        let options = SqliteConnectOptions::from_str(path)
            .with_context(|| format!("invalid database path {}", path))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open database at {}", path))?;

        Self::with_pool(pool).await
    }

    /// Opens a private in-memory database. A single connection is kept alive
    /// for the lifetime of the pool, otherwise the data would vanish.
    pub async fn in_memory() -> Result<Sqlite, anyhow::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("failed to open in-memory database")?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Sqlite, anyhow::Error> {
        MIGRATOR
            .run(&pool)
            .await
            .context("failed to run database migrations")?;

        Ok(Sqlite { pool })
    }
}

#[derive(Debug, FromRow)]
struct DeviceRecord {
    id: String,
    name: String,
    brand: String,
    state: String,
    creation_time: DateTime<Utc>,
}

impl TryFrom<DeviceRecord> for Device {
    type Error = anyhow::Error;

    fn try_from(record: DeviceRecord) -> Result<Self, Self::Error> {
        let id = DeviceId::new(&record.id)?;
        let name = DeviceName::new(&record.name)
            .with_context(|| format!("stored device {} has an invalid name", id))?;
        let brand = DeviceBrand::new(&record.brand)
            .with_context(|| format!("stored device {} has an invalid brand", id))?;
        let state = DeviceState::from_str(&record.state)
            .with_context(|| format!("stored device {} has an invalid state", id))?;

        Ok(Device::new(id, name, brand, state, record.creation_time))
    }
}

impl DeviceRepository for Sqlite {
    async fn insert_device(&self, device: &Device) -> Result<(), CreateDeviceError> {
        sqlx::query(
            "INSERT INTO devices (id, name, brand, state, creation_time) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(device.id().to_string())
        .bind(device.name().to_string())
        .bind(device.brand().to_string())
        .bind(device.state().as_str())
        .bind(device.creation_time())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_constraint_violation(&e) {
                CreateDeviceError::Duplicate { id: *device.id() }
            } else {
                anyhow!(e)
                    .context(format!("failed to save device with id {}", device.id()))
                    .into()
            }
        })?;

        Ok(())
    }

    async fn find_device_by_id(&self, id: &DeviceId) -> anyhow::Result<Option<Device>> {
        let record = sqlx::query_as::<_, DeviceRecord>(&format!("{SELECT_DEVICES} WHERE id = $1"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to fetch device with id {}", id))?;

        record.map(Device::try_from).transpose()
    }

    async fn find_devices(&self, filter: &DeviceFilter) -> anyhow::Result<Vec<Device>> {
        let mut query_builder = QueryBuilder::new(SELECT_DEVICES);
        let mut separator = " WHERE ";

        if let Some(brand) = filter.brand() {
            query_builder.push(separator).push("brand = ").push_bind(brand);
            separator = " AND ";
        }

        if let Some(state) = filter.state() {
            query_builder
                .push(separator)
                .push("state = ")
                .push_bind(state.as_str());
        }

        let records = query_builder
            .build_query_as::<DeviceRecord>()
            .fetch_all(&self.pool)
            .await
            .context("failed to list devices")?;

        records.into_iter().map(Device::try_from).collect()
    }

    async fn update_device(&self, device: &Device) -> anyhow::Result<()> {
        let result = sqlx::query("UPDATE devices SET name = $1, brand = $2, state = $3 WHERE id = $4")
            .bind(device.name().to_string())
            .bind(device.brand().to_string())
            .bind(device.state().as_str())
            .bind(device.id().to_string())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to update device with id {}", device.id()))?;

        if result.rows_affected() == 0 {
            bail!("device with id {} disappeared before update", device.id());
        }

        Ok(())
    }

    async fn delete_device(&self, id: &DeviceId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM devices WHERE id = $1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete device with id {}", id))?;

        Ok(())
    }
}

fn is_unique_constraint_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.is_unique_violation();
    }

    false
}
