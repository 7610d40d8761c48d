use std::str::FromStr;

use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use thiserror::Error;
use uuid::Uuid;

/// Maximum number of characters accepted for a device name or brand.
pub const MAX_TEXT_LENGTH: usize = 100;

/// Represents always valid device identifier.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(Uuid);

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0} is not a valid device id")]
pub struct DeviceIdError(String);
impl DeviceId {
    pub fn new(raw_id: &str) -> Result<Self, DeviceIdError> {
        match Uuid::try_parse(raw_id) {
            Ok(uuid) => {
                if uuid.is_nil() {
                    Err(DeviceIdError(raw_id.to_string()))
                } else {
                    Ok(DeviceId(uuid))
                }
            }
            Err(_) => Err(DeviceIdError(raw_id.to_string())),
        }
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TextViolation {
    Empty,
    TooLong,
}

fn normalize_text(raw: &str) -> Result<String, TextViolation> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(TextViolation::Empty)
    } else if trimmed.chars().count() > MAX_TEXT_LENGTH {
        Err(TextViolation::TooLong)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Represents always valid device name.
#[derive(Display, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeviceName(String);

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DeviceNameError {
    #[error("device name cannot be empty")]
    Empty,
    #[error("device name cannot be longer than {} characters", MAX_TEXT_LENGTH)]
    TooLong,
}
impl DeviceName {
    pub fn new(raw_name: &str) -> Result<Self, DeviceNameError> {
        normalize_text(raw_name).map(Self).map_err(|v| match v {
            TextViolation::Empty => DeviceNameError::Empty,
            TextViolation::TooLong => DeviceNameError::TooLong,
        })
    }
}

/// Represents always valid device brand.
#[derive(Display, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeviceBrand(String);

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DeviceBrandError {
    #[error("device brand cannot be empty")]
    Empty,
    #[error("device brand cannot be longer than {} characters", MAX_TEXT_LENGTH)]
    TooLong,
}
impl DeviceBrand {
    pub fn new(raw_brand: &str) -> Result<Self, DeviceBrandError> {
        normalize_text(raw_brand).map(Self).map_err(|v| match v {
            TextViolation::Empty => DeviceBrandError::Empty,
            TextViolation::TooLong => DeviceBrandError::TooLong,
        })
    }
}

/// Lifecycle state of a device. Any state may follow any other.
#[derive(Display, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DeviceState {
    #[default]
    Available,
    InUse,
    Inactive,
}

#[derive(Clone, Debug, Error, PartialEq)]
#[error("{0} is not a valid device state")]
pub struct DeviceStateError(String);

impl DeviceState {
    pub const ALL: [DeviceState; 3] = [Self::Available, Self::InUse, Self::Inactive];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::InUse => "InUse",
            Self::Inactive => "Inactive",
        }
    }
}

impl FromStr for DeviceState {
    type Err = DeviceStateError;

    /// Matches variant names ignoring ASCII case.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        Self::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| DeviceStateError(raw.to_string()))
    }
}

/// Returned by the state policy when an operation touches a frozen in-use device.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
#[error("device is in use")]
pub struct DeviceInUseError;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DevicePatchRejection {
    #[error("creation time cannot be updated")]
    CreationTimeImmutable,
    #[error(transparent)]
    InUse(#[from] DeviceInUseError),
    #[error(transparent)]
    Name(#[from] DeviceNameError),
    #[error(transparent)]
    Brand(#[from] DeviceBrandError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Device {
    id: DeviceId,
    name: DeviceName,
    brand: DeviceBrand,
    state: DeviceState,
    creation_time: DateTime<Utc>,
}

impl Device {
    pub fn new(
        id: DeviceId,
        name: DeviceName,
        brand: DeviceBrand,
        state: DeviceState,
        creation_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            brand,
            state,
            creation_time,
        }
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    pub fn name(&self) -> &DeviceName {
        &self.name
    }

    pub fn brand(&self) -> &DeviceBrand {
        &self.brand
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn creation_time(&self) -> &DateTime<Utc> {
        &self.creation_time
    }

    pub fn is_in_use(&self) -> bool {
        self.state == DeviceState::InUse
    }

    /// Overwrites name, brand and state. While the device is in use, name and
    /// brand must be resubmitted unchanged; nothing is modified on rejection.
    pub fn replace(&mut self, req: &ReplaceDeviceRequest) -> Result<(), DeviceInUseError> {
        if self.is_in_use() && (self.name != req.name || self.brand != req.brand) {
            return Err(DeviceInUseError);
        }

        self.name = req.name.clone();
        self.brand = req.brand.clone();
        self.state = req.state;

        Ok(())
    }

    /// Applies the fields present in `patch`. The in-use freeze is decided by
    /// key presence alone, against the state held before the patch, and is
    /// checked before any new value is validated.
    pub fn apply_patch(&mut self, patch: &DevicePatch) -> Result<(), DevicePatchRejection> {
        if patch.touches_creation_time() {
            return Err(DevicePatchRejection::CreationTimeImmutable);
        }

        if self.is_in_use() && (patch.name.is_some() || patch.brand.is_some()) {
            return Err(DeviceInUseError.into());
        }

        let name = match &patch.name {
            Some(FieldUpdate::Set(raw)) => Some(DeviceName::new(raw)?),
            _ => None,
        };
        let brand = match &patch.brand {
            Some(FieldUpdate::Set(raw)) => Some(DeviceBrand::new(raw)?),
            _ => None,
        };

        if let Some(name) = name {
            self.name = name;
        }

        if let Some(brand) = brand {
            self.brand = brand;
        }

        if let Some(StateUpdate::Known(state)) = &patch.state {
            self.state = *state;
        }

        Ok(())
    }

    pub fn ensure_deletable(&self) -> Result<(), DeviceInUseError> {
        if self.is_in_use() {
            Err(DeviceInUseError)
        } else {
            Ok(())
        }
    }
}

/// Data required by the domain to create a [Device].
#[derive(Clone, Debug, PartialEq, Eq, From)]
pub struct CreateDeviceRequest {
    name: DeviceName,
    brand: DeviceBrand,
    state: DeviceState,
}

impl CreateDeviceRequest {
    pub fn new(name: DeviceName, brand: DeviceBrand, state: DeviceState) -> Self {
        Self { name, brand, state }
    }

    pub fn name(&self) -> &DeviceName {
        &self.name
    }

    pub fn brand(&self) -> &DeviceBrand {
        &self.brand
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }
}

/// Data required by the domain to fully replace the mutable fields of a [Device].
#[derive(Clone, Debug, PartialEq, Eq, From)]
pub struct ReplaceDeviceRequest {
    name: DeviceName,
    brand: DeviceBrand,
    state: DeviceState,
}

impl ReplaceDeviceRequest {
    pub fn new(name: DeviceName, brand: DeviceBrand, state: DeviceState) -> Self {
        Self { name, brand, state }
    }

    pub fn name(&self) -> &DeviceName {
        &self.name
    }

    pub fn brand(&self) -> &DeviceBrand {
        &self.brand
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }
}

/// New value for the state field of a patch. Unrecognized text is kept so the
/// caller can tell it apart from an absent field; it never changes the state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateUpdate {
    Known(DeviceState),
    Unrecognized(String),
}

impl StateUpdate {
    pub fn parse(raw: &str) -> Self {
        match raw.parse() {
            Ok(state) => Self::Known(state),
            Err(_) => Self::Unrecognized(raw.to_string()),
        }
    }
}

/// New value for a text field of a patch, still unvalidated. `Keep` records
/// that the field was named without a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldUpdate {
    Set(String),
    Keep,
}

/// Sparse set of field updates. Only present fields are applied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DevicePatch {
    name: Option<FieldUpdate>,
    brand: Option<FieldUpdate>,
    state: Option<StateUpdate>,
    creation_time: bool,
}

impl DevicePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(FieldUpdate::Set(name.into()));
        self
    }

    pub fn with_name_unchanged(mut self) -> Self {
        self.name = Some(FieldUpdate::Keep);
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(FieldUpdate::Set(brand.into()));
        self
    }

    pub fn with_brand_unchanged(mut self) -> Self {
        self.brand = Some(FieldUpdate::Keep);
        self
    }

    pub fn with_state(mut self, state: StateUpdate) -> Self {
        self.state = Some(state);
        self
    }

    /// Marks the patch as attempting to write the creation time.
    pub fn with_creation_time(mut self) -> Self {
        self.creation_time = true;
        self
    }

    pub fn state(&self) -> Option<&StateUpdate> {
        self.state.as_ref()
    }

    pub fn touches_creation_time(&self) -> bool {
        self.creation_time
    }
}

/// Optional constraints for listing devices. An absent field does not constrain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    brand: Option<String>,
    state: Option<DeviceState>,
}

impl DeviceFilter {
    /// Blank brands are treated as absent.
    pub fn new(brand: Option<&str>, state: Option<DeviceState>) -> Self {
        let brand = brand
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string);

        Self { brand, state }
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    pub fn state(&self) -> Option<DeviceState> {
        self.state
    }

    pub fn matches(&self, device: &Device) -> bool {
        self.brand
            .as_deref()
            .is_none_or(|brand| device.brand().to_string() == brand)
            && self.state.is_none_or(|state| device.state() == state)
    }
}

#[derive(Debug, Error)]
pub enum CreateDeviceError {
    #[error("device with id {id} already exists")]
    Duplicate { id: DeviceId },
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum GetDeviceError {
    #[error("device with id {id} not found")]
    NotFound { id: DeviceId },
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ListDevicesError {
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ReplaceDeviceError {
    #[error("device with id {id} not found")]
    NotFound { id: DeviceId },
    #[error("cannot update name or brand of device {id} while it is in use")]
    InUse { id: DeviceId },
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum PatchDeviceError {
    #[error("device with id {id} not found")]
    NotFound { id: DeviceId },
    #[error("creation time of device {id} cannot be updated")]
    CreationTimeImmutable { id: DeviceId },
    #[error("cannot update name or brand of device {id} while it is in use")]
    InUse { id: DeviceId },
    #[error(transparent)]
    InvalidName(DeviceNameError),
    #[error(transparent)]
    InvalidBrand(DeviceBrandError),
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum DeleteDeviceError {
    #[error("device with id {id} not found")]
    NotFound { id: DeviceId },
    #[error("device {id} is in use and cannot be deleted")]
    InUse { id: DeviceId },
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}



#[cfg(test)]
mod device_state_tests {
    use super::*;

    #[test]
    fn test_parse_ignores_case() {
        assert_eq!("inuse".parse::<DeviceState>(), Ok(DeviceState::InUse));
        assert_eq!("INACTIVE".parse::<DeviceState>(), Ok(DeviceState::Inactive));
        assert_eq!("Available".parse::<DeviceState>(), Ok(DeviceState::Available));
    }

    #[test]
    fn test_parse_unknown_state() {
        let result = "Bogus".parse::<DeviceState>();
        let expected = Err(DeviceStateError("Bogus".to_string()));

        assert_eq!(result, expected);
    }

    #[test]
    fn test_display_matches_variant_name() {
        for state in DeviceState::ALL {
            assert_eq!(state.to_string(), state.as_str());
        }
    }

    #[test]
    fn test_default_is_available() {
        assert_eq!(DeviceState::default(), DeviceState::Available);
    }
}

#[cfg(test)]
mod device_policy_tests {
    use super::*;

    fn device(state: DeviceState) -> Device {
        Device::new(
            DeviceId::generate(),
            DeviceName::new("Pixel 8").unwrap(),
            DeviceBrand::new("Google").unwrap(),
            state,
            Utc::now(),
        )
    }

    fn replace_request(name: &str, brand: &str, state: DeviceState) -> ReplaceDeviceRequest {
        ReplaceDeviceRequest::new(
            DeviceName::new(name).unwrap(),
            DeviceBrand::new(brand).unwrap(),
            state,
        )
    }

    #[test]
    fn test_replace_available_device() {
        let mut device = device(DeviceState::Available);
        let before = device.clone();

        let result = device.replace(&replace_request("Pixel 9", "Alphabet", DeviceState::InUse));

        assert_eq!(result, Ok(()));
        assert_eq!(device.name().to_string(), "Pixel 9");
        assert_eq!(device.brand().to_string(), "Alphabet");
        assert_eq!(device.state(), DeviceState::InUse);
        assert_eq!(device.creation_time(), before.creation_time());
        assert_eq!(device.id(), before.id());
    }

    #[test]
    fn test_replace_in_use_name_change_rejected() {
        let mut device = device(DeviceState::InUse);
        let before = device.clone();

        let result = device.replace(&replace_request("Pixel 9", "Google", DeviceState::Available));

        assert_eq!(result, Err(DeviceInUseError));
        assert_eq!(device, before);
    }

    #[test]
    fn test_replace_in_use_brand_change_rejected() {
        let mut device = device(DeviceState::InUse);
        let before = device.clone();

        let result = device.replace(&replace_request("Pixel 8", "Samsung", DeviceState::InUse));

        assert_eq!(result, Err(DeviceInUseError));
        assert_eq!(device, before);
    }

    #[test]
    fn test_replace_in_use_state_only_allowed() {
        let mut device = device(DeviceState::InUse);

        let result = device.replace(&replace_request("Pixel 8", "Google", DeviceState::Inactive));

        assert_eq!(result, Ok(()));
        assert_eq!(device.state(), DeviceState::Inactive);
    }

    #[test]
    fn test_replace_with_current_values_always_succeeds() {
        for state in DeviceState::ALL {
            let mut device = device(state);
            let before = device.clone();

            let result = device.replace(&replace_request("Pixel 8", "Google", state));

            assert_eq!(result, Ok(()));
            assert_eq!(device, before);
        }
    }

    #[test]
    fn test_patch_state_only_changes_state() {
        let mut device = device(DeviceState::Available);
        let before = device.clone();
        let patch = DevicePatch::new().with_state(StateUpdate::parse("Inactive"));

        let result = device.apply_patch(&patch);

        assert_eq!(result, Ok(()));
        assert_eq!(device.state(), DeviceState::Inactive);
        assert_eq!(device.name(), before.name());
        assert_eq!(device.brand(), before.brand());
        assert_eq!(device.creation_time(), before.creation_time());
    }

    #[test]
    fn test_patch_unknown_state_is_skipped_but_other_fields_apply() {
        let mut device = device(DeviceState::Available);
        let patch = DevicePatch::new()
            .with_name("Pixel 9")
            .with_state(StateUpdate::parse("Bogus"));

        let result = device.apply_patch(&patch);

        assert_eq!(result, Ok(()));
        assert_eq!(device.state(), DeviceState::Available);
        assert_eq!(device.name().to_string(), "Pixel 9");
    }

    #[test]
    fn test_patch_creation_time_rejected_regardless_of_other_fields() {
        let mut device = device(DeviceState::Available);
        let before = device.clone();
        let patch = DevicePatch::new()
            .with_state(StateUpdate::Known(DeviceState::Inactive))
            .with_creation_time();

        let result = device.apply_patch(&patch);

        assert_eq!(result, Err(DevicePatchRejection::CreationTimeImmutable));
        assert_eq!(device, before);
    }

    #[test]
    fn test_patch_creation_time_checked_before_in_use() {
        let mut device = device(DeviceState::InUse);
        let patch = DevicePatch::new()
            .with_name("Pixel 9")
            .with_creation_time();

        let result = device.apply_patch(&patch);

        assert_eq!(result, Err(DevicePatchRejection::CreationTimeImmutable));
    }

    #[test]
    fn test_patch_in_use_rejects_name_even_when_unchanged() {
        let mut device = device(DeviceState::InUse);
        let before = device.clone();
        let patch = DevicePatch::new()
            .with_name("Pixel 8")
            .with_state(StateUpdate::Known(DeviceState::Available));

        let result = device.apply_patch(&patch);

        assert_eq!(result, Err(DevicePatchRejection::InUse(DeviceInUseError)));
        assert_eq!(device, before);
    }

    #[test]
    fn test_patch_in_use_rejects_brand() {
        let mut device = device(DeviceState::InUse);
        let patch = DevicePatch::new().with_brand("Samsung");

        let result = device.apply_patch(&patch);

        assert_eq!(result, Err(DevicePatchRejection::InUse(DeviceInUseError)));
    }

    #[test]
    fn test_patch_freeze_uses_state_before_patch() {
        let mut device = device(DeviceState::Available);
        let patch = DevicePatch::new()
            .with_name("Pixel 9")
            .with_state(StateUpdate::Known(DeviceState::InUse));

        let result = device.apply_patch(&patch);

        assert_eq!(result, Ok(()));
        assert_eq!(device.state(), DeviceState::InUse);
        assert_eq!(device.name().to_string(), "Pixel 9");
    }

    #[test]
    fn test_patch_in_use_rejects_invalid_name_as_in_use() {
        let mut device = device(DeviceState::InUse);
        let before = device.clone();

        let empty = device.apply_patch(&DevicePatch::new().with_name(""));
        let oversized =
            device.apply_patch(&DevicePatch::new().with_brand("b".repeat(MAX_TEXT_LENGTH + 1)));

        assert_eq!(empty, Err(DevicePatchRejection::InUse(DeviceInUseError)));
        assert_eq!(oversized, Err(DevicePatchRejection::InUse(DeviceInUseError)));
        assert_eq!(device, before);
    }

    #[test]
    fn test_patch_invalid_values_rejected_without_mutation() {
        let mut device = device(DeviceState::Available);
        let before = device.clone();
        let patch = DevicePatch::new()
            .with_name("Pixel 9")
            .with_brand("   ")
            .with_state(StateUpdate::Known(DeviceState::Inactive));

        let result = device.apply_patch(&patch);

        assert_eq!(result, Err(DevicePatchRejection::Brand(DeviceBrandError::Empty)));
        assert_eq!(device, before);

        let result = device.apply_patch(&DevicePatch::new().with_name(""));

        assert_eq!(result, Err(DevicePatchRejection::Name(DeviceNameError::Empty)));
        assert_eq!(device, before);
    }

    #[test]
    fn test_patch_unchanged_name_keeps_value_when_not_in_use() {
        for state in [DeviceState::Available, DeviceState::Inactive] {
            let mut device = device(state);
            let before = device.clone();
            let patch = DevicePatch::new()
                .with_name_unchanged()
                .with_brand_unchanged();

            assert_eq!(device.apply_patch(&patch), Ok(()));
            assert_eq!(device, before);
        }
    }

    #[test]
    fn test_patch_unchanged_name_still_counts_for_in_use_freeze() {
        let mut device = device(DeviceState::InUse);
        let before = device.clone();

        let result = device.apply_patch(&DevicePatch::new().with_name_unchanged());

        assert_eq!(result, Err(DevicePatchRejection::InUse(DeviceInUseError)));
        assert_eq!(device, before);
    }

    #[test]
    fn test_empty_patch_is_noop() {
        let mut device = device(DeviceState::InUse);
        let before = device.clone();

        assert_eq!(device.apply_patch(&DevicePatch::new()), Ok(()));
        assert_eq!(device, before);
    }

    #[test]
    fn test_in_use_device_is_not_deletable() {
        assert_eq!(
            device(DeviceState::InUse).ensure_deletable(),
            Err(DeviceInUseError)
        );
        assert_eq!(device(DeviceState::Available).ensure_deletable(), Ok(()));
        assert_eq!(device(DeviceState::Inactive).ensure_deletable(), Ok(()));
    }

    #[test]
    fn test_filter_matches() {
        let device = device(DeviceState::InUse);

        assert!(DeviceFilter::default().matches(&device));
        assert!(DeviceFilter::new(Some("Google"), Some(DeviceState::InUse)).matches(&device));
        assert!(DeviceFilter::new(Some("  "), None).matches(&device));
        assert!(DeviceFilter::new(Some(" Google "), None).matches(&device));
        assert!(!DeviceFilter::new(Some("Apple"), None).matches(&device));
        assert!(!DeviceFilter::new(None, Some(DeviceState::Inactive)).matches(&device));
    }
}
