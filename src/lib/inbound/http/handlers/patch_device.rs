use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::device::models::device::{
    DeviceId, DevicePatch, PatchDeviceError, StateUpdate,
};
use crate::domain::device::ports::DeviceService;
use crate::inbound::http::AppState;
use crate::inbound::http::responses::ApiError;

const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

impl From<PatchDeviceError> for ApiError {
    fn from(e: PatchDeviceError) -> Self {
        match e {
            PatchDeviceError::NotFound { id } => {
                Self::NotFound(format!("device with id {} not found", id))
            }
            e @ (PatchDeviceError::CreationTimeImmutable { .. }
            | PatchDeviceError::InUse { .. }
            | PatchDeviceError::InvalidName(_)
            | PatchDeviceError::InvalidBrand(_)) => Self::BadRequest(e.to_string()),
            PatchDeviceError::Unknown(cause) => cause.into(),
        }
    }
}

#[derive(Debug, Error)]
enum ParsePatchHttpRequestError {
    #[error("invalid patch document: {0}")]
    Body(#[from] serde_json::Error),
    #[error("unsupported patch operation {0}")]
    UnsupportedOperation(String),
    #[error("unknown patch path {0}")]
    UnknownPath(String),
    #[error("{0} must be a string")]
    NotAString(&'static str),
}

impl From<ParsePatchHttpRequestError> for ApiError {
    fn from(e: ParsePatchHttpRequestError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatchField {
    Name,
    Brand,
    State,
    CreationTime,
}

impl PatchField {
    const ALL: [PatchField; 4] = [Self::Name, Self::Brand, Self::State, Self::CreationTime];

    fn key(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Brand => "brand",
            Self::State => "state",
            Self::CreationTime => "creationTime",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// JSON pointer paths are matched ignoring ASCII case.
    fn from_pointer(path: &str) -> Option<Self> {
        let key = path.strip_prefix('/')?;
        Self::ALL
            .into_iter()
            .find(|field| field.key().eq_ignore_ascii_case(key))
    }
}

/// One RFC 6902 operation. Only `add` and `replace` carry a new field value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct PatchOperation {
    op: String,
    path: String,
    #[serde(default)]
    value: Value,
}

/// Both accepted payloads, reduced to the fields they set.
#[derive(Debug, Clone, PartialEq)]
enum PatchHttpRequestBody {
    JsonPatch(Vec<PatchOperation>),
    Merge(Map<String, Value>),
}

impl PatchHttpRequestBody {
    fn parse(headers: &HeaderMap, body: &[u8]) -> Result<Self, ParsePatchHttpRequestError> {
        if is_json_patch(headers) {
            Ok(Self::JsonPatch(serde_json::from_slice(body)?))
        } else {
            Ok(Self::Merge(serde_json::from_slice(body)?))
        }
    }

    fn into_fields(self) -> Result<Vec<(PatchField, Value)>, ParsePatchHttpRequestError> {
        match self {
            Self::JsonPatch(operations) => operations
                .into_iter()
                .map(|operation| {
                    if operation.op != "replace" && operation.op != "add" {
                        return Err(ParsePatchHttpRequestError::UnsupportedOperation(
                            operation.op,
                        ));
                    }

                    let field = PatchField::from_pointer(&operation.path)
                        .ok_or(ParsePatchHttpRequestError::UnknownPath(operation.path))?;

                    Ok((field, operation.value))
                })
                .collect(),
            // Keys that do not name a device field are ignored.
            Self::Merge(object) => Ok(object
                .into_iter()
                .filter_map(|(key, value)| PatchField::from_key(&key).map(|field| (field, value)))
                .collect()),
        }
    }

    fn try_into_domain(self) -> Result<DevicePatch, ParsePatchHttpRequestError> {
        self.into_fields()?
            .into_iter()
            .try_fold(DevicePatch::new(), |patch, (field, value)| {
                set_field(patch, field, &value)
            })
    }
}

fn set_field(
    patch: DevicePatch,
    field: PatchField,
    value: &Value,
) -> Result<DevicePatch, ParsePatchHttpRequestError> {
    Ok(match field {
        PatchField::Name => match as_text(value, field)? {
            Some(name) => patch.with_name(name),
            None => patch.with_name_unchanged(),
        },
        PatchField::Brand => match as_text(value, field)? {
            Some(brand) => patch.with_brand(brand),
            None => patch.with_brand_unchanged(),
        },
        PatchField::State => patch.with_state(match value {
            Value::String(raw) => StateUpdate::parse(raw),
            other => StateUpdate::Unrecognized(other.to_string()),
        }),
        PatchField::CreationTime => patch.with_creation_time(),
    })
}

/// `null` leaves the field as it is.
fn as_text(
    value: &Value,
    field: PatchField,
) -> Result<Option<&str>, ParsePatchHttpRequestError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        _ => Err(ParsePatchHttpRequestError::NotAString(field.key())),
    }
}

fn is_json_patch(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case(JSON_PATCH_CONTENT_TYPE))
}

pub async fn patch_device<DS: DeviceService>(
    headers: HeaderMap,
    Path(id): Path<String>,
    State(state): State<AppState<DS>>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let id = DeviceId::new(&id)?;
    let patch = PatchHttpRequestBody::parse(&headers, &body)?.try_into_domain()?;

    state
        .device_service
        .patch_device(&id, &patch)
        .await
        .map_err(ApiError::from)
        .map(|_| StatusCode::NO_CONTENT)
}
