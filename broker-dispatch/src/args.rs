//! JSON argument extraction for tool-call requests.

use serde_json::Value;

use crate::error::DispatchError;

pub(crate) fn require_str<'a>(args: &'a Value, name: &'static str) -> Result<&'a str, DispatchError> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or(DispatchError::MissingArg(name))
}

pub(crate) fn require_project_id(args: &Value) -> Result<broker_primitives::ProjectId, DispatchError> {
    let raw = require_str(args, "project_id")?;
    broker_primitives::ProjectId::new(raw).map_err(|err| DispatchError::InvalidArg {
        name: "project_id",
        reason: err.to_string(),
    })
}

pub(crate) fn require_session_name(
    args: &Value,
    field: &'static str,
) -> Result<broker_primitives::SessionName, DispatchError> {
    let raw = require_str(args, field)?;
    broker_primitives::SessionName::new(raw).map_err(|err| DispatchError::InvalidArg {
        name: field,
        reason: err.to_string(),
    })
}

pub(crate) fn require_u64(args: &Value, name: &'static str) -> Result<u64, DispatchError> {
    args.get(name)
        .and_then(Value::as_u64)
        .ok_or(DispatchError::MissingArg(name))
}

pub(crate) fn optional_str<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}

pub(crate) fn optional_u64(args: &Value, name: &str, default: u64) -> u64 {
    args.get(name).and_then(Value::as_u64).unwrap_or(default)
}

pub(crate) fn optional_bool(args: &Value, name: &str, default: bool) -> bool {
    args.get(name).and_then(Value::as_bool).unwrap_or(default)
}

pub(crate) fn optional_u8(args: &Value, name: &str, default: u8) -> u8 {
    args.get(name)
        .and_then(Value::as_u64)
        .and_then(|v| u8::try_from(v).ok())
        .unwrap_or(default)
}
