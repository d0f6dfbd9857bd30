//! Request payloads that need validation before they are sent.

use serde_json::{Map, Value};

use crate::error::ApiError;

/// Stamp merged into alert configuration bodies.
pub const ALERT_CONFIGURATION_PROFILE: &str = "configuration";
pub const ALERT_CONFIGURATION_VERSION: u32 = 1;

/// A software package pushed to a datalogger asset.
///
/// The service selects the payload schema from the
/// `x-campbell-software-type` header, so the type and payload travel
/// together.
#[derive(Debug, Clone, PartialEq)]
pub enum SoftwareUpdate {
    DataloggerOs(Value),
    DataloggerProgram(Value),
}

impl SoftwareUpdate {
    pub const DATALOGGER_OS: &'static str = "datalogger-os";
    pub const DATALOGGER_PROGRAM: &'static str = "datalogger-program";

    /// Pick the payload matching `software_type`.
    ///
    /// Fails unless the type is one of the two accepted literals and the
    /// payload for that type was supplied.
    pub fn parse(
        software_type: &str,
        os_metadata: Option<&Value>,
        program_metadata: Option<&Value>,
    ) -> Result<Self, ApiError> {
        match (software_type, os_metadata, program_metadata) {
            (Self::DATALOGGER_OS, Some(os), _) => Ok(SoftwareUpdate::DataloggerOs(os.clone())),
            (Self::DATALOGGER_PROGRAM, _, Some(program)) => {
                Ok(SoftwareUpdate::DataloggerProgram(program.clone()))
            }
            _ => Err(ApiError::InvalidArgument(format!(
                "software_type can only be '{}' or '{}', along with the matching metadata (got '{software_type}')",
                Self::DATALOGGER_OS,
                Self::DATALOGGER_PROGRAM,
            ))),
        }
    }

    pub fn software_type(&self) -> &'static str {
        match self {
            SoftwareUpdate::DataloggerOs(_) => Self::DATALOGGER_OS,
            SoftwareUpdate::DataloggerProgram(_) => Self::DATALOGGER_PROGRAM,
        }
    }

    pub fn payload(&self) -> &Value {
        match self {
            SoftwareUpdate::DataloggerOs(v) | SoftwareUpdate::DataloggerProgram(v) => v,
        }
    }
}

/// Overlay `metadata` on `base`; keys from `metadata` win.
pub(crate) fn merge_object(mut base: Map<String, Value>, metadata: &Value) -> Result<Value, ApiError> {
    let Value::Object(extra) = metadata else {
        return Err(ApiError::InvalidArgument(
            "metadata must be a JSON object".to_string(),
        ));
    };
    for (k, v) in extra {
        base.insert(k.clone(), v.clone());
    }
    Ok(Value::Object(base))
}

/// `{"$profile": "configuration", "$version": 1}`
pub(crate) fn alert_configuration_stamp() -> Map<String, Value> {
    let mut stamp = Map::new();
    stamp.insert("$profile".to_string(), ALERT_CONFIGURATION_PROFILE.into());
    stamp.insert("$version".to_string(), ALERT_CONFIGURATION_VERSION.into());
    stamp
}
