// Device endpoints: group details listing, control, and the connectivity probe.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::client::{Form, SessionClient};
use crate::error::Error;

pub(crate) const GROUP_DETAILS_PATH: &str = "/web/userGroup/getDetails";
pub(crate) const DEVICE_CONTROL_PATH: &str = "/web/device/control";

/// Fields the control endpoint understands. Anything else in a control
/// object is dropped before logging.
pub const CONTROL_FIELDS: &[&str] = &[
    "power",
    "mode",
    "setTemp",
    "wind",
    "swing",
    "lock",
    "factTemp",
    "modeLockValue",
    "coolLockValue",
    "heatLockValue",
    "windLockValue",
    "unlock",
    "id",
];

/// `result` of the group details endpoint.
#[derive(Debug, Default, Deserialize)]
struct GroupDetails {
    #[serde(default)]
    areas: Option<Vec<Area>>,
}

#[derive(Debug, Default, Deserialize)]
struct Area {
    #[serde(default)]
    data: Option<Vec<Value>>,
}

impl GroupDetails {
    /// All device records, area order first, then order within each area.
    fn into_devices(self) -> Vec<Value> {
        self.areas
            .unwrap_or_default()
            .into_iter()
            .flat_map(|area| area.data.unwrap_or_default())
            .collect()
    }
}

/// Keep only the allow-listed control fields, in allow-list order.
pub fn filter_control(control: &Value) -> Value {
    let Some(object) = control.as_object() else {
        return Value::Object(Map::new());
    };
    let filtered: Map<String, Value> = CONTROL_FIELDS
        .iter()
        .filter_map(|&key| object.get(key).map(|v| (key.to_owned(), v.clone())))
        .collect();
    Value::Object(filtered)
}

impl SessionClient {
    /// Every device record across all areas of the account.
    ///
    /// Inside the debounce window after a control command this returns an
    /// empty list without touching the network.
    pub async fn list_devices(&mut self) -> Result<Vec<Value>, Error> {
        if self.debounce.is_active() {
            debug!("control command sent recently, skipping device refresh");
            return Ok(Vec::new());
        }

        let response = self
            .request(GROUP_DETAILS_PATH, &Form::user_scoped())
            .await?;
        let devices = response.result_as::<GroupDetails>()?.into_devices();

        debug!(count = devices.len(), "listed devices");
        Ok(devices)
    }

    /// Send a control command.
    ///
    /// The debounce window starts before the request goes out. `operation`
    /// is serialized once and sent as both the `control` and `operation`
    /// fields; `control` is only logged, reduced to [`CONTROL_FIELDS`].
    pub async fn control_device(&mut self, control: &Value, operation: &Value) -> Result<(), Error> {
        self.debounce.record_update();

        let payload = operation.to_string();
        debug!(
            control = %filter_control(control),
            operation = %payload,
            "sending control request"
        );

        let form = Form::user_scoped()
            .field("control", payload.clone())
            .field("operation", payload);
        self.request(DEVICE_CONTROL_PATH, &form).await?;
        Ok(())
    }

    /// Fresh login followed by a device listing; returns the device count.
    pub async fn check_connection(&mut self) -> Result<usize, Error> {
        self.login().await?;
        Ok(self.list_devices().await?.len())
    }

    /// [`check_connection`](Self::check_connection) as a yes/no answer. Never fails.
    pub async fn test_connection(&mut self) -> bool {
        match self.check_connection().await {
            Ok(devices) => {
                info!(devices, "connection test passed");
                true
            }
            Err(e) => {
                warn!(error = %e, "connection test failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn details(value: Value) -> GroupDetails {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn flattens_areas_in_order() {
        let devices = details(json!({
            "areas": [
                {"data": [{"id": "A"}, {"id": "B"}]},
                {"data": [{"id": "C"}]}
            ]
        }))
        .into_devices();
        assert_eq!(devices, vec![json!({"id": "A"}), json!({"id": "B"}), json!({"id": "C"})]);
    }

    #[test]
    fn missing_levels_are_empty() {
        assert!(details(json!({})).into_devices().is_empty());
        assert!(details(json!({"areas": null})).into_devices().is_empty());
        let devices = details(json!({"areas": [{"name": "empty"}, {"data": null}, {"data": [1]}]}))
            .into_devices();
        assert_eq!(devices, vec![json!(1)]);
    }

    #[test]
    fn filter_control_keeps_allow_listed_fields() {
        let control = json!({
            "id": 17,
            "power": "y",
            "name": "Living Room",
            "setTemp": 24,
            "errorCode": 0
        });
        let filtered = filter_control(&control);
        assert_eq!(filtered, json!({"power": "y", "setTemp": 24, "id": 17}));
        assert_eq!(filter_control(&json!("not an object")), json!({}));
    }
}
