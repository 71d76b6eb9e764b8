//! Device command handlers.

use serde_json::Value;
use tabled::Tabled;

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::{Context, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Power")]
    power: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "Set")]
    set_temp: String,
    #[tabled(rename = "Room")]
    fact_temp: String,
    #[tabled(rename = "Fan")]
    wind: String,
}

impl From<&Value> for DeviceRow {
    fn from(d: &Value) -> Self {
        Self {
            id: field(d, "id"),
            name: field(d, "name"),
            power: field(d, "power"),
            mode: field(d, "mode"),
            set_temp: field(d, "setTemp"),
            fact_temp: field(d, "factTemp"),
            wind: field(d, "wind"),
        }
    }
}

/// Devices are opaque records; render whatever scalar sits under `key`.
fn field(device: &Value, key: &str) -> String {
    match device.get(key) {
        None | Some(Value::Null) => "-".into(),
        Some(Value::String(s)) if s.is_empty() => "-".into(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(ctx: &mut Context, args: DevicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List => {
            let devices = ctx.client.list_devices().await.map_err(|e| ctx.api_error(e))?;
            let out = output::render_list(
                &global.output,
                &devices,
                |d| DeviceRow::from(d),
                |d| field(d, "id"),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Control { operation, control } => {
            let operation = util::read_json_arg("operation", &operation)?;
            let control = util::read_json_arg("control", &control)?;

            ctx.client
                .control_device(&control, &operation)
                .await
                .map_err(|e| ctx.api_error(e))?;

            if !global.quiet {
                eprintln!("Control command accepted");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rows_render_scalars_and_placeholders() {
        let device = json!({
            "id": 101,
            "name": "Lobby",
            "power": "y",
            "setTemp": 24,
            "factTemp": "",
            "wind": null
        });

        let row = DeviceRow::from(&device);

        assert_eq!(row.id, "101");
        assert_eq!(row.name, "Lobby");
        assert_eq!(row.power, "y");
        assert_eq!(row.mode, "-");
        assert_eq!(row.set_temp, "24");
        assert_eq!(row.fact_temp, "-");
        assert_eq!(row.wind, "-");
    }
}
