//! Connection test: log in, then fetch the device list once.

use serde::Serialize;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::Context;

#[derive(Serialize)]
struct TestReport<'a> {
    profile: &'a str,
    base_url: &'a str,
    email: &'a str,
    devices: usize,
}

pub async fn handle(ctx: &mut Context, global: &GlobalOpts) -> Result<(), CliError> {
    let devices = ctx.client.check_connection().await.map_err(|e| ctx.api_error(e))?;

    let report = TestReport {
        profile: &ctx.profile,
        base_url: ctx.client.base_url().as_str(),
        email: ctx.client.credentials().email(),
        devices,
    };

    let out = output::render_single(&global.output, &report, |r| {
        format!(
            "Connected to {} as {} (profile '{}'): {} device(s)",
            r.base_url, r.email, r.profile, r.devices
        )
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
