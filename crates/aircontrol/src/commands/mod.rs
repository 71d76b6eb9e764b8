//! Command dispatch: bridges CLI args -> session client calls -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod test;
pub mod util;

use aircontrol_api::SessionClient;

use crate::cli::{Command, GlobalOpts};
use crate::config::ResolvedProfile;
use crate::error::CliError;

/// A connected command's view of the account.
pub struct Context {
    pub client: SessionClient,
    pub profile: String,
}

impl Context {
    pub fn new(resolved: ResolvedProfile) -> Result<Self, CliError> {
        let url = resolved.client.base_url.to_string();
        let client = SessionClient::new(resolved.credentials, resolved.client)
            .map_err(|e| CliError::from_api(e, &resolved.name, &url))?;
        Ok(Self {
            client,
            profile: resolved.name,
        })
    }

    /// Classify an API failure against this profile and endpoint.
    pub fn api_error(&self, err: aircontrol_api::Error) -> CliError {
        CliError::from_api(err, &self.profile, self.client.base_url().as_str())
    }
}

/// Dispatch an account-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &mut Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Test => test::handle(ctx, global).await,
        Command::Devices(args) => devices::handle(ctx, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
