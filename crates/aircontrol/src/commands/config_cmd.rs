//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};
use secrecy::SecretString;

use aircontrol_api::{Credentials, SessionClient};
use aircontrol_config::{self as shared, Config, KEYRING_SERVICE, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

// ── Helpers ─────────────────────────────────────────────────────────

fn store_in_keyring(profile_name: &str, password: &str) -> Result<(), CliError> {
    let entry =
        keyring::Entry::new(KEYRING_SERVICE, &shared::keyring_key(profile_name)).map_err(|e| {
            CliError::Validation {
                field: "keyring".into(),
                reason: format!("failed to access keyring: {e}"),
            }
        })?;
    entry.set_password(password).map_err(|e| CliError::Validation {
        field: "keyring".into(),
        reason: format!("failed to store password in keyring: {e}"),
    })
}

/// Ask where the password lives. Returns the plaintext to write to the
/// config file, or `None` when it went to the keyring.
fn prompt_password_storage(profile_name: &str, password: String) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store password in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        store_in_keyring(profile_name, &password)?;
        eprintln!("   ✓ Password stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(password))
    }
}

fn prompt_refresh_delay() -> Result<Option<u64>, CliError> {
    let raw: String = Input::new()
        .with_prompt("Refresh delay after control, in seconds (1-60, blank for default)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let seconds: u64 = raw.parse().map_err(|_| CliError::Validation {
        field: "refresh_delay".into(),
        reason: format!("not a number: {raw}"),
    })?;
    shared::refresh_delay_to_interval(seconds)?;
    Ok(Some(seconds))
}

/// Log in and list devices with the values just entered.
async fn verify(
    profile_name: &str,
    profile: &Profile,
    cfg: &Config,
    password: &str,
) -> Result<bool, CliError> {
    let client_config = shared::profile_to_client_config(profile, &cfg.defaults)?;
    let url = client_config.base_url.to_string();
    let email = profile.email.clone().unwrap_or_default();
    let credentials = Credentials::new(email, SecretString::from(password.to_owned()));
    let mut client = SessionClient::new(credentials, client_config)
        .map_err(|e| CliError::from_api(e, profile_name, &url))?;
    Ok(client.test_connection().await)
}

/// Copy of the config with plaintext passwords replaced.
fn redacted(cfg: &Config) -> Config {
    let mut out = cfg.clone();
    for profile in out.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some("********".into());
        }
    }
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global).await,

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(&global.output, &cfg, |c| {
                toml::to_string_pretty(c).unwrap_or_else(|e| format!("<unrenderable config: {e}>"))
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword => {
            let cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            let password = rpassword::prompt_password(format!("Password for profile '{profile_name}': "))
                .map_err(prompt_err)?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }

            store_in_keyring(&profile_name, &password)?;
            if !global.quiet {
                eprintln!("✓ Password stored in system keyring for profile '{profile_name}'");
            }
            Ok(())
        }
    }
}

// ── Init wizard ─────────────────────────────────────────────────────

async fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("AirControlBase CLI configuration");
    eprintln!("   Config path: {}\n", config_path.display());

    let mut cfg = config::load_config_or_default();

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default(global.profile.clone().unwrap_or_else(|| "default".into()))
        .interact_text()
        .map_err(prompt_err)?;

    let email: String = Input::new()
        .with_prompt("Account email")
        .interact_text()
        .map_err(prompt_err)?;

    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;

    if email.trim().is_empty() || password.is_empty() {
        return Err(CliError::Validation {
            field: "credentials".into(),
            reason: "email and password cannot be empty".into(),
        });
    }

    let refresh_delay = prompt_refresh_delay()?;

    let mut profile = Profile {
        email: Some(email.trim().to_owned()),
        base_url: global.base_url.clone(),
        refresh_delay,
        ..Profile::default()
    };

    eprintln!("\n   Verifying credentials...");
    if verify(&profile_name, &profile, &cfg, &password).await? {
        eprintln!("   ✓ Logged in and fetched devices");
    } else {
        let save_anyway = Confirm::new()
            .with_prompt("Could not log in with these settings. Save anyway?")
            .default(false)
            .interact()
            .map_err(prompt_err)?;
        if !save_anyway {
            return Err(CliError::AuthFailed {
                profile: profile_name,
                message: "verification failed".into(),
            });
        }
    }

    profile.password = prompt_password_storage(&profile_name, password)?;

    cfg.profiles.insert(profile_name.clone(), profile);
    if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
        cfg.default_profile = Some(profile_name.clone());
    }
    shared::save_config_to(&cfg, &config_path)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Profile: {profile_name}");
    eprintln!("\n  Try it: aircontrol devices list");
    Ok(())
}
