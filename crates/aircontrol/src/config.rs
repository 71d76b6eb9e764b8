//! Profile selection and flag overrides on top of `aircontrol_config`.
//!
//! The shared crate owns the TOML schema and credential lookup; this module
//! only decides which profile is active and layers CLI flags over it.

use aircontrol_api::{ClientConfig, Credentials};
use aircontrol_config::{Config, Profile};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use aircontrol_config::{config_path, load_config_or_default};

/// Everything needed to construct a session client.
#[derive(Debug)]
pub struct ResolvedProfile {
    pub name: String,
    pub client: ClientConfig,
    pub credentials: Credentials,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Overlay CLI flags on a stored profile. Flags win.
pub fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref email) = global.email {
        profile.email = Some(email.clone());
    }
    if let Some(ref url) = global.base_url {
        profile.base_url = Some(url.clone());
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    if let Some(delay) = global.refresh_delay {
        profile.refresh_delay = Some(delay);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    profile
}

/// Pick the profile, apply overrides, and resolve credentials.
///
/// Without a stored profile, `--email` (or `AIRCONTROL_EMAIL`) is enough to
/// run against the default cloud as long as a password can be found.
pub fn resolve(global: &GlobalOpts, cfg: &Config) -> Result<ResolvedProfile, CliError> {
    let name = active_profile_name(global, cfg);

    let stored = match cfg.profiles.get(&name) {
        Some(profile) => profile.clone(),
        None if global.email.is_some() => Profile::default(),
        None if global.profile.is_some() => {
            let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    let profile = apply_overrides(stored, global);
    let client = aircontrol_config::profile_to_client_config(&profile, &cfg.defaults)?;
    let credentials = aircontrol_config::resolve_credentials(&profile, &name)?;

    Ok(ResolvedProfile {
        name,
        client,
        credentials,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::time::Duration;

    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["aircontrol"];
        argv.extend_from_slice(args);
        argv.push("test");
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn flags_override_stored_profile() {
        let stored = Profile {
            email: Some("stored@example.com".into()),
            base_url: Some("https://stored.example.com".into()),
            timeout: Some(30),
            ..Profile::default()
        };
        let opts = global(&[
            "--email",
            "flag@example.com",
            "--timeout",
            "5",
            "--refresh-delay",
            "12",
            "-k",
        ]);

        let merged = apply_overrides(stored, &opts);

        assert_eq!(merged.email.as_deref(), Some("flag@example.com"));
        assert_eq!(merged.base_url.as_deref(), Some("https://stored.example.com"));
        assert_eq!(merged.timeout, Some(5));
        assert_eq!(merged.refresh_delay, Some(12));
        assert_eq!(merged.insecure, Some(true));

        let client = aircontrol_config::profile_to_client_config(&merged, &Default::default()).unwrap();
        assert_eq!(client.debounce_interval, Duration::from_secs(12));
    }

    #[test]
    fn profile_flag_beats_default_profile() {
        let cfg = Config {
            default_profile: Some("home".into()),
            ..Config::default()
        };
        assert_eq!(active_profile_name(&global(&[]), &cfg), "home");
        assert_eq!(active_profile_name(&global(&["-p", "office"]), &cfg), "office");
    }

    #[test]
    fn unknown_named_profile_lists_alternatives() {
        let mut cfg = Config::default();
        cfg.profiles.insert("home".into(), Profile::default());
        let opts = GlobalOpts {
            email: None,
            ..global(&["-p", "office"])
        };

        let err = resolve(&opts, &cfg).unwrap_err();
        assert!(matches!(err, CliError::ProfileNotFound { ref available, .. } if available == "home"));
    }
}
