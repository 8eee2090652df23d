use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use social_client::DEFAULT_BASE_URL;

const DEFAULT_EMAIL_DOMAIN: &str = "stud.noroff.no";
const DEFAULT_SESSION_FILE: &str = ".social_session";

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) api_url: String,
    pub(crate) api_key: String,
    pub(crate) email_domain: String,
    pub(crate) session_file: PathBuf,
    pub(crate) log_level: String,
}

impl Settings {
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = get_required(&lookup, "SOCIAL_API_KEY").context("SOCIAL_API_KEY is required")?;
        let api_url = lookup("SOCIAL_API_URL")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        // пустое значение явно отключает проверку домена
        let email_domain =
            lookup("SOCIAL_EMAIL_DOMAIN").unwrap_or_else(|| DEFAULT_EMAIL_DOMAIN.to_string());
        let session_file: PathBuf = lookup("SOCIAL_SESSION_FILE")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_FILE.to_string())
            .into();
        let log_level = lookup("LOG_LEVEL")
            .or_else(|| lookup("RUST_LOG"))
            .unwrap_or_else(|| "warn".to_string());

        Ok(Self {
            api_url,
            api_key,
            email_domain,
            session_file,
            log_level,
        })
    }
}

fn get_required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    let value = lookup(key).ok_or_else(|| anyhow!("{key} is not set"))?;
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(anyhow!("{key} must not be empty"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let settings = settings(&[("SOCIAL_API_KEY", " key ")]).expect("must load");
        assert_eq!(settings.api_key, "key");
        assert_eq!(settings.api_url, DEFAULT_BASE_URL);
        assert_eq!(settings.email_domain, DEFAULT_EMAIL_DOMAIN);
        assert_eq!(settings.session_file, PathBuf::from(DEFAULT_SESSION_FILE));
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn missing_or_blank_api_key_is_an_error() {
        assert!(settings(&[]).is_err());
        assert!(settings(&[("SOCIAL_API_KEY", "   ")]).is_err());
    }

    #[test]
    fn empty_email_domain_is_kept_to_disable_check() {
        let settings = settings(&[("SOCIAL_API_KEY", "key"), ("SOCIAL_EMAIL_DOMAIN", "")])
            .expect("must load");
        assert_eq!(settings.email_domain, "");
    }

    #[test]
    fn log_level_falls_back_to_rust_log() {
        let settings = settings(&[("SOCIAL_API_KEY", "key"), ("RUST_LOG", "debug")])
            .expect("must load");
        assert_eq!(settings.log_level, "debug");
    }
}
