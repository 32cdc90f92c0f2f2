use anyhow::Context;

/// Where we store secrets in the OS keyring.
///
/// Constant so upgrades don't orphan secrets.
const SERVICE: &str = "storyweaver";

/// Checked before the keyring, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKey {
    GeminiApiKey,
}

impl SecretKey {
    fn user(self) -> &'static str {
        match self {
            SecretKey::GeminiApiKey => "gemini_api_key",
        }
    }
}

pub fn set_secret(key: SecretKey, value: &str) -> anyhow::Result<()> {
    let entry = keyring::Entry::new(SERVICE, key.user()).context("create keyring entry")?;
    entry.set_password(value).context("set secret")
}

pub fn get_secret(key: SecretKey) -> anyhow::Result<Option<String>> {
    let entry = keyring::Entry::new(SERVICE, key.user()).context("create keyring entry")?;

    match entry.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(anyhow::Error::new(e)).context("get secret"),
    }
}

pub fn delete_secret(key: SecretKey) -> anyhow::Result<()> {
    let entry = keyring::Entry::new(SERVICE, key.user()).context("create keyring entry")?;
    match entry.delete_credential() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(anyhow::Error::new(e)).context("delete secret"),
    }
}

fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// The Gemini key from the environment, falling back to the keyring.
pub fn resolve_api_key() -> anyhow::Result<String> {
    if let Some(key) = from_env(|name| std::env::var(name).ok()) {
        return Ok(key);
    }
    match get_secret(SecretKey::GeminiApiKey)? {
        Some(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(anyhow::anyhow!(
            "no Gemini API key configured; set GEMINI_API_KEY or run `storyweaver set-key`"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_are_stable() {
        // Don't touch the developer's real keyring; just pin the mapping.
        assert_eq!(SecretKey::GeminiApiKey.user(), "gemini_api_key");
    }

    #[test]
    fn env_lookup_prefers_gemini_var_and_skips_blanks() {
        let key = from_env(|name| match name {
            "GEMINI_API_KEY" => Some("  ".into()),
            "API_KEY" => Some("fallback".into()),
            _ => None,
        });
        assert_eq!(key.as_deref(), Some("fallback"));

        let key = from_env(|name| Some(format!("{name}-value")));
        assert_eq!(key.as_deref(), Some("GEMINI_API_KEY-value"));

        assert!(from_env(|_| None).is_none());
    }
}
