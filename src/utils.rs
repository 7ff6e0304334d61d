use std::path::PathBuf;

use crate::error::{EzCommitError, Result};

const APP_DIR: &str = "ez-commit";
const CONFIG_FILE: &str = "config.yaml";

/// Location of the user-level settings document.
///
/// Prefers `$XDG_CONFIG_HOME`, then `~/.config` (the platform config dir on
/// Windows).
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg).join(APP_DIR).join(CONFIG_FILE));
    }

    let base = if cfg!(windows) {
        dirs::config_dir()
    } else {
        dirs::home_dir().map(|home| home.join(".config"))
    };

    base.map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
        .ok_or_else(|| EzCommitError::Config("Could not determine home directory".to_string()))
}

/// Describes where the API key comes from without revealing it.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_secret_hides_short_keys_entirely() {
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret(""), "");
    }

    #[test]
    fn mask_secret_keeps_last_four() {
        assert_eq!(mask_secret("sk-1234567890"), "*********7890");
    }

    #[test]
    #[serial_test::serial]
    fn xdg_config_home_wins() {
        temp_env::with_var("XDG_CONFIG_HOME", Some("/tmp/xdg-test"), || {
            let path = default_config_path().unwrap();
            assert_eq!(path, PathBuf::from("/tmp/xdg-test/ez-commit/config.yaml"));
        });
    }
}
