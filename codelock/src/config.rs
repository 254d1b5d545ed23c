use crate::app::PASSCODE_LENGTH;
use dotenv::var;
use serde::{Deserialize, Serialize};
use std::env::var_os;
use std::ffi::OsStr;
use std::path::Path;
use thiserror::Error;

/// Configuration loaded at boot. The passcode here is only the *initial*
/// one; changes made through admin mode live in memory and are gone after a
/// restart.
#[derive(Serialize, Deserialize, Debug)]
pub struct Config {
    pub passcode: String,
    /// How long the success indicator stays on after a correct passcode,
    /// in milliseconds.
    pub open_hold_ms: u64,
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    #[error("passcode must be exactly {PASSCODE_LENGTH} digits, got {0}")]
    PasscodeLength(usize),
    #[error("passcode may only contain digits, got {0:?}")]
    PasscodeSymbol(char),
}

impl Config {
    pub fn try_load() -> Option<Self> {
        let config_str = var_os("CONFIG_FILE");
        let config_str: &OsStr = config_str.as_deref().unwrap_or(OsStr::new("config.json"));
        let config_path = Path::new(config_str);
        if config_path.exists() {
            let file = std::fs::File::open(config_path).ok()?;
            let reader = std::io::BufReader::new(file);
            serde_json::from_reader(reader).ok()
        } else {
            None
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        let config_str = var("CONFIG_FILE").unwrap_or_else(|_| "config.json".to_string());
        let config_path = Path::new(&config_str);
        let file = std::fs::File::create(config_path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.passcode.chars().count() != PASSCODE_LENGTH {
            return Err(ConfigError::PasscodeLength(self.passcode.chars().count()));
        }
        if let Some(c) = self.passcode.chars().find(|c| !c.is_ascii_digit()) {
            return Err(ConfigError::PasscodeSymbol(c));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            passcode: "1234567".to_string(),
            open_hold_ms: 5000,
        }
    }
}
