use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub telegram: TelegramSection,
    pub server: ServerSection,
    pub storage: StorageSection,
    pub report: ReportSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramSection {
    /// Token of the bot users type expenses into (bot1).
    pub input_bot_token: String,
    /// Token of the bot that sends reports (bot2).
    pub report_bot_token: String,
    /// Public HTTPS base for webhook registration, e.g.
    /// "https://belanja.example.com".
    pub webhook_domain: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSection {
    /// "memory", "jsonl" or "sheets".
    pub backend: String,
    /// Data directory for the jsonl backend.
    pub data_dir: Option<PathBuf>,
    /// Spreadsheet id for the sheets backend.
    pub sheet_id: Option<String>,
    /// Service-account key file for the sheets backend.
    pub service_account_key: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    /// IANA timezone the reports and scheduler run in.
    pub timezone: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram: TelegramSection {
                input_bot_token: String::new(),
                report_bot_token: String::new(),
                webhook_domain: None,
            },
            server: ServerSection { port: 3000 },
            storage: StorageSection {
                backend: "jsonl".to_string(),
                data_dir: None,
                sheet_id: None,
                service_account_key: None,
            },
            report: ReportSection {
                timezone: "Asia/Kuala_Lumpur".to_string(),
            },
        }
    }
}

pub fn belanja_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".belanja"))
}

pub fn ensure_belanja_home() -> Result<PathBuf> {
    let dir = belanja_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_belanja_home()?.join("config.toml"))
}

/// Load config.toml, then let BELANJA_INPUT_TOKEN / BELANJA_REPORT_TOKEN
/// override the tokens so deployments can keep secrets out of the file.
pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    let mut cfg: Config = if p.exists() {
        let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
        toml::from_str(&s).context("parse config.toml")?
    } else {
        Config::default()
    };

    if let Ok(token) = std::env::var("BELANJA_INPUT_TOKEN") {
        cfg.telegram.input_bot_token = token;
    }
    if let Ok(token) = std::env::var("BELANJA_REPORT_TOKEN") {
        cfg.telegram.report_bot_token = token;
    }
    Ok(cfg)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let cfg = Config::default();
    save_config(&cfg)?;
    println!("Wrote {}", p.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let cfg = Config::default();
        let s = toml::to_string_pretty(&cfg).unwrap();
        let back: Config = toml::from_str(&s).unwrap();
        assert_eq!(back.server.port, 3000);
        assert_eq!(back.storage.backend, "jsonl");
        assert_eq!(back.report.timezone, "Asia/Kuala_Lumpur");
    }

    #[test]
    fn test_partial_toml_needs_all_sections() {
        // Sections are required; a bare file is not a valid config.
        assert!(toml::from_str::<Config>("").is_err());
    }
}
