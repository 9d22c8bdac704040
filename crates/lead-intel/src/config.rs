use std::str::FromStr;

use fda_common::http::RegistryClientConfig;

use crate::error::AppError;

/// Service configuration loaded from environment variables.
///
/// Every variable is optional. A variable that is set but does not parse is
/// a configuration error rather than a silent fallback.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port (`PORT`, default 3000).
    pub port: u16,
    /// Upstream registry endpoints and timeouts.
    pub registry: RegistryClientConfig,
    /// `LIVE_DATA=false` skips the network and uses the built-in records.
    pub live_data: bool,
    /// Size of the trailing openFDA date window (`LOOKBACK_DAYS`).
    pub lookback_days: u32,
    /// `limit` / `pageSize` sent upstream (`FETCH_LIMIT`).
    pub fetch_limit: u32,
    /// Fixed seed for the credibility-sentence pick; `None` seeds from the OS.
    pub credibility_seed: Option<u64>,
    /// Number of leads echoed back by `POST /api/generate-leads`.
    pub top_leads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            registry: RegistryClientConfig::default(),
            live_data: true,
            lookback_days: 180,
            fetch_limit: 100,
            credibility_seed: None,
            top_leads: 10,
        }
    }
}

/// Upper bound for `LOOKBACK_DAYS` (ten years).
const MAX_LOOKBACK_DAYS: u32 = 3650;

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, AppError> {
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::Config(format!("{name} has an invalid value: {raw:?}"))),
        _ => Ok(None),
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::Config(format!("{name} must be true or false, got {raw:?}"))),
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// - `PORT`, `LOOKBACK_DAYS`, `FETCH_LIMIT`, `TOP_LEADS`: integers
    /// - `LIVE_DATA`: boolean flag
    /// - `CREDIBILITY_SEED`: u64
    /// - registry endpoints/timeouts: see `RegistryClientConfig::from_lookup`
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let live_data = match lookup("LIVE_DATA") {
            Some(raw) if !raw.trim().is_empty() => parse_flag("LIVE_DATA", &raw)?,
            _ => defaults.live_data,
        };

        let fetch_limit = parsed::<u32>(&lookup, "FETCH_LIMIT")?.unwrap_or(defaults.fetch_limit);
        if fetch_limit == 0 {
            return Err(AppError::Config("FETCH_LIMIT must be positive".to_string()));
        }

        let lookback_days =
            parsed::<u32>(&lookup, "LOOKBACK_DAYS")?.unwrap_or(defaults.lookback_days);
        if lookback_days > MAX_LOOKBACK_DAYS {
            return Err(AppError::Config(format!(
                "LOOKBACK_DAYS must be at most {MAX_LOOKBACK_DAYS}, got {lookback_days}"
            )));
        }

        let registry = RegistryClientConfig::from_lookup(&lookup)
            .map_err(|e| AppError::Config(e.to_string()))?;

        Ok(Self {
            port: parsed(&lookup, "PORT")?.unwrap_or(defaults.port),
            registry,
            live_data,
            lookback_days,
            fetch_limit,
            credibility_seed: parsed(&lookup, "CREDIBILITY_SEED")?,
            top_leads: parsed(&lookup, "TOP_LEADS")?.unwrap_or(defaults.top_leads),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.lookback_days, 180);
        assert_eq!(config.fetch_limit, 100);
        assert!(config.live_data);
        assert!(config.credibility_seed.is_none());
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let owned: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| owned.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(vars(&[
            ("PORT", "8080"),
            ("LIVE_DATA", "no"),
            ("LOOKBACK_DAYS", "30"),
            ("CREDIBILITY_SEED", "7"),
            ("CTGOV_TIMEOUT_SECS", "12"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert!(!config.live_data);
        assert_eq!(config.lookback_days, 30);
        assert_eq!(config.credibility_seed, Some(7));
        assert_eq!(config.registry.ctgov_timeout.as_secs(), 12);
    }

    #[test]
    fn oversized_lookback_is_a_config_error() {
        let err = Config::from_lookup(vars(&[("LOOKBACK_DAYS", "4000000000")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        let err = Config::from_lookup(vars(&[("LOOKBACK_DAYS", "3651")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(Config::from_lookup(vars(&[("LOOKBACK_DAYS", "3650")])).is_ok());
    }

    #[test]
    fn invalid_registry_settings_are_config_errors() {
        for (name, value) in [
            ("OPENFDA_TIMEOUT_SECS", "thirty"),
            ("CTGOV_TIMEOUT_SECS", "0"),
            ("MAX_ERROR_BODY_BYTES", "lots"),
        ] {
            let err = Config::from_lookup(vars(&[(name, value)])).unwrap_err();
            assert!(matches!(err, AppError::Config(_)), "{name}={value}");
        }
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert!(parse_flag("X", "TRUE").unwrap());
        assert!(!parse_flag("X", "off").unwrap());
        assert!(parse_flag("X", "maybe").is_err());
    }
}
