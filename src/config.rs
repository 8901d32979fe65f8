use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_TRACE_LOG_LIMIT: usize = 10_000;

/// Pointer state used for mouse-style events when the option bag leaves a
/// field out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnvironmentDefaults {
    pub screen_x: f64,
    pub screen_y: f64,
    pub client_x: f64,
    pub client_y: f64,
    pub button: i16,
    pub buttons: u16,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TraceConfig {
    pub enabled: bool,
    pub events: bool,
    pub log_limit: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            events: true,
            log_limit: DEFAULT_TRACE_LOG_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageConfig {
    pub environment: EnvironmentDefaults,
    pub touch_supported: bool,
    pub trace: TraceConfig,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            environment: EnvironmentDefaults::default(),
            touch_supported: true,
            trace: TraceConfig::default(),
        }
    }
}

impl PageConfig {
    pub fn from_json(src: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(src).map_err(|err| Error::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.trace.log_limit == 0 {
            return Err(Error::InvalidConfig(
                "trace.logLimit requires at least 1 entry".into(),
            ));
        }
        Ok(())
    }
}
