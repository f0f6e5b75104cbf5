use std::env;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Gpu,
    Host, // host memory mirror, no adapter required
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub backend: Backend,
    pub power_preference: wgpu::PowerPreference,
    pub force_fallback_adapter: bool,
    pub max_buffer_bytes: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        return Self::generic();
    }
}

impl RuntimeConfig {
    pub fn generic() -> Self {
        return Self {
            backend: Backend::Gpu,
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            max_buffer_bytes: None,
        };
    }

    pub fn host() -> Self {
        return Self {
            backend: Backend::Host,
            ..Self::generic()
        };
    }

    /// Reads `TI_BACKEND`, `TI_POWER_PREFERENCE`, `TI_FORCE_FALLBACK_ADAPTER`
    /// and `TI_MAX_BUFFER_BYTES`, keeping the generic default for anything
    /// unset or unparsable.
    pub fn from_env() -> Self {
        return Self::from_lookup(|key| env::var(key).ok());
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::generic();

        if let Some(raw) = lookup("TI_BACKEND") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "gpu" => config.backend = Backend::Gpu,
                "host" | "cpu" => config.backend = Backend::Host,
                other => warn!(value = other, "Unrecognized TI_BACKEND, using gpu"),
            }
        }

        if let Some(raw) = lookup("TI_POWER_PREFERENCE") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "high" => config.power_preference = wgpu::PowerPreference::HighPerformance,
                "low" => config.power_preference = wgpu::PowerPreference::LowPower,
                "none" => config.power_preference = wgpu::PowerPreference::None,
                other => warn!(value = other, "Unrecognized TI_POWER_PREFERENCE, using high"),
            }
        }

        if let Some(raw) = lookup("TI_FORCE_FALLBACK_ADAPTER") {
            config.force_fallback_adapter = matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes"
            );
        }

        if let Some(raw) = lookup("TI_MAX_BUFFER_BYTES") {
            match raw.trim().parse::<u64>() {
                Ok(bytes) => config.max_buffer_bytes = Some(bytes),
                Err(_) => warn!(value = raw.as_str(), "Unparsable TI_MAX_BUFFER_BYTES, ignoring"),
            }
        }

        return config;
    }
}
