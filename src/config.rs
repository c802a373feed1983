//! Environment configuration

use crate::resolver::DEFAULT_MAX_CONCURRENT_EXECUTIONS;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_SSE_KEEPALIVE_SECS: u64 = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration for the agent server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub port: u16,
    /// Approved tools executed at the same time during one resolution pass
    pub max_concurrent_executions: usize,
    /// Interval between SSE keep-alive pings
    pub sse_keepalive: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_concurrent_executions: DEFAULT_MAX_CONCURRENT_EXECUTIONS,
            sse_keepalive: Duration::from_secs(DEFAULT_SSE_KEEPALIVE_SECS),
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = parse_var::<u16, _>(&lookup, "HITL_PORT")?.unwrap_or(defaults.port);

        let max_concurrent_executions = match parse_var::<usize, _>(
            &lookup,
            "HITL_MAX_CONCURRENT_TOOLS",
        )? {
            Some(0) => {
                return Err(ConfigError::Invalid {
                    var: "HITL_MAX_CONCURRENT_TOOLS",
                    value: "0".to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
            Some(n) => n,
            None => defaults.max_concurrent_executions,
        };

        let sse_keepalive = parse_var::<u64, _>(&lookup, "HITL_SSE_KEEPALIVE_SECS")?
            .map_or(defaults.sse_keepalive, Duration::from_secs);

        Ok(Self {
            port,
            max_concurrent_executions,
            sse_keepalive,
        })
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        })
}
