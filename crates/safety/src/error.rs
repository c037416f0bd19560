use thiserror::Error;

/// Configuration rejected at startup.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    #[error("channel {channel} range is degenerate: low {low} must be below high {high}")]
    DegenerateRange { channel: usize, low: u16, high: u16 },

    #[error("channel {channel} range upper bound {high} exceeds the 10-bit ADC span")]
    RangeBeyondAdc { channel: usize, high: u16 },

    #[error("{name} must be a finite, non-negative percentage (got {value})")]
    InvalidThreshold { name: &'static str, value: f64 },

    #[error("debounce depth must be at least one cycle")]
    ZeroDebounce,
}
