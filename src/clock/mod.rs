//! Clock - the device's cooperative tick
//!
//! One fixed-period tick drives both display refresh and capture polling.
//! Each tick the controller does one bounded unit of work, so nothing blocks
//! past a tick boundary.
//!
//! ```text
//! tokio interval (interval_ms)
//!     │
//!     ▼
//! TickClock::tick() ──► TickOutcome { tick, pulses }
//!     │                         │
//!     │                         ├── poll       (every tick)  → controller.tick()
//!     │                         └── heartbeat  (~1s)         → debug log
//!     ▼
//! operator events drained between ticks
//! ```
//!
//! # Pulse Configurations
//!
//! | Config | Interval | Pulses |
//! |--------|----------|--------|
//! | `ClockConfig::default()` | 30ms | poll(1), heartbeat(33) |
//! | `ClockConfig::fast_test()` | 1ms | poll(1), heartbeat(10) |

use crate::error::{SignerError, SignerResult};
use std::time::Duration;

pub const DEFAULT_INTERVAL_MS: u64 = 30;

/// Pulse names
pub mod pulses {
    pub const POLL: &str = "poll";
    pub const HEARTBEAT: &str = "heartbeat";
}

/// Clock configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockConfig {
    /// Tick interval in milliseconds
    pub interval_ms: u64,
    /// (name, period) pulses, firing every `period` ticks
    pub pulses: Vec<(String, u64)>,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            pulses: vec![
                (pulses::POLL.into(), 1),
                (pulses::HEARTBEAT.into(), 1000 / DEFAULT_INTERVAL_MS),
            ],
        }
    }
}

impl ClockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fast ticks for tests
    pub fn fast_test() -> Self {
        Self {
            interval_ms: 1,
            pulses: vec![(pulses::POLL.into(), 1), (pulses::HEARTBEAT.into(), 10)],
        }
    }

    /// Set tick interval in milliseconds; the heartbeat keeps its ~1s period.
    pub fn with_interval_ms(mut self, ms: u64) -> Self {
        self.interval_ms = ms;
        let beat = (1000 / ms.max(1)).max(1);
        for (name, period) in self.pulses.iter_mut() {
            if name == pulses::HEARTBEAT {
                *period = beat;
            }
        }
        self
    }

    /// Add a pulse that fires every N ticks
    pub fn with_pulse(mut self, name: &str, period: u64) -> Self {
        self.pulses.push((name.into(), period));
        self
    }

    fn validate(&self) -> SignerResult<()> {
        if self.interval_ms == 0 {
            return Err(SignerError::Configuration("tick interval must be positive".into()));
        }
        if let Some((name, _)) = self.pulses.iter().find(|(_, period)| *period == 0) {
            return Err(SignerError::Configuration(format!("pulse {name} has zero period")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pulse {
    pub name: String,
    pub tick: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub tick: u64,
    pub pulses: Vec<Pulse>,
}

impl TickOutcome {
    pub fn fired(&self, name: &str) -> bool {
        self.pulses.iter().any(|p| p.name == name)
    }
}

/// Loop-driven logical clock.
#[derive(Debug, Clone)]
pub struct TickClock {
    config: ClockConfig,
    tick: u64,
}

impl TickClock {
    pub fn new(config: ClockConfig) -> SignerResult<Self> {
        config.validate()?;
        Ok(Self { config, tick: 0 })
    }

    pub fn with_defaults() -> SignerResult<Self> {
        Self::new(ClockConfig::default())
    }

    /// Advance one tick, returning the pulses that fired
    pub fn tick(&mut self) -> TickOutcome {
        self.tick += 1;
        let tick = self.tick;
        let pulses = self
            .config
            .pulses
            .iter()
            .filter(|(_, period)| tick % period == 0)
            .map(|(name, _)| Pulse { name: name.clone(), tick })
            .collect();
        TickOutcome { tick, pulses }
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.config.interval_ms)
    }

    pub fn interval_ms(&self) -> u64 {
        self.config.interval_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_thirty_ms() {
        let clock = TickClock::with_defaults().unwrap();
        assert_eq!(clock.interval_ms(), 30);
        assert_eq!(clock.interval(), Duration::from_millis(30));
        assert_eq!(clock.current_tick(), 0);
    }

    #[test]
    fn poll_fires_every_tick() {
        let mut clock = TickClock::new(ClockConfig::fast_test()).unwrap();
        for expected in 1..=5 {
            let outcome = clock.tick();
            assert_eq!(outcome.tick, expected);
            assert!(outcome.fired(pulses::POLL));
        }
    }

    #[test]
    fn heartbeat_fires_on_period() {
        let mut clock = TickClock::new(ClockConfig::fast_test()).unwrap();
        for _ in 0..9 {
            assert!(!clock.tick().fired(pulses::HEARTBEAT));
        }
        assert!(clock.tick().fired(pulses::HEARTBEAT));
    }

    #[test]
    fn custom_config() {
        let config = ClockConfig::new().with_interval_ms(50).with_pulse("blink", 4);
        assert_eq!(config.interval_ms, 50);
        assert!(config.pulses.contains(&(pulses::HEARTBEAT.to_string(), 20)));
        assert!(config.pulses.iter().any(|(n, _)| n == "blink"));
    }

    #[test]
    fn rejects_zero_periods() {
        assert!(TickClock::new(ClockConfig::new().with_pulse("never", 0)).is_err());
        let mut zero = ClockConfig::new();
        zero.interval_ms = 0;
        assert!(TickClock::new(zero).is_err());
    }
}
