use crate::error::CoreError;
use std::time::Duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Expiry applied when the caller does not pick one, or picks an unknown one.
pub const DEFAULT_EXPIRY_KEY: &str = "1day";

/// A selectable paste lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryOption {
    /// The key clients send, e.g. `"1hour"`.
    pub key: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    /// How long a paste created with this option stays visible.
    pub duration: Duration,
}

/// Every lifetime a paste can be created with.
///
/// `"never"` is a hundred years rather than an absent expiry, so every row
/// keeps a finite `expires_at`.
pub static EXPIRY_OPTIONS: [ExpiryOption; 6] = [
    ExpiryOption {
        key: "10min",
        label: "10 Minutes",
        duration: Duration::from_secs(10 * MINUTE),
    },
    ExpiryOption {
        key: "1hour",
        label: "1 Hour",
        duration: Duration::from_secs(HOUR),
    },
    ExpiryOption {
        key: "1day",
        label: "1 Day",
        duration: Duration::from_secs(DAY),
    },
    ExpiryOption {
        key: "1week",
        label: "1 Week",
        duration: Duration::from_secs(7 * DAY),
    },
    ExpiryOption {
        key: "1month",
        label: "1 Month",
        duration: Duration::from_secs(30 * DAY),
    },
    ExpiryOption {
        key: "never",
        label: "Never (100 years)",
        duration: Duration::from_secs(100 * 365 * DAY),
    },
];

/// Maps expiry keys to durations, falling back to a configured default.
#[derive(Debug, Clone)]
pub struct ExpiryPolicy {
    default: &'static ExpiryOption,
}

impl ExpiryPolicy {
    /// Creates a policy whose fallback is `default_key`.
    ///
    /// Fails if `default_key` is not one of [`EXPIRY_OPTIONS`].
    pub fn new(default_key: &str) -> Result<Self, CoreError> {
        let default = lookup(default_key)
            .ok_or_else(|| CoreError::UnknownExpiry(default_key.to_string()))?;
        Ok(Self { default })
    }

    /// Returns the option for `key`, or the default option when `key` is unknown.
    pub fn resolve(&self, key: &str) -> &'static ExpiryOption {
        lookup(key).unwrap_or(self.default)
    }

    /// Returns the fallback option.
    pub fn default_option(&self) -> &'static ExpiryOption {
        self.default
    }

    /// Returns every selectable option.
    pub fn options(&self) -> &'static [ExpiryOption] {
        &EXPIRY_OPTIONS
    }

    /// Whether `key` names one of the known options.
    pub fn is_valid(key: &str) -> bool {
        lookup(key).is_some()
    }
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            default: &EXPIRY_OPTIONS[2],
        }
    }
}

fn lookup(key: &str) -> Option<&'static ExpiryOption> {
    EXPIRY_OPTIONS.iter().find(|option| option.key == key)
}
