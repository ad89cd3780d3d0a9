use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ExchangeError, Result, SharedMedium};

/// Interval between two reads of the shared medium.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How the sleep between polls evolves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Backoff {
    #[default]
    Fixed,
    /// Double the interval after every empty poll, capped at `max`.
    Exponential {
        #[serde(rename = "max_interval_ms", with = "millis")]
        max: Duration,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    #[serde(rename = "interval_ms", with = "millis")]
    pub interval: Duration,
    /// `None` waits for the peer forever.
    #[serde(rename = "timeout_ms", with = "opt_millis")]
    pub timeout: Option<Duration>,
    pub backoff: Backoff,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
            backoff: Backoff::Fixed,
        }
    }
}

impl PollConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(ExchangeError::Config(
                "poll interval must be positive".to_owned(),
            ));
        }
        if let Backoff::Exponential { max } = self.backoff {
            if max < self.interval {
                return Err(ExchangeError::Config(format!(
                    "backoff cap {max:?} is below the poll interval {:?}",
                    self.interval
                )));
            }
        }
        Ok(())
    }

    /// Sleep to use after `current` produced nothing.
    pub(crate) fn next_interval(&self, current: Duration) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.interval,
            Backoff::Exponential { max } => current.saturating_mul(2).min(max),
        }
    }
}

/// Which exchanger the handshake driver builds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExchangeMethod {
    /// Relay ids through a human on the terminal.
    Interactive,
    /// Poll a shared JSON file; `None` means the loopback file in the
    /// temp directory.
    SharedMedium {
        #[serde(default)]
        file_path: Option<PathBuf>,
    },
}

impl Default for ExchangeMethod {
    fn default() -> Self {
        ExchangeMethod::SharedMedium { file_path: None }
    }
}

impl ExchangeMethod {
    /// The medium a shared-medium exchange would use, resolved now.
    pub fn medium(&self) -> Option<SharedMedium> {
        match self {
            ExchangeMethod::Interactive => None,
            ExchangeMethod::SharedMedium { file_path } => Some(
                file_path
                    .as_ref()
                    .map(SharedMedium::new)
                    .unwrap_or_default(),
            ),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    pub method: ExchangeMethod,
    pub poll: PollConfig,
}

impl ExchangeConfig {
    pub fn interactive() -> Self {
        Self {
            method: ExchangeMethod::Interactive,
            ..Default::default()
        }
    }

    pub fn shared_medium(file_path: Option<PathBuf>) -> Self {
        Self {
            method: ExchangeMethod::SharedMedium { file_path },
            ..Default::default()
        }
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.poll.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        log::debug!("loaded exchange config from {}", path.display());
        Self::from_json_str(&json)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer)
            .map(|ms| ms.map(Duration::from_millis))
    }
}
