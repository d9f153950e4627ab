use serde::Deserialize;

use crate::connection::Connection;
use crate::frame::Version;
use crate::proto::{
    Role, WindowSize, DEFAULT_INITIAL_WINDOW_SIZE, DEFAULT_MAX_SEND_BUFFER_SIZE,
    DEFAULT_MAX_SEND_CHUNK, MAX_WINDOW_SIZE,
};
use crate::session::Session;

const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1_024 * 1_024 - 1;

/// Session settings. Every field has a default, so a partial JSON or TOML
/// document deserializes.
///
/// ```
/// let config: spdymux::Config = serde_json::from_str(r#"{
///     "version": "spdy/3",
///     "max_concurrent_streams": 100
/// }"#).unwrap();
/// assert_eq!(config.max_concurrent_streams, Some(100));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: Version,

    /// Receive window of every stream, announced in the initial SETTINGS when
    /// it differs from the 64 KiB default. SPDY/3 only.
    pub initial_window_size: WindowSize,

    /// Receive window of the session as a whole. Values above the 64 KiB
    /// default are announced with a WINDOW_UPDATE on stream zero.
    pub initial_session_window_size: WindowSize,

    /// Peer-initiated streams allowed at once, announced in the initial
    /// SETTINGS. `None` is unlimited.
    pub max_concurrent_streams: Option<u32>,

    /// Largest frame accepted from the peer.
    pub max_frame_size: usize,

    /// Largest DATA payload sent in one frame.
    pub max_send_chunk: usize,

    /// Outbound DATA bytes queued before writes report `Pending`.
    pub max_send_buffer_size: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            version: Version::default(),
            initial_window_size: DEFAULT_INITIAL_WINDOW_SIZE,
            initial_session_window_size: DEFAULT_INITIAL_WINDOW_SIZE,
            max_concurrent_streams: None,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            max_send_chunk: DEFAULT_MAX_SEND_CHUNK,
            max_send_buffer_size: DEFAULT_MAX_SEND_BUFFER_SIZE,
        }
    }
}

impl Config {
    /// Checks the values a deserialized config can carry but the builder's
    /// setters reject.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_send_chunk == 0 {
            return Err(ConfigError::Zero {
                field: "max_send_chunk",
            });
        }

        if self.max_send_buffer_size == 0 {
            return Err(ConfigError::Zero {
                field: "max_send_buffer_size",
            });
        }

        if self.initial_window_size > MAX_WINDOW_SIZE {
            return Err(ConfigError::WindowTooLarge {
                field: "initial_window_size",
                value: self.initial_window_size,
            });
        }

        if self.initial_session_window_size > MAX_WINDOW_SIZE {
            return Err(ConfigError::WindowTooLarge {
                field: "initial_session_window_size",
                value: self.initial_session_window_size,
            });
        }

        Ok(())
    }
}

/// A [`Config`] no session can run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be at least one byte")]
    Zero { field: &'static str },

    #[error("{field} of {value} exceeds the largest window")]
    WindowTooLarge {
        field: &'static str,
        value: WindowSize,
    },
}

/// Builds sessions and connections.
///
/// ```
/// use spdymux::{Builder, Version};
///
/// let mut client = Builder::new()
///     .version(Version::V3)
///     .initial_window_size(1_024 * 1_024)
///     .client();
/// assert!(client.poll_transmit().is_some());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    pub fn from_config(config: Config) -> Result<Builder, ConfigError> {
        config.validate()?;
        Ok(Builder { config })
    }

    pub fn version(&mut self, version: Version) -> &mut Self {
        self.config.version = version;
        self
    }

    pub fn initial_window_size(&mut self, size: WindowSize) -> &mut Self {
        assert!(size <= MAX_WINDOW_SIZE);
        self.config.initial_window_size = size;
        self
    }

    pub fn initial_session_window_size(&mut self, size: WindowSize) -> &mut Self {
        assert!(size <= MAX_WINDOW_SIZE);
        self.config.initial_session_window_size = size;
        self
    }

    pub fn max_concurrent_streams(&mut self, max: u32) -> &mut Self {
        self.config.max_concurrent_streams = Some(max);
        self
    }

    pub fn max_frame_size(&mut self, max: usize) -> &mut Self {
        self.config.max_frame_size = max;
        self
    }

    pub fn max_send_chunk(&mut self, max: usize) -> &mut Self {
        assert!(max > 0, "send chunk must hold at least one byte");
        self.config.max_send_chunk = max;
        self
    }

    pub fn max_send_buffer_size(&mut self, max: usize) -> &mut Self {
        assert!(max > 0, "send buffer must hold at least one byte");
        self.config.max_send_buffer_size = max;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> Session {
        Session::new(Role::Client, &self.config)
    }

    pub fn server(&self) -> Session {
        Session::new(Role::Server, &self.config)
    }

    pub fn client_connection<T>(&self, io: T) -> Connection<T> {
        Connection::new(io, self.client())
    }

    pub fn server_connection<T>(&self, io: T) -> Connection<T> {
        Connection::new(io, self.server())
    }
}
