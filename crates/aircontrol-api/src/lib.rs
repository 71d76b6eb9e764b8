// aircontrol-api: Async Rust client for the AirControlBase cloud API

pub mod auth;
pub mod client;
pub mod debounce;
pub mod devices;
pub mod error;
pub mod response;
pub mod shared;
pub mod transport;

pub use auth::{Credentials, SessionState};
pub use client::{ClientConfig, DEFAULT_BASE_URL, Form, SessionClient};
pub use debounce::{DEFAULT_DEBOUNCE_INTERVAL, DebounceWindow};
pub use devices::{CONTROL_FIELDS, filter_control};
pub use error::{Error, ErrorKind};
pub use response::{ApiResponse, Outcome, RELOGIN_MESSAGES, ResponseCode, SUCCESS_MESSAGE};
pub use shared::SharedSessionClient;
pub use transport::{DEFAULT_TIMEOUT, TlsMode, TransportConfig};
