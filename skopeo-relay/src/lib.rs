mod config;
mod error;
mod platform;
mod relay;
mod runner;
mod skopeo;
mod tags;

pub type RelayResult<T> = Result<T, error::RelayError>;

pub use config::{RelayConfig, ResolvedConfig, TransferMode, DEFAULT_BINARY, DEFAULT_CERTS_DIR};
pub use error::{ExecError, RelayError};
pub use platform::{Platform, PlatformSpec};
pub use relay::{Relay, SyncReport, SyncRequest, TagFilter, TagOutcome, TagSelector};
pub use runner::{redact, stdout_sink, OutputSink, ProcessRunner, ToolRunner};
pub use skopeo::{SkopeoRelay, RELAY_ID};
pub use tags::{RegistryTagLister, TagLister};
