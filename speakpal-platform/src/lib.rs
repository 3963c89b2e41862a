pub mod host;
pub mod terminal;

pub use host::{EnvHost, HostBridge, HostUser, InitData, InitDataError, participant_or_placeholder, start_host};
pub use terminal::TerminalView;
