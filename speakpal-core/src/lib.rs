pub mod audio_hex;
pub mod config;
pub mod stats;
pub mod text;
pub mod types;

// Keep the public surface small and intentional.
pub use audio_hex::*;
pub use config::*;
pub use stats::*;
pub use text::*;
pub use types::*;
