pub mod client;
pub mod session;
pub mod timer;
pub mod traits;
