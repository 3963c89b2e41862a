pub mod backend;
pub mod config_store;
pub mod defaults;
pub mod player;
pub mod runtime_client;
