pub mod backend;
pub mod parse;
pub mod request;
pub mod runtime;
