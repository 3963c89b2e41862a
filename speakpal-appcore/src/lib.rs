pub mod capture;
pub mod service;
