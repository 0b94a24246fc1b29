pub mod capture;
pub mod config;
pub mod data;
pub mod execution;
pub mod monitoring;
pub mod signals;
