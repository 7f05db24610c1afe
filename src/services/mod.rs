//! Business logic services

pub mod intake;
pub mod loader_client;
pub mod mapping;
pub mod parser;
pub mod session;
pub mod template;
pub mod uploader;
pub mod workflow;
