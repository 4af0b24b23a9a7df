// Library exports for the yshop-orders crate
// This allows tests and the binary to use the modules

pub mod auth;
pub mod batch;
pub mod config;
pub mod date_range;
pub mod gmail_client;
pub mod mailbox;
pub mod order_processor;
pub mod sheet;
pub mod sheets_client;

// Order email classification and body parsing
pub mod order;
