//! QR-Gen Studio - dynamic QR codes and short links
//!
//! Short links and QR codes point at one or more destinations. Single-destination
//! records redirect straight away, multi-destination records send visitors to a
//! landing page. Every scan is recorded without storing raw IP addresses.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: Command-line interface
//!
//! # Architecture
//! - `storage`: Records, destinations, styles and scan events (SeaORM)
//! - `resolver`: Pure destination resolution
//! - `analytics`: Fire-and-forget scan recording
//! - `services`: Editorial CRUD, URL safety, GeoIP and QR asset rendering
//! - `api`: HTTP services and middleware
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging setup

pub mod analytics;
pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod resolver;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
