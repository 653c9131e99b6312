//! Service layer for business logic
//!
//! HTTP 处理器与 CLI 共用的业务逻辑。

pub mod geoip;
pub mod qr;
mod record_service;
pub mod safety;

pub use geoip::{GeoInfo, GeoIpLookup, GeoIpProvider};
pub use record_service::*;
pub use safety::{NoopSafetyCheck, SafetyVerdict, UrlSafetyCheck, WebRiskChecker};
