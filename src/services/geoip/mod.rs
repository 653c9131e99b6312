//! GeoIP 服务模块
//!
//! 提供 IP 地址地理位置查询功能，支持：
//! - MaxMind GeoLite2 本地数据库
//! - 未配置数据库时的空实现

mod maxmind;
mod null;
mod provider;

pub use maxmind::MaxMindProvider;
pub use null::NullProvider;
pub use provider::{GeoInfo, GeoIpLookup, GeoIpProvider};
