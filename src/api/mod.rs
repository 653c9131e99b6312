//! HTTP 层：中间件与路由处理
//!
//! - `middleware`: 请求 ID 与 tracing span
//! - `services`: 公开跳转、落地页、编辑 API、健康检查

pub mod middleware;
pub mod services;
