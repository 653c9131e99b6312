//! 扫描事件统计
//!
//! 重定向热路径只拷贝请求信息并派发后台任务；哈希、设备识别、
//! 地理位置查询与落库都在后台完成，失败只记录日志。

pub mod device;
pub mod recorder;
pub mod sink;

pub use device::classify_device;
pub use recorder::{ScanRecorder, ScanRequest, resolve_salt};
pub use sink::ScanSink;
