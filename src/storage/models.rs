use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// 记录类型：短链接或二维码
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecordKind {
    Short,
    Qr,
}

impl RecordKind {
    /// 公开跳转路由前缀
    pub fn public_path(&self, slug: &str) -> String {
        match self {
            RecordKind::Short => format!("/{}", slug),
            RecordKind::Qr => format!("/l/{}", slug),
        }
    }

    /// 多目的地选择页路由
    pub fn landing_path(&self, slug: &str) -> String {
        match self {
            RecordKind::Short => format!("/slp/{}", slug),
            RecordKind::Qr => format!("/lp/{}", slug),
        }
    }
}

/// 记录模式。存储值只是提示，以目的地数量推导的有效模式为准
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecordMode {
    Single,
    Multi,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecordStatus {
    Active,
    Archived,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceCategory {
    Mobile,
    Tablet,
    Desktop,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EventKind {
    Scan,
    Destination,
}

/// 目的地
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub id: String,
    pub record_id: String,
    pub title: String,
    pub url: String,
    pub position: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// 短链接 / 二维码记录（含有序目的地）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortRecord {
    pub id: String,
    pub kind: RecordKind,
    pub title: String,
    pub slug: String,
    pub stored_mode: RecordMode,
    pub default_url: Option<String>,
    pub hero_image: Option<String>,
    pub origin: Option<String>,
    pub status: RecordStatus,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub destinations: Vec<Destination>,
}

impl ShortRecord {
    pub fn is_password_protected(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn find_destination(&self, id: &str) -> Option<&Destination> {
        self.destinations.iter().find(|d| d.id == id)
    }
}

/// 写入用的目的地
#[derive(Debug, Clone)]
pub struct NewDestination {
    pub id: Option<String>,
    pub title: String,
    pub url: String,
    pub position: i32,
    pub image: Option<String>,
}

/// 写入用的记录（按 editor_token_hash upsert）
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub kind: RecordKind,
    pub title: String,
    pub slug: String,
    pub default_url: Option<String>,
    pub hero_image: Option<String>,
    pub origin: Option<String>,
    pub editor_token_hash: String,
    /// None 表示保留已有密码
    pub password_hash: Option<String>,
    pub destinations: Vec<NewDestination>,
}

/// upsert 结果
#[derive(Debug, Clone)]
pub struct SavedRecord {
    pub id: String,
    pub slug: String,
    pub created: bool,
}

/// 模块形状
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ModuleStyle {
    Square,
    Rounded,
    #[default]
    Dot,
}

/// 定位图案形状
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EyeStyle {
    Square,
    #[default]
    Rounded,
}

/// 纠错等级
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
pub enum EccLevel {
    L,
    M,
    Q,
    #[default]
    H,
}

/// 二维码样式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrStyle {
    pub fg_color: String,
    pub bg_color: String,
    pub gradient: Option<[String; 2]>,
    pub module_style: ModuleStyle,
    pub eye_style: EyeStyle,
    pub quiet_zone: u32,
    pub ecc: EccLevel,
    pub with_logo: bool,
    pub logo_size_ratio: f64,
}

impl Default for QrStyle {
    fn default() -> Self {
        Self {
            fg_color: "#000000".to_string(),
            bg_color: "#FFFFFF".to_string(),
            gradient: None,
            module_style: ModuleStyle::default(),
            eye_style: EyeStyle::default(),
            quiet_zone: 4,
            ecc: EccLevel::default(),
            with_logo: false,
            logo_size_ratio: 0.22,
        }
    }
}

/// 已存储的样式（含处理后的 logo）
#[derive(Debug, Clone)]
pub struct StoredQrStyle {
    pub style: QrStyle,
    pub logo_png: Option<Vec<u8>>,
}

/// logo 更新方式
#[derive(Debug, Clone, PartialEq)]
pub enum LogoUpdate {
    Keep,
    Remove,
    Replace(Vec<u8>),
}

/// 待写入的扫描事件
#[derive(Debug, Clone)]
pub struct NewScanEvent {
    pub record_id: String,
    pub slug_snapshot: String,
    pub ip_hash: String,
    pub user_agent_hash: String,
    pub country_iso: Option<String>,
    pub city_name: Option<String>,
    pub referrer_domain: Option<String>,
    pub device_category: DeviceCategory,
    pub destination_id: Option<String>,
    pub event_kind: EventKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryCount {
    pub country: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCount {
    pub device: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationCount {
    pub destination_id: String,
    pub count: u64,
}

/// 单条记录的扫描统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total_scans: u64,
    pub unique_scans: u64,
    pub top_countries: Vec<CountryCount>,
    pub devices: Vec<DeviceCount>,
    pub destination_counts: Vec<DestinationCount>,
}

impl ScanSummary {
    pub fn count_for_destination(&self, destination_id: &str) -> u64 {
        self.destination_counts
            .iter()
            .find(|d| d.destination_id == destination_id)
            .map(|d| d.count)
            .unwrap_or(0)
    }
}
