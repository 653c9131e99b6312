//! 基于 User-Agent 的设备分类

use crate::storage::models::DeviceCategory;

const TABLET_PATTERNS: &[&str] = &["tablet", "ipad", "playbook", "silk"];

const MOBILE_PATTERNS: &[&str] = &[
    "mobile",
    "iphone",
    "ipod",
    "android",
    "blackberry",
    "opera mini",
    "opera mobi",
    "skyfire",
    "maemo",
    "windows phone",
    "palm",
    "iemobile",
    "symbian",
    "symbianos",
    "fennec",
];

/// 平板判断先于手机：任一处 "android" 之后没有 "mobile" 即视为平板
fn is_tablet(ua: &str) -> bool {
    if TABLET_PATTERNS.iter().any(|p| ua.contains(p)) {
        return true;
    }
    ua.match_indices("android")
        .any(|(idx, _)| !ua[idx..].contains("mobile"))
}

/// 将 User-Agent 分类为 mobile / tablet / desktop（大小写不敏感）
pub fn classify_device(user_agent: Option<&str>) -> DeviceCategory {
    let Some(ua) = user_agent else {
        return DeviceCategory::Desktop;
    };
    let ua = ua.to_lowercase();

    if is_tablet(&ua) {
        DeviceCategory::Tablet
    } else if MOBILE_PATTERNS.iter().any(|p| ua.contains(p)) {
        DeviceCategory::Mobile
    } else {
        DeviceCategory::Desktop
    }
}
