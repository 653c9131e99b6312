//! Entity Model 与领域模型之间的转换

use std::str::FromStr;

use tracing::warn;

use crate::storage::models::{
    Destination, EccLevel, EyeStyle, ModuleStyle, QrStyle, RecordKind, RecordMode, RecordStatus,
    ShortRecord, StoredQrStyle,
};
use migration::entities::{destination, qr_style, record};

/// 将 record Model 与已排序的目的地组装为 ShortRecord
///
/// 无法识别的枚举值按最保守的含义处理。
pub fn model_to_record(model: record::Model, destinations: Vec<Destination>) -> ShortRecord {
    let kind = RecordKind::from_str(&model.kind).unwrap_or_else(|_| {
        warn!("Unknown record kind '{}' for {}", model.kind, model.id);
        RecordKind::Short
    });

    ShortRecord {
        id: model.id,
        kind,
        title: model.title,
        slug: model.slug,
        stored_mode: RecordMode::from_str(&model.mode).unwrap_or(RecordMode::Single),
        default_url: model.default_url.filter(|u| !u.trim().is_empty()),
        hero_image: model.hero_image,
        origin: model.origin,
        status: RecordStatus::from_str(&model.status).unwrap_or(RecordStatus::Archived),
        password_hash: model.password_hash,
        created_at: model.created_at,
        updated_at: model.updated_at,
        destinations,
    }
}

pub fn model_to_destination(model: destination::Model) -> Destination {
    Destination {
        id: model.id,
        record_id: model.record_id,
        title: model.title,
        url: model.url,
        position: model.position,
        image: model.image,
    }
}

/// 样式行转换；非法的 gradient JSON 视为无渐变
pub fn model_to_qr_style(model: qr_style::Model) -> StoredQrStyle {
    let gradient = model
        .gradient_json
        .as_deref()
        .and_then(|raw| serde_json::from_str::<[String; 2]>(raw).ok());

    StoredQrStyle {
        style: QrStyle {
            fg_color: model.fg_color,
            bg_color: model.bg_color,
            gradient,
            module_style: ModuleStyle::from_str(&model.module_style).unwrap_or_default(),
            eye_style: EyeStyle::from_str(&model.eye_style).unwrap_or_default(),
            quiet_zone: model.quiet_zone.max(0) as u32,
            ecc: EccLevel::from_str(&model.ecc_level).unwrap_or_default(),
            with_logo: model.logo_png.is_some(),
            logo_size_ratio: model.logo_size_ratio,
        },
        logo_png: model.logo_png,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record_model(mode: &str, status: &str) -> record::Model {
        record::Model {
            id: "rec-1".to_string(),
            kind: "qr".to_string(),
            title: "Menu".to_string(),
            slug: "menu".to_string(),
            mode: mode.to_string(),
            default_url: Some("  ".to_string()),
            hero_image: None,
            origin: None,
            status: status.to_string(),
            editor_token_hash: "h".to_string(),
            password_hash: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_record_conversion() {
        let record = model_to_record(record_model("multi", "active"), Vec::new());
        assert_eq!(record.kind, RecordKind::Qr);
        assert_eq!(record.stored_mode, RecordMode::Multi);
        assert_eq!(record.status, RecordStatus::Active);
        // 空白 default_url 视为缺失
        assert!(record.default_url.is_none());
    }

    #[test]
    fn test_unknown_status_is_archived() {
        let record = model_to_record(record_model("???", "deleted"), Vec::new());
        assert_eq!(record.stored_mode, RecordMode::Single);
        assert_eq!(record.status, RecordStatus::Archived);
    }

    #[test]
    fn test_style_conversion_tolerates_bad_gradient() {
        let model = qr_style::Model {
            record_id: "rec-1".to_string(),
            fg_color: "#111111".to_string(),
            bg_color: "#FFFFFF".to_string(),
            gradient_json: Some("not json".to_string()),
            module_style: "rounded".to_string(),
            eye_style: "square".to_string(),
            quiet_zone: 2,
            ecc_level: "Q".to_string(),
            logo_size_ratio: 0.2,
            logo_png: Some(vec![1, 2, 3]),
            updated_at: Utc::now(),
        };
        let stored = model_to_qr_style(model);
        assert!(stored.style.gradient.is_none());
        assert_eq!(stored.style.module_style, ModuleStyle::Rounded);
        assert_eq!(stored.style.eye_style, EyeStyle::Square);
        assert_eq!(stored.style.ecc, EccLevel::Q);
        assert!(stored.style.with_logo);
    }
}
