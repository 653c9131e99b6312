//! 目的地解析
//!
//! 纯函数：给定记录和可选的目的地选择器，决定跳转、落地页或未找到。
//! 同一记录状态下结果是确定的。

use crate::storage::models::{Destination, RecordMode, ShortRecord};

/// 解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Redirect {
        url: String,
        /// 通过选择器命中的目的地
        destination_id: Option<String>,
    },
    Landing {
        slug: String,
    },
    NotFound,
}

/// 由目的地数量推导有效模式；存储的 mode 只是提示
pub fn effective_mode(destinations: &[Destination]) -> RecordMode {
    if destinations.len() > 1 {
        RecordMode::Multi
    } else {
        RecordMode::Single
    }
}

/// 按 position 稳定排序，相同 position 保持原有顺序
pub fn sort_destinations(destinations: &mut [Destination]) {
    destinations.sort_by_key(|d| d.position);
}

pub fn resolve(record: Option<&ShortRecord>, selector: Option<&str>) -> Resolution {
    let Some(record) = record else {
        return Resolution::NotFound;
    };

    if let Some(selector) = selector.map(str::trim).filter(|s| !s.is_empty()) {
        return match record.find_destination(selector) {
            Some(dest) => Resolution::Redirect {
                url: dest.url.clone(),
                destination_id: Some(dest.id.clone()),
            },
            // 未知的选择器不报错，交给落地页
            None => Resolution::Landing {
                slug: record.slug.clone(),
            },
        };
    }

    if effective_mode(&record.destinations) == RecordMode::Multi {
        return Resolution::Landing {
            slug: record.slug.clone(),
        };
    }

    record
        .default_url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .or_else(|| record.destinations.first().map(|d| d.url.as_str()))
        .map(|url| Resolution::Redirect {
            url: url.to_string(),
            destination_id: None,
        })
        .unwrap_or(Resolution::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::{RecordKind, RecordStatus};
    use chrono::Utc;

    fn dest(id: &str, url: &str, position: i32) -> Destination {
        Destination {
            id: id.to_string(),
            record_id: "r".to_string(),
            title: id.to_string(),
            url: url.to_string(),
            position,
            image: None,
        }
    }

    fn record(default_url: Option<&str>, destinations: Vec<Destination>) -> ShortRecord {
        ShortRecord {
            id: "r".to_string(),
            kind: RecordKind::Qr,
            title: "T".to_string(),
            slug: "menu".to_string(),
            stored_mode: RecordMode::Multi,
            default_url: default_url.map(String::from),
            hero_image: None,
            origin: None,
            status: RecordStatus::Active,
            password_hash: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            destinations,
        }
    }

    #[test]
    fn test_missing_record() {
        assert_eq!(resolve(None, None), Resolution::NotFound);
        assert_eq!(resolve(None, Some("d1")), Resolution::NotFound);
    }

    #[test]
    fn test_single_destination_redirects_even_if_stored_multi() {
        let r = record(None, vec![dest("d1", "https://a.example", 0)]);
        assert_eq!(
            resolve(Some(&r), None),
            Resolution::Redirect {
                url: "https://a.example".to_string(),
                destination_id: None
            }
        );
    }

    #[test]
    fn test_default_url_preferred() {
        let r = record(
            Some("https://default.example"),
            vec![dest("d1", "https://a.example", 0)],
        );
        assert!(matches!(
            resolve(Some(&r), None),
            Resolution::Redirect { ref url, .. } if url == "https://default.example"
        ));
    }

    #[test]
    fn test_multi_goes_to_landing() {
        let r = record(
            None,
            vec![
                dest("d1", "https://a.example", 0),
                dest("d2", "https://b.example", 1),
            ],
        );
        assert_eq!(
            resolve(Some(&r), None),
            Resolution::Landing {
                slug: "menu".to_string()
            }
        );
    }

    #[test]
    fn test_selector_hits_and_misses() {
        let r = record(
            None,
            vec![
                dest("d1", "https://a.example", 0),
                dest("d2", "https://b.example", 1),
            ],
        );
        assert_eq!(
            resolve(Some(&r), Some("d2")),
            Resolution::Redirect {
                url: "https://b.example".to_string(),
                destination_id: Some("d2".to_string())
            }
        );
        assert_eq!(
            resolve(Some(&r), Some("nope")),
            Resolution::Landing {
                slug: "menu".to_string()
            }
        );
        // 空选择器等同于没有
        assert!(matches!(
            resolve(Some(&r), Some("  ")),
            Resolution::Landing { .. }
        ));
    }

    #[test]
    fn test_empty_record_is_not_found() {
        let r = record(Some("   "), Vec::new());
        assert_eq!(resolve(Some(&r), None), Resolution::NotFound);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let r = record(None, vec![dest("d1", "https://a.example", 0)]);
        assert_eq!(resolve(Some(&r), None), resolve(Some(&r), None));
    }

    #[test]
    fn test_sort_is_stable_by_position() {
        let mut list = vec![
            dest("c", "https://c", 2),
            dest("a1", "https://a1", 1),
            dest("a2", "https://a2", 1),
            dest("z", "https://z", 0),
        ];
        sort_destinations(&mut list);
        let ids: Vec<&str> = list.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a1", "a2", "c"]);
        assert_eq!(effective_mode(&list), RecordMode::Multi);
        assert_eq!(effective_mode(&list[..1]), RecordMode::Single);
    }
}
