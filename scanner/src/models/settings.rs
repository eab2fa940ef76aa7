//! 外壳设置

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use serde::{Deserialize, Serialize};

use super::Family;
use crate::utils;

/// 外壳传入的设置对象中与核心相关的部分.
///
/// 核心每次操作读取一次, 从不修改. 字段名与外壳的 camelCase 设置键一致.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// 自定义正则, 匹配优先级最高; 空串表示未配置
    pub user_regexp: String,
    /// 自定义正则命中时的高亮颜色
    pub user_reg_color: String,
    /// 高亮卡片边框样式
    pub emphasis_outline_style: String,
    /// 点击番号时的默认跳转链接, `${code}` 会被替换为真正的番号
    pub open_site: String,
    /// 按住 shift 键时的跳转链接
    pub secondary_site: String,
    /// fc2 番号的默认跳转链接
    pub fc2_site: String,
    /// fc2 番号按住 shift 键时的跳转链接
    pub secondary_fc2_site: String,
    /// javdb 中不显示完整番号、需要合成标题的页面路径, 逗号或分号分隔
    pub javdb_ou_path: String,
    /// 是否隐藏合集作品
    #[serde(rename = "hideCollectionAV")]
    pub hide_collection_av: bool,
    /// 合集番号前缀, 多个前缀用逗号
    pub collection_code_prefixes: String,
    /// 磁力链接的最小体积, 如 "1.5 GB"; 空串表示不过滤
    pub magnet_filter_size: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_regexp: String::new(),
            user_reg_color: "orange".to_string(),
            emphasis_outline_style: "2px solid red".to_string(),
            open_site: "https://www.javbus.com/${code}".to_string(),
            secondary_site: "https://javdb.com/search?q=${code}".to_string(),
            fc2_site: "https://sukebei.nyaa.si/user/offkab?q=${code}".to_string(),
            secondary_fc2_site: "https://missav.live/search/${code}".to_string(),
            javdb_ou_path: "/western".to_string(),
            hide_collection_av: false,
            collection_code_prefixes: String::new(),
            magnet_filter_size: String::new(),
        }
    }
}

impl Settings {
    /// 自定义正则, 未配置时为 None
    pub fn user_pattern(&self) -> Option<&str> {
        let pat = self.user_regexp.trim();
        if pat.is_empty() { None } else { Some(pat) }
    }

    /// javdb 合成标题页面路径列表
    pub fn ou_paths(&self) -> Vec<&str> {
        split_list(&self.javdb_ou_path)
    }

    /// 磁力过滤阈值, 字节
    pub fn magnet_min_bytes(&self) -> Option<u64> {
        utils::parse_size_to_bytes(&self.magnet_filter_size)
    }

    /// 番号链接目标, 模板未配置时为 None
    pub fn link_for(&self, code: &str, family: Family) -> Option<String> {
        let template = match family {
            Family::Fc2 => &self.fc2_site,
            _ => &self.open_site,
        };
        if template.trim().is_empty() {
            return None;
        }
        Some(utils::render_link_template(template, code))
    }

    /// 番号是否属于配置的合集前缀
    pub fn is_collection(&self, code: &str) -> bool {
        let upper = code.to_uppercase();
        split_list(&self.collection_code_prefixes)
            .iter()
            .any(|prefix| upper.starts_with(&prefix.to_uppercase()))
    }
}

fn split_list(raw: &str) -> Vec<&str> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.user_pattern(), None);
        assert_eq!(settings.ou_paths(), vec!["/western"]);
        assert_eq!(settings.magnet_min_bytes(), None);
        assert!(!settings.is_collection("ABC-123"));
    }

    #[test]
    fn test_camel_case_keys() {
        let settings: Settings = serde_json::from_str(
            r#"{
                "userRegexp": "XY\\d+",
                "emphasisOutlineStyle": "3px dashed blue",
                "javdbOuPath": "/western; /uncensored",
                "hideCollectionAV": true,
                "collectionCodePrefixes": "ofje, mkck",
                "magnetFilterSize": "1.5 GB"
            }"#,
        )
        .unwrap();
        assert_eq!(settings.user_pattern(), Some("XY\\d+"));
        assert_eq!(settings.emphasis_outline_style, "3px dashed blue");
        assert_eq!(settings.ou_paths(), vec!["/western", "/uncensored"]);
        assert!(settings.hide_collection_av);
        assert!(settings.is_collection("OFJE-321"));
        assert!(!settings.is_collection("ABC-123"));
        assert_eq!(
            settings.magnet_min_bytes(),
            Some((1.5 * 1024.0 * 1024.0 * 1024.0) as u64)
        );
        // 未出现的键取默认值
        assert_eq!(settings.open_site, "https://www.javbus.com/${code}");
    }

    #[test]
    fn test_link_for() {
        let settings = Settings::default();
        assert_eq!(
            settings.link_for("ABC-123", Family::Censored).as_deref(),
            Some("https://www.javbus.com/ABC-123")
        );
        assert_eq!(
            settings.link_for("FC2-1234567", Family::Fc2).as_deref(),
            Some("https://sukebei.nyaa.si/user/offkab?q=FC2-1234567")
        );

        let mut settings = settings;
        settings.open_site = String::new();
        assert_eq!(settings.link_for("ABC-123", Family::Censored), None);
    }
}
