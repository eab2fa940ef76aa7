//! 识别结果

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ego_tree::NodeId;
use serde::{Deserialize, Serialize};

use crate::patterns;

/// 番号模式族, 按固定优先级排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Fc2,
    /// 合集日期后缀, 如 `sexart.21.04.03`
    Ou,
    /// 日期-编号对
    Num2,
    /// 特殊厂牌前缀
    Special,
    /// 无码字母+数字
    Uncensored,
    /// 有码通用
    Censored,
    /// 用户自定义正则
    User,
}

impl Family {
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Fc2 => "fc2",
            Family::Ou => "ou",
            Family::Num2 => "num2",
            Family::Special => "special",
            Family::Uncensored => "uncensored",
            Family::Censored => "censored",
            Family::User => "user",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fc2" => Ok(Family::Fc2),
            "ou" => Ok(Family::Ou),
            "num2" => Ok(Family::Num2),
            "special" => Ok(Family::Special),
            "uncensored" => Ok(Family::Uncensored),
            "censored" => Ok(Family::Censored),
            "user" => Ok(Family::User),
            other => Err(format!("unknown pattern family: {other}")),
        }
    }
}

/// 规范化的识别结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recognition {
    /// 大写的最终展示形式
    pub code: String,
    #[serde(rename = "type")]
    pub family: Family,
}

/// 页面上命中的一个番号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeHit {
    pub container: NodeId,
    pub code_field: Option<NodeId>,
    pub family: Family,
}

/// 规范化番号到命中信息的映射, 同号后写覆盖先写
pub type CodeMap = BTreeMap<String, CodeHit>;

/// 链接类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Magnet,
    Ed2k,
}

impl LinkKind {
    /// 依据 href 判定链接类型
    pub fn classify(href: &str) -> Option<Self> {
        if patterns::MAGNET_RE.is_match(href) {
            Some(LinkKind::Magnet)
        } else if patterns::ED2K_RE.is_match(href) {
            Some(LinkKind::Ed2k)
        } else {
            None
        }
    }
}

/// 页面上命中的一个下载链接
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkHit {
    /// 元素的 CSS 路径
    pub element: String,
    pub text: String,
    pub href: String,
    pub kind: Option<LinkKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_round_trip() {
        for f in [
            Family::Fc2,
            Family::Ou,
            Family::Num2,
            Family::Special,
            Family::Uncensored,
            Family::Censored,
            Family::User,
        ] {
            assert_eq!(f.as_str().parse(), Ok(f));
        }
        assert!("mp4".parse::<Family>().is_err());
    }

    #[test]
    fn test_link_classify() {
        assert_eq!(
            LinkKind::classify(
                "magnet:?xt=urn:btih:0123456789abcdef0123456789abcdef01234567"
            ),
            Some(LinkKind::Magnet)
        );
        assert_eq!(
            LinkKind::classify("ed2k://|file|abc.mkv|123|0123456789ABCDEF|/"),
            Some(LinkKind::Ed2k)
        );
        assert_eq!(LinkKind::classify("https://example.com/abc"), None);
    }
}
