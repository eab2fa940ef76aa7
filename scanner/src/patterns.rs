//! 番号与链接的正则库

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::models::Family;
use crate::utils;

// fc2 番号, "fc"/"fc2" 前缀加 6-8 位数字, 允许 ppv 中缀
static FC2_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)fc2?\s*[-_]?\s*(?:ppv)?\s*[-_]?\s*(\d{6,8})").unwrap());

// 合集日期后缀, 如 sexart.21.04.03
static OU_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)[a-z\d-]+(?:\.\d{2}){3}").unwrap());

// 日期-编号对, 如 20210710-001
static NUM2_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d{4,8})[-_](\d{2,4})").unwrap());

// 特殊厂牌前缀
static SPECIAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(s2mbd|t28|t|t38|\d{2}id|mcb3dbd|sm3d2dbd|s2mcr|s2m|91cm|spermmania|fellatiojapan|handjobjapan|cw3d2dbd|mk3d2dbd)[-_](\d{2,6})",
    )
    .unwrap()
});

// 无码, 单字母加 3-6 位数字
static UNCENSORED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)([nk])(\d{3,6})").unwrap());

// 有码, 严格形式: 字母-数字必须带分隔符
static CENSORED_STRICT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([a-z]{2,9})\s*[-_]\s*(s*\d{2,6})").unwrap());

// 有码, 宽松形式: 分隔符可缺省或为补零, 容忍画质后缀
static CENSORED_LOOSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([a-z]{3,9})\s*(?:[-_]|0*)?\s*(s*\d{3,6})(hhb\d?|mhb\d?|hd\d?|pl|ps)?")
        .unwrap()
});

/// 磁力链接
pub static MAGNET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)magnet:\?xt=urn:btih:(?:[\da-f]{40}|[2-7a-z]{32})").unwrap());

/// ed2k 链接
pub static ED2K_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)ed2k://(?:\|.+)+\|/").unwrap());

/// 体积表达式, 整段匹配, 如 "1.5 GB"
pub static FILE_SIZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(\d+(?:\.\d+)?)\s*([KMGTPE]?B)\s*$").unwrap());

/// 体积表达式, 嵌在任意文本中
pub static SIZE_IN_TEXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*([KMGTPE]?B)\b").unwrap());

/// 匹配起点的边界规则.
///
/// `regex` 不支持环视, 原始模式中的 lookbehind 在这里显式建模,
/// 由 [`CodePattern::captures`] 在候选匹配上逐个检查.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lead {
    /// 任意位置
    Any,
    /// 前一个字符不能是字母或数字
    NotAlnum,
    /// 行首、非字母数字字符之后, 或本身处于边界上的三位数字之后 (如 300mium-001)
    CensoredBoundary,
}

/// 匹配终点的边界规则, lookahead 的显式形式
#[derive(Debug, Clone, Copy)]
pub struct Tail {
    /// 后一个字符不能是字母或数字
    pub no_alnum: bool,
    /// 后一个字符不能是数字
    pub no_digit: bool,
    /// 后面不能紧跟 ".com"
    pub no_dot_com: bool,
    /// 后面不能紧跟 "-" 加两位以上数字
    pub no_date_pair: bool,
}

const TAIL_ANY: Tail = Tail {
    no_alnum: false,
    no_digit: false,
    no_dot_com: false,
    no_date_pair: false,
};

const TAIL_WORD_END: Tail = Tail {
    no_alnum: true,
    no_digit: false,
    no_dot_com: true,
    no_date_pair: false,
};

const TAIL_NO_DIGIT: Tail = Tail {
    no_alnum: false,
    no_digit: true,
    no_dot_com: true,
    no_date_pair: false,
};

const TAIL_NO_DATE_PAIR: Tail = Tail {
    no_alnum: false,
    no_digit: false,
    no_dot_com: false,
    no_date_pair: true,
};

/// 一个带边界规则的番号模式
pub struct CodePattern {
    pub regex: &'static Lazy<Regex>,
    pub lead: Lead,
    pub tail: Tail,
    /// 匹配起点不能是这些词且后随非字母字符 (过滤 vip/top/com 噪声)
    pub forbid_heads: &'static [&'static str],
}

impl CodePattern {
    /// 在文本中查找首个满足边界规则的匹配.
    ///
    /// 候选匹配不满足边界时从下一个字符边界继续查找,
    /// 与原始环视模式的求值结果一致.
    pub fn captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        let mut at = 0;
        while at <= text.len() {
            let caps = self.regex.captures_at(text, at)?;
            let whole = caps.get(0).expect("group 0 always present");
            if self.boundary_ok(text, whole.start(), whole.end()) {
                return Some(caps);
            }
            at = utils::ceil_char_boundary(text, whole.start() + 1);
        }
        None
    }

    fn boundary_ok(&self, text: &str, start: usize, end: usize) -> bool {
        match self.lead {
            Lead::Any => {}
            Lead::NotAlnum => {
                if let Some(prev) = text[..start].chars().next_back()
                    && prev.is_ascii_alphanumeric()
                {
                    return false;
                }
            }
            Lead::CensoredBoundary => {
                if !censored_boundary(text, start) {
                    return false;
                }
            }
        }

        let rest = &text[start..];
        for head in self.forbid_heads {
            if let Some(prefix) = rest.get(..head.len())
                && prefix.eq_ignore_ascii_case(head)
                && let Some(next) = rest[head.len()..].chars().next()
                && !next.is_ascii_alphabetic()
            {
                return false;
            }
        }

        let tail = &text[end..];
        let next = tail.chars().next();
        if self.tail.no_alnum
            && let Some(c) = next
            && c.is_ascii_alphanumeric()
        {
            return false;
        }
        if self.tail.no_digit
            && let Some(c) = next
            && c.is_ascii_digit()
        {
            return false;
        }
        if self.tail.no_dot_com
            && let Some(prefix) = tail.get(..4)
            && prefix.eq_ignore_ascii_case(".com")
        {
            return false;
        }
        if self.tail.no_date_pair {
            let bytes = tail.as_bytes();
            if bytes.len() >= 3
                && bytes[0] == b'-'
                && bytes[1].is_ascii_digit()
                && bytes[2].is_ascii_digit()
            {
                return false;
            }
        }
        true
    }
}

/// 有码番号的起点边界: 行首、非字母数字字符, 或紧跟在一段
/// 本身处于边界上的三位数字之后
pub(crate) fn censored_boundary(text: &str, p: usize) -> bool {
    if p == 0 {
        return true;
    }
    let Some(prev) = text[..p].chars().next_back() else {
        return true;
    };
    if !prev.is_ascii_alphanumeric() {
        return true;
    }
    let bytes = text.as_bytes();
    if p >= 3
        && bytes[p - 1].is_ascii_digit()
        && bytes[p - 2].is_ascii_digit()
        && bytes[p - 3].is_ascii_digit()
    {
        if p == 3 {
            return true;
        }
        return text[..p - 3]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_ascii_alphanumeric());
    }
    false
}

/// 一个模式族: 族标识加按序尝试的候选模式
pub struct FamilyPatterns {
    pub family: Family,
    pub patterns: &'static [CodePattern],
}

/// 模式族目录, 固定优先级, 先匹配者胜.
///
/// 运行期绝不重排; 用户自定义正则在该目录之前单独检查.
pub static FAMILIES: &[FamilyPatterns] = &[
    FamilyPatterns {
        family: Family::Fc2,
        patterns: &[CodePattern {
            regex: &FC2_RE,
            lead: Lead::NotAlnum,
            tail: TAIL_ANY,
            forbid_heads: &[],
        }],
    },
    FamilyPatterns {
        family: Family::Ou,
        patterns: &[CodePattern {
            regex: &OU_RE,
            lead: Lead::Any,
            tail: TAIL_ANY,
            forbid_heads: &[],
        }],
    },
    FamilyPatterns {
        family: Family::Num2,
        patterns: &[CodePattern {
            regex: &NUM2_RE,
            lead: Lead::NotAlnum,
            tail: TAIL_NO_DATE_PAIR,
            forbid_heads: &[],
        }],
    },
    FamilyPatterns {
        family: Family::Special,
        patterns: &[CodePattern {
            regex: &SPECIAL_RE,
            lead: Lead::NotAlnum,
            tail: TAIL_WORD_END,
            forbid_heads: &[],
        }],
    },
    FamilyPatterns {
        family: Family::Uncensored,
        patterns: &[CodePattern {
            regex: &UNCENSORED_RE,
            lead: Lead::NotAlnum,
            tail: TAIL_WORD_END,
            forbid_heads: &[],
        }],
    },
    FamilyPatterns {
        family: Family::Censored,
        patterns: &[
            CodePattern {
                regex: &CENSORED_STRICT_RE,
                lead: Lead::CensoredBoundary,
                tail: TAIL_NO_DIGIT,
                forbid_heads: &["vip", "top", "com"],
            },
            CodePattern {
                regex: &CENSORED_LOOSE_RE,
                lead: Lead::CensoredBoundary,
                tail: TAIL_WORD_END,
                forbid_heads: &["vip", "top", "com"],
            },
        ],
    },
];

/// 展平所有模式族的正则源码, 供 URL 产品表达式组合使用
pub fn product_pattern_sources() -> Vec<&'static str> {
    FAMILIES
        .iter()
        .flat_map(|family| family.patterns.iter().map(|p| p.regex.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_censored_boundary() {
        assert!(censored_boundary("abc-123", 0));
        assert!(censored_boundary("[abc-123]", 1));
        assert!(censored_boundary("300mium-001", 3));
        assert!(censored_boundary("_300mium-001", 4));
        assert!(!censored_boundary("1300mium-001", 4));
        assert!(!censored_boundary("xabc-123", 1));
    }

    #[test]
    fn test_forbid_heads() {
        let pattern = &FAMILIES[5].patterns[0];
        assert!(pattern.captures("vip-123").is_none());
        assert!(pattern.captures("top-456").is_none());
        // 词后是字母则不算噪声词
        assert!(pattern.captures("viper-123").is_some());
    }

    #[test]
    fn test_dot_com_tail() {
        let pattern = &FAMILIES[4].patterns[0];
        assert!(pattern.captures("n1234").is_some());
        assert!(pattern.captures("n1234.com").is_none());
    }

    #[test]
    fn test_product_pattern_sources() {
        let sources = product_pattern_sources();
        // 两个有码候选模式都要被展平进去
        assert_eq!(sources.len(), 7);
    }
}
