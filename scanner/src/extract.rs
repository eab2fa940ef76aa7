//! 从任意文本中提取规范化番号

use once_cell::sync::Lazy;
use regex::{Captures, Regex, RegexBuilder};

use crate::models::{Family, Recognition};
use crate::patterns::FAMILIES;

// 20xx 开头的日期对, 用于重组
static NUM2_DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"20(\d{2})(\d{4})-(\d+)").unwrap());

/// 从文本中提取规范化番号.
///
/// 用户自定义正则优先于内置目录, 编译失败仅记录日志并回落;
/// 之后按固定优先级遍历模式族, 首个命中者胜. 没有命中不是错误, 返回 None.
pub fn extract(text: &str, user_pattern: Option<&str>) -> Option<Recognition> {
    if let Some(pattern) = user_pattern
        && !pattern.trim().is_empty()
    {
        match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(re) => {
                if let Some(m) = re.find(text) {
                    return Some(Recognition {
                        code: m.as_str().to_uppercase(),
                        family: Family::User,
                    });
                }
            }
            Err(e) => log::error!("用户正则表达式错误: {e}"),
        }
    }

    for family in FAMILIES {
        // 噪声过滤: 评估到合集日期族时遇到 -sample, 整个文本判定无番号
        if family.family == Family::Ou && text.contains("-sample") {
            return None;
        }

        for pattern in family.patterns {
            if let Some(caps) = pattern.captures(text) {
                return normalize(family.family, &caps);
            }
        }
    }

    None
}

fn normalize(family: Family, caps: &Captures<'_>) -> Option<Recognition> {
    let whole = caps.get(0)?.as_str();
    let code = match family {
        Family::Fc2 => format!("FC2-{}", caps.get(1)?.as_str()),
        Family::Ou => whole.to_string(),
        Family::Num2 => {
            // 丢弃年代前缀 20, 余下数字组以 MMDD+YY 重组: 20210710-001 -> 071021-001
            if let Some(date) = NUM2_DATE_RE.captures(whole) {
                format!("{}{}-{}", &date[2], &date[1], &date[3])
            } else {
                whole.to_string()
            }
        }
        Family::Uncensored => format!("{}{}", caps.get(1)?.as_str(), caps.get(2)?.as_str()),
        _ => {
            if let (Some(g1), Some(g2)) = (caps.get(1), caps.get(2)) {
                format!("{}-{}", g1.as_str(), g2.as_str())
            } else {
                whole.to_string()
            }
        }
    };

    if code.is_empty() {
        return None;
    }
    Some(Recognition {
        code: code.to_uppercase(),
        family,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_of(text: &str) -> Option<(String, Family)> {
        extract(text, None).map(|r| (r.code, r.family))
    }

    #[test]
    fn test_fc2() {
        assert_eq!(
            code_of("FC2-PPV-1234567"),
            Some(("FC2-1234567".to_string(), Family::Fc2))
        );
        assert_eq!(
            code_of("fc2 1234567"),
            Some(("FC2-1234567".to_string(), Family::Fc2))
        );
        assert_eq!(
            code_of("fc2ppv_1234567"),
            Some(("FC2-1234567".to_string(), Family::Fc2))
        );
    }

    #[test]
    fn test_ou() {
        assert_eq!(
            code_of("Sexart.21.04.03"),
            Some(("SEXART.21.04.03".to_string(), Family::Ou))
        );
    }

    #[test]
    fn test_num2_regroup() {
        assert_eq!(
            code_of("20210710-001"),
            Some(("071021-001".to_string(), Family::Num2))
        );
        // 不满足年代前缀形状的原样通过
        assert_eq!(
            code_of("0710-001"),
            Some(("0710-001".to_string(), Family::Num2))
        );
    }

    #[test]
    fn test_num2_date_tail_rejected() {
        // "-" 加两位数字的尾巴是日期而不是编号
        assert_eq!(code_of("1234-56-78"), None);
    }

    #[test]
    fn test_special() {
        assert_eq!(
            code_of("T28-123"),
            Some(("T28-123".to_string(), Family::Special))
        );
        assert_eq!(
            code_of("91cm-109"),
            Some(("91CM-109".to_string(), Family::Special))
        );
    }

    #[test]
    fn test_uncensored_concat() {
        assert_eq!(
            code_of("n1234"),
            Some(("N1234".to_string(), Family::Uncensored))
        );
        assert_eq!(code_of("n1234.com"), None);
    }

    #[test]
    fn test_censored() {
        assert_eq!(
            code_of("ABC-123"),
            Some(("ABC-123".to_string(), Family::Censored))
        );
        assert_eq!(
            code_of("[HD] abc _ 00123"),
            Some(("ABC-00123".to_string(), Family::Censored))
        );
        // 宽松形式: 无分隔符, 补零吞掉, 画质后缀丢弃
        assert_eq!(
            code_of("abc00123hd"),
            Some(("ABC-123".to_string(), Family::Censored))
        );
        assert_eq!(
            code_of("300MIUM-001"),
            Some(("MIUM-001".to_string(), Family::Censored))
        );
        assert_eq!(code_of("abc-123.com"), None);
        assert_eq!(code_of("vip-123"), None);
    }

    #[test]
    fn test_sample_veto() {
        // -sample 否决赢过任何低优先级模式族
        assert_eq!(code_of("ABC-123-sample"), None);
        // fc2 优先级在否决之前
        assert_eq!(
            code_of("fc2-1234567-sample"),
            Some(("FC2-1234567".to_string(), Family::Fc2))
        );
    }

    #[test]
    fn test_user_override() {
        let got = extract("xy789 ABC-123", Some("XY\\d+")).unwrap();
        assert_eq!(got.code, "XY789");
        assert_eq!(got.family, Family::User);
    }

    #[test]
    fn test_user_override_invalid_falls_through() {
        let got = extract("xy789 ABC-123", Some("([")).unwrap();
        assert_eq!(got.code, "ABC-123");
        assert_eq!(got.family, Family::Censored);
    }

    #[test]
    fn test_no_match_is_none() {
        assert_eq!(code_of(""), None);
        assert_eq!(code_of("hello world"), None);
    }

    #[test]
    fn test_idempotent() {
        for text in ["FC2-PPV-1234567", "20210710-001", "ABC-123-sample", "xy"] {
            assert_eq!(extract(text, None), extract(text, None));
            assert_eq!(extract(text, Some("XY\\d+")), extract(text, Some("XY\\d+")));
        }
    }
}
