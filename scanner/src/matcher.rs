//! 站点 URL 模式匹配器

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::patterns;

// 拆出 URL 的路径部分
static URL_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^/?#]+(/[^?#]*)?(?:[?#].*)?$").unwrap());

/// 匹配器配置
#[derive(Debug, Clone)]
pub struct MatcherOptions {
    pub require_tld: bool,
    pub allow_subdomains: bool,
    pub tld_min_length: usize,
    pub tld_max_length: usize,
    pub protocol: String,
    pub case_insensitive: bool,
    /// 语言/区域路径前缀, 如 "cn"
    pub path_prefix: String,
    /// 是否把番号模式库并入产品表达式
    pub include_code_patterns: bool,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            require_tld: true,
            allow_subdomains: true,
            tld_min_length: 2,
            tld_max_length: 10,
            protocol: "https".to_string(),
            case_insensitive: true,
            path_prefix: String::new(),
            include_code_patterns: true,
        }
    }
}

/// 由声明式片段组合的站点 URL 匹配器.
///
/// 三层各自独立: 域名子串、路径形状、产品模式 (番号出现在路径中).
/// 主机与路径之间为与, 各路径备选之间为或. 四个派生正则整体缓存,
/// 任何配置变更都全量原子重建, 从不增量修补.
#[derive(Debug)]
pub struct UrlPatternMatcher {
    domain_patterns: Vec<String>,
    path_patterns: Vec<String>,
    product_patterns: Vec<String>,
    options: MatcherOptions,
    host_re: Regex,
    path_re: Regex,
    /// None 表示永不匹配 (产品层为空时的保护值)
    product_re: Option<Regex>,
    url_re: Regex,
}

impl UrlPatternMatcher {
    pub fn new(
        domain_patterns: Vec<String>,
        path_patterns: Vec<String>,
        product_patterns: Vec<String>,
        options: MatcherOptions,
    ) -> Self {
        let (host_re, path_re, product_re, url_re) =
            build_all(&domain_patterns, &path_patterns, &product_patterns, &options);
        Self {
            domain_patterns,
            path_patterns,
            product_patterns,
            options,
            host_re,
            path_re,
            product_re,
            url_re,
        }
    }

    /// 完整的站点归属测试
    pub fn test(&self, url: &str) -> bool {
        self.url_re.is_match(url)
    }

    pub fn test_host(&self, url: &str) -> bool {
        self.host_re.is_match(url)
    }

    pub fn test_path(&self, url: &str) -> bool {
        match split_path(url) {
            Some(path) => self.path_re.is_match(path),
            None => false,
        }
    }

    /// 页面路径本身是否携带番号 (单品页而非列表页)
    pub fn test_product(&self, url: &str) -> bool {
        let Some(product_re) = &self.product_re else {
            return false;
        };
        match split_path(url) {
            Some(path) => product_re.is_match(path),
            None => false,
        }
    }

    pub fn update_domain_patterns(&mut self, domain_patterns: Vec<String>) -> &mut Self {
        self.domain_patterns = domain_patterns;
        self.rebuild();
        self
    }

    pub fn update_path_patterns(&mut self, path_patterns: Vec<String>) -> &mut Self {
        self.path_patterns = path_patterns;
        self.rebuild();
        self
    }

    pub fn update_product_patterns(&mut self, product_patterns: Vec<String>) -> &mut Self {
        self.product_patterns = product_patterns;
        self.rebuild();
        self
    }

    pub fn update_path_prefix(&mut self, path_prefix: impl Into<String>) -> &mut Self {
        self.options.path_prefix = path_prefix.into();
        self.rebuild();
        self
    }

    // 全量重建四个派生正则, 先算后换
    fn rebuild(&mut self) {
        let (host_re, path_re, product_re, url_re) = build_all(
            &self.domain_patterns,
            &self.path_patterns,
            &self.product_patterns,
            &self.options,
        );
        self.host_re = host_re;
        self.path_re = path_re;
        self.product_re = product_re;
        self.url_re = url_re;
    }
}

fn split_path(url: &str) -> Option<&str> {
    let caps = URL_SPLIT_RE.captures(url)?;
    Some(caps.get(1).map_or("/", |m| m.as_str()))
}

fn build_all(
    domain_patterns: &[String],
    path_patterns: &[String],
    product_patterns: &[String],
    options: &MatcherOptions,
) -> (Regex, Regex, Option<Regex>, Regex) {
    let host_body = host_body(domain_patterns, options);
    let path_body = path_body(path_patterns, options);
    let product_body = product_body(product_patterns, options);

    let host_re = compile(&format!("^{host_body}"), options);
    // 独立子测试作用在抽出的路径串上, 必须锚定起点;
    // 完整表达式里由主机部分提供起点锚
    let path_re = compile(&format!("^{path_body}"), options);
    let product_re = product_body
        .as_deref()
        .map(|body| compile(&format!("^{body}"), options));

    let url_body = match &product_body {
        Some(product) => format!("(?:{path_body}|{product})"),
        None => format!("(?:{path_body})"),
    };
    let url_re = compile(&format!("^{host_body}{url_body}"), options);

    (host_re, path_re, product_re, url_re)
}

fn compile(body: &str, options: &MatcherOptions) -> Regex {
    let flag = if options.case_insensitive { "(?i)" } else { "" };
    // 片段全部经过转义, 组合失败属于实现缺陷
    Regex::new(&format!("{flag}{body}")).expect("composed url pattern must compile")
}

fn host_body(domain_patterns: &[String], options: &MatcherOptions) -> String {
    let protocol = &options.protocol;
    let (tld_min, tld_max) = (options.tld_min_length, options.tld_max_length);

    if domain_patterns.is_empty() {
        // 没有域名片段时匹配任何语法合法的主机
        return format!(
            "{protocol}://(www\\.)?[a-zA-Z0-9][a-zA-Z0-9-]*\\.[a-zA-Z]{{{tld_min},{tld_max}}}"
        );
    }

    let escaped: Vec<String> = domain_patterns
        .iter()
        .map(|pattern| regex::escape(pattern))
        .collect();
    let domain_part = format!("([a-zA-Z0-9-]*?(?:{})[a-zA-Z0-9-]*?)", escaped.join("|"));
    let tld_part = if options.require_tld {
        format!("\\.[a-zA-Z]{{{tld_min},{tld_max}}}")
    } else {
        "(?:\\.[a-zA-Z]{2,10})?".to_string()
    };
    let www = if options.allow_subdomains {
        "(www\\.)?"
    } else {
        ""
    };

    format!("{protocol}://{www}{domain_part}{tld_part}")
}

fn path_body(path_patterns: &[String], options: &MatcherOptions) -> String {
    if path_patterns.is_empty() {
        // 没有路径片段时匹配任何路径
        return "(?:/[^?#]*)?(?:[?#].*)?$".to_string();
    }

    let alternatives: Vec<String> = path_patterns
        .iter()
        .map(|pattern| path_alternative(pattern, options))
        .collect();
    format!("(?:{})(?:[?#].*)?$", alternatives.join("|"))
}

// 单个路径片段编译成一个备选分支
fn path_alternative(pattern: &str, options: &MatcherOptions) -> String {
    let prefix = if options.path_prefix.is_empty() {
        String::new()
    } else {
        format!("/{}", regex::escape(&options.path_prefix))
    };

    // 站点根
    if pattern.is_empty() {
        return format!("{prefix}/?$");
    }

    // 分页
    if pattern == "page" {
        return format!("{prefix}/page/\\d+");
    }

    // 动态参数, 如 genre/:id
    if pattern.contains(':') {
        let compiled: Vec<String> = pattern
            .split('/')
            .filter(|part| !part.is_empty())
            .map(|part| {
                if part.starts_with(':') {
                    "[^/?#]+".to_string()
                } else {
                    regex::escape(part)
                }
            })
            .collect();
        return format!("{prefix}/{}(?:/[^/?#]*)?", compiled.join("/"));
    }

    let escaped = regex::escape(pattern);

    // php 页面允许查询串和片段
    if pattern.contains(".php") {
        return format!("{prefix}/{escaped}(?:[?#].*)?$");
    }

    // 默认: 转义字面量, 允许一个尾随子路径
    format!("{prefix}/{escaped}(?:/[^/?#]*)?")
}

fn product_body(product_patterns: &[String], options: &MatcherOptions) -> Option<String> {
    let mut sources: Vec<&str> = product_patterns.iter().map(String::as_str).collect();
    if options.include_code_patterns {
        sources.extend(patterns::product_pattern_sources());
    }
    if sources.is_empty() {
        // 保护值: 产品层为空时永不匹配, 而不是匹配一切
        return None;
    }

    let prefix = if options.path_prefix.is_empty() {
        String::new()
    } else {
        format!("/{}", regex::escape(&options.path_prefix))
    };
    let alternatives: Vec<String> = sources
        .iter()
        .map(|source| {
            if prefix.is_empty() {
                format!("/(?:{source})(?:/?)?")
            } else {
                format!("{prefix}/?(?:{source})(?:/?)?")
            }
        })
        .collect();
    Some(format!("(?:{})(?:[?#].*)?$", alternatives.join("|")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(domains: &[&str], paths: &[&str]) -> UrlPatternMatcher {
        UrlPatternMatcher::new(
            domains.iter().map(|s| s.to_string()).collect(),
            paths.iter().map(|s| s.to_string()).collect(),
            vec![],
            MatcherOptions::default(),
        )
    }

    #[test]
    fn test_root_only_membership() {
        let m = matcher(&["bus", "jav"], &[""]);
        assert!(m.test("https://www.javbus.com/"));
        assert!(m.test("https://javbus.com"));
        assert!(!m.test("https://www.javbus.com/some/unlisted/path"));
        assert!(!m.test("https://www.example.com/"));
    }

    #[test]
    fn test_layers() {
        let m = matcher(&["bus", "jav"], &["", "page", "star/:id"]);
        assert!(m.test_host("https://www.javbus.com/anything"));
        assert!(!m.test_host("https://www.example.com/"));
        assert!(m.test_path("https://www.javbus.com/page/12"));
        assert!(m.test_path("https://www.javbus.com/star/abc123"));
        assert!(m.test_path("https://www.javbus.com/star/abc123/2"));
        assert!(!m.test_path("https://www.javbus.com/director/xyz"));
    }

    #[test]
    fn test_product_layer() {
        let m = matcher(&["bus", "jav"], &[""]);
        // 番号在路径中: 单品页
        assert!(m.test_product("https://www.javbus.com/ABC-123"));
        assert!(m.test("https://www.javbus.com/ABC-123"));
        assert!(!m.test_product("https://www.javbus.com/star/abc"));
    }

    #[test]
    fn test_product_guard_never_matches() {
        let mut options = MatcherOptions::default();
        options.include_code_patterns = false;
        let m = UrlPatternMatcher::new(
            vec!["bus".to_string()],
            vec![String::new()],
            vec![],
            options,
        );
        assert!(!m.test_product("https://www.javbus.com/ABC-123"));
        assert!(!m.test("https://www.javbus.com/ABC-123"));
        assert!(m.test("https://www.javbus.com/"));
    }

    #[test]
    fn test_mutators_rebuild() {
        let mut m = matcher(&["bus", "jav"], &[""]);
        assert!(!m.test("https://www.javbus.com/some/unlisted/path"));
        m.update_path_patterns(vec![String::new(), "some/:a/:b".to_string()]);
        assert!(m.test("https://www.javbus.com/some/unlisted/path"));
        m.update_domain_patterns(vec!["example".to_string()]);
        assert!(!m.test("https://www.javbus.com/"));
        assert!(m.test("https://www.example.com/"));
    }

    #[test]
    fn test_path_prefix_injection() {
        let mut m = matcher(&["javlibrary"], &["", "vl_searchbyid.php"]);
        assert!(m.test("https://www.javlibrary.com/"));
        m.update_path_prefix("cn");
        assert!(m.test("https://www.javlibrary.com/cn/"));
        assert!(m.test("https://www.javlibrary.com/cn"));
        assert!(m.test("https://www.javlibrary.com/cn/vl_searchbyid.php?keyword=abc"));
        assert!(!m.test("https://www.javlibrary.com/"));
        assert!(!m.test("https://www.javlibrary.com/vl_searchbyid.php"));
    }

    #[test]
    fn test_empty_layers_match_anything_reasonable() {
        let m = matcher(&[], &[]);
        assert!(m.test("https://whatever.example/any/path?q=1"));
        assert!(m.test_host("https://whatever.example/"));
    }

    #[test]
    fn test_literal_escaping() {
        let m = matcher(&["jin"], &["sql(raw)"]);
        assert!(m.test("https://jinjier.art/sql(raw)"));
        assert!(!m.test("https://jinjier.art/sqlXrawY"));
    }

    #[test]
    fn test_case_insensitive() {
        let m = matcher(&["bus"], &[""]);
        assert!(m.test("HTTPS://WWW.JAVBUS.COM/"));
    }
}
