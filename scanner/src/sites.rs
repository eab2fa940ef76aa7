//! 站点注册表

use once_cell::sync::Lazy;
use scraper::Selector;
use ego_tree::NodeId;

use crate::dom::Page;
use crate::matcher::{MatcherOptions, UrlPatternMatcher};

/// 合成定位器: 从容器中提取或合成番号文本, 返回番号字段节点与文本.
/// 允许向页面写入 (原地改写显示文本、缓存合成结果).
pub type SynthesizeFn = fn(&mut Page, NodeId) -> Option<(NodeId, String)>;

/// 番号定位方式: 子元素选择器, 或合成函数
pub enum CodeLocator {
    Selector(&'static str),
    Synthesize(SynthesizeFn),
}

/// 一个受支持站点的声明式描述
pub struct SiteDefinition {
    pub name: &'static str,
    /// 列表页上重复出现的结果容器
    pub container_selector: &'static str,
    pub code_locator: CodeLocator,
    pub magnet_selector: Option<&'static str>,
    matcher: UrlPatternMatcher,
}

impl SiteDefinition {
    pub fn new(
        name: &'static str,
        container_selector: &'static str,
        code_locator: CodeLocator,
        magnet_selector: Option<&'static str>,
        matcher: UrlPatternMatcher,
    ) -> Self {
        Self {
            name,
            container_selector,
            code_locator,
            magnet_selector,
            matcher,
        }
    }

    pub fn matcher(&self) -> &UrlPatternMatcher {
        &self.matcher
    }
}

fn site_matcher(
    domains: &[&str],
    paths: &[&str],
    products: &[&str],
    path_prefix: &str,
) -> UrlPatternMatcher {
    let options = MatcherOptions {
        path_prefix: path_prefix.to_string(),
        ..MatcherOptions::default()
    };
    UrlPatternMatcher::new(
        domains.iter().map(|s| s.to_string()).collect(),
        paths.iter().map(|s| s.to_string()).collect(),
        products.iter().map(|s| s.to_string()).collect(),
        options,
    )
}

// jinjier 结果行: 第三个单元格的首个空白分隔词
fn jinjier_cell_code(page: &mut Page, container: NodeId) -> Option<(NodeId, String)> {
    let Ok(cell_selector) = Selector::parse("td:nth-of-type(3)") else {
        return None;
    };
    let cell = page.first_in(container, &cell_selector)?;
    let text = page.text(cell);
    let code = text.split_whitespace().next()?.to_string();
    Some((cell, code))
}

// fc2ppvdb 卡片: 缩略图后的 span; 裸数字 id 原地改写为 fc2- 前缀,
// 改写后的文本即事实来源
fn fc2_span_code(page: &mut Page, container: NodeId) -> Option<(NodeId, String)> {
    let Ok(primary) = Selector::parse(".lazyload-wrapper + span") else {
        return None;
    };
    let Ok(fallback) = Selector::parse("a.block + span") else {
        return None;
    };
    let span = page
        .first_in(container, &primary)
        .or_else(|| page.first_in(container, &fallback))?;
    let code = page.text(span).trim().to_string();
    if code.is_empty() {
        return None;
    }
    if !code.starts_with("fc2") {
        let prefixed = format!("fc2-{code}");
        page.set_text(span, &prefixed);
        return Some((span, prefixed));
    }
    Some((span, code))
}

/// 站点注册表, 声明顺序即路由顺序.
///
/// javbus 的域名片段最为宽泛 ("jav" 会命中 javdb/javlibrary 的主机),
/// 因此放在最后; 前面的站点先于它完成匹配.
pub static SITES: Lazy<Vec<SiteDefinition>> = Lazy::new(|| {
    vec![
        SiteDefinition::new(
            "javlibrary",
            ".video",
            CodeLocator::Selector(".id"),
            None,
            site_matcher(
                &["javlibrary"],
                &[
                    "",
                    "vl_update.php",
                    "vl_newrelease.php",
                    "vl_newentries.php",
                    "vl_mostwanted.php",
                    "vl_bestrated.php",
                    "vl_searchbyid.php",
                    "vl_star.php",
                    "vl_label.php",
                    "vl_maker.php",
                    "vl_genre.php",
                ],
                &[],
                "cn",
            ),
        ),
        SiteDefinition::new(
            "javdb",
            ".movie-list .item",
            CodeLocator::Selector(".video-title strong"),
            None,
            site_matcher(
                &["javdb"],
                &[
                    "",
                    "censored",
                    "uncensored",
                    "western",
                    "search",
                    "tags",
                    "rankings",
                    "actors/:id",
                    "makers/:id",
                    "series/:id",
                ],
                &[],
                "",
            ),
        ),
        SiteDefinition::new(
            "jinjier",
            "tbody tr",
            CodeLocator::Synthesize(jinjier_cell_code),
            None,
            site_matcher(&["jinjier"], &["sql"], &[], ""),
        ),
        SiteDefinition::new(
            "fc2",
            ".flex section .container .relative",
            CodeLocator::Synthesize(fc2_span_code),
            None,
            site_matcher(&["fc2ppvdb"], &[], &[], ""),
        ),
        SiteDefinition::new(
            "javbus",
            "a.movie-box",
            CodeLocator::Selector("date"),
            Some("#magnet-table tr"),
            site_matcher(
                &["bus", "jav", "javbus"],
                &[
                    "",
                    "page",
                    "search",
                    "uncensored",
                    "genre/:id",
                    "star/:id",
                    "label/:id",
                    "director/:id",
                    "studio/:id",
                    "series/:id",
                ],
                &[r"[a-zA-Z]{2,}-\d+"],
                "",
            ),
        ),
    ]
});

/// 按声明顺序迭代注册表
pub fn registry() -> &'static [SiteDefinition] {
    &SITES
}

/// 按站点名查找
pub fn get(name: &str) -> Option<&'static SiteDefinition> {
    SITES.iter().find(|site| site.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order() {
        let names: Vec<_> = registry().iter().map(|site| site.name).collect();
        assert_eq!(names, vec!["javlibrary", "javdb", "jinjier", "fc2", "javbus"]);
    }

    #[test]
    fn test_site_matchers() {
        assert!(get("javbus").unwrap().matcher().test("https://www.javbus.com/"));
        assert!(get("javbus").unwrap().matcher().test("https://www.javbus.com/page/3"));
        assert!(get("javbus").unwrap().matcher().test_product("https://www.javbus.com/ABC-123"));
        assert!(get("javdb").unwrap().matcher().test("https://javdb.com/search?q=abc&t=western"));
        assert!(
            get("javlibrary")
                .unwrap()
                .matcher()
                .test("https://www.javlibrary.com/cn/vl_searchbyid.php?keyword=abc")
        );
        assert!(!get("javlibrary").unwrap().matcher().test("https://www.javlibrary.com/en/"));
        assert!(get("jinjier").unwrap().matcher().test("https://jinjier.art/sql"));
        assert!(get("fc2").unwrap().matcher().test("https://fc2ppvdb.com/articles/123"));
    }

    #[test]
    fn test_jinjier_cell_code() {
        let mut page = Page::parse(
            r#"<table><tbody><tr>
                <td>1</td><td>2021-07-10</td><td>ABC-123 some title</td>
            </tr></tbody></table>"#,
        );
        let row = page.select(&Selector::parse("tbody tr").unwrap())[0];
        let (cell, code) = jinjier_cell_code(&mut page, row).unwrap();
        assert_eq!(code, "ABC-123");
        assert_eq!(page.text(cell).trim(), "ABC-123 some title");
    }

    #[test]
    fn test_fc2_span_rewrite() {
        let mut page = Page::parse(
            r##"<div class="flex"><section><div class="container">
                <div class="relative">
                    <div class="lazyload-wrapper"></div><span>1234567</span>
                </div>
                <div class="relative">
                    <a class="block" href="#">x</a><span>fc2-7654321</span>
                </div>
            </div></section></div>"##,
        );
        let cards = page.select(&Selector::parse(".relative").unwrap());

        let (span, code) = fc2_span_code(&mut page, cards[0]).unwrap();
        assert_eq!(code, "fc2-1234567");
        // 裸 id 被原地改写, 改写结果可重读
        assert_eq!(page.text(span), "fc2-1234567");
        assert_eq!(page.patch_count(), 1);

        let (_, code) = fc2_span_code(&mut page, cards[1]).unwrap();
        assert_eq!(code, "fc2-7654321");
        // 已带前缀的不再改写
        assert_eq!(page.patch_count(), 1);
    }
}
