//! 策略工厂与站点路由

use once_cell::sync::Lazy;

use crate::dom::Page;
use crate::error::*;
use crate::models::{CodeEntry, ScanReport, Settings};
use crate::traits::Scraper;

/// 策略注册项
#[derive(Clone)]
pub(crate) struct StrategyRegistryItem {
    pub(crate) name: &'static str,
    pub(crate) matches_fn: fn(&str) -> bool,
    pub(crate) creator: fn() -> Result<Box<dyn Scraper>>,
}

/// 站点路由器
pub(crate) struct Router {
    strategies: Vec<StrategyRegistryItem>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            strategies: crate::strategies::registry_items(),
        }
    }

    /// 按声明顺序返回第一个匹配的站点; 匹配器之间并不保证互斥
    pub fn detect(&self, url: &str) -> Option<&StrategyRegistryItem> {
        self.strategies.iter().find(|item| (item.matches_fn)(url))
    }

    /// 为 URL 创建绑定好定位器的策略; 配置错误致命并向上传播
    pub fn route(&self, url: &str) -> Result<Box<dyn Scraper>> {
        match self.detect(url) {
            Some(item) => (item.creator)(),
            None => {
                log::warn!("未找到匹配的站点配置: {url}");
                Err(Error::NoSite(url.to_string()))
            }
        }
    }
}

static ROUTER: Lazy<Router> = Lazy::new(Router::new);

/// 检测 URL 归属的站点名
pub fn detect(url: &str) -> Option<&'static str> {
    ROUTER.detect(url).map(|item| item.name)
}

/// 为 URL 创建对应的刮削策略
pub fn route(url: &str) -> Result<Box<dyn Scraper>> {
    ROUTER.route(url)
}

/// URL 是否受支持: 站点命中, 且路径或页面内容中确实能定位到番号.
/// 只有已知域名而无可识别番号的 URL 报告为不受支持.
pub fn is_supported(url: &str, html: Option<&str>) -> bool {
    let Some(item) = ROUTER.detect(url) else {
        return false;
    };
    if let Some(site) = crate::sites::get(item.name)
        && site.matcher().test_product(url)
    {
        return true;
    }
    let Some(html) = html else {
        return false;
    };
    let Ok(mut strategy) = (item.creator)() else {
        return false;
    };
    let mut page = Page::parse(html);
    !strategy.scan(url, &mut page, &Settings::default()).is_empty()
}

/// 一次完成路由、扫描与链接收集, 汇总交给外壳回放
pub fn scan(url: &str, html: &str, settings: &Settings) -> Result<ScanReport> {
    let mut strategy = route(url)?;
    let mut page = Page::parse(html);

    let found = strategy.scan(url, &mut page, settings);
    let links = if strategy.site().magnet_selector.is_some() {
        strategy.find_links(&page, None)
    } else {
        Vec::new()
    };
    let codes = found
        .iter()
        .map(|(code, hit)| CodeEntry {
            code: code.clone(),
            family: hit.family,
            container: page.css_path(hit.container),
            code_field: hit.code_field.map(|field| page.css_path(field)),
        })
        .collect();

    Ok(ScanReport {
        site: strategy.site().name.to_string(),
        codes,
        links,
        patches: page.take_patches(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_order_and_membership() {
        assert_eq!(detect("https://www.javbus.com/"), Some("javbus"));
        assert_eq!(detect("https://www.javbus.com/page/2"), Some("javbus"));
        // javbus 的 "jav" 片段也能命中这些主机, 但更具体的站点先匹配
        assert_eq!(detect("https://javdb.com/"), Some("javdb"));
        assert_eq!(
            detect("https://www.javlibrary.com/cn/vl_newrelease.php"),
            Some("javlibrary")
        );
        assert_eq!(detect("https://jinjier.art/sql"), Some("jinjier"));
        assert_eq!(detect("https://fc2ppvdb.com/articles/1"), Some("fc2"));
        assert_eq!(detect("https://www.example.com/"), None);
    }

    #[test]
    fn test_route_unknown_is_no_site() {
        match route("https://www.example.com/") {
            Err(Error::NoSite(url)) => assert_eq!(url, "https://www.example.com/"),
            Err(other) => panic!("expected NoSite, got {other}"),
            Ok(_) => panic!("expected NoSite, got a strategy"),
        }
    }

    #[test]
    fn test_is_supported() {
        // 产品 URL 无需页面内容即受支持
        assert!(is_supported("https://www.javbus.com/ABC-123", None));
        // 已知域名但定位不到番号
        assert!(!is_supported("https://www.javbus.com/", None));
        assert!(!is_supported("https://www.example.com/", Some("<html></html>")));

        let listing = r#"
            <html><body>
                <a class="movie-box"><date>ABC-123</date></a>
            </body></html>"#;
        assert!(is_supported("https://www.javbus.com/", Some(listing)));
        assert!(!is_supported(
            "https://www.javbus.com/",
            Some("<html><body>什么都没有</body></html>")
        ));
    }

    #[test]
    fn test_scan_report() {
        let listing = r#"
            <html><body>
                <a class="movie-box"><date>ABC-123</date></a>
                <a class="movie-box"><date>FC2-PPV-1234567</date></a>
            </body></html>"#;
        let report = scan("https://www.javbus.com/", listing, &Settings::default()).unwrap();
        assert_eq!(report.site, "javbus");
        assert_eq!(report.codes.len(), 2);
        assert!(!report.patches.is_empty());
        // 汇总可序列化交给外壳
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("ABC-123"));
    }

    #[test]
    fn test_route_err_debug() {
        // Error 需要可打印, 供外壳日志使用
        let err = route("https://nope.example/").unwrap_err();
        assert!(format!("{err}").contains("no site matched"));
    }
}
