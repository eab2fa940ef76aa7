//! 用户脚本外壳的运行时边界

#![allow(dead_code)]

use std::collections::HashSet;

use scanner::Scraper;
use scanner::dom::Page;
use scanner::error;
use scanner::models::{CodeEntry, LinkHit, ScanReport, Settings};
use serde::{Deserialize, Serialize};

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

/// 调用扫描后返回给 JS 的输出
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanOutput {
    pub success: bool,
    pub error: Option<String>,
    pub report: Option<ScanReport>,
}

impl ScanOutput {
    fn failure(message: String) -> Self {
        ScanOutput {
            success: false,
            error: Some(message),
            report: None,
        }
    }
}

impl From<error::Result<ScanReport>> for ScanOutput {
    fn from(res: error::Result<ScanReport>) -> Self {
        match res {
            Ok(report) => ScanOutput {
                success: true,
                error: None,
                report: Some(report),
            },
            // 无站点命中与配置错误都降级为失败输出, 不向外壳抛出
            Err(e) => ScanOutput::failure(format!("{e}")),
        }
    }
}

/// 扫描页面并汇总
pub fn scan_page(settings: &Settings, url: &str, html: &str) -> ScanOutput {
    if let Err(e) = url::Url::parse(url) {
        return ScanOutput::failure(format!("无效的URL: {e}"));
    }
    scanner::scan(url, html, settings).into()
}

/// 扫描并对照媒体库番号集: 已入库的作品打标并高亮,
/// 按配置隐藏合集作品, 链接按体积阈值过滤.
pub fn annotate_page(
    settings: &Settings,
    url: &str,
    html: &str,
    catalogue: &[String],
) -> ScanOutput {
    if let Err(e) = url::Url::parse(url) {
        return ScanOutput::failure(format!("无效的URL: {e}"));
    }
    let mut strategy = match scanner::route(url) {
        Ok(strategy) => strategy,
        Err(e) => return ScanOutput::failure(format!("{e}")),
    };
    let mut page = Page::parse(html);

    let found = strategy.scan(url, &mut page, settings);

    let catalogue: HashSet<String> = catalogue.iter().map(|code| code.to_uppercase()).collect();
    let mut existing = Vec::new();
    let mut hidden = Vec::new();
    for (code, hit) in &found {
        if catalogue.contains(code) {
            existing.push(hit.container);
        }
        if settings.hide_collection_av && settings.is_collection(code) {
            hidden.push(hit.container);
        }
    }
    log::debug!("annotate: {} 个已入库, {} 个合集", existing.len(), hidden.len());

    strategy.mark_existing(&mut page, &existing);
    strategy.highlight(&mut page, &existing, &settings.emphasis_outline_style);
    strategy.hide(&mut page, &hidden);

    let links = if strategy.site().magnet_selector.is_some() {
        filter_links_by_size(
            strategy.find_links(&page, None),
            settings.magnet_min_bytes(),
        )
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

    ScanOutput {
        success: true,
        error: None,
        report: Some(ScanReport {
            site: strategy.site().name.to_string(),
            codes,
            links,
            patches: page.take_patches(),
        }),
    }
}

/// 恢复页面: 从元素上的标记属性精确还原注解前的样式与文本,
/// 返回给外壳回放的修补操作列表
pub fn recover_page(html: &str) -> Vec<scanner::dom::DomPatch> {
    let mut page = Page::parse(html);
    scanner::BaseScraper::recover_markers(&mut page);
    page.take_patches()
}

// 体积低于阈值的链接被过滤; 文本里不带体积信息的保留
fn filter_links_by_size(links: Vec<LinkHit>, min_bytes: Option<u64>) -> Vec<LinkHit> {
    let Some(min_bytes) = min_bytes else {
        return links;
    };
    links
        .into_iter()
        .filter(|link| match scanner::size_in_text(&link.text) {
            Some(size) => size >= min_bytes,
            None => true,
        })
        .collect()
}

/// 导出到 WASM 的运行时. 保存解析好的外壳设置.
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub struct Runtime {
    settings: Settings,
}

#[cfg(feature = "wasm")]
#[wasm_bindgen]
impl Runtime {
    /// 从外壳的设置对象创建运行时
    #[wasm_bindgen(constructor)]
    pub fn new(js_settings: JsValue) -> Result<Runtime, JsValue> {
        let settings: Settings = serde_wasm_bindgen::from_value(js_settings)
            .map_err(|e| JsValue::from_str(&format!("无效的设置: {e}")))?;
        Ok(Runtime { settings })
    }

    /// 当前 URL 归属的站点名
    #[wasm_bindgen]
    pub fn detect(&self, url: &str) -> Option<String> {
        scanner::detect(url).map(str::to_string)
    }

    /// URL 是否受支持 (可选地结合页面内容判断)
    #[wasm_bindgen(js_name = isSupported)]
    pub fn is_supported(&self, url: &str, html: Option<String>) -> bool {
        scanner::is_supported(url, html.as_deref())
    }

    /// 在 (url, html) 上运行扫描并返回 JSON 友好的输出
    #[wasm_bindgen]
    pub fn scan(&self, url: &str, html: &str) -> JsValue {
        to_js(&scan_page(&self.settings, url, html))
    }

    /// 扫描并对照媒体库番号集
    #[wasm_bindgen]
    pub fn annotate(&self, url: &str, html: &str, catalogue: JsValue) -> JsValue {
        let catalogue: Vec<String> = serde_wasm_bindgen::from_value(catalogue).unwrap_or_default();
        to_js(&annotate_page(&self.settings, url, html, &catalogue))
    }

    /// 恢复页面: 精确撤销此前扫描与高亮留下的所有注解
    #[wasm_bindgen]
    pub fn recover(&self, html: &str) -> JsValue {
        to_js(&recover_page(html))
    }

    /// 推迟到下一个调度回合的扫描变体, 调用方不必阻塞交互处理;
    /// 除"当前回合之后执行"外不提供更多顺序保证
    #[wasm_bindgen(js_name = scanDeferred)]
    pub fn scan_deferred(&self, url: String, html: String) -> js_sys::Promise {
        let settings = self.settings.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            Ok(to_js(&scan_page(&settings, &url, &html)))
        })
    }
}

/// 解析 "1.5 GB" 这样的体积表达式为字节数, 导出给外壳的过滤步骤
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = parseSize)]
pub fn parse_size(text: &str) -> Option<f64> {
    scanner::parse_size_to_bytes(text).map(|bytes| bytes as f64)
}

#[cfg(feature = "wasm")]
fn to_js<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value)
        .unwrap_or_else(|e| JsValue::from_str(&format!("序列化错误: {e}")))
}

// 用于本地测试 / 服务器的非 WASM 存根
#[cfg(not(feature = "wasm"))]
pub struct RuntimeNonWasm {
    settings: Settings,
}

#[cfg(not(feature = "wasm"))]
impl RuntimeNonWasm {
    pub fn new(settings: Settings) -> Self {
        RuntimeNonWasm { settings }
    }

    pub fn scan(&self, url: &str, html: &str) -> ScanOutput {
        scan_page(&self.settings, url, html)
    }

    pub fn annotate(&self, url: &str, html: &str, catalogue: &[String]) -> ScanOutput {
        annotate_page(&self.settings, url, html, catalogue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanner::dom::DomPatch;
    use scanner::models::LinkKind;

    const LISTING: &str = r#"
        <html><body>
            <a class="movie-box"><date>ABC-123</date></a>
            <a class="movie-box"><date>DEF-456</date></a>
        </body></html>"#;

    #[test]
    fn test_scan_page() {
        let output = scan_page(&Settings::default(), "https://www.javbus.com/", LISTING);
        assert!(output.success);
        let report = output.report.unwrap();
        assert_eq!(report.site, "javbus");
        assert_eq!(report.codes.len(), 2);
    }

    #[test]
    fn test_scan_page_no_site() {
        let output = scan_page(&Settings::default(), "https://www.example.com/", LISTING);
        assert!(!output.success);
        assert!(output.error.unwrap().contains("no site matched"));
    }

    #[test]
    fn test_scan_page_invalid_url() {
        let output = scan_page(&Settings::default(), "not a url", LISTING);
        assert!(!output.success);
    }

    #[test]
    fn test_annotate_marks_existing() {
        let catalogue = vec!["abc-123".to_string()];
        let output = annotate_page(
            &Settings::default(),
            "https://www.javbus.com/",
            LISTING,
            &catalogue,
        );
        assert!(output.success);
        let report = output.report.unwrap();

        // 只有入库的那张卡片拿到标记类和高亮
        let marked: Vec<_> = report
            .patches
            .iter()
            .filter(|patch| {
                matches!(patch, DomPatch::AddClass { class, .. } if class == "jv-existing")
            })
            .collect();
        assert_eq!(marked.len(), 1);
        assert!(report.patches.iter().any(|patch| matches!(
            patch,
            DomPatch::SetStyle { property, value, important: true, .. }
                if property == "outline" && value == "2px solid red"
        )));
    }

    #[test]
    fn test_annotate_hides_collections() {
        let settings: Settings = serde_json::from_str(
            r#"{"hideCollectionAV": true, "collectionCodePrefixes": "abc"}"#,
        )
        .unwrap();
        let output = annotate_page(&settings, "https://www.javbus.com/", LISTING, &[]);
        let report = output.report.unwrap();
        let hidden: Vec<_> = report
            .patches
            .iter()
            .filter(|patch| {
                matches!(patch, DomPatch::AddClass { class, .. } if class == "jv-hidden")
            })
            .collect();
        assert_eq!(hidden.len(), 1);
    }

    #[test]
    fn test_recover_page() {
        let annotated = r#"
            <html><body>
                <a class="movie-box jv-highlight" style="outline: 2px solid red"
                   data-jv-outline="1px dotted blue" data-jv-outline-priority=""
                   data-jv-processed="1">
                    <date data-jv-code="ABC-123" class="jv-link">ABC-123</date>
                </a>
            </body></html>"#;
        let patches = recover_page(annotated);
        // 高亮前的 outline 从快照属性里精确还原
        assert!(patches.iter().any(|patch| matches!(
            patch,
            DomPatch::SetStyle { property, value, .. }
                if property == "outline" && value == "1px dotted blue"
        )));
        assert!(patches.iter().any(|patch| matches!(
            patch,
            DomPatch::RemoveAttr { name, .. } if name == "data-jv-processed"
        )));
    }

    #[test]
    fn test_filter_links_by_size() {
        let links = vec![
            LinkHit {
                element: "a:nth-child(1)".to_string(),
                text: "ABC-123 2.0GB".to_string(),
                href: "magnet:?xt=urn:btih:0123456789abcdef0123456789abcdef01234567".to_string(),
                kind: Some(LinkKind::Magnet),
            },
            LinkHit {
                element: "a:nth-child(2)".to_string(),
                text: "ABC-123 300MB".to_string(),
                href: "magnet:?xt=urn:btih:89abcdef0123456789abcdef0123456789abcdef".to_string(),
                kind: Some(LinkKind::Magnet),
            },
            LinkHit {
                element: "a:nth-child(3)".to_string(),
                text: "没有体积".to_string(),
                href: "ed2k://|file|x|1|A|/".to_string(),
                kind: Some(LinkKind::Ed2k),
            },
        ];
        let min = scanner::parse_size_to_bytes("1 GB");
        let kept = filter_links_by_size(links, min);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|link| !link.text.contains("300MB")));
    }
}
