//! javbus 策略

use registry::Scrapable;

use crate::dom::Page;
use crate::error::Result;
use crate::models::CodeHit;
use crate::sites;
use crate::strategies::base::BaseScraper;
use crate::traits::Scraper;

/// javbus 列表页策略
#[derive(Scrapable)]
#[site(name = "javbus")]
pub struct JavbusStrategy {
    base: BaseScraper,
}

impl JavbusStrategy {
    pub(crate) fn create() -> Result<Self> {
        Ok(Self {
            base: BaseScraper::new(sites::get("javbus").expect("javbus registered"))?,
        })
    }
}

impl Scraper for JavbusStrategy {
    fn base(&self) -> &BaseScraper {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseScraper {
        &mut self.base
    }

    fn on_code_found(&mut self, page: &mut Page, code: &str, hit: &CodeHit) {
        // 结果卡片内顺带收集磁力链接
        let links = self.base.find_links(page, Some(hit.container));
        log::debug!("javbus: {code} 找到 {} 个磁力链接", links.len());
    }
}

#[test]
fn test_scan() -> Result<()> {
    use crate::models::{Family, Settings};

    let url = "https://www.javbus.com/";
    let content = r#"
        <!DOCTYPE html>
        <html>
        <body>
            <a class="movie-box" href="/ABC-123">
                <div class="photo-info">
                    <span>
                        标题一
                        <date>ABC-123</date>
                        <date>2021-07-10</date>
                    </span>
                </div>
            </a>
            <a class="movie-box" href="/fc2-1234567">
                <div class="photo-info">
                    <span>
                        标题二
                        <date>FC2-PPV-1234567</date>
                        <date>2021-08-01</date>
                    </span>
                </div>
            </a>
            <a class="movie-box" href="/empty">
                <div class="photo-info"><span>没有番号</span></div>
            </a>
        </body>
        </html>"#;

    let mut strategy = JavbusStrategy::create()?;
    let mut page = Page::parse(content);
    let settings = Settings::default();

    let found = strategy.scan(url, &mut page, &settings);
    assert_eq!(found.len(), 2);
    assert_eq!(found["ABC-123"].family, Family::Censored);
    assert_eq!(found["FC2-1234567"].family, Family::Fc2);

    // 幂等: 第二次扫描不产生新的修补操作, 返回同样的映射
    let patches_after_first = page.patch_count();
    let again = strategy.scan(url, &mut page, &settings);
    assert_eq!(again, found);
    assert_eq!(page.patch_count(), patches_after_first);

    Ok(())
}

#[test]
fn test_find_links() -> Result<()> {
    use crate::models::LinkKind;

    let content = r#"
        <!DOCTYPE html>
        <html>
        <body>
            <table id="magnet-table">
                <tr>
                    <td><a href="magnet:?xt=urn:btih:0123456789abcdef0123456789abcdef01234567">ABC-123 1.5GB 高清</a></td>
                </tr>
                <tr>
                    <td><a href="https://example.com/other">别的链接</a></td>
                </tr>
            </table>
        </body>
        </html>"#;

    let strategy = JavbusStrategy::create()?;
    let page = Page::parse(content);

    let links = strategy.find_links(&page, None);
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].kind, Some(LinkKind::Magnet));
    assert!(links[0].text.contains("1.5GB"));
    assert_eq!(links[1].kind, None);

    Ok(())
}
