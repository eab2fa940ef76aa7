//! javlibrary 策略

use registry::Scrapable;

use crate::error::Result;
use crate::sites;
use crate::strategies::base::BaseScraper;
use crate::traits::Scraper;

/// javlibrary 列表页策略, 表驱动的默认行为
#[derive(Scrapable)]
#[site(name = "javlibrary")]
pub struct JavlibraryStrategy {
    base: BaseScraper,
}

impl JavlibraryStrategy {
    pub(crate) fn create() -> Result<Self> {
        Ok(Self {
            base: BaseScraper::new(sites::get("javlibrary").expect("javlibrary registered"))?,
        })
    }
}

impl Scraper for JavlibraryStrategy {
    fn base(&self) -> &BaseScraper {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseScraper {
        &mut self.base
    }
}

#[test]
fn test_scan() -> Result<()> {
    use crate::dom::Page;
    use crate::models::{Family, Settings};

    let url = "https://www.javlibrary.com/cn/vl_newrelease.php";
    let content = r#"
        <!DOCTYPE html>
        <html>
        <body>
            <div class="videos">
                <div class="video">
                    <a href="./?v=javme5nxqy">
                        <div class="id">ABC-123</div>
                        <div class="title">标题一</div>
                    </a>
                </div>
                <div class="video">
                    <a href="./?v=javme5nxqz">
                        <div class="id">DEF-456</div>
                        <div class="title">标题二</div>
                    </a>
                </div>
            </div>
        </body>
        </html>"#;

    let mut strategy = JavlibraryStrategy::create()?;
    let mut page = Page::parse(content);
    let found = strategy.scan(url, &mut page, &Settings::default());

    assert_eq!(found.len(), 2);
    assert_eq!(found["ABC-123"].family, Family::Censored);
    assert_eq!(found["DEF-456"].family, Family::Censored);

    Ok(())
}
