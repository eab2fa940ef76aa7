//! jinjier 策略

use registry::Scrapable;

use crate::error::Result;
use crate::sites;
use crate::strategies::base::BaseScraper;
use crate::traits::Scraper;

/// jinjier 查询结果表策略, 番号由合成定位器从单元格取出
#[derive(Scrapable)]
#[site(name = "jinjier")]
pub struct JinjierStrategy {
    base: BaseScraper,
}

impl JinjierStrategy {
    pub(crate) fn create() -> Result<Self> {
        Ok(Self {
            base: BaseScraper::new(sites::get("jinjier").expect("jinjier registered"))?,
        })
    }
}

impl Scraper for JinjierStrategy {
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

    let url = "https://jinjier.art/sql";
    let content = r#"
        <!DOCTYPE html>
        <html>
        <body>
            <table>
                <tbody>
                    <tr><td>1</td><td>2021-07-10</td><td>ABC-123 标题一</td></tr>
                    <tr><td>2</td><td>2021-08-01</td><td>n1234 标题二</td></tr>
                    <tr><td>3</td><td>2021-08-02</td><td></td></tr>
                </tbody>
            </table>
        </body>
        </html>"#;

    let mut strategy = JinjierStrategy::create()?;
    let mut page = Page::parse(content);
    let found = strategy.scan(url, &mut page, &Settings::default());

    assert_eq!(found.len(), 2);
    assert_eq!(found["ABC-123"].family, Family::Censored);
    assert_eq!(found["N1234"].family, Family::Uncensored);

    Ok(())
}
