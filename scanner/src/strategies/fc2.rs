//! fc2ppvdb 策略

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use registry::Scrapable;

use crate::error::Result;
use crate::sites;
use crate::strategies::base::BaseScraper;
use crate::traits::Scraper;

/// fc2ppvdb 列表页策略, 裸数字 id 由合成定位器补上 fc2- 前缀
#[derive(Scrapable)]
#[site(name = "fc2")]
pub struct Fc2Strategy {
    base: BaseScraper,
}

impl Fc2Strategy {
    pub(crate) fn create() -> Result<Self> {
        Ok(Self {
            base: BaseScraper::new(sites::get("fc2").expect("fc2 registered"))?,
        })
    }
}

impl Scraper for Fc2Strategy {
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

    let url = "https://fc2ppvdb.com/";
    let content = r#"
        <!DOCTYPE html>
        <html>
        <body>
            <div class="flex">
                <section>
                    <div class="container">
                        <div class="relative">
                            <div class="lazyload-wrapper"></div><span>1234567</span>
                        </div>
                        <div class="relative">
                            <a class="block" href="/articles/7654321">x</a><span>fc2-7654321</span>
                        </div>
                    </div>
                </section>
            </div>
        </body>
        </html>"#;

    let mut strategy = Fc2Strategy::create()?;
    let mut page = Page::parse(content);
    let found = strategy.scan(url, &mut page, &Settings::default());

    assert_eq!(found.len(), 2);
    assert_eq!(found["FC2-1234567"].family, Family::Fc2);
    assert_eq!(found["FC2-7654321"].family, Family::Fc2);
    // 裸 id 的显示文本被原地改写为 fc2- 前缀
    let bare = found["FC2-1234567"];
    assert_eq!(page.text(bare.code_field.unwrap()), "fc2-1234567");

    Ok(())
}
