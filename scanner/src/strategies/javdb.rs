//! javdb 策略

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use registry::Scrapable;
use scraper::Selector;
use ego_tree::NodeId;

use crate::consts;
use crate::dom::Page;
use crate::error::Result;
use crate::models::{CodeMap, Settings};
use crate::sites;
use crate::strategies::base::BaseScraper;
use crate::traits::Scraper;
use crate::utils;

// 欧美作品的搜索词形如 21.04.03
static WESTERN_QUERY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{2}\.\d{2}\.\d{2}").unwrap());

/// javdb 列表页策略
#[derive(Scrapable)]
#[site(name = "javdb")]
pub struct JavdbStrategy {
    base: BaseScraper,
}

impl JavdbStrategy {
    pub(crate) fn create() -> Result<Self> {
        Ok(Self {
            base: BaseScraper::new(sites::get("javdb").expect("javdb registered"))?,
        })
    }

    // 欧美目录视图不显示完整番号, 需要合成标题
    fn is_western_view(url: &str, settings: &Settings) -> bool {
        if utils::query_param(url, "t") == Some("western") {
            return true;
        }
        if let Some(query) = utils::query_param(url, "q")
            && WESTERN_QUERY_RE.is_match(query)
        {
            return true;
        }
        let path = utils::url_path(url);
        settings.ou_paths().iter().any(|p| path.contains(p))
    }
}

// 用标题与发行日期合成 `title.YY.MM.DD` 形式的伪标题,
// 缓存在容器属性上并改写可见标题, 重复扫描不再重算
fn synthesize_western_title(page: &mut Page, container: NodeId) -> Option<(NodeId, String)> {
    let Ok(title_selector) = Selector::parse(".video-title strong") else {
        return None;
    };
    let title_el = page.first_in(container, &title_selector)?;

    if let Some(cached) = page.attr(container, consts::DATA_FAKE_TITLE) {
        return Some((title_el, cached));
    }

    let Ok(meta_selector) = Selector::parse(".meta") else {
        return None;
    };
    let meta_el = page.first_in(container, &meta_selector)?;

    let title = page.text(title_el).trim().replace(' ', "");
    let meta = page.text(meta_el).trim().to_string();
    let date = meta.get(2..)?.replace('-', ".");
    let fake_title = format!("{title}.{date}");

    page.set_attr(container, consts::DATA_FAKE_TITLE, &fake_title);
    page.set_text(title_el, &fake_title);
    Some((title_el, fake_title))
}

impl Scraper for JavdbStrategy {
    fn base(&self) -> &BaseScraper {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseScraper {
        &mut self.base
    }

    fn scan(&mut self, url: &str, page: &mut Page, settings: &Settings) -> CodeMap {
        let locator = if Self::is_western_view(url, settings) {
            Some(synthesize_western_title as sites::SynthesizeFn)
        } else {
            None
        };
        let new_found = self.base.find_codes(page, settings, locator);
        for (code, hit) in &new_found {
            self.on_code_found(page, code, hit);
        }
        self.base.found().clone()
    }
}

#[test]
fn test_scan_regular() -> Result<()> {
    use crate::models::Family;

    let url = "https://javdb.com/";
    let content = r#"
        <!DOCTYPE html>
        <html>
        <body>
            <div class="movie-list">
                <div class="item">
                    <a href="/v/aaa">
                        <div class="video-title"><strong>ABC-123</strong> 标题一</div>
                        <div class="meta">2021-07-10</div>
                    </a>
                </div>
            </div>
        </body>
        </html>"#;

    let mut strategy = JavdbStrategy::create()?;
    let mut page = Page::parse(content);
    let found = strategy.scan(url, &mut page, &Settings::default());

    assert_eq!(found.len(), 1);
    assert_eq!(found["ABC-123"].family, Family::Censored);

    Ok(())
}

#[test]
fn test_scan_western_synthesizes_title() -> Result<()> {
    use crate::models::Family;

    let url = "https://javdb.com/search?q=abc&t=western";
    let content = r#"
        <!DOCTYPE html>
        <html>
        <body>
            <div class="movie-list">
                <div class="item">
                    <a href="/v/bbb">
                        <div class="video-title"><strong>Sex Art</strong></div>
                        <div class="meta">2021-04-03</div>
                    </a>
                </div>
            </div>
        </body>
        </html>"#;

    let mut strategy = JavdbStrategy::create()?;
    let mut page = Page::parse(content);
    let found = strategy.scan(url, &mut page, &Settings::default());

    assert_eq!(found.len(), 1);
    let hit = found["SEXART.21.04.03"];
    assert_eq!(hit.family, Family::Ou);
    // 可见标题被改写为合成标题, 并缓存在容器上
    assert_eq!(page.text(hit.code_field.unwrap()), "SexArt.21.04.03");
    assert_eq!(
        page.attr(hit.container, consts::DATA_FAKE_TITLE).as_deref(),
        Some("SexArt.21.04.03")
    );

    Ok(())
}

#[test]
fn test_synthesize_cache() {
    let content = r#"
        <html><body>
            <div class="movie-list"><div class="item">
                <div class="video-title"><strong>Sex Art</strong></div>
                <div class="meta">2021-04-03</div>
            </div></div>
        </body></html>"#;
    let mut page = Page::parse(content);
    let item = page.select(&Selector::parse(".movie-list .item").unwrap())[0];

    let (_, first) = synthesize_western_title(&mut page, item).unwrap();
    let patches = page.patch_count();
    let (_, second) = synthesize_western_title(&mut page, item).unwrap();
    assert_eq!(first, second);
    // 第二次走缓存, 不再产生修补操作
    assert_eq!(page.patch_count(), patches);
}

#[test]
fn test_is_western_view() {
    let settings = Settings::default();
    assert!(JavdbStrategy::is_western_view(
        "https://javdb.com/search?q=abc&t=western",
        &settings
    ));
    assert!(JavdbStrategy::is_western_view(
        "https://javdb.com/search?q=sexart+21.04.03",
        &settings
    ));
    assert!(JavdbStrategy::is_western_view(
        "https://javdb.com/western?page=2",
        &settings
    ));
    assert!(!JavdbStrategy::is_western_view(
        "https://javdb.com/search?q=abc-123",
        &settings
    ));
}
