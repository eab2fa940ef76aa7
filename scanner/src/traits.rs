//! 刮削策略特型

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use ego_tree::NodeId;

use crate::dom::Page;
use crate::models::{CodeHit, CodeMap, LinkHit, Settings};
use crate::sites::SiteDefinition;
use crate::strategies::base::BaseScraper;

/// 刮削策略的能力集.
///
/// 默认实现全部落到 [`BaseScraper`] 引擎上;
/// 站点差异通过覆写单个能力 (定位方式、命中钩子) 表达, 不靠继承层级.
pub trait Scraper {
    fn base(&self) -> &BaseScraper;
    fn base_mut(&mut self) -> &mut BaseScraper;

    fn site(&self) -> &'static SiteDefinition {
        self.base().site()
    }

    /// 扫描页面并返回累计的番号映射.
    ///
    /// 重复调用是安全的: 已处理的容器被幂等标记跳过, 不产生重复的
    /// DOM 修补, 返回的映射与上一次一致.
    fn scan(&mut self, url: &str, page: &mut Page, settings: &Settings) -> CodeMap {
        let _ = url;
        let new_found = self.base_mut().find_codes(page, settings, None);
        for (code, hit) in &new_found {
            self.on_code_found(page, code, hit);
        }
        self.base().found().clone()
    }

    /// 新番号命中时的钩子, 仅对本次扫描新发现的条目触发
    fn on_code_found(&mut self, _page: &mut Page, _code: &str, _hit: &CodeHit) {}

    fn highlight(&mut self, page: &mut Page, containers: &[NodeId], style: &str) {
        self.base_mut().highlight(page, containers, style);
    }

    /// 不给目标时撤掉所有已高亮的容器
    fn unhighlight(&mut self, page: &mut Page, containers: Option<&[NodeId]>) {
        self.base_mut().unhighlight(page, containers);
    }

    fn hide(&mut self, page: &mut Page, containers: &[NodeId]) {
        self.base_mut().hide(page, containers);
    }

    fn show(&mut self, page: &mut Page, containers: &[NodeId]) {
        self.base_mut().show(page, containers);
    }

    fn mark_existing(&mut self, page: &mut Page, containers: &[NodeId]) {
        self.base_mut().mark_existing(page, containers);
    }

    fn clear_existing(&mut self, page: &mut Page, containers: &[NodeId]) {
        self.base_mut().clear_existing(page, containers);
    }

    /// 收集磁力/ed2k 链接, 默认作用于整页
    fn find_links(&self, page: &Page, scope: Option<NodeId>) -> Vec<LinkHit> {
        self.base().find_links(page, scope)
    }

    /// 恢复页面: 精确还原所有注解前的属性与样式
    fn recover(&mut self, page: &mut Page) {
        self.base_mut().recover(page);
    }
}

impl std::fmt::Debug for dyn Scraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scraper").field("site", &self.site().name).finish()
    }
}

/// 工厂注册用策略
pub(crate) trait StrategyRegistry: Scraper {
    /// URL 是否归属本站点
    fn matches(url: &str) -> bool;

    /// 装箱策略, 定位器配置错误时构造失败
    #[allow(clippy::new_ret_no_self)]
    fn new() -> crate::error::Result<Box<dyn Scraper>>;
}
