//! 刮削引擎: 站点策略共用的能力实现

use std::collections::{HashMap, HashSet};

use scraper::Selector;
use ego_tree::NodeId;

use crate::consts;
use crate::dom::Page;
use crate::error::{ConfigError, ConfigErrorKind, Result};
use crate::extract;
use crate::models::{CodeHit, CodeMap, LinkHit, LinkKind, Recognition, Settings};
use crate::sites::{CodeLocator, SiteDefinition, SynthesizeFn};

/// 策略引擎.
///
/// 持有编译好的定位器、幂等标记和跨扫描累计的番号映射;
/// 注解状态 (高亮集合、outline 快照) 也归它所有, 恢复时精确回放.
pub struct BaseScraper {
    site: &'static SiteDefinition,
    container_selector: Selector,
    code_selector: Option<Selector>,
    magnet_selector: Option<Selector>,
    processed: HashSet<NodeId>,
    found: CodeMap,
    highlighted: HashSet<NodeId>,
    outline_snapshots: HashMap<NodeId, Option<(String, bool)>>,
}

impl BaseScraper {
    /// 缺失必要定位器或选择器非法时构造失败, 该站点的策略不可用
    pub fn new(site: &'static SiteDefinition) -> Result<Self> {
        if site.container_selector.trim().is_empty() {
            return Err(ConfigError::new(
                site.name,
                ConfigErrorKind::MissingLocator("container"),
            )
            .into());
        }
        let container_selector = parse_selector(site.name, site.container_selector)?;

        let code_selector = match &site.code_locator {
            CodeLocator::Selector(source) => {
                if source.trim().is_empty() {
                    return Err(ConfigError::new(
                        site.name,
                        ConfigErrorKind::MissingLocator("code"),
                    )
                    .into());
                }
                Some(parse_selector(site.name, source)?)
            }
            CodeLocator::Synthesize(_) => None,
        };

        let magnet_selector = match site.magnet_selector {
            Some(source) if !source.trim().is_empty() => Some(parse_selector(site.name, source)?),
            _ => None,
        };

        Ok(Self {
            site,
            container_selector,
            code_selector,
            magnet_selector,
            processed: HashSet::new(),
            found: CodeMap::new(),
            highlighted: HashSet::new(),
            outline_snapshots: HashMap::new(),
        })
    }

    pub fn site(&self) -> &'static SiteDefinition {
        self.site
    }

    /// 跨扫描累计的番号映射
    pub fn found(&self) -> &CodeMap {
        &self.found
    }

    /// 单次扫描, 返回本次新发现的条目.
    ///
    /// 已处理的容器直接跳过; 未识别出番号的容器不标记番号字段,
    /// 站点晚填充文本时后续扫描还能重试.
    pub fn find_codes(
        &mut self,
        page: &mut Page,
        settings: &Settings,
        locator_override: Option<SynthesizeFn>,
    ) -> CodeMap {
        let mut new_found = CodeMap::new();

        let containers = page.select(&self.container_selector);
        if containers.is_empty() {
            log::warn!("{}: 该页面没有找到作品", self.site.name);
            return new_found;
        }

        for container in containers {
            if self.processed.contains(&container)
                || page.attr(container, consts::DATA_PROCESSED).is_some()
            {
                continue;
            }
            self.processed.insert(container);
            page.set_attr(container, consts::DATA_PROCESSED, "1");

            let Some((code_field, raw)) = self.resolve_code(page, container, locator_override)
            else {
                continue;
            };
            let Some(Recognition { code, family }) = extract::extract(&raw, settings.user_pattern())
            else {
                continue;
            };

            if let Some(field) = code_field {
                let href = settings.link_for(&code, family);
                page.wrap_link(field, consts::CLASS_LINK, consts::DATA_CODE, &code, href);
            }

            let hit = CodeHit {
                container,
                code_field,
                family,
            };
            // 同号后写覆盖先写: 最近处理的节点才是 UI 关心的那个
            self.found.insert(code.clone(), hit);
            new_found.insert(code, hit);
        }

        new_found
    }

    fn resolve_code(
        &self,
        page: &mut Page,
        container: NodeId,
        locator_override: Option<SynthesizeFn>,
    ) -> Option<(Option<NodeId>, String)> {
        if let Some(synthesize) = locator_override {
            let (field, text) = synthesize(page, container)?;
            return Some((Some(field), text));
        }
        match &self.site.code_locator {
            CodeLocator::Synthesize(synthesize) => {
                let (field, text) = synthesize(page, container)?;
                Some((Some(field), text))
            }
            CodeLocator::Selector(_) => {
                let selector = self.code_selector.as_ref()?;
                let field = page.first_in(container, selector)?;
                let text = page.text(field).trim().to_string();
                if text.is_empty() {
                    return None;
                }
                Some((Some(field), text))
            }
        }
    }

    /// 高亮容器, 先快照原有 outline 以便精确还原
    pub fn highlight(&mut self, page: &mut Page, containers: &[NodeId], style: &str) {
        for &container in containers {
            if self.highlighted.contains(&container)
                || page.attr(container, consts::DATA_OUTLINE).is_some()
            {
                continue;
            }
            let prior = page.inline_style(container, "outline");
            page.set_style(container, "outline", style, true);

            let (prior_value, prior_important) = prior.clone().unwrap_or_default();
            page.set_attr(container, consts::DATA_OUTLINE, &prior_value);
            page.set_attr(
                container,
                consts::DATA_OUTLINE_PRIORITY,
                if prior_important { "important" } else { "" },
            );
            page.add_class(container, consts::CLASS_HIGHLIGHT);

            self.outline_snapshots.insert(container, prior);
            self.highlighted.insert(container);
        }
    }

    /// 撤销高亮并从快照精确还原; 不给目标时处理所有已高亮容器
    pub fn unhighlight(&mut self, page: &mut Page, containers: Option<&[NodeId]>) {
        let targets: Vec<NodeId> = match containers {
            Some(containers) => containers.to_vec(),
            None => self.highlighted.iter().copied().collect(),
        };
        for container in targets {
            if !self.highlighted.remove(&container) {
                continue;
            }
            match self.outline_snapshots.remove(&container).flatten() {
                Some((value, important)) => page.set_style(container, "outline", &value, important),
                None => page.remove_style(container, "outline"),
            }
            page.remove_attr(container, consts::DATA_OUTLINE);
            page.remove_attr(container, consts::DATA_OUTLINE_PRIORITY);
            page.remove_class(container, consts::CLASS_HIGHLIGHT);
        }
    }

    pub fn hide(&mut self, page: &mut Page, containers: &[NodeId]) {
        for &container in containers {
            page.add_class(container, consts::CLASS_HIDDEN);
        }
    }

    pub fn show(&mut self, page: &mut Page, containers: &[NodeId]) {
        for &container in containers {
            page.remove_class(container, consts::CLASS_HIDDEN);
        }
    }

    pub fn mark_existing(&mut self, page: &mut Page, containers: &[NodeId]) {
        for &container in containers {
            page.add_class(container, consts::CLASS_EXISTING);
        }
    }

    pub fn clear_existing(&mut self, page: &mut Page, containers: &[NodeId]) {
        for &container in containers {
            page.remove_class(container, consts::CLASS_EXISTING);
        }
    }

    /// 收集链接, scope 缺省时作用于整页
    pub fn find_links(&self, page: &Page, scope: Option<NodeId>) -> Vec<LinkHit> {
        let Some(selector) = &self.magnet_selector else {
            log::warn!("{}: 未配置 magnet 定位器", self.site.name);
            return Vec::new();
        };
        let nodes = match scope {
            Some(scope) => page.select_in(scope, selector),
            None => page.select(selector),
        };
        let Ok(anchor_selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        nodes
            .into_iter()
            .filter_map(|node| {
                // 命中的可以是行元素, href 落在其内部的锚点上
                let href = page.attr(node, "href").or_else(|| {
                    let anchor = page.first_in(node, &anchor_selector)?;
                    page.attr(anchor, "href")
                })?;
                let text = page.text(node).trim().to_string();
                Some(LinkHit {
                    element: page.css_path(node),
                    kind: LinkKind::classify(&href),
                    text,
                    href,
                })
            })
            .collect()
    }

    /// 恢复页面: 撤销高亮、标记类与处理标记, 还原被改写的文本
    pub fn recover(&mut self, page: &mut Page) {
        self.unhighlight(page, None);
        for node in page.nodes_with_class(consts::CLASS_HIDDEN) {
            page.remove_class(node, consts::CLASS_HIDDEN);
        }
        for node in page.nodes_with_class(consts::CLASS_EXISTING) {
            page.remove_class(node, consts::CLASS_EXISTING);
        }

        for hit in std::mem::take(&mut self.found).values() {
            if let Some(field) = hit.code_field {
                page.unwrap_link(field, consts::DATA_CODE);
                page.restore_text(field);
            }
            if page.attr(hit.container, consts::DATA_FAKE_TITLE).is_some() {
                page.remove_attr(hit.container, consts::DATA_FAKE_TITLE);
            }
        }
        for container in std::mem::take(&mut self.processed) {
            page.remove_attr(container, consts::DATA_PROCESSED);
        }
        self.outline_snapshots.clear();
    }

    /// 仅凭页面上的标记恢复: 快照以属性形式留在元素上,
    /// 因此跨会话 (新的策略实例、同一张真实页面) 也能精确还原.
    pub fn recover_markers(page: &mut Page) {
        for node in page.nodes_with_attr(consts::DATA_OUTLINE) {
            let prior = page.attr(node, consts::DATA_OUTLINE).unwrap_or_default();
            let important = page
                .attr(node, consts::DATA_OUTLINE_PRIORITY)
                .is_some_and(|p| p == "important");
            if prior.is_empty() {
                page.remove_style(node, "outline");
            } else {
                page.set_style(node, "outline", &prior, important);
            }
            page.remove_attr(node, consts::DATA_OUTLINE);
            page.remove_attr(node, consts::DATA_OUTLINE_PRIORITY);
        }
        for node in page.nodes_with_class(consts::CLASS_HIGHLIGHT) {
            page.remove_class(node, consts::CLASS_HIGHLIGHT);
        }
        for node in page.nodes_with_class(consts::CLASS_HIDDEN) {
            page.remove_class(node, consts::CLASS_HIDDEN);
        }
        for node in page.nodes_with_class(consts::CLASS_EXISTING) {
            page.remove_class(node, consts::CLASS_EXISTING);
        }
        for node in page.nodes_with_attr(consts::DATA_CODE) {
            page.unwrap_link(node, consts::DATA_CODE);
            page.restore_text(node);
        }
        for node in page.nodes_with_attr(consts::DATA_FAKE_TITLE) {
            page.remove_attr(node, consts::DATA_FAKE_TITLE);
        }
        for node in page.nodes_with_attr(consts::DATA_PROCESSED) {
            page.remove_attr(node, consts::DATA_PROCESSED);
        }
    }
}

fn parse_selector(site: &'static str, source: &str) -> Result<Selector> {
    Selector::parse(source).map_err(|e| {
        ConfigError::new(site, ConfigErrorKind::BadSelector(format!("{source}: {e}"))).into()
    })
}
