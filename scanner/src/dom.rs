//! 页面模型: 只读文档加注解覆盖层

use std::collections::{BTreeMap, BTreeSet, HashMap};

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};

/// 交给外壳对真实页面回放的 DOM 修补操作, 节点以 CSS 路径定位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DomPatch {
    SetText {
        node: String,
        text: String,
    },
    SetAttr {
        node: String,
        name: String,
        value: String,
    },
    RemoveAttr {
        node: String,
        name: String,
    },
    AddClass {
        node: String,
        class: String,
    },
    RemoveClass {
        node: String,
        class: String,
    },
    SetStyle {
        node: String,
        property: String,
        value: String,
        important: bool,
    },
    RemoveStyle {
        node: String,
        property: String,
    },
    /// 把元素的文本内容替换为携带规范化番号的链接
    WrapLink {
        node: String,
        class: String,
        code: String,
        href: Option<String>,
    },
    UnwrapLink {
        node: String,
    },
}

impl DomPatch {
    /// 操作针对的节点路径
    pub fn node(&self) -> &str {
        match self {
            DomPatch::SetText { node, .. }
            | DomPatch::SetAttr { node, .. }
            | DomPatch::RemoveAttr { node, .. }
            | DomPatch::AddClass { node, .. }
            | DomPatch::RemoveClass { node, .. }
            | DomPatch::SetStyle { node, .. }
            | DomPatch::RemoveStyle { node, .. }
            | DomPatch::WrapLink { node, .. }
            | DomPatch::UnwrapLink { node } => node,
        }
    }
}

/// 解析后的页面加注解覆盖层.
///
/// 文档本身只读; 所有修改写入覆盖层并追加为修补操作.
/// 读取 (文本、属性、类名、内联样式) 先查覆盖层再落到文档,
/// 因此带副作用的定位器能把自己的写入当作事实来源重新读出.
pub struct Page {
    html: Html,
    text_overrides: HashMap<NodeId, String>,
    attr_overrides: HashMap<NodeId, BTreeMap<String, Option<String>>>,
    class_overrides: HashMap<NodeId, BTreeSet<String>>,
    style_overrides: HashMap<NodeId, BTreeMap<String, Option<(String, bool)>>>,
    patches: Vec<DomPatch>,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
            text_overrides: HashMap::new(),
            attr_overrides: HashMap::new(),
            class_overrides: HashMap::new(),
            style_overrides: HashMap::new(),
            patches: Vec::new(),
        }
    }

    pub fn document(&self) -> &Html {
        &self.html
    }

    fn element(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(id).and_then(ElementRef::wrap)
    }

    /// 整页查找
    pub fn select(&self, selector: &Selector) -> Vec<NodeId> {
        self.html.select(selector).map(|el| el.id()).collect()
    }

    /// 在某个元素的后代中查找
    pub fn select_in(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        match self.element(scope) {
            Some(el) => el.select(selector).map(|el| el.id()).collect(),
            None => Vec::new(),
        }
    }

    pub fn first_in(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.element(scope)?.select(selector).next().map(|el| el.id())
    }

    /// 节点的文本内容, 覆盖层优先
    pub fn text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let Some(text) = self.text_overrides.get(&id) {
            out.push_str(text);
            return;
        }
        let Some(node) = self.html.tree.get(id) else {
            return;
        };
        if let Node::Text(text) = node.value() {
            out.push_str(&text.text);
        } else {
            for child in node.children() {
                self.collect_text(child.id(), out);
            }
        }
    }

    /// 文档里的原始文本, 无视覆盖层
    pub fn original_text(&self, id: NodeId) -> String {
        fn walk(html: &Html, id: NodeId, out: &mut String) {
            let Some(node) = html.tree.get(id) else {
                return;
            };
            if let Node::Text(text) = node.value() {
                out.push_str(&text.text);
            } else {
                for child in node.children() {
                    walk(html, child.id(), out);
                }
            }
        }
        let mut out = String::new();
        walk(&self.html, id, &mut out);
        out
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<String> {
        if let Some(attrs) = self.attr_overrides.get(&id)
            && let Some(value) = attrs.get(name)
        {
            return value.clone();
        }
        self.element(id)?.value().attr(name).map(str::to_string)
    }

    pub fn tag_name(&self, id: NodeId) -> Option<String> {
        Some(self.element(id)?.value().name().to_string())
    }

    fn classes_of(&self, id: NodeId) -> BTreeSet<String> {
        if let Some(classes) = self.class_overrides.get(&id) {
            return classes.clone();
        }
        self.element(id)
            .map(|el| el.value().classes().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes_of(id).contains(class)
    }

    /// 全页查找带某个属性的元素, 覆盖层优先
    pub fn nodes_with_attr(&self, name: &str) -> Vec<NodeId> {
        self.html
            .tree
            .nodes()
            .filter(|node| node.value().is_element())
            .map(|node| node.id())
            .filter(|id| self.attr(*id, name).is_some())
            .collect()
    }

    /// 全页查找带某个类名的元素, 覆盖层优先
    pub fn nodes_with_class(&self, class: &str) -> Vec<NodeId> {
        self.html
            .tree
            .nodes()
            .filter(|node| node.value().is_element())
            .map(|node| node.id())
            .filter(|id| self.has_class(*id, class))
            .collect()
    }

    /// 元素的内联样式值, 覆盖层优先; bool 为 important 标记
    pub fn inline_style(&self, id: NodeId, property: &str) -> Option<(String, bool)> {
        if let Some(styles) = self.style_overrides.get(&id)
            && let Some(value) = styles.get(property)
        {
            return value.clone();
        }
        parse_style_attr(&self.attr(id, "style")?, property)
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.text_overrides.insert(id, text.to_string());
        self.patches.push(DomPatch::SetText {
            node: self.css_path(id),
            text: text.to_string(),
        });
    }

    /// 撤销文本覆盖, 回放为文档原文
    pub fn restore_text(&mut self, id: NodeId) {
        if self.text_overrides.remove(&id).is_some() {
            self.patches.push(DomPatch::SetText {
                node: self.css_path(id),
                text: self.original_text(id),
            });
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        self.attr_overrides
            .entry(id)
            .or_default()
            .insert(name.to_string(), Some(value.to_string()));
        self.patches.push(DomPatch::SetAttr {
            node: self.css_path(id),
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        self.attr_overrides
            .entry(id)
            .or_default()
            .insert(name.to_string(), None);
        self.patches.push(DomPatch::RemoveAttr {
            node: self.css_path(id),
            name: name.to_string(),
        });
    }

    /// 加类名, 已存在时不产生修补操作
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        let mut classes = self.classes_of(id);
        if !classes.insert(class.to_string()) {
            return;
        }
        self.class_overrides.insert(id, classes);
        self.patches.push(DomPatch::AddClass {
            node: self.css_path(id),
            class: class.to_string(),
        });
    }

    /// 去类名, 不存在时不产生修补操作
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        let mut classes = self.classes_of(id);
        if !classes.remove(class) {
            return;
        }
        self.class_overrides.insert(id, classes);
        self.patches.push(DomPatch::RemoveClass {
            node: self.css_path(id),
            class: class.to_string(),
        });
    }

    pub fn set_style(&mut self, id: NodeId, property: &str, value: &str, important: bool) {
        self.style_overrides
            .entry(id)
            .or_default()
            .insert(property.to_string(), Some((value.to_string(), important)));
        self.patches.push(DomPatch::SetStyle {
            node: self.css_path(id),
            property: property.to_string(),
            value: value.to_string(),
            important,
        });
    }

    pub fn remove_style(&mut self, id: NodeId, property: &str) {
        self.style_overrides
            .entry(id)
            .or_default()
            .insert(property.to_string(), None);
        self.patches.push(DomPatch::RemoveStyle {
            node: self.css_path(id),
            property: property.to_string(),
        });
    }

    /// 把元素的文本内容替换为携带番号属性的链接
    pub fn wrap_link(&mut self, id: NodeId, class: &str, attr: &str, code: &str, href: Option<String>) {
        self.attr_overrides
            .entry(id)
            .or_default()
            .insert(attr.to_string(), Some(code.to_string()));
        self.patches.push(DomPatch::WrapLink {
            node: self.css_path(id),
            class: class.to_string(),
            code: code.to_string(),
            href,
        });
    }

    pub fn unwrap_link(&mut self, id: NodeId, attr: &str) {
        self.attr_overrides.entry(id).or_default().insert(attr.to_string(), None);
        self.patches.push(DomPatch::UnwrapLink {
            node: self.css_path(id),
        });
    }

    /// 已记录的修补操作
    pub fn patches(&self) -> &[DomPatch] {
        &self.patches
    }

    pub fn patch_count(&self) -> usize {
        self.patches.len()
    }

    pub fn take_patches(&mut self) -> Vec<DomPatch> {
        std::mem::take(&mut self.patches)
    }

    /// 节点的 CSS 定位路径, 如 `html:nth-child(1) > body:nth-child(2) > div:nth-child(1)`
    pub fn css_path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = self.html.tree.get(id);
        while let Some(node) = current {
            if let Some(element) = node.value().as_element() {
                let position = 1 + node
                    .prev_siblings()
                    .filter(|sibling| sibling.value().is_element())
                    .count();
                segments.push(format!("{}:nth-child({position})", element.name()));
            }
            current = node.parent();
        }
        segments.reverse();
        segments.join(" > ")
    }
}

fn parse_style_attr(style: &str, property: &str) -> Option<(String, bool)> {
    for declaration in style.split(';') {
        if let Some((name, value)) = declaration.split_once(':')
            && name.trim().eq_ignore_ascii_case(property)
        {
            let value = value.trim();
            return Some(match value.strip_suffix("!important") {
                Some(bare) => (bare.trim().to_string(), true),
                None => (value.to_string(), false),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        <!DOCTYPE html>
        <html><body>
            <div class="item first" style="outline: 1px solid gray">
                <span class="code">ABC-123</span>
            </div>
            <div class="item">
                <span class="code">DEF-456</span>
            </div>
        </body></html>"#;

    fn selector(source: &str) -> Selector {
        Selector::parse(source).unwrap()
    }

    #[test]
    fn test_select_and_text() {
        let page = Page::parse(SAMPLE);
        let items = page.select(&selector("div.item"));
        assert_eq!(items.len(), 2);
        let code = page.first_in(items[0], &selector(".code")).unwrap();
        assert_eq!(page.text(code).trim(), "ABC-123");
    }

    #[test]
    fn test_text_override_wins() {
        let mut page = Page::parse(SAMPLE);
        let code = page.select(&selector(".code"))[0];
        page.set_text(code, "fc2-1234567");
        assert_eq!(page.text(code), "fc2-1234567");
        assert_eq!(page.original_text(code).trim(), "ABC-123");
        page.restore_text(code);
        assert_eq!(page.text(code).trim(), "ABC-123");
    }

    #[test]
    fn test_class_overlay() {
        let mut page = Page::parse(SAMPLE);
        let item = page.select(&selector("div.item"))[0];
        assert!(page.has_class(item, "first"));
        page.add_class(item, "jv-hidden");
        page.add_class(item, "jv-hidden");
        assert!(page.has_class(item, "jv-hidden"));
        // 重复添加不产生第二条修补操作
        assert_eq!(page.patch_count(), 1);
        assert_eq!(page.nodes_with_class("jv-hidden"), vec![item]);
        page.remove_class(item, "jv-hidden");
        assert!(!page.has_class(item, "jv-hidden"));
        assert_eq!(page.patch_count(), 2);
    }

    #[test]
    fn test_inline_style_and_override() {
        let mut page = Page::parse(SAMPLE);
        let items = page.select(&selector("div.item"));
        assert_eq!(
            page.inline_style(items[0], "outline"),
            Some(("1px solid gray".to_string(), false))
        );
        assert_eq!(page.inline_style(items[1], "outline"), None);
        page.set_style(items[1], "outline", "2px solid red", true);
        assert_eq!(
            page.inline_style(items[1], "outline"),
            Some(("2px solid red".to_string(), true))
        );
        page.remove_style(items[1], "outline");
        assert_eq!(page.inline_style(items[1], "outline"), None);
    }

    #[test]
    fn test_attr_overlay() {
        let mut page = Page::parse(SAMPLE);
        let item = page.select(&selector("div.item"))[0];
        assert_eq!(page.attr(item, "data-jv-processed"), None);
        page.set_attr(item, "data-jv-processed", "1");
        assert_eq!(page.attr(item, "data-jv-processed").as_deref(), Some("1"));
        page.remove_attr(item, "data-jv-processed");
        assert_eq!(page.attr(item, "data-jv-processed"), None);
    }

    #[test]
    fn test_css_path() {
        let page = Page::parse(SAMPLE);
        let items = page.select(&selector("div.item"));
        // html5ever 会补全 head, body 是 html 的第二个元素子节点
        assert_eq!(
            page.css_path(items[1]),
            "html:nth-child(1) > body:nth-child(2) > div:nth-child(2)"
        );
    }
}
