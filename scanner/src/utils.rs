//! 辅助工具

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::patterns::{FILE_SIZE_RE, SIZE_IN_TEXT_RE};

/// 不小于 i 的最近字符边界
pub fn ceil_char_boundary(text: &str, i: usize) -> usize {
    let mut i = i;
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i.min(text.len())
}

fn unit_multiplier(unit: &str) -> f64 {
    match unit.to_uppercase().as_str() {
        "B" => 1.0,
        "KB" => 1024.0,
        "MB" => 1024.0_f64.powi(2),
        "GB" => 1024.0_f64.powi(3),
        "TB" => 1024.0_f64.powi(4),
        "PB" => 1024.0_f64.powi(5),
        "EB" => 1024.0_f64.powi(6),
        _ => 1.0,
    }
}

/// 将 "1.5 GB" 这样的体积表达式解析为字节数, 整段匹配
pub fn parse_size_to_bytes(text: &str) -> Option<u64> {
    let caps = FILE_SIZE_RE.captures(text)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some((value * unit_multiplier(caps.get(2)?.as_str())) as u64)
}

/// 在任意文本中查找体积表达式并解析为字节数
pub fn size_in_text(text: &str) -> Option<u64> {
    let caps = SIZE_IN_TEXT_RE.captures(text)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    Some((value * unit_multiplier(caps.get(2)?.as_str())) as u64)
}

/// 渲染跳转链接模板, `${code}` 替换为番号
pub fn render_link_template(template: &str, code: &str) -> String {
    template.replace("${code}", code)
}

/// URL 的路径部分, 不含查询串和片段
pub fn url_path(url: &str) -> &str {
    let rest = match url.find("://") {
        Some(idx) => &url[idx + 3..],
        None => url,
    };
    let path = match rest.find('/') {
        Some(idx) => &rest[idx..],
        None => "/",
    };
    let end = path
        .find(['?', '#'])
        .unwrap_or(path.len());
    &path[..end]
}

/// URL 查询串中某个键的值, 不做解码
pub fn query_param<'a>(url: &'a str, key: &str) -> Option<&'a str> {
    let query_start = url.find('?')? + 1;
    let query = &url[query_start..];
    let query = &query[..query.find('#').unwrap_or(query.len())];
    for pair in query.split('&') {
        if let Some((k, v)) = pair.split_once('=')
            && k == key
        {
            return Some(v);
        }
    }
    None
}
