/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::ToTokens;
use quote::{format_ident, quote};
use regex::Regex;
use syn::{Attribute, DeriveInput, parse_macro_input};

/// 策略属性
///
/// # 使用示例
///
/// 在策略类型上添加 `#[derive(Scrapable)]` 并使用 `#[site(...)]` 属性指定站点:
///
/// ```ignore
/// #[derive(Scrapable)]
/// #[site(name = "javbus")]
/// pub struct JavbusStrategy { /* .. */ }
/// ```
///
/// 支持的属性:
/// - `name = "..."`: 站点注册表中的站点名 (必须)
///
/// 该宏会为类型生成 `StrategyRegistry` 的实现: `matches` 委托给站点定义的
/// URL 匹配器, `new` 调用类型自身的 `create()` (构造可能因定位器配置错误而失败).
/// 同时生成一个返回注册项的函数, 由 `strategies::registry_items()` 按声明顺序收集.
#[derive(Debug)]
struct SiteAttributes {
    name: String,
}

impl SiteAttributes {
    fn from_attrs(attrs: &[Attribute]) -> Result<Self, syn::Error> {
        // 使用简单的字符串解析方式 (兼容不同版本的 syn) :
        // attr.tokens 的文本里包含形如: (name = "xxx").
        let mut name = None;

        let name_re = Regex::new(r#"name\s*=\s*\"([^\"]+)\""#).unwrap();

        for attr in attrs {
            if attr.path().is_ident("site") {
                // 将 Attribute 转为 token 字符串以便用正则解析
                let mut ts = proc_macro2::TokenStream::new();
                attr.to_tokens(&mut ts);
                let s = ts.to_string();
                if name.is_none()
                    && let Some(cap) = name_re.captures(&s)
                {
                    name = Some(cap.get(1).unwrap().as_str().to_string());
                }
            }
        }

        Ok(SiteAttributes {
            name: name.ok_or_else(|| {
                syn::Error::new_spanned(attrs.first().unwrap(), "Missing required attribute 'name'")
            })?,
        })
    }
}

#[proc_macro_derive(Scrapable, attributes(site))]
pub fn derive_scrapable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let attrs = match SiteAttributes::from_attrs(&input.attrs) {
        Ok(attrs) => attrs,
        Err(e) => return e.to_compile_error().into(),
    };

    let site_name = attrs.name;

    // 为每个策略生成唯一的注册函数名 (全部大写以符合静态变量命名规范)
    let registry_item_name =
        format_ident!("__STRATEGY_REGISTRY_{}", name.to_string().to_uppercase());

    let expanded = quote! {
        impl crate::traits::StrategyRegistry for #name {
            fn matches(url: &str) -> bool {
                crate::sites::get(#site_name)
                    .map(|site| site.matcher().test(url))
                    .unwrap_or(false)
            }

            fn new() -> crate::error::Result<Box<dyn crate::traits::Scraper>> {
                Ok(Box::new(#name::create()?))
            }
        }

        // 生成一个返回注册项的函数, 由手动注册表收集调用
        #[allow(non_snake_case)]
        pub fn #registry_item_name() -> crate::factory::StrategyRegistryItem {
            crate::factory::StrategyRegistryItem {
                name: #site_name,
                matches_fn: <#name as crate::traits::StrategyRegistry>::matches,
                creator: <#name as crate::traits::StrategyRegistry>::new,
            }
        }
    };

    expanded.into()
}
