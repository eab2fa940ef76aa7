//! 番号识别与站点路由

/*
 * Copyright (c) 2025 fltLi
 *
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

#![allow(dead_code)]

pub mod consts;
pub mod dom;
pub mod extract;
pub mod matcher;
pub mod models;
pub mod patterns;
pub mod sites;
pub mod strategies;
mod factory;
mod traits;
mod utils;

pub use extract::extract;
pub use factory::{detect, is_supported, route, scan};
pub use strategies::base::BaseScraper;
pub use traits::Scraper;
pub use utils::{parse_size_to_bytes, size_in_text};

pub mod error {
    //! 错误类型

    pub type Result<T> = std::result::Result<T, Error>;

    /// 通用错误
    #[derive(Debug, thiserror::Error)]
    pub enum Error {
        #[error("no site matched url: {0}")]
        NoSite(String),
        #[error("config error: {0}")]
        Config(ConfigError),
    }

    /// 站点配置错误, 构造策略时致命
    #[derive(Debug, thiserror::Error)]
    #[error("site {site} misconfigured: {kind}")]
    pub struct ConfigError {
        #[source]
        pub kind: ConfigErrorKind,
        pub site: &'static str,
    }

    impl ConfigError {
        pub fn new(site: &'static str, kind: ConfigErrorKind) -> Self {
            Self { kind, site }
        }
    }

    /// 配置错误类型
    #[derive(Debug, thiserror::Error)]
    pub enum ConfigErrorKind {
        #[error("missing locator: {0}")]
        MissingLocator(&'static str),
        #[error("selector parse error: {0}")]
        BadSelector(String),
    }

    impl From<ConfigError> for Error {
        fn from(e: ConfigError) -> Self {
            Error::Config(e)
        }
    }
}
