//! 扫描汇总

use serde::{Deserialize, Serialize};

use super::{Family, LinkHit};
use crate::dom::DomPatch;

/// 汇总中的一个番号条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeEntry {
    pub code: String,
    #[serde(rename = "type")]
    pub family: Family,
    /// 容器元素的 CSS 路径
    pub container: String,
    /// 番号字段的 CSS 路径
    pub code_field: Option<String>,
}

/// 一次页面扫描的汇总, 交给外壳回放
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub site: String,
    pub codes: Vec<CodeEntry>,
    pub links: Vec<LinkHit>,
    pub patches: Vec<DomPatch>,
}
