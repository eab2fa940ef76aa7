//! DOM 标记常量

/// 容器已处理标记
pub const DATA_PROCESSED: &str = "data-jv-processed";
/// 番号字段标记, 值为规范化番号
pub const DATA_CODE: &str = "data-jv-code";
/// 合成标题缓存
pub const DATA_FAKE_TITLE: &str = "data-jv-fake-title";
/// 高亮前的 outline 快照
pub const DATA_OUTLINE: &str = "data-jv-outline";
/// outline 快照的 important 标记
pub const DATA_OUTLINE_PRIORITY: &str = "data-jv-outline-priority";

/// 番号链接
pub const CLASS_LINK: &str = "jv-link";
/// 高亮标记
pub const CLASS_HIGHLIGHT: &str = "jv-highlight";
/// 隐藏标记
pub const CLASS_HIDDEN: &str = "jv-hidden";
/// 已入库标记
pub const CLASS_EXISTING: &str = "jv-existing";
