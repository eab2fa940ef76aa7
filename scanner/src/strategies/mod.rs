//! 站点策略实现

pub mod base;

pub mod fc2;
pub mod javbus;
pub mod javdb;
pub mod javlibrary;
pub mod jinjier;

/// 收集注册的策略, 顺序与站点注册表一致, 先匹配者胜.
///
/// 由于 linkme 分布式注册表的依赖问题, wasm 编译将报错.
/// 现已移除 linkme 并全部替换为手动实现的注册表.
pub(crate) fn registry_items() -> Vec<crate::factory::StrategyRegistryItem> {
    vec![
        javlibrary::__STRATEGY_REGISTRY_JAVLIBRARYSTRATEGY(),
        javdb::__STRATEGY_REGISTRY_JAVDBSTRATEGY(),
        jinjier::__STRATEGY_REGISTRY_JINJIERSTRATEGY(),
        fc2::__STRATEGY_REGISTRY_FC2STRATEGY(),
        javbus::__STRATEGY_REGISTRY_JAVBUSSTRATEGY(),
    ]
}
