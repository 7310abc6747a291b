//! 实例选择策略
//!
//! 从注册中心返回的实例中选出一个。调用链只依赖 [`InstanceSelector`]，
//! 换成负载均衡策略时不需要改动调用链。

use crate::discovery::instance::ServiceInstance;

/// 实例选择器
pub trait InstanceSelector: Send + Sync {
    /// 选择一个实例；列表为空时返回 `None`
    fn select<'a>(&self, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance>;
}

/// 总是选第一个实例
///
/// 结果只取决于注册中心返回的顺序，注册表不变时重复调用结果相同。
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstInstance;

impl InstanceSelector for FirstInstance {
    fn select<'a>(&self, instances: &'a [ServiceInstance]) -> Option<&'a ServiceInstance> {
        instances.first()
    }
}
