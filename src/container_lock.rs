// ==========================================
// 危废桶监控系统 - 容器级互斥
// ==========================================
// 职责: 同一容器的 读数→告警 / 结算 / 复位 / 手动状态变更 串行执行
// 约束: 不同容器互不阻塞
// 加锁顺序: 先容器锁, 再数据库连接锁
// ==========================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// 按容器编号分配的互斥锁表
#[derive(Default)]
pub struct ContainerLockManager {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ContainerLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, container_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
        locks
            .entry(container_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// 在容器的独占区内执行 `f`
    ///
    /// 锁中毒（持有者 panic）不会阻断后续操作: 独占区内的写入都在事务里,
    /// panic 时事务已回滚
    pub fn with_container<T>(&self, container_id: &str, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(container_id);
        let _release = Release {
            manager: self,
            container_id,
            lock: &lock,
        };
        let _guard: MutexGuard<'_, ()> = lock.lock().unwrap_or_else(|p| p.into_inner());
        f()
    }

    /// 已分配锁的容器数量
    pub fn tracked(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }
}

/// 离开独占区时回收无人使用的表项 (panic 时同样执行)
struct Release<'a> {
    manager: &'a ContainerLockManager,
    container_id: &'a str,
    lock: &'a Arc<Mutex<()>>,
}

impl Drop for Release<'_> {
    fn drop(&mut self) {
        let mut locks = self.manager.locks.lock().unwrap_or_else(|p| p.into_inner());
        // 表项 + 本次持有 = 2: 没有其它线程在等待或持有
        let idle = locks
            .get(self.container_id)
            .map(|entry| Arc::ptr_eq(entry, self.lock) && Arc::strong_count(self.lock) == 2)
            .unwrap_or(false);
        if idle {
            locks.remove(self.container_id);
        }
    }
}
