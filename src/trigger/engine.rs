//! 触发引擎主入口
//!
//! 编译在发布锁之外进行，新自动机构建完成后在写锁内替换一个 `Arc`，
//! 读者要么看到完整的旧自动机，要么看到完整的新自动机。

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::config::TriggerConfig;
use crate::trigger::compiler::{CompiledTriggers, PatternCompiler};
use crate::trigger::error::TriggerResult;
use crate::trigger::matcher::TriggerMatcher;
use crate::trigger::types::{MatchSet, ReloadOutcome};

/// 已发布的触发词集合
#[derive(Debug)]
pub struct ActiveTriggers {
    /// 发布代数（空引擎为 0）
    pub generation: u64,
    /// 配置指纹
    pub fingerprint: String,
    pub triggers: CompiledTriggers,
}

impl ActiveTriggers {
    /// 扫描文本片段
    pub fn scan(&self, text: &str, case_override: Option<bool>) -> TriggerResult<MatchSet> {
        TriggerMatcher::new(&self.triggers).scan(text, case_override)
    }
}

/// 触发引擎（可在多线程间共享）
pub struct TriggerEngine {
    active: RwLock<Arc<ActiveTriggers>>,
    /// 串行化重新加载，保证代数与指纹检查一致
    reload_lock: Mutex<()>,
}

impl TriggerEngine {
    /// 创建空引擎（无触发词）
    pub fn new() -> Self {
        let active = ActiveTriggers {
            generation: 0,
            fingerprint: TriggerConfig::default().fingerprint(),
            triggers: CompiledTriggers::empty(),
        };
        Self {
            active: RwLock::new(Arc::new(active)),
            reload_lock: Mutex::new(()),
        }
    }

    /// 从配置创建引擎
    pub fn from_config(config: &TriggerConfig) -> TriggerResult<Self> {
        let engine = Self::new();
        engine.reload(config)?;
        Ok(engine)
    }

    /// 当前发布的触发词集合
    ///
    /// 返回的快照在调用方持有期间保持不变，不受后续重新加载影响
    pub fn snapshot(&self) -> Arc<ActiveTriggers> {
        // 锁内只有一次 Arc 替换，中毒时数据仍然完整
        let active = self.active.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&active)
    }

    /// 当前发布代数
    pub fn generation(&self) -> u64 {
        self.snapshot().generation
    }

    /// 重新加载配置
    ///
    /// - 配置指纹未变化时直接返回 `Unchanged`
    /// - 编译失败时返回错误，之前的自动机继续生效
    pub fn reload(&self, config: &TriggerConfig) -> TriggerResult<ReloadOutcome> {
        let _guard = self.reload_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let fingerprint = config.fingerprint();
        let current = self.snapshot();
        if current.fingerprint == fingerprint {
            tracing::debug!("触发词配置未变化，跳过重新加载 (generation={})", current.generation);
            return Ok(ReloadOutcome::Unchanged {
                generation: current.generation,
            });
        }

        let triggers = PatternCompiler::new(config.policy.clone(), &config.lexicon)
            .and_then(|compiler| compiler.compile(&config.patterns))
            .map_err(|e| {
                tracing::warn!(
                    "触发词配置无效，保留当前自动机 (generation={}): {}",
                    current.generation,
                    e
                );
                e
            })?;

        let generation = current.generation + 1;
        let patterns = triggers.patterns().len();
        let short_fingerprint: String = fingerprint.chars().take(12).collect();
        let next = Arc::new(ActiveTriggers {
            generation,
            fingerprint,
            triggers,
        });

        {
            let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
            *active = next;
        }

        tracing::info!(
            "触发词已重新加载: generation={}, patterns={}, fingerprint={}",
            generation,
            patterns,
            short_fingerprint
        );

        Ok(ReloadOutcome::Replaced {
            generation,
            patterns,
        })
    }

    /// 扫描文本片段
    ///
    /// # Arguments
    /// * `text` - 文本片段
    /// * `case_override` - 覆盖所有触发词的大小写敏感设置
    pub fn scan(&self, text: &str, case_override: Option<bool>) -> TriggerResult<MatchSet> {
        let active = self.snapshot();
        active.scan(text, case_override).map_err(|e| {
            tracing::error!("触发词扫描中止 (generation={}): {}", active.generation, e);
            e
        })
    }
}

impl Default for TriggerEngine {
    fn default() -> Self {
        Self::new()
    }
}
