//! 流式转写触发词检测
//!
//! - [`trigger`]：触发词编译、原文/拼音匹配与热重载
//! - [`config`]：触发词配置的加载与保存

pub mod config;
pub mod trigger;

pub use config::TriggerConfig;
pub use trigger::{MatchEvent, MatchKind, MatchSet, ReloadOutcome, TriggerEngine, TriggerError};
