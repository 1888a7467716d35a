//! 触发引擎错误类型
//!
//! 配置错误在编译期同步抛出；匹配期只可能出现内部不变量被破坏。

use thiserror::Error;

/// 触发引擎结果类型
pub type TriggerResult<T> = Result<T, TriggerError>;

/// 触发词形式（用于错误定位）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    /// 原文形式
    Raw,
    /// 拼音形式
    Phonetic,
}

impl std::fmt::Display for FormKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormKind::Raw => f.write_str("raw"),
            FormKind::Phonetic => f.write_str("phonetic"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TriggerError {
    /// 触发词标识为空
    #[error("触发词标识不能为空")]
    EmptyId,

    /// 触发词标识重复
    #[error("触发词标识重复: {0}")]
    DuplicateId(String),

    /// 原文与拼音形式均未配置
    #[error("触发词 {id} 至少需要原文或拼音形式之一")]
    MissingForm { id: String },

    /// 零长度的原文或拼音形式
    #[error("触发词 {id} 的 {form} 形式为空")]
    EmptyPattern { id: String, form: FormKind },

    /// 无法解析的拼音音节
    #[error("触发词 {id} 包含无法解析的音节: {syllable:?}")]
    InvalidSyllable { id: String, syllable: String },

    /// 严格声调模式下音节缺少声调
    #[error("触发词 {id} 的音节 {syllable:?} 缺少声调（严格声调模式）")]
    MissingTone { id: String, syllable: String },

    /// 权重不是有限数
    #[error("触发词 {id} 的权重无效")]
    InvalidWeight { id: String },

    /// 词库条目无效
    #[error("词库条目 {word:?} 无效: {reason}")]
    InvalidLexiconEntry { word: String, reason: String },

    /// 自动机内部不变量被破坏（缺陷，而非用户输入问题）
    #[error("自动机不变量被破坏: {0}")]
    Invariant(String),
}

impl TriggerError {
    /// 是否为配置错误
    pub fn is_config_error(&self) -> bool {
        !matches!(self, TriggerError::Invariant(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_classification() {
        assert!(TriggerError::DuplicateId("a".into()).is_config_error());
        assert!(TriggerError::EmptyId.is_config_error());
        assert!(!TriggerError::Invariant("bad".into()).is_config_error());
    }

    #[test]
    fn test_error_message_names_pattern() {
        let err = TriggerError::EmptyPattern {
            id: "greet".into(),
            form: FormKind::Phonetic,
        };
        let msg = err.to_string();
        assert!(msg.contains("greet"));
        assert!(msg.contains("phonetic"));
    }
}
