//! 触发引擎类型定义

use serde::{Deserialize, Serialize};

use crate::trigger::syllable::PhoneticToken;

/// 声调策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TonePolicy {
    /// 严格：音节与声调都必须一致（默认）
    #[default]
    Strict,
    /// 无调：仅比较无调拼音
    Toneless,
}

/// 匹配策略
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MatchPolicy {
    /// 声调策略
    #[serde(default)]
    pub tone: TonePolicy,
    /// 仅配置原文的触发词，是否由原文推导拼音形式
    #[serde(default)]
    pub derive_phonetic_from_raw: bool,
}

/// 拼音形式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneticForm {
    /// 待规范化的文本（如 "你好"）
    Text(String),
    /// 预先给出的音节（如 ["ni3", "hao3"] 或 ["ni3-hao3"]）
    Syllables(Vec<String>),
}

/// 触发词配置记录（配置加载方提供）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternRecord {
    /// 唯一标识
    pub id: String,
    /// 原文形式
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    /// 拼音形式
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<PhoneticForm>,
    /// 权重（越大越优先）
    #[serde(default = "default_weight")]
    pub weight: f32,
    /// 是否区分大小写
    #[serde(default)]
    pub case_sensitive: bool,
}

fn default_weight() -> f32 {
    1.0
}

impl PatternRecord {
    /// 仅原文的触发词
    pub fn raw(id: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            raw: Some(raw.into()),
            phonetic: None,
            weight: default_weight(),
            case_sensitive: false,
        }
    }

    /// 仅拼音的触发词（文本形式）
    pub fn phonetic_text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            raw: None,
            phonetic: Some(PhoneticForm::Text(text.into())),
            weight: default_weight(),
            case_sensitive: false,
        }
    }

    pub fn with_phonetic(mut self, form: PhoneticForm) -> Self {
        self.phonetic = Some(form);
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}

/// 编译后的触发词（只读）
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub id: String,
    /// 原文（宽度归一化后）
    pub raw: Option<Vec<char>>,
    /// 拼音符号序列（已按声调策略投影）
    pub phonetic: Option<Vec<PhoneticToken>>,
    pub weight: f32,
    pub case_sensitive: bool,
}

/// 匹配类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// 原文精确匹配
    Exact,
    /// 拼音（同音）匹配
    Phonetic,
}

/// 匹配事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    /// 触发词标识
    pub pattern_id: String,
    /// 匹配类型
    pub kind: MatchKind,
    /// 起始位置（字符索引）
    pub start: usize,
    /// 结束位置（字符索引，不含）
    pub end: usize,
    /// 原文中被匹配的片段
    pub text: String,
    /// 被匹配的音节（仅拼音匹配）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub syllables: Vec<String>,
    /// 继承自触发词的权重
    pub weight: f32,
}

impl MatchEvent {
    /// 区间是否重叠
    pub fn overlaps(&self, other: &MatchEvent) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// 单个片段的匹配结果
///
/// 按起始位置升序、权重降序、标识升序排列，且已去重
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchSet {
    pub events: Vec<MatchEvent>,
    /// 无已知读音、按原样透传的汉字数（仅在有拼音触发词时统计）
    #[serde(default, skip_serializing_if = "is_zero")]
    pub gaps: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl MatchSet {
    /// 创建空结果
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MatchEvent> {
        self.events.iter()
    }

    /// 是否包含指定触发词
    pub fn contains(&self, pattern_id: &str) -> bool {
        self.events.iter().any(|e| e.pattern_id == pattern_id)
    }

    /// 按顺序返回触发词标识
    pub fn pattern_ids(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.pattern_id.as_str()).collect()
    }
}

impl IntoIterator for MatchSet {
    type Item = MatchEvent;
    type IntoIter = std::vec::IntoIter<MatchEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

/// 重新加载结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// 配置未变化，沿用当前自动机
    Unchanged { generation: u64 },
    /// 已发布新自动机
    Replaced { generation: u64, patterns: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_record_deserialize_defaults() {
        let record: PatternRecord = serde_json::from_str(r#"{"id": "greet", "raw": "你好"}"#).unwrap();
        assert_eq!(record.id, "greet");
        assert_eq!(record.raw.as_deref(), Some("你好"));
        assert_eq!(record.phonetic, None);
        assert_eq!(record.weight, 1.0);
        assert!(!record.case_sensitive);
    }

    #[test]
    fn test_phonetic_form_deserialize() {
        let record: PatternRecord = serde_json::from_str(
            r#"{"id": "greet", "phonetic": {"syllables": ["ni3", "hao3"]}, "weight": 2.5}"#,
        )
        .unwrap();
        assert_eq!(
            record.phonetic,
            Some(PhoneticForm::Syllables(vec!["ni3".into(), "hao3".into()]))
        );
        assert_eq!(record.weight, 2.5);

        let record: PatternRecord =
            serde_json::from_str(r#"{"id": "greet", "phonetic": {"text": "你好"}}"#).unwrap();
        assert_eq!(record.phonetic, Some(PhoneticForm::Text("你好".into())));
    }

    #[test]
    fn test_match_policy_defaults() {
        let policy: MatchPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy.tone, TonePolicy::Strict);
        assert!(!policy.derive_phonetic_from_raw);

        let policy: MatchPolicy = serde_json::from_str(r#"{"tone": "toneless"}"#).unwrap();
        assert_eq!(policy.tone, TonePolicy::Toneless);
    }

    #[test]
    fn test_event_overlap() {
        let event = |start, end| MatchEvent {
            pattern_id: "p".into(),
            kind: MatchKind::Exact,
            start,
            end,
            text: String::new(),
            syllables: Vec::new(),
            weight: 1.0,
        };
        assert!(event(0, 2).overlaps(&event(1, 3)));
        assert!(!event(0, 2).overlaps(&event(2, 4)));
    }
}
