//! 触发词编译
//!
//! 校验配置记录并构建两个只读自动机：
//! - 原文自动机：以（宽度、大小写归一化后的）字符为符号
//! - 拼音自动机：以音节/字面符号为符号
//!
//! 编译前按标识排序，保证相同配置在任意插入顺序下得到相同的自动机。

use std::collections::HashSet;

use crate::trigger::automaton::{Automaton, AutomatonBuilder};
use crate::trigger::error::{FormKind, TriggerError, TriggerResult};
use crate::trigger::lexicon::{Lexicon, LexiconRecord};
use crate::trigger::phonetic::PhoneticNormalizer;
use crate::trigger::syllable::{split_syllables, PhoneticToken, Syllable};
use crate::trigger::tokenizer::{fold_case, fold_width, Tokenizer};
use crate::trigger::types::{MatchPolicy, Pattern, PatternRecord, PhoneticForm, TonePolicy};

/// 编译结果（构建后只读，可在多线程间共享）
#[derive(Debug, Clone)]
pub struct CompiledTriggers {
    patterns: Vec<Pattern>,
    exact: Automaton<char>,
    phonetic: Automaton<PhoneticToken>,
    normalizer: PhoneticNormalizer,
}

impl CompiledTriggers {
    /// 空触发词集合
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            exact: Automaton::empty(),
            phonetic: Automaton::empty(),
            normalizer: PhoneticNormalizer::default(),
        }
    }

    /// 按标识排序的触发词
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn pattern(&self, idx: usize) -> Option<&Pattern> {
        self.patterns.get(idx)
    }

    pub fn exact(&self) -> &Automaton<char> {
        &self.exact
    }

    pub fn phonetic(&self) -> &Automaton<PhoneticToken> {
        &self.phonetic
    }

    pub fn normalizer(&self) -> &PhoneticNormalizer {
        &self.normalizer
    }
}

impl Default for CompiledTriggers {
    fn default() -> Self {
        Self::empty()
    }
}

/// 触发词编译器
pub struct PatternCompiler {
    policy: MatchPolicy,
    normalizer: PhoneticNormalizer,
}

impl PatternCompiler {
    /// 创建编译器
    ///
    /// # Arguments
    /// * `policy` - 匹配策略
    /// * `lexicon` - 额外的读音词条（与内置词库合并）
    pub fn new(policy: MatchPolicy, lexicon: &[LexiconRecord]) -> TriggerResult<Self> {
        let lexicon = Lexicon::with_records(lexicon)?;
        let normalizer = PhoneticNormalizer::new(lexicon, policy.tone);
        Ok(Self { policy, normalizer })
    }

    /// 编译触发词集合
    pub fn compile(self, records: &[PatternRecord]) -> TriggerResult<CompiledTriggers> {
        Self::check_ids(records)?;

        let mut ordered: Vec<&PatternRecord> = records.iter().collect();
        ordered.sort_by(|a, b| a.id.cmp(&b.id));

        let patterns = ordered
            .into_iter()
            .map(|record| self.compile_pattern(record))
            .collect::<TriggerResult<Vec<_>>>()?;

        let mut exact = AutomatonBuilder::new();
        let mut phonetic = AutomatonBuilder::new();
        for (idx, pattern) in patterns.iter().enumerate() {
            if let Some(raw) = &pattern.raw {
                // 原文自动机统一按小写构建，区分大小写的触发词在匹配时复核
                let folded: Vec<char> = raw.iter().map(|&ch| fold_case(ch)).collect();
                exact.insert(&folded, idx);
            }
            if let Some(tokens) = &pattern.phonetic {
                phonetic.insert(tokens, idx);
            }
        }

        let exact = exact.build();
        let phonetic = phonetic.build();
        exact.validate()?;
        phonetic.validate()?;

        tracing::debug!(
            "触发词编译完成: {} 个触发词, 原文自动机 {} 状态, 拼音自动机 {} 状态",
            patterns.len(),
            exact.len(),
            phonetic.len()
        );

        Ok(CompiledTriggers {
            patterns,
            exact,
            phonetic,
            normalizer: self.normalizer,
        })
    }

    /// 标识非空且唯一
    fn check_ids(records: &[PatternRecord]) -> TriggerResult<()> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());
        for record in records {
            if record.id.is_empty() {
                return Err(TriggerError::EmptyId);
            }
            if !seen.insert(record.id.as_str()) {
                return Err(TriggerError::DuplicateId(record.id.clone()));
            }
        }
        Ok(())
    }

    fn compile_pattern(&self, record: &PatternRecord) -> TriggerResult<Pattern> {
        if !record.weight.is_finite() {
            return Err(TriggerError::InvalidWeight {
                id: record.id.clone(),
            });
        }

        let raw = match &record.raw {
            Some(text) if text.is_empty() => {
                return Err(TriggerError::EmptyPattern {
                    id: record.id.clone(),
                    form: FormKind::Raw,
                })
            }
            Some(text) => Some(text.chars().map(fold_width).collect::<Vec<char>>()),
            None => None,
        };

        let phonetic = match &record.phonetic {
            Some(form) => Some(self.compile_phonetic(&record.id, form)?),
            None => self.derive_phonetic(record.raw.as_deref()),
        };

        if raw.is_none() && phonetic.is_none() {
            return Err(TriggerError::MissingForm {
                id: record.id.clone(),
            });
        }

        Ok(Pattern {
            id: record.id.clone(),
            raw,
            phonetic,
            weight: record.weight,
            case_sensitive: record.case_sensitive,
        })
    }

    fn compile_phonetic(&self, id: &str, form: &PhoneticForm) -> TriggerResult<Vec<PhoneticToken>> {
        let tokens = match form {
            PhoneticForm::Text(text) => self.normalizer.normalize(text).primary_tokens(),
            PhoneticForm::Syllables(entries) => entries
                .iter()
                .flat_map(|entry| split_syllables(entry))
                .map(|written| self.parse_syllable(id, written))
                .collect::<TriggerResult<Vec<_>>>()?,
        };

        if tokens.is_empty() {
            return Err(TriggerError::EmptyPattern {
                id: id.to_string(),
                form: FormKind::Phonetic,
            });
        }
        Ok(tokens)
    }

    fn parse_syllable(&self, id: &str, written: &str) -> TriggerResult<PhoneticToken> {
        let syllable = Syllable::parse(written).ok_or_else(|| TriggerError::InvalidSyllable {
            id: id.to_string(),
            syllable: written.to_string(),
        })?;

        if self.policy.tone == TonePolicy::Strict && syllable.tone.is_none() {
            return Err(TriggerError::MissingTone {
                id: id.to_string(),
                syllable: written.to_string(),
            });
        }

        Ok(PhoneticToken::Syllable(syllable.project(self.policy.tone)))
    }

    /// 由含汉字的原文推导拼音形式（需开启 derive_phonetic_from_raw）
    fn derive_phonetic(&self, raw: Option<&str>) -> Option<Vec<PhoneticToken>> {
        let raw = raw.filter(|_| self.policy.derive_phonetic_from_raw)?;
        if !raw.chars().any(Tokenizer::is_cjk) {
            return None;
        }
        let tokens = self.normalizer.normalize(raw).primary_tokens();
        (!tokens.is_empty()).then_some(tokens)
    }
}
