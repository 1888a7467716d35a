//! 触发词检测引擎
//!
//! 在流式转写的文本片段中检测预先配置的触发词，支持原文精确匹配与
//! 拼音同音匹配（如 "泥镐" 命中 "你好"）。
//!
//! ## 处理流程
//! 1. 编译：校验触发词配置，构建原文自动机与拼音自动机
//! 2. 原文扫描：宽度/大小写归一化后逐字符推进自动机
//! 3. 拼音扫描：文本规范化为逐字候选读音，多音字并行推进
//! 4. 合并：同一触发词的重叠命中去重（原文优先），按位置/权重/ID 排序
//!
//! 重新加载在后台编译，完成后整体替换，扫描方永远不会看到半成品。

mod automaton;
mod compiler;
mod engine;
mod error;
mod lexicon;
mod matcher;
mod phonetic;
mod syllable;
mod tokenizer;
mod types;

pub use automaton::{Automaton, AutomatonBuilder, Output, StateId, ROOT};
pub use compiler::{CompiledTriggers, PatternCompiler};
pub use engine::{ActiveTriggers, TriggerEngine};
pub use error::{FormKind, TriggerError, TriggerResult};
pub use lexicon::{Lexicon, LexiconEntry, LexiconRecord, WordSpan};
pub use matcher::TriggerMatcher;
pub use phonetic::{NormalizedSegment, PhoneticNormalizer, ReadingSet, ReadingSource};
pub use syllable::{split_syllables, PhoneticToken, Syllable, NEUTRAL_TONE};
pub use tokenizer::{fold_case, fold_char, fold_width, Token, TokenType, Tokenizer};
pub use types::{
    MatchEvent, MatchKind, MatchPolicy, MatchSet, Pattern, PatternRecord, PhoneticForm,
    ReloadOutcome, TonePolicy,
};
