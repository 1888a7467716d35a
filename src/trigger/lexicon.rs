//! 读音词库
//!
//! 多音字在词中读音固定（银行 / 行长），按词库做最长匹配分词后再回退到逐字多音。

use std::collections::BTreeMap;

use aho_corasick::{AhoCorasick, MatchKind};
use serde::{Deserialize, Serialize};

use crate::trigger::error::{TriggerError, TriggerResult};
use crate::trigger::syllable::{split_syllables, Syllable};

/// 内置词条：（词，读音）
const BUILTIN_WORDS: &[(&str, &str)] = &[
    ("银行", "yin2 hang2"),
    ("行长", "hang2 zhang3"),
    ("长大", "zhang3 da4"),
    ("长城", "chang2 cheng2"),
    ("重庆", "chong2 qing4"),
    ("重要", "zhong4 yao4"),
    ("重新", "chong2 xin1"),
    ("音乐", "yin1 yue4"),
    ("快乐", "kuai4 le4"),
    ("觉得", "jue2 de5"),
    ("睡觉", "shui4 jiao4"),
    ("记得", "ji4 de5"),
    ("还是", "hai2 shi4"),
    ("还有", "hai2 you3"),
    ("为了", "wei4 le5"),
    ("因为", "yin1 wei4"),
    ("了解", "liao3 jie3"),
    ("得到", "de2 dao4"),
    ("朝阳", "zhao1 yang2"),
    ("地方", "di4 fang5"),
    ("东西", "dong1 xi5"),
    ("时候", "shi2 hou5"),
    ("什么", "shen2 me5"),
    ("怎么", "zen3 me5"),
    ("头发", "tou2 fa5"),
    ("发现", "fa1 xian4"),
    ("便宜", "pian2 yi5"),
    ("方便", "fang1 bian4"),
    ("提醒", "ti2 xing3"),
    ("记住", "ji4 zhu4"),
    ("数据", "shu4 ju4"),
    ("会计", "kuai4 ji4"),
    ("角色", "jue2 se4"),
    ("处理", "chu3 li3"),
    ("喜欢", "xi3 huan5"),
    ("明白", "ming2 bai5"),
    ("朋友", "peng2 you5"),
];

lazy_static::lazy_static! {
    /// 解析后的内置词条
    static ref BUILTIN_ENTRIES: Vec<LexiconEntry> = BUILTIN_WORDS
        .iter()
        .filter_map(|(word, readings)| match LexiconEntry::parse(word, readings) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("跳过无效的内置词条: {}", e);
                None
            }
        })
        .collect();
}

/// 词库配置记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconRecord {
    /// 词
    pub word: String,
    /// 读音（空格分隔，如 "yin2 hang2"）
    pub readings: String,
}

/// 词条
#[derive(Debug, Clone, PartialEq)]
pub struct LexiconEntry {
    pub word: String,
    /// 每个字一个读音
    pub readings: Vec<Syllable>,
}

impl LexiconEntry {
    /// 解析词条，读音数必须与字数一致
    pub fn parse(word: &str, readings: &str) -> TriggerResult<Self> {
        let invalid = |reason: String| TriggerError::InvalidLexiconEntry {
            word: word.to_string(),
            reason,
        };

        if word.is_empty() {
            return Err(invalid("词为空".to_string()));
        }

        let readings = split_syllables(readings)
            .map(|r| Syllable::parse_reading(r).ok_or_else(|| invalid(format!("无法解析读音 {:?}", r))))
            .collect::<TriggerResult<Vec<_>>>()?;

        let char_count = word.chars().count();
        if readings.len() != char_count {
            return Err(invalid(format!(
                "读音数 {} 与字数 {} 不一致",
                readings.len(),
                char_count
            )));
        }

        Ok(Self {
            word: word.to_string(),
            readings,
        })
    }
}

/// 分词结果中的词（字符索引，相对于输入文本）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordSpan {
    pub start: usize,
    pub end: usize,
    /// 词条索引
    pub entry: usize,
}

/// 读音词库（编译后只读）
#[derive(Debug, Clone)]
pub struct Lexicon {
    entries: Vec<LexiconEntry>,
    finder: Option<AhoCorasick>,
}

impl Lexicon {
    /// 仅内置词条
    pub fn builtin() -> Self {
        // 内置词条已去重，构建失败时退化为空词库
        Self::from_entries(BUILTIN_ENTRIES.clone()).unwrap_or_else(|e| {
            tracing::warn!("内置词库构建失败，退化为逐字读音: {}", e);
            Self::empty()
        })
    }

    /// 空词库
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            finder: None,
        }
    }

    /// 内置词条 + 配置词条（同词以配置为准）
    pub fn with_records(records: &[LexiconRecord]) -> TriggerResult<Self> {
        let mut entries = BUILTIN_ENTRIES.clone();
        for record in records {
            entries.push(LexiconEntry::parse(&record.word, &record.readings)?);
        }
        Self::from_entries(entries)
    }

    fn from_entries(entries: Vec<LexiconEntry>) -> TriggerResult<Self> {
        // 后出现的同词条目覆盖前者；BTreeMap 保证构建顺序确定
        let by_word: BTreeMap<String, Vec<Syllable>> = entries
            .into_iter()
            .map(|e| (e.word, e.readings))
            .collect();

        let entries: Vec<LexiconEntry> = by_word
            .into_iter()
            .map(|(word, readings)| LexiconEntry { word, readings })
            .collect();

        if entries.is_empty() {
            return Ok(Self::empty());
        }

        let finder = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(entries.iter().map(|e| e.word.as_str()))
            .map_err(|e| TriggerError::InvalidLexiconEntry {
                word: String::new(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            entries,
            finder: Some(finder),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, idx: usize) -> Option<&LexiconEntry> {
        self.entries.get(idx)
    }

    /// 最长匹配分词
    ///
    /// 返回不重叠的词，按位置升序
    pub fn segment(&self, text: &str) -> Vec<WordSpan> {
        let Some(finder) = &self.finder else {
            return Vec::new();
        };

        // 字节偏移 → 字符索引
        let byte_starts: Vec<usize> = text.char_indices().map(|(idx, _)| idx).collect();
        let to_char = |byte: usize| match byte_starts.binary_search(&byte) {
            Ok(idx) => idx,
            Err(_) => byte_starts.len(),
        };

        finder
            .find_iter(text)
            .map(|m| WordSpan {
                start: to_char(m.start()),
                end: to_char(m.end()),
                entry: m.pattern().as_usize(),
            })
            .collect()
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_entries_all_parse() {
        assert_eq!(BUILTIN_ENTRIES.len(), BUILTIN_WORDS.len());
        let lexicon = Lexicon::builtin();
        assert_eq!(lexicon.len(), BUILTIN_WORDS.len());
    }

    #[test]
    fn test_entry_length_mismatch() {
        let result = LexiconEntry::parse("银行", "yin2");
        assert!(matches!(
            result,
            Err(TriggerError::InvalidLexiconEntry { .. })
        ));
    }

    #[test]
    fn test_entry_invalid_reading() {
        let result = LexiconEntry::parse("银行", "yin2 h@ng2");
        assert!(matches!(
            result,
            Err(TriggerError::InvalidLexiconEntry { .. })
        ));
    }

    #[test]
    fn test_segment_longest_match() {
        let lexicon = Lexicon::builtin();
        // "银行长" 中 "银行" 先被匹配（最左最长），"长" 回退到逐字
        let spans = lexicon.segment("去银行长见识");
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].start, spans[0].end), (1, 3));
        let entry = lexicon.entry(spans[0].entry).unwrap();
        assert_eq!(entry.word, "银行");
        assert_eq!(entry.readings[1].to_string(), "hang2");
    }

    #[test]
    fn test_record_overrides_builtin() {
        let lexicon = Lexicon::with_records(&[LexiconRecord {
            word: "银行".to_string(),
            readings: "yin2 xing2".to_string(),
        }])
        .unwrap();
        assert_eq!(lexicon.len(), BUILTIN_WORDS.len());

        let spans = lexicon.segment("银行");
        let entry = lexicon.entry(spans[0].entry).unwrap();
        assert_eq!(entry.readings[1].to_string(), "xing2");
    }

    #[test]
    fn test_record_adds_longer_word() {
        let lexicon = Lexicon::with_records(&[LexiconRecord {
            word: "招商银行".to_string(),
            readings: "zhao1 shang1 yin2 hang2".to_string(),
        }])
        .unwrap();
        let spans = lexicon.segment("招商银行");
        assert_eq!(spans.len(), 1);
        assert_eq!((spans[0].start, spans[0].end), (0, 4));
    }

    #[test]
    fn test_empty_lexicon_segments_nothing() {
        assert!(Lexicon::empty().segment("银行").is_empty());
    }
}
