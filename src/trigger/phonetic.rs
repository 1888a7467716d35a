//! 拼音规范化
//!
//! 将文本片段转换为逐字的候选读音集合：
//! 1. 分词（汉字/ASCII/空白/符号）
//! 2. 汉字片段先按词库最长匹配取词内读音
//! 3. 其余汉字取全部多音读音（首个为常用读音）
//! 4. 非汉字字符以自身作为唯一候选
//!
//! 无读音的汉字按原样透传（计入 gaps），绝不丢弃，保证位置映射不变。

use pinyin::ToPinyinMulti;

use crate::trigger::lexicon::Lexicon;
use crate::trigger::syllable::{PhoneticToken, Syllable};
use crate::trigger::tokenizer::{fold_char, fold_width, Token, TokenType, Tokenizer};
use crate::trigger::types::TonePolicy;

/// 读音来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingSource {
    /// 非汉字字符
    Literal,
    /// 词库词内读音
    Lexicon,
    /// 单字读音（可能多音）
    Character,
    /// 无已知读音，原样透传
    Gap,
}

/// 单个字符位置的候选读音
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingSet {
    /// 原文字符索引
    pub offset: usize,
    /// 原文字符
    pub ch: char,
    /// 候选符号（非空，首个为首选读音）
    pub candidates: Vec<PhoneticToken>,
    pub source: ReadingSource,
}

impl ReadingSet {
    fn literal(offset: usize, ch: char, source: ReadingSource) -> Self {
        Self {
            offset,
            ch,
            candidates: vec![PhoneticToken::Literal(fold_char(ch, true))],
            source,
        }
    }

    /// 首选读音
    pub fn primary(&self) -> Option<&PhoneticToken> {
        self.candidates.first()
    }
}

/// 规范化结果：每个原文字符对应一个候选集合
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedSegment {
    positions: Vec<ReadingSet>,
}

impl NormalizedSegment {
    pub fn positions(&self) -> &[ReadingSet] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// 无读音透传的字符数
    pub fn gaps(&self) -> usize {
        self.positions
            .iter()
            .filter(|p| p.source == ReadingSource::Gap)
            .count()
    }

    /// 逐位置取首选读音
    pub fn primary_tokens(&self) -> Vec<PhoneticToken> {
        self.positions
            .iter()
            .filter_map(|p| p.primary().cloned())
            .collect()
    }

    /// 将位置区间 [first, last) 映射回原文字符区间
    pub fn source_span(&self, first: usize, last: usize) -> Option<(usize, usize)> {
        if first >= last {
            return None;
        }
        let start = self.positions.get(first)?.offset;
        let end = self.positions.get(last - 1)?.offset + 1;
        Some((start, end))
    }
}

/// 拼音规范化器（纯函数，依赖只读词库）
#[derive(Debug, Clone)]
pub struct PhoneticNormalizer {
    lexicon: Lexicon,
    tone: TonePolicy,
}

impl PhoneticNormalizer {
    pub fn new(lexicon: Lexicon, tone: TonePolicy) -> Self {
        Self { lexicon, tone }
    }

    /// 规范化文本片段
    pub fn normalize(&self, text: &str) -> NormalizedSegment {
        let mut positions = Vec::new();

        for token in Tokenizer::tokenize(text) {
            if token.token_type == TokenType::Chinese {
                self.normalize_chinese(&token, &mut positions);
            } else {
                positions.extend(
                    token
                        .text
                        .chars()
                        .enumerate()
                        .map(|(i, ch)| ReadingSet::literal(token.start + i, ch, ReadingSource::Literal)),
                );
            }
        }

        let segment = NormalizedSegment { positions };
        let gaps = segment.gaps();
        if gaps > 0 {
            tracing::debug!("拼音规范化: {} 个汉字无已知读音，按原样透传", gaps);
        }
        segment
    }

    /// 汉字片段：词库最长匹配优先，其余逐字
    fn normalize_chinese(&self, token: &Token, out: &mut Vec<ReadingSet>) {
        let chars: Vec<char> = token.text.chars().collect();
        let mut words = self.lexicon.segment(&token.text).into_iter().peekable();
        let mut idx = 0;

        while idx < chars.len() {
            let word = words.next_if(|w| w.start == idx);
            if let Some(entry) = word.and_then(|w| self.lexicon.entry(w.entry)) {
                for (k, reading) in entry.readings.iter().enumerate() {
                    out.push(ReadingSet {
                        offset: token.start + idx + k,
                        ch: chars[idx + k],
                        candidates: vec![PhoneticToken::Syllable(reading.project(self.tone))],
                        source: ReadingSource::Lexicon,
                    });
                }
                idx += entry.readings.len();
                continue;
            }

            out.push(self.read_char(token.start + idx, chars[idx]));
            idx += 1;
        }
    }

    /// 单字读音（含多音）
    fn read_char(&self, offset: usize, ch: char) -> ReadingSet {
        let mut candidates: Vec<PhoneticToken> = Vec::new();

        // 兼容汉字先归一化到统一汉字再查读音
        if let Some(multi) = fold_width(ch).to_pinyin_multi() {
            for pinyin in multi {
                let Some(syllable) = Syllable::parse_reading(pinyin.with_tone_num_end()) else {
                    continue;
                };
                let token = PhoneticToken::Syllable(syllable.project(self.tone));
                // 无调模式下不同声调会合并
                if !candidates.contains(&token) {
                    candidates.push(token);
                }
            }
        }

        if candidates.is_empty() {
            return ReadingSet::literal(offset, ch, ReadingSource::Gap);
        }

        ReadingSet {
            offset,
            ch,
            candidates,
            source: ReadingSource::Character,
        }
    }
}

impl Default for PhoneticNormalizer {
    fn default() -> Self {
        Self::new(Lexicon::builtin(), TonePolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primary_strings(segment: &NormalizedSegment) -> Vec<String> {
        segment
            .primary_tokens()
            .iter()
            .map(|t| t.to_string())
            .collect()
    }

    #[test]
    fn test_normalize_simple() {
        let normalizer = PhoneticNormalizer::default();
        let segment = normalizer.normalize("你好");
        assert_eq!(segment.len(), 2);
        assert_eq!(primary_strings(&segment), vec!["ni3", "hao3"]);
    }

    #[test]
    fn test_homophones_share_readings() {
        let normalizer = PhoneticNormalizer::default();
        let a = normalizer.normalize("事例");
        let b = normalizer.normalize("示例");
        assert_eq!(primary_strings(&a), primary_strings(&b));
    }

    #[test]
    fn test_heteronym_candidates() {
        let normalizer = PhoneticNormalizer::new(Lexicon::empty(), TonePolicy::Strict);
        let segment = normalizer.normalize("行");
        let candidates: Vec<String> = segment.positions()[0]
            .candidates
            .iter()
            .map(|t| t.to_string())
            .collect();
        assert!(candidates.contains(&"xing2".to_string()));
        assert!(candidates.contains(&"hang2".to_string()));
        assert_eq!(segment.positions()[0].source, ReadingSource::Character);
    }

    #[test]
    fn test_lexicon_fixes_reading() {
        let normalizer = PhoneticNormalizer::default();
        let segment = normalizer.normalize("银行");
        let second = &segment.positions()[1];
        assert_eq!(second.source, ReadingSource::Lexicon);
        assert_eq!(second.candidates.len(), 1);
        assert_eq!(second.candidates[0].to_string(), "hang2");
    }

    #[test]
    fn test_toneless_merges_candidates() {
        let normalizer = PhoneticNormalizer::new(Lexicon::empty(), TonePolicy::Toneless);
        let segment = normalizer.normalize("好");
        // hao3 / hao4 在无调模式下合并为 hao
        assert_eq!(segment.positions()[0].candidates.len(), 1);
        assert_eq!(segment.positions()[0].candidates[0].to_string(), "hao");
    }

    #[test]
    fn test_mixed_text_offsets() {
        let normalizer = PhoneticNormalizer::default();
        let segment = normalizer.normalize("记住 AI助手!");
        assert_eq!(segment.len(), "记住 AI助手!".chars().count());
        for (i, position) in segment.positions().iter().enumerate() {
            assert_eq!(position.offset, i);
            assert!(!position.candidates.is_empty());
        }
        // ASCII 字母统一小写
        assert_eq!(
            segment.positions()[3].candidates,
            vec![PhoneticToken::Literal('a')]
        );
        assert_eq!(segment.positions()[3].source, ReadingSource::Literal);
    }

    #[test]
    fn test_empty_segment() {
        let normalizer = PhoneticNormalizer::default();
        let segment = normalizer.normalize("");
        assert!(segment.is_empty());
        assert_eq!(segment.gaps(), 0);
    }

    #[test]
    fn test_source_span() {
        let normalizer = PhoneticNormalizer::default();
        let segment = normalizer.normalize("我说你好");
        assert_eq!(segment.source_span(2, 4), Some((2, 4)));
        assert_eq!(segment.source_span(2, 2), None);
        assert_eq!(segment.source_span(3, 9), None);
    }

    #[test]
    fn test_unknown_reading_passes_through() {
        let normalizer = PhoneticNormalizer::default();
        let segment = normalizer.normalize("好\u{9FEF}你");

        assert_eq!(segment.len(), 3);
        assert_eq!(segment.gaps(), 1);

        let gap = &segment.positions()[1];
        assert_eq!(gap.offset, 1);
        assert_eq!(gap.source, ReadingSource::Gap);
        assert_eq!(gap.candidates, vec![PhoneticToken::Literal('\u{9FEF}')]);

        // 透传字符之后的位置不偏移
        let after = &segment.positions()[2];
        assert_eq!(after.offset, 2);
        assert_eq!(after.source, ReadingSource::Character);
        assert_eq!(primary_strings(&segment)[2], "ni3");
    }

    #[test]
    fn test_ling_zero_has_reading() {
        let normalizer = PhoneticNormalizer::new(Lexicon::empty(), TonePolicy::Strict);
        let segment = normalizer.normalize("〇");
        let position = &segment.positions()[0];
        assert_eq!(position.source, ReadingSource::Character);
        assert!(position
            .candidates
            .iter()
            .any(|t| t.to_string() == "ling2"));
    }
}
