//! 拼音音节
//!
//! 音节 = 无调拼音 + 可选声调（1-5，5 为轻声）。
//! 支持数字声调（ni3）、调号（nǐ）、v / u: 表示 ü。

use std::fmt;

use crate::trigger::types::TonePolicy;

/// 轻声
pub const NEUTRAL_TONE: u8 = 5;

/// 拼音音节
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Syllable {
    /// 无调拼音（小写，ü 统一为 `ü`）
    pub base: String,
    /// 声调，None 表示未指定
    pub tone: Option<u8>,
}

impl Syllable {
    /// 解析用户配置的音节
    ///
    /// 未写声调时 `tone` 为 None，由调用方按声调策略决定是否接受
    pub fn parse(input: &str) -> Option<Self> {
        let lowered = input.trim().to_lowercase();
        if lowered.is_empty() {
            return None;
        }

        let mut base = String::with_capacity(lowered.len());
        let mut tone = None;
        let mut chars = lowered.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '0'..='5' => {
                    // 数字声调只能出现一次且位于末尾
                    if chars.peek().is_some() || tone.is_some() {
                        return None;
                    }
                    tone = Some(if ch == '0' {
                        NEUTRAL_TONE
                    } else {
                        ch as u8 - b'0'
                    });
                }
                'v' => base.push('ü'),
                'u' if chars.peek() == Some(&':') => {
                    chars.next();
                    base.push('ü');
                }
                'a'..='z' | 'ü' | 'ê' => base.push(ch),
                _ => {
                    let (plain, mark) = strip_tone_mark(ch)?;
                    if tone.is_some() {
                        return None;
                    }
                    tone = Some(mark);
                    base.push(plain);
                }
            }
        }

        if base.is_empty() {
            return None;
        }
        Some(Self { base, tone })
    }

    /// 解析词典读音（无数字声调即轻声）
    pub fn parse_reading(input: &str) -> Option<Self> {
        let mut syllable = Self::parse(input)?;
        syllable.tone.get_or_insert(NEUTRAL_TONE);
        Some(syllable)
    }

    /// 按声调策略投影
    pub fn project(&self, policy: TonePolicy) -> Self {
        match policy {
            TonePolicy::Strict => self.clone(),
            TonePolicy::Toneless => Self {
                base: self.base.clone(),
                tone: None,
            },
        }
    }
}

impl fmt::Display for Syllable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)?;
        if let Some(tone) = self.tone {
            write!(f, "{}", tone)?;
        }
        Ok(())
    }
}

/// 拼音自动机的输入符号
///
/// 非汉字字符以 `Literal` 形式参与匹配，与音节互不相等
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PhoneticToken {
    Syllable(Syllable),
    Literal(char),
}

impl PhoneticToken {
    pub fn project(&self, policy: TonePolicy) -> Self {
        match self {
            PhoneticToken::Syllable(s) => PhoneticToken::Syllable(s.project(policy)),
            PhoneticToken::Literal(ch) => PhoneticToken::Literal(*ch),
        }
    }
}

impl fmt::Display for PhoneticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhoneticToken::Syllable(s) => s.fmt(f),
            PhoneticToken::Literal(ch) => write!(f, "{}", ch),
        }
    }
}

/// 拆分用户书写的音节串（"ni3-hao3"、"ni3 hao3"、"xi'an1"）
pub fn split_syllables(input: &str) -> impl Iterator<Item = &str> {
    input
        .split(|c: char| c.is_whitespace() || c == '-' || c == '\'')
        .filter(|s| !s.is_empty())
}

/// 去除调号，返回（元音，声调）
fn strip_tone_mark(ch: char) -> Option<(char, u8)> {
    let mapped = match ch {
        'ā' => ('a', 1),
        'á' => ('a', 2),
        'ǎ' => ('a', 3),
        'à' => ('a', 4),
        'ē' => ('e', 1),
        'é' => ('e', 2),
        'ě' => ('e', 3),
        'è' => ('e', 4),
        'ī' => ('i', 1),
        'í' => ('i', 2),
        'ǐ' => ('i', 3),
        'ì' => ('i', 4),
        'ō' => ('o', 1),
        'ó' => ('o', 2),
        'ǒ' => ('o', 3),
        'ò' => ('o', 4),
        'ū' => ('u', 1),
        'ú' => ('u', 2),
        'ǔ' => ('u', 3),
        'ù' => ('u', 4),
        'ǖ' => ('ü', 1),
        'ǘ' => ('ü', 2),
        'ǚ' => ('ü', 3),
        'ǜ' => ('ü', 4),
        'ń' => ('n', 2),
        'ň' => ('n', 3),
        'ǹ' => ('n', 4),
        _ => return None,
    };
    Some(mapped)
}
