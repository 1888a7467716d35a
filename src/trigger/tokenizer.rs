//! 分词与字符归一化
//!
//! 将输入文本分割为：汉字、ASCII 词、空白、符号。
//! 所有位置均为字符索引；字符归一化严格一对一，保证位置不偏移。

use unicode_normalization::UnicodeNormalization;

/// Token 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// 汉字序列
    Chinese,
    /// ASCII 字母/数字序列
    Ascii,
    /// 空白符序列
    Whitespace,
    /// 标点/符号
    Symbol,
}

/// Token
#[derive(Debug, Clone)]
pub struct Token {
    pub text: String,
    pub token_type: TokenType,
    /// 在原文中的起始字符索引
    pub start: usize,
    /// 在原文中的结束字符索引（不含）
    pub end: usize,
}

/// 分词器
pub struct Tokenizer;

impl Tokenizer {
    /// 分词
    ///
    /// 按字符类型将文本分割为 Token 序列
    pub fn tokenize(text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut current: Option<Token> = None;

        for (idx, ch) in text.chars().enumerate() {
            let char_type = Self::classify_char(ch);

            match current.as_mut() {
                Some(token) if token.token_type == char_type => {
                    token.text.push(ch);
                    token.end = idx + 1;
                }
                _ => {
                    // 类型切换，保存当前 token
                    if let Some(token) = current.take() {
                        tokens.push(token);
                    }
                    current = Some(Token {
                        text: ch.to_string(),
                        token_type: char_type,
                        start: idx,
                        end: idx + 1,
                    });
                }
            }
        }

        // 处理最后一个 token
        if let Some(token) = current {
            tokens.push(token);
        }

        tokens
    }

    /// 字符分类
    pub fn classify_char(ch: char) -> TokenType {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            TokenType::Ascii
        } else if ch.is_whitespace() {
            TokenType::Whitespace
        } else if Self::is_cjk(ch) {
            TokenType::Chinese
        } else {
            TokenType::Symbol
        }
    }

    /// 判断是否为 CJK 字符
    pub fn is_cjk(ch: char) -> bool {
        let code = ch as u32;
        // CJK Unified Ideographs
        (0x4E00..=0x9FFF).contains(&code)
            // CJK Unified Ideographs Extension A
            || (0x3400..=0x4DBF).contains(&code)
            // CJK Unified Ideographs Extension B-F
            || (0x20000..=0x2CEAF).contains(&code)
            // CJK Compatibility Ideographs
            || (0xF900..=0xFAFF).contains(&code)
            // 〇（汉字数字零）
            || code == 0x3007
    }
}

/// 宽度归一化（全角 → 半角），仅在 NFKC 结果为单字符时生效
pub fn fold_width(ch: char) -> char {
    if ch.is_ascii() {
        return ch;
    }
    single_char(std::iter::once(ch).nfkc()).unwrap_or(ch)
}

/// 大小写归一化，仅在小写结果为单字符时生效
pub fn fold_case(ch: char) -> char {
    single_char(ch.to_lowercase()).unwrap_or(ch)
}

/// 匹配用的字符归一化
pub fn fold_char(ch: char, fold_letter_case: bool) -> char {
    let folded = fold_width(ch);
    if fold_letter_case {
        fold_case(folded)
    } else {
        folded
    }
}

fn single_char(mut chars: impl Iterator<Item = char>) -> Option<char> {
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Some(ch),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_mixed() {
        let tokens = Tokenizer::tokenize("readme 点 md");
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[0].text, "readme");
        assert_eq!(tokens[0].token_type, TokenType::Ascii);
        assert_eq!(tokens[1].token_type, TokenType::Whitespace);
        assert_eq!(tokens[2].text, "点");
        assert_eq!(tokens[2].token_type, TokenType::Chinese);
    }

    #[test]
    fn test_tokenize_char_offsets() {
        let tokens = Tokenizer::tokenize("记住AI助手");
        assert_eq!(tokens.len(), 3);
        assert_eq!((tokens[0].start, tokens[0].end), (0, 2));
        assert_eq!((tokens[1].start, tokens[1].end), (2, 4));
        assert_eq!((tokens[2].start, tokens[2].end), (4, 6));
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(Tokenizer::tokenize("").is_empty());
    }

    #[test]
    fn test_fold_width() {
        assert_eq!(fold_width('Ａ'), 'A');
        assert_eq!(fold_width('１'), '1');
        assert_eq!(fold_width('\u{3000}'), ' ');
        assert_eq!(fold_width('你'), '你');
        // 多字符分解不做归一化
        assert_eq!(fold_width('㈠'), '㈠');
    }

    #[test]
    fn test_fold_char() {
        assert_eq!(fold_char('Ａ', true), 'a');
        assert_eq!(fold_char('Ａ', false), 'A');
        // 'İ' 的小写为两个字符，保持原样
        assert_eq!(fold_case('İ'), 'İ');
    }

    #[test]
    fn test_ling_zero_is_chinese() {
        assert_eq!(Tokenizer::classify_char('〇'), TokenType::Chinese);
        let tokens = Tokenizer::tokenize("二〇二四");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_type, TokenType::Chinese);
    }
}
