//! Expression tokenizer

use crate::error::{Result, TemplateError};

/// Token types produced by the expression lexer
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Str(String),
    Ident(String),
    /// `@name`, only `@index` is accepted by the parser
    At(String),

    // Keywords
    True,
    False,
    Null,
    Undefined,
    This,
    New,
    TypeOf,
    InstanceOf,
    In,

    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Question,
    Colon,

    // Operators
    Not,
    StrictEq,
    StrictNe,
    LooseEq,
    LooseNe,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Character offset of the token's first character
    pub pos: usize,
}

/// Lexer for expressions - char-based so offsets count characters
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    /// Tokenize the entire input. The result always ends with `Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let start = self.pos;
            let Some(c) = self.current_char() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    pos: start,
                });
                return Ok(tokens);
            };

            let kind = match c {
                '0'..='9' => self.read_number()?,
                '.' if self.peek_char(1).is_some_and(|d| d.is_ascii_digit()) => {
                    self.read_number()?
                }
                '"' | '\'' => self.read_string(c)?,
                '@' => {
                    self.pos += 1;
                    let name = self.read_ident_chars();
                    if name.is_empty() {
                        return Err(TemplateError::syntax(start, "Expected a name after '@'"));
                    }
                    TokenKind::At(name)
                }
                c if is_ident_start(c) => {
                    let word = self.read_ident_chars();
                    keyword(&word).unwrap_or(TokenKind::Ident(word))
                }
                _ => self.read_operator()?,
            };
            tokens.push(Token { kind, pos: start });
        }
    }

    fn current_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn read_ident_chars(&mut self) -> String {
        let mut result = String::new();
        while let Some(c) = self.current_char() {
            if !is_ident_continue(c) {
                break;
            }
            result.push(c);
            self.pos += 1;
        }
        result
    }

    fn read_number(&mut self) -> Result<TokenKind> {
        let start = self.pos;

        if self.current_char() == Some('0')
            && matches!(self.peek_char(1), Some('x') | Some('X'))
        {
            self.pos += 2;
            let digits: String = self.take_while(|c| c.is_ascii_hexdigit());
            return u64::from_str_radix(&digits, 16)
                .map(|n| TokenKind::Number(n as f64))
                .map_err(|_| TemplateError::syntax(start, "Invalid hexadecimal literal"));
        }

        let mut text = self.take_while(|c| c.is_ascii_digit());
        if self.current_char() == Some('.') {
            self.pos += 1;
            text.push('.');
            text.push_str(&self.take_while(|c| c.is_ascii_digit()));
        }
        if matches!(self.current_char(), Some('e') | Some('E')) {
            let save = self.pos;
            let mut exp = String::from("e");
            self.pos += 1;
            if let Some(sign @ ('+' | '-')) = self.current_char() {
                exp.push(sign);
                self.pos += 1;
            }
            let digits = self.take_while(|c| c.is_ascii_digit());
            if digits.is_empty() {
                self.pos = save;
            } else {
                text.push_str(&exp);
                text.push_str(&digits);
            }
        }

        if self.current_char().is_some_and(is_ident_start) {
            return Err(TemplateError::syntax(
                self.pos,
                "Identifier directly after number",
            ));
        }

        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| TemplateError::syntax(start, format!("Invalid number literal '{}'", text)))
    }

    fn read_string(&mut self, quote: char) -> Result<TokenKind> {
        let start = self.pos;
        self.pos += 1; // Skip opening quote
        let mut result = String::new();

        loop {
            let Some(c) = self.current_char() else {
                return Err(TemplateError::syntax(start, "Unterminated string literal"));
            };
            self.pos += 1;
            match c {
                c if c == quote => return Ok(TokenKind::Str(result)),
                '\\' => {
                    let Some(escaped) = self.current_char() else {
                        return Err(TemplateError::syntax(start, "Unterminated string literal"));
                    };
                    self.pos += 1;
                    match escaped {
                        'n' => result.push('\n'),
                        't' => result.push('\t'),
                        'r' => result.push('\r'),
                        'b' => result.push('\u{8}'),
                        'f' => result.push('\u{c}'),
                        'v' => result.push('\u{b}'),
                        '0' => result.push('\0'),
                        'u' => result.push(self.read_unicode_escape(start)?),
                        other => result.push(other),
                    }
                }
                c => result.push(c),
            }
        }
    }

    fn read_unicode_escape(&mut self, start: usize) -> Result<char> {
        let digits: String = self.chars.iter().skip(self.pos).take(4).collect();
        if digits.len() != 4 {
            return Err(TemplateError::syntax(start, "Invalid unicode escape"));
        }
        let code = u32::from_str_radix(&digits, 16)
            .map_err(|_| TemplateError::syntax(start, "Invalid unicode escape"))?;
        self.pos += 4;
        Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn read_operator(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        let c = self.current_char().unwrap_or('\0');
        let next = self.peek_char(1);
        let next2 = self.peek_char(2);

        let (kind, len) = match (c, next, next2) {
            ('=', Some('='), Some('=')) => (TokenKind::StrictEq, 3),
            ('=', Some('='), _) => (TokenKind::LooseEq, 2),
            ('!', Some('='), Some('=')) => (TokenKind::StrictNe, 3),
            ('!', Some('='), _) => (TokenKind::LooseNe, 2),
            ('<', Some('='), _) => (TokenKind::Le, 2),
            ('>', Some('='), _) => (TokenKind::Ge, 2),
            ('&', Some('&'), _) => (TokenKind::AndAnd, 2),
            ('|', Some('|'), _) => (TokenKind::OrOr, 2),
            ('!', _, _) => (TokenKind::Not, 1),
            ('<', _, _) => (TokenKind::Lt, 1),
            ('>', _, _) => (TokenKind::Gt, 1),
            ('+', _, _) => (TokenKind::Plus, 1),
            ('-', _, _) => (TokenKind::Minus, 1),
            ('*', _, _) => (TokenKind::Star, 1),
            ('/', _, _) => (TokenKind::Slash, 1),
            ('%', _, _) => (TokenKind::Percent, 1),
            ('(', _, _) => (TokenKind::LParen, 1),
            (')', _, _) => (TokenKind::RParen, 1),
            ('[', _, _) => (TokenKind::LBracket, 1),
            (']', _, _) => (TokenKind::RBracket, 1),
            (',', _, _) => (TokenKind::Comma, 1),
            ('.', _, _) => (TokenKind::Dot, 1),
            ('?', _, _) => (TokenKind::Question, 1),
            (':', _, _) => (TokenKind::Colon, 1),
            ('=', _, _) => {
                return Err(TemplateError::syntax(
                    start,
                    "Assignment is not allowed in expressions",
                ))
            }
            (';', _, _) => {
                return Err(TemplateError::syntax(
                    start,
                    "Statements are not allowed in expressions",
                ))
            }
            ('{', _, _) | ('}', _, _) => {
                return Err(TemplateError::syntax(
                    start,
                    "Object literals and blocks are not allowed in expressions",
                ))
            }
            ('`', _, _) => {
                return Err(TemplateError::syntax(
                    start,
                    "Template literals are not allowed in expressions",
                ))
            }
            (other, _, _) => {
                return Err(TemplateError::syntax(
                    start,
                    format!("Unexpected character '{}'", other),
                ))
            }
        };

        self.pos += len;
        Ok(kind)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut result = String::new();
        while let Some(c) = self.current_char() {
            if !pred(c) {
                break;
            }
            result.push(c);
            self.pos += 1;
        }
        result
    }
}

fn keyword(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        "undefined" => TokenKind::Undefined,
        "this" => TokenKind::This,
        "new" => TokenKind::New,
        "typeof" => TokenKind::TypeOf,
        "instanceof" => TokenKind::InstanceOf,
        "in" => TokenKind::In,
        _ => return None,
    };
    Some(kind)
}

pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Whether `s` is a single identifier
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_continue)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_lexer_member_call() {
        assert_eq!(
            kinds("message.indexOf('Hello') > -1"),
            vec![
                TokenKind::Ident("message".to_string()),
                TokenKind::Dot,
                TokenKind::Ident("indexOf".to_string()),
                TokenKind::LParen,
                TokenKind::Str("Hello".to_string()),
                TokenKind::RParen,
                TokenKind::Gt,
                TokenKind::Minus,
                TokenKind::Number(1.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lexer_operators() {
        assert_eq!(
            kinds("a === b !== c == d != e <= f"),
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::StrictEq,
                TokenKind::Ident("b".to_string()),
                TokenKind::StrictNe,
                TokenKind::Ident("c".to_string()),
                TokenKind::LooseEq,
                TokenKind::Ident("d".to_string()),
                TokenKind::LooseNe,
                TokenKind::Ident("e".to_string()),
                TokenKind::Le,
                TokenKind::Ident("f".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lexer_literals() {
        assert_eq!(
            kinds(r#"0x1F 1.5e3 .5 "a\"b" @index"#),
            vec![
                TokenKind::Number(31.0),
                TokenKind::Number(1500.0),
                TokenKind::Number(0.5),
                TokenKind::Str("a\"b".to_string()),
                TokenKind::At("index".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lexer_rejects_statements() {
        assert!(Lexer::new("a = 1").tokenize().is_err());
        assert!(Lexer::new("a; b").tokenize().is_err());
        assert!(Lexer::new("{a: 1}").tokenize().is_err());
        assert!(Lexer::new("'open").tokenize().is_err());
        assert!(Lexer::new("`x`").tokenize().is_err());
    }

    #[test]
    fn test_lexer_positions() {
        let tokens = Lexer::new("a  + 'é' + b").tokenize().unwrap();
        let positions: Vec<usize> = tokens.iter().map(|t| t.pos).collect();
        assert_eq!(positions, vec![0, 3, 5, 9, 11, 12]);
    }
}
