//! Directive scanner: splits a template into text runs and `{{ }}` tags

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Result, TemplateError};
use crate::expr::is_identifier;
use crate::host::is_reserved;

lazy_static! {
    static ref GLOBALS_DIRECTIVE: Regex =
        Regex::new(r"\{\{@globals (.*?)\}\}").expect("globals directive pattern is valid");
}

/// Classified contents of a `{{ }}` tag. Source strings are trimmed; each
/// carries the character offset of its first character.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    IfOpen { condition: String, pos: usize },
    Else,
    IfClose,
    EachOpen {
        loop_var: String,
        collection: String,
        pos: usize,
    },
    EachClose,
    Index,
    Expression { source: String, pos: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Text(String),
    Tag { tag: Tag, pos: usize },
}

/// Output of the scanner: the token stream and the declared globals
#[derive(Debug, Default)]
pub struct Scanned {
    pub tokens: Vec<Token>,
    pub globals: Vec<String>,
}

/// Remove line breaks; directives are matched within a single line
pub fn normalize(source: &str) -> String {
    source.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

/// Lexer for templates - char-based like the expression lexer so offsets
/// agree between the two
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    /// Char range of the `@globals` directive, skipped while scanning
    skip: Option<(usize, usize)>,
}

impl Lexer {
    pub fn new(normalized: &str) -> Self {
        Self {
            chars: normalized.chars().collect(),
            pos: 0,
            skip: None,
        }
    }

    /// Scan a normalized template
    pub fn scan(source: &str) -> Result<Scanned> {
        let mut lexer = Lexer::new(source);
        let globals = lexer.extract_globals(source)?;
        let tokens = lexer.tokenize()?;
        Ok(Scanned { tokens, globals })
    }

    /// Find the first `{{@globals ...}}` directive and record its span so
    /// tokenizing passes over it
    fn extract_globals(&mut self, source: &str) -> Result<Vec<String>> {
        let Some(caps) = GLOBALS_DIRECTIVE.captures(source) else {
            return Ok(Vec::new());
        };
        let (Some(whole), Some(list)) = (caps.get(0), caps.get(1)) else {
            return Ok(Vec::new());
        };

        let start = source[..whole.start()].chars().count();
        let end = start + whole.as_str().chars().count();
        self.skip = Some((start, end));

        let list_pos = source[..list.start()].chars().count();
        let mut names = Vec::new();
        for name in list.as_str().split(',') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            if !is_identifier(name) || is_reserved(name) {
                return Err(TemplateError::syntax(
                    list_pos,
                    format!("Invalid name '{}' in @globals", name),
                ));
            }
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        tracing::debug!("Declared globals: {:?}", names);
        Ok(names)
    }

    /// Tokenize the entire input. Adjacent text runs are merged.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        let mut text = String::new();

        while self.pos < self.chars.len() {
            if let Some((start, end)) = self.skip {
                if self.pos == start {
                    self.pos = end;
                    continue;
                }
            }

            if self.starts_with("{{") {
                if let Some(close) = self.find_close(self.pos + 2) {
                    if !text.is_empty() {
                        tokens.push(Token::Text(std::mem::take(&mut text)));
                    }
                    let tag_pos = self.pos;
                    let tag = self.classify(self.pos + 2, close)?;
                    tokens.push(Token::Tag { tag, pos: tag_pos });
                    self.pos = close + 2;
                    continue;
                }
                // No closing braces anywhere after this point
                text.extend(&self.chars[self.pos..]);
                break;
            }

            text.push(self.chars[self.pos]);
            self.pos += 1;
        }

        if !text.is_empty() {
            tokens.push(Token::Text(text));
        }
        Ok(tokens)
    }

    fn starts_with(&self, s: &str) -> bool {
        let mut i = self.pos;
        for c in s.chars() {
            if self.chars.get(i) != Some(&c) {
                return false;
            }
            i += 1;
        }
        true
    }

    /// Offset of the first `}}` at or after `from`
    fn find_close(&self, from: usize) -> Option<usize> {
        (from..self.chars.len().saturating_sub(1))
            .find(|&i| self.chars[i] == '}' && self.chars[i + 1] == '}')
    }

    /// Classify the tag contents between `start` and `end` (exclusive)
    fn classify(&self, start: usize, end: usize) -> Result<Tag> {
        let raw: String = self.chars[start..end].iter().collect();
        let leading = raw.chars().take_while(|c| c.is_whitespace()).count();
        let inner = raw.trim();
        let inner_pos = start + leading;

        if let Some(rest) = keyword_rest(inner, "#if") {
            let condition = rest.trim();
            if condition.is_empty() {
                return Err(TemplateError::syntax(inner_pos, "#if requires a condition"));
            }
            return Ok(Tag::IfOpen {
                condition: condition.to_string(),
                pos: inner_pos + offset_of(inner, condition),
            });
        }
        match inner {
            "else" => return Ok(Tag::Else),
            "/if" => return Ok(Tag::IfClose),
            "/each" => return Ok(Tag::EachClose),
            "@index" => return Ok(Tag::Index),
            _ => {}
        }
        if let Some(rest) = keyword_rest(inner, "#each") {
            return self.classify_each(inner, rest, inner_pos);
        }
        if inner.starts_with('#') || inner.starts_with('/') {
            let name: String = inner.chars().take_while(|c| !c.is_whitespace()).collect();
            return Err(TemplateError::syntax(
                inner_pos,
                format!("Unknown directive '{}'", name),
            ));
        }

        Ok(Tag::Expression {
            source: inner.to_string(),
            pos: inner_pos,
        })
    }

    fn classify_each(&self, inner: &str, rest: &str, inner_pos: usize) -> Result<Tag> {
        let Some((loop_var, collection)) = rest.split_once(" in ") else {
            return Err(TemplateError::syntax(
                inner_pos,
                "#each expects the form '#each item in collection'",
            ));
        };
        let loop_var = loop_var.trim();
        let collection = collection.trim();

        if !is_identifier(loop_var) || is_reserved(loop_var) {
            return Err(TemplateError::syntax(
                inner_pos + offset_of(inner, loop_var),
                format!("Invalid loop variable '{}'", loop_var),
            ));
        }
        if collection.is_empty() {
            return Err(TemplateError::syntax(
                inner_pos,
                "#each requires a collection expression",
            ));
        }

        Ok(Tag::EachOpen {
            loop_var: loop_var.to_string(),
            collection: collection.to_string(),
            pos: inner_pos + offset_of(inner, collection),
        })
    }
}

/// The text after `keyword` when `inner` is that keyword followed by
/// whitespace or nothing
fn keyword_rest<'a>(inner: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = inner.strip_prefix(keyword)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}

/// Character offset of `part` within `whole`; `part` must be a subslice
fn offset_of(whole: &str, part: &str) -> usize {
    let byte_offset = (part.as_ptr() as usize).saturating_sub(whole.as_ptr() as usize);
    whole
        .get(..byte_offset)
        .map(|prefix| prefix.chars().count())
        .unwrap_or(0)
}
