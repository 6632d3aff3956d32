//! SPICE text kernel pool.
//!
//! Reads the `\begindata` sections of text kernels (frame, instrument,
//! planetary constants, meta-kernels) into named numeric or string arrays,
//! the way `gdpool` / `gcpool` expose them.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{EphemerisError, EphemerisResult};

const BEGIN_DATA: &str = "\\begindata";
const BEGIN_TEXT: &str = "\\begintext";

/// Value of one kernel pool variable
#[derive(Clone, Debug, PartialEq)]
pub enum PoolValue {
    Numbers(Vec<f64>),
    Strings(Vec<String>),
}

impl PoolValue {
    pub fn len(&self) -> usize {
        match self {
            Self::Numbers(v) => v.len(),
            Self::Strings(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
    Open,
    Close,
    Assign,
    Append,
}

/// Named variables collected from text kernels
#[derive(Clone, Debug, Default)]
pub struct KernelPool {
    vars: HashMap<String, PoolValue>,
}

impl KernelPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a text kernel file and merge its assignments
    pub fn load_file(&mut self, path: &Path) -> EphemerisResult<()> {
        let text = fs::read_to_string(path).map_err(|source| EphemerisError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_str(&path.display().to_string(), &text)
    }

    /// Parse text kernel contents; `source_name` is only used in error messages
    pub fn load_str(&mut self, source_name: &str, text: &str) -> EphemerisResult<()> {
        let mut in_data = false;
        let mut tokens: Vec<(usize, Token)> = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed == BEGIN_DATA {
                in_data = true;
                continue;
            }
            if trimmed == BEGIN_TEXT {
                in_data = false;
                continue;
            }
            if in_data {
                tokenize_line(line, idx + 1, &mut tokens).map_err(|reason| {
                    EphemerisError::TextKernel {
                        source_name: source_name.to_string(),
                        line: idx + 1,
                        reason,
                    }
                })?;
            }
        }

        self.apply(source_name, tokens)
    }

    fn apply(&mut self, source_name: &str, tokens: Vec<(usize, Token)>) -> EphemerisResult<()> {
        let err = |line: usize, reason: String| EphemerisError::TextKernel {
            source_name: source_name.to_string(),
            line,
            reason,
        };

        let mut iter = tokens.into_iter().peekable();
        while let Some((line, token)) = iter.next() {
            let name = match token {
                Token::Word(w) => w,
                other => return Err(err(line, format!("expected variable name, found {:?}", other))),
            };

            let append = match iter.next() {
                Some((_, Token::Assign)) => false,
                Some((_, Token::Append)) => true,
                _ => return Err(err(line, format!("expected '=' or '+=' after {}", name))),
            };

            let mut raw = Vec::new();
            match iter.next() {
                Some((_, Token::Open)) => loop {
                    match iter.next() {
                        Some((_, Token::Close)) => break,
                        Some((l, Token::Word(w))) => raw.push((l, Token::Word(w))),
                        Some((l, Token::Quoted(s))) => raw.push((l, Token::Quoted(s))),
                        Some((l, other)) => {
                            return Err(err(l, format!("unexpected {:?} in value list of {}", other, name)))
                        }
                        None => return Err(err(line, format!("unterminated value list for {}", name))),
                    }
                },
                Some((l, t @ Token::Word(_))) | Some((l, t @ Token::Quoted(_))) => raw.push((l, t)),
                _ => return Err(err(line, format!("missing value for {}", name))),
            }

            let value = parse_values(&name, raw).map_err(|(l, reason)| err(l, reason))?;
            self.assign(&name, value, append).map_err(|reason| err(line, reason))?;
        }
        Ok(())
    }

    fn assign(&mut self, name: &str, value: PoolValue, append: bool) -> Result<(), String> {
        if !append {
            self.vars.insert(name.to_string(), value);
            return Ok(());
        }
        match (self.vars.get_mut(name), value) {
            (None, value) => {
                self.vars.insert(name.to_string(), value);
                Ok(())
            }
            (Some(PoolValue::Numbers(existing)), PoolValue::Numbers(more)) => {
                existing.extend(more);
                Ok(())
            }
            (Some(PoolValue::Strings(existing)), PoolValue::Strings(more)) => {
                existing.extend(more);
                Ok(())
            }
            _ => Err(format!("cannot append values of a different type to {}", name)),
        }
    }

    /// Insert or replace a variable directly
    pub fn set(&mut self, name: &str, value: PoolValue) {
        self.vars.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&PoolValue> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn numbers(&self, name: &str) -> Option<&[f64]> {
        match self.vars.get(name) {
            Some(PoolValue::Numbers(v)) => Some(v),
            _ => None,
        }
    }

    pub fn strings(&self, name: &str) -> Option<&[String]> {
        match self.vars.get(name) {
            Some(PoolValue::Strings(v)) => Some(v),
            _ => None,
        }
    }

    pub fn first_number(&self, name: &str) -> Option<f64> {
        self.numbers(name).and_then(|v| v.first().copied())
    }

    pub fn first_string(&self, name: &str) -> Option<&str> {
        self.strings(name).and_then(|v| v.first()).map(String::as_str)
    }

    /// Variable names, in no particular order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }
}

fn tokenize_line(line: &str, line_no: usize, out: &mut Vec<(usize, Token)>) -> Result<(), String> {
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() || c == ',' => i += 1,
            '(' => {
                out.push((line_no, Token::Open));
                i += 1;
            }
            ')' => {
                out.push((line_no, Token::Close));
                i += 1;
            }
            '=' => {
                out.push((line_no, Token::Assign));
                i += 1;
            }
            '\'' => {
                // Quoted string, '' is an escaped quote
                let mut s = String::new();
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err("unterminated string".to_string()),
                        Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                            s.push('\'');
                            i += 2;
                        }
                        Some('\'') => {
                            i += 1;
                            break;
                        }
                        Some(&ch) => {
                            s.push(ch);
                            i += 1;
                        }
                    }
                }
                out.push((line_no, Token::Quoted(s)));
            }
            _ => {
                let start = i;
                while i < chars.len() {
                    let ch = chars[i];
                    if ch.is_whitespace() || matches!(ch, ',' | '(' | ')' | '=' | '\'') {
                        break;
                    }
                    i += 1;
                }
                let mut word: String = chars[start..i].iter().collect();
                if word == "+" && chars.get(i) == Some(&'=') {
                    out.push((line_no, Token::Append));
                    i += 1;
                    continue;
                }
                // NAME+= written without a space
                if word.len() > 1 && word.ends_with('+') && chars.get(i) == Some(&'=') {
                    word.pop();
                    out.push((line_no, Token::Word(word)));
                    out.push((line_no, Token::Append));
                    i += 1;
                    continue;
                }
                out.push((line_no, Token::Word(word)));
            }
        }
    }
    Ok(())
}

fn parse_values(name: &str, raw: Vec<(usize, Token)>) -> Result<PoolValue, (usize, String)> {
    let mut numbers = Vec::new();
    let mut strings = Vec::new();

    for (line, token) in raw {
        match token {
            Token::Quoted(s) => strings.push(s),
            // Dates are kept verbatim; nothing here needs them as numbers
            Token::Word(w) if w.starts_with('@') => strings.push(w),
            Token::Word(w) => {
                let n = parse_number(&w)
                    .ok_or_else(|| (line, format!("invalid numeric value '{}' for {}", w, name)))?;
                numbers.push(n);
            }
            _ => unreachable!("value lists only hold words and strings"),
        }
        if !numbers.is_empty() && !strings.is_empty() {
            return Err((line, format!("mixed numeric and string values for {}", name)));
        }
    }

    if strings.is_empty() {
        Ok(PoolValue::Numbers(numbers))
    } else {
        Ok(PoolValue::Strings(strings))
    }
}

/// Numbers may use Fortran `D` exponents
fn parse_number(word: &str) -> Option<f64> {
    let normalized: String = word
        .chars()
        .map(|c| if c == 'D' || c == 'd' { 'E' } else { c })
        .collect();
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}
