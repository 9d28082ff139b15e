use std::fmt::{self, Display, Formatter};
use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Pos {
    pub offset_in_line: usize,
    pub line: usize,
}

impl Display for Pos {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.offset_in_line)
    }
}

#[derive(Clone, Error, Debug, PartialEq, Eq)]
#[error("scan error: {error:?} {pos}")]
pub struct ScanError {
    pub error: ScanErrorType,
    pub pos: Pos,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanErrorType {
    UnterminatedString,
    UnrecognizedToken,
    NumberTooLarge,
}

impl ScanErrorType {
    pub fn message(&self) -> &'static str {
        match self {
            ScanErrorType::UnterminatedString => "unterminated string",
            ScanErrorType::UnrecognizedToken => "unrecognized token",
            ScanErrorType::NumberTooLarge => "number literal too large",
        }
    }
}

/// A token in the input stream
/// Contains a data which is the token variant and a position
/// Note that pos is always defined, but in the case of EOF will describe a location
/// Potentially off the end of the input stream
#[derive(Debug, PartialEq, Clone)]
pub struct Token<'code> {
    pub data: TokenType<'code>,
    pub pos: Pos,
}

#[derive(Debug, PartialEq, Clone)]
pub enum TokenType<'code> {
    Symbol(Symbol),
    Keyword(Keyword),
    Identifier(&'code str),
    String(&'code str),
    Int(i64),
    Float(f64),
    /// Hexadecimal digits following a `0x` prefix (prefix stripped)
    Hex(&'code str),
    /// Binary digits following a `0b` prefix (prefix stripped)
    Bin(&'code str),
    Eof,
}

// Allow comparing a token directly against a symbol or keyword, which is how
// the parser phrases nearly all of its lookahead
impl<'code> PartialEq<Symbol> for TokenType<'code> {
    fn eq(&self, other: &Symbol) -> bool {
        matches!(self, TokenType::Symbol(symbol) if symbol == other)
    }
}

impl<'code> PartialEq<Keyword> for TokenType<'code> {
    fn eq(&self, other: &Keyword) -> bool {
        matches!(self, TokenType::Keyword(keyword) if keyword == other)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Symbol {
    // Single-character tokens.
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,
    Percent,

    // One or two character tokens.
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Pipe,
    PipePipe,
    Amp,
    AmpAmp,
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Do,
    Else,
    False,
    If,
    Let,
    Namespace,
    Null,
    Return,
    True,
}

const KEYWORD_LITERAL_TO_SYMBOL: [(&str, Keyword); 9] = [
    ("do", Keyword::Do),
    ("else", Keyword::Else),
    ("false", Keyword::False),
    ("if", Keyword::If),
    ("let", Keyword::Let),
    ("namespace", Keyword::Namespace),
    ("null", Keyword::Null),
    ("return", Keyword::Return),
    ("true", Keyword::True),
];

impl Display for Keyword {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Clone)]
pub struct Scanner<'code> {
    code: &'code str,
    code_iter: Peekable<CharIndices<'code>>,
    // One token of lookahead so the parser can peek without consuming
    lookahead: Option<Result<Token<'code>, ScanError>>,

    line: usize,
    offset_in_line: usize,
}

impl<'code> Scanner<'code> {
    pub fn new(code: &'code str) -> Scanner<'code> {
        Scanner {
            code,
            code_iter: code.char_indices().peekable(),
            lookahead: None,
            line: 0,
            offset_in_line: 0,
        }
    }

    /// Consume and return the next token. Once the input is exhausted this
    /// keeps returning EOF tokens.
    pub fn next(&mut self) -> Result<Token<'code>, ScanError> {
        match self.lookahead.take() {
            Some(result) => result,
            None => self.scan_token(),
        }
    }

    pub fn peek(&mut self) -> Result<&Token<'code>, ScanError> {
        if self.lookahead.is_none() {
            self.lookahead = Some(self.scan_token());
        }
        match self.lookahead.as_ref() {
            Some(Ok(token)) => Ok(token),
            Some(Err(error)) => Err(error.clone()),
            None => unreachable!("lookahead was just filled"),
        }
    }

    /// The position of the next token, or of the error that prevents there
    /// from being one
    pub fn peek_pos(&mut self) -> Pos {
        match self.peek() {
            Ok(token) => token.pos,
            Err(error) => error.pos,
        }
    }

    pub fn next_if<F>(&mut self, predicate: F) -> Option<Token<'code>>
    where
        F: FnOnce(&TokenType<'code>) -> bool,
    {
        let matches = match self.peek() {
            Ok(token) => predicate(&token.data),
            Err(_) => false,
        };
        if matches {
            self.next().ok()
        } else {
            None
        }
    }

    pub fn next_if_some<F, T>(&mut self, f: F) -> Option<T>
    where
        F: FnOnce(&TokenType<'code>) -> Option<T>,
    {
        let found = match self.peek() {
            Ok(token) => f(&token.data),
            Err(_) => None,
        };
        if found.is_some() {
            _ = self.next();
        }
        found
    }

    pub fn is_at_eof(&mut self) -> bool {
        matches!(
            self.peek(),
            Ok(Token {
                data: TokenType::Eof,
                pos: _
            })
        )
    }

    fn current_pos(&self) -> Pos {
        Pos {
            line: self.line,
            offset_in_line: self.offset_in_line,
        }
    }

    fn consume_next_char_if_eq(&mut self, next_ch: char) -> bool {
        self.code_iter.next_if(|(_, ch)| *ch == next_ch).is_some()
    }

    fn consume_next_char_if_neq(&mut self, not_next_ch: char) -> bool {
        self.code_iter
            .next_if(|(_, ch)| *ch != not_next_ch)
            .is_some()
    }

    fn consume_next_char_if_match<F>(&mut self, predicate: F) -> bool
    where
        F: FnOnce(char) -> bool,
    {
        self.code_iter.next_if(|(_, ch)| predicate(*ch)).is_some()
    }

    fn consume_next_char_if_ws(&mut self) -> bool {
        self.code_iter
            .next_if(|(_, ch)| WS_CHARS.contains(*ch))
            .is_some()
    }

    fn gobble_whitespace(&mut self) {
        loop {
            if self.consume_next_char_if_ws() {
                self.offset_in_line += 1;
            } else if self.consume_next_char_if_eq('\n') {
                self.offset_in_line = 0;
                self.line += 1;
            } else {
                break;
            }
        }
    }

    // Slice the code slice to a length and and offset
    // This requires that offset point to the start of a code point (such as produced by code_iter)
    unsafe fn code_subslice(&self, offset: usize, len: usize) -> &'code str {
        let initial_skip = std::str::from_utf8_unchecked(&self.code.as_bytes()[offset..]);
        &initial_skip[0..len]
    }

    fn symbol_token(&mut self, symbol: Symbol, pos: Pos) -> Result<Token<'code>, ScanError> {
        self.offset_in_line += 1;
        Ok(Token {
            data: TokenType::Symbol(symbol),
            pos,
        })
    }

    fn scan_token(&mut self) -> Result<Token<'code>, ScanError> {
        let pos = self.current_pos();
        if let Some((offset, ch)) = self.code_iter.next() {
            match ch {
                '(' => self.symbol_token(Symbol::LeftParen, pos),
                ')' => self.symbol_token(Symbol::RightParen, pos),
                '{' => self.symbol_token(Symbol::LeftBrace, pos),
                '}' => self.symbol_token(Symbol::RightBrace, pos),
                ',' => self.symbol_token(Symbol::Comma, pos),
                '.' => self.symbol_token(Symbol::Dot, pos),
                '-' => self.symbol_token(Symbol::Minus, pos),
                '+' => self.symbol_token(Symbol::Plus, pos),
                ';' => self.symbol_token(Symbol::Semicolon, pos),
                '*' => self.symbol_token(Symbol::Star, pos),
                '%' => self.symbol_token(Symbol::Percent, pos),
                '!' => {
                    let symbol = if self.consume_next_char_if_eq('=') {
                        self.offset_in_line += 2;
                        Symbol::BangEqual
                    } else {
                        self.offset_in_line += 1;
                        Symbol::Bang
                    };
                    Ok(Token {
                        data: TokenType::Symbol(symbol),
                        pos,
                    })
                }
                '=' => {
                    let symbol = if self.consume_next_char_if_eq('=') {
                        self.offset_in_line += 2;
                        Symbol::EqualEqual
                    } else {
                        self.offset_in_line += 1;
                        Symbol::Equal
                    };
                    Ok(Token {
                        data: TokenType::Symbol(symbol),
                        pos,
                    })
                }
                '<' => {
                    let symbol = if self.consume_next_char_if_eq('=') {
                        self.offset_in_line += 2;
                        Symbol::LessEqual
                    } else {
                        self.offset_in_line += 1;
                        Symbol::Less
                    };
                    Ok(Token {
                        data: TokenType::Symbol(symbol),
                        pos,
                    })
                }
                '>' => {
                    let symbol = if self.consume_next_char_if_eq('=') {
                        self.offset_in_line += 2;
                        Symbol::GreaterEqual
                    } else {
                        self.offset_in_line += 1;
                        Symbol::Greater
                    };
                    Ok(Token {
                        data: TokenType::Symbol(symbol),
                        pos,
                    })
                }
                '|' => {
                    let symbol = if self.consume_next_char_if_eq('|') {
                        self.offset_in_line += 2;
                        Symbol::PipePipe
                    } else {
                        self.offset_in_line += 1;
                        Symbol::Pipe
                    };
                    Ok(Token {
                        data: TokenType::Symbol(symbol),
                        pos,
                    })
                }
                '&' => {
                    let symbol = if self.consume_next_char_if_eq('&') {
                        self.offset_in_line += 2;
                        Symbol::AmpAmp
                    } else {
                        self.offset_in_line += 1;
                        Symbol::Amp
                    };
                    Ok(Token {
                        data: TokenType::Symbol(symbol),
                        pos,
                    })
                }
                '/' => {
                    if self.consume_next_char_if_eq('/') {
                        // Gobble the comment and then recursively call
                        let mut comment_len = 2;
                        while self.consume_next_char_if_neq('\n') {
                            comment_len += 1;
                        }
                        self.offset_in_line += comment_len;
                        // We don't consume the newline so there is no need to increment line here
                        self.scan_token()
                    } else {
                        self.symbol_token(Symbol::Slash, pos)
                    }
                }
                // Both of these have almost the same behavior. We gobble all the whitespace we can to avoid increasing
                // recursion depth in the case of many lines that have only whitespace characters
                ' ' | '\r' | '\t' => {
                    self.offset_in_line += 1;
                    self.gobble_whitespace();
                    self.scan_token()
                }
                '\n' => {
                    self.offset_in_line = 0;
                    self.line += 1;
                    self.gobble_whitespace();
                    self.scan_token()
                }
                '0' if self.consume_next_char_if_eq('x') => {
                    let mut digit_len = 0;
                    while self.consume_next_char_if_match(|ch| ch.is_ascii_hexdigit()) {
                        digit_len += 1;
                    }
                    self.offset_in_line += digit_len + 2;
                    // SAFETY: offset is generated as a valid utf-8 offset per CharIndices
                    // and the 0x prefix is known to be 2 bytes
                    let digits = unsafe { self.code_subslice(offset + 2, digit_len) };
                    Ok(Token {
                        data: TokenType::Hex(digits),
                        pos,
                    })
                }
                '0' if self.consume_next_char_if_eq('b') => {
                    let mut digit_len = 0;
                    while self.consume_next_char_if_match(|ch| ch == '0' || ch == '1') {
                        digit_len += 1;
                    }
                    self.offset_in_line += digit_len + 2;
                    // SAFETY: offset is generated as a valid utf-8 offset per CharIndices
                    // and the 0b prefix is known to be 2 bytes
                    let digits = unsafe { self.code_subslice(offset + 2, digit_len) };
                    Ok(Token {
                        data: TokenType::Bin(digits),
                        pos,
                    })
                }
                '0'..='9' => {
                    let mut num_len = 1;
                    let mut is_float = false;
                    while self.consume_next_char_if_match(|ch| ch.is_ascii_digit()) {
                        num_len += 1;
                    }
                    // Only consume a '.' when a fractional digit follows it
                    if self.peek_char() == Some('.') && self.peek_char_after_is_digit() {
                        _ = self.code_iter.next();
                        num_len += 1;
                        is_float = true;
                        while self.consume_next_char_if_match(|ch| ch.is_ascii_digit()) {
                            num_len += 1;
                        }
                    }
                    self.offset_in_line += num_len;
                    // SAFETY: offset is generated as a valid utf-8 offset per CharIndices
                    let num_slice = unsafe { self.code_subslice(offset, num_len) };
                    if is_float {
                        // A digits-and-dot slice is always a well formed float
                        let number = num_slice.parse::<f64>().unwrap();
                        Ok(Token {
                            data: TokenType::Float(number),
                            pos,
                        })
                    } else {
                        match num_slice.parse::<i64>() {
                            Ok(number) => Ok(Token {
                                data: TokenType::Int(number),
                                pos,
                            }),
                            Err(_) => Err(ScanError {
                                error: ScanErrorType::NumberTooLarge,
                                pos,
                            }),
                        }
                    }
                }
                '"' => {
                    let mut str_len = 0;
                    // Strings are multiline, so we need to track things like whether or not we cross a newline
                    let mut terminated = false;
                    while let Some((_, ch)) = self.code_iter.next() {
                        match ch {
                            '\n' => {
                                str_len += 1;
                                self.offset_in_line = 0;
                                self.line += 1;
                            }
                            '"' => {
                                self.offset_in_line += 1;
                                terminated = true;
                                break;
                            }
                            _ => {
                                str_len += 1;
                                self.offset_in_line += 1;
                            }
                        }
                    }
                    if !terminated {
                        Err(ScanError {
                            error: ScanErrorType::UnterminatedString,
                            pos,
                        })
                    } else {
                        // We slice str_len since we want to snip the trailing quote
                        let string = unsafe {
                            // SAFETY: offset is generated as a valid utf-8 offset per CharIndices
                            // We skip over the leading quote but this is definitely only 1 byte
                            self.code_subslice(offset + 1, str_len)
                        };
                        Ok(Token {
                            data: TokenType::String(string),
                            pos,
                        })
                    }
                }
                c if c.is_alphabetic() || c == '_' => {
                    let mut ident_len = 1;
                    while self.consume_next_char_if_match(|ch| ch.is_alphanumeric() || ch == '_') {
                        ident_len += 1;
                    }
                    self.offset_in_line += ident_len;
                    // SAFETY: offset is generated as a valid utf-8 offset per CharIndices
                    let identifier = unsafe { self.code_subslice(offset, ident_len) };
                    let token = if let Some((_, kw)) = KEYWORD_LITERAL_TO_SYMBOL
                        .iter()
                        .find(|(lit, _)| *lit == identifier)
                    {
                        Token {
                            data: TokenType::Keyword(*kw),
                            pos,
                        }
                    } else {
                        Token {
                            data: TokenType::Identifier(identifier),
                            pos,
                        }
                    };
                    Ok(token)
                }
                _ => {
                    self.offset_in_line += 1;
                    Err(ScanError {
                        error: ScanErrorType::UnrecognizedToken,
                        pos,
                    })
                }
            }
        } else {
            Ok(Token {
                data: TokenType::Eof,
                pos,
            })
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.code_iter.peek().map(|(_, ch)| *ch)
    }

    fn peek_char_after_is_digit(&self) -> bool {
        let mut ahead = self.code_iter.clone();
        _ = ahead.next();
        matches!(ahead.next(), Some((_, ch)) if ch.is_ascii_digit())
    }
}

const WS_CHARS: &str = " \r\t";

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn scan_anything() {
        let code = "let";
        let mut scanner = Scanner::new(code);
        let first_token = scanner.next().unwrap();
        match first_token.data {
            TokenType::Keyword(keyword) => {
                assert_eq!(Keyword::Let, keyword);
                assert_eq!(
                    Pos {
                        offset_in_line: 0,
                        line: 0
                    },
                    first_token.pos
                );
            }
            _ => unreachable!(),
        };
    }

    #[test]
    fn scan_basic_sequence() {
        let code = "let marco = \"9001\"";
        let mut scanner = Scanner::new(code);
        let token = scanner.next().unwrap();
        match token.data {
            TokenType::Keyword(keyword) => {
                assert_eq!(Keyword::Let, keyword);
                assert_eq!(
                    Pos {
                        offset_in_line: 0,
                        line: 0
                    },
                    token.pos
                );
            }
            _ => unreachable!(),
        }

        let token = scanner.next().unwrap();
        match token.data {
            TokenType::Identifier(identifier) => {
                assert_eq!("marco", identifier);
                assert_eq!(
                    Pos {
                        offset_in_line: 4,
                        line: 0
                    },
                    token.pos
                );
            }
            _ => unreachable!(),
        }

        let token = scanner.next().unwrap();
        match token.data {
            TokenType::Symbol(symbol) => {
                assert_eq!(Symbol::Equal, symbol);
                assert_eq!(
                    Pos {
                        offset_in_line: 10,
                        line: 0
                    },
                    token.pos
                );
            }
            _ => unreachable!(),
        }

        let token = scanner.next().unwrap();
        match token.data {
            TokenType::String(string) => {
                assert_eq!("9001", string);
                assert_eq!(
                    Pos {
                        offset_in_line: 12,
                        line: 0
                    },
                    token.pos
                );
            }
            _ => unreachable!(),
        }

        let token = scanner.next().unwrap();
        assert_eq!(TokenType::Eof, token.data);
    }

    #[test]
    fn scan_int_and_float() {
        let mut scanner = Scanner::new("42 4.25");
        assert_eq!(TokenType::Int(42), scanner.next().unwrap().data);
        assert_eq!(TokenType::Float(4.25), scanner.next().unwrap().data);
        assert_eq!(TokenType::Eof, scanner.next().unwrap().data);
    }

    #[test]
    fn scan_radix_literals() {
        let mut scanner = Scanner::new("0x1A 0b101 0xab");
        assert_eq!(TokenType::Hex("1A"), scanner.next().unwrap().data);
        assert_eq!(TokenType::Bin("101"), scanner.next().unwrap().data);
        assert_eq!(TokenType::Hex("ab"), scanner.next().unwrap().data);
        assert_eq!(TokenType::Eof, scanner.next().unwrap().data);
    }

    #[test]
    fn radix_literal_stops_at_invalid_digit() {
        // The 2 is not a binary digit, so it starts a fresh int token
        let mut scanner = Scanner::new("0b12");
        assert_eq!(TokenType::Bin("1"), scanner.next().unwrap().data);
        assert_eq!(TokenType::Int(2), scanner.next().unwrap().data);
    }

    #[test]
    fn scan_operator_sequence() {
        let mut scanner = Scanner::new("% | & || && !=");
        assert_eq!(
            TokenType::Symbol(Symbol::Percent),
            scanner.next().unwrap().data
        );
        assert_eq!(
            TokenType::Symbol(Symbol::Pipe),
            scanner.next().unwrap().data
        );
        assert_eq!(TokenType::Symbol(Symbol::Amp), scanner.next().unwrap().data);
        assert_eq!(
            TokenType::Symbol(Symbol::PipePipe),
            scanner.next().unwrap().data
        );
        assert_eq!(
            TokenType::Symbol(Symbol::AmpAmp),
            scanner.next().unwrap().data
        );
        assert_eq!(
            TokenType::Symbol(Symbol::BangEqual),
            scanner.next().unwrap().data
        );
    }

    #[test]
    fn scan_skips_comments() {
        let code = "let x; // the rest of this line vanishes\nlet";
        let mut scanner = Scanner::new(code);
        assert_eq!(TokenType::Keyword(Keyword::Let), scanner.next().unwrap().data);
        assert_eq!(TokenType::Identifier("x"), scanner.next().unwrap().data);
        assert_eq!(
            TokenType::Symbol(Symbol::Semicolon),
            scanner.next().unwrap().data
        );
        let token = scanner.next().unwrap();
        assert_eq!(TokenType::Keyword(Keyword::Let), token.data);
        assert_eq!(1, token.pos.line);
    }

    #[test]
    fn test_multi_line_string_pos() {
        let code = r#"
"marco
bomp";
"#;
        let mut scanner = Scanner::new(code);
        // Did we get a string?
        let token = scanner.next().unwrap();
        match token.data {
            TokenType::String(string) => {
                assert_eq!("marco\nbomp", string);
                assert_eq!(1, token.pos.line);
            }
            _ => unreachable!(),
        }
        // Did we correctly update the lines etc
        let token = scanner.next().unwrap();
        match token.data {
            TokenType::Symbol(symbol) => {
                assert_eq!(Symbol::Semicolon, symbol);
                assert_eq!(
                    Pos {
                        line: 2,
                        offset_in_line: 5
                    },
                    token.pos
                );
            }
            _ => unreachable!(),
        }
    }

    // Verify we don't get into an infinite loop by error conditions
    #[test]
    fn no_infinite_seq_on_unterminated_string() {
        let code = "\"a string that isn't terminated";
        let mut scanner = Scanner::new(code);
        let token = scanner.next();
        assert_eq!(ScanErrorType::UnterminatedString, token.unwrap_err().error);
        let token = scanner.next();
        assert_eq!(TokenType::Eof, token.unwrap().data);
    }

    #[test]
    fn no_infinite_seq_on_bad_token() {
        let code = "$let";
        let mut scanner = Scanner::new(code);
        let token = scanner.next();
        assert_eq!(ScanErrorType::UnrecognizedToken, token.unwrap_err().error);
    }

    #[test]
    fn peek_does_not_consume() {
        let mut scanner = Scanner::new("let x");
        assert_eq!(
            TokenType::Keyword(Keyword::Let),
            scanner.peek().unwrap().data
        );
        assert_eq!(TokenType::Keyword(Keyword::Let), scanner.next().unwrap().data);
        assert!(scanner
            .next_if(|data| matches!(data, TokenType::Identifier(_)))
            .is_some());
        assert!(scanner.is_at_eof());
    }
}
