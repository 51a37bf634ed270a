//! Tokenizer.
//!
//! Produces the full token vector up front; the parser works on indices into
//! it, which makes speculative parsing a matter of saving and restoring a
//! position. Trivia (whitespace, comments, preprocessor lines) is dropped.
//! Contextual keywords (`get`, `set`, `var`, `value`, ...) stay identifiers
//! and are recognised by text.

use prov_common::Span;

use crate::error::ParseDiagnostic;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    EndOfFile,
    Unknown,

    Identifier,
    IntegerLiteral,
    RealLiteral,
    StringLiteral,
    InterpolatedStringLiteral,
    CharLiteral,

    // ----- Keywords -----
    AbstractKeyword,
    AsKeyword,
    BaseKeyword,
    BreakKeyword,
    CaseKeyword,
    CatchKeyword,
    CheckedKeyword,
    ClassKeyword,
    ConstKeyword,
    ContinueKeyword,
    DefaultKeyword,
    DelegateKeyword,
    DoKeyword,
    ElseKeyword,
    EnumKeyword,
    EventKeyword,
    ExplicitKeyword,
    ExternKeyword,
    FalseKeyword,
    FinallyKeyword,
    FixedKeyword,
    ForKeyword,
    ForeachKeyword,
    GotoKeyword,
    IfKeyword,
    ImplicitKeyword,
    InKeyword,
    InterfaceKeyword,
    InternalKeyword,
    IsKeyword,
    LockKeyword,
    NamespaceKeyword,
    NewKeyword,
    NullKeyword,
    OperatorKeyword,
    OutKeyword,
    OverrideKeyword,
    ParamsKeyword,
    PrivateKeyword,
    ProtectedKeyword,
    PublicKeyword,
    ReadonlyKeyword,
    RefKeyword,
    ReturnKeyword,
    SealedKeyword,
    SizeofKeyword,
    StackallocKeyword,
    StaticKeyword,
    StructKeyword,
    SwitchKeyword,
    ThisKeyword,
    ThrowKeyword,
    TrueKeyword,
    TryKeyword,
    TypeofKeyword,
    UncheckedKeyword,
    UnsafeKeyword,
    UsingKeyword,
    VirtualKeyword,
    VolatileKeyword,
    WhileKeyword,

    // ----- Punctuation -----
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Semicolon,
    Comma,
    Dot,
    DotDot,
    Colon,
    ColonColon,
    Question,
    QuestionDot,
    QuestionQuestion,
    QuestionQuestionEquals,
    Equals,
    EqualsEquals,
    EqualsGreaterThan,
    Exclamation,
    ExclamationEquals,
    LessThan,
    LessThanEquals,
    LessThanLessThan,
    LessThanLessThanEquals,
    /// `>` is never merged with a following `>` so that nested generic
    /// argument lists close; the parser re-joins shift operators.
    GreaterThan,
    GreaterThanEquals,
    Plus,
    PlusPlus,
    PlusEquals,
    Minus,
    MinusMinus,
    MinusEquals,
    MinusGreaterThan,
    Asterisk,
    AsteriskEquals,
    Slash,
    SlashEquals,
    Percent,
    PercentEquals,
    Ampersand,
    AmpersandAmpersand,
    AmpersandEquals,
    Bar,
    BarBar,
    BarEquals,
    Caret,
    CaretEquals,
    Tilde,
}

impl SyntaxKind {
    pub fn is_keyword(self) -> bool {
        (self as u16) >= (SyntaxKind::AbstractKeyword as u16)
            && (self as u16) <= (SyntaxKind::WhileKeyword as u16)
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            SyntaxKind::IntegerLiteral
                | SyntaxKind::RealLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::InterpolatedStringLiteral
                | SyntaxKind::CharLiteral
        )
    }
}

fn keyword_kind(text: &str) -> Option<SyntaxKind> {
    let kind = match text {
        "abstract" => SyntaxKind::AbstractKeyword,
        "as" => SyntaxKind::AsKeyword,
        "base" => SyntaxKind::BaseKeyword,
        "break" => SyntaxKind::BreakKeyword,
        "case" => SyntaxKind::CaseKeyword,
        "catch" => SyntaxKind::CatchKeyword,
        "checked" => SyntaxKind::CheckedKeyword,
        "class" => SyntaxKind::ClassKeyword,
        "const" => SyntaxKind::ConstKeyword,
        "continue" => SyntaxKind::ContinueKeyword,
        "default" => SyntaxKind::DefaultKeyword,
        "delegate" => SyntaxKind::DelegateKeyword,
        "do" => SyntaxKind::DoKeyword,
        "else" => SyntaxKind::ElseKeyword,
        "enum" => SyntaxKind::EnumKeyword,
        "event" => SyntaxKind::EventKeyword,
        "explicit" => SyntaxKind::ExplicitKeyword,
        "extern" => SyntaxKind::ExternKeyword,
        "false" => SyntaxKind::FalseKeyword,
        "finally" => SyntaxKind::FinallyKeyword,
        "fixed" => SyntaxKind::FixedKeyword,
        "for" => SyntaxKind::ForKeyword,
        "foreach" => SyntaxKind::ForeachKeyword,
        "goto" => SyntaxKind::GotoKeyword,
        "if" => SyntaxKind::IfKeyword,
        "implicit" => SyntaxKind::ImplicitKeyword,
        "in" => SyntaxKind::InKeyword,
        "interface" => SyntaxKind::InterfaceKeyword,
        "internal" => SyntaxKind::InternalKeyword,
        "is" => SyntaxKind::IsKeyword,
        "lock" => SyntaxKind::LockKeyword,
        "namespace" => SyntaxKind::NamespaceKeyword,
        "new" => SyntaxKind::NewKeyword,
        "null" => SyntaxKind::NullKeyword,
        "operator" => SyntaxKind::OperatorKeyword,
        "out" => SyntaxKind::OutKeyword,
        "override" => SyntaxKind::OverrideKeyword,
        "params" => SyntaxKind::ParamsKeyword,
        "private" => SyntaxKind::PrivateKeyword,
        "protected" => SyntaxKind::ProtectedKeyword,
        "public" => SyntaxKind::PublicKeyword,
        "readonly" => SyntaxKind::ReadonlyKeyword,
        "ref" => SyntaxKind::RefKeyword,
        "return" => SyntaxKind::ReturnKeyword,
        "sealed" => SyntaxKind::SealedKeyword,
        "sizeof" => SyntaxKind::SizeofKeyword,
        "stackalloc" => SyntaxKind::StackallocKeyword,
        "static" => SyntaxKind::StaticKeyword,
        "struct" => SyntaxKind::StructKeyword,
        "switch" => SyntaxKind::SwitchKeyword,
        "this" => SyntaxKind::ThisKeyword,
        "throw" => SyntaxKind::ThrowKeyword,
        "true" => SyntaxKind::TrueKeyword,
        "try" => SyntaxKind::TryKeyword,
        "typeof" => SyntaxKind::TypeofKeyword,
        "unchecked" => SyntaxKind::UncheckedKeyword,
        "unsafe" => SyntaxKind::UnsafeKeyword,
        "using" => SyntaxKind::UsingKeyword,
        "virtual" => SyntaxKind::VirtualKeyword,
        "volatile" => SyntaxKind::VolatileKeyword,
        "while" => SyntaxKind::WhileKeyword,
        _ => return None,
    };
    Some(kind)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub span: Span,
}

/// Result of scanning a whole source text. The last token is always
/// `EndOfFile`.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<ParseDiagnostic>,
}

pub struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    diagnostics: Vec<ParseDiagnostic>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Scanner<'a> {
        Scanner {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Scan `source` to completion.
    pub fn scan_all(source: &str) -> ScanResult {
        let mut scanner = Scanner::new(source);
        let mut tokens = Vec::with_capacity(source.len() / 4 + 1);
        loop {
            let token = scanner.scan();
            tokens.push(token);
            if token.kind == SyntaxKind::EndOfFile {
                break;
            }
        }
        ScanResult {
            tokens,
            diagnostics: scanner.diagnostics,
        }
    }

    #[inline]
    fn peek(&self, ahead: usize) -> u8 {
        self.bytes.get(self.pos + ahead).copied().unwrap_or(0)
    }

    fn error(&mut self, start: usize, message: &str) {
        self.diagnostics.push(ParseDiagnostic::new(
            Span::new(start as u32, self.pos as u32),
            message,
        ));
    }

    /// Scan the next significant token.
    pub fn scan(&mut self) -> Token {
        self.skip_trivia();
        let start = self.pos;
        if start >= self.bytes.len() {
            return Token {
                kind: SyntaxKind::EndOfFile,
                span: Span::at(start as u32),
            };
        }
        let kind = self.scan_token();
        // Escapes may step past a truncated end.
        self.pos = self.pos.min(self.bytes.len());
        Token {
            kind,
            span: Span::new(start as u32, self.pos as u32),
        }
    }

    fn skip_trivia(&mut self) {
        let mut at_line_start = self.pos == 0 || matches!(self.bytes.get(self.pos - 1), Some(b'\n'));
        while self.pos < self.bytes.len() {
            let ch = self.bytes[self.pos];
            match ch {
                b'\n' => {
                    self.pos += 1;
                    at_line_start = true;
                }
                b' ' | b'\t' | b'\r' | 0x0B | 0x0C => self.pos += 1,
                b'/' if self.peek(1) == b'/' => self.skip_line(),
                b'/' if self.peek(1) == b'*' => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        if self.pos >= self.bytes.len() {
                            self.error(start, "unterminated comment");
                            break;
                        }
                        if self.bytes[self.pos] == b'*' && self.peek(1) == b'/' {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                    at_line_start = false;
                }
                // Preprocessor directives occupy a whole line.
                b'#' if at_line_start => self.skip_line(),
                _ if ch >= 0x80 => {
                    // Non-ASCII whitespace (BOM, NBSP, ...)
                    let rest = &self.source[self.pos..];
                    match rest.chars().next() {
                        Some(c) if c.is_whitespace() || c == '\u{feff}' => {
                            self.pos += c.len_utf8();
                        }
                        _ => return,
                    }
                }
                _ => return,
            }
        }
    }

    fn skip_line(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
    }

    fn scan_token(&mut self) -> SyntaxKind {
        let ch = self.bytes[self.pos];
        match ch {
            b'0'..=b'9' => self.scan_number(),
            b'.' if self.peek(1).is_ascii_digit() => self.scan_number(),
            b'"' => {
                self.pos += 1;
                self.scan_regular_string_body(b'"');
                SyntaxKind::StringLiteral
            }
            b'\'' => {
                self.pos += 1;
                self.scan_regular_string_body(b'\'');
                SyntaxKind::CharLiteral
            }
            b'@' if self.peek(1) == b'"' => {
                self.pos += 2;
                self.scan_verbatim_string_body();
                SyntaxKind::StringLiteral
            }
            b'@' if self.peek(1) == b'$' && self.peek(2) == b'"' => {
                self.pos += 3;
                self.scan_interpolated_body(true);
                SyntaxKind::InterpolatedStringLiteral
            }
            b'$' if self.peek(1) == b'"' => {
                self.pos += 2;
                self.scan_interpolated_body(false);
                SyntaxKind::InterpolatedStringLiteral
            }
            b'$' if self.peek(1) == b'@' && self.peek(2) == b'"' => {
                self.pos += 3;
                self.scan_interpolated_body(true);
                SyntaxKind::InterpolatedStringLiteral
            }
            b'@' if is_identifier_start(self.peek(1)) => {
                // Verbatim identifier: never a keyword.
                self.pos += 1;
                self.scan_identifier_rest();
                SyntaxKind::Identifier
            }
            _ if is_identifier_start(ch) => {
                let start = self.pos;
                self.scan_identifier_rest();
                keyword_kind(&self.source[start..self.pos]).unwrap_or(SyntaxKind::Identifier)
            }
            _ if ch >= 0x80 => {
                let rest = &self.source[self.pos..];
                match rest.chars().next() {
                    Some(c) if c.is_alphabetic() => {
                        self.scan_identifier_rest();
                        SyntaxKind::Identifier
                    }
                    Some(c) => {
                        let start = self.pos;
                        self.pos += c.len_utf8();
                        self.error(start, "unexpected character");
                        SyntaxKind::Unknown
                    }
                    None => SyntaxKind::EndOfFile,
                }
            }
            _ => self.scan_punctuation(),
        }
    }

    fn scan_identifier_rest(&mut self) {
        while self.pos < self.bytes.len() {
            let ch = self.bytes[self.pos];
            if ch.is_ascii_alphanumeric() || ch == b'_' {
                self.pos += 1;
            } else if ch >= 0x80 {
                match self.source[self.pos..].chars().next() {
                    Some(c) if c.is_alphanumeric() => self.pos += c.len_utf8(),
                    _ => break,
                }
            } else {
                break;
            }
        }
    }

    fn scan_number(&mut self) -> SyntaxKind {
        let mut real = false;
        if self.bytes[self.pos] == b'0' && matches!(self.peek(1), b'x' | b'X' | b'b' | b'B') {
            self.pos += 2;
            while self.peek(0).is_ascii_hexdigit() || self.peek(0) == b'_' {
                self.pos += 1;
            }
        } else {
            self.scan_digits();
            if self.peek(0) == b'.' && self.peek(1).is_ascii_digit() {
                real = true;
                self.pos += 1;
                self.scan_digits();
            }
            if matches!(self.peek(0), b'e' | b'E') {
                let sign = usize::from(matches!(self.peek(1), b'+' | b'-'));
                if self.peek(1 + sign).is_ascii_digit() {
                    real = true;
                    self.pos += 1 + sign;
                    self.scan_digits();
                }
            }
        }
        // Suffixes: u, l, ul, lu, f, d, m
        loop {
            match self.peek(0) {
                b'u' | b'U' | b'l' | b'L' => self.pos += 1,
                b'f' | b'F' | b'd' | b'D' | b'm' | b'M' => {
                    real = true;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        if real {
            SyntaxKind::RealLiteral
        } else {
            SyntaxKind::IntegerLiteral
        }
    }

    fn scan_digits(&mut self) {
        while self.peek(0).is_ascii_digit() || self.peek(0) == b'_' {
            self.pos += 1;
        }
    }

    fn scan_regular_string_body(&mut self, quote: u8) {
        let start = self.pos - 1;
        loop {
            match self.bytes.get(self.pos).copied() {
                None | Some(b'\n') => {
                    self.error(start, "unterminated literal");
                    return;
                }
                Some(b'\\') => self.pos += 2,
                Some(ch) if ch == quote => {
                    self.pos += 1;
                    return;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn scan_verbatim_string_body(&mut self) {
        let start = self.pos - 2;
        loop {
            match self.bytes.get(self.pos).copied() {
                None => {
                    self.error(start, "unterminated verbatim string");
                    return;
                }
                Some(b'"') if self.peek(1) == b'"' => self.pos += 2,
                Some(b'"') => {
                    self.pos += 1;
                    return;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Scan an interpolated string as a single token, holes included.
    fn scan_interpolated_body(&mut self, verbatim: bool) {
        let start = self.pos;
        loop {
            match self.bytes.get(self.pos).copied() {
                None => {
                    self.error(start, "unterminated interpolated string");
                    return;
                }
                Some(b'\n') if !verbatim => {
                    self.error(start, "unterminated interpolated string");
                    return;
                }
                Some(b'\\') if !verbatim => self.pos += 2,
                Some(b'"') if verbatim && self.peek(1) == b'"' => self.pos += 2,
                Some(b'"') => {
                    self.pos += 1;
                    return;
                }
                Some(b'{') if self.peek(1) == b'{' => self.pos += 2,
                Some(b'{') => {
                    self.pos += 1;
                    self.skip_interpolation_hole();
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn skip_interpolation_hole(&mut self) {
        let mut depth = 1u32;
        while let Some(ch) = self.bytes.get(self.pos).copied() {
            match ch {
                b'{' => {
                    depth += 1;
                    self.pos += 1;
                }
                b'}' => {
                    depth -= 1;
                    self.pos += 1;
                    if depth == 0 {
                        return;
                    }
                }
                b'"' => {
                    self.pos += 1;
                    self.scan_regular_string_body(b'"');
                }
                b'\'' => {
                    self.pos += 1;
                    self.scan_regular_string_body(b'\'');
                }
                b'\n' => return,
                _ => self.pos += 1,
            }
        }
    }

    fn scan_punctuation(&mut self) -> SyntaxKind {
        use SyntaxKind::*;
        let ch = self.bytes[self.pos];
        let next = self.peek(1);
        let next2 = self.peek(2);
        let (kind, len) = match ch {
            b'{' => (OpenBrace, 1),
            b'}' => (CloseBrace, 1),
            b'(' => (OpenParen, 1),
            b')' => (CloseParen, 1),
            b'[' => (OpenBracket, 1),
            b']' => (CloseBracket, 1),
            b';' => (Semicolon, 1),
            b',' => (Comma, 1),
            b'.' if next == b'.' => (DotDot, 2),
            b'.' => (Dot, 1),
            b':' if next == b':' => (ColonColon, 2),
            b':' => (Colon, 1),
            // `a?.5:1` is a conditional with a real literal, not `?.`
            b'?' if next == b'.' && !next2.is_ascii_digit() => (QuestionDot, 2),
            b'?' if next == b'?' && next2 == b'=' => (QuestionQuestionEquals, 3),
            b'?' if next == b'?' => (QuestionQuestion, 2),
            b'?' => (Question, 1),
            b'=' if next == b'=' => (EqualsEquals, 2),
            b'=' if next == b'>' => (EqualsGreaterThan, 2),
            b'=' => (Equals, 1),
            b'!' if next == b'=' => (ExclamationEquals, 2),
            b'!' => (Exclamation, 1),
            b'<' if next == b'<' && next2 == b'=' => (LessThanLessThanEquals, 3),
            b'<' if next == b'<' => (LessThanLessThan, 2),
            b'<' if next == b'=' => (LessThanEquals, 2),
            b'<' => (LessThan, 1),
            b'>' if next == b'=' => (GreaterThanEquals, 2),
            b'>' => (GreaterThan, 1),
            b'+' if next == b'+' => (PlusPlus, 2),
            b'+' if next == b'=' => (PlusEquals, 2),
            b'+' => (Plus, 1),
            b'-' if next == b'-' => (MinusMinus, 2),
            b'-' if next == b'=' => (MinusEquals, 2),
            b'-' if next == b'>' => (MinusGreaterThan, 2),
            b'-' => (Minus, 1),
            b'*' if next == b'=' => (AsteriskEquals, 2),
            b'*' => (Asterisk, 1),
            b'/' if next == b'=' => (SlashEquals, 2),
            b'/' => (Slash, 1),
            b'%' if next == b'=' => (PercentEquals, 2),
            b'%' => (Percent, 1),
            b'&' if next == b'&' => (AmpersandAmpersand, 2),
            b'&' if next == b'=' => (AmpersandEquals, 2),
            b'&' => (Ampersand, 1),
            b'|' if next == b'|' => (BarBar, 2),
            b'|' if next == b'=' => (BarEquals, 2),
            b'|' => (Bar, 1),
            b'^' if next == b'=' => (CaretEquals, 2),
            b'^' => (Caret, 1),
            b'~' => (Tilde, 1),
            _ => {
                let start = self.pos;
                self.pos += 1;
                self.error(start, "unexpected character");
                return Unknown;
            }
        };
        self.pos += len;
        kind
    }
}

#[inline]
fn is_identifier_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}
