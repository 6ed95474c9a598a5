use {crate::report, maplit::hashmap, std::collections::HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,

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
    Question,
    Colon,

    // One or two character tokens.
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals
    Identifier,
    String,
    Number,

    // Keywords
    KwAnd,
    KwBreak,
    KwClass,
    KwElse,
    KwFalse,
    KwFor,
    KwFun,
    KwIf,
    KwNil,
    KwOr,
    KwPrint,
    KwReturn,
    KwSuper,
    KwThis,
    KwTrue,
    KwVar,
    KwWhile,
}

/// Literal payload decoded while scanning NUMBER and STRING tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum ScannedLiteral {
    Num(f64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourcePosition {
    pub line: usize,
    pub span: std::ops::Range<usize>,
}

impl std::fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}..{}]", self.line, self.span.start, self.span.end)
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<ScannedLiteral>,
    pub position: SourcePosition,
}

impl Token {
    pub fn literal_num(&self) -> Option<f64> {
        match &self.literal {
            Some(ScannedLiteral::Num(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn literal_str(&self) -> Option<String> {
        match &self.literal {
            Some(ScannedLiteral::Str(s)) => Some(s.clone()),
            _ => None,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.lexeme)
    }
}

/// Current scanner state for iterating over the source input.
pub struct Scanner<'src> {
    source: &'src str,
    chars: Vec<(usize, char)>, // (byte offset, char) pairs
    line: usize,
    start: usize,   // char index of the current lexeme's first character
    current: usize, // char index of the next character to consume
    scan_offset: usize,
    keywords: HashMap<&'static str, TokenKind>,
}

trait IsIdentifier {
    fn is_identifier(&self) -> bool;
}

impl IsIdentifier for char {
    fn is_identifier(&self) -> bool {
        self.is_alphanumeric() || *self == '_'
    }
}

impl<'src> Scanner<'src> {
    /// `scan_offset` shifts every produced span, so tokens scanned across
    /// successive REPL lines keep globally unique spans.
    pub fn new(source: &'src str, scan_offset: usize) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            line: 1,
            start: 0,
            current: 0,
            scan_offset,
            keywords: hashmap! {
                "and" => TokenKind::KwAnd,
                "break" => TokenKind::KwBreak,
                "class" => TokenKind::KwClass,
                "else" => TokenKind::KwElse,
                "false" => TokenKind::KwFalse,
                "for" => TokenKind::KwFor,
                "fun" => TokenKind::KwFun,
                "if" => TokenKind::KwIf,
                "nil" => TokenKind::KwNil,
                "or" => TokenKind::KwOr,
                "print" => TokenKind::KwPrint,
                "return" => TokenKind::KwReturn,
                "super" => TokenKind::KwSuper,
                "this" => TokenKind::KwThis,
                "true" => TokenKind::KwTrue,
                "var" => TokenKind::KwVar,
                "while" => TokenKind::KwWhile,
            },
        }
    }

    /// Scan the whole input. The returned list always ends in a single EOF
    /// token; scan errors are reported and scanning continues.
    pub fn scan_tokens(&mut self) -> Vec<Token> {
        let mut tokens = vec![];
        while !self.is_at_end() {
            self.start = self.current;
            if let Some(token) = self.scan_token() {
                tokens.push(token);
            }
        }
        tokens.push(Token {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            literal: None,
            position: SourcePosition {
                line: self.line,
                span: self.source.len() + self.scan_offset..self.source.len() + self.scan_offset,
            },
        });
        tokens
    }

    fn scan_token(&mut self) -> Option<Token> {
        let c = self.advance();
        match c {
            '(' => Some(self.make_token(TokenKind::LeftParen)),
            ')' => Some(self.make_token(TokenKind::RightParen)),
            '{' => Some(self.make_token(TokenKind::LeftBrace)),
            '}' => Some(self.make_token(TokenKind::RightBrace)),
            ',' => Some(self.make_token(TokenKind::Comma)),
            '.' => Some(self.make_token(TokenKind::Dot)),
            '-' => Some(self.make_token(TokenKind::Minus)),
            '+' => Some(self.make_token(TokenKind::Plus)),
            ';' => Some(self.make_token(TokenKind::Semicolon)),
            '*' => Some(self.make_token(TokenKind::Star)),
            '?' => Some(self.make_token(TokenKind::Question)),
            ':' => Some(self.make_token(TokenKind::Colon)),
            '!' => {
                let kind = if self.matches('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                Some(self.make_token(kind))
            }
            '=' => {
                let kind = if self.matches('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                Some(self.make_token(kind))
            }
            '<' => {
                let kind = if self.matches('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                Some(self.make_token(kind))
            }
            '>' => {
                let kind = if self.matches('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                Some(self.make_token(kind))
            }
            '/' => {
                if self.matches('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                    None
                } else if self.matches('*') {
                    self.block_comment();
                    None
                } else {
                    Some(self.make_token(TokenKind::Slash))
                }
            }
            ' ' | '\r' | '\t' => None,
            '\n' => {
                self.line += 1;
                None
            }
            '"' => self.string(),
            '0'..='9' => Some(self.number()),
            c if c.is_alphabetic() || c == '_' => Some(self.identifier()),
            _ => {
                report::error_line(self.line, "Unexpected character.");
                None
            }
        }
    }

    /// A `*` inside a block comment must be part of the closing `*/`;
    /// anything else is reported and the comment keeps going.
    fn block_comment(&mut self) {
        loop {
            if self.is_at_end() {
                report::error_line(self.line, "Unclosed block comment.");
                return;
            }
            match self.advance() {
                '\n' => self.line += 1,
                '*' => {
                    if self.matches('/') {
                        return;
                    }
                    report::error_line(self.line, "Unexpected character.");
                }
                _ => {}
            }
        }
    }

    fn string(&mut self) -> Option<Token> {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }
        if self.is_at_end() {
            report::error_line(self.line, "Unterminated string.");
            return None;
        }
        // The closing ".
        self.advance();

        let contents =
            self.source[self.byte_pos(self.start + 1)..self.byte_pos(self.current - 1)].to_string();
        Some(self.make_literal_token(TokenKind::String, ScannedLiteral::Str(contents)))
    }

    fn number(&mut self) -> Token {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        let lexeme = &self.source[self.byte_pos(self.start)..self.byte_pos(self.current)];
        let value = lexeme.parse().expect("scanned a well-formed number");
        self.make_literal_token(TokenKind::Number, ScannedLiteral::Num(value))
    }

    fn identifier(&mut self) -> Token {
        while self.peek().is_identifier() {
            self.advance();
        }

        let lexeme = &self.source[self.byte_pos(self.start)..self.byte_pos(self.current)];
        match self.keywords.get(lexeme) {
            Some(kind) => self.make_token(*kind),
            None => self.make_token(TokenKind::Identifier),
        }
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        self.token_with_literal(kind, None)
    }

    fn make_literal_token(&self, kind: TokenKind, literal: ScannedLiteral) -> Token {
        self.token_with_literal(kind, Some(literal))
    }

    fn token_with_literal(&self, kind: TokenKind, literal: Option<ScannedLiteral>) -> Token {
        let span = self.byte_pos(self.start)..self.byte_pos(self.current);
        Token {
            kind,
            lexeme: self.source[span.clone()].to_string(),
            literal,
            position: SourcePosition {
                line: self.line,
                span: span.start + self.scan_offset..span.end + self.scan_offset,
            },
        }
    }

    /// Byte offset of the char at `index`, or one past the input's end.
    fn byte_pos(&self, index: usize) -> usize {
        self.chars
            .get(index)
            .map(|(byte, _)| *byte)
            .unwrap_or(self.source.len())
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    fn peek(&self) -> char {
        self.peek_offset(0)
    }

    fn peek_next(&self) -> char {
        self.peek_offset(1)
    }

    fn peek_offset(&self, offset: usize) -> char {
        self.chars
            .get(self.current + offset)
            .map(|(_, c)| *c)
            .unwrap_or('\0')
    }

    fn advance(&mut self) -> char {
        let (_, c) = self.chars[self.current];
        self.current += 1;
        c
    }

    /// Return true and advance if the next character is the expected one.
    fn matches(&mut self, expected: char) -> bool {
        if self.peek() != expected {
            return false;
        }
        self.current += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq};

    fn scan(source: &str) -> Vec<Token> {
        report::clear();
        Scanner::new(source, 0).scan_tokens()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        scan(source).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn punctuation_and_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("( ) { } , . - + ; / * ? : ! != = == > >= < <="),
            vec![
                LeftParen, RightParen, LeftBrace, RightBrace, Comma, Dot, Minus, Plus, Semicolon,
                Slash, Star, Question, Colon, Bang, BangEqual, Equal, EqualEqual, Greater,
                GreaterEqual, Less, LessEqual, Eof
            ]
        );
        assert!(!report::had_error());
    }

    #[test]
    fn ends_with_single_eof() {
        for source in ["", "  \t\r\n", "var x = 1;", "// only a comment"] {
            let tokens = scan(source);
            let eofs = tokens.iter().filter(|t| t.kind == TokenKind::Eof).count();
            assert_eq!(eofs, 1);
            assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
        }
    }

    #[test]
    fn numbers_carry_literals() {
        let tokens = scan("12 3.5 123.");
        assert_eq!(tokens[0].literal_num(), Some(12.0));
        assert_eq!(tokens[1].literal_num(), Some(3.5));
        // A trailing dot is not part of the number.
        assert_eq!(tokens[2].literal_num(), Some(123.0));
        assert_eq!(tokens[3].kind, TokenKind::Dot);
    }

    #[test]
    fn strings_may_span_lines() {
        let tokens = scan("\"one\ntwo\"");
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].literal_str(), Some("one\ntwo".into()));
        assert_eq!(tokens[0].position.line, 2);
        assert!(!report::had_error());
    }

    #[test]
    fn unterminated_string_is_reported() {
        let tokens = scan("\"never closed");
        assert_eq!(tokens.len(), 1); // just EOF
        assert!(report::had_error());
    }

    #[test]
    fn keywords_are_recognized() {
        use TokenKind::*;
        assert_eq!(
            kinds(
                "and break class else false fun for if nil or print return super this true var while"
            ),
            vec![
                KwAnd, KwBreak, KwClass, KwElse, KwFalse, KwFun, KwFor, KwIf, KwNil, KwOr, KwPrint,
                KwReturn, KwSuper, KwThis, KwTrue, KwVar, KwWhile, Eof
            ]
        );
    }

    #[test]
    fn identifiers_are_not_keywords() {
        let tokens = scan("classy _under break2");
        assert!(tokens[..3].iter().all(|t| t.kind == TokenKind::Identifier));
    }

    #[test]
    fn line_comment_runs_to_end_of_line() {
        assert_eq!(
            kinds("1 // ignored ?:\n2"),
            vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn block_comment_is_skipped() {
        let tokens = scan("/* a\nmultiline\ncomment */ 1");
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].position.line, 3);
        assert!(!report::had_error());
    }

    #[test]
    fn stray_star_inside_block_comment_is_reported() {
        scan("/* comment *\n1");
        assert!(report::had_error());
    }

    #[test]
    fn unclosed_block_comment_is_reported() {
        scan("/* never closed");
        assert!(report::had_error());
    }

    #[test]
    fn unexpected_character_is_reported_and_scanning_continues() {
        let tokens = scan("1 # 2");
        assert!(report::had_error());
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn spans_are_contiguous_slices_of_the_source() {
        let source = "var answer = 41.5; // comment";
        for token in scan(source) {
            if token.kind == TokenKind::Eof {
                continue;
            }
            assert_eq!(&source[token.position.span.clone()], token.lexeme);
        }
    }

    #[test]
    fn scan_offset_shifts_spans() {
        report::clear();
        let tokens = Scanner::new("x", 100).scan_tokens();
        assert_eq!(tokens[0].position.span, 100..101);
    }
}
