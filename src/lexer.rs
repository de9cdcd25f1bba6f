use crate::errors::*;
use crate::token::{keyword, Token, TokenKind};
use log::debug;

/// Single left-to-right pass over the source text.
///
/// Errors do not stop the scan: the offending lexeme is skipped up to the
/// next delimiter and scanning resumes, so one pass reports every lexical
/// error in the input.
pub struct Lexer<'a> {
    chars: Vec<char>,
    lines: Vec<&'a str>,
    pos: usize,
    line: usize,
    column: usize,
    list_level: isize,
    open_string: bool,
    errors: Vec<Diagnostic>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            lines: source
                .split('\n')
                .map(|line| line.trim_end_matches('\r'))
                .collect(),
            pos: 0,
            line: 1,
            column: 1,
            list_level: 0,
            open_string: false,
            errors: vec![],
        }
    }

    /// Scan the whole input, returning either all tokens or all errors.
    pub fn scan(mut self) -> std::result::Result<Vec<Token>, Vec<Diagnostic>> {
        let mut tokens = vec![];
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        if self.errors.is_empty() {
            Ok(tokens)
        } else {
            Err(self.errors)
        }
    }

    /// True if every opened list was closed and no string is left open.
    pub fn is_balanced(&self) -> bool {
        self.list_level <= 0 && !self.open_string
    }

    /// Produce the next token, or `None` at the end of input.
    pub fn next_token(&mut self) -> Option<Token> {
        loop {
            self.skip_whitespace();
            let ch = self.peek()?;
            let (line, column) = (self.line, self.column);

            let token = match ch {
                '(' => {
                    self.list_level += 1;
                    self.advance();
                    Some(Token::new("(", TokenKind::OpenParen, line, column))
                }
                ')' => {
                    self.list_level -= 1;
                    self.advance();
                    Some(Token::new(")", TokenKind::CloseParen, line, column))
                }
                '\'' => {
                    self.advance();
                    Some(Token::new("'", TokenKind::Apostrophe, line, column))
                }
                '"' => self.read_string(),
                '#' => self.read_hash(),
                ';' => Some(self.read_line_comment()),
                '.' if self.is_delimiter(self.pos + 1) => {
                    self.advance();
                    Some(Token::new(".", TokenKind::Dot, line, column))
                }
                '.' if self.is_digit_at(self.pos + 1) => self.read_number(),
                '.' => self.read_identifier(),
                '+' | '-' if self.is_delimiter(self.pos + 1) => {
                    self.advance();
                    Some(Token::new(ch, TokenKind::Identifier, line, column))
                }
                '+' | '-' => self.read_number(),
                c if c.is_ascii_digit() => self.read_number(),
                c if is_initial(c) => self.read_identifier(),
                c => {
                    self.error(line, column, format!("unexpected character {}", c));
                    self.advance();
                    None
                }
            };

            if token.is_some() {
                return token;
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    fn is_delimiter(&self, idx: usize) -> bool {
        match self.chars.get(idx) {
            None => true,
            Some(&ch) => ch.is_whitespace() || ch == '(' || ch == ')' || ch == ';',
        }
    }

    fn is_digit_at(&self, idx: usize) -> bool {
        self.chars.get(idx).map_or(false, char::is_ascii_digit)
    }

    fn at_delimiter(&self) -> bool {
        self.is_delimiter(self.pos)
    }

    /// Error recovery: drop the rest of a malformed lexeme.
    fn skip_to_delimiter(&mut self) {
        while !self.at_delimiter() {
            self.advance();
        }
    }

    fn error(&mut self, line: usize, column: usize, message: impl Into<String>) {
        let source_line = self.lines.get(line - 1).copied().unwrap_or("");
        let diagnostic = Diagnostic::lexical(line, column, source_line, message);
        debug!("lexical error: {}", diagnostic);
        self.errors.push(diagnostic);
    }

    fn error_here(&mut self, message: impl Into<String>) {
        self.error(self.line, self.column, message)
    }

    fn current_char(&self) -> String {
        self.peek().map(String::from).unwrap_or_default()
    }

    fn read_identifier(&mut self) -> Option<Token> {
        let (line, column) = (self.line, self.column);
        let mut lexeme = String::new();
        lexeme.extend(self.advance());
        while let Some(ch) = self.peek() {
            if !is_subsequent(ch) {
                break;
            }
            lexeme.push(ch);
            self.advance();
        }

        if !self.at_delimiter() {
            let got = self.current_char();
            self.error_here(format!(
                "expected delimiter after identifier name {}, got {}",
                lexeme, got
            ));
            self.skip_to_delimiter();
            return None;
        }

        let kind = keyword(&lexeme).unwrap_or(TokenKind::Identifier);
        Some(Token::new(lexeme, kind, line, column))
    }

    fn read_number(&mut self) -> Option<Token> {
        let (line, column) = (self.line, self.column);
        let mut lexeme = String::new();
        if let Some(sign @ '+') | Some(sign @ '-') = self.peek() {
            lexeme.push(sign);
            self.advance();
        }

        let mut seen_dot = false;
        let mut has_digits = false;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                has_digits = true;
            } else if ch == '.' {
                if seen_dot {
                    self.error_here(format!("multiple decimal points in number literal:{}", ch));
                    self.skip_to_delimiter();
                    return None;
                }
                seen_dot = true;
            } else {
                break;
            }
            lexeme.push(ch);
            self.advance();
        }

        if !self.at_delimiter() {
            let got = self.current_char();
            self.error_here(format!("invalid character in number literal:{}", got));
            self.skip_to_delimiter();
            return None;
        }

        if !has_digits {
            self.error(line, column, format!("invalid number literal {}", lexeme));
            return None;
        }

        Some(Token::new(lexeme, TokenKind::Number, line, column))
    }

    fn read_string(&mut self) -> Option<Token> {
        let (line, column) = (self.line, self.column);
        let mut lexeme = String::new();
        lexeme.extend(self.advance());
        while let Some(ch) = self.advance() {
            lexeme.push(ch);
            if ch == '"' {
                return Some(Token::new(lexeme, TokenKind::String, line, column));
            }
        }
        self.open_string = true;
        self.error(line, column, "unbalanced \" in string literal");
        None
    }

    fn read_hash(&mut self) -> Option<Token> {
        let (line, column) = (self.line, self.column);
        self.advance();
        match self.peek() {
            Some(ch @ 't') | Some(ch @ 'f') => {
                self.advance();
                if !self.at_delimiter() {
                    let got = self.current_char();
                    self.error_here(format!("expected delimiter after boolean #{}, got {}", ch, got));
                    self.skip_to_delimiter();
                    return None;
                }
                Some(Token::new(format!("#{}", ch), TokenKind::Boolean, line, column))
            }
            Some('\\') => {
                self.advance();
                self.read_character(line, column)
            }
            other => {
                let got = other.map(String::from).unwrap_or_default();
                self.error_here(format!("expected 't' or 'f' after #, got {}", got));
                self.skip_to_delimiter();
                None
            }
        }
    }

    fn read_character(&mut self, line: usize, column: usize) -> Option<Token> {
        let mut name = String::new();
        match self.advance() {
            Some(ch) => name.push(ch),
            None => {
                self.error(line, column, "missing character after #\\");
                return None;
            }
        }
        while !self.at_delimiter() {
            name.extend(self.advance());
        }

        if name.chars().count() > 1 && name != "space" && name != "newline" {
            self.error(line, column, format!("invalid character name {}", name));
            return None;
        }

        Some(Token::new(format!("#\\{}", name), TokenKind::Character, line, column))
    }

    fn read_line_comment(&mut self) -> Token {
        let (line, column) = (self.line, self.column);
        let mut lexeme = String::new();
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            lexeme.push(ch);
            self.advance();
        }
        Token::new(lexeme, TokenKind::Comment, line, column)
    }
}

fn is_initial(ch: char) -> bool {
    ch.is_alphabetic()
        || match ch {
            '!' | '$' | '%' | '&' | '*' | '/' | ':' | '<' | '=' | '>' | '?' | '^' | '_' | '~' => true,
            _ => false,
        }
}

fn is_subsequent(ch: char) -> bool {
    is_initial(ch) || ch.is_ascii_digit() || ch == '+' || ch == '-' || ch == '.'
}

/// Scan `source` into tokens, collecting all lexical errors into one error.
pub fn scan(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source)
        .scan()
        .map_err(|errors| ErrorKind::Lexical(errors).into())
}

/// True while an interactive reader should keep collecting lines, i.e. there
/// are unclosed parentheses or an unterminated string.
pub fn needs_more_input(source: &str) -> bool {
    let mut lexer = Lexer::new(source);
    while lexer.next_token().is_some() {}
    !lexer.is_balanced()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::token::TokenKind as K;

    fn tokens(src: &str) -> Vec<Token> {
        Lexer::new(src).scan().unwrap()
    }

    fn errors(src: &str) -> Vec<String> {
        Lexer::new(src)
            .scan()
            .unwrap_err()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn keywords() {
        assert_eq!(K::Else, tokens("   else  ")[0].kind);
        assert_eq!(K::Set, tokens("set!")[0].kind);
        assert_eq!(K::LetStar, tokens("let*")[0].kind);
        assert_eq!(K::ConsStream, tokens("cons-stream")[0].kind);
    }

    #[test]
    fn identifier() {
        let t = tokens("!abcDe23w-9+2.x");
        assert_eq!(K::Identifier, t[0].kind);
        assert_eq!("!abcDe23w-9+2.x", t[0].lexeme);

        assert_eq!(".abc", tokens(".abc")[0].lexeme);
        assert_eq!(K::Identifier, tokens(".abc")[0].kind);
        assert_eq!("abc.", tokens("abc.")[0].lexeme);
    }

    #[test]
    fn peculiar_identifiers() {
        assert_eq!(K::Identifier, tokens("+")[0].kind);
        assert_eq!(K::Identifier, tokens("(- 1)")[1].kind);
    }

    #[test]
    fn identifier_cannot_start_with_plus() {
        let e = errors("+abc");
        assert!(e[0].contains("invalid character in number literal:a"));
    }

    #[test]
    fn numbers() {
        for src in &["1", "1.2", ".1", "+123", "-1.", " .123 "] {
            let t = tokens(src);
            assert_eq!(K::Number, t[0].kind, "{}", src);
            assert_eq!(src.trim(), t[0].lexeme);
        }
    }

    #[test]
    fn number_with_multiple_dots() {
        let e = errors(".123.");
        assert!(e[0].contains("multiple decimal points"));
    }

    #[test]
    fn number_needs_delimiter() {
        let e = errors("(12a 3)");
        assert!(e[0].contains("invalid character in number literal:a"));
    }

    #[test]
    fn dot() {
        let t = tokens("(a . b)");
        assert_eq!(
            vec![K::OpenParen, K::Identifier, K::Dot, K::Identifier, K::CloseParen],
            t.iter().map(|t| t.kind).collect::<Vec<_>>()
        );
    }

    #[test]
    fn strings() {
        assert_eq!("\"abc\"", tokens("\"abc\"")[0].lexeme);
        let t = tokens("\"abc\ndef\"");
        assert_eq!(K::String, t[0].kind);
        assert_eq!("\"abc\ndef\"", t[0].lexeme);
        assert!(errors("\"abc")[0].contains("unbalanced \""));
    }

    #[test]
    fn booleans_and_characters() {
        assert_eq!(K::Boolean, tokens("#t")[0].kind);
        assert_eq!("#f", tokens("#f")[0].lexeme);
        assert!(errors("#abc")[0].contains("'t' or 'f'"));

        assert_eq!("#\\a", tokens("#\\a")[0].lexeme);
        assert_eq!(K::Character, tokens("#\\newline")[0].kind);
        assert_eq!("#\\(", tokens("#\\( ")[0].lexeme);
        assert!(errors("#\\ab12.a")[0].contains("invalid character name"));
    }

    #[test]
    fn parentheses_and_comments() {
        let t = tokens(" ();this is a comment\n x");
        assert_eq!(K::OpenParen, t[0].kind);
        assert_eq!(K::CloseParen, t[1].kind);
        assert_eq!(K::Comment, t[2].kind);
        assert_eq!(";this is a comment", t[2].lexeme);
        assert_eq!(K::Identifier, t[3].kind);
    }

    #[test]
    fn positions() {
        let t = tokens("(a\n  bc)");
        assert_eq!((1, 1), (t[0].line, t[0].column));
        assert_eq!((1, 2), (t[1].line, t[1].column));
        assert_eq!((2, 3), (t[2].line, t[2].column));
        assert_eq!((2, 5), (t[3].line, t[3].column));
    }

    #[test]
    fn error_contains_full_line() {
        let line = "abc\"errorhere ;some comment";
        let e = errors(line);
        assert!(e[0].contains(line));
        assert!(e[0].contains("line 1, column 4"));
    }

    #[test]
    fn reports_all_errors() {
        let e = errors("(1..2 x\n #q \"open");
        assert_eq!(3, e.len());
        assert!(e[1].starts_with("line 2"));
    }

    #[test]
    fn acceptance() {
        let program = "( + 9 .2 ) ( f #t #\\newline #\\t \n\"44string12.3\" -\n";
        let t = tokens(program);
        assert_eq!(
            vec![
                K::OpenParen, K::Identifier, K::Number, K::Number, K::CloseParen, K::OpenParen, K::Identifier,
                K::Boolean, K::Character, K::Character, K::String, K::Identifier
            ],
            t.iter().map(|t| t.kind).collect::<Vec<_>>()
        );
        assert_eq!(
            vec!["(", "+", "9", ".2", ")", "(", "f", "#t", "#\\newline", "#\\t", "\"44string12.3\"", "-"],
            t.iter().map(|t| t.lexeme.as_str()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn balance() {
        assert!(needs_more_input("(define (f x)"));
        assert!(needs_more_input("(display \"abc"));
        assert!(!needs_more_input("(f x)"));
        assert!(!needs_more_input("(f x))"));
    }
}
