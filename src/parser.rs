use crate::ast::{Expression, FormalParameters, SyntaxTree};
use crate::errors::*;
use crate::number::Number;
use crate::symbol::Symbol;
use crate::syntax::{
    make_and, make_begin, make_body, make_case, make_cond, make_cons_stream, make_delay, make_let,
    make_letrec, make_letstar, make_named_let, make_or, Binding, CaseClause, CondClause,
};
use crate::token::{keyword, Token, TokenKind};
use crate::value::Value;
use log::debug;

type ParseResult<T> = std::result::Result<T, Diagnostic>;

/// Recursive descent parser.
///
/// A malformed toplevel form is recorded as a diagnostic and skipped as a
/// whole, then parsing resumes with the next toplevel form. Only the first
/// error of each form is reported.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<Diagnostic>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens: tokens
                .into_iter()
                .filter(|t| t.kind != TokenKind::Comment)
                .collect(),
            pos: 0,
            errors: vec![],
        }
    }

    pub fn parse(&mut self) -> SyntaxTree {
        let mut tree = SyntaxTree::new();
        while self.pos < self.tokens.len() {
            let start = self.pos;
            match self.parse_form() {
                Ok(node) => tree.add(node),
                Err(diagnostic) => {
                    debug!("syntax error: {}", diagnostic);
                    self.errors.push(diagnostic);
                    self.synchronize(start);
                }
            }
        }
        tree
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Skip the toplevel form starting at `start`.
    fn synchronize(&mut self, start: usize) {
        self.pos = start;
        self.skip_datum();
        if self.pos == start {
            self.pos += 1;
        }
        debug!("parser resumes at token {}", self.pos);
    }

    fn skip_datum(&mut self) {
        match self.peek_kind() {
            Some(TokenKind::OpenParen) => {
                let mut depth = 0;
                while let Some(kind) = self.peek_kind() {
                    self.pos += 1;
                    match kind {
                        TokenKind::OpenParen => depth += 1,
                        TokenKind::CloseParen => depth -= 1,
                        _ => {}
                    }
                    if depth == 0 {
                        break;
                    }
                }
            }
            Some(TokenKind::Apostrophe) => {
                self.pos += 1;
                self.skip_datum();
            }
            Some(TokenKind::CloseParen) | None => {}
            Some(_) => self.pos += 1,
        }
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek_kind_at(0)
    }

    fn peek_kind_at(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| t.kind)
    }

    fn at_close(&self) -> bool {
        self.peek_kind() == Some(TokenKind::CloseParen)
    }

    fn at_definition(&self) -> bool {
        self.peek_kind() == Some(TokenKind::OpenParen)
            && self.peek_kind_at(1) == Some(TokenKind::Define)
    }

    fn next(&mut self) -> ParseResult<Token> {
        match self.tokens.get(self.pos) {
            Some(token) => {
                self.pos += 1;
                Ok(token.clone())
            }
            None => Err(self.eof_error("unexpected end of input")),
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> ParseResult<Token> {
        match self.tokens.get(self.pos) {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Ok(token.clone())
            }
            _ => Err(self.error_here(message)),
        }
    }

    fn expect_close(&mut self, form: &str) -> ParseResult<()> {
        self.expect(TokenKind::CloseParen, &format!("expected ) to close {}", form))
            .map(|_| ())
    }

    fn expect_identifier(&mut self, message: &str) -> ParseResult<(Symbol, Token)> {
        let token = self.expect(TokenKind::Identifier, message)?;
        Ok((Symbol::new(&token.lexeme), token))
    }

    fn eof_error(&self, message: &str) -> Diagnostic {
        let (line, column) = self
            .tokens
            .last()
            .map(|t| (t.line, t.column + t.lexeme.chars().count()))
            .unwrap_or((1, 1));
        Diagnostic::syntax(line, column, "end of input", message)
    }

    fn error_here(&self, message: impl Into<String>) -> Diagnostic {
        let message = message.into();
        match self.tokens.get(self.pos) {
            Some(token) => error(token, message),
            None => self.eof_error(&message),
        }
    }

    /// Toplevel and body positions accept definitions.
    fn parse_form(&mut self) -> ParseResult<Expression> {
        if self.at_definition() {
            self.parse_definition()
        } else {
            self.parse_expression()
        }
    }

    fn parse_expression(&mut self) -> ParseResult<Expression> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Number | TokenKind::Boolean | TokenKind::Character | TokenKind::String => {
                literal(&token)
            }
            TokenKind::Identifier => Ok(Expression::VariableReference(Symbol::new(&token.lexeme))),
            TokenKind::Apostrophe => self.parse_datum(),
            TokenKind::OpenParen => self.parse_compound(&token),
            kind if kind.is_keyword() => Err(error(
                &token,
                format!("keyword {} cannot be used as an expression", token.lexeme),
            )),
            _ => Err(error(&token, format!("unexpected {}", token.lexeme))),
        }
    }

    /// Parse expressions up to and including the closing parenthesis.
    fn parse_until_close(&mut self) -> ParseResult<Vec<Expression>> {
        let mut expressions = vec![];
        while !self.at_close() {
            expressions.push(self.parse_expression()?);
        }
        self.pos += 1;
        Ok(expressions)
    }

    fn parse_compound(&mut self, open: &Token) -> ParseResult<Expression> {
        let head = match self.tokens.get(self.pos) {
            Some(token) => token.clone(),
            None => return Err(self.eof_error("unexpected end of input")),
        };

        if head.kind.is_keyword() {
            self.pos += 1;
        }

        match head.kind {
            TokenKind::CloseParen => Err(error(open, "empty combination ()")),
            TokenKind::Quote => {
                let datum = self.parse_datum()?;
                self.expect_close("quote")?;
                Ok(datum)
            }
            TokenKind::Lambda => self.parse_lambda(),
            TokenKind::If => self.parse_if(&head),
            TokenKind::Set => {
                let (name, _) = self.expect_identifier("expected variable name after set!")?;
                let expr = self.parse_expression()?;
                self.expect_close("set!")?;
                Ok(Expression::assignment(name, expr))
            }
            TokenKind::Begin => {
                let sequence = self.parse_until_close()?;
                if sequence.is_empty() {
                    return Err(error(&head, "begin requires at least one expression"));
                }
                Ok(make_begin(sequence))
            }
            TokenKind::Cond => self.parse_cond(),
            TokenKind::Case => self.parse_case(),
            TokenKind::And => Ok(make_and(self.parse_until_close()?)),
            TokenKind::Or => Ok(make_or(self.parse_until_close()?)),
            TokenKind::Let => self.parse_let(),
            TokenKind::LetStar => {
                let bindings = self.parse_bindings(false)?;
                let body = self.parse_body("let*")?;
                Ok(make_letstar(bindings, body))
            }
            TokenKind::Letrec => {
                let bindings = self.parse_bindings(true)?;
                let body = self.parse_body("letrec")?;
                Ok(make_letrec(bindings, body))
            }
            TokenKind::Delay => {
                let expr = self.parse_expression()?;
                self.expect_close("delay")?;
                Ok(make_delay(expr))
            }
            TokenKind::ConsStream => {
                let head = self.parse_expression()?;
                let tail = self.parse_expression()?;
                self.expect_close("cons-stream")?;
                Ok(make_cons_stream(head, tail))
            }
            TokenKind::Define => Err(error(
                &head,
                "definitions are only allowed at toplevel or at the beginning of a body",
            )),
            TokenKind::Else => Err(error(&head, "else is only allowed in cond and case clauses")),
            _ => {
                let callee = self.parse_expression()?;
                let args = self.parse_until_close()?;
                Ok(Expression::call(callee, args))
            }
        }
    }

    /// `(define name expr)` or `(define (name formals...) body...)`
    fn parse_definition(&mut self) -> ParseResult<Expression> {
        // skip "(" and "define"
        self.pos += 2;
        let token = self.next()?;
        match token.kind {
            TokenKind::Identifier => {
                let name = Symbol::new(&token.lexeme);
                if self.at_close() {
                    return Err(self.error_here(format!("missing expression in definition of {}", name)));
                }
                let expr = self.parse_expression()?;
                self.expect_close("define")?;
                Ok(Expression::definition(name, expr))
            }
            TokenKind::OpenParen => {
                let (name, _) = self.expect_identifier("expected procedure name")?;
                let formals = self.parse_parameter_list()?;
                let body = self.parse_body("define")?;
                Ok(Expression::definition(name, Expression::lambda(formals, body)))
            }
            _ => Err(error(&token, "expected name or signature after define")),
        }
    }

    fn parse_lambda(&mut self) -> ParseResult<Expression> {
        let token = self.next()?;
        let formals = match token.kind {
            TokenKind::Identifier => FormalParameters::Rest(Symbol::new(&token.lexeme)),
            TokenKind::OpenParen => self.parse_parameter_list()?,
            _ => return Err(error(&token, "expected formal parameters")),
        };
        let body = self.parse_body("lambda")?;
        Ok(Expression::lambda(formals, body))
    }

    /// Parameter names up to the closing parenthesis; the opening one is
    /// already consumed. `. rest` is only accepted as the sole parameter.
    fn parse_parameter_list(&mut self) -> ParseResult<FormalParameters> {
        let mut names: Vec<Symbol> = vec![];
        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::CloseParen => return Ok(FormalParameters::Fixed(names)),
                TokenKind::Identifier => {
                    let name = Symbol::new(&token.lexeme);
                    if names.contains(&name) {
                        return Err(error(&token, format!("duplicate parameter {}", name)));
                    }
                    names.push(name);
                }
                TokenKind::Dot if names.is_empty() => {
                    let (rest, _) = self.expect_identifier("expected rest parameter name after .")?;
                    self.expect_close("parameter list")?;
                    return Ok(FormalParameters::Rest(rest));
                }
                TokenKind::Dot => {
                    return Err(error(
                        &token,
                        "mixing fixed and rest parameters is not supported",
                    ))
                }
                _ => return Err(error(&token, "expected parameter name")),
            }
        }
    }

    /// Leading definitions followed by at least one expression, up to and
    /// including the closing parenthesis.
    fn parse_body(&mut self, form: &str) -> ParseResult<Vec<Expression>> {
        let mut body = vec![];
        while self.at_definition() {
            body.push(self.parse_definition()?);
        }
        let n_definitions = body.len();
        while !self.at_close() {
            body.push(self.parse_expression()?);
        }
        if body.len() == n_definitions {
            return Err(self.error_here(format!("{} body requires at least one expression", form)));
        }
        self.pos += 1;
        Ok(make_body(body))
    }

    fn parse_if(&mut self, if_token: &Token) -> ParseResult<Expression> {
        let missing = "if requires a test and a consequent";
        if self.at_close() {
            return Err(error(if_token, missing));
        }
        let test = self.parse_expression()?;
        if self.at_close() {
            return Err(error(if_token, missing));
        }
        let consequent = self.parse_expression()?;
        let alternate = if self.at_close() {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        if !self.at_close() {
            return Err(self.error_here("too many expressions in if"));
        }
        self.pos += 1;
        Ok(Expression::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate,
        })
    }

    fn parse_cond(&mut self) -> ParseResult<Expression> {
        let mut clauses = vec![];
        while !self.at_close() {
            self.expect(TokenKind::OpenParen, "expected cond clause")?;
            if self.peek_kind() == Some(TokenKind::Else) {
                let sequence = self.parse_else_clause()?;
                clauses.push(CondClause::otherwise(sequence));
            } else {
                let test = self.parse_expression()?;
                let sequence = self.parse_until_close()?;
                clauses.push(CondClause::new(test, sequence));
            }
        }
        self.pos += 1;
        Ok(make_cond(clauses))
    }

    /// The `else` clause of `cond` or `case`, which must be the last one.
    fn parse_else_clause(&mut self) -> ParseResult<Vec<Expression>> {
        let else_token = self.next()?;
        let sequence = self.parse_until_close()?;
        if sequence.is_empty() {
            return Err(error(&else_token, "else clause requires at least one expression"));
        }
        if self.peek_kind().is_some() && !self.at_close() {
            return Err(error(&else_token, "else clause must be the last clause"));
        }
        Ok(sequence)
    }

    fn parse_case(&mut self) -> ParseResult<Expression> {
        let key = self.parse_expression()?;
        let mut clauses = vec![];
        while !self.at_close() {
            self.expect(TokenKind::OpenParen, "expected case clause")?;
            if self.peek_kind() == Some(TokenKind::Else) {
                let sequence = self.parse_else_clause()?;
                clauses.push(CaseClause {
                    data: None,
                    sequence,
                });
                continue;
            }

            let open = self.expect(TokenKind::OpenParen, "expected list of data in case clause")?;
            let mut data = vec![];
            while !self.at_close() {
                data.push(self.parse_datum()?);
            }
            self.pos += 1;
            let sequence = self.parse_until_close()?;
            if sequence.is_empty() {
                return Err(error(&open, "case clause requires at least one expression"));
            }
            clauses.push(CaseClause {
                data: Some(data),
                sequence,
            });
        }
        self.pos += 1;
        Ok(make_case(key, clauses))
    }

    fn parse_let(&mut self) -> ParseResult<Expression> {
        if self.peek_kind() == Some(TokenKind::Identifier) {
            let (name, _) = self.expect_identifier("expected name")?;
            let bindings = self.parse_bindings(true)?;
            let body = self.parse_body("let")?;
            return Ok(make_named_let(name, bindings, body));
        }
        let bindings = self.parse_bindings(true)?;
        let body = self.parse_body("let")?;
        Ok(make_let(bindings, body))
    }

    /// `((name init) ...)`
    fn parse_bindings(&mut self, unique: bool) -> ParseResult<Vec<Binding>> {
        self.expect(TokenKind::OpenParen, "expected binding list")?;
        let mut bindings: Vec<Binding> = vec![];
        while !self.at_close() {
            self.expect(TokenKind::OpenParen, "expected binding")?;
            let (name, token) = self.expect_identifier("expected variable name in binding")?;
            if unique && bindings.iter().any(|(bound, _)| *bound == name) {
                return Err(error(&token, format!("duplicate binding {}", name)));
            }
            let init = self.parse_expression()?;
            self.expect_close("binding")?;
            bindings.push((name, init));
        }
        self.pos += 1;
        Ok(bindings)
    }

    /// Quoted data: identifiers and keywords become symbols, lists become
    /// quoted lists.
    fn parse_datum(&mut self) -> ParseResult<Expression> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Number | TokenKind::Boolean | TokenKind::Character | TokenKind::String => {
                literal(&token)
            }
            TokenKind::Apostrophe => Ok(Expression::QuotedList {
                elements: vec![Expression::Symbol(Symbol::new("quote")), self.parse_datum()?],
                tail: None,
            }),
            TokenKind::OpenParen => {
                let mut elements = vec![];
                let mut tail = None;
                while !self.at_close() {
                    if self.peek_kind() == Some(TokenKind::Dot) {
                        let dot = self.next()?;
                        if elements.is_empty() {
                            return Err(error(&dot, "expected datum before ."));
                        }
                        tail = Some(Box::new(self.parse_datum()?));
                        if !self.at_close() {
                            return Err(self.error_here("expected ) after dotted tail"));
                        }
                    } else {
                        elements.push(self.parse_datum()?);
                    }
                }
                self.pos += 1;
                Ok(Expression::QuotedList { elements, tail })
            }
            kind if kind.is_symbolic() => Ok(Expression::Symbol(Symbol::new(&token.lexeme))),
            _ => Err(error(&token, format!("unexpected {} in quoted datum", token.lexeme))),
        }
    }
}

fn error(token: &Token, message: impl Into<String>) -> Diagnostic {
    Diagnostic::syntax(token.line, token.column, token.lexeme.clone(), message)
}

fn literal(token: &Token) -> ParseResult<Expression> {
    let lexeme = token.lexeme.as_str();
    match token.kind {
        TokenKind::Number => Number::from_lexeme(lexeme)
            .map(Expression::Number)
            .ok_or_else(|| error(token, format!("invalid number literal {}", lexeme))),
        TokenKind::Boolean => Ok(Expression::Bool(lexeme == "#t")),
        TokenKind::Character => match &lexeme[2..] {
            "space" => Ok(Expression::Char(' ')),
            "newline" => Ok(Expression::Char('\n')),
            name => name
                .chars()
                .next()
                .map(Expression::Char)
                .ok_or_else(|| error(token, "missing character")),
        },
        TokenKind::String => Ok(Expression::String(lexeme[1..lexeme.len() - 1].to_string())),
        _ => Err(error(token, "expected literal")),
    }
}

/// Parse tokens into a syntax tree, collecting all syntax errors into one error.
pub fn parse(tokens: Vec<Token>) -> Result<SyntaxTree> {
    let mut parser = Parser::new(tokens);
    let tree = parser.parse();
    if parser.has_errors() {
        Err(ErrorKind::Syntax(parser.errors).into())
    } else {
        Ok(tree)
    }
}

/// Append the tokens that read back as `datum`.
pub fn datum_to_tokens(datum: &Value, tokens: &mut Vec<Token>) -> Result<()> {
    match datum {
        Value::Number(n) => tokens.push(Token::synthetic(n.to_string(), TokenKind::Number)),
        Value::Bool(true) => tokens.push(Token::synthetic("#t", TokenKind::Boolean)),
        Value::Bool(false) => tokens.push(Token::synthetic("#f", TokenKind::Boolean)),
        Value::Char(' ') => tokens.push(Token::synthetic("#\\space", TokenKind::Character)),
        Value::Char('\n') => tokens.push(Token::synthetic("#\\newline", TokenKind::Character)),
        Value::Char(c) => tokens.push(Token::synthetic(format!("#\\{}", c), TokenKind::Character)),
        Value::String(s) => tokens.push(Token::synthetic(
            format!("\"{}\"", s.borrow()),
            TokenKind::String,
        )),
        Value::Symbol(s) => {
            let kind = keyword(s.name()).unwrap_or(TokenKind::Identifier);
            tokens.push(Token::synthetic(s.name(), kind));
        }
        Value::Nil => {
            tokens.push(Token::synthetic("(", TokenKind::OpenParen));
            tokens.push(Token::synthetic(")", TokenKind::CloseParen));
        }
        Value::Pair(_) => {
            tokens.push(Token::synthetic("(", TokenKind::OpenParen));
            let mut cursor = datum.clone();
            loop {
                match cursor {
                    Value::Pair(pair) => {
                        datum_to_tokens(&pair.car(), tokens)?;
                        cursor = pair.cdr();
                    }
                    Value::Nil => break,
                    tail => {
                        tokens.push(Token::synthetic(".", TokenKind::Dot));
                        datum_to_tokens(&tail, tokens)?;
                        break;
                    }
                }
            }
            tokens.push(Token::synthetic(")", TokenKind::CloseParen));
        }
        _ => return Err(ErrorKind::TypeError(datum.to_string()).into()),
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexer::scan;

    fn parse_str(src: &str) -> Vec<String> {
        parse(scan(src).unwrap())
            .unwrap()
            .nodes
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn errors(src: &str) -> Vec<String> {
        let mut parser = Parser::new(scan(src).unwrap());
        parser.parse();
        parser.errors().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn literals() {
        assert_eq!(
            vec!["42", "-1.5", "#t", "#\\a", "#\\space", "\"text\""],
            parse_str("42 -1.5 #t #\\a #\\space \"text\"")
        );
    }

    #[test]
    fn quotes() {
        assert_eq!(vec!["'a"], parse_str("'a"));
        assert_eq!(vec!["'a"], parse_str("(quote a)"));
        assert_eq!(vec!["'(quote a)"], parse_str("''a"));
        assert_eq!(vec!["'(1 (if b) . 2)"], parse_str("'(1 (if b) . 2)"));
        assert_eq!(vec!["'()"], parse_str("'()"));
    }

    #[test]
    fn definitions() {
        assert_eq!(vec!["(define x 1)"], parse_str("(define x 1)"));
        assert_eq!(
            vec!["(define f (lambda (x y) (+ x y)))"],
            parse_str("(define (f x y) (+ x y))")
        );
        assert_eq!(
            vec!["(define f (lambda args args))"],
            parse_str("(define (f . args) args)")
        );
    }

    #[test]
    fn conditionals() {
        assert_eq!(vec!["(if a b)", "(if a b c)"], parse_str("(if a b) (if a b c)"));
    }

    #[test]
    fn comments_are_ignored() {
        assert_eq!(vec!["(f 1)"], parse_str("; leading\n(f ; inner\n 1)"));
    }

    #[test]
    fn error_format() {
        assert_eq!(
            vec!["parse error at 4, line 1, column 11: too many expressions in if"],
            errors("(if 1 2 3 4)")
        );
    }

    #[test]
    fn recovers_at_next_toplevel_form() {
        let mut parser = Parser::new(scan("(if 1 2 3 4) (define) (+ 1 2) (lambda (x))").unwrap());
        let tree = parser.parse();
        assert_eq!(3, parser.errors().len());
        assert_eq!(1, tree.nodes.len());
        assert_eq!("(+ 1 2)", tree.nodes[0].to_string());
    }

    #[test]
    fn malformed_forms() {
        assert!(errors("()")[0].contains("empty combination"));
        assert!(errors("(lambda (x))")[0].contains("lambda body requires at least one expression"));
        assert!(errors("(lambda (x) (define y 1))")[0].contains("at least one expression"));
        assert!(errors("(lambda (x x) x)")[0].contains("duplicate parameter x"));
        assert!(errors("(lambda (a . b) a)")[0].contains("mixing fixed and rest"));
        assert!(errors("(let ((a 1) (a 2)) a)")[0].contains("duplicate binding a"));
        assert!(errors("(cond (else 1) (#t 2))")[0].contains("else clause must be the last"));
        assert!(errors("(+ 1 (define x 2))")[0].contains("definitions are only allowed"));
        assert!(errors("(if)")[0].contains("if requires a test"));
        assert!(errors("(f 1")[0].contains("end of input"));
        assert!(errors(")")[0].contains("unexpected )"));
        assert!(errors("'(. 1)")[0].contains("expected datum before ."));
    }

    #[test]
    fn define_after_expression_in_body_is_rejected() {
        assert!(errors("(lambda () 1 (define x 2) x)")[0].contains("definitions are only allowed"));
    }

    #[test]
    fn derived_forms_are_lowered() {
        assert_eq!(vec!["((lambda (x) x) 1)"], parse_str("(let ((x 1)) x)"));
        assert_eq!(vec!["((lambda () 1 2))"], parse_str("(begin 1 2)"));
        assert_eq!(vec!["#t"], parse_str("(and)"));
        assert_eq!(
            vec!["(cons 1 (make-promise (lambda () 2)))"],
            parse_str("(cons-stream 1 2)")
        );
    }
}
