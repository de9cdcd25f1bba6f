/// Lexical grammar, a reduced version of R5RS 7.1.1:
///
/// ```text
/// token      -> keyword | identifier | number | string | boolean | character
///             | ( | ) | ' | . | comment
/// comment    -> ; all characters until line break
/// identifier -> initial subsequent* | + | -
/// initial    -> alpha | ! | $ | % | & | * | / | : | < | = | > | ? | ^ | _ | ~
/// subsequent -> initial | digit | + | - | .
/// number     -> sign? (digit* . digit+ | digit+ . digit* | digit+)
/// string     -> " any character except " "
/// character  -> #\ any character | #\newline | #\space
/// boolean    -> #t | #f
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // keywords
    Else,
    Define,
    Quote,
    Lambda,
    If,
    Set,
    Begin,
    Cond,
    And,
    Or,
    Case,
    Let,
    LetStar,
    Letrec,
    Delay,
    ConsStream,

    Identifier,

    // literals
    Number,
    String,
    Boolean,
    Character,

    // delimiters
    OpenParen,
    CloseParen,
    Apostrophe,
    Dot,

    Comment,
}

pub fn keyword(lexeme: &str) -> Option<TokenKind> {
    use TokenKind::*;
    Some(match lexeme {
        "else" => Else,
        "define" => Define,
        "quote" => Quote,
        "lambda" => Lambda,
        "if" => If,
        "set!" => Set,
        "begin" => Begin,
        "cond" => Cond,
        "and" => And,
        "or" => Or,
        "case" => Case,
        "let" => Let,
        "let*" => LetStar,
        "letrec" => Letrec,
        "delay" => Delay,
        "cons-stream" => ConsStream,
        _ => return None,
    })
}

impl TokenKind {
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        match self {
            Else | Define | Quote | Lambda | If | Set | Begin | Cond | And | Or | Case | Let
            | LetStar | Letrec | Delay | ConsStream => true,
            _ => false,
        }
    }

    /// Keywords and identifiers both read back as symbols inside quoted data.
    pub fn is_symbolic(self) -> bool {
        self == TokenKind::Identifier || self.is_keyword()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub lexeme: String,
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(lexeme: impl Into<String>, kind: TokenKind, line: usize, column: usize) -> Self {
        Token {
            lexeme: lexeme.into(),
            kind,
            line,
            column,
        }
    }

    /// A token that does not originate from source text, e.g. when data is
    /// turned back into code by `eval`.
    pub fn synthetic(lexeme: impl Into<String>, kind: TokenKind) -> Self {
        Token::new(lexeme, kind, 0, 0)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.lexeme)
    }
}
