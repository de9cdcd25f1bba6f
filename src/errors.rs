use crate::symbol::Symbol;
use rustyline::error::ReadlineError;

pub type Result<T> = std::result::Result<T, Error>;

/// Which front-end stage produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lexer,
    Parser,
}

/// A positioned lexical or syntax error.
///
/// For lexer diagnostics `snippet` holds the complete source line the error
/// occurred on, for parser diagnostics it holds the offending lexeme.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub stage: Stage,
    pub line: usize,
    pub column: usize,
    pub snippet: String,
    pub message: String,
}

impl Diagnostic {
    pub fn lexical(
        line: usize,
        column: usize,
        source_line: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            stage: Stage::Lexer,
            line,
            column,
            snippet: source_line.into(),
            message: message.into(),
        }
    }

    pub fn syntax(
        line: usize,
        column: usize,
        lexeme: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Diagnostic {
            stage: Stage::Parser,
            line,
            column,
            snippet: lexeme.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.stage {
            Stage::Lexer => write!(
                f,
                "line {}, column {}: {}\n{}",
                self.line, self.column, self.snippet, self.message
            ),
            Stage::Parser => write!(
                f,
                "parse error at {}, line {}, column {}: {}",
                self.snippet, self.line, self.column, self.message
            ),
        }
    }
}

#[derive(Debug)]
pub enum ErrorKind {
    Lexical(Vec<Diagnostic>),
    Syntax(Vec<Diagnostic>),

    Unbound(Symbol),
    Unassigned(Symbol),
    NotBound(Symbol),
    NotAProcedure(String),
    ArityMismatch { expected: usize, given: usize },
    TypeError(String),
    DivisionByZero,
    TooFewArguments { name: String, min: usize },
    IntegerOverflow,
    RecursionDepthExceeded(usize),
    GenericError(String),

    IoError(std::io::Error),
    ReadlineError(ReadlineError),
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn write_diagnostics(f: &mut std::fmt::Formatter, diagnostics: &[Diagnostic]) -> std::fmt::Result {
    for (i, d) in diagnostics.iter().enumerate() {
        if i > 0 {
            writeln!(f)?;
        }
        write!(f, "{}", d)?;
    }
    Ok(())
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use ErrorKind::*;
        match self {
            Lexical(diagnostics) | Syntax(diagnostics) => write_diagnostics(f, diagnostics),
            Unbound(name) => write!(f, "variable {} not found", name),
            Unassigned(name) => write!(f, "variable {} Unassigned", name),
            NotBound(name) => write!(f, "variable {} not bound", name),
            NotAProcedure(repr) => write!(f, "{} is not a procedure", repr),
            ArityMismatch { expected, given } => write!(
                f,
                "procedure expects {} argument{}, {} given",
                expected,
                plural(*expected),
                given
            ),
            TypeError(repr) => write!(f, "argument {} is of incorrect type", repr),
            DivisionByZero => write!(f, "division by zero"),
            TooFewArguments { name, min } => write!(
                f,
                "{} requires at least {} argument{}",
                name,
                min,
                plural(*min)
            ),
            IntegerOverflow => write!(f, "integer overflow"),
            RecursionDepthExceeded(limit) => {
                write!(f, "maximum recursion depth ({}) exceeded", limit)
            }
            GenericError(msg) => write!(f, "{}", msg),
            IoError(e) => write!(f, "IO Error: {}", e),
            ReadlineError(e) => write!(f, "Readline Error: {}", e),
        }
    }
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Error { kind }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// True for errors raised while evaluating, as opposed to scanning or parsing.
    pub fn is_runtime(&self) -> bool {
        match self.kind {
            ErrorKind::Lexical(_)
            | ErrorKind::Syntax(_)
            | ErrorKind::IoError(_)
            | ErrorKind::ReadlineError(_) => false,
            _ => true,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl From<std::io::Error> for Error {
    fn from(ioe: std::io::Error) -> Self {
        Error::new(ErrorKind::IoError(ioe))
    }
}

impl From<ReadlineError> for Error {
    fn from(rle: ReadlineError) -> Self {
        Error::new(ErrorKind::ReadlineError(rle))
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::new(ErrorKind::GenericError(msg))
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        msg.to_string().into()
    }
}
