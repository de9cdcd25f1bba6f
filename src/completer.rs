use crate::environment::EnvRef;
use crate::lexer::Lexer;
use rustyline::{
    self, completion::Completer, highlight::Highlighter, hint::Hinter, validate::Validator,
    Context, Helper,
};

/// Tab completion of the names bound in an environment.
pub struct EnvHelper(EnvRef);

impl EnvHelper {
    pub fn new(env: EnvRef) -> Self {
        EnvHelper(env)
    }

    /// Names starting with the identifier that ends at `pos`, and the byte
    /// offset where that identifier starts.
    pub fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<String>) {
        let before = match line.get(..pos) {
            Some(s) => s,
            None => return (pos, vec![]),
        };

        let mut lexer = Lexer::new(before);
        let mut last = None;
        while let Some(token) = lexer.next_token() {
            last = Some(token);
        }

        let prefix = match last {
            Some(token) if token.kind.is_symbolic() && before.ends_with(&token.lexeme) => {
                token.lexeme
            }
            _ => return (pos, vec![]),
        };

        let mut candidates: Vec<String> = self
            .0
            .all_keys()
            .iter()
            .map(|key| key.name())
            .filter(|name| name.starts_with(prefix.as_str()))
            .map(str::to_string)
            .collect();
        candidates.sort();

        (pos - prefix.len(), candidates)
    }
}

impl Helper for EnvHelper {}

impl Hinter for EnvHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context) -> Option<String> {
        None
    }
}

impl Completer for EnvHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        Ok(self.candidates(line, pos))
    }
}

impl Highlighter for EnvHelper {}

impl Validator for EnvHelper {}
