use crate::completer::EnvHelper;
use crate::environment::EnvRef;
use crate::errors::Result;
use crate::lexer::needs_more_input;
use rustyline::Editor;

pub const PROMPT: &str = "-> ";
pub const CONTINUATION_PROMPT: &str = ".. ";

pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> Result<String>;

    /// Read lines until the parentheses balance and no string is left open.
    fn read_expression(&mut self) -> Result<String> {
        let mut source = self.read_line(PROMPT)?;
        while needs_more_input(&source) {
            source.push_str(&self.read_line(CONTINUATION_PROMPT)?);
        }
        Ok(source)
    }
}

pub struct ReplInput {
    rl: Editor<EnvHelper>,
}

impl ReplInput {
    /// Completion offers the names bound in `env`.
    pub fn new(env: EnvRef) -> Result<Self> {
        let mut rl = Editor::new()?;
        rl.set_helper(Some(EnvHelper::new(env)));
        Ok(ReplInput { rl })
    }
}

impl LineReader for ReplInput {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        let line = self.rl.readline(prompt)?;
        if !line.trim().is_empty() {
            self.rl.add_history_entry(line.as_str());
        }
        Ok(line + "\n")
    }
}
