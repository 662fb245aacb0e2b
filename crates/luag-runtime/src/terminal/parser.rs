//! Stateless command line tokenizer.
//!
//! # Example
//!
//! ```
//! use luag_runtime::terminal::CommandLine;
//!
//! let cmd = CommandLine::parse("  RUN   mygame ").expect("not blank");
//! assert_eq!(cmd.command, "run");
//! assert_eq!(cmd.args, vec!["mygame"]);
//!
//! assert!(CommandLine::parse("   ").is_none());
//! ```

/// A submitted line split into a command and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// First token, lowercased.
    pub command: String,
    /// Remaining tokens, verbatim.
    pub args: Vec<String>,
}

impl CommandLine {
    /// Splits `line` on spaces, collapsing runs of them.
    ///
    /// Returns `None` for a blank line.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split(' ').filter(|t| !t.is_empty());
        let command = tokens.next()?.to_lowercase();
        let args = tokens.map(str::to_string).collect();
        Some(Self { command, args })
    }

    /// Argument at `index`, if present.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}
