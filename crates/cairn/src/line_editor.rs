use std::path::{Path, PathBuf};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use cairn_core::CairnError;
use cairn_reader::CharSource;

const CONTINUATION_PROMPT: &str = "  ... ";
const HISTORY_FILE: &str = ".cairn_history";

/// History file used when none is given: `$CAIRN_HISTORY` if set, else
/// `.cairn_history` under the user's home directory, else in the working
/// directory.
pub fn default_history_path() -> PathBuf {
    if let Some(path) = std::env::var_os("CAIRN_HISTORY") {
        return PathBuf::from(path);
    }
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(HISTORY_FILE)
}

fn editor_error(err: ReadlineError) -> CairnError {
    match err {
        ReadlineError::Interrupted => CairnError::Interrupted,
        ReadlineError::Io(e) => e.into(),
        other => CairnError::Io(other.to_string()),
    }
}

/// Interactive character source backed by a rustyline editor.
///
/// Lines are fetched on demand; each one is followed by a `'\n'` so that a
/// line end delimits the last word on it.
pub struct LineEditorSource {
    editor: DefaultEditor,
    prompt: String,
    line: String,
    pos: usize,
    pending: Option<char>,
    fresh: bool,
    history: Option<PathBuf>,
}

impl LineEditorSource {
    pub fn new(prompt: impl Into<String>) -> Result<Self, CairnError> {
        let editor = DefaultEditor::new().map_err(editor_error)?;
        Ok(Self {
            editor,
            prompt: prompt.into(),
            line: String::new(),
            pos: 0,
            pending: None,
            fresh: true,
            history: None,
        })
    }

    /// Load history from `path` and save back to it on [`Self::save_history`].
    pub fn with_history(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        if let Err(e) = self.editor.load_history(&path) {
            tracing::debug!(path = %path.display(), error = %e, "no history loaded");
        }
        self.history = Some(path);
        self
    }

    /// The next line read starts a new expression and shows the main prompt.
    pub fn start_expression(&mut self) {
        self.fresh = true;
    }

    /// Drop the rest of the current line, e.g. after a read error.
    pub fn discard_line(&mut self) {
        self.line.clear();
        self.pos = 0;
        self.pending = None;
        self.fresh = true;
    }

    pub fn save_history(&mut self) -> Result<(), CairnError> {
        let Some(path) = &self.history else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        self.editor.save_history(path).map_err(editor_error)
    }

    fn fetch_line(&mut self) -> Result<bool, CairnError> {
        let prompt = if self.fresh {
            self.prompt.as_str()
        } else {
            CONTINUATION_PROMPT
        };
        let line = match self.editor.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Eof) => return Ok(false),
            Err(e) => return Err(editor_error(e)),
        };
        self.fresh = false;
        if !line.trim().is_empty() {
            let _ = self.editor.add_history_entry(line.as_str());
        }
        self.line = line;
        self.line.push('\n');
        self.pos = 0;
        Ok(true)
    }
}

impl CharSource for LineEditorSource {
    fn next_char(&mut self) -> Result<Option<char>, CairnError> {
        if let Some(c) = self.pending.take() {
            return Ok(Some(c));
        }
        while self.pos >= self.line.len() {
            if !self.fetch_line()? {
                return Ok(None);
            }
        }
        let c = self.line[self.pos..].chars().next();
        if let Some(c) = c {
            self.pos += c.len_utf8();
        }
        Ok(c)
    }

    fn unread(&mut self, c: char) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(c);
        true
    }
}
