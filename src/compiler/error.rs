use std::fmt;

use crate::common::span::Span;

/// Represents a note attached to an error,
/// i.e. a location in source code with an optional
/// specific hint or tip corresponding this this specific location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub span: Span,
    pub hint: Option<String>,
}

impl Note {
    pub fn new(span: Span) -> Note {
        Note { span, hint: None }
    }

    pub fn new_with_hint(hint: &str, span: &Span) -> Note {
        Note {
            span: span.clone(),
            hint: Some(hint.to_string()),
        }
    }
}

/// Why the lexer gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizingError {
    /// A lone `&` or `|`.
    UnpairedOperator,
    /// A string or character literal without its closing quote.
    UnterminatedLiteral,
    /// A character outside of the language's alphabet.
    UnrecognizedCharacter,
}

/// Which stage of the pipeline (or of the executor boundary)
/// an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Tokenizing(TokenizingError),
    Parsing,
    Generation,
    /// Reserved for the executor: undefined function lookup.
    Name,
    /// Reserved for the executor: e.g. popping an empty stack,
    /// or loading malformed bytecode.
    Runtime,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Tokenizing(_) => "Tokenizing Error",
            ErrorKind::Parsing => "Parsing Error",
            ErrorKind::Generation => "Bytecode Generation Error",
            ErrorKind::Name => "Name Error",
            ErrorKind::Runtime => "Runtime Error",
        };

        write!(f, "{}", name)
    }
}

impl From<TokenizingError> for ErrorKind {
    fn from(error: TokenizingError) -> Self {
        ErrorKind::Tokenizing(error)
    }
}

/// Represents a static error found at compile time.
/// Ideally, each note included should have a distinct `Span` and hint.
/// Usually, one `Note` per error is enough.
/// Errors raised while generating bytecode carry no notes,
/// as the syntax tree does not keep source positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub reason: String,
    pub notes: Vec<Note>,
}

impl Error {
    /// Creates a new error with a single note that does not have a hint.
    pub fn error(kind: ErrorKind, reason: &str, span: &Span) -> Error {
        Error::error_with_note(kind, reason, Note::new(span.clone()))
    }

    /// Creates a new error with a single note that may or may not have a
    /// hint.
    pub fn error_with_note(kind: ErrorKind, reason: &str, note: Note) -> Error {
        Error {
            kind,
            reason: reason.to_string(),
            notes: vec![note],
        }
    }

    /// Creates an error without a note. This error will not
    /// contain any location information, so only use it if the
    /// location is unknown or you plan to add notes with
    /// [`Error::add_note`] later.
    pub fn error_no_note(kind: ErrorKind, reason: &str) -> Error {
        Error {
            kind,
            reason: reason.to_string(),
            notes: vec![],
        }
    }

    pub fn tokenizing(error: TokenizingError, reason: &str, span: &Span) -> Error {
        Error::error(ErrorKind::Tokenizing(error), reason, span)
    }

    pub fn parsing(reason: &str, span: &Span) -> Error {
        Error::error(ErrorKind::Parsing, reason, span)
    }

    pub fn generation(reason: &str) -> Error {
        Error::error_no_note(ErrorKind::Generation, reason)
    }

    pub fn runtime(reason: &str) -> Error {
        Error::error_no_note(ErrorKind::Runtime, reason)
    }

    /// Extend an error by adding another note to the error.
    pub fn add_note(mut self, note: Note) -> Self {
        self.notes.push(note);
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for note in self.notes.iter() {
            let formatted = note.span.format();

            match (&note.hint, formatted.carrots()) {
                (Some(hint), Some(carrots)) => {
                    let gutter = " ".repeat(formatted.gutter_padding());
                    writeln!(
                        f,
                        "In {}:{}:{}",
                        formatted.path,
                        formatted.start + 1,
                        formatted.start_col + 1
                    )?;
                    writeln!(f, "{} |", gutter)?;
                    writeln!(f, "{} | {}", formatted.start + 1, formatted.lines[0])?;
                    writeln!(
                        f,
                        "{} | {}{} note: {}",
                        gutter,
                        " ".repeat(formatted.start_col),
                        "^".repeat(carrots),
                        hint,
                    )?;
                    writeln!(f, "{} |", gutter)?;
                },
                (Some(hint), None) => {
                    write!(f, "{}", formatted)?;
                    writeln!(f, "{} |- note: {}", " ".repeat(formatted.gutter_padding()), hint)?;
                },
                (None, _) => write!(f, "{}", formatted)?,
            }
        }
        write!(f, "{}: {}", self.kind, self.reason)
    }
}

impl std::error::Error for Error {}
