//! Orchestration of a single conversion run.

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::termcolor::{BufferedStandardStream, ColorChoice, WriteColor};
use roxmltree::Document;
use std::cell::RefCell;
use std::io::{BufWriter, Read, Write};
use std::ops::Range;
use std::path::Path;

use crate::convert::Context;
use crate::emit;
use crate::{FileId, BUG_REPORT_URL};

#[derive(Debug, Copy, Clone)]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Error => 1,
        }
    }
}

pub struct Driver {
    files: SimpleFiles<String, String>,

    seen_errors: RefCell<bool>,
    codespan_config: codespan_reporting::term::Config,
    diagnostic_writer: RefCell<Box<dyn WriteColor>>,

    emit_writer: RefCell<Box<dyn Write>>,
}

impl Driver {
    pub fn new() -> Driver {
        Driver {
            files: SimpleFiles::new(),

            seen_errors: RefCell::new(false),
            codespan_config: codespan_reporting::term::Config::default(),
            diagnostic_writer: RefCell::new(Box::new(BufferedStandardStream::stderr(
                stderr_color_choice(),
            ))),

            emit_writer: RefCell::new(Box::new(BufWriter::new(std::io::stdout()))),
        }
    }

    /// Setup a global panic hook
    pub fn install_panic_hook(&self) {
        // Use the currently set codespan configuration
        let term_config = self.codespan_config.clone();
        // Fetch the default hook (which prints the panic message and an optional backtrace)
        let default_hook = std::panic::take_hook();

        std::panic::set_hook(Box::new(move |info| {
            let location = info.location();
            let message = if let Some(message) = info.payload().downcast_ref::<String>() {
                message.as_str()
            } else if let Some(message) = info.payload().downcast_ref::<&str>() {
                message
            } else {
                "unknown panic type"
            };

            let diagnostic = Diagnostic::bug()
                .with_message(format!("converter panicked at '{message}'"))
                .with_notes(vec![
                    match location {
                        Some(location) => format!("panicked at: {location}"),
                        None => "panicked at: unknown location".to_owned(),
                    },
                    format!("please file a bug report at: {BUG_REPORT_URL}"),
                ]);

            let mut writer = BufferedStandardStream::stderr(stderr_color_choice());
            let dummy_files = SimpleFiles::<String, String>::new();

            default_hook(info);
            eprintln!();
            codespan_reporting::term::emit(&mut writer, &term_config, &dummy_files, &diagnostic)
                .unwrap();
        }));
    }

    /// Set the writer to use when rendering diagnostics
    pub fn set_diagnostic_writer(&mut self, stream: impl 'static + WriteColor) {
        self.diagnostic_writer = RefCell::new(Box::new(stream) as Box<dyn WriteColor>);
    }

    /// Set the writer to use when emitting the converted definitions
    pub fn set_emit_writer(&mut self, stream: impl 'static + Write) {
        self.emit_writer = RefCell::new(Box::new(stream) as Box<dyn Write>);
    }

    /// Open `path` for writing and use it as the emit destination.
    pub fn set_emit_path(&mut self, path: &Path) -> Option<()> {
        match std::fs::File::create(path) {
            Ok(file) => {
                self.emit_writer = RefCell::new(Box::new(BufWriter::new(file)));
                Some(())
            }
            Err(error) => {
                self.emit_diagnostic(Diagnostic::error().with_message(format!(
                    "couldn't open `{}` for writing: {error}",
                    path.display(),
                )));
                None
            }
        }
    }

    /// Load a source string into the file database.
    pub fn load_source_string(&mut self, name: String, source: String) -> FileId {
        self.files.add(name, source)
    }

    /// Load a source file into the file database using a reader.
    pub fn load_source(&mut self, name: String, mut reader: impl Read) -> Option<FileId> {
        let mut source = String::new();
        match reader.read_to_string(&mut source) {
            Ok(_) => Some(self.load_source_string(name, source)),
            Err(error) => {
                self.emit_read_diagnostic(name, error);
                None
            }
        }
    }

    /// Load a source file into the file database from the given path.
    pub fn load_source_path(&mut self, path: &Path) -> Option<FileId> {
        match std::fs::File::open(path) {
            Ok(file) => self.load_source(path.display().to_string(), file),
            Err(error) => {
                self.emit_read_diagnostic(path.display(), error);
                None
            }
        }
    }

    /// Parse the loaded plugin XML, convert it, and emit the result.
    pub fn convert_and_emit(&mut self, file_id: FileId) -> Status {
        let source = self.files.get(file_id).unwrap().source();

        let document = match Document::parse(source) {
            Ok(document) => document,
            Err(error) => {
                let range = position_bytes(source, error.pos());
                self.emit_diagnostic(
                    Diagnostic::error()
                        .with_message(format!("couldn't parse input xml: {error}"))
                        .with_labels(vec![Label::primary(file_id, range)]),
                );
                return Status::Error;
            }
        };

        let context = Context::new(file_id);
        let module = context.convert_document(&document, &mut |message| {
            self.emit_diagnostic(message.to_diagnostic());
        });

        // Return early if we’ve seen any errors
        if *self.seen_errors.borrow() {
            return Status::Error;
        }

        let result = {
            let mut emit_writer = self.emit_writer.borrow_mut();
            emit::emit_module(&mut *emit_writer, &module).and_then(|()| emit_writer.flush())
        };
        match result {
            Ok(()) => Status::Ok,
            Err(error) => {
                self.emit_diagnostic(
                    Diagnostic::error().with_message(format!("couldn't write output: {error}")),
                );
                Status::Error
            }
        }
    }

    fn emit_diagnostic(&self, diagnostic: Diagnostic<FileId>) {
        let mut writer = self.diagnostic_writer.borrow_mut();
        let config = &self.codespan_config;

        codespan_reporting::term::emit(&mut *writer, config, &self.files, &diagnostic).unwrap();
        writer.flush().unwrap();

        if diagnostic.severity >= Severity::Error {
            *self.seen_errors.borrow_mut() = true;
        }
    }

    fn emit_read_diagnostic(&self, name: impl std::fmt::Display, error: std::io::Error) {
        let diagnostic =
            Diagnostic::error().with_message(format!("couldn't read `{name}`: {error}"));
        self.emit_diagnostic(diagnostic);
    }
}

impl Default for Driver {
    fn default() -> Driver {
        Driver::new()
    }
}

fn stderr_color_choice() -> ColorChoice {
    if atty::is(atty::Stream::Stderr) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

/// Byte range of a one-based row/column parse position, for diagnostic
/// labels. Columns are counted in characters; the range is clamped to the
/// source length.
fn position_bytes(source: &str, pos: roxmltree::TextPos) -> Range<usize> {
    let line_start = source
        .split_inclusive('\n')
        .take(pos.row.saturating_sub(1) as usize)
        .map(str::len)
        .sum::<usize>();
    let offset = (line_start + pos.col.saturating_sub(1) as usize).min(source.len());
    offset..offset
}
