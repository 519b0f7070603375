//! Line-oriented SFZ reader.
//!
//! Every line goes through the same steps: comment stripping, `default_path=`,
//! `#define`, macro expansion, `#include`, and finally section dispatch. Macros
//! live in the [`ParseContext`] and are shared by all included files; section
//! overlays and the region being built belong to the file being read.

use crate::error::{Error, Result};
use crate::macros::MacroTable;
use crate::paths;
use crate::region::{self, OverlayProblem, SampleRecord};
use crate::section::{parse_pairs, Section, SectionTracker};
use log::{debug, info, warn};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A recoverable problem found while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file: PathBuf,
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file.display(), self.line, self.message)
    }
}

#[derive(Debug)]
pub struct SfzParse {
    pub samples: Vec<SampleRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parses `path` and everything it includes. Includes and `default_path`
/// resolve against `base_dir`.
pub fn parse(path: &Path, base_dir: &Path) -> Result<SfzParse> {
    let mut ctx = ParseContext::new(base_dir);
    let samples = ctx.parse_file(path)?;
    info!(
        "{}: {} samples, {} defines, {} warnings",
        path.display(),
        samples.len(),
        ctx.macros.len(),
        ctx.diagnostics.len()
    );
    Ok(SfzParse {
        samples,
        diagnostics: ctx.diagnostics,
    })
}

/// State shared across one top-level parse and all of its includes.
pub struct ParseContext {
    base_dir: PathBuf,
    pub macros: MacroTable,
    pub diagnostics: Vec<Diagnostic>,
    include_stack: Vec<PathBuf>,
}

/// State private to one file.
struct FileState {
    file: PathBuf,
    line: usize,
    tracker: SectionTracker,
    pending: Option<SampleRecord>,
    default_path: PathBuf,
    samples: Vec<SampleRecord>,
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(pos) => &line[..pos],
        None => line,
    }
}

fn default_path_directive(line: &str) -> Option<&str> {
    if line.starts_with("default_path=") {
        Some(&line["default_path=".len()..])
    } else {
        None
    }
}

impl ParseContext {
    pub fn new(base_dir: &Path) -> ParseContext {
        ParseContext {
            base_dir: base_dir.to_path_buf(),
            macros: MacroTable::new(),
            diagnostics: vec![],
            include_stack: vec![],
        }
    }

    pub fn parse_file(&mut self, path: &Path) -> Result<Vec<SampleRecord>> {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if self.include_stack.contains(&key) {
            return Err(Error::IncludeCycle(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        self.include_stack.push(key);
        let samples = self.parse_source(path, &content);
        self.include_stack.pop();
        samples
    }

    pub fn parse_source(&mut self, file: &Path, content: &str) -> Result<Vec<SampleRecord>> {
        debug!("parsing {}", file.display());
        let mut state = FileState {
            file: file.to_path_buf(),
            line: 0,
            tracker: SectionTracker::new(),
            pending: None,
            default_path: self.base_dir.clone(),
            samples: vec![],
        };
        for (ix, raw) in content.lines().enumerate() {
            state.line = ix + 1;
            self.process_line(&mut state, raw)?;
        }
        self.close_region(&mut state);
        Ok(state.samples)
    }

    fn warn(&mut self, state: &FileState, message: String) {
        let diagnostic = Diagnostic {
            file: state.file.clone(),
            line: state.line,
            message,
        };
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    fn process_line(&mut self, state: &mut FileState, raw: &str) -> Result<()> {
        let stripped = strip_comment(raw).trim();
        if stripped.is_empty() && !raw.trim().is_empty() {
            // Comment-only lines do not end a region.
            return Ok(());
        }

        if let Some(declared) = default_path_directive(stripped) {
            state.default_path = paths::resolve_default_path(&self.base_dir, declared);
            debug!("default_path: {}", state.default_path.display());
            return Ok(());
        }

        if stripped.starts_with("#define") {
            if !self.macros.define_line(stripped) {
                self.warn(state, format!("ignoring malformed define '{}'", stripped));
            }
            return Ok(());
        }

        let line = self.macros.expand(stripped);

        if line.starts_with("#include") {
            return self.include(state, &line);
        }

        self.dispatch(state, &line);
        Ok(())
    }

    fn include(&mut self, state: &mut FileState, line: &str) -> Result<()> {
        let declared = paths::include_target(line).ok_or_else(|| Error::MalformedInclude {
            file: state.file.clone(),
            line: state.line,
        })?;
        let target = paths::resolve_include(&self.base_dir, declared, &state.file)?;
        info!("including {}", target.display());
        let mut samples = self.parse_file(&target)?;
        state.samples.append(&mut samples);
        Ok(())
    }

    fn dispatch(&mut self, state: &mut FileState, line: &str) {
        if line.is_empty() {
            self.close_region(state);
            return;
        }

        if let Some((section, rest)) = Section::from_tag(line) {
            self.close_region(state);
            state.tracker.enter(section);
            if section == Section::Region {
                state.pending = Some(SampleRecord::new());
            }
            if let Some(declared) = default_path_directive(rest) {
                state.default_path = paths::resolve_default_path(&self.base_dir, declared);
            } else if !rest.is_empty() {
                self.dispatch(state, rest);
            }
            return;
        }

        if line.starts_with('<') {
            debug!("ignoring header {}", line);
            return;
        }

        let in_region = state.tracker.section() == Section::Region;
        if line.starts_with("sample=") {
            if !in_region {
                self.warn(state, "sample= outside of a <region>".to_string());
            } else if let Some(record) = state.pending.as_mut() {
                let (sample, rest) = region::split_sample(&line["sample=".len()..]);
                record.set_sample(sample);
                for e in record.assign(rest) {
                    self.warn(state, format!("invalid value '{}' for {}", e.value, e.opcode));
                }
            }
            return;
        }
        if line.starts_with("pitch_keycenter=") && !in_region {
            self.warn(state, "pitch_keycenter= outside of a <region>".to_string());
            return;
        }

        if !line.contains('=') {
            debug!("ignoring '{}'", line);
            return;
        }
        if state.tracker.assign(line) {
            if state.tracker.section() != Section::Control {
                self.check_overlay(state, line);
            }
            return;
        }
        match state.tracker.section() {
            Section::Region => {
                if let Some(record) = state.pending.as_mut() {
                    let invalid = record.assign(line);
                    for e in invalid {
                        self.warn(state, format!("invalid value '{}' for {}", e.value, e.opcode));
                    }
                } else {
                    debug!("region already closed, ignoring '{}'", line);
                }
            }
            _ => self.warn(state, format!("'{}' outside of any section", line)),
        }
    }

    fn check_overlay(&mut self, state: &FileState, line: &str) {
        for (key, value) in parse_pairs(line) {
            match region::check_overlay_pair(key, value) {
                Some(OverlayProblem::RegionOnly(key)) => {
                    self.warn(state, format!("{}= outside of a <region>", key))
                }
                Some(OverlayProblem::Invalid(e)) => {
                    self.warn(state, format!("invalid value '{}' for {}", e.value, e.opcode))
                }
                None => {}
            }
        }
    }

    /// Finishes the pending region if it has a sample; drops it otherwise.
    fn close_region(&mut self, state: &mut FileState) {
        let mut record = match state.pending.take() {
            Some(record) => record,
            None => return,
        };
        if !record.has_sample() {
            debug!("{}:{}: dropping region without sample", state.file.display(), state.line);
            return;
        }
        let tracker = &state.tracker;
        record.inherit(&[&tracker.master, &tracker.global, &tracker.group]);
        record.control = tracker.control.clone();
        record.resolve(&state.default_path);
        if let Err(short) = record.derive_names() {
            self.warn(
                state,
                format!(
                    "cannot name channel/instrument from '{}': {} path segments, need {}",
                    short.path,
                    short.segments,
                    region::NAME_SEGMENTS
                ),
            );
        }
        debug!("sample: {:?}", record);
        state.samples.push(record);
    }
}
