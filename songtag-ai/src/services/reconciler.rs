//! Reconciliation of existing and inferred metadata
//!
//! Computes a per-field diff and, in interactive mode, asks the operator
//! whether to write. Answering "all" switches the session to
//! non-interactive for every remaining file; "quit" ends the run.

use crate::models::{ExistingMetadata, InferredMetadata, MetadataField};
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Placeholder shown for blank or absent values
pub const EMPTY_SENTINEL: &str = "(empty)";

/// Reconciliation errors
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Prompt I/O error: {0}")]
    Io(#[from] io::Error),
}

/// One row of a diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDiff {
    pub field: MetadataField,
    pub old: String,
    pub new: String,
    pub changed: bool,
}

/// Field-by-field comparison of existing and inferred metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    pub fields: Vec<FieldDiff>,
    /// Existing comments, shown for information only
    pub comments: Vec<String>,
}

impl Diff {
    pub fn changed_count(&self) -> usize {
        self.fields.iter().filter(|f| f.changed).count()
    }

    pub fn changed_fields(&self) -> impl Iterator<Item = &FieldDiff> {
        self.fields.iter().filter(|f| f.changed)
    }

    /// Render the diff as a plain-text table
    pub fn render(&self) -> String {
        let mut out = String::new();
        for row in &self.fields {
            let marker = if row.changed { "*" } else { " " };
            out.push_str(&format!(
                "{} {:<9} {} -> {}\n",
                marker,
                row.field.label(),
                row.old,
                row.new
            ));
        }
        for comment in &self.comments {
            out.push_str(&format!("  Comment   {}\n", comment));
        }
        if self.changed_count() == 0 {
            out.push_str("  (no changes)\n");
        }
        out
    }
}

fn normalized(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => EMPTY_SENTINEL.to_string(),
    }
}

/// Compare the seven display fields
pub fn compute_diff(existing: &ExistingMetadata, inferred: &InferredMetadata) -> Diff {
    let fields = MetadataField::ALL
        .iter()
        .map(|&field| {
            let old = normalized(existing.get(field));
            let new = normalized(inferred.get(field));
            FieldDiff {
                field,
                changed: old != new,
                old,
                new,
            }
        })
        .collect();

    Diff {
        fields,
        comments: existing.comments.clone(),
    }
}

/// Operator decision for one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Write the tags
    Proceed,
    /// Leave this file alone
    Skip,
    /// Stop the whole run now
    Quit,
}

/// Session-scoped confirmation gate
pub struct Reconciler<R, W> {
    interactive: bool,
    input: R,
    output: W,
}

impl Reconciler<io::BufReader<io::Stdin>, io::Stdout> {
    /// Prompt on the terminal
    pub fn stdio(interactive: bool) -> Self {
        Self::new(interactive, io::BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> Reconciler<R, W> {
    pub fn new(interactive: bool, input: R, output: W) -> Self {
        Self {
            interactive,
            input,
            output,
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Decide whether `name` should be written
    ///
    /// Non-interactive sessions always proceed without showing anything.
    /// End of input counts as quit.
    pub fn confirm(&mut self, name: &str, diff: &Diff) -> Result<Decision, ReconcileError> {
        if !self.interactive {
            return Ok(Decision::Proceed);
        }

        writeln!(self.output, "\n{}", name)?;
        write!(self.output, "{}", diff.render())?;

        loop {
            write!(self.output, "Write these tags? [y]es / [n]o / [a]ll / [q]uit: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(Decision::Quit);
            }

            match line.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(Decision::Proceed),
                "n" | "no" => return Ok(Decision::Skip),
                "a" | "all" => {
                    self.interactive = false;
                    writeln!(self.output, "Applying to all remaining files without asking.")?;
                    return Ok(Decision::Proceed);
                }
                "q" | "quit" => return Ok(Decision::Quit),
                other => {
                    writeln!(self.output, "Unrecognized answer '{}'.", other)?;
                }
            }
        }
    }
}
