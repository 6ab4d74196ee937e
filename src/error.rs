use miette::{miette, LabeledSpan, Report, Severity};

use crate::lexer::TokenKind;
use crate::program::BuildError;
use crate::span::Span;

// Parser errors

pub fn parse_unknown_mnemonic(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::mnemonic",
        help = "available commands are INBOX, OUTBOX, COPYFROM, COPYTO, ADD, SUB, JUMP and JUMPZ",
        labels = vec![LabeledSpan::at(span, "unknown command")],
        "Encountered an unknown command.",
    )
    .with_source_code(src.to_owned())
}

pub fn parse_unexpected(span: Span, src: &str, expected: &str, found: TokenKind) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::unexpected_token",
        help = "each line holds one label or one command",
        labels = vec![LabeledSpan::at(span, "unexpected token")],
        "Expected {expected}, found {found:?}",
    )
    .with_source_code(src.to_owned())
}

pub fn parse_missing_operand(span: Span, src: &str, expected: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::missing_operand",
        help = format!("this command needs {expected} after it"),
        labels = vec![LabeledSpan::at(span, "missing operand")],
        "Expected {expected}.",
    )
    .with_source_code(src.to_owned())
}

pub fn parse_bad_slot(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::bad_slot",
        help = "slots are numbered from 0",
        labels = vec![LabeledSpan::at(span, "incorrect slot")],
        "Encountered an invalid slot number.",
    )
    .with_source_code(src.to_owned())
}

pub fn parse_duplicate_label(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::duplicate_label",
        help = "labels are only allowed once per program",
        labels = vec![LabeledSpan::at(span, "duplicate label")],
        "Duplicate label",
    )
    .with_source_code(src.to_owned())
}

pub fn parse_undefined_label(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::undefined_label",
        help = "define the label with `name:` on its own line",
        labels = vec![LabeledSpan::at(span, "not defined")],
        "Jump to a label which does not exist",
    )
    .with_source_code(src.to_owned())
}

// Build errors

/// `span` is the source of the offending command, if the program came from source.
pub fn build(error: &BuildError, span: Option<Span>, src: &str) -> Report {
    let (code, help) = match error {
        BuildError::UnresolvedJumpTarget { .. } => (
            "build::unresolved_jump",
            "the program cannot run until the jump points at an existing command",
        ),
        BuildError::MissingArgument { .. } => {
            ("build::missing_argument", "give the command an argument")
        }
        BuildError::MismatchedArgument { .. } => (
            "build::mismatched_argument",
            "slot commands take a slot number, jumps take a label",
        ),
        BuildError::SlotOutOfRange { .. } => (
            "build::slot_range",
            "use `mailroom levels` to see how many slots each level has",
        ),
        BuildError::OpcodeNotAvailable { .. } => (
            "build::toolbox",
            "use `mailroom levels` to see which commands each level offers",
        ),
    };
    let labels = span
        .map(|span| vec![LabeledSpan::at(span, "cannot build")])
        .unwrap_or_default();
    miette!(
        severity = Severity::Error,
        code = code,
        help = help,
        labels = labels,
        "{error}",
    )
    .with_source_code(src.to_owned())
}
