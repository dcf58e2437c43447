//! Line-based save format for a demonstration field.
//!
//! One line per demo, whitespace-separated tokens: the literal `s`,
//! `S` source components, the literal `d`, `D` destination components:
//!
//! ```text
//! s 0.25 0.5 d 1 0 0 0.75 0 0
//! ```
//!
//! Loading replays each line as an insert in file order; ids are
//! reassigned by the store and are never persisted.  Components are
//! printed with Rust's shortest round-trip `f64` formatting, so
//! save → load is value-exact.

use std::fmt::Write as _;
use std::path::Path;

use crate::{DemoField, DestVec, FieldError, Result, Scalar, SourceVec};

// ════════════════════════════════════════════════════════════════════════════
// Encode
// ════════════════════════════════════════════════════════════════════════════

/// Encode the field, one demo per line, in insertion order.
pub fn save<const S: usize, const D: usize>(field: &DemoField<S, D>) -> String {
    let mut out = String::new();
    for demo in field.iter() {
        out.push('s');
        for i in 0..S {
            let _ = write!(out, " {}", demo.source[i]);
        }
        out.push_str(" d");
        for i in 0..D {
            let _ = write!(out, " {}", demo.destination[i]);
        }
        out.push('\n');
    }
    out
}

/// Encode and write to `path`.
pub fn save_file<const S: usize, const D: usize>(
    field: &DemoField<S, D>,
    path: impl AsRef<Path>,
) -> Result<()> {
    std::fs::write(path, save(field))?;
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Decode
// ════════════════════════════════════════════════════════════════════════════

/// Parse a saved field, replaying one insert per non-blank line.
pub fn parse<const S: usize, const D: usize>(text: &str) -> Result<DemoField<S, D>> {
    let mut field = DemoField::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let (source, destination) = parse_line::<S, D>(line, idx + 1)?;
        field.insert(source, destination);
    }
    Ok(field)
}

/// Read and parse a saved field from `path`.
pub fn load_file<const S: usize, const D: usize>(
    path: impl AsRef<Path>,
) -> Result<DemoField<S, D>> {
    parse(&std::fs::read_to_string(path)?)
}

fn parse_line<const S: usize, const D: usize>(
    line: &str,
    line_no: usize,
) -> Result<(SourceVec<S>, DestVec<D>)> {
    let mut tokens = line.split_whitespace();

    expect_literal(tokens.next(), "s", line_no)?;
    let mut source = SourceVec::<S>::zeros();
    for i in 0..S {
        source[i] = expect_float(tokens.next(), line_no)?;
    }

    expect_literal(tokens.next(), "d", line_no)?;
    let mut destination = DestVec::<D>::zeros();
    for i in 0..D {
        destination[i] = expect_float(tokens.next(), line_no)?;
    }

    if let Some(extra) = tokens.next() {
        return Err(FieldError::Parse {
            line:   line_no,
            reason: format!("trailing token {:?}", extra),
        });
    }
    Ok((source, destination))
}

fn expect_literal(token: Option<&str>, want: &str, line_no: usize) -> Result<()> {
    match token {
        Some(t) if t == want => Ok(()),
        Some(t) => Err(FieldError::Parse {
            line:   line_no,
            reason: format!("expected {:?}, found {:?}", want, t),
        }),
        None => Err(FieldError::Parse {
            line:   line_no,
            reason: format!("expected {:?}, found end of line", want),
        }),
    }
}

fn expect_float(token: Option<&str>, line_no: usize) -> Result<Scalar> {
    let t = token.ok_or_else(|| FieldError::Parse {
        line:   line_no,
        reason: "expected a component, found end of line".to_string(),
    })?;
    t.parse::<Scalar>().map_err(|_| FieldError::Parse {
        line:   line_no,
        reason: format!("not a number: {:?}", t),
    })
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
