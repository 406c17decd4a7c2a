//! Replay trace format.
//!
//! One event per line; blank lines and `#` comments are skipped:
//!
//! ```text
//! # branch: B <ip> <kind> <target>
//! B 0x401000 call 0x402000
//! # fetch:  F <address>
//! F 0x402000
//! ```
//!
//! Numbers are decimal or `0x`-prefixed hex. A branch kind is either a
//! mnemonic (`cond`, `direct`, `indirect`, `call`, `icall`, `return`,
//! `other`, `none`) or its numeric code `0..=7`.

use std::fs;
use std::path::Path;

use crate::common::constants::BLOCK_SIZE;
use crate::common::data::BranchKind;
use crate::common::error::TraceError;

/// One replayed host event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    /// A resolved branch.
    Branch {
        /// Branch instruction address.
        ip: u64,
        /// Branch kind.
        kind: BranchKind,
        /// Resolved target, `0` when not taken.
        target: u64,
    },
    /// An instruction fetch.
    Fetch {
        /// Fetched address.
        address: u64,
    },
}

fn parse_number(text: &str, line: usize) -> Result<u64, TraceError> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|_| TraceError::Number {
        line,
        text: text.to_owned(),
    })
}

fn parse_kind(text: &str, line: usize) -> Result<BranchKind, TraceError> {
    if let Some(kind) = BranchKind::from_mnemonic(text) {
        return Ok(kind);
    }
    match text.parse::<u64>() {
        Ok(code) if code <= 7 => Ok(BranchKind::from_code(code)),
        _ => Err(TraceError::BranchKind {
            line,
            text: text.to_owned(),
        }),
    }
}

fn expect_fields(
    fields: &[&str],
    tag: &'static str,
    expected: usize,
    line: usize,
) -> Result<(), TraceError> {
    if fields.len() == expected {
        Ok(())
    } else {
        Err(TraceError::FieldCount {
            line,
            tag,
            expected,
            found: fields.len(),
        })
    }
}

/// Parses a whole trace.
pub fn parse_trace(text: &str) -> Result<Vec<TraceEvent>, TraceError> {
    let mut events = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }

        let mut tokens = content.split_whitespace();
        let Some(tag) = tokens.next() else {
            continue;
        };
        let fields: Vec<&str> = tokens.collect();

        let event = match tag {
            "B" | "b" => {
                expect_fields(&fields, "B", 3, line)?;
                TraceEvent::Branch {
                    ip: parse_number(fields[0], line)?,
                    kind: parse_kind(fields[1], line)?,
                    target: parse_number(fields[2], line)?,
                }
            }
            "F" | "f" => {
                expect_fields(&fields, "F", 1, line)?;
                TraceEvent::Fetch {
                    address: parse_number(fields[0], line)?,
                }
            }
            other => {
                return Err(TraceError::UnknownEvent {
                    line,
                    tag: other.to_owned(),
                });
            }
        };
        events.push(event);
    }
    Ok(events)
}

/// Reads and parses a trace file.
pub fn read_trace(path: impl AsRef<Path>) -> Result<Vec<TraceEvent>, TraceError> {
    let text = fs::read_to_string(path)?;
    parse_trace(&text)
}

/// A loop of `body_blocks` sequential blocks starting at `base`, closed by a
/// taken conditional branch back to `base`, repeated `iterations` times.
pub fn synthetic_loop(base: u64, body_blocks: u64, iterations: usize) -> Vec<TraceEvent> {
    let body = body_blocks.max(1);
    let mut events = Vec::with_capacity(iterations * (body as usize + 1));
    for _ in 0..iterations {
        for k in 0..body {
            events.push(TraceEvent::Fetch {
                address: base + k * BLOCK_SIZE,
            });
        }
        events.push(TraceEvent::Branch {
            ip: base + (body - 1) * BLOCK_SIZE + BLOCK_SIZE - 4,
            kind: BranchKind::Conditional,
            target: base,
        });
    }
    events
}
