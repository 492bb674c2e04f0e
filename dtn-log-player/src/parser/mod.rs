//! Simulation log parser
//!
//! A log has two sections, each introduced by a marker line:
//!
//! ```text
//! --Declare
//! area=<W>|<H>
//! node=<id> type=<t> group=<g> color=<r>|<g>|<b> buffer=<n> range=<r1>|<r2>
//! --Events
//! Time=<t>
//! event=pos node=<id> x=<x> y=<y>
//! event=send source=<id> dest=<id> meta=<text>
//! ```
//!
//! Blank lines, lines outside any section and any other `--` line are
//! ignored. Lines are split into their sections first, then each section is
//! handed to its own parser.

use crate::timeline::Timeline;
use crate::types::{Area, Result, Topology};
use std::fs;
use std::path::Path;

mod declare;
mod events;
pub mod fields;

pub use fields::parse_fields;

/// Everything loaded from one log file
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLog {
    /// Simulation area, if declared
    pub area: Option<Area>,
    /// Declared nodes in declaration order
    pub nodes: Topology,
    /// Sorted, merged event frames
    pub timeline: Timeline,
}

/// A trimmed, non-empty source line with its 1-based number
#[derive(Debug, Clone, Copy)]
pub(crate) struct SourceLine<'a> {
    pub number: usize,
    pub text: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Declare,
    Events,
}

/// Read and parse a log file
pub fn parse_log_file(path: &Path) -> Result<ParsedLog> {
    log::info!("Parsing log file: {:?}", path);

    let content = fs::read_to_string(path)?;
    let parsed = parse_log_str(&content)?;

    log::info!(
        "Loaded {} nodes and {} frames from {:?}",
        parsed.nodes.len(),
        parsed.timeline.len(),
        path
    );

    Ok(parsed)
}

/// Parse log text already held in memory
pub fn parse_log_str(content: &str) -> Result<ParsedLog> {
    let mut declare_lines = Vec::new();
    let mut event_lines = Vec::new();
    let mut section = None;

    for (idx, raw) in content.lines().enumerate() {
        let text = raw.trim();
        if text.is_empty() {
            continue;
        }

        if text.starts_with("--Declare") {
            section = Some(Section::Declare);
            continue;
        } else if text.starts_with("--Events") {
            section = Some(Section::Events);
            continue;
        } else if text.starts_with("--") {
            continue;
        }

        let line = SourceLine {
            number: idx + 1,
            text,
        };
        match section {
            Some(Section::Declare) => declare_lines.push(line),
            Some(Section::Events) => event_lines.push(line),
            None => log::trace!("Line {}: outside any section, skipped", line.number),
        }
    }

    log::debug!(
        "Split log into {} declare lines and {} event lines",
        declare_lines.len(),
        event_lines.len()
    );

    let (area, nodes) = declare::parse_declare(&declare_lines)?;
    let timeline = events::parse_events(&event_lines)?;

    Ok(ParsedLog {
        area,
        nodes,
        timeline,
    })
}
