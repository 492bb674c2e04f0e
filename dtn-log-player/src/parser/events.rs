//! Events section parser
//!
//! Groups `event=` lines under the preceding `Time=` line and converts each
//! one into a typed [`Event`]. Sorting and merging of frames is left to
//! [`Timeline::from_frames`].

use super::fields::LineFields;
use super::SourceLine;
use crate::timeline::Timeline;
use crate::types::{Event, Result, TimeFrame};

/// Parse events-section lines into a sorted, merged timeline
pub(crate) fn parse_events(lines: &[SourceLine<'_>]) -> Result<Timeline> {
    let mut frames = Vec::new();
    let mut current: Option<TimeFrame> = None;
    let mut orphaned = 0usize;

    for line in lines {
        let fields = LineFields::parse(line.number, line.text);

        if line.text.starts_with("Time=") {
            let time = fields.require_finite("Time")?;
            if let Some(frame) = current.take() {
                frames.push(frame);
            }
            current = Some(TimeFrame::new(time, Vec::new()));
            continue;
        }

        if !fields.contains("event") {
            log::debug!("Line {}: ignoring event line without `event=`", line.number);
            continue;
        }

        let event = parse_event(fields)?;
        match current.as_mut() {
            Some(frame) => frame.events.push(event),
            None => orphaned += 1,
        }
    }

    if let Some(frame) = current {
        frames.push(frame);
    }

    if orphaned > 0 {
        log::warn!("Dropped {} event(s) that appear before the first Time= line", orphaned);
    }

    Ok(Timeline::from_frames(frames))
}

/// Convert one `event=<kind> ...` line into a typed event
pub(crate) fn parse_event(fields: LineFields<'_>) -> Result<Event> {
    let kind = fields.require_text("event")?;

    let event = match kind.as_str() {
        "pos" => Event::Pos {
            node: fields.require_text("node")?,
            x: fields.require_finite("x")?,
            y: fields.require_finite("y")?,
        },
        "route" => Event::Route {
            node: fields.require_text("node")?,
            tour: fields.require_list("tour")?,
        },
        "buffer" => Event::Buffer {
            node: fields.require_text("node")?,
            list: fields.require_list("list")?,
        },
        "send" => Event::Send {
            source: fields.require_text("source")?,
            dest: fields.require_text("dest")?,
            meta: fields.text("meta"),
        },
        "beacon" => Event::Beacon {
            node: fields.require_text("node")?,
        },
        _ => {
            log::trace!("Keeping unrecognised event kind {:?}", kind);
            Event::Other {
                kind,
                fields: fields.into_fields(),
            }
        }
    };

    Ok(event)
}
