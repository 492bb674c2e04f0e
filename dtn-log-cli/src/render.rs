//! Plain-text frame renderer
//!
//! Prints one block per rendered frame: the frame header, each placed node
//! with its buffer fill and position, the transient events of the frame and
//! the details of the selected node.

use dtn_log_player::{Event, FrameView, Node, Renderer};
use std::io::{self, Write};

/// Writes frames as text to any writer
pub struct TextRenderer<W: Write> {
    out: W,
    /// When false, frames are counted but not printed
    enabled: bool,
    rendered: usize,
}

impl TextRenderer<io::Stdout> {
    pub fn stdout(enabled: bool) -> Self {
        Self::new(io::stdout(), enabled)
    }
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W, enabled: bool) -> Self {
        Self {
            out,
            enabled,
            rendered: 0,
        }
    }

    /// Number of render calls so far
    pub fn rendered(&self) -> usize {
        self.rendered
    }

    #[cfg(test)]
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn write_view(&mut self, view: &FrameView<'_>) -> io::Result<()> {
        let out = &mut self.out;

        writeln!(out, "───────────────────────────────────────────────")?;
        writeln!(
            out,
            "[{}] Time={}  ({} events)",
            view.index,
            view.time(),
            view.frame.events.len()
        )?;

        for node in view.nodes.iter() {
            writeln!(out, "  {}", node_line(node))?;
        }

        for event in view.transient_events() {
            match event {
                Event::Send { source, dest, meta } => {
                    writeln!(out, "  send   {} -> {}  {}", source, dest, meta.as_deref().unwrap_or(""))?
                }
                Event::Beacon { node } => writeln!(out, "  beacon {}", node)?,
                _ => {}
            }
        }

        if let Some(node) = view.selected {
            writeln!(out, "  Node:   {}", node.nid)?;
            writeln!(out, "  Type:   {}", node.kind)?;
            writeln!(out, "  Buffer: {}/{} {:?}", node.state.buffer.len(), node.buffer_size, node.state.buffer)?;
            writeln!(out, "  Route:  {:?}", node.state.route)?;
        }

        out.flush()
    }
}

fn node_line(node: &Node) -> String {
    let pos = match node.state.pos {
        Some((x, y)) => format!("({:.2}, {:.2})", x, y),
        None => "(unplaced)".to_string(),
    };
    let fill = match node.buffer_ratio() {
        Some(ratio) => format!(" {:>3.0}%", ratio * 100.0),
        None => String::new(),
    };
    format!("{:<24}{} {} {}", node.display_label(), fill, node.kind, pos)
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render(&mut self, view: &FrameView<'_>) {
        self.rendered += 1;
        if !self.enabled {
            return;
        }

        if let Err(e) = self.write_view(view) {
            log::warn!("Failed to write frame {}: {}", view.index, e);
        }
    }
}
