//! Declare section parser
//!
//! Builds the simulation area and the node topology from `area=` and
//! `node=` lines.

use super::fields::LineFields;
use super::SourceLine;
use crate::types::{Area, Color, Node, NodeState, Result, Topology};

/// Parse declare-section lines into the area and node topology
///
/// Repeated `area=` lines and duplicate node ids are resolved last-wins.
pub(crate) fn parse_declare(lines: &[SourceLine<'_>]) -> Result<(Option<Area>, Topology)> {
    let mut area = None;
    let mut nodes = Topology::new();

    for line in lines {
        let fields = LineFields::parse(line.number, line.text);

        if fields.contains("area") {
            if area.is_some() {
                log::warn!("Line {}: area declared again, replacing previous area", line.number);
            }
            area = Some(parse_area(&fields)?);
        } else if fields.contains("node") {
            let node = parse_node(&fields)?;
            if nodes.contains_key(&node.nid) {
                log::warn!("Line {}: node {:?} declared twice, keeping the later declaration", line.number, node.nid);
            }
            nodes.insert(node.nid.clone(), node);
        } else {
            log::debug!("Line {}: ignoring declare line {:?}", line.number, line.text);
        }
    }

    Ok((area, nodes))
}

fn parse_area(fields: &LineFields<'_>) -> Result<Area> {
    let dims: Vec<f64> = fields.number_list("area")?;
    match dims.as_slice() {
        [width, height] => Ok(Area {
            width: *width,
            height: *height,
        }),
        _ => Err(fields.error(format!(
            "area needs exactly two dimensions, got {}",
            dims.len()
        ))),
    }
}

fn parse_node(fields: &LineFields<'_>) -> Result<Node> {
    let nid = fields.require_text("node")?;
    let kind = fields.require_text("type")?;

    let channels: Vec<u8> = fields.number_list("color")?;
    let color = match channels.as_slice() {
        [r, g, b] => Color::new(*r, *g, *b),
        _ => {
            return Err(fields.error(format!(
                "color needs exactly three channels, got {}",
                channels.len()
            )))
        }
    };

    let ranges = if fields.contains("range") {
        fields.number_list("range")?
    } else {
        Vec::new()
    };

    Ok(Node {
        nid,
        kind,
        group: fields.number_or("group", 0)?,
        color,
        buffer_size: fields.number_or("buffer", 0)?,
        ranges,
        state: NodeState::default(),
    })
}
