use std::collections::HashMap;

use tracing::warn;

use crate::diagram::*;
use crate::error::ViewerError;
use crate::viewer::{SelectionState, Viewer, ViewerKind};

#[derive(Debug, Clone, PartialEq)]
pub struct DrawList {
    pub diagram_id: String,
    pub title: String,
    pub summary: Option<String>,
    pub viewport: Size,
    /// Present only for viewers with transform controls.
    pub zoom: Option<u32>,
    /// Display rotation in `0..360`, transform-capable viewers only.
    pub rotation: Option<i32>,
    pub nodes: Vec<NodeBox>,
    pub connectors: Vec<Connector>,
    pub detail: Option<DetailPanel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeBox {
    pub id: String,
    pub label: String,
    pub rect: Rect,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub from_id: String,
    pub to_id: String,
    pub start: Point,
    pub end: Point,
    /// Arrowhead sits on the `end` point.
    pub arrowhead: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailPanel {
    pub node_id: String,
    pub label: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(position: Point, size: Size) -> Self {
        Self {
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn left_center(&self) -> Point {
        Point::new(self.x, self.y + self.height / 2.0)
    }

    pub fn right_center(&self) -> Point {
        Point::new(self.right(), self.y + self.height / 2.0)
    }

    fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ]
    }

    fn bounding(points: &[Point]) -> Self {
        let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }
}

/// Scale then rotate about a fixed pivot (screen coordinates, y down, so a
/// positive angle turns clockwise).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pivot: Point,
    scale: f64,
    cos: f64,
    sin: f64,
}

impl ViewTransform {
    pub fn identity() -> Self {
        Self {
            pivot: Point::new(0.0, 0.0),
            scale: 1.0,
            cos: 1.0,
            sin: 0.0,
        }
    }

    pub fn new(pivot: Point, scale: f64, degrees: i32) -> Self {
        // Quarter turns are exact so rotated boxes keep integral edges.
        let (cos, sin) = match degrees.rem_euclid(360) {
            0 => (1.0, 0.0),
            90 => (0.0, 1.0),
            180 => (-1.0, 0.0),
            270 => (0.0, -1.0),
            d => {
                let rad = f64::from(d).to_radians();
                (rad.cos(), rad.sin())
            }
        };
        Self {
            pivot,
            scale,
            cos,
            sin,
        }
    }

    pub fn apply(&self, p: Point) -> Point {
        let dx = (p.x - self.pivot.x) * self.scale;
        let dy = (p.y - self.pivot.y) * self.scale;
        Point::new(
            self.pivot.x + dx * self.cos - dy * self.sin,
            self.pivot.y + dx * self.sin + dy * self.cos,
        )
    }

    pub fn apply_rect(&self, rect: Rect) -> Rect {
        Rect::bounding(&rect.corners().map(|p| self.apply(p)))
    }
}

/// Derive what to draw for `diagram` under `state`.
///
/// Never fails: an edge or expansion that does not resolve inside `diagram`
/// is left out of the result.
pub fn derive<K: ViewerKind>(diagram: &Diagram, state: &SelectionState) -> DrawList {
    let caps = K::CAPABILITIES;
    let transform = if caps.transform {
        let pivot = Point::new(K::VIEWPORT.width / 2.0, K::VIEWPORT.height / 2.0);
        ViewTransform::new(pivot, state.scale(), state.rotation)
    } else {
        ViewTransform::identity()
    };

    let expanded = state
        .expanded_node_id
        .as_deref()
        .and_then(|id| diagram.node(id));

    let local_rects: HashMap<&str, Rect> = diagram
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), Rect::new(n.position, n.size.unwrap_or(K::NODE_SIZE))))
        .collect();

    let nodes = diagram
        .nodes
        .iter()
        .map(|n| NodeBox {
            id: n.id.clone(),
            label: n.label.clone(),
            rect: transform.apply_rect(local_rects[n.id.as_str()]),
            highlighted: expanded.is_some_and(|e| e.id == n.id),
        })
        .collect();

    let connectors = if caps.edges {
        diagram
            .edges
            .iter()
            .filter_map(|e| {
                let (Some(from), Some(to)) =
                    (local_rects.get(e.from.as_str()), local_rects.get(e.to.as_str()))
                else {
                    warn!(
                        diagram = %diagram.id,
                        from = %e.from,
                        to = %e.to,
                        "skipping edge with unknown endpoint"
                    );
                    return None;
                };
                Some(Connector {
                    from_id: e.from.clone(),
                    to_id: e.to.clone(),
                    start: transform.apply(from.right_center()),
                    end: transform.apply(to.left_center()),
                    arrowhead: true,
                })
            })
            .collect()
    } else {
        Vec::new()
    };

    let detail = expanded.map(|n| DetailPanel {
        node_id: n.id.clone(),
        label: n.label.clone(),
        description: n.description.clone(),
    });

    DrawList {
        diagram_id: diagram.id.clone(),
        title: diagram.title.clone(),
        summary: diagram.summary.clone(),
        viewport: K::VIEWPORT,
        zoom: caps.transform.then_some(state.zoom),
        rotation: caps.transform.then(|| state.display_rotation()),
        nodes,
        connectors,
        detail,
    }
}

impl<K: ViewerKind> Viewer<'_, K> {
    /// Draw list for the current selection.
    pub fn draw(&self) -> Result<DrawList, ViewerError> {
        Ok(derive::<K>(self.active_diagram()?, self.state()))
    }
}
