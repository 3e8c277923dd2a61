use std::marker::PhantomData;

use tracing::debug;

use crate::catalog::Catalog;
use crate::diagram::{Diagram, Size};
use crate::error::ViewerError;

pub const MIN_ZOOM: u32 = 50;
pub const MAX_ZOOM: u32 = 200;
pub const DEFAULT_ZOOM: u32 = 100;
pub const ZOOM_STEP: u32 = 10;
pub const ROTATION_STEP: i32 = 90;

/// What a viewer can do beyond selecting diagrams and expanding nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub edges: bool,
    pub transform: bool,
}

/// Static description of one viewer variant.
pub trait ViewerKind {
    const NAME: &'static str;
    const CAPABILITIES: Capabilities;
    /// Drawing area in diagram-local units. Rotation pivots on its center.
    const VIEWPORT: Size;
    /// Box used for nodes that carry no size of their own.
    const NODE_SIZE: Size;
}

/// Marker for kinds that expose the zoom/rotate/reset controls.
pub trait TransformControls: ViewerKind {}

/// The dashboard's process-flow diagram: edges, no transform controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowDiagram;

impl ViewerKind for FlowDiagram {
    const NAME: &'static str = "process flow";
    const CAPABILITIES: Capabilities = Capabilities {
        edges: true,
        transform: false,
    };
    const VIEWPORT: Size = Size::new(950.0, 400.0);
    const NODE_SIZE: Size = Size::new(120.0, 50.0);
}

/// The plant design viewer: sized components, zoom and rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlantViewer;

impl ViewerKind for PlantViewer {
    const NAME: &'static str = "plant design";
    const CAPABILITIES: Capabilities = Capabilities {
        edges: false,
        transform: true,
    };
    const VIEWPORT: Size = Size::new(700.0, 500.0);
    const NODE_SIZE: Size = Size::new(120.0, 80.0);
}

impl TransformControls for PlantViewer {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    pub active_diagram_id: String,
    pub expanded_node_id: Option<String>,
    /// Percent, kept within `MIN_ZOOM..=MAX_ZOOM`.
    pub zoom: u32,
    /// Degrees, accumulated without wrapping until the `i32` bound.
    pub rotation: i32,
}

impl SelectionState {
    pub fn new(active_diagram_id: impl Into<String>) -> Self {
        Self {
            active_diagram_id: active_diagram_id.into(),
            expanded_node_id: None,
            zoom: DEFAULT_ZOOM,
            rotation: 0,
        }
    }

    /// Rotation as shown on screen, in `0..360`.
    pub fn display_rotation(&self) -> i32 {
        self.rotation.rem_euclid(360)
    }

    pub fn scale(&self) -> f64 {
        f64::from(self.zoom) / 100.0
    }
}

/// One viewer instance: a borrowed catalog plus the selection it owns.
///
/// Every mutation goes through the methods below; a failed call leaves the
/// state exactly as it was.
#[derive(Debug, Clone)]
pub struct Viewer<'c, K: ViewerKind> {
    catalog: &'c Catalog,
    state: SelectionState,
    kind: PhantomData<K>,
}

impl<'c, K: ViewerKind> Viewer<'c, K> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            state: SelectionState::new(catalog.default_diagram_id()),
            kind: PhantomData,
        }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn active_diagram(&self) -> Result<&'c Diagram, ViewerError> {
        self.catalog.get_diagram(&self.state.active_diagram_id)
    }

    pub fn select_diagram(&mut self, id: &str) -> Result<(), ViewerError> {
        if !self.catalog.contains(id) {
            return Err(ViewerError::DiagramNotFound(id.to_string()));
        }
        debug!(viewer = K::NAME, diagram = id, "select diagram");
        self.state.active_diagram_id = id.to_string();
        self.state.expanded_node_id = None;
        Ok(())
    }

    pub fn toggle_node(&mut self, node_id: &str) -> Result<(), ViewerError> {
        let diagram = self.active_diagram()?;
        if !diagram.contains_node(node_id) {
            return Err(ViewerError::NodeNotFound {
                diagram: diagram.id.clone(),
                node: node_id.to_string(),
            });
        }

        if self.state.expanded_node_id.as_deref() == Some(node_id) {
            debug!(viewer = K::NAME, node = node_id, "collapse node");
            self.state.expanded_node_id = None;
        } else {
            debug!(viewer = K::NAME, node = node_id, "expand node");
            self.state.expanded_node_id = Some(node_id.to_string());
        }
        Ok(())
    }

    /// Close the detail panel, whatever is expanded.
    pub fn collapse(&mut self) {
        if self.state.expanded_node_id.take().is_some() {
            debug!(viewer = K::NAME, "close detail panel");
        }
    }
}

impl<K: TransformControls> Viewer<'_, K> {
    pub fn zoom_in(&mut self) {
        self.set_zoom(self.state.zoom.saturating_add(ZOOM_STEP));
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.state.zoom.saturating_sub(ZOOM_STEP));
    }

    /// Slider input; out-of-range values saturate.
    pub fn set_zoom(&mut self, percent: u32) {
        self.state.zoom = percent.clamp(MIN_ZOOM, MAX_ZOOM);
        debug!(viewer = K::NAME, zoom = self.state.zoom, "zoom");
    }

    pub fn rotate_clockwise(&mut self) {
        self.rotate_by(ROTATION_STEP);
    }

    pub fn rotate_counter_clockwise(&mut self) {
        self.rotate_by(-ROTATION_STEP);
    }

    fn rotate_by(&mut self, degrees: i32) {
        let current = self.state.rotation;
        // Fold by whole turns at the integer bound so the angle stays exact.
        self.state.rotation = current
            .checked_add(degrees)
            .unwrap_or_else(|| current.rem_euclid(360) + degrees);
        debug!(viewer = K::NAME, rotation = self.state.rotation, "rotate");
    }

    pub fn reset_view(&mut self) {
        self.state.zoom = DEFAULT_ZOOM;
        self.state.rotation = 0;
        debug!(viewer = K::NAME, "reset view");
    }
}
