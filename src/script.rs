use winnow::prelude::*;
use winnow::ascii::{digit1, space0, space1};
use winnow::combinator::{alt, eof};
use winnow::token::{literal, take_while};

use tracing::warn;

use crate::catalog::Catalog;
use crate::draw::DrawList;
use crate::error::{CatalogError, ScriptError, ViewerError, error_context};
use crate::viewer::{FlowDiagram, PlantViewer, SelectionState, Viewer, ViewerKind};

/// One user interaction, as a host would deliver it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Select(String),
    Toggle(String),
    /// The detail panel's close button.
    Collapse,
    ZoomIn,
    ZoomOut,
    /// The zoom slider.
    Zoom(u32),
    RotateClockwise,
    RotateCounterClockwise,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ViewerName {
    /// Process-flow diagrams
    Flow,
    /// Plant design viewer
    Plant,
}

impl ViewerName {
    pub fn builtin_catalog(self) -> Result<Catalog, CatalogError> {
        match self {
            ViewerName::Flow => Catalog::process_flows(),
            ViewerName::Plant => Catalog::plant_designs(),
        }
    }
}

/// A viewer of either kind, driven by dynamically parsed events.
#[derive(Debug, Clone)]
pub enum AnyViewer<'c> {
    Flow(Viewer<'c, FlowDiagram>),
    Plant(Viewer<'c, PlantViewer>),
}

impl<'c> AnyViewer<'c> {
    pub fn new(name: ViewerName, catalog: &'c Catalog) -> Self {
        match name {
            ViewerName::Flow => AnyViewer::Flow(Viewer::new(catalog)),
            ViewerName::Plant => AnyViewer::Plant(Viewer::new(catalog)),
        }
    }

    pub fn state(&self) -> &SelectionState {
        match self {
            AnyViewer::Flow(v) => v.state(),
            AnyViewer::Plant(v) => v.state(),
        }
    }

    pub fn draw(&self) -> Result<DrawList, ViewerError> {
        match self {
            AnyViewer::Flow(v) => v.draw(),
            AnyViewer::Plant(v) => v.draw(),
        }
    }

    pub fn apply(&mut self, event: &Event) -> Result<(), ViewerError> {
        match event {
            Event::Select(id) => match self {
                AnyViewer::Flow(v) => v.select_diagram(id)?,
                AnyViewer::Plant(v) => v.select_diagram(id)?,
            },
            Event::Toggle(id) => match self {
                AnyViewer::Flow(v) => v.toggle_node(id)?,
                AnyViewer::Plant(v) => v.toggle_node(id)?,
            },
            Event::Collapse => match self {
                AnyViewer::Flow(v) => v.collapse(),
                AnyViewer::Plant(v) => v.collapse(),
            },
            Event::ZoomIn => self.plant(event)?.zoom_in(),
            Event::ZoomOut => self.plant(event)?.zoom_out(),
            Event::Zoom(percent) => self.plant(event)?.set_zoom(*percent),
            Event::RotateClockwise => self.plant(event)?.rotate_clockwise(),
            Event::RotateCounterClockwise => self.plant(event)?.rotate_counter_clockwise(),
            Event::Reset => self.plant(event)?.reset_view(),
        }
        Ok(())
    }

    fn plant(&mut self, event: &Event) -> Result<&mut Viewer<'c, PlantViewer>, ViewerError> {
        match self {
            AnyViewer::Plant(v) => Ok(v),
            AnyViewer::Flow(_) => Err(ViewerError::Unsupported {
                viewer: FlowDiagram::NAME,
                control: event.control_name(),
            }),
        }
    }
}

impl Event {
    fn control_name(&self) -> &'static str {
        match self {
            Event::Select(_) => "select",
            Event::Toggle(_) => "toggle",
            Event::Collapse => "collapse",
            Event::ZoomIn => "zoom-in",
            Event::ZoomOut => "zoom-out",
            Event::Zoom(_) => "zoom",
            Event::RotateClockwise => "rotate-cw",
            Event::RotateCounterClockwise => "rotate-ccw",
            Event::Reset => "reset",
        }
    }
}

/// Parse an event script: one event per line, `#` comments, blank lines
/// ignored. Events come back with their one-based line numbers.
pub fn parse_script(input: &str) -> Result<Vec<(usize, Event)>, ScriptError> {
    let mut events = Vec::new();
    for (i, line) in input.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event = parse_event(trimmed).map_err(|_| ScriptError::Syntax {
            line: i + 1,
            context: error_context(trimmed),
        })?;
        events.push((i + 1, event));
    }
    Ok(events)
}

/// Parse a single event such as `toggle digester`.
pub fn parse_event(line: &str) -> Result<Event, ScriptError> {
    let mut input = line.trim();
    let parsed = (event, space0, eof).parse_next(&mut input);
    parsed.map(|(e, _, _)| e).map_err(|_| ScriptError::Syntax {
        line: 1,
        context: error_context(line),
    })
}

/// Apply every event in `input` to `viewer`.
///
/// Events the viewer rejects are skipped with a warning, the way a host
/// ignores requests that cannot come from its own controls. With `strict`
/// the first rejection aborts instead. Returns the number of events applied.
pub fn run_script(viewer: &mut AnyViewer<'_>, input: &str, strict: bool) -> Result<usize, ScriptError> {
    let mut applied = 0;
    for (line, event) in parse_script(input)? {
        match viewer.apply(&event) {
            Ok(()) => applied += 1,
            Err(source) if strict => return Err(ScriptError::Rejected { line, source }),
            Err(e) => warn!(line, error = %e, "ignoring rejected event"),
        }
    }
    Ok(applied)
}

fn event(input: &mut &str) -> winnow::Result<Event> {
    alt((
        target_event("select").map(Event::Select),
        target_event("toggle").map(Event::Toggle),
        "collapse".value(Event::Collapse),
        "zoom-in".value(Event::ZoomIn),
        "zoom-out".value(Event::ZoomOut),
        zoom_to.map(Event::Zoom),
        "rotate-cw".value(Event::RotateClockwise),
        "rotate-ccw".value(Event::RotateCounterClockwise),
        "reset".value(Event::Reset),
    ))
    .parse_next(input)
}

fn target_event(keyword: &'static str) -> impl FnMut(&mut &str) -> winnow::Result<String> {
    move |input: &mut &str| {
        literal(keyword).parse_next(input)?;
        space1.parse_next(input)?;
        let id = take_while(1.., |c: char| c.is_alphanumeric() || c == '-' || c == '_')
            .parse_next(input)?;
        Ok(id.to_string())
    }
}

fn zoom_to(input: &mut &str) -> winnow::Result<u32> {
    "zoom".parse_next(input)?;
    space1.parse_next(input)?;
    let digits = digit1.parse_next(input)?;
    // Absurd slider values saturate like any other out-of-range zoom.
    Ok(digits.parse::<u32>().unwrap_or(u32::MAX))
}
