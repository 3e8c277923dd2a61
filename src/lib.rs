pub mod ascii_renderer;
pub mod catalog;
pub mod catalog_parser;
pub mod diagram;
pub mod draw;
pub mod error;
pub mod impact;
pub mod script;
pub mod text;
pub mod viewer;

pub use catalog::Catalog;
pub use error::{CatalogError, Error, ScriptError, ViewerError};
pub use script::{AnyViewer, Event, ViewerName};
pub use viewer::{FlowDiagram, PlantViewer, SelectionState, Viewer, ViewerKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewOptions {
    /// Maximum output width in columns.
    pub max_width: Option<usize>,
    /// Fail on the first event the viewer rejects instead of skipping it.
    pub strict: bool,
}

/// Replay `script` on a fresh viewer and render the resulting view.
///
/// `catalog_source` replaces the viewer's built-in catalog when given.
pub fn render_view(
    name: ViewerName,
    catalog_source: Option<&str>,
    script: &str,
) -> Result<String, Error> {
    render_view_with_options(name, catalog_source, script, ViewOptions::default())
}

pub fn render_view_with_options(
    name: ViewerName,
    catalog_source: Option<&str>,
    script: &str,
    options: ViewOptions,
) -> Result<String, Error> {
    let catalog = match catalog_source {
        Some(source) => Catalog::parse(source)?,
        None => name.builtin_catalog()?,
    };
    let mut viewer = AnyViewer::new(name, &catalog);
    script::run_script(&mut viewer, script, options.strict)?;
    let list = viewer.draw()?;
    Ok(ascii_renderer::render_with_options(&list, options.max_width))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_flow_default_view() {
        let output = render_view(ViewerName::Flow, None, "").unwrap();
        assert!(output.starts_with("Renewable Natural Gas (RNG) Production"));
        assert!(output.contains("│ Waste Collection │"));
    }

    #[test]
    fn render_plant_view_has_transform_header() {
        let output = render_view(ViewerName::Plant, None, "zoom-in\nrotate-ccw\n").unwrap();
        assert!(output.contains("Zoom: 110%  Rotation: 270°"), "{output}");
    }

    #[test]
    fn render_custom_catalog() {
        let catalog = "catalog mine\ndiagram only \"Only One\"\n  node n \"Node\" at 0,0\nend\n";
        let output = render_view(ViewerName::Flow, Some(catalog), "toggle n").unwrap();
        assert!(output.starts_with("Only One"));
        assert!(output.contains("┃ Node"), "{output}");
    }

    #[test]
    fn render_bad_catalog_returns_error() {
        let err = render_view(ViewerName::Flow, Some("nonsense"), "").unwrap_err();
        assert!(matches!(err, Error::Catalog(CatalogError::Syntax { .. })), "got: {err}");
    }

    #[test]
    fn strict_option_surfaces_rejected_event() {
        let options = ViewOptions {
            strict: true,
            ..ViewOptions::default()
        };
        let err = render_view_with_options(ViewerName::Flow, None, "zoom-in", options).unwrap_err();
        assert!(err.to_string().contains("not supported"), "got: {err}");
    }
}
