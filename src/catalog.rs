use std::collections::HashSet;

use tracing::info;

use crate::catalog_parser::{CatalogDecl, parse_catalog};
use crate::diagram::{Diagram, DiagramNode, DiagramSummary};
use crate::error::{CatalogError, ViewerError};

const PROCESS_FLOWS: &str = include_str!("../catalogs/process_flows.catalog");
const PLANT_DESIGNS: &str = include_str!("../catalogs/plant_designs.catalog");

/// A validated, read-only set of diagrams.
///
/// Built once and then only borrowed: viewers hold `&Catalog` and nothing
/// hands out mutable access to the diagrams.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    name: String,
    default_id: String,
    diagrams: Vec<Diagram>,
}

impl Catalog {
    /// The dashboard's process flows (RNG, power, fertilizer, RDF).
    pub fn process_flows() -> Result<Self, CatalogError> {
        Self::parse(PROCESS_FLOWS)
    }

    /// The plant layouts shown in the design viewer.
    pub fn plant_designs() -> Result<Self, CatalogError> {
        Self::parse(PLANT_DESIGNS)
    }

    pub fn parse(input: &str) -> Result<Self, CatalogError> {
        let catalog = Self::from_decl(parse_catalog(input)?)?;
        info!(
            catalog = %catalog.name,
            diagrams = catalog.diagrams.len(),
            "loaded diagram catalog"
        );
        Ok(catalog)
    }

    pub fn from_decl(decl: CatalogDecl) -> Result<Self, CatalogError> {
        let CatalogDecl {
            name,
            default,
            diagrams,
        } = decl;

        if diagrams.is_empty() {
            return Err(CatalogError::Empty(name));
        }

        let mut seen = HashSet::new();
        for diagram in &diagrams {
            if !seen.insert(diagram.id.as_str()) {
                return Err(CatalogError::DuplicateDiagram(diagram.id.clone()));
            }
            validate_diagram(diagram)?;
        }

        let default_id = match default {
            Some(id) if seen.contains(id.as_str()) => id,
            Some(id) => return Err(CatalogError::UnknownDefault(id)),
            None => diagrams[0].id.clone(),
        };

        Ok(Self {
            name,
            default_id,
            diagrams,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_diagram_id(&self) -> &str {
        &self.default_id
    }

    pub fn list_diagrams(&self) -> Vec<DiagramSummary> {
        self.diagrams
            .iter()
            .map(|d| DiagramSummary {
                id: d.id.clone(),
                title: d.title.clone(),
            })
            .collect()
    }

    pub fn get_diagram(&self, id: &str) -> Result<&Diagram, ViewerError> {
        self.diagrams
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| ViewerError::DiagramNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.diagrams.iter().any(|d| d.id == id)
    }

    pub fn diagrams(&self) -> &[Diagram] {
        &self.diagrams
    }
}

/// Largest coordinate or extent a node may use, in diagram units.
pub const MAX_EXTENT: f64 = 100_000.0;

fn validate_diagram(diagram: &Diagram) -> Result<(), CatalogError> {
    let mut node_ids = HashSet::new();
    for node in &diagram.nodes {
        if !node_ids.insert(node.id.as_str()) {
            return Err(CatalogError::DuplicateNode {
                diagram: diagram.id.clone(),
                node: node.id.clone(),
            });
        }
        validate_geometry(diagram, node)?;
    }

    for edge in &diagram.edges {
        if !node_ids.contains(edge.from.as_str()) || !node_ids.contains(edge.to.as_str()) {
            return Err(CatalogError::DanglingEdge {
                diagram: diagram.id.clone(),
                from: edge.from.clone(),
                to: edge.to.clone(),
            });
        }
    }
    Ok(())
}

fn validate_geometry(diagram: &Diagram, node: &DiagramNode) -> Result<(), CatalogError> {
    let invalid = |field: &'static str, value: f64| CatalogError::InvalidGeometry {
        diagram: diagram.id.clone(),
        node: node.id.clone(),
        field,
        value,
    };

    for (field, value) in [("x", node.position.x), ("y", node.position.y)] {
        if !value.is_finite() || value.abs() > MAX_EXTENT {
            return Err(invalid(field, value));
        }
    }
    if let Some(size) = node.size {
        for (field, value) in [("width", size.width), ("height", size.height)] {
            if !value.is_finite() || value <= 0.0 || value > MAX_EXTENT {
                return Err(invalid(field, value));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(catalog: &Catalog) -> Vec<String> {
        catalog.list_diagrams().into_iter().map(|s| s.id).collect()
    }

    #[test]
    fn process_flows_load_in_tab_order() {
        let catalog = Catalog::process_flows().unwrap();
        assert_eq!(ids(&catalog), vec!["rng", "power", "fertilizer", "rdf"]);
        assert_eq!(catalog.default_diagram_id(), "rng");
    }

    #[test]
    fn process_flows_are_six_step_chains() {
        let catalog = Catalog::process_flows().unwrap();
        for diagram in catalog.diagrams() {
            assert_eq!(diagram.nodes.len(), 6, "{}", diagram.id);
            assert_eq!(diagram.edges.len(), 5, "{}", diagram.id);
            assert!(diagram.nodes.iter().all(|n| n.size.is_none()));
        }
    }

    #[test]
    fn plant_designs_carry_sizes_and_summaries() {
        let catalog = Catalog::plant_designs().unwrap();
        assert_eq!(
            ids(&catalog),
            vec!["anaerobic-digestion", "rdf-production", "power-generation"]
        );
        assert_eq!(catalog.default_diagram_id(), "anaerobic-digestion");
        for diagram in catalog.diagrams() {
            assert!(diagram.summary.is_some());
            assert!(diagram.edges.is_empty());
            assert!(diagram.nodes.iter().all(|n| n.size.is_some()));
        }
    }

    #[test]
    fn multi_line_description_is_joined() {
        let catalog = Catalog::plant_designs().unwrap();
        let digester = catalog
            .get_diagram("anaerobic-digestion")
            .unwrap()
            .node("digester")
            .unwrap();
        assert_eq!(
            digester.description,
            "Patented high-efficiency digester where organic material is broken down by microorganisms in the absence of oxygen."
        );
    }

    #[test]
    fn get_diagram_unknown_id() {
        let catalog = Catalog::process_flows().unwrap();
        assert_eq!(
            catalog.get_diagram("nope"),
            Err(ViewerError::DiagramNotFound("nope".into()))
        );
    }

    #[test]
    fn missing_default_uses_first_diagram() {
        let catalog = Catalog::parse("catalog c\ndiagram b \"B\"\nend\ndiagram a \"A\"\nend\n").unwrap();
        assert_eq!(catalog.default_diagram_id(), "b");
    }

    #[test]
    fn rejects_empty_catalog() {
        assert_eq!(
            Catalog::parse("catalog c\n"),
            Err(CatalogError::Empty("c".into()))
        );
    }

    #[test]
    fn rejects_duplicate_diagram() {
        let err = Catalog::parse("catalog c\ndiagram a \"A\"\nend\ndiagram a \"A2\"\nend\n")
            .unwrap_err();
        assert_eq!(err, CatalogError::DuplicateDiagram("a".into()));
    }

    #[test]
    fn rejects_duplicate_node() {
        let err = Catalog::parse(
            "catalog c\ndiagram a \"A\"\n  node n \"N\" at 0,0\n  node n \"N\" at 1,1\nend\n",
        )
        .unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateNode {
                diagram: "a".into(),
                node: "n".into()
            }
        );
    }

    #[test]
    fn rejects_dangling_edge() {
        let err = Catalog::parse(
            "catalog c\ndiagram a \"A\"\n  node n \"N\" at 0,0\n  edge n -> ghost\nend\n",
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::DanglingEdge { .. }), "got: {err}");
    }

    #[test]
    fn rejects_non_positive_size() {
        let err = Catalog::parse(
            "catalog c\ndiagram a \"A\"\n  node n \"N\" at 0,0 size -5x10\nend\n",
        )
        .unwrap_err();
        assert_eq!(
            err,
            CatalogError::InvalidGeometry {
                diagram: "a".into(),
                node: "n".into(),
                field: "width",
                value: -5.0
            }
        );
    }

    #[test]
    fn accepts_geometry_at_the_limit() {
        let source = format!(
            "catalog c\ndiagram a \"A\"\n  node n \"N\" at -{MAX_EXTENT},{MAX_EXTENT} size {MAX_EXTENT}x1\nend\n"
        );
        assert!(Catalog::parse(&source).is_ok());
    }

    #[test]
    fn rejects_unknown_default() {
        let err = Catalog::parse("catalog c\ndefault z\ndiagram a \"A\"\nend\n").unwrap_err();
        assert_eq!(err, CatalogError::UnknownDefault("z".into()));
    }
}
