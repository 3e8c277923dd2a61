use pretty_assertions::assert_eq;
use wte_viewer::diagram::*;
use wte_viewer::draw;
use wte_viewer::viewer::{MAX_ZOOM, MIN_ZOOM};
use wte_viewer::{Catalog, FlowDiagram, PlantViewer, SelectionState, Viewer, ViewerError};

fn flows() -> Catalog {
    Catalog::process_flows().unwrap()
}

fn plants() -> Catalog {
    Catalog::plant_designs().unwrap()
}

// =============================================================================
// Catalog
// =============================================================================

#[test]
fn catalog_is_stable_across_lookups() {
    for catalog in [flows(), plants()] {
        for summary in catalog.list_diagrams() {
            let first = catalog.get_diagram(&summary.id).unwrap().clone();
            let second = catalog.get_diagram(&summary.id).unwrap();
            assert_eq!(&first, second);
            assert_eq!(first.id, summary.id);
            assert_eq!(first.title, summary.title);
        }
    }
}

#[test]
fn catalog_unchanged_by_viewer_activity() {
    let catalog = flows();
    let before = catalog.clone();
    let mut viewer = Viewer::<FlowDiagram>::new(&catalog);
    viewer.toggle_node("biogas-capture").unwrap();
    viewer.select_diagram("fertilizer").unwrap();
    viewer.toggle_node("nutrient-recovery").unwrap();
    viewer.draw().unwrap();
    assert_eq!(catalog, before);
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn select_diagram_always_clears_expansion() {
    let catalog = flows();
    let mut viewer = Viewer::<FlowDiagram>::new(&catalog);
    for id in ["rng", "power", "fertilizer", "rdf", "rdf"] {
        viewer.toggle_node("waste-collection").unwrap();
        viewer.select_diagram(id).unwrap();
        assert_eq!(viewer.state().active_diagram_id, id);
        assert_eq!(viewer.state().expanded_node_id, None);
    }
}

#[test]
fn toggle_twice_restores_expansion() {
    let catalog = plants();
    let mut viewer = Viewer::<PlantViewer>::new(&catalog);

    let before = viewer.state().clone();
    viewer.toggle_node("digestate").unwrap();
    viewer.toggle_node("digestate").unwrap();
    assert_eq!(viewer.state(), &before);

    viewer.toggle_node("upgrading").unwrap();
    let before = viewer.state().clone();
    viewer.toggle_node("digester").unwrap();
    assert_eq!(viewer.state().expanded_node_id.as_deref(), Some("digester"));
    viewer.toggle_node("digester").unwrap();
    assert_eq!(viewer.state().expanded_node_id, None);
    assert_ne!(viewer.state(), &before);
}

#[test]
fn zoom_saturates_at_bounds() {
    let catalog = plants();
    let mut viewer = Viewer::<PlantViewer>::new(&catalog);
    for _ in 0..20 {
        viewer.zoom_in();
        assert!(viewer.state().zoom <= MAX_ZOOM);
    }
    assert_eq!(viewer.state().zoom, 200);

    viewer.reset_view();
    for _ in 0..20 {
        viewer.zoom_out();
        assert!(viewer.state().zoom >= MIN_ZOOM);
    }
    assert_eq!(viewer.state().zoom, 50);
}

#[test]
fn four_clockwise_turns_display_as_default() {
    let catalog = plants();
    let mut viewer = Viewer::<PlantViewer>::new(&catalog);
    let default_draw = viewer.draw().unwrap();
    for _ in 0..4 {
        viewer.rotate_clockwise();
    }
    assert_eq!(viewer.state().rotation, 360);
    assert_eq!(viewer.state().display_rotation(), 0);
    assert_eq!(viewer.draw().unwrap(), default_draw);
}

#[test]
fn node_ids_do_not_carry_across_diagrams() {
    let catalog = flows();
    let mut viewer = Viewer::<FlowDiagram>::new(&catalog);
    viewer.select_diagram("rng").unwrap();
    viewer.toggle_node("anaerobic-digestion").unwrap();
    viewer.select_diagram("power").unwrap();

    assert!(catalog.get_diagram("power").unwrap().contains_node("anaerobic-digestion"));
    assert_eq!(viewer.state().active_diagram_id, "power");
    assert_eq!(viewer.state().expanded_node_id, None);
}

#[test]
fn unknown_diagram_leaves_state_untouched() {
    let catalog = plants();
    let mut viewer = Viewer::<PlantViewer>::new(&catalog);
    viewer.select_diagram("power-generation").unwrap();
    viewer.toggle_node("generators").unwrap();
    viewer.zoom_in();
    viewer.rotate_counter_clockwise();
    let before = viewer.state().clone();

    assert_eq!(
        viewer.select_diagram("does-not-exist"),
        Err(ViewerError::DiagramNotFound("does-not-exist".into()))
    );
    assert_eq!(viewer.state(), &before);
}

#[test]
fn unknown_node_leaves_expansion_untouched() {
    let catalog = flows();
    let mut viewer = Viewer::<FlowDiagram>::new(&catalog);
    for diagram in ["rng", "power", "fertilizer", "rdf"] {
        viewer.select_diagram(diagram).unwrap();
        assert!(viewer.toggle_node("not-a-real-node").is_err());
        assert_eq!(viewer.state().expanded_node_id, None);

        viewer.toggle_node("waste-collection").unwrap();
        let err = viewer.toggle_node("not-a-real-node").unwrap_err();
        assert_eq!(
            err,
            ViewerError::NodeNotFound {
                diagram: diagram.into(),
                node: "not-a-real-node".into()
            }
        );
        assert_eq!(
            viewer.state().expanded_node_id.as_deref(),
            Some("waste-collection")
        );
    }
}

#[test]
fn two_viewers_keep_separate_state() {
    let catalog = flows();
    let mut left = Viewer::<FlowDiagram>::new(&catalog);
    let right = Viewer::<FlowDiagram>::new(&catalog);
    left.select_diagram("rdf").unwrap();
    left.toggle_node("drying").unwrap();
    assert_eq!(right.state(), &SelectionState::new("rng"));
}

// =============================================================================
// Renderer
// =============================================================================

#[test]
fn renderer_omits_dangling_edges() {
    let node = |id: &str, x: f64| DiagramNode {
        id: id.into(),
        label: id.into(),
        description: String::new(),
        position: Point::new(x, 100.0),
        size: None,
    };
    let diagram = Diagram {
        id: "broken".into(),
        title: "Broken".into(),
        summary: None,
        nodes: vec![node("a", 50.0), node("b", 200.0)],
        edges: vec![
            DiagramEdge { from: "a".into(), to: "b".into() },
            DiagramEdge { from: "b".into(), to: "missing".into() },
        ],
    };
    let list = draw::derive::<FlowDiagram>(&diagram, &SelectionState::new("broken"));
    assert_eq!(list.nodes.len(), 2);
    assert_eq!(list.connectors.len(), 1);
    assert_eq!(list.connectors[0].from_id, "a");
    assert_eq!(list.connectors[0].to_id, "b");
}

#[test]
fn flow_connectors_follow_catalog_chain() {
    let catalog = flows();
    let viewer = Viewer::<FlowDiagram>::new(&catalog);
    let list = viewer.draw().unwrap();
    assert_eq!(list.connectors.len(), 5);
    for (i, c) in list.connectors.iter().enumerate() {
        let x = 50.0 + 150.0 * i as f64;
        assert_eq!(c.start, Point::new(x + 120.0, 125.0));
        assert_eq!(c.end, Point::new(x + 150.0, 125.0));
        assert!(c.arrowhead);
    }
}

#[test]
fn detail_panel_follows_expansion() {
    let catalog = plants();
    let mut viewer = Viewer::<PlantViewer>::new(&catalog);
    assert_eq!(viewer.draw().unwrap().detail, None);

    viewer.toggle_node("gas-collection").unwrap();
    let detail = viewer.draw().unwrap().detail.unwrap();
    assert_eq!(detail.label, "Biogas Collection System");
    assert_eq!(
        detail.description,
        "Captures and stores biogas produced during the anaerobic digestion process."
    );

    viewer.collapse();
    assert_eq!(viewer.draw().unwrap().detail, None);
}

#[test]
fn plant_zoom_scales_component_boxes() {
    let catalog = plants();
    let mut viewer = Viewer::<PlantViewer>::new(&catalog);
    let base = viewer.draw().unwrap();
    viewer.set_zoom(150);
    let zoomed = viewer.draw().unwrap();
    for (a, b) in base.nodes.iter().zip(&zoomed.nodes) {
        assert!((b.rect.width - a.rect.width * 1.5).abs() < 1e-9);
        assert!((b.rect.height - a.rect.height * 1.5).abs() < 1e-9);
    }
    assert_eq!(zoomed.zoom, Some(150));
}
