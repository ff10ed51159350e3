use classmap::config::MapConfig;
use classmap::map::MapView;
use classmap::map::camera::Viewport;
use classmap::map::cluster::{ClusterParams, compute_layout};
use classmap::map::interaction::{MapController, MapEvent, PointerInput, Scene};
use classmap::map::loader::{Dataset, demo_dataset};
use classmap::map::marker::{ClassroomMarker, ViewerMarker};
use classmap::map::projection::GeoPoint;
use classmap::map::relevance::{Relevance, relevance};
use classmap::map::renderer::{DrawCommand, Theme};
use egui::{Vec2, pos2, vec2};

const CONTAINER: Vec2 = vec2(1000.0, 1000.0);

fn london_viewer() -> ViewerMarker {
    ViewerMarker::new("Riverside", Some(GeoPoint::new(51.5074, -0.1278)))
        .with_interests(["Math"])
        .with_hours("Mon", [9])
}

/// Two markers 5 px apart at zoom 1 in a 1000 px container
fn close_pair() -> Vec<ClassroomMarker> {
    vec![
        ClassroomMarker::new("a", "A", GeoPoint::new(0.0, 0.0)),
        ClassroomMarker::new("b", "B", GeoPoint::new(0.0, 1.8)),
    ]
}

#[test]
fn perfect_match_for_same_hour_and_interest() {
    let candidate = ClassroomMarker::new("c", "Paris", GeoPoint::new(48.8566, 2.3522))
        .with_interests(["Math"])
        .with_hours("Mon", [9]);
    assert_eq!(relevance(&london_viewer(), &candidate), Relevance::Perfect);
}

#[test]
fn close_pair_clusters_at_zoom_one() {
    let markers = close_pair();
    let params = ClusterParams::default();
    let layout = compute_layout(&markers, &Viewport::default(), CONTAINER, 0.0, &params);
    assert_eq!(layout.clusters.len(), 1);
    assert_eq!(layout.clusters[0].members.len(), 2);
    assert!(layout.individuals.is_empty());
}

#[test]
fn close_pair_splits_at_zoom_three() {
    let markers = close_pair();
    let viewport = Viewport::new(3.0, Vec2::ZERO);
    let params = ClusterParams::default();
    let layout = compute_layout(&markers, &viewport, CONTAINER, 0.0, &params);
    assert!(layout.clusters.is_empty());
    assert_eq!(layout.individuals.len(), 2);
}

#[test]
fn click_just_outside_tolerance_selects_nothing() {
    let markers = vec![ClassroomMarker::new("a", "A", GeoPoint::new(0.0, 0.0))];
    let scene = Scene {
        markers: &markers,
        container: CONTAINER,
    };
    let mut controller = MapController::new(&MapConfig::default());
    assert_eq!(controller.handle(PointerInput::Click(pos2(500.0, 513.0)), &scene), None);
    assert_eq!(controller.selected(), None);
}

#[test]
fn drag_zoom_click_session() {
    let mut view = MapView::new(&MapConfig::default(), demo_dataset(), Theme::Light);
    view.resize(CONTAINER);

    view.handle_input(PointerInput::Down(pos2(400.0, 400.0)));
    view.handle_input(PointerInput::Move(pos2(450.0, 380.0)));
    view.handle_input(PointerInput::Up);
    assert_eq!(view.viewport().offset, vec2(50.0, -20.0));

    for _ in 0..5 {
        view.handle_input(PointerInput::Wheel {
            pos: pos2(500.0, 300.0),
            zoom_in: true,
        });
    }
    assert!(view.zoom_percent() > 150);

    // Click exactly on a classroom's unwrapped position
    let target = view.classrooms()[0].clone();
    let plane = classmap::map::projection::to_plane(target.geo);
    let at = view.viewport().to_screen(plane, CONTAINER, 0.0);
    let event = view.handle_input(PointerInput::Click(at));
    assert_eq!(event, Some(MapEvent::MarkerSelected(target.clone())));
    assert_eq!(view.selected_classroom().map(|c| c.id.clone()), Some(target.id));

    let commands = view.frame(1.0);
    assert!(commands.iter().any(|c| matches!(c, DrawCommand::DashedLine { .. })));
}

#[test]
fn empty_map_still_renders() {
    let config = MapConfig {
        show_legend: false,
        ..MapConfig::default()
    };
    let mut view = MapView::new(&config, Dataset::default(), Theme::Dark);
    view.resize(CONTAINER);
    let commands = view.frame(0.0);
    assert!(matches!(commands[0], DrawCommand::Clear(_)));
    assert!(!commands.iter().any(|c| matches!(c, DrawCommand::Circle { .. })));

    let mut zero = MapView::new(&MapConfig::default(), demo_dataset(), Theme::Light);
    zero.resize(Vec2::ZERO);
    for command in zero.frame(0.0) {
        if let DrawCommand::Circle { center, radius, .. } = command {
            assert!(center.x.is_finite() && center.y.is_finite() && radius.is_finite());
        }
    }
}

#[test]
fn viewer_without_location_matches_nothing_on_screen() {
    let matching = ClassroomMarker::new("a", "A", GeoPoint::new(0.0, 0.0))
        .with_interests(["Math"])
        .with_hours("Mon", [9]);
    let unlocated = ViewerMarker::new("New", None)
        .with_interests(["Math"])
        .with_hours("Mon", [9]);
    assert_eq!(relevance(&unlocated, &matching), Relevance::Perfect);

    let dataset = Dataset {
        viewer: Some(unlocated),
        classrooms: vec![matching],
    };
    let mut view = MapView::new(&MapConfig::default(), dataset, Theme::Light);
    view.resize(CONTAINER);
    let commands = view.frame(0.0);
    assert_eq!(view.relevance_of("a"), Some(Relevance::None));
    assert!(!commands.iter().any(|c| matches!(c, DrawCommand::DashedLine { .. })));

    // Placing the viewer turns scoring on
    let located = view.viewer().map(|v| ViewerMarker {
        geo: Some(GeoPoint::new(51.5074, -0.1278)),
        ..v.clone()
    });
    view.set_viewer(located);
    view.frame(0.1);
    assert_eq!(view.relevance_of("a"), Some(Relevance::Perfect));
}
