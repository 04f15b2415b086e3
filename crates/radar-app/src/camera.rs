//! Camera policy and marker rendering for the partner map.
//!
//! [`camera_command`] decides between flying to one partner and framing the
//! whole visible set. [`MapSync`] remembers what was last drawn so that
//! markers and camera only move when something relevant changed.

use std::time::Duration;

use radar_core::{Bounds, Business, Coordinates};

pub const POINT_ZOOM: u8 = 17;
pub const POINT_DURATION: Duration = Duration::from_millis(1500);
pub const BOUNDS_PADDING: u32 = 60;
pub const RECENTER_PADDING: u32 = 40;
pub const BOUNDS_DURATION: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, PartialEq)]
pub enum CameraCommand {
    FlyToPoint {
        target: Coordinates,
        zoom: u8,
        duration: Duration,
    },
    FlyToBounds {
        bounds: Bounds,
        padding: u32,
        duration: Duration,
    },
    NoOp,
}

impl CameraCommand {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        matches!(self, CameraCommand::NoOp)
    }
}

fn fit(visible: &[Business], padding: u32) -> CameraCommand {
    Bounds::from_points(visible.iter().map(Business::coordinates)).map_or(
        CameraCommand::NoOp,
        |bounds| CameraCommand::FlyToBounds {
            bounds,
            padding,
            duration: BOUNDS_DURATION,
        },
    )
}

/// Fly to the selected partner, else frame every visible partner.
///
/// An empty visible set with no selection yields [`CameraCommand::NoOp`].
#[must_use]
pub fn camera_command(selected: Option<&Business>, visible: &[Business]) -> CameraCommand {
    match selected {
        Some(partner) => CameraCommand::FlyToPoint {
            target: partner.coordinates(),
            zoom: POINT_ZOOM,
            duration: POINT_DURATION,
        },
        None => fit(visible, BOUNDS_PADDING),
    }
}

/// Explicit "center map": frames the visible set with tighter padding.
#[must_use]
pub fn recenter_command(visible: &[Business]) -> CameraCommand {
    fit(visible, RECENTER_PADDING)
}

/// Draw instruction for one partner pin.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: String,
    pub name: String,
    pub logo: String,
    pub position: Coordinates,
    pub premium: bool,
    pub selected: bool,
    pub scale: f32,
    pub pulse: bool,
}

#[must_use]
pub fn render_markers(visible: &[Business], selected_id: Option<&str>) -> Vec<Marker> {
    visible
        .iter()
        .map(|b| {
            let selected = selected_id == Some(b.id.as_str());
            Marker {
                id: b.id.clone(),
                name: b.name.clone(),
                logo: b.logo.clone(),
                position: b.coordinates(),
                premium: b.is_premium,
                selected,
                scale: if selected { 1.25 } else { 1.0 },
                pulse: selected,
            }
        })
        .collect()
}

/// Output of one [`MapSync::sync`] pass. `None` markers means keep the
/// current layer.
#[derive(Debug, Clone, PartialEq)]
pub struct MapFrame {
    pub markers: Option<Vec<Marker>>,
    pub camera: CameraCommand,
}

#[derive(Debug, Default)]
pub struct MapSync {
    drawn_ids: Option<Vec<String>>,
    drawn_selection: Option<String>,
    framed_ids: Option<Vec<String>>,
}

impl MapSync {
    /// Compares `visible` and `selected` with the previous pass.
    ///
    /// Markers are rebuilt when the ids (membership or order) or the
    /// selection changed. The camera moves when the visible set is non-empty
    /// and its ids changed since the last camera move, a selection is active,
    /// or a selection was just cleared.
    pub fn sync(&mut self, visible: &[Business], selected: Option<&Business>) -> MapFrame {
        let ids: Vec<String> = visible.iter().map(|b| b.id.clone()).collect();
        let selected_id = selected.map(|b| b.id.clone());

        let ids_redrawn = self.drawn_ids.as_ref() != Some(&ids);
        let just_cleared = self.drawn_selection.is_some() && selected_id.is_none();
        let markers = (ids_redrawn || self.drawn_selection != selected_id)
            .then(|| render_markers(visible, selected_id.as_deref()));
        self.drawn_selection = selected_id;

        let mut camera = CameraCommand::NoOp;
        if !visible.is_empty() {
            let ids_changed = self.framed_ids.as_ref() != Some(&ids);
            if ids_changed || selected.is_some() || just_cleared {
                camera = camera_command(selected, visible);
            }
            self.framed_ids = Some(ids.clone());
        }
        self.drawn_ids = Some(ids);

        MapFrame { markers, camera }
    }
}

#[cfg(test)]
mod tests {
    use radar_core::{PartnerStatus, Sector};

    use super::*;

    fn partner(id: &str, x: f64, y: f64) -> Business {
        Business {
            id: id.to_string(),
            name: format!("Partner {id}"),
            sector: Sector::Industrial,
            category: String::new(),
            description: String::new(),
            address: String::new(),
            city: String::new(),
            office_phone: String::new(),
            whatsapp: None,
            email: None,
            website: None,
            services: vec![],
            gallery: vec![],
            x,
            y,
            rating: 5.0,
            reliability: 100,
            status: PartnerStatus::Active,
            logo: format!("https://example.com/{id}.png"),
            is_premium: false,
            industrial_capacity: None,
            view_count: None,
            lead_count: None,
        }
    }

    fn abc() -> Vec<Business> {
        vec![
            partner("A", 22.10, -101.00),
            partner("B", 22.20, -100.90),
            partner("C", 22.15, -100.95),
        ]
    }

    #[test]
    fn selection_flies_to_its_coordinate() {
        let visible = abc();
        let cmd = camera_command(Some(&visible[1]), &visible);
        assert_eq!(
            cmd,
            CameraCommand::FlyToPoint {
                target: Coordinates::new(22.20, -100.90),
                zoom: 17,
                duration: Duration::from_millis(1500),
            }
        );
    }

    #[test]
    fn no_selection_frames_exactly_the_visible_set() {
        let visible = abc();
        match camera_command(None, &visible) {
            CameraCommand::FlyToBounds {
                bounds,
                padding,
                duration,
            } => {
                assert_eq!(padding, 60);
                assert_eq!(duration, Duration::from_millis(2000));
                assert!((bounds.south - 22.10).abs() < 1e-9);
                assert!((bounds.north - 22.20).abs() < 1e-9);
                assert!((bounds.west - -101.00).abs() < 1e-9);
                assert!((bounds.east - -100.90).abs() < 1e-9);
                for b in &visible {
                    assert!(bounds.contains(b.coordinates()));
                }
            }
            other => panic!("expected bounds, got {other:?}"),
        }
    }

    #[test]
    fn empty_visible_set_is_noop() {
        assert!(camera_command(None, &[]).is_noop());
        assert!(recenter_command(&[]).is_noop());
    }

    #[test]
    fn recenter_uses_tighter_padding() {
        match recenter_command(&abc()) {
            CameraCommand::FlyToBounds { padding, .. } => assert_eq!(padding, 40),
            other => panic!("expected bounds, got {other:?}"),
        }
    }

    #[test]
    fn selected_marker_is_distinguished() {
        let markers = render_markers(&abc(), Some("B"));
        assert_eq!(markers.len(), 3);
        let selected: Vec<&Marker> = markers.iter().filter(|m| m.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "B");
        assert!(selected[0].pulse);
        assert!(selected[0].scale > 1.0);
        assert!(markers
            .iter()
            .filter(|m| !m.selected)
            .all(|m| !m.pulse && (m.scale - 1.0).abs() < f32::EPSILON));
    }

    #[test]
    fn first_sync_frames_and_draws() {
        let mut sync = MapSync::default();
        let frame = sync.sync(&abc(), None);
        assert_eq!(frame.markers.map(|m| m.len()), Some(3));
        assert!(matches!(frame.camera, CameraCommand::FlyToBounds { .. }));
    }

    #[test]
    fn unchanged_set_without_selection_does_not_move() {
        let mut sync = MapSync::default();
        sync.sync(&abc(), None);
        let frame = sync.sync(&abc(), None);
        assert!(frame.markers.is_none());
        assert!(frame.camera.is_noop());
    }

    #[test]
    fn reordered_set_redraws_and_reframes() {
        let mut sync = MapSync::default();
        sync.sync(&abc(), None);
        let mut reversed = abc();
        reversed.reverse();
        let frame = sync.sync(&reversed, None);
        assert!(frame.markers.is_some());
        assert!(matches!(frame.camera, CameraCommand::FlyToBounds { .. }));
    }

    #[test]
    fn active_selection_always_recenters() {
        let mut sync = MapSync::default();
        let visible = abc();
        sync.sync(&visible, Some(&visible[0]));
        let frame = sync.sync(&visible, Some(&visible[0]));
        assert!(frame.markers.is_none(), "nothing to redraw");
        assert!(matches!(frame.camera, CameraCommand::FlyToPoint { .. }));
    }

    #[test]
    fn clearing_selection_frames_bounds() {
        let mut sync = MapSync::default();
        let visible = abc();
        sync.sync(&visible, Some(&visible[2]));
        let frame = sync.sync(&visible, None);
        assert!(frame.markers.is_some(), "selected style must be removed");
        assert!(matches!(frame.camera, CameraCommand::FlyToBounds { .. }));
    }

    #[test]
    fn empty_set_clears_markers_but_keeps_viewport() {
        let mut sync = MapSync::default();
        sync.sync(&abc(), None);
        let frame = sync.sync(&[], None);
        assert_eq!(frame.markers, Some(vec![]));
        assert!(frame.camera.is_noop());

        // The same set coming back is already framed.
        let frame = sync.sync(&abc(), None);
        assert!(frame.markers.is_some());
        assert!(frame.camera.is_noop());
    }
}
