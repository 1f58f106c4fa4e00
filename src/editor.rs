use crate::types::{Point, Quad};

/// Canvas width is capped so large photos don't blow up the layout.
pub const MAX_DISPLAY_WIDTH: f64 = 800.0;
/// Grab radius around a corner marker, in display pixels.
pub const POINT_RADIUS: f64 = 12.0;

const POLYGON_FILL: &str = "rgba(59, 130, 246, 0.2)";
const POLYGON_STROKE: &str = "#3b82f6";
const POLYGON_STROKE_WIDTH: f64 = 3.0;
const MARKER_FILL: &str = "#ef4444";
const MARKER_STROKE: &str = "#ffffff";
const MARKER_STROKE_WIDTH: f64 = 2.0;
const LABEL_COLOR: &str = "#ffffff";
const LABEL_FONT: &str = "bold 12px sans-serif";

/// On-screen placement of the canvas, re-measured by the host on every
/// layout pass. Never cached inside the editor so corner positions stay
/// correct across resizes.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub container_width: f64,
    /// Canvas top-left corner in client (page) coordinates.
    pub origin_x: f64,
    pub origin_y: f64,
}

impl Viewport {
    pub fn new(container_width: f64, origin_x: f64, origin_y: f64) -> Self {
        Viewport {
            container_width,
            origin_x,
            origin_y,
        }
    }

    fn is_usable(&self) -> bool {
        self.container_width.is_finite()
            && self.container_width > 0.0
            && self.origin_x.is_finite()
            && self.origin_y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging(usize),
}

/// Backend-agnostic drawing instruction. Coordinates are display-space
/// pixels relative to the canvas top-left.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Source image scaled to the full display size.
    DrawImage { width: f64, height: f64 },
    FillPolygon {
        points: Vec<Point>,
        color: &'static str,
    },
    StrokePolygon {
        points: Vec<Point>,
        color: &'static str,
        line_width: f64,
    },
    FillCircle {
        center: Point,
        radius: f64,
        color: &'static str,
    },
    StrokeCircle {
        center: Point,
        radius: f64,
        color: &'static str,
        line_width: f64,
    },
    FillText {
        text: String,
        at: Point,
        color: &'static str,
        font: &'static str,
    },
}

/// Thin adapter the host implements over its actual drawing backend
/// (2D canvas context, test recorder, ...).
pub trait Surface {
    fn apply(&mut self, command: &DrawCommand);
}

/// Replay a command list onto a surface.
pub fn present<S: Surface>(surface: &mut S, commands: &[DrawCommand]) {
    for command in commands {
        surface.apply(command);
    }
}

/// Fallback quad when automated edge detection is unavailable: a rectangle
/// inset 10% from each image edge.
pub fn default_quad(image_width: f64, image_height: f64) -> Quad {
    let inset_x = image_width * 0.1;
    let inset_y = image_height * 0.1;
    [
        Point::new(inset_x, inset_y),
        Point::new(image_width - inset_x, inset_y),
        Point::new(image_width - inset_x, image_height - inset_y),
        Point::new(inset_x, image_height - inset_y),
    ]
}

/// Interactive four-corner editor for framing a document inside a photo.
///
/// Corner positions are stored in source-image pixel space; the display
/// transform is derived from the viewport on every call. All operations are
/// total: a missing or degenerate viewport turns transforms and rendering
/// into no-ops instead of failing, so a transient layout race can never
/// crash the host.
pub struct QuadEditor {
    image_width: f64,
    image_height: f64,
    initial: Quad,
    points: Quad,
    drag: DragState,
}

impl QuadEditor {
    pub fn new(image_width: f64, image_height: f64, initial: Quad) -> Self {
        QuadEditor {
            image_width,
            image_height,
            initial,
            points: initial,
            drag: DragState::Idle,
        }
    }

    /// Current corners in image space, ready for submission downstream.
    pub fn points(&self) -> &Quad {
        &self.points
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    /// Canvas size for the given viewport: width capped at
    /// [`MAX_DISPLAY_WIDTH`], aspect ratio preserved from the source image.
    pub fn display_size(&self, viewport: &Viewport) -> Option<(f64, f64)> {
        if !viewport.is_usable()
            || !self.image_width.is_finite()
            || !self.image_height.is_finite()
            || self.image_width <= 0.0
            || self.image_height <= 0.0
        {
            return None;
        }
        let width = viewport.container_width.min(MAX_DISPLAY_WIDTH);
        let height = width * (self.image_height / self.image_width);
        Some((width, height))
    }

    pub fn image_to_display(&self, p: Point, viewport: &Viewport) -> Option<Point> {
        let (width, height) = self.display_size(viewport)?;
        Some(Point::new(
            p.x * (width / self.image_width),
            p.y * (height / self.image_height),
        ))
    }

    pub fn client_to_display(&self, client: Point, viewport: &Viewport) -> Option<Point> {
        self.display_size(viewport)?;
        Some(Point::new(
            client.x - viewport.origin_x,
            client.y - viewport.origin_y,
        ))
    }

    pub fn client_to_image(&self, client: Point, viewport: &Viewport) -> Option<Point> {
        let (width, height) = self.display_size(viewport)?;
        Some(Point::new(
            (client.x - viewport.origin_x) * (self.image_width / width),
            (client.y - viewport.origin_y) * (self.image_height / height),
        ))
    }

    /// Press: grab the corner whose marker is under the pointer, if any.
    /// When several corners sit within the radius, the later-iterated one
    /// wins; callers should keep corners at least two radii apart.
    pub fn begin_drag(&mut self, client: Point, viewport: &Viewport) -> Option<usize> {
        let pointer = self.client_to_display(client, viewport)?;
        let mut grabbed = None;
        for (index, corner) in self.points.iter().enumerate() {
            let marker = self.image_to_display(*corner, viewport)?;
            if marker.distance_to(pointer) < POINT_RADIUS {
                grabbed = Some(index);
            }
        }
        if let Some(index) = grabbed {
            self.drag = DragState::Dragging(index);
        }
        grabbed
    }

    /// Move: overwrite the dragged corner in image space. No-op while idle.
    /// Self-intersecting quads are permitted; consumers see the raw corners.
    pub fn update_drag(&mut self, client: Point, viewport: &Viewport) {
        if let DragState::Dragging(index) = self.drag {
            if let Some(p) = self.client_to_image(client, viewport) {
                self.points[index] = p;
            }
        }
    }

    /// Release (or pointer-leave while pressed): always back to idle.
    pub fn end_drag(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Restore the originally supplied quad.
    pub fn reset(&mut self) {
        self.points = self.initial;
        self.drag = DragState::Idle;
    }

    /// Produce the full redraw for the current state: scaled image, then the
    /// quad as a translucent filled and stroked polygon, then numbered
    /// corner markers. Pure; the host re-invokes it after every state or
    /// layout change. An unusable viewport yields no commands.
    pub fn render(&self, viewport: &Viewport) -> Vec<DrawCommand> {
        let (width, height) = match self.display_size(viewport) {
            Some(size) => size,
            None => return Vec::new(),
        };

        let mut commands = vec![DrawCommand::DrawImage { width, height }];

        let scale_x = width / self.image_width;
        let scale_y = height / self.image_height;
        let scaled: Vec<Point> = self
            .points
            .iter()
            .map(|p| Point::new(p.x * scale_x, p.y * scale_y))
            .collect();

        commands.push(DrawCommand::FillPolygon {
            points: scaled.clone(),
            color: POLYGON_FILL,
        });
        commands.push(DrawCommand::StrokePolygon {
            points: scaled.clone(),
            color: POLYGON_STROKE,
            line_width: POLYGON_STROKE_WIDTH,
        });

        for (index, marker) in scaled.into_iter().enumerate() {
            commands.push(DrawCommand::FillCircle {
                center: marker,
                radius: POINT_RADIUS,
                color: MARKER_FILL,
            });
            commands.push(DrawCommand::StrokeCircle {
                center: marker,
                radius: POINT_RADIUS,
                color: MARKER_STROKE,
                line_width: MARKER_STROKE_WIDTH,
            });
            commands.push(DrawCommand::FillText {
                text: (index + 1).to_string(),
                at: Point::new(marker.x, marker.y + 4.0),
                color: LABEL_COLOR,
                font: LABEL_FONT,
            });
        }

        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_editor() -> QuadEditor {
        QuadEditor::new(
            100.0,
            100.0,
            [
                Point::new(10.0, 10.0),
                Point::new(90.0, 10.0),
                Point::new(90.0, 90.0),
                Point::new(10.0, 90.0),
            ],
        )
    }

    #[test]
    fn display_width_is_capped_and_aspect_preserved() {
        let editor = QuadEditor::new(1600.0, 1200.0, default_quad(1600.0, 1200.0));
        let (w, h) = editor
            .display_size(&Viewport::new(1000.0, 0.0, 0.0))
            .unwrap();
        assert_eq!((w, h), (800.0, 600.0));

        let (w, h) = editor.display_size(&Viewport::new(400.0, 0.0, 0.0)).unwrap();
        assert_eq!(w, 400.0);
        assert!((h / w - 1200.0 / 1600.0).abs() < 1e-9);
    }

    #[test]
    fn image_display_roundtrip_is_lossless() {
        let editor = QuadEditor::new(1000.0, 750.0, default_quad(1000.0, 750.0));
        let viewport = Viewport::new(500.0, 13.5, 7.25);
        let original = Point::new(123.4, 321.0);

        let display = editor.image_to_display(original, &viewport).unwrap();
        let client = Point::new(display.x + viewport.origin_x, display.y + viewport.origin_y);
        let back = editor.client_to_image(client, &viewport).unwrap();

        assert!((back.x - original.x).abs() < 1e-9);
        assert!((back.y - original.y).abs() < 1e-9);
    }

    #[test]
    fn pointer_on_marker_selects_that_corner() {
        let mut editor = sample_editor();
        let viewport = Viewport::new(50.0, 0.0, 0.0);
        // Corner 0 at image (10,10) -> display (5,5).
        assert_eq!(editor.begin_drag(Point::new(5.0, 5.0), &viewport), Some(0));
        assert_eq!(editor.drag_state(), DragState::Dragging(0));
    }

    #[test]
    fn pointer_far_from_all_markers_selects_none() {
        let mut editor = sample_editor();
        let viewport = Viewport::new(50.0, 0.0, 0.0);
        assert_eq!(editor.begin_drag(Point::new(30.0, 30.0), &viewport), None);
        assert_eq!(editor.drag_state(), DragState::Idle);
    }

    #[test]
    fn later_corner_wins_on_overlapping_markers() {
        let mut editor = QuadEditor::new(
            100.0,
            100.0,
            [
                Point::new(50.0, 50.0),
                Point::new(52.0, 50.0),
                Point::new(90.0, 90.0),
                Point::new(10.0, 90.0),
            ],
        );
        // Container 100 -> display scale 1; pointer sits within the radius
        // of both corner 0 and corner 1.
        let viewport = Viewport::new(100.0, 0.0, 0.0);
        assert_eq!(editor.begin_drag(Point::new(51.0, 50.0), &viewport), Some(1));
    }

    #[test]
    fn drag_moves_one_corner_and_reset_restores_it() {
        let mut editor = sample_editor();
        let viewport = Viewport::new(50.0, 0.0, 0.0);

        assert_eq!(editor.begin_drag(Point::new(5.0, 5.0), &viewport), Some(0));
        // Client (10,10) on the 50x50 canvas maps to image (20,20).
        editor.update_drag(Point::new(10.0, 10.0), &viewport);
        editor.end_drag();

        assert_eq!(editor.points()[0], Point::new(20.0, 20.0));
        assert_eq!(editor.points()[1], Point::new(90.0, 10.0));
        assert_eq!(editor.points()[2], Point::new(90.0, 90.0));
        assert_eq!(editor.points()[3], Point::new(10.0, 90.0));
        assert_eq!(editor.drag_state(), DragState::Idle);

        editor.reset();
        assert_eq!(editor.points()[0], Point::new(10.0, 10.0));
    }

    #[test]
    fn update_drag_is_noop_while_idle() {
        let mut editor = sample_editor();
        let viewport = Viewport::new(50.0, 0.0, 0.0);
        editor.update_drag(Point::new(10.0, 10.0), &viewport);
        assert_eq!(editor.points()[0], Point::new(10.0, 10.0));
    }

    #[test]
    fn end_drag_is_unconditional() {
        let mut editor = sample_editor();
        editor.end_drag();
        assert_eq!(editor.drag_state(), DragState::Idle);
    }

    #[test]
    fn degenerate_viewport_degrades_to_noops() {
        let mut editor = sample_editor();
        for viewport in [
            Viewport::new(0.0, 0.0, 0.0),
            Viewport::new(-10.0, 0.0, 0.0),
            Viewport::new(f64::NAN, 0.0, 0.0),
            Viewport::new(50.0, f64::NAN, 0.0),
        ] {
            assert!(editor.display_size(&viewport).is_none());
            assert!(editor.client_to_image(Point::new(5.0, 5.0), &viewport).is_none());
            assert!(editor.render(&viewport).is_empty());
            assert_eq!(editor.begin_drag(Point::new(5.0, 5.0), &viewport), None);
            editor.update_drag(Point::new(5.0, 5.0), &viewport);
            assert_eq!(editor.points()[0], Point::new(10.0, 10.0));
        }
    }

    #[test]
    fn render_draws_image_polygon_and_numbered_markers() {
        let editor = sample_editor();
        let viewport = Viewport::new(50.0, 0.0, 0.0);
        let commands = editor.render(&viewport);

        assert_eq!(
            commands[0],
            DrawCommand::DrawImage {
                width: 50.0,
                height: 50.0
            }
        );
        match &commands[1] {
            DrawCommand::FillPolygon { points, .. } => {
                assert_eq!(points[0], Point::new(5.0, 5.0));
                assert_eq!(points.len(), 4);
            }
            other => panic!("expected polygon fill, got {:?}", other),
        }

        let labels: Vec<&str> = commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::FillText { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, ["1", "2", "3", "4"]);

        let circles = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::FillCircle { .. }))
            .count();
        assert_eq!(circles, 4);
    }

    #[test]
    fn render_replays_onto_a_surface() {
        struct Recorder(Vec<DrawCommand>);
        impl Surface for Recorder {
            fn apply(&mut self, command: &DrawCommand) {
                self.0.push(command.clone());
            }
        }

        let editor = sample_editor();
        let commands = editor.render(&Viewport::new(50.0, 0.0, 0.0));
        let mut recorder = Recorder(Vec::new());
        present(&mut recorder, &commands);
        assert_eq!(recorder.0.len(), commands.len());
    }

    #[test]
    fn default_quad_is_inset_ten_percent() {
        let quad = default_quad(200.0, 100.0);
        assert_eq!(quad[0], Point::new(20.0, 10.0));
        assert_eq!(quad[2], Point::new(180.0, 90.0));
    }
}
