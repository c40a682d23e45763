//! Orthogonal wire routing.
//!
//! A deterministic single-detour heuristic, not a shortest-path search. The
//! router tries a Z-shaped path bending at the midpoint of the major axis;
//! when that crosses a padded component box it tries detours running just
//! above or below the boxes next to each endpoint. Clearance is guaranteed
//! only around those endpoint boxes.
//!
//! Routing works in a horizontal frame. Wires whose vertical extent is larger
//! are transposed, routed, and transposed back.

use serde::Serialize;

use crate::config::RouterConfig;
use crate::geometry::{snap, Point, Rect};
use crate::schematic::{Component, Pin, Schematic};

/// Edge of a component a pin sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

/// A routed net ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedWire {
    pub net_id: String,
    pub points: Vec<Point>,
}

/// The component edge closest to the pin. Ties resolve Left, Right, Top,
/// Bottom in that order.
pub fn pin_side(component: &Component, pin: &Pin) -> Side {
    let rel = pin.relative;
    let candidates = [
        (Side::Left, rel.x.abs()),
        (Side::Right, (component.size.width - rel.x).abs()),
        (Side::Top, rel.y.abs()),
        (Side::Bottom, (component.size.height - rel.y).abs()),
    ];
    candidates
        .iter()
        .fold(candidates[0], |best, c| if c.1 < best.1 { *c } else { best })
        .0
}

/// Pin position pushed outward from its component edge by `clearance`.
pub fn wire_anchor(component: &Component, pin: &Pin, clearance: f64) -> Point {
    let offset = match pin_side(component, pin) {
        Side::Left => Point::new(-clearance, 0.0),
        Side::Right => Point::new(clearance, 0.0),
        Side::Top => Point::new(0.0, -clearance),
        Side::Bottom => Point::new(0.0, clearance),
    };
    pin.absolute + offset
}

/// Route a wire between two anchors.
///
/// Returns an empty list for non-finite input, `[start, end]` for short
/// wires, and otherwise an axis-aligned polyline of at most five vertices.
pub fn route(start: Point, end: Point, obstacles: &[Rect], config: &RouterConfig) -> Vec<Point> {
    if !start.is_finite() || !end.is_finite() {
        return Vec::new();
    }

    let dx = end.x - start.x;
    let dy = end.y - start.y;
    if dx.abs() < config.short_wire_threshold && dy.abs() < config.short_wire_threshold {
        return vec![start, end];
    }

    let padded: Vec<Rect> = obstacles
        .iter()
        .map(|r| r.expand(config.obstacle_margin))
        .collect();

    if dx.abs() >= dy.abs() {
        route_horizontal(start, end, &padded, config.grid_size)
    } else {
        let transposed: Vec<Rect> = padded.iter().map(Rect::transpose).collect();
        route_horizontal(start.transpose(), end.transpose(), &transposed, config.grid_size)
            .into_iter()
            .map(Point::transpose)
            .collect()
    }
}

fn route_horizontal(start: Point, end: Point, padded: &[Rect], grid: f64) -> Vec<Point> {
    let mid_x = bend_between(start.x, end.x, grid);
    let direct = candidate(start, end, mid_x, end.y);

    let local = endpoint_obstacles(padded, start, end);
    let mut candidates = vec![direct.clone()];

    if !local.is_empty() {
        let above = local.iter().map(|r| r.top()).fold(f64::INFINITY, f64::min);
        let below = local.iter().map(|r| r.bottom()).fold(f64::NEG_INFINITY, f64::max);
        let (above, below) = if grid > 0.0 {
            ((above / grid).floor() * grid, (below / grid).ceil() * grid)
        } else {
            (above, below)
        };

        let mid_y = (start.y + end.y) / 2.0;
        let mut levels = [above, below];
        if (below - mid_y).abs() < (above - mid_y).abs() {
            levels.swap(0, 1);
        }
        for by in levels {
            for bx in [start.x, mid_x] {
                candidates.push(candidate(start, end, bx, by));
            }
        }
    }

    if let Some(path) = candidates.iter().find(|p| is_clear(p, padded)) {
        return path.clone();
    }
    if let Some(path) = candidates.iter().find(|p| is_clear(p, &local)) {
        return path.clone();
    }
    direct
}

/// Grid-snapped midpoint, kept between the two coordinates.
fn bend_between(a: f64, b: f64, grid: f64) -> f64 {
    let mid = (a + b) / 2.0;
    if grid <= 0.0 {
        return mid;
    }
    snap(mid, grid).clamp(a.min(b), a.max(b))
}

/// start -> (bx, start.y) -> (bx, by) -> (end.x, by) -> end
fn candidate(start: Point, end: Point, bx: f64, by: f64) -> Vec<Point> {
    simplify(vec![
        start,
        Point::new(bx, start.y),
        Point::new(bx, by),
        Point::new(end.x, by),
        end,
    ])
}

/// The padded obstacles nearest each endpoint.
fn endpoint_obstacles(padded: &[Rect], start: Point, end: Point) -> Vec<Rect> {
    let nearest = |p: Point| {
        padded
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.distance_to(p).total_cmp(&b.1.distance_to(p)))
            .map(|(i, _)| i)
    };
    let mut indices: Vec<usize> = [nearest(start), nearest(end)].into_iter().flatten().collect();
    indices.dedup();
    indices.into_iter().map(|i| padded[i]).collect()
}

fn is_clear(path: &[Point], obstacles: &[Rect]) -> bool {
    path.windows(2)
        .all(|seg| obstacles.iter().all(|r| !r.blocks_segment(seg[0], seg[1])))
}

/// Drop repeated points and the middle of any three collinear points.
fn simplify(points: Vec<Point>) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if out.last() == Some(&p) {
            continue;
        }
        while out.len() >= 2 {
            let a = out[out.len() - 2];
            let b = out[out.len() - 1];
            let collinear = (a.x == b.x && b.x == p.x) || (a.y == b.y && b.y == p.y);
            if !collinear {
                break;
            }
            out.pop();
        }
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    out
}

/// Route one net of the schematic. Empty when the net or either pin does not
/// resolve; callers skip drawing in that case.
pub fn route_net(schematic: &Schematic, net_id: &str, config: &RouterConfig) -> Vec<Point> {
    let Some(net) = schematic.net(net_id) else {
        return Vec::new();
    };
    let [a, b] = match net.connections.as_slice() {
        [a, b, ..] => [a, b],
        _ => return Vec::new(),
    };

    let resolve = |r: &crate::schematic::PinRef| {
        let component = schematic.component(&r.component_id)?;
        let pin = component.pin(&r.pin_id)?;
        Some(wire_anchor(component, pin, config.anchor_clearance))
    };
    let (Some(start), Some(end)) = (resolve(a), resolve(b)) else {
        return Vec::new();
    };

    let obstacles: Vec<Rect> = schematic.components().map(|c| c.bounds()).collect();
    route(start, end, &obstacles, config)
}

/// Route every net, skipping those that do not resolve.
pub fn route_all(schematic: &Schematic, config: &RouterConfig) -> Vec<RoutedWire> {
    schematic
        .nets()
        .filter_map(|net| {
            let points = route_net(schematic, &net.id, config);
            if points.is_empty() {
                tracing::debug!("Net {} did not resolve, not drawn", net.id);
                return None;
            }
            Some(RoutedWire {
                net_id: net.id.clone(),
                points,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BuiltinCatalog;
    use crate::schematic::PinRef;

    fn assert_orthogonal(points: &[Point]) {
        for seg in points.windows(2) {
            assert!(
                seg[0].x == seg[1].x || seg[0].y == seg[1].y,
                "segment {:?} -> {:?} is not axis-aligned",
                seg[0],
                seg[1]
            );
        }
    }

    #[test]
    fn test_short_wire_is_direct() {
        let config = RouterConfig::default();
        let a = Point::new(10.0, 10.0);
        let b = Point::new(18.0, 14.0);
        assert_eq!(route(a, b, &[], &config), vec![a, b]);
    }

    #[test]
    fn test_non_finite_is_empty() {
        let config = RouterConfig::default();
        assert!(route(Point::new(f64::NAN, 0.0), Point::new(100.0, 0.0), &[], &config).is_empty());
    }

    #[test]
    fn test_z_shape_when_clear() {
        let config = RouterConfig::default();
        let path = route(Point::new(0.0, 0.0), Point::new(100.0, 40.0), &[], &config);
        assert_eq!(
            path,
            vec![
                Point::new(0.0, 0.0),
                Point::new(50.0, 0.0),
                Point::new(50.0, 40.0),
                Point::new(100.0, 40.0),
            ]
        );
    }

    #[test]
    fn test_straight_line_collapses() {
        let config = RouterConfig::default();
        let path = route(Point::new(0.0, 20.0), Point::new(200.0, 20.0), &[], &config);
        assert_eq!(path, vec![Point::new(0.0, 20.0), Point::new(200.0, 20.0)]);
    }

    #[test]
    fn test_vertical_major_axis() {
        let config = RouterConfig::default();
        let path = route(Point::new(0.0, 0.0), Point::new(30.0, 200.0), &[], &config);
        assert_orthogonal(&path);
        assert_eq!(path[1], Point::new(0.0, 100.0));
        assert_eq!(path.last(), Some(&Point::new(30.0, 200.0)));
    }

    #[test]
    fn test_detour_around_start_component() {
        let config = RouterConfig::default();
        // Wire leaves the left side of a component but the target is to the right.
        let a_box = Rect::new(100.0, 100.0, 60.0, 20.0);
        let b_box = Rect::new(300.0, 100.0, 80.0, 60.0);
        let start = Point::new(90.0, 110.0);
        let end = Point::new(290.0, 120.0);

        let path = route(start, end, &[a_box, b_box], &config);
        assert_orthogonal(&path);
        assert!(path.len() <= 5);
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&end));
        for seg in path.windows(2) {
            for r in [a_box, b_box] {
                let padded = r.expand(config.obstacle_margin);
                assert!(!padded.blocks_segment(seg[0], seg[1]), "{:?} crosses {:?}", seg, padded);
            }
        }
        // The plain Z-shape would have cut straight through the start component.
        assert_ne!(path[1], Point::new(190.0, 110.0));
    }

    #[test]
    fn test_always_orthogonal_for_long_wires() {
        let config = RouterConfig::default();
        let obstacles = [Rect::new(40.0, -30.0, 50.0, 60.0), Rect::new(-80.0, 60.0, 40.0, 40.0)];
        for &(sx, sy, ex, ey) in &[
            (0.0, 0.0, 200.0, 50.0),
            (0.0, 0.0, -150.0, 90.0),
            (10.0, -40.0, 25.0, 180.0),
            (-60.0, 0.0, 130.0, -130.0),
        ] {
            let path = route(Point::new(sx, sy), Point::new(ex, ey), &obstacles, &config);
            assert!(path.len() >= 2 && path.len() <= 5);
            assert_orthogonal(&path);
        }
    }

    #[test]
    fn test_simplify() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
        ];
        assert_eq!(
            simplify(pts),
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 5.0)]
        );
    }

    #[test]
    fn test_wire_anchor_offsets_outward() {
        let catalog = BuiltinCatalog::new();
        let mut sch = Schematic::new();
        let u = sch
            .place_component(&catalog, "opamp", Point::new(300.0, 100.0))
            .unwrap();
        let comp = sch.component(&u).unwrap();

        let anchor = |pin: &str| wire_anchor(comp, comp.pin(pin).unwrap(), 10.0);
        assert_eq!(anchor("in_pos"), Point::new(290.0, 140.0));
        assert_eq!(anchor("out"), Point::new(390.0, 130.0));
        assert_eq!(anchor("v_pos"), Point::new(340.0, 90.0));
        assert_eq!(anchor("v_neg"), Point::new(340.0, 170.0));
    }

    #[test]
    fn test_route_net_and_degenerate() {
        let catalog = BuiltinCatalog::new();
        let config = RouterConfig::default();
        let mut sch = Schematic::new();
        let r = sch
            .place_component(&catalog, "resistor", Point::new(100.0, 100.0))
            .unwrap();
        let u = sch
            .place_component(&catalog, "opamp", Point::new(300.0, 100.0))
            .unwrap();
        let net = sch.create_net(PinRef::new(&r, "2"), PinRef::new(&u, "in_pos"));

        let path = route_net(&sch, &net, &config);
        assert_eq!(path.first(), Some(&Point::new(170.0, 110.0)));
        assert_eq!(path.last(), Some(&Point::new(290.0, 140.0)));
        assert_orthogonal(&path);

        assert!(route_net(&sch, "missing", &config).is_empty());
        assert_eq!(route_all(&sch, &config).len(), 1);
    }
}
