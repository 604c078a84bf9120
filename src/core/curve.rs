//! Rollen-typisierte kubische Bézier-Kurven zwischen Species und Reaction.

use super::arrowhead;
use super::geometry::{self, Rect};
use super::reaction::RxnRole;
use glam::{Affine2, Vec2};

/// Darstellungs-Skalierung der Pfeilspitzen (Einheitsrahmen → Weltkoordinaten).
pub const ARROWHEAD_SCALE: f32 = 10.0;

/// Kurven-Variante; bestimmt Anker-Seiten, Kontrollpunkt-Politik und Pfeilspitze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxnCurveType {
    Substrate,
    Product,
    Activator,
    Inhibitor,
    Modifier,
}

impl RxnCurveType {
    /// true, wenn der Species-Node am Kurvenanfang liegt
    /// (alle Varianten außer Product).
    pub fn node_at_start(&self) -> bool {
        !matches!(self, RxnCurveType::Product)
    }

    /// Repräsentative Rolle für die Pfeilspitzen-Auswahl.
    pub fn representative_role(&self) -> RxnRole {
        match self {
            RxnCurveType::Substrate => RxnRole::Substrate,
            RxnCurveType::Product => RxnRole::Product,
            RxnCurveType::Activator => RxnRole::Activator,
            RxnCurveType::Inhibitor => RxnRole::Inhibitor,
            RxnCurveType::Modifier => RxnRole::Modifier,
        }
    }
}

/// Eine Kurve einer Reaction zu einem ihrer Species.
///
/// `s`/`e` sind Start und Ende, `c1`/`c2` die Kontrollpunkte — alles in
/// lokalen Koordinaten der besitzenden Reaction. `node_index` referenziert
/// den Species-Node im Netzwerk-Arena (Anker: für Product am Ende, sonst am
/// Anfang; der jeweils andere Anker ist der Reaction-Centroid).
#[derive(Debug, Clone)]
pub struct RxnCurve {
    pub role: RxnCurveType,
    pub s: Vec2,
    pub e: Vec2,
    pub c1: Vec2,
    pub c2: Vec2,
    pub node_index: Option<u64>,
}

/// Pfeilspitze in Weltkoordinaten, fertig zum Zeichnen.
#[derive(Debug, Clone)]
pub struct Arrowhead {
    pub verts: Vec<Vec2>,
    pub filled: bool,
}

impl RxnCurve {
    pub fn new(role: RxnCurveType, node_index: Option<u64>) -> Self {
        Self {
            role,
            s: Vec2::ZERO,
            e: Vec2::ZERO,
            c1: Vec2::ZERO,
            c2: Vec2::ZERO,
            node_index,
        }
    }

    /// Verweist die Kurve auf diesen Node?
    pub fn includes(&self, node_index: u64) -> bool {
        self.node_index == Some(node_index)
    }

    /// Kurvenpunkt bei `t ∈ [0,1]`.
    pub fn position(&self, t: f32) -> Vec2 {
        geometry::cubic_bezier(self.s, self.c1, self.c2, self.e, t)
    }

    /// Tangentenrichtung bei `t` (unnormiert).
    pub fn tangent(&self, t: f32) -> Vec2 {
        geometry::cubic_bezier_tangent(self.s, self.c1, self.c2, self.e, t)
    }

    /// Endpunkt auf der Node-Seite.
    pub fn node_side(&self) -> Vec2 {
        if self.role.node_at_start() {
            self.s
        } else {
            self.e
        }
    }

    pub fn set_node_side(&mut self, p: Vec2) {
        if self.role.node_at_start() {
            self.s = p;
        } else {
            self.e = p;
        }
    }

    /// Kontrollpunkt auf der Node-Seite.
    pub fn node_side_cp(&self) -> Vec2 {
        if self.role.node_at_start() {
            self.c1
        } else {
            self.c2
        }
    }

    pub fn set_node_side_cp(&mut self, p: Vec2) {
        if self.role.node_at_start() {
            self.c1 = p;
        } else {
            self.c2 = p;
        }
    }

    /// Kontrollpunkt auf der Reaction-Seite (beim Control-Centroid).
    pub fn centroid_cp(&self) -> Vec2 {
        if self.role.node_at_start() {
            self.c2
        } else {
            self.c1
        }
    }

    /// Kontrollpunkte in Weltkoordinaten unter der Transformation der
    /// besitzenden Reaction.
    pub fn transformed(&self, tf: &Affine2) -> [Vec2; 4] {
        [
            tf.transform_point2(self.s),
            tf.transform_point2(self.c1),
            tf.transform_point2(self.c2),
            tf.transform_point2(self.e),
        ]
    }

    /// Kürzt die Kurve vorne (nahe `e`) auf die erste Box-Kante.
    ///
    /// Schnitte mit `t < cutoff` werden ignoriert, damit die Kurve nicht
    /// kollabiert, wenn auch der Start in der Box liegt.
    /// Gibt `true` zurück, wenn gekürzt wurde.
    pub fn clip_forward_to(&mut self, b: &Rect, cutoff: f32) -> bool {
        let ts = geometry::cubic_rect_intersections(self.s, self.c1, self.c2, self.e, b);
        let Some(&t) = ts.last() else {
            return false;
        };
        if t < cutoff || t >= 1.0 {
            return false;
        }
        let (left, _) = geometry::split_cubic(self.s, self.c1, self.c2, self.e, t);
        [self.s, self.c1, self.c2, self.e] = left;
        true
    }

    /// Kürzt die Kurve hinten (nahe `s`) auf die letzte Box-Kante.
    pub fn clip_reverse_to(&mut self, b: &Rect, cutoff: f32) -> bool {
        let ts = geometry::cubic_rect_intersections(self.s, self.c1, self.c2, self.e, b);
        let Some(&t) = ts.first() else {
            return false;
        };
        if t > 1.0 - cutoff || t <= 0.0 {
            return false;
        }
        let (_, right) = geometry::split_cubic(self.s, self.c1, self.c2, self.e, t);
        [self.s, self.c1, self.c2, self.e] = right;
        true
    }

    /// Hat die Kurve unter dem aktuellen Rollen-Stil eine sichtbare Pfeilspitze?
    pub fn has_arrowhead(&self) -> bool {
        let style = arrowhead::style_for_role(self.role.representative_role());
        arrowhead::style(style).map_or(false, |s| !s.verts.is_empty())
    }

    /// Pfeilspitze am Kurvenende, ausgerichtet an der Endtangente.
    ///
    /// Der lokale Rahmen der Vertex-Tabelle (+y zurück in die Kurve) wird an
    /// `e` verankert; bei degenerierter Endtangente dient die Sehne `s → e`
    /// als Richtung.
    pub fn arrowhead(&self) -> Arrowhead {
        let style_index = arrowhead::style_for_role(self.role.representative_role());
        let Some(style) = arrowhead::style(style_index) else {
            return Arrowhead {
                verts: Vec::new(),
                filled: false,
            };
        };

        let mut dir = self.tangent(1.0);
        if dir.length_squared() < 1e-6 {
            dir = self.e - self.s;
        }
        let back = -dir.normalize_or_zero();
        let perp = Vec2::new(-back.y, back.x);

        Arrowhead {
            verts: style
                .verts
                .iter()
                .map(|v| self.e + (perp * v.x + back * v.y) * ARROWHEAD_SCALE)
                .collect(),
            filled: style.filled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straightish(role: RxnCurveType) -> RxnCurve {
        let mut c = RxnCurve::new(role, Some(0));
        c.s = Vec2::new(0.0, 0.0);
        c.c1 = Vec2::new(50.0, 0.0);
        c.c2 = Vec2::new(150.0, 0.0);
        c.e = Vec2::new(200.0, 0.0);
        c
    }

    #[test]
    fn node_side_depends_on_role() {
        let sub = straightish(RxnCurveType::Substrate);
        assert_eq!(sub.node_side(), sub.s);
        assert_eq!(sub.node_side_cp(), sub.c1);
        assert_eq!(sub.centroid_cp(), sub.c2);

        let prd = straightish(RxnCurveType::Product);
        assert_eq!(prd.node_side(), prd.e);
        assert_eq!(prd.node_side_cp(), prd.c2);
        assert_eq!(prd.centroid_cp(), prd.c1);
    }

    #[test]
    fn clip_forward_stops_at_box_edge() {
        let mut c = straightish(RxnCurveType::Product);
        // Node-Box um das Kurvenende
        let b = Rect::new(Vec2::new(160.0, -20.0), Vec2::new(240.0, 20.0));
        assert!(c.clip_forward_to(&b, 0.1));
        assert!((c.e.x - 160.0).abs() < 0.5, "Ende auf der Box-Kante erwartet");
        assert_eq!(c.s, Vec2::ZERO, "Start bleibt unverändert");
    }

    #[test]
    fn clip_reverse_stops_at_box_edge() {
        let mut c = straightish(RxnCurveType::Substrate);
        let b = Rect::new(Vec2::new(-40.0, -20.0), Vec2::new(40.0, 20.0));
        assert!(c.clip_reverse_to(&b, 0.1));
        assert!((c.s.x - 40.0).abs() < 0.5, "Start auf der Box-Kante erwartet");
        assert_eq!(c.e, Vec2::new(200.0, 0.0), "Ende bleibt unverändert");
    }

    #[test]
    fn clip_ignores_cuts_below_cutoff() {
        let mut c = straightish(RxnCurveType::Product);
        // Box deckt fast die ganze Kurve ab → Schnitt bei t ≈ 0.05
        let b = Rect::new(Vec2::new(10.0, -20.0), Vec2::new(240.0, 20.0));
        assert!(!c.clip_forward_to(&b, 0.1), "Schnitt unterhalb des Cutoffs");
        assert_eq!(c.e, Vec2::new(200.0, 0.0));
    }

    #[test]
    fn product_arrowhead_points_along_travel() {
        let c = straightish(RxnCurveType::Product);
        let a = c.arrowhead();
        assert!(!a.verts.is_empty());
        assert!(a.filled);
        // Spitze liegt am Endpunkt
        assert!((a.verts[0] - c.e).length() < 1e-3);
        // übrige Ecken liegen hinter dem Endpunkt (entgegen der Laufrichtung)
        assert!(a.verts[1].x < c.e.x);
    }

    #[test]
    fn substrate_has_no_arrowhead_by_default() {
        let c = straightish(RxnCurveType::Substrate);
        assert!(!c.has_arrowhead());
        assert!(c.arrowhead().verts.is_empty());
    }
}
