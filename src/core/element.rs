//! Gemeinsamer Zustand aller Netzwerk-Elemente (Species, Reaction, Compartment).

use super::geometry::{self, Rect};
use glam::{Affine2, Vec2};

/// Art eines Netzwerk-Elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Species,
    Reaction,
    Compartment,
}

/// Form eines Elements für Distanz- und Kraftberechnung.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementShape {
    /// Rund (Reaction-Junctions)
    Round,
    /// Rechteckig (Species-Nodes, Compartments)
    Box,
}

/// Koordinatensystem für Centroid-Abfragen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordSystem {
    /// Wie gespeichert
    Local,
    /// Durch die Element-Transformation abgebildet
    Global,
}

/// Referenz auf ein Element im Netzwerk-Arena (Art + stabiler Index).
///
/// Ersetzt die rohen Element-Zeiger der klassischen Darstellung: Curves und
/// Compartments verweisen über `ElementRef` statt über Pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementRef {
    pub kind: ElementKind,
    pub index: u64,
}

impl ElementRef {
    pub fn species(index: u64) -> Self {
        Self {
            kind: ElementKind::Species,
            index,
        }
    }

    pub fn reaction(index: u64) -> Self {
        Self {
            kind: ElementKind::Reaction,
            index,
        }
    }

    pub fn compartment(index: u64) -> Self {
        Self {
            kind: ElementKind::Compartment,
            index,
        }
    }
}

/// Gemeinsamer Kern von Species, Reaction und Compartment.
///
/// Hält Identität, Position, Ausdehnung, Kraft-Akkumulator und die
/// Element-Transformation. Invarianten:
/// - `itf` ist stets die Inverse von `tf`
/// - `centroid` ist in lokalen Koordinaten gespeichert
/// - `extents` ist um den Centroid zentriert
#[derive(Debug, Clone)]
pub struct ElementCore {
    /// Modell-Identifier (eindeutig innerhalb der Element-Art)
    pub id: String,
    /// Anzeigename (darf leer sein)
    pub name: String,
    /// Glyph-Identifier (netzwerkweit eindeutig über alle Nodes)
    pub glyph: String,
    kind: ElementKind,
    pub shape: ElementShape,
    /// Stabiler Arena-Index; für Species zugleich der Modell-Index
    pub index: u64,
    centroid: Vec2,
    centroid_set: bool,
    /// Kraft-Akkumulator, wird pro Iteration zurückgesetzt
    velocity: Vec2,
    pub extents: Rect,
    pub tf: Affine2,
    pub itf: Affine2,
    locked: bool,
    /// Globaler Grad (Anzahl Species-Referenzen über alle Reactions)
    pub degree: u32,
    /// Grad innerhalb der dem Netzwerk bekannten Reactions
    pub local_degree: u32,
}

impl ElementCore {
    pub fn new(kind: ElementKind, shape: ElementShape) -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            glyph: String::new(),
            kind,
            shape,
            index: 0,
            centroid: Vec2::ZERO,
            centroid_set: false,
            velocity: Vec2::ZERO,
            extents: Rect::default(),
            tf: Affine2::IDENTITY,
            itf: Affine2::IDENTITY,
            locked: false,
            degree: 0,
            local_degree: 0,
        }
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn is_centroid_set(&self) -> bool {
        self.centroid_set
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Setzt den Kraft-Akkumulator zurück.
    pub fn reset_activity(&mut self) {
        self.velocity = Vec2::ZERO;
    }

    /// Akkumuliert eine Kraft.
    pub fn add_delta(&mut self, d: Vec2) {
        self.velocity += d;
    }

    /// Begrenzt die akkumulierte Kraft auf `cap`.
    pub fn cap_delta(&mut self, cap: f32) {
        self.velocity = geometry::cap_magnitude(self.velocity, cap);
    }

    /// Begrenzt die akkumulierte Kraft über das Längenquadrat.
    pub fn cap_delta2(&mut self, cap2: f32) {
        self.velocity = geometry::cap_magnitude2(self.velocity, cap2);
    }

    /// Bewegt den Centroid um `scale` entlang der normierten Kraft.
    ///
    /// Gesperrte Elemente und verschwindende Kräfte (|v|² ≤ 1e-6) sind No-ops.
    pub fn do_motion(&mut self, scale: f32) {
        if self.locked {
            return;
        }
        if self.velocity.length_squared() > 1e-6 {
            self.centroid += self.velocity.normalize() * scale;
            self.recalc_extents();
        }
    }

    /// Setzt den Centroid, ohne das `centroid_set`-Flag zu berühren
    /// (Centroid-Neuberechnung von Reactions).
    pub(crate) fn set_centroid_raw(&mut self, p: Vec2) {
        self.centroid = p;
        self.recalc_extents();
    }

    pub(crate) fn mark_centroid_set(&mut self) {
        self.centroid_set = true;
    }

    /// Setzt den Centroid in lokalen Koordinaten und zentriert die Extents neu.
    pub fn set_centroid(&mut self, p: Vec2) {
        self.centroid = p;
        self.centroid_set = true;
        self.recalc_extents();
    }

    /// Setzt den Centroid aus globalen Koordinaten (wendet `itf` an).
    pub fn set_global_centroid(&mut self, p: Vec2) {
        self.set_centroid(self.itf.transform_point2(p));
    }

    /// Verschiebt den Centroid, ohne das `centroid_set`-Flag zu ändern.
    pub fn apply_displacement(&mut self, d: Vec2) {
        self.centroid += d;
        self.recalc_extents();
    }

    pub fn centroid(&self, coord: CoordSystem) -> Vec2 {
        match coord {
            CoordSystem::Local => self.centroid,
            CoordSystem::Global => self.tf.transform_point2(self.centroid),
        }
    }

    /// Setzt die Transformation; `itf` wird als Inverse mitgeführt.
    pub fn set_transform(&mut self, tf: Affine2) {
        self.tf = tf;
        self.itf = tf.inverse();
    }

    pub fn width(&self) -> f32 {
        self.extents.width()
    }

    pub fn height(&self) -> f32 {
        self.extents.height()
    }

    /// Radius für runde Elemente (halbe Breite der Extents).
    pub fn radius(&self) -> f32 {
        self.extents.width() * 0.5
    }

    pub fn min(&self) -> Vec2 {
        self.extents.min
    }

    pub fn max(&self) -> Vec2 {
        self.extents.max
    }

    pub fn bounding_box(&self) -> Rect {
        self.extents
    }

    /// Zentriert die Extents um den aktuellen Centroid (Größe bleibt).
    pub fn recalc_extents(&mut self) {
        let half = Vec2::new(self.extents.width(), self.extents.height()) * 0.5;
        self.extents = Rect::around(self.centroid, half);
    }

    /// Setzt die Breite; die Extents bleiben um den Centroid zentriert.
    pub fn set_size(&mut self, w: f32, h: f32) {
        self.extents = Rect::around(self.centroid, Vec2::new(w, h) * 0.5);
    }

    /// Distanz zweier Elemente.
    ///
    /// Zwei runde Elemente: Centroid-Abstand minus beide Radien (≥ 0).
    /// Sonst: Allen-Distanz pro Achse, euklidisch kombiniert.
    pub fn distance(&self, other: &ElementCore) -> f32 {
        if self.shape == ElementShape::Round && other.shape == ElementShape::Round {
            let r = self.centroid.distance(other.centroid) - self.radius() - other.radius();
            r.max(0.0)
        } else {
            let u = geometry::allen_dist(self.min().x, self.max().x, other.min().x, other.max().x);
            let v = geometry::allen_dist(self.min().y, self.max().y, other.min().y, other.max().y);
            (u * u + v * v).sqrt()
        }
    }

    pub fn overlaps(&self, other: &ElementCore) -> bool {
        self.distance(other) == 0.0
    }

    /// Einheitsvektor, der dieses Element von `other` wegdrückt.
    pub fn force_vec(&self, other: &ElementCore) -> Vec2 {
        if (self.shape == ElementShape::Round && other.shape == ElementShape::Round)
            || self.overlaps(other)
        {
            // bei Überlappung über die Centroids abstoßen
            (self.centroid - other.centroid).normalize_or_zero()
        } else {
            let u =
                -geometry::allen_ordered(self.min().x, self.max().x, other.min().x, other.max().x);
            let v =
                -geometry::allen_ordered(self.min().y, self.max().y, other.min().y, other.max().y);
            Vec2::new(u, v).normalize_or_zero()
        }
    }
}
