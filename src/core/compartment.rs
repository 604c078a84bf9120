//! Compartment: elastisches Rechteck, das seine Mitglieder einschließt.

use super::element::{ElementCore, ElementKind, ElementRef, ElementShape};
use super::geometry::Rect;
use glam::Vec2;
use rand::Rng;

/// Elastizitätsmodul des Rand-Modells.
pub const COMPARTMENT_E: f32 = 10.0;
/// Rückstell-Koeffizient der elastischen Spannung.
pub const COMPARTMENT_RES: f32 = 0.25;
/// Minimale Kantenlänge nach einem Bewegungsschritt.
pub const MIN_COMPARTMENT_SIDE: f32 = 10.0;
/// Kantenlänge pro √Elementanzahl beim Auto-Sizing.
pub const AUTOSIZE_FACTOR: f32 = 350.0;

/// Ein Compartment mit nicht-besitzenden Element-Referenzen und
/// elastischen Randkräften.
///
/// Die aktuelle Ausdehnung lebt in `core.extents`; `rest_area` ist die
/// Fläche, bei der die Rückstellkräfte verschwinden.
#[derive(Debug, Clone)]
pub struct Compartment {
    pub core: ElementCore,
    elements: Vec<ElementRef>,
    rest_area: f32,
    fx1: f32,
    fy1: f32,
    fx2: f32,
    fy2: f32,
}

impl Compartment {
    pub fn new(id: impl Into<String>, index: u64) -> Self {
        let mut core = ElementCore::new(ElementKind::Compartment, ElementShape::Box);
        core.id = id.into();
        core.index = index;
        Self {
            core,
            elements: Vec::new(),
            rest_area: 0.0,
            fx1: 0.0,
            fy1: 0.0,
            fx2: 0.0,
            fy2: 0.0,
        }
    }

    pub fn index(&self) -> u64 {
        self.core.index
    }

    pub fn id(&self) -> &str {
        &self.core.id
    }

    pub fn elements(&self) -> &[ElementRef] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn add_element(&mut self, e: ElementRef) {
        self.elements.push(e);
    }

    pub fn contains_element(&self, e: ElementRef) -> bool {
        self.elements.contains(&e)
    }

    /// Entfernt eine Element-Referenz; `false`, wenn sie nicht enthalten war.
    pub fn remove_element(&mut self, e: ElementRef) -> bool {
        let before = self.elements.len();
        self.elements.retain(|x| *x != e);
        self.elements.len() < before
    }

    pub fn rest_area(&self) -> f32 {
        self.rest_area
    }

    /// Seitenkräfte (x1, y1, x2, y2) des aktuellen Iterationsschritts.
    pub fn boundary_forces(&self) -> (f32, f32, f32, f32) {
        (self.fx1, self.fy1, self.fx2, self.fy2)
    }

    /// Setzt die aktuelle Ausdehnung; der Centroid folgt dem Mittelpunkt.
    pub fn set_extents(&mut self, ext: Rect) {
        self.core.extents = ext;
        self.core.set_centroid_raw(ext.center());
    }

    /// Setzt die Ziel-Ausdehnung: aktuelle Extents und Ruhefläche zugleich.
    pub fn set_rest_extents(&mut self, ext: Rect) {
        self.set_extents(ext);
        self.rest_area = ext.area();
    }

    /// Umschließende Box aller Mitglieds-Extents plus Polsterung;
    /// wird zur neuen Ruhe-Ausdehnung.
    pub fn resize_enclose(&mut self, member_boxes: &[Rect], padding: f32) {
        let mut iter = member_boxes.iter();
        let Some(first) = iter.next() else {
            return;
        };
        let mut ext = *first;
        for b in iter {
            ext.expand(b);
        }
        self.set_rest_extents(ext.padded(padding));
    }

    /// Quadratische Ausdehnung `350·√N`, zufällig um bis zu 10 Einheiten
    /// verschoben, um Singularitäten im Layout zu vermeiden.
    pub fn auto_size(&mut self) {
        let dim = AUTOSIZE_FACTOR * (self.elements.len() as f32).sqrt();
        let mut rng = rand::thread_rng();
        let shake = Vec2::new(rng.gen_range(0.0..10.0), rng.gen_range(0.0..10.0));
        self.set_rest_extents(Rect::new(shake, shake + Vec2::splat(dim)));
    }

    /// Setzt den Kraft-Akkumulator zurück und berechnet die elastische
    /// Rückstellspannung gegenüber der Ruhefläche.
    ///
    /// Vorzeichen = Vorzeichen der Flächendifferenz; Dehnungsbetrag
    /// `√(|ΔFläche| / Ruhefläche)`. Überdehnt wirken die Kräfte nach innen,
    /// gestaucht nach außen.
    pub fn reset_activity(&mut self) {
        self.core.reset_activity();
        let w = self.core.extents.width();
        let h = self.core.extents.height();
        let d2 = self.core.extents.area() - self.rest_area;
        let strain = if self.rest_area > f32::EPSILON {
            d2.signum() * (d2.abs() / self.rest_area).sqrt()
        } else {
            0.0
        };
        self.fx1 = COMPARTMENT_RES * COMPARTMENT_E * strain * w;
        self.fy1 = COMPARTMENT_RES * COMPARTMENT_E * strain * h;
        self.fx2 = -COMPARTMENT_RES * COMPARTMENT_E * strain * w;
        self.fy2 = -COMPARTMENT_RES * COMPARTMENT_E * strain * h;
    }

    /// Addiert externe Beiträge auf die vier Seitenkräfte.
    pub fn apply_boundary_force(&mut self, fx1: f32, fy1: f32, fx2: f32, fy2: f32) {
        self.fx1 += fx1;
        self.fy1 += fy1;
        self.fx2 += fx2;
        self.fy2 += fy2;
    }

    /// Exponentielle Wand-Abstoßung für ein enthaltenes Element.
    ///
    /// Jede der vier Wände drückt mit `f·exp((Wand − Elementkante)/t)` nach
    /// innen; die Gegenkräfte gehen auf die Seitenkräfte und den
    /// Centroid-Akkumulator des Compartments.
    pub fn do_internal_force(&mut self, e: &mut ElementCore, f: f32, t: f32) {
        let x1 = self.core.extents.min.x;
        let y1 = self.core.extents.min.y;
        let x2 = self.core.extents.max.x;
        let y2 = self.core.extents.max.y;
        let invt = 1.0 / t;

        let fx1 = f * ((x1 - e.min().x) * invt).exp();
        let fx2 = -f * ((e.max().x - x2) * invt).exp();
        let fy1 = f * ((y1 - e.min().y) * invt).exp();
        let fy2 = -f * ((e.max().y - y2) * invt).exp();

        e.add_delta(Vec2::new(fx1 + fx2, fy1 + fy2));

        self.apply_boundary_force(-fx1, -fy1, -fx2, -fy2);
        self.core.add_delta(-Vec2::new(fx1 + fx2, fy1 + fy2));
    }

    /// Verschiebt beide Ecken nach dem Hooke-Modell
    /// (Kräfte → Spannung → Dehnung → Verschiebung) und hält die
    /// Mindestgröße ein.
    pub fn do_motion(&mut self, scale_in: f32) {
        if self.core.is_locked() {
            return;
        }
        let scale = 0.2 * scale_in;
        let w = self.core.extents.width();
        let h = self.core.extents.height();
        let wh = if h > f32::EPSILON { w / h } else { 1.0 };
        let hw = if w > f32::EPSILON { h / w } else { 1.0 };
        let v = self.core.velocity();

        let mut ext = self.core.extents;
        ext.min += (scale / COMPARTMENT_E) * Vec2::new(self.fx1 * wh, self.fy1 * hw) + scale * v;
        ext.max += (scale / COMPARTMENT_E) * Vec2::new(self.fx2 * wh, self.fy2 * hw) + scale * v;
        if ext.width() < MIN_COMPARTMENT_SIDE {
            ext.set_width(MIN_COMPARTMENT_SIDE);
        }
        if ext.height() < MIN_COMPARTMENT_SIDE {
            ext.set_height(MIN_COMPARTMENT_SIDE);
        }
        self.set_extents(ext);
    }

    /// Begrenzt Centroid-Kraft und Seitenkräfte über das Längenquadrat.
    pub fn cap_delta2(&mut self, cap2: f32) {
        self.core.cap_delta2(cap2);
        let cap = cap2.sqrt();
        for fc in [&mut self.fx1, &mut self.fy1, &mut self.fx2, &mut self.fy2] {
            if fc.abs() > cap {
                *fc = fc.signum() * cap;
            }
        }
    }
}
