//! Species-Node: rechteckiges Element mit Alias- und Subgraph-Zustand.

use super::element::{CoordSystem, ElementCore, ElementKind, ElementShape};
use super::transform;
use glam::Vec2;

/// Standard-Ausdehnung eines Species-Nodes (Breite × Höhe).
pub const DEFAULT_NODE_WIDTH: f32 = 80.0;
pub const DEFAULT_NODE_HEIGHT: f32 = 40.0;

/// Ein Species-Node im Reaktionsnetzwerk.
///
/// Mehrere Nodes dürfen dieselbe `id` tragen (Aliase); der `glyph` ist
/// netzwerkweit eindeutig.
#[derive(Debug, Clone)]
pub struct Node {
    pub core: ElementCore,
    /// Id des zugeordneten Compartments (nicht-besitzend), falls vorhanden
    pub compartment: Option<String>,
    /// true für Alias-Kopien einer Species
    pub is_alias: bool,
    /// Zähler für Glyph-Zuordnung beim Modell-Import
    pub num_uses: u32,
    /// Von der Subgraph-Enumeration vergebener Index
    pub subgraph_index: Option<u32>,
    /// Schließt den Node von der Subgraph-Enumeration aus
    /// (Machbarkeitstest beim Aliasing)
    pub exclude_from_subgraph_enum: bool,
}

impl Node {
    pub fn new(id: impl Into<String>, index: u64) -> Self {
        let mut core = ElementCore::new(ElementKind::Species, ElementShape::Box);
        core.id = id.into();
        core.index = index;
        core.set_size(DEFAULT_NODE_WIDTH, DEFAULT_NODE_HEIGHT);
        Self {
            core,
            compartment: None,
            is_alias: false,
            num_uses: 0,
            subgraph_index: None,
            exclude_from_subgraph_enum: false,
        }
    }

    pub fn index(&self) -> u64 {
        self.core.index
    }

    pub fn id(&self) -> &str {
        &self.core.id
    }

    pub fn glyph(&self) -> &str {
        &self.core.glyph
    }

    pub fn centroid(&self) -> Vec2 {
        self.core.centroid(CoordSystem::Local)
    }

    /// Zwei Nodes sind Instanzen derselben Species, wenn ihre Ids gleich sind.
    pub fn is_common_instance(&self, other: &Node) -> bool {
        self.core.id == other.core.id
    }

    pub fn set_width(&mut self, w: f32) {
        let h = self.core.height();
        self.core.set_size(w, h);
    }

    pub fn set_height(&mut self, h: f32) {
        let w = self.core.width();
        self.core.set_size(w, h);
    }

    /// Setzt die Breite so, dass die *globale* Darstellung `w` breit wird
    /// (teilt durch den Skalierungsfaktor der Element-Transformation).
    pub fn affect_global_width(&mut self, w: f32) {
        self.set_width(w / transform::scale_factor(&self.core.tf));
    }

    /// Analog zu [`Node::affect_global_width`] für die Höhe.
    pub fn affect_global_height(&mut self, h: f32) {
        self.set_height(h / transform::scale_factor(&self.core.tf));
    }

    /// Kopiert einen Node als Alias: gleiche Id, Name und Größe,
    /// eigener Glyph und Index, `is_alias` gesetzt, Grad-Zähler genullt.
    pub fn alias_copy(&self, glyph: impl Into<String>, index: u64) -> Node {
        let mut n = Node::new(self.core.id.clone(), index);
        n.core.name = self.core.name.clone();
        n.core.glyph = glyph.into();
        n.core.set_size(self.core.width(), self.core.height());
        n.core.tf = self.core.tf;
        n.core.itf = self.core.itf;
        n.compartment = self.compartment.clone();
        n.is_alias = true;
        n.num_uses = 1;
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_extents_span_80_by_40() {
        let mut n = Node::new("A", 0);
        n.core.set_centroid(Vec2::new(100.0, 100.0));
        assert_eq!(n.core.min(), Vec2::new(60.0, 80.0));
        assert_eq!(n.core.max(), Vec2::new(140.0, 120.0));
    }

    #[test]
    fn set_width_keeps_centroid() {
        let mut n = Node::new("A", 0);
        n.core.set_centroid(Vec2::new(10.0, 20.0));
        n.set_width(120.0);
        n.set_height(60.0);
        assert_eq!(n.core.width(), 120.0);
        assert_eq!(n.core.height(), 60.0);
        assert_eq!(n.core.extents.center(), Vec2::new(10.0, 20.0));
    }

    #[test]
    fn affect_global_width_divides_by_scale() {
        let mut n = Node::new("A", 0);
        n.core.set_transform(glam::Affine2::from_scale(Vec2::splat(2.0)));
        n.affect_global_width(100.0);
        assert!((n.core.width() - 50.0).abs() < 1e-4);
    }

    #[test]
    fn alias_copy_shares_id_not_glyph() {
        let mut n = Node::new("S1", 3);
        n.core.name = "Glucose".into();
        n.core.glyph = "SG1".into();
        n.set_width(90.0);

        let a = n.alias_copy("S1_alias0", 7);
        assert!(a.is_alias);
        assert_eq!(a.id(), "S1");
        assert_eq!(a.glyph(), "S1_alias0");
        assert_eq!(a.index(), 7);
        assert_eq!(a.core.name, "Glucose");
        assert_eq!(a.core.width(), 90.0);
        assert_eq!(a.core.degree, 0);
        assert!(n.is_common_instance(&a));
    }
}
