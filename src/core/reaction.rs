//! Reaction-Junction: Species-Referenzen, Grad-Buchhaltung und die
//! Kontrollpunkt-Politik der Kurven.

use super::curve::{RxnCurve, RxnCurveType};
use super::element::{CoordSystem, ElementCore, ElementKind, ElementShape};
use super::geometry::{calc_curve_backup, new_second_pos, Rect};
use super::node::Node;
use glam::Vec2;

/// Durchmesser der runden Reaction-Junction.
pub const REACTION_JUNCTION_SIZE: f32 = 10.0;

/// Rolle einer Species innerhalb einer Reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxnRole {
    Substrate,
    Product,
    SideSubstrate,
    SideProduct,
    Modifier,
    Activator,
    Inhibitor,
}

impl RxnRole {
    /// true für Substrate/Produkte (inklusive Side-Varianten).
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RxnRole::Substrate | RxnRole::Product | RxnRole::SideSubstrate | RxnRole::SideProduct
        )
    }

    /// Substrat-Seite (geht in den Control-Centroid ein).
    pub fn is_substrate_side(&self) -> bool {
        matches!(self, RxnRole::Substrate | RxnRole::SideSubstrate)
    }

    pub fn is_product_side(&self) -> bool {
        matches!(self, RxnRole::Product | RxnRole::SideProduct)
    }

    /// Modifier, Aktivatoren und Inhibitoren sind beim Matching austauschbar.
    pub fn is_generic_modifier(&self) -> bool {
        matches!(
            self,
            RxnRole::Modifier | RxnRole::Activator | RxnRole::Inhibitor
        )
    }

    /// Rollen-Gleichheit unter der generischen Modifier-Äquivalenz.
    pub fn matches_generic(&self, other: RxnRole) -> bool {
        (self.is_generic_modifier() && other.is_generic_modifier()) || *self == other
    }

    /// Kurven-Variante zur Rolle.
    pub fn curve_type(&self) -> RxnCurveType {
        match self {
            RxnRole::Substrate | RxnRole::SideSubstrate => RxnCurveType::Substrate,
            RxnRole::Product | RxnRole::SideProduct => RxnCurveType::Product,
            RxnRole::Modifier => RxnCurveType::Modifier,
            RxnRole::Activator => RxnCurveType::Activator,
            RxnRole::Inhibitor => RxnCurveType::Inhibitor,
        }
    }

    /// Rollen-String an der XML-Grenze (Großschreibung, case-sensitiv).
    pub fn as_str(&self) -> &'static str {
        match self {
            RxnRole::Substrate => "SUBSTRATE",
            RxnRole::Product => "PRODUCT",
            RxnRole::SideSubstrate => "SIDESUBSTRATE",
            RxnRole::SideProduct => "SIDEPRODUCT",
            RxnRole::Modifier => "MODIFIER",
            RxnRole::Activator => "ACTIVATOR",
            RxnRole::Inhibitor => "INHIBITOR",
        }
    }

    /// Parst einen Rollen-String; `None` für jeden anderen Wert.
    pub fn parse(s: &str) -> Option<RxnRole> {
        match s {
            "SUBSTRATE" => Some(RxnRole::Substrate),
            "PRODUCT" => Some(RxnRole::Product),
            "SIDESUBSTRATE" => Some(RxnRole::SideSubstrate),
            "SIDEPRODUCT" => Some(RxnRole::SideProduct),
            "MODIFIER" => Some(RxnRole::Modifier),
            "ACTIVATOR" => Some(RxnRole::Activator),
            "INHIBITOR" => Some(RxnRole::Inhibitor),
            _ => None,
        }
    }
}

fn node_by_index(nodes: &[Node], index: u64) -> Option<&Node> {
    nodes.iter().find(|n| n.index() == index)
}

/// Eine Reaction im Netzwerk.
///
/// Die Species-Liste ist geordnet; ein Node darf mehrfach auftreten, einmal
/// pro gespielter Rolle (Loop-Reaktionen). Die Kurven werden aus der Liste
/// regeneriert und gehören der Reaction.
#[derive(Debug, Clone)]
pub struct Reaction {
    pub core: ElementCore,
    species: Vec<(u64, RxnRole)>,
    pub curves: Vec<RxnCurve>,
    curves_dirty: bool,
    pub reversible: bool,
    pub fast: bool,
}

impl Reaction {
    pub fn new(id: impl Into<String>, index: u64) -> Self {
        let mut core = ElementCore::new(ElementKind::Reaction, ElementShape::Round);
        core.id = id.into();
        core.index = index;
        core.set_size(REACTION_JUNCTION_SIZE, REACTION_JUNCTION_SIZE);
        Self {
            core,
            species: Vec::new(),
            curves: Vec::new(),
            curves_dirty: false,
            reversible: false,
            fast: false,
        }
    }

    pub fn index(&self) -> u64 {
        self.core.index
    }

    pub fn id(&self) -> &str {
        &self.core.id
    }

    pub fn centroid(&self) -> Vec2 {
        self.core.centroid(CoordSystem::Local)
    }

    pub fn species(&self) -> &[(u64, RxnRole)] {
        &self.species
    }

    pub fn curves_dirty(&self) -> bool {
        self.curves_dirty
    }

    /// Hängt eine Species-Referenz an und erhöht die Grade beider Endpunkte.
    pub fn add_species_ref(&mut self, node: &mut Node, role: RxnRole) {
        self.species.push((node.index(), role));
        self.curves_dirty = true;
        self.core.degree += 1;
        self.core.local_degree += 1;
        node.core.degree += 1;
        node.core.local_degree += 1;
    }

    /// Entfernt **alle** Vorkommen des Nodes aus der Species-Liste.
    ///
    /// Gibt die Anzahl entfernter Einträge zurück; die Grade beider Seiten
    /// werden pro Eintrag dekrementiert. Der Aufrufer baut anschließend die
    /// Kurven neu, wenn etwas entfernt wurde.
    pub fn remove_node_refs(&mut self, node: &mut Node) -> usize {
        let index = node.index();
        let before = self.species.len();
        self.species.retain(|(i, _)| *i != index);
        let removed = before - self.species.len();
        if removed > 0 {
            self.curves_dirty = true;
            let removed_u32 = removed as u32;
            self.core.degree = self.core.degree.saturating_sub(removed_u32);
            self.core.local_degree = self.core.local_degree.saturating_sub(removed_u32);
            node.core.degree = node.core.degree.saturating_sub(removed_u32);
            node.core.local_degree = node.core.local_degree.saturating_sub(removed_u32);
        }
        removed
    }

    pub fn has_species(&self, node_index: u64) -> bool {
        self.species.iter().any(|(i, _)| *i == node_index)
    }

    /// Wie oft referenziert diese Reaction den Node?
    pub fn degree_of(&self, node_index: u64) -> usize {
        self.species.iter().filter(|(i, _)| *i == node_index).count()
    }

    /// Erste Rolle, unter der der Node referenziert wird.
    pub fn species_role(&self, node_index: u64) -> Option<RxnRole> {
        self.species
            .iter()
            .find(|(i, _)| *i == node_index)
            .map(|(_, r)| *r)
    }

    /// Erster referenzierter Node mit der gegebenen Modell-Id.
    pub fn find_species_by_id(&self, nodes: &[Node], id: &str) -> Option<u64> {
        self.species
            .iter()
            .map(|(i, _)| *i)
            .find(|i| node_by_index(nodes, *i).is_some_and(|n| n.id() == id))
    }

    /// Ersetzt alle Vorkommen von `before` durch `after` (Rollen bleiben).
    pub fn substitute_species(&mut self, nodes: &mut [Node], before: u64, after: u64) {
        let mut replaced = 0u32;
        for (i, _) in self.species.iter_mut() {
            if *i == before {
                *i = after;
                replaced += 1;
            }
        }
        if replaced > 0 {
            self.curves_dirty = true;
            transfer_local_degree(nodes, before, after, replaced);
        }
    }

    /// Ersetzt alle Einträge, deren Node die Modell-Id `id` trägt.
    pub fn substitute_species_by_id(&mut self, nodes: &mut [Node], id: &str, after: u64) {
        let mut replaced = 0u32;
        let mut replaced_from: Option<u64> = None;
        for (i, _) in self.species.iter_mut() {
            if node_by_index(nodes, *i).is_some_and(|n| n.id() == id) {
                replaced_from = Some(*i);
                *i = after;
                replaced += 1;
            }
        }
        if let Some(before) = replaced_from {
            self.curves_dirty = true;
            transfer_local_degree(nodes, before, after, replaced);
        }
    }

    /// Ersetzt Einträge mit Modell-Id `id` unter der generischen
    /// Modifier-Äquivalenz.
    ///
    /// Trifft ein abstrakter MODIFIER-Eintrag auf eine konkrete Rolle
    /// (ACTIVATOR/INHIBITOR), wird die gespeicherte Rolle auf die konkrete
    /// angehoben — Reparatur inkonsistenter Modell-Annotationen.
    pub fn substitute_species_by_id_role(
        &mut self,
        nodes: &mut [Node],
        id: &str,
        after: u64,
        role: RxnRole,
    ) {
        let mut replaced = 0u32;
        let mut replaced_from: Option<u64> = None;
        for (i, stored) in self.species.iter_mut() {
            if node_by_index(nodes, *i).is_some_and(|n| n.id() == id) && stored.matches_generic(role)
            {
                replaced_from = Some(*i);
                *i = after;
                replaced += 1;
                if *stored == RxnRole::Modifier
                    && matches!(role, RxnRole::Activator | RxnRole::Inhibitor)
                {
                    *stored = role;
                }
            }
        }
        if let Some(before) = replaced_from {
            self.curves_dirty = true;
            transfer_local_degree(nodes, before, after, replaced);
        }
    }

    /// Löscht alle Kurven, ohne die Species-Liste anzufassen.
    pub fn delete_curves(&mut self) {
        self.curves.clear();
        self.curves_dirty = true;
    }

    /// Hängt eine einzelne Kurve an (Vorbefüllung aus Layout-Annotationen).
    pub fn add_curve(&mut self, role: RxnRole, node_index: Option<u64>) -> &mut RxnCurve {
        self.curves
            .push(RxnCurve::new(role.curve_type(), node_index));
        self.curves.last_mut().expect("soeben eingefügt")
    }

    /// Markiert die Kurven als aktuell (nach externer Vorbefüllung).
    pub(crate) fn clear_dirty(&mut self) {
        self.curves_dirty = false;
    }

    /// Regeneriert pro Species-Referenz eine rollen-spezialisierte Kurve
    /// und berechnet die Kontrollpunkte.
    pub fn rebuild_curves(&mut self, nodes: &[Node]) {
        self.curves.clear();
        for (index, role) in &self.species {
            self.curves
                .push(RxnCurve::new(role.curve_type(), Some(*index)));
        }
        self.recalc_curve_cps(nodes);
        self.curves_dirty = false;
    }

    /// Berechnet die Bézier-Kontrollpunkte aller Kurven.
    ///
    /// Politik: ein gemeinsamer Control-Centroid aus Substrat-Seite und
    /// Reaction-Centroid formt alle Kurven konsistent; Loops und
    /// Uni-Uni-Reaktionen erhalten Sonderbehandlung; Mehrfachkanten werden
    /// zum Schluss aufgefächert.
    pub fn recalc_curve_cps(&mut self, nodes: &[Node]) {
        let p = self.centroid();
        let scalar = 20.0f32;

        // Control-Centroid aus Substrat-Seite + Reaction-Centroid
        let mut ctrl_cent = Vec2::ZERO;
        let mut csub = 0u32;
        let mut looped = false;
        let mut loop_pt = Vec2::ZERO;

        for (index, role) in &self.species {
            if !role.is_substrate_side() {
                continue;
            }
            let Some(n) = node_by_index(nodes, *index) else {
                continue;
            };
            ctrl_cent += n.centroid();
            csub += 1;
            // Loop: gleicher Node in einer weiteren, anderen Rolle
            for (other_index, other_role) in &self.species {
                if other_index == index && other_role != role {
                    looped = true;
                    loop_pt = n.centroid();
                }
            }
        }

        ctrl_cent = (ctrl_cent + p) / (csub + 1) as f32;

        if looped {
            // Control-Centroid hinter den Loop-Node legen und um -90° um
            // die Junction drehen, damit die Schleife sichtbar wird
            ctrl_cent = new_second_pos(loop_pt, p, 0.0, -scalar, false);
            ctrl_cent = new_second_pos(p, ctrl_cent, -90.0, 0.0, false);
        }

        // Korrektur für Uni-Uni-Reaktionen: Kontrollpunkt leicht hinter die
        // Junction entlang der Produkt-minus-Substrat-Richtung.
        // Loops (ebenfalls Grad 2) behalten ihren seitlichen Versatz.
        if self.core.degree == 2 && !looped {
            let d = -(p - ctrl_cent).length();
            let mut sub_min = Vec2::ZERO;
            let mut prd_min = Vec2::ZERO;
            for (index, role) in &self.species {
                let Some(n) = node_by_index(nodes, *index) else {
                    continue;
                };
                if role.is_substrate_side() {
                    sub_min = n.core.min();
                } else if role.is_product_side() {
                    prd_min = n.core.min();
                }
            }
            ctrl_cent = p + (sub_min - prd_min);
            ctrl_cent = new_second_pos(ctrl_cent, p, 0.0, d, false);
        }

        // zur Junction hin einkürzen, damit der Kontrollpunkt nicht auf ihr liegt
        ctrl_cent = new_second_pos(ctrl_cent, p, 0.0, -scalar, false);

        for c in &mut self.curves {
            let n = c.node_index.and_then(|i| node_by_index(nodes, i));
            let anchor = n.map_or(p, |n| n.centroid());
            // Ersatz-Box, falls der Node-Verweis fehlt
            let node_box = n.map_or_else(
                || Rect::around(anchor, Vec2::new(scalar * 1.5, scalar)),
                |n| n.core.bounding_box(),
            );

            match c.role {
                RxnCurveType::Substrate => {
                    c.s = calc_curve_backup(ctrl_cent, anchor, &node_box, scalar / 2.0);
                    c.c1 = new_second_pos(p, c.s, 0.0, -scalar, false);
                    c.e = p;
                    c.c2 = ctrl_cent;
                }
                RxnCurveType::Product => {
                    c.s = p;
                    c.c1 = new_second_pos(ctrl_cent, p, 0.0, 1.0, true);
                    c.e = calc_curve_backup(c.c1, anchor, &node_box, scalar / 2.0);
                    c.c2 = new_second_pos(p, c.e, 0.0, -scalar, false);
                }
                RxnCurveType::Activator | RxnCurveType::Inhibitor | RxnCurveType::Modifier => {
                    // kurzer Stummel vom Node zur Junction
                    c.s = calc_curve_backup(p, anchor, &node_box, scalar / 2.0);
                    c.c1 = new_second_pos(anchor, p, 0.0, -15.0, false);
                    c.e = c.c1;
                    c.c2 = new_second_pos(anchor, p, 0.0, -20.0, false);
                }
            }
        }

        self.spread_multi_edges(nodes, scalar);
    }

    /// Fächert Kurvenpaare auf, die denselben Node in derselben Rolle nutzen,
    /// damit Mehrfachkanten nicht aufeinanderliegen.
    fn spread_multi_edges(&mut self, nodes: &[Node], scalar: f32) {
        for i in 0..self.curves.len() {
            for j in (i + 1)..self.curves.len() {
                let (head, tail) = self.curves.split_at_mut(j);
                let c1 = &mut head[i];
                let c2 = &mut tail[0];

                let Some(index) = c1.node_index else { continue };
                if c2.node_index != Some(index) || c1.role != c2.role {
                    continue;
                }
                let Some(n) = node_by_index(nodes, index) else {
                    continue;
                };
                let nc = n.centroid();

                c1.set_node_side_cp(new_second_pos(nc, c1.node_side_cp(), scalar, scalar / 2.0, false));
                c2.set_node_side_cp(new_second_pos(nc, c2.node_side_cp(), -scalar, scalar / 2.0, false));
                c1.set_node_side(new_second_pos(c1.node_side_cp(), c1.node_side(), -scalar, 0.0, false));
                c2.set_node_side(new_second_pos(c2.node_side_cp(), c2.node_side(), scalar, 0.0, false));
            }
        }
    }

    /// Kürzt alle Kurven auf die gepolsterte Bounding-Box ihres Node-Endes.
    pub fn clip_curves(&mut self, nodes: &[Node], padding: f32, clip_cutoff: f32) {
        for c in &mut self.curves {
            let Some(n) = c.node_index.and_then(|i| node_by_index(nodes, i)) else {
                continue;
            };
            let b = n.core.bounding_box().padded(padding);
            match c.role {
                RxnCurveType::Product => {
                    c.clip_forward_to(&b, clip_cutoff);
                }
                _ => {
                    c.clip_reverse_to(&b, clip_cutoff);
                }
            }
        }
    }

    /// Centroid = Mittel aller Species-Centroids (Duplikate zählen mit);
    /// baut anschließend die Kurven neu.
    pub fn recenter(&mut self, nodes: &[Node]) {
        let mut sum = Vec2::ZERO;
        let mut count = 0u32;
        for (index, _) in &self.species {
            if let Some(n) = node_by_index(nodes, *index) {
                sum += n.centroid();
                count += 1;
            }
        }
        if count > 0 {
            self.core.set_centroid_raw(sum / count as f32);
        }
        self.rebuild_curves(nodes);
    }

    /// Centroid-Neuberechnung; No-op, wenn bereits eine Position gesetzt wurde.
    pub fn recomp_centroid(&mut self, nodes: &[Node]) {
        if self.core.is_centroid_set() {
            return;
        }
        self.do_centroid_calc(nodes);
    }

    /// Erzwungene Centroid-Neuberechnung; markiert die Position als gesetzt.
    pub fn force_recalc_centroid(&mut self, nodes: &[Node]) {
        self.do_centroid_calc(nodes);
        self.core.mark_centroid_set();
    }

    /// Mittel der *distinkten* Species-Centroids (Duplikate übersprungen).
    fn do_centroid_calc(&mut self, nodes: &[Node]) {
        let mut sum = Vec2::ZERO;
        let mut count = 0u32;
        for (pos, (index, _)) in self.species.iter().enumerate() {
            if self.species[..pos].iter().any(|(i, _)| i == index) {
                continue;
            }
            if let Some(n) = node_by_index(nodes, *index) {
                sum += n.centroid();
                count += 1;
            }
        }
        if count > 0 {
            self.core.set_centroid_raw(sum / count as f32);
        }
    }
}

/// Verschiebt `count` Referenz-Grade von einem Node auf einen anderen.
fn transfer_local_degree(nodes: &mut [Node], from: u64, to: u64, count: u32) {
    if from == to {
        return;
    }
    for n in nodes.iter_mut() {
        if n.index() == from {
            n.core.degree = n.core.degree.saturating_sub(count);
            n.core.local_degree = n.core.local_degree.saturating_sub(count);
        } else if n.index() == to {
            n.core.degree += count;
            n.core.local_degree += count;
        }
    }
}
