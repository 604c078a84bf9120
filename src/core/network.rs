//! Die zentrale Network-Datenstruktur: besitzt Nodes, Reactions und
//! Compartments und stellt Layout-, Alias- und Subgraph-Operationen bereit.

use super::compartment::Compartment;
use super::curve::RxnCurve;
use super::element::{CoordSystem, ElementCore, ElementKind, ElementRef};
use super::geometry::{new_second_pos, Rect};
use super::node::Node;
use super::reaction::{Reaction, RxnRole};
use super::transform;
use anyhow::{bail, Context, Result};
use glam::{Affine2, Vec2};
use rand::Rng;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Standard-Polsterung beim Kurven-Clipping.
pub const DEFAULT_CLIP_PADDING: f32 = 0.0;
/// Standard-Cutoff beim Kurven-Clipping (Mindest-Restanteil der Kurve).
pub const DEFAULT_CLIP_CUTOFF: f32 = 0.1;

// Prozessweit konfigurierbare Default-Compartment-Id (initial leer).
static DEFAULT_COMPARTMENT_ID: Mutex<String> = Mutex::new(String::new());

/// Setzt die zusätzliche Id, die als unsichtbares Default-Compartment gilt.
pub fn set_default_compartment_id(id: &str) {
    *DEFAULT_COMPARTMENT_ID.lock().unwrap() = id.to_string();
}

pub fn default_compartment_id() -> String {
    DEFAULT_COMPARTMENT_ID.lock().unwrap().clone()
}

pub fn have_default_compartment_id() -> bool {
    !DEFAULT_COMPARTMENT_ID.lock().unwrap().is_empty()
}

/// Gilt die Id als nicht-visuelles Default-Compartment?
pub fn is_default_compartment_id(id: &str) -> bool {
    id == "default"
        || id == "compartment"
        || id == "sbnw_default_compartment"
        || (have_default_compartment_id() && default_compartment_id() == id)
}

/// Container und Index aller Elemente eines Reaktionsnetzwerks.
///
/// Die drei Arten liegen in eigenen, besitzenden Vektoren; `elements` hält
/// die kombinierte Sicht in Einfüge-Reihenfolge als `ElementRef`s.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pub id: Option<String>,
    nodes: Vec<Node>,
    reactions: Vec<Reaction>,
    compartments: Vec<Compartment>,
    elements: Vec<ElementRef>,
    /// Trug das Eingabedokument bereits ein Layout?
    pub layout_specified: bool,
    num_subgraphs: u32,
    glyph_counter: u64,
    next_reaction_index: u64,
    next_compartment_index: u64,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    pub fn reactions_mut(&mut self) -> &mut [Reaction] {
        &mut self.reactions
    }

    pub fn compartments(&self) -> &[Compartment] {
        &self.compartments
    }

    pub fn compartments_mut(&mut self) -> &mut [Compartment] {
        &mut self.compartments
    }

    /// Kombinierte Element-Sicht in Einfüge-Reihenfolge.
    pub fn elements(&self) -> &[ElementRef] {
        &self.elements
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn reaction_count(&self) -> usize {
        self.reactions.len()
    }

    pub fn compartment_count(&self) -> usize {
        self.compartments.len()
    }

    // -- Hinzufügen / Entfernen --

    /// Fügt einen Node hinzu; Kurven werden nicht neu aufgebaut.
    pub fn add_node(&mut self, node: Node) -> u64 {
        let index = node.index();
        self.elements.push(ElementRef::species(index));
        self.nodes.push(node);
        index
    }

    /// Fügt eine Reaction hinzu und vergibt ihren Arena-Index.
    pub fn add_reaction(&mut self, mut rxn: Reaction) -> u64 {
        let index = self.next_reaction_index;
        self.next_reaction_index += 1;
        rxn.core.index = index;
        self.elements.push(ElementRef::reaction(index));
        self.reactions.push(rxn);
        index
    }

    /// Fügt ein Compartment hinzu und vergibt seinen Arena-Index.
    pub fn add_compartment(&mut self, mut comp: Compartment) -> u64 {
        let index = self.next_compartment_index;
        self.next_compartment_index += 1;
        comp.core.index = index;
        self.elements.push(ElementRef::compartment(index));
        self.compartments.push(comp);
        index
    }

    /// Entfernt einen Node samt Kaskade: aus der Element-Sicht, aus allen
    /// Compartments und aus allen Reactions (deren Kurven neu aufgebaut
    /// werden). Fehler, wenn der Node nicht enthalten ist.
    pub fn remove_node(&mut self, node_index: u64) -> Result<Node> {
        let pos = self
            .nodes
            .iter()
            .position(|n| n.index() == node_index)
            .with_context(|| format!("Kein Node mit Index {node_index} im Netzwerk"))?;

        let eref = ElementRef::species(node_index);
        self.elements.retain(|e| *e != eref);
        for c in &mut self.compartments {
            c.remove_element(eref);
        }

        let mut node = self.nodes.remove(pos);
        for r in &mut self.reactions {
            if r.remove_node_refs(&mut node) > 0 {
                r.rebuild_curves(&self.nodes);
            }
        }

        Ok(node)
    }

    /// Entfernt eine Reaction aus Element-Sicht und Reaction-Liste.
    pub fn remove_reaction(&mut self, reaction_index: u64) -> Result<Reaction> {
        let pos = self
            .reactions
            .iter()
            .position(|r| r.index() == reaction_index)
            .with_context(|| format!("Keine Reaction mit Index {reaction_index} im Netzwerk"))?;
        let eref = ElementRef::reaction(reaction_index);
        self.elements.retain(|e| *e != eref);
        for c in &mut self.compartments {
            c.remove_element(eref);
        }
        Ok(self.reactions.remove(pos))
    }

    /// Verbindet einen Node mit einer Reaction und baut deren Kurven neu.
    pub fn connect_node(&mut self, node_index: u64, reaction_index: u64, role: RxnRole) -> Result<()> {
        let nodes = &mut self.nodes;
        let node = nodes
            .iter_mut()
            .find(|n| n.index() == node_index)
            .with_context(|| format!("Kein Node mit Index {node_index}"))?;
        let rxn = self
            .reactions
            .iter_mut()
            .find(|r| r.index() == reaction_index)
            .with_context(|| format!("Keine Reaction mit Index {reaction_index}"))?;
        rxn.add_species_ref(node, role);
        rxn.rebuild_curves(nodes.as_slice());
        Ok(())
    }

    pub fn is_node_connected(&self, node_index: u64, reaction_index: u64) -> Result<bool> {
        let rxn = self
            .reactions
            .iter()
            .find(|r| r.index() == reaction_index)
            .with_context(|| format!("Keine Reaction mit Index {reaction_index}"))?;
        Ok(rxn.has_species(node_index))
    }

    // -- Suche (lineare Scans) --

    pub fn node_by_index(&self, index: u64) -> Option<&Node> {
        self.nodes.iter().find(|n| n.index() == index)
    }

    pub fn node_by_index_mut(&mut self, index: u64) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.index() == index)
    }

    pub fn reaction_by_index(&self, index: u64) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.index() == index)
    }

    pub fn reaction_by_index_mut(&mut self, index: u64) -> Option<&mut Reaction> {
        self.reactions.iter_mut().find(|r| r.index() == index)
    }

    pub fn compartment_by_index(&self, index: u64) -> Option<&Compartment> {
        self.compartments.iter().find(|c| c.index() == index)
    }

    /// Erster Node mit der Modell-Id (Aliase teilen sich die Id).
    pub fn find_node_by_id(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn find_node_by_id_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id() == id)
    }

    pub fn find_node_by_glyph(&self, glyph: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.glyph() == glyph)
    }

    pub fn find_reaction_by_id(&self, id: &str) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.id() == id)
    }

    pub fn find_reaction_by_id_mut(&mut self, id: &str) -> Option<&mut Reaction> {
        self.reactions.iter_mut().find(|r| r.id() == id)
    }

    pub fn find_comp_by_id(&self, id: &str) -> Option<&Compartment> {
        self.compartments.iter().find(|c| c.id() == id)
    }

    pub fn find_comp_by_id_mut(&mut self, id: &str) -> Option<&mut Compartment> {
        self.compartments.iter_mut().find(|c| c.id() == id)
    }

    pub fn find_comp_by_glyph(&self, glyph: &str) -> Option<&Compartment> {
        self.compartments.iter().find(|c| c.core.glyph == glyph)
    }

    /// Erstes Compartment, dessen Element-Liste die Referenz enthält.
    pub fn find_containing_compartment(&self, e: ElementRef) -> Option<&Compartment> {
        self.compartments.iter().find(|c| c.contains_element(e))
    }

    // -- Eindeutige Bezeichner --

    /// Iteriert `Node_k` für k = 1, 2, …, bis kein Node die Id trägt.
    pub fn unique_id(&self) -> String {
        let mut k: u64 = 0;
        loop {
            k += 1;
            let id = format!("Node_{k}");
            if self.find_node_by_id(&id).is_none() {
                return id;
            }
        }
    }

    /// `<glyph>_<zähler>` mit netzwerkweit monotonem Zähler.
    pub fn unique_glyph_id(&mut self, src: &Node) -> String {
        self.glyph_counter += 1;
        format!("{}_{}", src.glyph(), self.glyph_counter)
    }

    /// Kleinster nichtnegativer Index, den noch kein Node trägt.
    pub fn unique_index(&self) -> u64 {
        let mut k: u64 = 0;
        while self.nodes.iter().any(|n| n.index() == k) {
            k += 1;
        }
        k
    }

    // -- Alias-Abfragen --

    /// Anzahl Nodes, die die Id von `node` teilen (inklusive `node`).
    pub fn num_instances(&self, node: &Node) -> usize {
        self.nodes.iter().filter(|v| node.is_common_instance(v)).count()
    }

    /// k-te Instanz mit der Id von `node`.
    pub fn instance(&self, node: &Node, k: usize) -> Option<&Node> {
        self.nodes.iter().filter(|v| node.is_common_instance(v)).nth(k)
    }

    /// Anzahl logischer Nodes: Alias-Läufe zählen als ein Node.
    pub fn num_unique_nodes(&self) -> usize {
        let mut k = 0usize;
        let mut advance = 1usize;
        for n in &self.nodes {
            if !n.is_alias {
                k += 1;
                advance = 1;
            } else {
                k += advance;
                advance = 0;
            }
        }
        k
    }

    /// n-ter logischer Node; konsekutive Alias-Läufe rücken den Zähler
    /// höchstens einmal vor.
    pub fn unique_node_at(&self, n: usize) -> Option<&Node> {
        let mut k = 0usize;
        let mut advance = 1usize;
        for x in &self.nodes {
            if k == n {
                return Some(x);
            }
            if !x.is_alias {
                k += 1;
                advance = 1;
            } else {
                k += advance;
                advance = 0;
            }
        }
        None
    }

    /// Reactions, die den Node referenzieren.
    pub fn connected_reactions(&self, node_index: u64) -> Vec<&Reaction> {
        self.reactions
            .iter()
            .filter(|r| r.has_species(node_index))
            .collect()
    }

    /// Kurven aller Reactions, deren Node-Seite der Node ist.
    pub fn attached_curves(&self, node_index: u64) -> Vec<&RxnCurve> {
        self.reactions
            .iter()
            .filter(|r| r.has_species(node_index))
            .flat_map(|r| r.curves.iter().filter(move |c| c.includes(node_index)))
            .collect()
    }

    /// Sperrt den ersten Node mit der Id; `false`, wenn keiner existiert.
    pub fn lock_node(&mut self, id: &str) -> bool {
        match self.find_node_by_id_mut(id) {
            Some(n) => {
                n.core.lock();
                true
            }
            None => false,
        }
    }

    pub fn unlock_node(&mut self, id: &str) -> bool {
        match self.find_node_by_id_mut(id) {
            Some(n) => {
                n.core.unlock();
                true
            }
            None => false,
        }
    }

    /// Mutabler Zugriff auf eine Reaction zusammen mit der Node-Arena
    /// (für Kurven-Operationen, die Node-Geometrie lesen).
    pub fn reaction_and_nodes_mut(&mut self, reaction_id: &str) -> Option<(&mut Reaction, &[Node])> {
        let nodes = &self.nodes;
        let r = self
            .reactions
            .iter_mut()
            .find(|r| r.id() == reaction_id)?;
        Some((r, nodes))
    }

    /// Ersetzt in einer Reaction alle Einträge der Species unter der
    /// generischen Modifier-Äquivalenz; `false`, wenn die Reaction fehlt.
    pub fn substitute_species_in_reaction(
        &mut self,
        reaction_id: &str,
        species_id: &str,
        after: u64,
        role: RxnRole,
    ) -> bool {
        let nodes = &mut self.nodes;
        let Some(r) = self
            .reactions
            .iter_mut()
            .find(|r| r.id() == reaction_id)
        else {
            return false;
        };
        r.substitute_species_by_id_role(nodes, species_id, after, role);
        true
    }

    // -- Compartment-Verwaltung --

    /// Entfernt Compartments ohne enthaltene Elemente.
    pub fn elide_empty_comps(&mut self) {
        let empty: Vec<u64> = self
            .compartments
            .iter()
            .filter(|c| c.is_empty())
            .map(|c| c.index())
            .collect();
        self.elements.retain(|e| {
            e.kind != ElementKind::Compartment || !empty.contains(&e.index)
        });
        self.compartments.retain(|c| !c.is_empty());
    }

    /// Ruhe-Ausdehnung jedes Compartments auf seine Mitglieder anpassen.
    pub fn resize_comps_enclose(&mut self, padding: f32) {
        let nodes = &self.nodes;
        let reactions = &self.reactions;
        for c in &mut self.compartments {
            let boxes: Vec<Rect> = c
                .elements()
                .iter()
                .filter_map(|e| match e.kind {
                    ElementKind::Species => nodes
                        .iter()
                        .find(|n| n.index() == e.index)
                        .map(|n| n.core.bounding_box()),
                    ElementKind::Reaction => reactions
                        .iter()
                        .find(|r| r.index() == e.index)
                        .map(|r| r.core.bounding_box()),
                    ElementKind::Compartment => None,
                })
                .collect();
            c.resize_enclose(&boxes, padding);
        }
    }

    pub fn autosize_comps(&mut self) {
        for c in &mut self.compartments {
            c.auto_size();
        }
    }

    /// Exponentielle Wand-Kräfte aller Compartments auf ihre Mitglieder.
    pub fn do_internal_forces(&mut self, f: f32, t: f32) {
        let nodes = &mut self.nodes;
        let reactions = &mut self.reactions;
        for c in &mut self.compartments {
            let members: Vec<ElementRef> = c.elements().to_vec();
            for e in members {
                let core = match e.kind {
                    ElementKind::Species => nodes
                        .iter_mut()
                        .find(|n| n.index() == e.index)
                        .map(|n| &mut n.core),
                    ElementKind::Reaction => reactions
                        .iter_mut()
                        .find(|r| r.index() == e.index)
                        .map(|r| &mut r.core),
                    ElementKind::Compartment => None,
                };
                if let Some(core) = core {
                    c.do_internal_force(core, f, t);
                }
            }
        }
    }

    // -- Subgraphen --

    /// Nummeriert die Zusammenhangskomponenten des Reaktionsgraphen durch.
    ///
    /// Ausgeschlossene Nodes starten keine Komponente und unterbrechen die
    /// Ausbreitung. Gibt die Anzahl der Komponenten zurück.
    pub fn enumerate_subgraphs(&mut self) -> u32 {
        for n in &mut self.nodes {
            n.subgraph_index = None;
        }
        let mut nsub = 0u32;

        for start in 0..self.nodes.len() {
            if self.nodes[start].subgraph_index.is_some()
                || self.nodes[start].exclude_from_subgraph_enum
            {
                continue;
            }
            // Breitensuche über die Reactions
            let mut queue = VecDeque::new();
            self.nodes[start].subgraph_index = Some(nsub);
            queue.push_back(self.nodes[start].index());
            while let Some(current) = queue.pop_front() {
                for r in &self.reactions {
                    if !r.has_species(current) {
                        continue;
                    }
                    for (neighbor, _) in r.species() {
                        let Some(n) = self.nodes.iter_mut().find(|n| n.index() == *neighbor)
                        else {
                            continue;
                        };
                        if n.subgraph_index.is_none() && !n.exclude_from_subgraph_enum {
                            n.subgraph_index = Some(nsub);
                            queue.push_back(*neighbor);
                        }
                    }
                }
            }
            nsub += 1;
        }

        self.num_subgraphs = nsub;
        nsub
    }

    pub fn num_subgraphs(&mut self) -> u32 {
        self.enumerate_subgraphs()
    }

    pub fn clear_subgraph_info(&mut self) {
        for n in &mut self.nodes {
            n.subgraph_index = None;
        }
    }

    pub fn clear_exclude_flags(&mut self) {
        for n in &mut self.nodes {
            n.exclude_from_subgraph_enum = false;
        }
    }

    // -- Aliasing --

    /// Dupliziert den Node pro referenzierender Reaction.
    ///
    /// Machbarkeit: schlägt genau dann fehl, wenn das Herauslösen des Nodes
    /// den Reaktionsgraphen in mehr Komponenten zerfallen ließe als zuvor;
    /// in dem Fall bleibt das Netzwerk unverändert. Andernfalls erhält jede
    /// Reaction einen eigenen Alias (Glyph `<id>_alias<k>`), registriert im
    /// Compartment des Originals; das Original wird zum Schluss entfernt.
    pub fn alias_node(&mut self, node_index: u64) -> Result<()> {
        if self.node_by_index(node_index).is_none() {
            bail!("Kein Node mit Index {node_index} im Netzwerk");
        }

        self.clear_exclude_flags();
        let before = self.enumerate_subgraphs();
        if let Some(n) = self.node_by_index_mut(node_index) {
            n.exclude_from_subgraph_enum = true;
        }
        let after = self.enumerate_subgraphs();
        self.clear_exclude_flags();

        if before != after {
            bail!("Aliasing würde den Reaktionsgraphen in {after} statt {before} Komponenten zerlegen");
        }

        // Kurven müssen stehen, damit der Platzierungs-Kontrollpunkt existiert
        for pos in 0..self.reactions.len() {
            let needs_rebuild = {
                let r = &self.reactions[pos];
                r.has_species(node_index) && (r.curves_dirty() || r.curves.is_empty())
            };
            if needs_rebuild {
                let (nodes, reactions) = (&self.nodes, &mut self.reactions);
                reactions[pos].rebuild_curves(nodes);
            }
        }

        let original = self
            .node_by_index(node_index)
            .expect("oben geprüft")
            .clone();
        let containing = self
            .find_containing_compartment(ElementRef::species(node_index))
            .map(|c| c.index());

        let mut k = 0usize;
        for pos in 0..self.reactions.len() {
            if !self.reactions[pos].has_species(node_index) {
                continue;
            }

            let placement_cp = self.reactions[pos]
                .curves
                .iter()
                .find(|c| c.includes(node_index))
                .map(|c| c.centroid_cp());

            let alias_index = self.unique_index();
            let glyph = format!("{}_alias{}", original.id(), k);
            k += 1;
            let mut alias = original.alias_copy(glyph, alias_index);
            let centroid = match placement_cp {
                Some(ccp) => new_second_pos(ccp, original.centroid(), 0.0, -50.0, false),
                None => original.centroid() - Vec2::new(0.0, 50.0),
            };
            alias.core.set_centroid(centroid);

            if let Some(ci) = containing {
                if let Some(c) = self.compartments.iter_mut().find(|c| c.index() == ci) {
                    c.add_element(ElementRef::species(alias_index));
                }
            }
            self.add_node(alias);

            let (nodes, reactions) = (&mut self.nodes, &mut self.reactions);
            reactions[pos].substitute_species(nodes, node_index, alias_index);
            reactions[pos].rebuild_curves(nodes);
        }

        self.remove_node(node_index)
            .context("Original-Node konnte nach dem Aliasing nicht entfernt werden")?;
        Ok(())
    }

    /// Aliasing-Durchlauf über alle Nodes ab einem Mindestgrad.
    ///
    /// Pro referenzierender Reaction wird ein Alias versucht und nur
    /// behalten, wenn die Komponentenzahl nicht wächst. Gibt die Anzahl
    /// erzeugter Aliase zurück.
    pub fn alias_by_degree(&mut self, min_degree: u32) -> usize {
        let mut alias_count = 0usize;
        let candidates: Vec<u64> = self
            .nodes
            .iter()
            .filter(|n| {
                n.core.degree >= min_degree && !n.is_alias && !n.core.is_centroid_set()
            })
            .map(|n| n.index())
            .collect();

        for node_index in candidates {
            for pos in 0..self.reactions.len() {
                let degree_left = self
                    .node_by_index(node_index)
                    .map(|n| n.core.degree)
                    .unwrap_or(0);
                if degree_left <= 1 || !self.reactions[pos].has_species(node_index) {
                    continue;
                }

                let before = self.enumerate_subgraphs();

                let original = self.node_by_index(node_index).expect("Kandidat existiert").clone();
                let alias_index = self.unique_index();
                let glyph = format!(
                    "{}_{}_alias_{}",
                    original.glyph(),
                    self.reactions[pos].id(),
                    alias_count
                );
                let mut alias = original.alias_copy(glyph, alias_index);
                let rxn_centroid = self.reactions[pos].centroid();
                alias
                    .core
                    .set_centroid(new_second_pos(rxn_centroid, original.centroid(), 0.0, -25.0, false));

                let containing = self
                    .find_containing_compartment(ElementRef::species(node_index))
                    .map(|c| c.index());
                if let Some(ci) = containing {
                    if let Some(c) = self.compartments.iter_mut().find(|c| c.index() == ci) {
                        c.add_element(ElementRef::species(alias_index));
                    }
                }
                self.add_node(alias);

                {
                    let (nodes, reactions) = (&mut self.nodes, &mut self.reactions);
                    reactions[pos].substitute_species(nodes, node_index, alias_index);
                }

                let after = self.enumerate_subgraphs();
                if after > before {
                    // Komponente würde zerfallen → zurücknehmen
                    let (nodes, reactions) = (&mut self.nodes, &mut self.reactions);
                    reactions[pos].substitute_species(nodes, alias_index, node_index);
                    let eref = ElementRef::species(alias_index);
                    self.elements.retain(|e| *e != eref);
                    for c in &mut self.compartments {
                        c.remove_element(eref);
                    }
                    self.nodes.retain(|n| n.index() != alias_index);
                } else {
                    let (nodes, reactions) = (&mut self.nodes, &mut self.reactions);
                    reactions[pos].rebuild_curves(nodes);
                    alias_count += 1;
                }
            }
        }
        alias_count
    }

    // -- Kurven-Verwaltung --

    pub fn recalc_curve_cps(&mut self) {
        let nodes = &self.nodes;
        for r in &mut self.reactions {
            r.recalc_curve_cps(nodes);
        }
    }

    /// Baut alle Kurven neu auf und kürzt sie anschließend mit den
    /// Standard-Parametern auf die Node-Boxen.
    pub fn rebuild_curves(&mut self) {
        let nodes = &self.nodes;
        for r in &mut self.reactions {
            r.rebuild_curves(nodes);
        }
        self.clip_curves(DEFAULT_CLIP_PADDING, DEFAULT_CLIP_CUTOFF);
    }

    pub fn clip_curves(&mut self, padding: f32, clip_cutoff: f32) {
        let nodes = &self.nodes;
        for r in &mut self.reactions {
            r.clip_curves(nodes, padding, clip_cutoff);
        }
    }

    pub fn recenter_junctions(&mut self) {
        let nodes = &self.nodes;
        for r in &mut self.reactions {
            r.recenter(nodes);
        }
    }

    pub fn recomp_centroids(&mut self) {
        let nodes = &self.nodes;
        for r in &mut self.reactions {
            r.recomp_centroid(nodes);
        }
    }

    // -- Geometrie über alle Elemente --

    fn element_core(&self, e: ElementRef) -> Option<&ElementCore> {
        match e.kind {
            ElementKind::Species => self.node_by_index(e.index).map(|n| &n.core),
            ElementKind::Reaction => self.reaction_by_index(e.index).map(|r| &r.core),
            ElementKind::Compartment => self.compartment_by_index(e.index).map(|c| &c.core),
        }
    }

    fn for_each_core_mut(&mut self, mut f: impl FnMut(&mut ElementCore)) {
        for n in &mut self.nodes {
            f(&mut n.core);
        }
        for r in &mut self.reactions {
            f(&mut r.core);
        }
        for c in &mut self.compartments {
            f(&mut c.core);
        }
    }

    /// Vereinigung aller Element-Extents (lokale Koordinaten).
    pub fn bounding_box(&self) -> Rect {
        let mut iter = self.elements.iter().filter_map(|e| self.element_core(*e));
        let Some(first) = iter.next() else {
            return Rect::default();
        };
        let mut b = first.bounding_box();
        for core in iter {
            b.expand(&core.bounding_box());
        }
        b
    }

    /// Alias für [`Network::bounding_box`] in der Terminologie des Treibers.
    pub fn extents(&self) -> Rect {
        self.bounding_box()
    }

    /// Setzt auf jedem Element die Transformation, die das Netzwerk
    /// formatfüllend in `window` abbildet.
    pub fn fit_to_window(&mut self, window: &Rect) {
        let tf = transform::fit_to_window(&self.bounding_box(), window);
        self.set_transform(tf);
    }

    pub fn set_transform(&mut self, tf: Affine2) {
        self.for_each_core_mut(|core| core.set_transform(tf));
    }

    /// Verschiebt alle Element-Centroids um `d`.
    pub fn apply_displacement(&mut self, d: Vec2) {
        self.for_each_core_mut(|core| core.apply_displacement(d));
    }

    // -- Kraft-/Bewegungs-Primitiven für den Layout-Treiber --

    pub fn reset_activity(&mut self) {
        for n in &mut self.nodes {
            n.core.reset_activity();
        }
        for r in &mut self.reactions {
            r.core.reset_activity();
        }
        for c in &mut self.compartments {
            c.reset_activity();
        }
    }

    pub fn update_positions(&mut self, scale: f32) {
        for n in &mut self.nodes {
            n.core.do_motion(scale);
        }
        for r in &mut self.reactions {
            r.core.do_motion(scale);
        }
        for c in &mut self.compartments {
            c.do_motion(scale);
        }
    }

    pub fn cap_deltas2(&mut self, cap2: f32) {
        for n in &mut self.nodes {
            n.core.cap_delta2(cap2);
        }
        for r in &mut self.reactions {
            r.core.cap_delta2(cap2);
        }
        for c in &mut self.compartments {
            c.cap_delta2(cap2);
        }
    }

    /// Mittlerer Centroid aller Elemente.
    pub fn pmean(&self) -> Vec2 {
        let mut m = Vec2::ZERO;
        let mut count = 0u32;
        for e in &self.elements {
            if let Some(core) = self.element_core(*e) {
                m += core.centroid(CoordSystem::Local);
                count += 1;
            }
        }
        if count > 0 {
            m /= count as f32;
        }
        m
    }

    /// Elementweise Streuung der Centroids um den Mittelwert.
    pub fn pvariance(&self) -> Vec2 {
        let m = self.pmean();
        let mut d = Vec2::ZERO;
        let mut count = 0u32;
        for e in &self.elements {
            if let Some(core) = self.element_core(*e) {
                let diff = core.centroid(CoordSystem::Local) - m;
                d += diff * diff;
                count += 1;
            }
        }
        if count > 0 {
            d = Vec2::new(d.x.sqrt(), d.y.sqrt()) / count as f32;
        }
        d
    }

    /// Verschiebt das Netzwerk, sodass der mittlere Centroid auf `p` liegt.
    pub fn recenter(&mut self, p: Vec2) {
        let d = p - self.pmean();
        self.apply_displacement(d);
    }

    /// Weist jedem ungesperrten Element eine Zufallsposition in `b` zu.
    ///
    /// Compartments erhalten zusätzlich eine quadratische Ausdehnung mit
    /// Kantenlänge `√Ruhefläche` um die neue Position. Danach werden die
    /// Kontrollpunkte aller Kurven neu berechnet.
    pub fn randomize_positions(&mut self, b: &Rect) {
        let mut rng = rand::thread_rng();
        for n in &mut self.nodes {
            if n.core.is_locked() {
                continue;
            }
            n.core.set_centroid(Vec2::new(
                rng.gen_range(b.min.x..=b.max.x),
                rng.gen_range(b.min.y..=b.max.y),
            ));
        }
        for r in &mut self.reactions {
            if r.core.is_locked() {
                continue;
            }
            r.core.set_centroid(Vec2::new(
                rng.gen_range(b.min.x..=b.max.x),
                rng.gen_range(b.min.y..=b.max.y),
            ));
        }
        for c in &mut self.compartments {
            if c.core.is_locked() {
                continue;
            }
            let side = c.rest_area().max(0.0).sqrt();
            let p = Vec2::new(
                rng.gen_range(b.min.x..=b.max.x),
                rng.gen_range(b.min.y..=b.max.y),
            );
            c.set_extents(Rect::around(p, Vec2::splat(side * 0.5)));
        }
        self.recalc_curve_cps();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A —R1— B, zusätzlich R2 an A: eine Komponente.
    fn small_net() -> Network {
        let mut net = Network::new();
        let mut a = Node::new("A", 0);
        a.core.set_centroid(Vec2::new(0.0, 0.0));
        let mut b = Node::new("B", 1);
        b.core.set_centroid(Vec2::new(200.0, 0.0));
        net.add_node(a);
        net.add_node(b);

        let r1 = net.add_reaction(Reaction::new("R1", 0));
        net.connect_node(0, r1, RxnRole::Substrate).unwrap();
        net.connect_node(1, r1, RxnRole::Product).unwrap();

        let r2 = net.add_reaction(Reaction::new("R2", 0));
        net.connect_node(0, r2, RxnRole::Substrate).unwrap();
        net
    }

    #[test]
    fn add_and_find() {
        let net = small_net();
        assert_eq!(net.node_count(), 2);
        assert_eq!(net.reaction_count(), 2);
        assert_eq!(net.elements().len(), 4);
        assert!(net.find_node_by_id("A").is_some());
        assert!(net.find_reaction_by_id("R2").is_some());
        assert!(net.find_node_by_id("C").is_none());
        assert!(net.is_node_connected(0, 0).unwrap());
        assert!(!net.is_node_connected(1, 1).unwrap());
    }

    #[test]
    fn remove_node_cascades() {
        let mut net = small_net();
        net.remove_node(0).expect("A muss entfernbar sein");

        assert_eq!(net.node_count(), 1);
        assert!(net.find_node_by_id("A").is_none());
        // R1 kennt A nicht mehr, Kurvenzahl passt zur Referenzzahl
        let r1 = net.find_reaction_by_id("R1").unwrap();
        assert!(!r1.has_species(0));
        assert_eq!(r1.curves.len(), r1.species().len());

        // doppeltes Entfernen ist ein Fehler
        assert!(net.remove_node(0).is_err());
    }

    #[test]
    fn unique_identifiers() {
        let mut net = small_net();
        assert_eq!(net.unique_id(), "Node_1");
        assert_eq!(net.unique_index(), 2);

        let mut n = Node::new("Node_1", net.unique_index());
        n.core.glyph = "G".into();
        net.add_node(n);
        assert_eq!(net.unique_id(), "Node_2");
        assert_eq!(net.unique_index(), 3);

        let src = net.find_node_by_id("Node_1").unwrap().clone();
        let g1 = net.unique_glyph_id(&src);
        let g2 = net.unique_glyph_id(&src);
        assert_ne!(g1, g2, "Glyph-Zähler muss monoton sein");
        assert!(g1.starts_with("G_"));
    }

    #[test]
    fn subgraph_enumeration_counts_components() {
        let mut net = small_net();
        assert_eq!(net.num_subgraphs(), 1);

        // isolierter Node → zweite Komponente
        net.add_node(Node::new("C", 2));
        assert_eq!(net.num_subgraphs(), 2);

        // Ausschluss von A unterbricht nichts (B hängt über R1 nur an A):
        // B und C bleiben als Einzelkomponenten
        net.find_node_by_id_mut("A").unwrap().exclude_from_subgraph_enum = true;
        assert_eq!(net.num_subgraphs(), 2);
        net.clear_exclude_flags();
    }

    #[test]
    fn alias_succeeds_when_component_stays_connected() {
        let mut net = small_net();
        let before_nodes = net.node_count();

        net.alias_node(0).expect("Aliasing von A muss gelingen");

        // pro referenzierender Reaction ein Alias, Original entfernt
        assert_eq!(net.node_count(), before_nodes + 1);

        let instances: Vec<&Node> = net.nodes().iter().filter(|n| n.id() == "A").collect();
        assert_eq!(instances.len(), 2);
        assert!(instances.iter().all(|n| n.is_alias));
        let glyphs: Vec<&str> = instances.iter().map(|n| n.glyph()).collect();
        assert!(glyphs.contains(&"A_alias0"));
        assert!(glyphs.contains(&"A_alias1"));

        // Kurvenzahl folgt der Referenzzahl
        for r in net.reactions() {
            assert_eq!(r.curves.len(), r.species().len());
        }
    }

    #[test]
    fn alias_fails_when_node_bridges_reactions() {
        // X —R1— A —R2— Y: A ist die einzige Brücke
        let mut net = Network::new();
        net.add_node(Node::new("X", 0));
        net.add_node(Node::new("A", 1));
        net.add_node(Node::new("Y", 2));
        let r1 = net.add_reaction(Reaction::new("R1", 0));
        net.connect_node(0, r1, RxnRole::Substrate).unwrap();
        net.connect_node(1, r1, RxnRole::Product).unwrap();
        let r2 = net.add_reaction(Reaction::new("R2", 0));
        net.connect_node(1, r2, RxnRole::Substrate).unwrap();
        net.connect_node(2, r2, RxnRole::Product).unwrap();

        let before = net.node_count();
        assert!(net.alias_node(1).is_err(), "Brücken-Node darf nicht aliased werden");
        assert_eq!(net.node_count(), before, "Fehlschlag darf nichts ändern");
        assert!(net.find_node_by_id("A").is_some());
        assert!(!net.find_node_by_id("A").unwrap().is_alias);
    }

    #[test]
    fn alias_by_degree_keeps_graph_connected() {
        let mut net = small_net();
        let subs_before = net.num_subgraphs();
        net.alias_by_degree(2);
        assert_eq!(net.num_subgraphs(), subs_before);
    }

    #[test]
    fn num_unique_nodes_collapses_alias_runs() {
        let mut net = Network::new();
        net.add_node(Node::new("A", 0));
        let mut a1 = Node::new("A", 1);
        a1.is_alias = true;
        let mut a2 = Node::new("A", 2);
        a2.is_alias = true;
        net.add_node(a1);
        net.add_node(a2);
        net.add_node(Node::new("B", 3));

        // A, Alias-Lauf (zählt einmal über das Folge-Element), B
        assert_eq!(net.num_unique_nodes(), 3);
        let a = net.find_node_by_id("A").unwrap().clone();
        assert_eq!(net.num_instances(&a), 3);
        assert!(net.instance(&a, 2).is_some());
        assert!(net.instance(&a, 3).is_none());
    }

    #[test]
    fn bounding_box_unions_all_extents() {
        let net = small_net();
        let b = net.bounding_box();
        // A-Box beginnt bei -40, B-Box endet bei 240
        assert_eq!(b.min.x, -40.0);
        assert_eq!(b.max.x, 240.0);
    }

    #[test]
    fn fit_to_window_contains_network() {
        let mut net = small_net();
        let window = Rect::new(Vec2::ZERO, Vec2::new(1000.0, 1000.0));
        net.fit_to_window(&window);

        for n in net.nodes() {
            let g = n.core.centroid(CoordSystem::Global);
            assert!(window.padded(1.0).contains(g), "globaler Centroid außerhalb: {g:?}");
            // itf · (tf · p) == p
            let p = n.core.centroid(CoordSystem::Local);
            let back = n.core.itf.transform_point2(n.core.tf.transform_point2(p));
            assert!((back - p).length() < 1e-2);
        }
    }

    #[test]
    fn randomize_respects_bounds_and_locks() {
        let mut net = small_net();
        net.lock_node("B");
        let locked_pos = net.find_node_by_id("B").unwrap().centroid();

        let b = Rect::new(Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0));
        net.randomize_positions(&b);

        let a = net.find_node_by_id("A").unwrap();
        assert!(b.contains(a.centroid()), "A muss in der Box liegen");
        let locked = net.find_node_by_id("B").unwrap();
        assert_eq!(locked.centroid(), locked_pos, "gesperrter Node bleibt stehen");
    }

    #[test]
    fn elide_empty_comps_removes_only_empty() {
        let mut net = small_net();
        let mut filled = Compartment::new("cyto", 0);
        filled.add_element(ElementRef::species(0));
        net.add_compartment(filled);
        net.add_compartment(Compartment::new("empty", 0));

        net.elide_empty_comps();
        assert_eq!(net.compartment_count(), 1);
        assert!(net.find_comp_by_id("cyto").is_some());
        assert!(net.find_comp_by_id("empty").is_none());
        // Element-Sicht ist mitbereinigt
        assert!(net
            .elements()
            .iter()
            .all(|e| e.kind != ElementKind::Compartment || e.index == 0));
    }

    #[test]
    fn default_compartment_ids_are_recognized() {
        assert!(is_default_compartment_id("default"));
        assert!(is_default_compartment_id("compartment"));
        assert!(is_default_compartment_id("sbnw_default_compartment"));
        assert!(!is_default_compartment_id("cytosol"));

        set_default_compartment_id("extracellular");
        assert!(is_default_compartment_id("extracellular"));
        set_default_compartment_id("");
        assert!(!is_default_compartment_id("extracellular"));
    }

    #[test]
    fn recenter_moves_pmean_onto_target() {
        let mut net = small_net();
        net.recenter(Vec2::new(500.0, 500.0));
        assert!((net.pmean() - Vec2::new(500.0, 500.0)).length() < 1e-2);
    }

    #[test]
    fn internal_forces_push_members_inward() {
        let mut net = Network::new();
        let mut n = Node::new("A", 0);
        n.core.set_centroid(Vec2::new(5.0, 50.0));
        net.add_node(n);

        let mut c = Compartment::new("C", 0);
        c.set_rest_extents(Rect::new(Vec2::ZERO, Vec2::new(100.0, 100.0)));
        c.add_element(ElementRef::species(0));
        net.add_compartment(c);

        net.reset_activity();
        net.do_internal_forces(10.0, 10.0);
        let v = net.find_node_by_id("A").unwrap().core.velocity();
        assert!(v.x > 0.0, "Node an der linken Wand muss nach innen gedrückt werden");
    }
}
