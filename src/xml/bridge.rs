//! Brücke zwischen geparstem SBML-Dokument und dem Netzwerk-Modell.
//!
//! Baut das Netzwerk aus dem Modell-Teil auf und verfeinert es mit dem
//! Layout-Block: Compartment-Ausdehnungen, Species-Positionen (inklusive
//! Alias-Erzeugung für mehrfache Glyphen), Reaction-Centroids und
//! vorbefüllte Kurven.

use super::parser::{SbmlDocument, SbmlLayout, SpeciesRefGlyphDesc};
use crate::core::{
    is_default_compartment_id, Canvas, Compartment, CoordSystem, ElementRef, Network, Node,
    Reaction, RxnRole,
};
use anyhow::{bail, Result};
use glam::Vec2;

/// Ergebnis des Imports: Netzwerk plus Zeichenfläche.
#[derive(Debug, Clone)]
pub struct LoadedLayout {
    pub network: Network,
    pub canvas: Canvas,
    pub level: u32,
    pub version: u32,
}

/// Baut aus einem geparsten Dokument das Netzwerk.
///
/// Mit Layout-Block wird die annotierte Geometrie übernommen und die
/// Zeichenfläche aus dessen `<dimensions>` gesetzt; ohne Layout bleibt die
/// Standard-Zeichenfläche.
pub fn network_from_document(doc: &SbmlDocument) -> Result<LoadedLayout> {
    let network = match &doc.layout {
        Some(lay) => network_from_layout(doc, lay)?,
        None => network_from_model(doc)?,
    };
    let canvas = match &doc.layout {
        Some(lay) if lay.width > 0.0 && lay.height > 0.0 => Canvas::new(lay.width, lay.height),
        _ => Canvas::default(),
    };
    Ok(LoadedLayout {
        network,
        canvas,
        level: doc.level,
        version: doc.version,
    })
}

/// Baut das Netzwerk allein aus dem Modell-Teil (ohne Layout-Annotationen).
pub fn network_from_model(doc: &SbmlDocument) -> Result<Network> {
    let mut net = Network::new();
    net.id = doc.model_id.clone();

    // Compartments; Default-Sentinels und SBO-410 werden nicht angelegt
    for comp in &doc.compartments {
        if comp.sbo_term == Some(410) || is_default_compartment_id(&comp.id) {
            continue;
        }
        let mut c = Compartment::new(comp.id.clone(), 0);
        if let Some(name) = &comp.name {
            c.core.name = name.clone();
        }
        net.add_compartment(c);
    }

    // Species → Nodes mit aufsteigendem Index
    for (i, sp) in doc.species.iter().enumerate() {
        let index = i as u64;
        let mut n = Node::new(sp.id.clone(), index);
        n.core.name = sp.name.clone().unwrap_or_default();
        n.num_uses = 1;

        if let Some(cid) = &sp.compartment {
            if let Some(c) = net.find_comp_by_id_mut(cid) {
                c.add_element(ElementRef::species(index));
                n.compartment = Some(cid.clone());
            }
        }
        net.add_node(n);
    }

    net.elide_empty_comps();
    net.autosize_comps();

    // Reactions mit Substrat-/Produkt-/Modifier-Referenzen
    for rxn in &doc.reactions {
        let mut r = Reaction::new(rxn.id.clone(), 0);
        r.reversible = rxn.reversible;
        r.fast = rxn.fast;

        for (ids, role) in [
            (&rxn.reactants, RxnRole::Substrate),
            (&rxn.products, RxnRole::Product),
            (&rxn.modifiers, RxnRole::Modifier),
        ] {
            for species_id in ids {
                let Some(node) = net.find_node_by_id_mut(species_id) else {
                    bail!(
                        "Ungültige Species-Referenz '{species_id}' in Reaction '{}'",
                        rxn.id
                    );
                };
                r.add_species_ref(node, role);
            }
        }

        let r_index = net.add_reaction(r);
        if let Some(cid) = &rxn.compartment {
            if let Some(c) = net.find_comp_by_id_mut(cid) {
                c.add_element(ElementRef::reaction(r_index));
            }
        }
    }

    Ok(net)
}

/// Baut das Netzwerk und übernimmt die Layout-Annotationen.
pub fn network_from_layout(doc: &SbmlDocument, lay: &SbmlLayout) -> Result<Network> {
    let mut net = network_from_model(doc)?;

    // Nutzungszähler zurücksetzen: der erste Species-Glyph beansprucht
    // den Node, weitere erzeugen Aliase
    for n in net.nodes_mut() {
        n.num_uses = 0;
    }

    for cg in &lay.compartment_glyphs {
        match net.find_comp_by_id_mut(&cg.compartment) {
            Some(c) => {
                c.core.glyph = cg.id.clone();
                c.set_rest_extents(cg.bbox);
            }
            None => log::warn!(
                "Compartment-Glyph '{}' verweist auf unbekanntes Compartment '{}' — verworfen",
                cg.id,
                cg.compartment
            ),
        }
    }

    // Startpositionen: Mitglieder auf den Centroid ihres Compartments setzen
    let node_indices: Vec<u64> = net.nodes().iter().map(|n| n.index()).collect();
    for index in node_indices {
        let seed = net
            .find_containing_compartment(ElementRef::species(index))
            .map(|c| c.core.centroid(CoordSystem::Local));
        if let (Some(p), Some(n)) = (seed, net.node_by_index_mut(index)) {
            n.core.set_centroid(p);
        }
    }
    let rxn_indices: Vec<u64> = net.reactions().iter().map(|r| r.index()).collect();
    for index in rxn_indices {
        let seed = net
            .find_containing_compartment(ElementRef::reaction(index))
            .map(|c| c.core.centroid(CoordSystem::Local));
        if let (Some(p), Some(r)) = (seed, net.reaction_by_index_mut(index)) {
            r.core.set_centroid(p);
        }
    }

    // Species-Glyphen binden; zweite und weitere erzeugen Alias-Nodes
    for sg in &lay.species_glyphs {
        let claimed = match net.find_node_by_id_mut(&sg.species) {
            None => {
                log::warn!(
                    "Species-Glyph '{}' verweist auf unbekannte Species '{}' — verworfen",
                    sg.id,
                    sg.species
                );
                continue;
            }
            Some(n) => {
                if n.num_uses == 0 {
                    n.num_uses = 1;
                    n.core.glyph = sg.id.clone();
                    Some(n.index())
                } else {
                    None
                }
            }
        };

        let target = match claimed {
            Some(index) => index,
            None => {
                // Alias-Kopie mit eigenem Glyph und Index
                let original = net
                    .find_node_by_id(&sg.species)
                    .expect("oben gefunden")
                    .clone();
                let index = net.unique_index();
                net.add_node(original.alias_copy(sg.id.clone(), index));
                index
            }
        };

        if let Some(n) = net.node_by_index_mut(target) {
            n.core.set_centroid(sg.bbox.center());
            n.set_width(sg.bbox.width());
            n.set_height(sg.bbox.height());
        }
    }

    // Reaction-Glyphen: Rollen substituieren, Centroid und Kurven übernehmen
    for rg in &lay.reaction_glyphs {
        if net.find_reaction_by_id(&rg.reaction).is_none() {
            log::warn!(
                "Reaction-Glyph '{}' verweist auf unbekannte Reaction '{}' — verworfen",
                rg.id,
                rg.reaction
            );
            continue;
        }

        // nur Referenz-Glyphen mit bekannter Rolle und bekanntem Species-Glyph
        let valid_refs: Vec<(&SpeciesRefGlyphDesc, RxnRole, u64, String)> = rg
            .species_refs
            .iter()
            .filter_map(|srg| {
                let Some(role) = RxnRole::parse(&srg.role) else {
                    log::warn!(
                        "Species-Referenz-Glyph '{}' mit unbekannter Rolle '{}' — verworfen",
                        srg.id,
                        srg.role
                    );
                    return None;
                };
                let Some(alias) = net.find_node_by_glyph(&srg.species_glyph) else {
                    log::warn!(
                        "Species-Referenz-Glyph '{}' verweist auf unbekannten Glyph '{}' — verworfen",
                        srg.id,
                        srg.species_glyph
                    );
                    return None;
                };
                Some((srg, role, alias.index(), alias.id().to_string()))
            })
            .collect();

        for (_, role, alias_index, alias_id) in &valid_refs {
            net.substitute_species_in_reaction(&rg.reaction, alias_id, *alias_index, *role);
        }

        let nonzero_bbox = rg.bbox.filter(|b| {
            !(b.min == Vec2::ZERO && b.width() == 0.0 && b.height() == 0.0)
        });

        let Some((r, nodes)) = net.reaction_and_nodes_mut(&rg.reaction) else {
            continue;
        };
        r.delete_curves();

        if let Some(bbox) = nonzero_bbox {
            // Bounding-Box-Position als Centroid (der eigentliche Weg)
            r.core.set_centroid(bbox.min);
        } else if !rg.curve_segments.is_empty() {
            // Centroid aus dem ersten Segment des Reaction-Glyph-Kurvenzugs
            r.core.set_centroid(rg.curve_segments[0].end);

            for (srg, role, _, _) in &valid_refs {
                let node_index = nodes
                    .iter()
                    .find(|n| n.glyph() == srg.species_glyph)
                    .map(|n| n.index());
                r.add_curve(*role, node_index);
            }
            r.recalc_curve_cps(nodes);
            r.clear_dirty();

            // CP-Daten aus den annotierten Kurven übernehmen
            for (c, (srg, _, _, _)) in r.curves.iter_mut().zip(valid_refs.iter()) {
                let Some(seg) = srg.curve else { continue };
                c.s = seg.start;
                c.e = seg.end;
                match (seg.base1, seg.base2) {
                    (Some(b1), b2) => {
                        c.c1 = b1;
                        c.c2 = b2.unwrap_or(b1);
                    }
                    (None, _) => {
                        // Gerade: Kontrollpunkte 10 % zu den Endpunkten
                        // rücken, damit die Endkappen ausgerichtet sind
                        c.c1 = 0.9 * seg.start + 0.1 * seg.end;
                        c.c2 = 0.9 * seg.end + 0.1 * seg.start;
                    }
                }
            }
        } else {
            // Notbehelf: Mittel der Species-Positionen
            r.force_recalc_centroid(nodes);
        }
    }

    net.layout_specified = true;
    Ok(net)
}
