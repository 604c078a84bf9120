//! Szenario-Tests über den öffentlichen Engine-Kern: Kurvenaufbau,
//! Aliasing, Compartment-Geometrie und Fenster-Anpassung.

use glam::Vec2;
use pathway_layout::{
    network_from_document, parse_sbml, Compartment, CoordSystem, ElementRef, Network, Node,
    Reaction, Rect, RxnCurveType, RxnRole,
};

fn node_at(id: &str, index: u64, p: Vec2) -> Node {
    let mut n = Node::new(id, index);
    n.core.set_centroid(p);
    n
}

/// Szenario: Uni-Uni-Reaktion A → B.
#[test]
fn uni_uni_reaction_builds_two_meeting_curves() {
    let mut net = Network::new();
    net.add_node(node_at("A", 0, Vec2::new(0.0, 0.0)));
    net.add_node(node_at("B", 1, Vec2::new(200.0, 0.0)));
    let r = net.add_reaction(Reaction::new("R", 0));
    net.connect_node(0, r, RxnRole::Substrate).unwrap();
    net.connect_node(1, r, RxnRole::Product).unwrap();

    net.recomp_centroids();
    net.rebuild_curves();

    let rxn = net.find_reaction_by_id("R").unwrap();
    let p = rxn.core.centroid(CoordSystem::Local);
    assert!((p - Vec2::new(100.0, 0.0)).length() < 1e-3, "Junction in der Mitte");

    assert_eq!(rxn.curves.len(), 2);
    let sub = rxn
        .curves
        .iter()
        .find(|c| c.role == RxnCurveType::Substrate)
        .expect("Substrat-Kurve fehlt");
    let prd = rxn
        .curves
        .iter()
        .find(|c| c.role == RxnCurveType::Product)
        .expect("Produkt-Kurve fehlt");

    assert!((sub.e - p).length() < 1e-3, "Substrat-Kurve endet an der Junction");
    assert!((prd.s - p).length() < 1e-3, "Produkt-Kurve startet an der Junction");

    // beide Kurven halten vor den (ungepolsterten) Node-Boxen an
    let a_box = net.find_node_by_id("A").unwrap().core.bounding_box();
    let b_box = net.find_node_by_id("B").unwrap().core.bounding_box();
    assert!(sub.s.x >= a_box.max.x - 1e-3, "Substrat-Start außerhalb der A-Box");
    assert!(prd.e.x <= b_box.min.x + 1e-3, "Produkt-Ende außerhalb der B-Box");
}

/// Szenario: Loop-Reaktion A → A.
#[test]
fn loop_reaction_produces_visible_loop() {
    let mut net = Network::new();
    net.add_node(node_at("A", 0, Vec2::new(0.0, 0.0)));
    let r = net.add_reaction(Reaction::new("R", 0));
    net.connect_node(0, r, RxnRole::Substrate).unwrap();
    net.connect_node(0, r, RxnRole::Product).unwrap();

    let rxn = net.find_reaction_by_id_mut("R").unwrap();
    rxn.core.set_centroid(Vec2::new(100.0, 0.0));
    net.rebuild_curves();

    let rxn = net.find_reaction_by_id("R").unwrap();
    assert_eq!(rxn.curves.len(), 2);

    // Loop-Behandlung: Kontrollpunkte liegen nicht auf der Sehne A → Junction
    let a = net.find_node_by_id("A").unwrap().centroid();
    let p = rxn.core.centroid(CoordSystem::Local);
    let chord = (p - a).normalize();
    let sub = rxn
        .curves
        .iter()
        .find(|c| c.role == RxnCurveType::Substrate)
        .unwrap();
    let rel = (sub.c2 - a).normalize_or_zero();
    let cross = chord.x * rel.y - chord.y * rel.x;
    assert!(
        cross.abs() > 0.05,
        "Loop-Kurven müssen seitlich ausweichen (cross = {cross})"
    );
}

/// Szenario: Aliasing-Machbarkeit (gemeinsame Komponente vs. Brücke).
#[test]
fn aliasing_feasibility_gate() {
    // A und B über R1 verbunden, R2 hängt nur an A → Aliasing erlaubt
    let mut net = Network::new();
    net.add_node(node_at("A", 0, Vec2::ZERO));
    net.add_node(node_at("B", 1, Vec2::new(200.0, 0.0)));
    let r1 = net.add_reaction(Reaction::new("R1", 0));
    net.connect_node(0, r1, RxnRole::Substrate).unwrap();
    net.connect_node(1, r1, RxnRole::Product).unwrap();
    let r2 = net.add_reaction(Reaction::new("R2", 0));
    net.connect_node(0, r2, RxnRole::Substrate).unwrap();

    let nodes_before = net.node_count();
    net.alias_node(0).expect("Aliasing muss gelingen");
    assert!(net.node_count() > nodes_before, "Node-Zahl muss wachsen");
    assert!(net.nodes().iter().filter(|n| n.id() == "A").all(|n| n.is_alias));

    // A als einzige Brücke zwischen zwei Reaktionen → Aliasing abgelehnt
    let mut net = Network::new();
    net.add_node(node_at("X", 0, Vec2::ZERO));
    net.add_node(node_at("A", 1, Vec2::new(100.0, 0.0)));
    net.add_node(node_at("Y", 2, Vec2::new(200.0, 0.0)));
    let r1 = net.add_reaction(Reaction::new("R1", 0));
    net.connect_node(0, r1, RxnRole::Substrate).unwrap();
    net.connect_node(1, r1, RxnRole::Product).unwrap();
    let r2 = net.add_reaction(Reaction::new("R2", 0));
    net.connect_node(1, r2, RxnRole::Substrate).unwrap();
    net.connect_node(2, r2, RxnRole::Product).unwrap();

    let nodes_before = net.node_count();
    assert!(net.alias_node(1).is_err(), "Brücken-Aliasing muss scheitern");
    assert_eq!(net.node_count(), nodes_before, "Zustand bleibt unverändert");
    assert_eq!(net.num_instances(&net.find_node_by_id("A").unwrap().clone()), 1);
}

/// Szenario: Compartment umschließt punktförmige Mitglieder mit Polsterung.
#[test]
fn compartment_enclose_matches_padded_union() {
    let mut net = Network::new();
    let mut n1 = node_at("N1", 0, Vec2::new(200.0, 200.0));
    n1.set_width(0.0);
    n1.set_height(0.0);
    let mut n2 = node_at("N2", 1, Vec2::new(300.0, 300.0));
    n2.set_width(0.0);
    n2.set_height(0.0);
    net.add_node(n1);
    net.add_node(n2);

    let mut c = Compartment::new("C", 0);
    c.set_rest_extents(Rect::new(Vec2::ZERO, Vec2::new(100.0, 100.0)));
    c.add_element(ElementRef::species(0));
    c.add_element(ElementRef::species(1));
    net.add_compartment(c);

    net.resize_comps_enclose(10.0);

    let c = net.find_comp_by_id("C").unwrap();
    assert_eq!(c.core.bounding_box().min, Vec2::new(190.0, 190.0));
    assert_eq!(c.core.bounding_box().max, Vec2::new(310.0, 310.0));
}

/// Szenario: Fit-to-Window füllt das Fenster bei erhaltenem Seitenverhältnis.
#[test]
fn fit_to_window_fills_and_centers() {
    let mut net = Network::new();
    net.add_node(node_at("A", 0, Vec2::new(0.0, 0.0)));
    net.add_node(node_at("B", 1, Vec2::new(400.0, 200.0)));

    let window = Rect::new(Vec2::ZERO, Vec2::new(1000.0, 1000.0));
    net.fit_to_window(&window);

    // globale Bounding-Box aus den transformierten Element-Boxen
    let mut global = None::<Rect>;
    for n in net.nodes() {
        let b = n.core.bounding_box();
        let mapped = Rect::new(
            n.core.tf.transform_point2(b.min),
            n.core.tf.transform_point2(b.max),
        );
        global = Some(match global {
            None => mapped,
            Some(mut g) => {
                g.expand(&mapped);
                g
            }
        });
    }
    let global = global.unwrap();

    assert!(global.min.x >= -0.5 && global.max.x <= 1000.5, "x-Ausdehnung füllt das Fenster");
    // Seitenverhältnis der lokalen Box (480×240 = 2:1) bleibt erhalten
    assert!((global.width() / global.height() - 2.0).abs() < 1e-2);
    // zentriert
    assert!((global.center() - Vec2::new(500.0, 500.0)).length() < 1.0);
}

/// Szenario: zwei Species-Glyphen derselben Species erzeugen beim Import
/// genau einen Alias.
#[test]
fn alias_on_import_marks_second_glyph() {
    let xml = r#"<sbml level="3" version="1"><model id="m">
      <listOfSpecies><species id="S"/></listOfSpecies>
      <layout:listOfLayouts>
        <layout:layout layout:id="l1">
          <layout:dimensions layout:width="400" layout:height="400"/>
          <layout:listOfSpeciesGlyphs>
            <layout:speciesGlyph layout:id="SG1" layout:species="S">
              <layout:boundingBox>
                <layout:position layout:x="0" layout:y="0"/>
                <layout:dimensions layout:width="80" layout:height="40"/>
              </layout:boundingBox>
            </layout:speciesGlyph>
            <layout:speciesGlyph layout:id="SG2" layout:species="S">
              <layout:boundingBox>
                <layout:position layout:x="200" layout:y="200"/>
                <layout:dimensions layout:width="80" layout:height="40"/>
              </layout:boundingBox>
            </layout:speciesGlyph>
          </layout:listOfSpeciesGlyphs>
        </layout:layout>
      </layout:listOfLayouts>
    </model></sbml>"#;

    let doc = parse_sbml(xml).expect("Parsing fehlgeschlagen");
    let loaded = network_from_document(&doc).expect("Import fehlgeschlagen");
    let net = &loaded.network;

    assert_eq!(net.node_count(), 2);
    let s = net.find_node_by_id("S").unwrap().clone();
    assert_eq!(net.num_instances(&s), 2);

    let by_glyph = |g: &str| net.find_node_by_glyph(g).unwrap();
    assert!(!by_glyph("SG1").is_alias, "erster Glyph beansprucht den Node");
    assert!(by_glyph("SG2").is_alias, "zweiter Glyph wird zum Alias");
    assert_eq!(by_glyph("SG1").id(), "S");
    assert_eq!(by_glyph("SG2").id(), "S");
}

/// Gesperrte Elemente überstehen eine Randomisierung unverändert.
#[test]
fn randomize_moves_only_unlocked_elements() {
    let mut net = Network::new();
    net.add_node(node_at("A", 0, Vec2::new(-500.0, -500.0)));
    net.add_node(node_at("B", 1, Vec2::new(-600.0, -600.0)));
    net.lock_node("B");

    let bounds = Rect::new(Vec2::ZERO, Vec2::new(100.0, 100.0));
    net.randomize_positions(&bounds);

    assert!(bounds.contains(net.find_node_by_id("A").unwrap().centroid()));
    assert_eq!(
        net.find_node_by_id("B").unwrap().centroid(),
        Vec2::new(-600.0, -600.0)
    );
}
