//! Writer für SBML-Dokumente mit Layout-Block.
//!
//! Baut die Ausgabe als String auf: Modell-Teil (Compartments, Species,
//! Reactions) plus Layout-Block mit Compartment-, Species-, Text- und
//! Reaction-Glyphen samt Kurven-Kontrollpunkten.

use crate::core::{Canvas, CoordSystem, ElementRef, Network, Rect, RxnRole};
use anyhow::Result;

/// Schreibt das Netzwerk als SBML-String.
///
/// Baut zuvor alle Kurven neu auf und vergibt fehlende Glyph-Ids
/// (`<id>_Glyph`, Aliase `<id>_Alias<k>_Glyph`). Species ohne Compartment
/// landen im auto-erzeugten `sbnw_default_compartment` (SBO 410).
pub fn write_sbml(net: &mut Network, canvas: &Canvas) -> Result<String> {
    net.rebuild_curves();

    // fehlende Glyph-Ids vergeben
    let mut alias_counter = 0u64;
    for n in net.nodes_mut() {
        if n.core.glyph.is_empty() {
            if !n.is_alias {
                n.core.glyph = format!("{}_Glyph", n.core.id);
            } else {
                alias_counter += 1;
                n.core.glyph = format!("{}_Alias{}_Glyph", n.core.id, alias_counter);
            }
        }
    }

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(
        "<sbml xmlns=\"http://www.sbml.org/sbml/level3/version1/core\" \
         xmlns:layout=\"http://www.sbml.org/sbml/level3/version1/layout/version1\" \
         level=\"3\" version=\"1\" layout:required=\"false\">\n",
    );
    match &net.id {
        Some(id) => out.push_str(&format!("  <model id=\"{}\">\n", escape_xml(id))),
        None => out.push_str("  <model>\n"),
    }

    // Species ohne Compartment?
    let needs_default_comp = net.nodes().iter().any(|n| {
        net.find_containing_compartment(ElementRef::species(n.index()))
            .is_none()
    });
    let default_comp_exists = net.find_comp_by_id("sbnw_default_compartment").is_some();

    // -- Modell: Compartments --
    if net.compartment_count() > 0 || needs_default_comp {
        out.push_str("    <listOfCompartments>\n");
        for c in net.compartments() {
            out.push_str(&format!(
                "      <compartment id=\"{}\" size=\"1\" constant=\"false\"/>\n",
                escape_xml(c.id())
            ));
        }
        if needs_default_comp && !default_comp_exists {
            out.push_str(
                "      <compartment id=\"sbnw_default_compartment\" sboTerm=\"SBO:0000410\" \
                 size=\"1\" constant=\"false\"/>\n",
            );
        }
        out.push_str("    </listOfCompartments>\n");
    }

    // -- Modell: Species (Aliase nur einmal) --
    out.push_str("    <listOfSpecies>\n");
    let mut seen_species: Vec<&str> = Vec::new();
    for n in net.nodes() {
        if seen_species.contains(&n.id()) {
            continue;
        }
        seen_species.push(n.id());
        let comp_id = net
            .find_containing_compartment(ElementRef::species(n.index()))
            .map(|c| c.id().to_string())
            .unwrap_or_else(|| "sbnw_default_compartment".to_string());
        let name_attr = if n.core.name.is_empty() {
            String::new()
        } else {
            format!(" name=\"{}\"", escape_xml(&n.core.name))
        };
        out.push_str(&format!(
            "      <species id=\"{}\"{} compartment=\"{}\" initialConcentration=\"0\" \
             boundaryCondition=\"false\" hasOnlySubstanceUnits=\"false\" constant=\"false\"/>\n",
            escape_xml(n.id()),
            name_attr,
            escape_xml(&comp_id)
        ));
    }
    out.push_str("    </listOfSpecies>\n");

    // -- Modell: Reactions --
    out.push_str("    <listOfReactions>\n");
    for r in net.reactions() {
        out.push_str(&format!(
            "      <reaction id=\"{}\" reversible=\"{}\" fast=\"{}\">\n",
            escape_xml(r.id()),
            r.reversible,
            r.fast
        ));

        let mut reactants = Vec::new();
        let mut products = Vec::new();
        let mut modifiers = Vec::new();
        for (index, role) in r.species() {
            let Some(node) = net.node_by_index(*index) else {
                continue;
            };
            match role {
                RxnRole::Substrate | RxnRole::SideSubstrate => reactants.push(node.id()),
                RxnRole::Product | RxnRole::SideProduct => products.push(node.id()),
                RxnRole::Modifier | RxnRole::Activator | RxnRole::Inhibitor => {
                    modifiers.push(node.id())
                }
            }
        }
        write_species_refs(&mut out, "listOfReactants", "speciesReference", &reactants);
        write_species_refs(&mut out, "listOfProducts", "speciesReference", &products);
        write_species_refs(
            &mut out,
            "listOfModifiers",
            "modifierSpeciesReference",
            &modifiers,
        );

        out.push_str("      </reaction>\n");
    }
    out.push_str("    </listOfReactions>\n");

    // -- Layout-Block --
    out.push_str("    <layout:listOfLayouts>\n");
    out.push_str("      <layout:layout layout:id=\"Pathway_Layout\">\n");
    out.push_str(&format!(
        "        <layout:dimensions layout:width=\"{}\" layout:height=\"{}\"/>\n",
        format_float(canvas.width),
        format_float(canvas.height)
    ));

    if net.compartment_count() > 0 {
        out.push_str("        <layout:listOfCompartmentGlyphs>\n");
        for c in net.compartments() {
            let glyph = if c.core.glyph.is_empty() {
                format!("{}_Glyph", c.id())
            } else {
                c.core.glyph.clone()
            };
            out.push_str(&format!(
                "          <layout:compartmentGlyph layout:id=\"{}\" layout:compartment=\"{}\">\n",
                escape_xml(&glyph),
                escape_xml(c.id())
            ));
            push_bbox(&mut out, "            ", &c.core.bounding_box());
            out.push_str("          </layout:compartmentGlyph>\n");
        }
        out.push_str("        </layout:listOfCompartmentGlyphs>\n");
    }

    out.push_str("        <layout:listOfSpeciesGlyphs>\n");
    for n in net.nodes() {
        out.push_str(&format!(
            "          <layout:speciesGlyph layout:id=\"{}\" layout:species=\"{}\">\n",
            escape_xml(n.glyph()),
            escape_xml(n.id())
        ));
        push_bbox(&mut out, "            ", &n.core.bounding_box());
        out.push_str("          </layout:speciesGlyph>\n");
    }
    out.push_str("        </layout:listOfSpeciesGlyphs>\n");

    out.push_str("        <layout:listOfReactionGlyphs>\n");
    for r in net.reactions() {
        out.push_str(&format!(
            "          <layout:reactionGlyph layout:id=\"{}_Glyph\" layout:reaction=\"{}\">\n",
            escape_xml(r.id()),
            escape_xml(r.id())
        ));
        // Centroid über die Bounding-Box-Position transportieren
        let centroid = r.core.centroid(CoordSystem::Local);
        push_bbox(
            &mut out,
            "            ",
            &Rect {
                min: centroid,
                max: centroid + glam::Vec2::splat(10.0),
            },
        );

        if !r.curves.is_empty() {
            out.push_str("            <layout:listOfSpeciesReferenceGlyphs>\n");
            for (k, c) in r.curves.iter().enumerate() {
                let Some(node) = c.node_index.and_then(|i| net.node_by_index(i)) else {
                    continue;
                };
                let role = r
                    .species()
                    .get(k)
                    .map(|(_, role)| *role)
                    .unwrap_or(c.role.representative_role());
                out.push_str(&format!(
                    "              <layout:speciesReferenceGlyph layout:id=\"{}_SpeciesRef{}\" \
                     layout:speciesReference=\"{}\" layout:speciesGlyph=\"{}\" layout:role=\"{}\">\n",
                    escape_xml(r.id()),
                    k + 1,
                    escape_xml(node.id()),
                    escape_xml(node.glyph()),
                    role.as_str()
                ));
                out.push_str("                <layout:curve>\n");
                out.push_str("                  <layout:listOfCurveSegments>\n");
                out.push_str(
                    "                    <layout:curveSegment xsi:type=\"CubicBezier\">\n",
                );
                push_point(&mut out, "                      ", "start", c.s);
                push_point(&mut out, "                      ", "end", c.e);
                push_point(&mut out, "                      ", "basePoint1", c.c1);
                push_point(&mut out, "                      ", "basePoint2", c.c2);
                out.push_str("                    </layout:curveSegment>\n");
                out.push_str("                  </layout:listOfCurveSegments>\n");
                out.push_str("                </layout:curve>\n");
                out.push_str("              </layout:speciesReferenceGlyph>\n");
            }
            out.push_str("            </layout:listOfSpeciesReferenceGlyphs>\n");
        }
        out.push_str("          </layout:reactionGlyph>\n");
    }
    out.push_str("        </layout:listOfReactionGlyphs>\n");

    out.push_str("        <layout:listOfTextGlyphs>\n");
    for n in net.nodes() {
        let text = if n.core.name.is_empty() {
            n.id()
        } else {
            n.core.name.as_str()
        };
        out.push_str(&format!(
            "          <layout:textGlyph layout:id=\"t{}\" layout:graphicalObject=\"{}\" \
             layout:text=\"{}\">\n",
            escape_xml(n.glyph()),
            escape_xml(n.glyph()),
            escape_xml(text)
        ));
        push_bbox(&mut out, "            ", &n.core.bounding_box());
        out.push_str("          </layout:textGlyph>\n");
    }
    out.push_str("        </layout:listOfTextGlyphs>\n");

    out.push_str("      </layout:layout>\n");
    out.push_str("    </layout:listOfLayouts>\n");
    out.push_str("  </model>\n");
    out.push_str("</sbml>\n");

    Ok(out)
}

fn write_species_refs(out: &mut String, list_tag: &str, ref_tag: &str, ids: &[&str]) {
    if ids.is_empty() {
        return;
    }
    out.push_str(&format!("        <{list_tag}>\n"));
    for id in ids {
        if ref_tag == "speciesReference" {
            out.push_str(&format!(
                "          <{ref_tag} species=\"{}\" stoichiometry=\"1\" constant=\"false\"/>\n",
                escape_xml(id)
            ));
        } else {
            out.push_str(&format!(
                "          <{ref_tag} species=\"{}\"/>\n",
                escape_xml(id)
            ));
        }
    }
    out.push_str(&format!("        </{list_tag}>\n"));
}

fn push_bbox(out: &mut String, indent: &str, r: &Rect) {
    out.push_str(&format!("{indent}<layout:boundingBox>\n"));
    out.push_str(&format!(
        "{indent}  <layout:position layout:x=\"{}\" layout:y=\"{}\"/>\n",
        format_float(r.min.x),
        format_float(r.min.y)
    ));
    out.push_str(&format!(
        "{indent}  <layout:dimensions layout:width=\"{}\" layout:height=\"{}\"/>\n",
        format_float(r.width()),
        format_float(r.height())
    ));
    out.push_str(&format!("{indent}</layout:boundingBox>\n"));
}

fn push_point(out: &mut String, indent: &str, tag: &str, p: glam::Vec2) {
    out.push_str(&format!(
        "{indent}<layout:{tag} layout:x=\"{}\" layout:y=\"{}\"/>\n",
        format_float(p.x),
        format_float(p.y)
    ));
}

fn format_float(value: f32) -> String {
    format!("{:.3}", value)
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Node, Reaction};
    use glam::Vec2;

    fn sample_net() -> Network {
        let mut net = Network::new();
        net.id = Some("m1".into());
        let mut a = Node::new("A", 0);
        a.core.name = "Glucose <& co>".into();
        a.core.set_centroid(Vec2::new(0.0, 0.0));
        net.add_node(a);
        let mut b = Node::new("B", 1);
        b.core.set_centroid(Vec2::new(200.0, 0.0));
        net.add_node(b);
        let r = net.add_reaction(Reaction::new("R1", 0));
        net.connect_node(0, r, RxnRole::Substrate).unwrap();
        net.connect_node(1, r, RxnRole::Product).unwrap();
        net
    }

    #[test]
    fn writes_model_and_layout_sections() {
        let mut net = sample_net();
        net.recomp_centroids();
        let xml = write_sbml(&mut net, &Canvas::default()).expect("Export fehlgeschlagen");

        assert!(xml.contains("<model id=\"m1\">"));
        assert!(xml.contains("species id=\"A\""));
        assert!(xml.contains("reaction id=\"R1\""));
        assert!(xml.contains("layout:role=\"SUBSTRATE\""));
        assert!(xml.contains("layout:role=\"PRODUCT\""));
        assert!(xml.contains("CubicBezier"));
        // Name ist escaped
        assert!(xml.contains("Glucose &lt;&amp; co&gt;"));
    }

    #[test]
    fn missing_compartment_emits_default() {
        let mut net = sample_net();
        let xml = write_sbml(&mut net, &Canvas::default()).unwrap();
        assert!(xml.contains("sbnw_default_compartment"));
        assert!(xml.contains("SBO:0000410"));
        assert!(xml.contains("compartment=\"sbnw_default_compartment\""));
    }

    #[test]
    fn autogenerates_glyph_ids() {
        let mut net = sample_net();
        let mut alias = Node::new("A", 2);
        alias.is_alias = true;
        net.add_node(alias);

        let xml = write_sbml(&mut net, &Canvas::default()).unwrap();
        assert!(xml.contains("layout:id=\"A_Glyph\""));
        assert!(xml.contains("layout:id=\"B_Glyph\""));
        assert!(xml.contains("layout:id=\"A_Alias1_Glyph\""));
        // Text-Glyph: Name, sonst Id
        assert!(xml.contains("layout:text=\"B\""));
    }

    #[test]
    fn format_float_precision() {
        assert_eq!(format_float(123.456_79), "123.457");
        assert_eq!(format_float(100.0), "100.000");
        assert_eq!(format_float(-50.123_456), "-50.123");
    }
}
