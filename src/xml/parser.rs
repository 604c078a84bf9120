//! Parser für SBML-Dokumente mit optionalem Layout-Block.
//!
//! Liest das XML in Dokument-Strukturen ([`SbmlDocument`]); die Brücke in
//! [`crate::xml::bridge`] baut daraus das Netzwerk. Namespace-Präfixe
//! (`layout:` etc.) werden über die lokalen Namen ignoriert.

use crate::core::Rect;
use anyhow::{Context, Result};
use glam::Vec2;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Ein geparstes SBML-Dokument (Modell + optionaler Layout-Block).
#[derive(Debug, Clone, Default)]
pub struct SbmlDocument {
    pub model_id: Option<String>,
    pub level: u32,
    pub version: u32,
    pub compartments: Vec<SbmlCompartment>,
    pub species: Vec<SbmlSpecies>,
    pub reactions: Vec<SbmlReaction>,
    pub layout: Option<SbmlLayout>,
    /// Anzahl weiterer Layout-Blöcke, die ignoriert wurden
    pub extra_layouts: u32,
}

#[derive(Debug, Clone, Default)]
pub struct SbmlCompartment {
    pub id: String,
    pub name: Option<String>,
    pub sbo_term: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct SbmlSpecies {
    pub id: String,
    pub name: Option<String>,
    pub compartment: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SbmlReaction {
    pub id: String,
    pub compartment: Option<String>,
    pub reversible: bool,
    pub fast: bool,
    pub reactants: Vec<String>,
    pub products: Vec<String>,
    pub modifiers: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SbmlLayout {
    pub width: f32,
    pub height: f32,
    pub compartment_glyphs: Vec<CompartmentGlyphDesc>,
    pub species_glyphs: Vec<SpeciesGlyphDesc>,
    pub reaction_glyphs: Vec<ReactionGlyphDesc>,
}

#[derive(Debug, Clone, Default)]
pub struct CompartmentGlyphDesc {
    pub id: String,
    pub compartment: String,
    pub bbox: Rect,
}

#[derive(Debug, Clone, Default)]
pub struct SpeciesGlyphDesc {
    pub id: String,
    pub species: String,
    pub bbox: Rect,
}

#[derive(Debug, Clone, Default)]
pub struct ReactionGlyphDesc {
    pub id: String,
    pub reaction: String,
    pub bbox: Option<Rect>,
    /// Kurvensegmente des Reaction-Glyphs selbst (Centroid-Quelle)
    pub curve_segments: Vec<CurveSegmentDesc>,
    pub species_refs: Vec<SpeciesRefGlyphDesc>,
}

#[derive(Debug, Clone, Default)]
pub struct SpeciesRefGlyphDesc {
    pub id: String,
    pub species_glyph: String,
    /// Rollen-String wie annotiert; wird erst in der Brücke validiert
    pub role: String,
    pub curve: Option<CurveSegmentDesc>,
}

/// Ein Kurvensegment: Linie (ohne Basispunkte) oder kubisches Bézier.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurveSegmentDesc {
    pub start: Vec2,
    pub end: Vec2,
    pub base1: Option<Vec2>,
    pub base2: Option<Vec2>,
}

/// Abschnitt innerhalb einer Reaction für Species-Referenzen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefSection {
    None,
    Reactants,
    Products,
    Modifiers,
}

/// Parst ein SBML-Dokument aus einem XML-String.
pub fn parse_sbml(xml_content: &str) -> Result<SbmlDocument> {
    let mut reader = Reader::from_str(xml_content);
    reader.config_mut().trim_text(true);

    let mut state = ParserState::new();
    let mut skip_depth = 0u32;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if skip_depth > 0 {
                    skip_depth += 1;
                    continue;
                }
                let tag = decode_name(&reader, e.local_name().as_ref())?;
                let attrs = collect_attrs(&reader, e)?;
                if state.open(&tag, &attrs) {
                    skip_depth = 1;
                }
            }
            Ok(Event::Empty(ref e)) => {
                if skip_depth > 0 {
                    continue;
                }
                let tag = decode_name(&reader, e.local_name().as_ref())?;
                let attrs = collect_attrs(&reader, e)?;
                // selbst-schließende Elemente: öffnen und sofort abschließen
                state.open(&tag, &attrs);
                state.close(&tag);
            }
            Ok(Event::End(ref e)) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                    continue;
                }
                let tag = decode_name(&reader, e.local_name().as_ref())?;
                state.close(&tag);
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(err).context("Fehler beim Parsen des SBML-XML"),
            _ => {}
        }
    }

    if state.doc.extra_layouts > 0 {
        log::warn!(
            "{} zusätzliche Layout-Blöcke im Dokument — nur der erste wird verwendet",
            state.doc.extra_layouts
        );
    }

    Ok(state.doc)
}

fn decode_name<R>(reader: &Reader<R>, raw: &[u8]) -> Result<String> {
    Ok(reader.decoder().decode(raw)?.into_owned())
}

/// Sammelt die Attribute eines Elements als (lokaler Name, Wert)-Paare.
fn collect_attrs<R>(reader: &Reader<R>, e: &BytesStart) -> Result<Vec<(String, String)>> {
    let mut attrs = Vec::new();
    for attr in e.attributes().with_checks(false) {
        let attr = attr?;
        let key = reader
            .decoder()
            .decode(attr.key.local_name().as_ref())?
            .into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.push((key, value));
    }
    Ok(attrs)
}

fn attr<'a>(attrs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn attr_f32(attrs: &[(String, String)], key: &str) -> f32 {
    attr(attrs, key)
        .and_then(|v| v.parse::<f32>().ok())
        .unwrap_or(0.0)
}

fn attr_bool(attrs: &[(String, String)], key: &str) -> bool {
    matches!(attr(attrs, key), Some("true") | Some("1"))
}

/// Parst einen SBO-Term wie `SBO:0000410` oder `410`.
fn parse_sbo_term(value: &str) -> Option<u32> {
    value.rsplit(':').next()?.parse::<u32>().ok()
}

fn point_from_attrs(attrs: &[(String, String)]) -> Vec2 {
    Vec2::new(attr_f32(attrs, "x"), attr_f32(attrs, "y"))
}

/// Zustand des Event-Parsers: offenes Dokument plus Bau-Container für
/// das jeweils innerste Element.
struct ParserState {
    doc: SbmlDocument,
    current_reaction: Option<SbmlReaction>,
    ref_section: RefSection,
    in_layout: bool,
    current_comp_glyph: Option<CompartmentGlyphDesc>,
    current_species_glyph: Option<SpeciesGlyphDesc>,
    current_rxn_glyph: Option<ReactionGlyphDesc>,
    current_srg: Option<SpeciesRefGlyphDesc>,
    bbox_open: bool,
    bbox_pos: Vec2,
    bbox_dims: Vec2,
    segment_open: bool,
    segment: CurveSegmentDesc,
}

impl ParserState {
    fn new() -> Self {
        Self {
            doc: SbmlDocument {
                level: 3,
                version: 1,
                ..Default::default()
            },
            current_reaction: None,
            ref_section: RefSection::None,
            in_layout: false,
            current_comp_glyph: None,
            current_species_glyph: None,
            current_rxn_glyph: None,
            current_srg: None,
            bbox_open: false,
            bbox_pos: Vec2::ZERO,
            bbox_dims: Vec2::ZERO,
            segment_open: false,
            segment: CurveSegmentDesc::default(),
        }
    }

    /// Öffnet ein Element; `true`, wenn sein Teilbaum übersprungen werden soll
    /// (zweiter und weitere Layout-Blöcke).
    fn open(&mut self, tag: &str, attrs: &[(String, String)]) -> bool {
        match tag {
            "sbml" => {
                if let Some(l) = attr(attrs, "level").and_then(|v| v.parse().ok()) {
                    self.doc.level = l;
                }
                if let Some(v) = attr(attrs, "version").and_then(|v| v.parse().ok()) {
                    self.doc.version = v;
                }
            }
            "model" => self.doc.model_id = attr(attrs, "id").map(str::to_string),
            "compartment" => self.doc.compartments.push(SbmlCompartment {
                id: attr(attrs, "id").unwrap_or_default().to_string(),
                name: attr(attrs, "name").map(str::to_string),
                sbo_term: attr(attrs, "sboTerm").and_then(parse_sbo_term),
            }),
            "species" => self.doc.species.push(SbmlSpecies {
                id: attr(attrs, "id").unwrap_or_default().to_string(),
                name: attr(attrs, "name").map(str::to_string),
                compartment: attr(attrs, "compartment").map(str::to_string),
            }),
            "reaction" => {
                self.current_reaction = Some(SbmlReaction {
                    id: attr(attrs, "id").unwrap_or_default().to_string(),
                    compartment: attr(attrs, "compartment").map(str::to_string),
                    reversible: attr_bool(attrs, "reversible"),
                    fast: attr_bool(attrs, "fast"),
                    ..Default::default()
                });
            }
            "listOfReactants" => self.ref_section = RefSection::Reactants,
            "listOfProducts" => self.ref_section = RefSection::Products,
            "listOfModifiers" => self.ref_section = RefSection::Modifiers,
            "speciesReference" | "modifierSpeciesReference" => {
                if let (Some(r), Some(species)) =
                    (self.current_reaction.as_mut(), attr(attrs, "species"))
                {
                    match self.ref_section {
                        RefSection::Reactants => r.reactants.push(species.to_string()),
                        RefSection::Products => r.products.push(species.to_string()),
                        RefSection::Modifiers => r.modifiers.push(species.to_string()),
                        RefSection::None => log::warn!(
                            "Species-Referenz '{species}' außerhalb einer Referenz-Liste"
                        ),
                    }
                }
            }
            "layout" => {
                if self.doc.layout.is_none() {
                    self.doc.layout = Some(SbmlLayout::default());
                    self.in_layout = true;
                } else {
                    self.doc.extra_layouts += 1;
                    return true;
                }
            }
            "dimensions" => {
                let dims = Vec2::new(attr_f32(attrs, "width"), attr_f32(attrs, "height"));
                if self.bbox_open {
                    self.bbox_dims = dims;
                } else if self.in_layout {
                    if let Some(lay) = self.doc.layout.as_mut() {
                        lay.width = dims.x;
                        lay.height = dims.y;
                    }
                }
            }
            "boundingBox" => {
                self.bbox_open = true;
                self.bbox_pos = Vec2::ZERO;
                self.bbox_dims = Vec2::ZERO;
            }
            "position" => {
                if self.bbox_open {
                    self.bbox_pos = point_from_attrs(attrs);
                }
            }
            "compartmentGlyph" => {
                self.current_comp_glyph = Some(CompartmentGlyphDesc {
                    id: attr(attrs, "id").unwrap_or_default().to_string(),
                    compartment: attr(attrs, "compartment").unwrap_or_default().to_string(),
                    bbox: Rect::default(),
                });
            }
            "speciesGlyph" => {
                self.current_species_glyph = Some(SpeciesGlyphDesc {
                    id: attr(attrs, "id").unwrap_or_default().to_string(),
                    species: attr(attrs, "species").unwrap_or_default().to_string(),
                    bbox: Rect::default(),
                });
            }
            "reactionGlyph" => {
                self.current_rxn_glyph = Some(ReactionGlyphDesc {
                    id: attr(attrs, "id").unwrap_or_default().to_string(),
                    reaction: attr(attrs, "reaction").unwrap_or_default().to_string(),
                    ..Default::default()
                });
            }
            "speciesReferenceGlyph" => {
                self.current_srg = Some(SpeciesRefGlyphDesc {
                    id: attr(attrs, "id").unwrap_or_default().to_string(),
                    species_glyph: attr(attrs, "speciesGlyph").unwrap_or_default().to_string(),
                    role: attr(attrs, "role").unwrap_or_default().to_string(),
                    curve: None,
                });
            }
            "curveSegment" => {
                self.segment_open = true;
                self.segment = CurveSegmentDesc::default();
            }
            "start" if self.segment_open => self.segment.start = point_from_attrs(attrs),
            "end" if self.segment_open => self.segment.end = point_from_attrs(attrs),
            "basePoint1" if self.segment_open => {
                self.segment.base1 = Some(point_from_attrs(attrs));
            }
            "basePoint2" if self.segment_open => {
                self.segment.base2 = Some(point_from_attrs(attrs));
            }
            _ => {}
        }
        false
    }

    /// Schließt ein Element ab (End-Event oder selbst-schließendes Tag).
    fn close(&mut self, tag: &str) {
        match tag {
            "reaction" => {
                if let Some(r) = self.current_reaction.take() {
                    self.doc.reactions.push(r);
                }
            }
            "listOfReactants" | "listOfProducts" | "listOfModifiers" => {
                self.ref_section = RefSection::None;
            }
            "layout" => self.in_layout = false,
            "boundingBox" => {
                self.bbox_open = false;
                let rect = Rect::new(self.bbox_pos, self.bbox_pos + self.bbox_dims);
                // innerstes offenes Glyph erhält die Box; Species-Referenz-
                // Glyphen tragen keine
                if self.current_srg.is_some() {
                } else if let Some(sg) = self.current_species_glyph.as_mut() {
                    sg.bbox = rect;
                } else if let Some(rg) = self.current_rxn_glyph.as_mut() {
                    rg.bbox = Some(rect);
                } else if let Some(cg) = self.current_comp_glyph.as_mut() {
                    cg.bbox = rect;
                }
            }
            "curveSegment" => {
                self.segment_open = false;
                if let Some(srg) = self.current_srg.as_mut() {
                    if srg.curve.is_none() {
                        srg.curve = Some(self.segment);
                    }
                } else if let Some(rg) = self.current_rxn_glyph.as_mut() {
                    rg.curve_segments.push(self.segment);
                }
            }
            "compartmentGlyph" => {
                if let (Some(lay), Some(cg)) =
                    (self.doc.layout.as_mut(), self.current_comp_glyph.take())
                {
                    lay.compartment_glyphs.push(cg);
                }
            }
            "speciesGlyph" => {
                if let (Some(lay), Some(sg)) =
                    (self.doc.layout.as_mut(), self.current_species_glyph.take())
                {
                    lay.species_glyphs.push(sg);
                }
            }
            "speciesReferenceGlyph" => {
                if let (Some(rg), Some(srg)) =
                    (self.current_rxn_glyph.as_mut(), self.current_srg.take())
                {
                    rg.species_refs.push(srg);
                }
            }
            "reactionGlyph" => {
                if let (Some(lay), Some(rg)) =
                    (self.doc.layout.as_mut(), self.current_rxn_glyph.take())
                {
                    lay.reaction_glyphs.push(rg);
                }
            }
            _ => {}
        }
    }
}
