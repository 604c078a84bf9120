//! XML-Brücke: SBML-Dokumente lesen, in das Netzwerk-Modell übersetzen
//! und nach dem Layout wieder hinausschreiben.

pub mod bridge;
pub mod parser;
pub mod writer;

pub use bridge::{network_from_document, network_from_layout, network_from_model, LoadedLayout};
pub use parser::{parse_sbml, SbmlDocument};
pub use writer::write_sbml;
