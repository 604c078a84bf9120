//! Auto-Layout-Engine für SBML-Reaktionsnetzwerke.
//! Graph-Geometrie-Kern und XML-Brücke als Library exportiert.

pub mod core;
pub mod xml;

pub use core::{
    Canvas, Compartment, CoordSystem, ElementKind, ElementRef, ElementShape, Network, Node,
    Reaction, Rect, RxnCurve, RxnCurveType, RxnRole,
};
pub use xml::{network_from_document, parse_sbml, write_sbml, LoadedLayout};
