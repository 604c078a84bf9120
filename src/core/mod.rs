//! Core-Domänentypen: Elemente, Nodes, Reactions, Compartments, Kurven
//! und der Network-Container.
//!
//! Dieses Modul definiert die Haupt-Datenstrukturen:
//! - Network: Container für alle Nodes, Reactions und Compartments
//! - Node: einzelne Species mit Position und Ausdehnung
//! - Reaction: Junction mit Species-Referenzen und Bézier-Kurven
//! - Compartment: elastisches Rechteck um seine Mitglieder

pub mod arrowhead;
pub mod canvas;
pub mod compartment;
pub mod curve;
pub mod element;
pub mod geometry;
pub mod network;
pub mod node;
pub mod reaction;
pub mod transform;

pub use canvas::Canvas;
pub use compartment::Compartment;
pub use curve::{Arrowhead, RxnCurve, RxnCurveType};
pub use element::{CoordSystem, ElementCore, ElementKind, ElementRef, ElementShape};
pub use geometry::Rect;
pub use network::{
    default_compartment_id, have_default_compartment_id, is_default_compartment_id,
    set_default_compartment_id, Network,
};
pub use node::Node;
pub use reaction::{Reaction, RxnRole};
