//! Pfeilspitzen: Vertex-Tabellen und prozessweite Stil-Auswahl pro Rolle.
//!
//! Koordinaten liegen im lokalen Rahmen der Kurvenspitze: Ursprung am
//! Kurvenende, +y zeigt entgegen der Laufrichtung zurück in die Kurve.

use super::reaction::RxnRole;
use glam::Vec2;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Eine Stil-Definition: Vertex-Liste plus Füllung.
#[derive(Debug, Clone, Copy)]
pub struct ArrowheadStyle {
    pub verts: &'static [Vec2],
    pub filled: bool,
}

const TRIANGLE: &[Vec2] = &[
    Vec2::new(0.0, 0.0),
    Vec2::new(0.5, 1.0),
    Vec2::new(-0.5, 1.0),
];

const NARROW_TRIANGLE: &[Vec2] = &[
    Vec2::new(0.0, 0.0),
    Vec2::new(0.33, 1.0),
    Vec2::new(-0.33, 1.0),
];

const DIAMOND: &[Vec2] = &[
    Vec2::new(0.0, 0.0),
    Vec2::new(0.5, 0.5),
    Vec2::new(0.0, 1.0),
    Vec2::new(-0.5, 0.5),
];

const TEE: &[Vec2] = &[
    Vec2::new(-0.5, 0.0),
    Vec2::new(0.5, 0.0),
    Vec2::new(0.5, 0.16),
    Vec2::new(-0.5, 0.16),
];

// Achteck als Kreisnäherung
const CIRCLE: &[Vec2] = &[
    Vec2::new(0.0, 0.0),
    Vec2::new(0.35, 0.15),
    Vec2::new(0.5, 0.5),
    Vec2::new(0.35, 0.85),
    Vec2::new(0.0, 1.0),
    Vec2::new(-0.35, 0.85),
    Vec2::new(-0.5, 0.5),
    Vec2::new(-0.35, 0.15),
];

/// Alle registrierten Stile; Index = Stil-Nummer.
const STYLES: &[ArrowheadStyle] = &[
    // 0: keine Pfeilspitze
    ArrowheadStyle {
        verts: &[],
        filled: false,
    },
    // 1: gefülltes Dreieck
    ArrowheadStyle {
        verts: TRIANGLE,
        filled: true,
    },
    // 2: offenes Dreieck
    ArrowheadStyle {
        verts: TRIANGLE,
        filled: false,
    },
    // 3: gefülltes schmales Dreieck
    ArrowheadStyle {
        verts: NARROW_TRIANGLE,
        filled: true,
    },
    // 4: offenes schmales Dreieck
    ArrowheadStyle {
        verts: NARROW_TRIANGLE,
        filled: false,
    },
    // 5: gefüllte Raute
    ArrowheadStyle {
        verts: DIAMOND,
        filled: true,
    },
    // 6: offene Raute
    ArrowheadStyle {
        verts: DIAMOND,
        filled: false,
    },
    // 7: Querbalken (Inhibitor)
    ArrowheadStyle {
        verts: TEE,
        filled: true,
    },
    // 8: Kreis (Aktivator)
    ArrowheadStyle {
        verts: CIRCLE,
        filled: false,
    },
];

/// Anzahl registrierter Stile.
pub fn num_styles() -> usize {
    STYLES.len()
}

/// Stil-Definition nach Nummer; `None` außerhalb des Registers.
pub fn style(index: usize) -> Option<ArrowheadStyle> {
    STYLES.get(index).copied()
}

// Prozessweite Auswahl pro Rollen-Gruppe; Substrate/Side-Substrate und
// Product/Side-Product teilen sich jeweils einen Eintrag.
static SUBSTRATE_STYLE: AtomicUsize = AtomicUsize::new(0);
static PRODUCT_STYLE: AtomicUsize = AtomicUsize::new(1);
static MODIFIER_STYLE: AtomicUsize = AtomicUsize::new(5);
static ACTIVATOR_STYLE: AtomicUsize = AtomicUsize::new(8);
static INHIBITOR_STYLE: AtomicUsize = AtomicUsize::new(7);

fn slot(role: RxnRole) -> &'static AtomicUsize {
    match role {
        RxnRole::Substrate | RxnRole::SideSubstrate => &SUBSTRATE_STYLE,
        RxnRole::Product | RxnRole::SideProduct => &PRODUCT_STYLE,
        RxnRole::Modifier => &MODIFIER_STYLE,
        RxnRole::Activator => &ACTIVATOR_STYLE,
        RxnRole::Inhibitor => &INHIBITOR_STYLE,
    }
}

/// Aktuell gewählter Stil für eine Rolle.
pub fn style_for_role(role: RxnRole) -> usize {
    slot(role).load(Ordering::Relaxed)
}

/// Wählt einen Stil für eine Rolle; `false` bei unbekannter Stil-Nummer.
pub fn set_style_for_role(role: RxnRole, index: usize) -> bool {
    if index >= STYLES.len() {
        return false;
    }
    slot(role).store(index, Ordering::Relaxed);
    true
}
