//! Reine Geometrie-Funktionen: Rechtecke, Bézier-Kurven, Intervall-Distanzen.
//!
//! Layer-neutral: wird von `element`, `curve`, `reaction` und dem XML-Layer
//! importiert, ohne Zirkel-Abhängigkeiten zu erzeugen.

use glam::Vec2;

/// Achsenparalleles Rechteck über Min/Max-Ecken.
///
/// Dient sowohl als Bounding-Box von Elementen als auch als Extents
/// von Compartments.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Obere linke Ecke (kleinste Koordinaten)
    pub min: Vec2,
    /// Untere rechte Ecke (größte Koordinaten)
    pub max: Vec2,
}

impl Rect {
    /// Erstellt ein Rechteck; Min/Max werden komponentenweise sortiert.
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Rechteck mit Mittelpunkt `center` und halber Ausdehnung `half`.
    pub fn around(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Gibt ein um `p` auf allen Seiten vergrößertes Rechteck zurück.
    pub fn padded(&self, p: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(p),
            max: self.max + Vec2::splat(p),
        }
    }

    /// Erweitert das Rechteck, sodass es `other` vollständig umschließt.
    pub fn expand(&mut self, other: &Rect) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Setzt die Breite; die linke Kante bleibt fixiert.
    pub fn set_width(&mut self, w: f32) {
        self.max.x = self.min.x + w;
    }

    /// Setzt die Höhe; die obere Kante bleibt fixiert.
    pub fn set_height(&mut self, h: f32) {
        self.max.y = self.min.y + h;
    }
}

/// Begrenzt die Länge eines Vektors auf `cap` (skaliert nur herunter).
pub fn cap_magnitude(v: Vec2, cap: f32) -> Vec2 {
    let m = v.length();
    if m > cap && m > f32::EPSILON {
        v * (cap / m)
    } else {
        v
    }
}

/// Wie `cap_magnitude`, aber über das Längenquadrat (spart die Wurzel im Normalfall).
pub fn cap_magnitude2(v: Vec2, cap2: f32) -> Vec2 {
    let m2 = v.length_squared();
    if m2 > cap2 && m2 > f32::EPSILON {
        v * (cap2.sqrt() / m2.sqrt())
    } else {
        v
    }
}

/// Signierte Lücke zweier 1D-Intervalle (Allen-Ordnung).
///
/// Positiv wenn disjunkt mit `a` unterhalb von `b`, negativ wenn disjunkt
/// mit `a` oberhalb, 0 bei Überlappung.
pub fn allen_ordered(a1: f32, a2: f32, b1: f32, b2: f32) -> f32 {
    if a2 < b1 {
        b1 - a2
    } else if b2 < a1 {
        b2 - a1
    } else {
        0.0
    }
}

/// Nichtnegative Intervall-Distanz: `max(allen_ordered, 0)`.
pub fn allen_dist(a1: f32, a2: f32, b1: f32, b2: f32) -> f32 {
    allen_ordered(a1, a2, b1, b2).max(0.0)
}

/// Verschiebt den zweiten Punkt eines Strahls `first → second`.
///
/// Der Strahl wird um `degrees` (Grad) um `first` rotiert; die neue Länge ist
/// `|first→second| + dist` (relative = false) bzw. `|first→second| · dist`
/// (relative = true).
pub fn new_second_pos(first: Vec2, second: Vec2, degrees: f32, dist: f32, relative: bool) -> Vec2 {
    let d = second - first;
    let r = d.length();
    if r < f32::EPSILON {
        return first;
    }
    let theta = d.y.atan2(d.x) + degrees.to_radians();
    let new_r = if relative { r * dist } else { r + dist };
    first + new_r * Vec2::new(theta.cos(), theta.sin())
}

/// B(t) = (1-t)³·P0 + 3(1-t)²t·P1 + 3(1-t)t²·P2 + t³·P3
pub fn cubic_bezier(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let inv = 1.0 - t;
    let inv2 = inv * inv;
    let t2 = t * t;
    inv2 * inv * p0 + 3.0 * inv2 * t * p1 + 3.0 * inv * t2 * p2 + t2 * t * p3
}

/// Ableitung B'(t) = 3(1-t)²·(P1-P0) + 6(1-t)t·(P2-P1) + 3t²·(P3-P2)
pub fn cubic_bezier_tangent(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let inv = 1.0 - t;
    3.0 * inv * inv * (p1 - p0) + 6.0 * inv * t * (p2 - p1) + 3.0 * t * t * (p3 - p2)
}

/// Teilt die Kurve bei `t` (de Casteljau) und gibt beide Hälften zurück.
pub fn split_cubic(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> ([Vec2; 4], [Vec2; 4]) {
    let q0 = p0.lerp(p1, t);
    let q1 = p1.lerp(p2, t);
    let q2 = p2.lerp(p3, t);
    let r0 = q0.lerp(q1, t);
    let r1 = q1.lerp(q2, t);
    let s = r0.lerp(r1, t);
    ([p0, q0, r0, s], [s, r1, q2, p3])
}

/// Reelle Nullstellen von `a·x³ + b·x² + c·x + d = 0`.
///
/// Degeneriert der führende Koeffizient, fällt die Lösung auf die
/// quadratische bzw. lineare Gleichung zurück.
pub fn solve_cubic(a: f32, b: f32, c: f32, d: f32) -> Vec<f32> {
    const EPS: f32 = 1e-7;

    if a.abs() < EPS {
        // quadratisch
        if b.abs() < EPS {
            if c.abs() < EPS {
                return Vec::new();
            }
            return vec![-d / c];
        }
        let disc = c * c - 4.0 * b * d;
        if disc < 0.0 {
            return Vec::new();
        }
        let sq = disc.sqrt();
        return vec![(-c + sq) / (2.0 * b), (-c - sq) / (2.0 * b)];
    }

    // Normalisieren und auf die reduzierte Form x³ + p·x + q bringen
    let b = b / a;
    let c = c / a;
    let d = d / a;
    let p = c - b * b / 3.0;
    let q = 2.0 * b * b * b / 27.0 - b * c / 3.0 + d;
    let shift = -b / 3.0;

    let disc = (q / 2.0) * (q / 2.0) + (p / 3.0) * (p / 3.0) * (p / 3.0);

    if disc > EPS {
        // eine reelle Nullstelle (Cardano)
        let sq = disc.sqrt();
        let u = cbrt(-q / 2.0 + sq);
        let v = cbrt(-q / 2.0 - sq);
        vec![u + v + shift]
    } else if disc < -EPS {
        // drei reelle Nullstellen (trigonometrische Form)
        let r = (-p * p * p / 27.0).sqrt();
        let phi = (-q / (2.0 * r)).clamp(-1.0, 1.0).acos();
        let m = 2.0 * (-p / 3.0).sqrt();
        (0..3)
            .map(|k| m * ((phi + 2.0 * std::f32::consts::PI * k as f32) / 3.0).cos() + shift)
            .collect()
    } else {
        // doppelte Nullstelle
        let u = cbrt(-q / 2.0);
        vec![2.0 * u + shift, -u + shift]
    }
}

fn cbrt(x: f32) -> f32 {
    x.signum() * x.abs().powf(1.0 / 3.0)
}

/// Schnittparameter `t ∈ [0,1]` einer kubischen Bézier-Kurve mit der
/// Strecke `a → b`, aufsteigend sortiert.
///
/// Gelöst über die Nullstellen des signierten Abstandspolynoms der
/// Kontrollpunkte zur Trägergeraden; Treffer außerhalb der Strecke
/// werden verworfen.
pub fn cubic_line_intersections(
    p0: Vec2,
    p1: Vec2,
    p2: Vec2,
    p3: Vec2,
    a: Vec2,
    b: Vec2,
) -> Vec<f32> {
    let dir = b - a;
    let len2 = dir.length_squared();
    if len2 < f32::EPSILON {
        return Vec::new();
    }
    let n = Vec2::new(-dir.y, dir.x);

    // Abstände der Kontrollpunkte zur Geraden (Bernstein-Koeffizienten)
    let f0 = n.dot(p0 - a);
    let f1 = n.dot(p1 - a);
    let f2 = n.dot(p2 - a);
    let f3 = n.dot(p3 - a);

    // Bernstein → Potenzbasis
    let a3 = -f0 + 3.0 * f1 - 3.0 * f2 + f3;
    let a2 = 3.0 * f0 - 6.0 * f1 + 3.0 * f2;
    let a1 = -3.0 * f0 + 3.0 * f1;
    let a0 = f0;

    let mut ts: Vec<f32> = solve_cubic(a3, a2, a1, a0)
        .into_iter()
        .filter(|t| (-1e-4..=1.0 + 1e-4).contains(t))
        .map(|t| t.clamp(0.0, 1.0))
        .filter(|&t| {
            // Treffer muss innerhalb der Strecke liegen
            let p = cubic_bezier(p0, p1, p2, p3, t);
            let s = (p - a).dot(dir) / len2;
            (-1e-4..=1.0 + 1e-4).contains(&s)
        })
        .collect();
    ts.sort_by(|x, y| x.total_cmp(y));
    ts.dedup_by(|x, y| (*x - *y).abs() < 1e-4);
    ts
}

/// Alle Schnittparameter der Kurve mit den vier Kanten eines Rechtecks,
/// aufsteigend sortiert.
pub fn cubic_rect_intersections(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, r: &Rect) -> Vec<f32> {
    let corners = [
        r.min,
        Vec2::new(r.max.x, r.min.y),
        r.max,
        Vec2::new(r.min.x, r.max.y),
    ];
    let mut ts = Vec::new();
    for i in 0..4 {
        ts.extend(cubic_line_intersections(
            p0,
            p1,
            p2,
            p3,
            corners[i],
            corners[(i + 1) % 4],
        ));
    }
    ts.sort_by(|x, y| x.total_cmp(y));
    ts.dedup_by(|x, y| (*x - *y).abs() < 1e-4);
    ts
}

/// Weicht von `to` in Richtung `from` zurück, bis der Punkt außerhalb von
/// `obstruction` liegt.
///
/// Schrittweite `step`; der Rückzug endet spätestens nach der vollen
/// Distanz `to → from`.
pub fn calc_curve_backup(from: Vec2, to: Vec2, obstruction: &Rect, step: f32) -> Vec2 {
    let d = from - to;
    let dist = d.length();
    if dist < f32::EPSILON || step <= 0.0 {
        return to;
    }
    let dir = d / dist;
    let max_steps = (dist / step).ceil() as usize;
    let mut p = to;
    for _ in 0..max_steps {
        if !obstruction.contains(p) {
            break;
        }
        p += dir * step;
    }
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_padded_and_expand() {
        let mut r = Rect::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 20.0));
        assert_eq!(r.width(), 10.0);
        assert_eq!(r.height(), 20.0);
        assert_eq!(r.center(), Vec2::new(5.0, 10.0));

        let p = r.padded(5.0);
        assert_eq!(p.min, Vec2::new(-5.0, -5.0));
        assert_eq!(p.max, Vec2::new(15.0, 25.0));

        r.expand(&Rect::new(Vec2::new(-3.0, 5.0), Vec2::new(4.0, 30.0)));
        assert_eq!(r.min, Vec2::new(-3.0, 0.0));
        assert_eq!(r.max, Vec2::new(10.0, 30.0));
    }

    #[test]
    fn allen_gap_signs() {
        // a unterhalb von b → positive Lücke
        assert_eq!(allen_ordered(0.0, 1.0, 3.0, 4.0), 2.0);
        // a oberhalb von b → negative Lücke
        assert_eq!(allen_ordered(3.0, 4.0, 0.0, 1.0), -2.0);
        // Überlappung → 0
        assert_eq!(allen_ordered(0.0, 2.0, 1.0, 3.0), 0.0);
        assert_eq!(allen_dist(3.0, 4.0, 0.0, 1.0), 0.0);
    }

    #[test]
    fn new_second_pos_extends_and_rotates() {
        let a = Vec2::ZERO;
        let b = Vec2::new(10.0, 0.0);

        // Verlängerung ohne Rotation
        let p = new_second_pos(a, b, 0.0, 5.0, false);
        assert!((p - Vec2::new(15.0, 0.0)).length() < 1e-4);

        // Skalierung (relative Länge)
        let p = new_second_pos(a, b, 0.0, 0.5, true);
        assert!((p - Vec2::new(5.0, 0.0)).length() < 1e-4);

        // 90°-Rotation
        let p = new_second_pos(a, b, 90.0, 0.0, false);
        assert!((p - Vec2::new(0.0, 10.0)).length() < 1e-3);
    }

    #[test]
    fn cubic_bezier_endpoints_and_midpoint() {
        let p0 = Vec2::ZERO;
        let p1 = Vec2::new(0.0, 10.0);
        let p2 = Vec2::new(10.0, 10.0);
        let p3 = Vec2::new(10.0, 0.0);

        assert_eq!(cubic_bezier(p0, p1, p2, p3, 0.0), p0);
        assert_eq!(cubic_bezier(p0, p1, p2, p3, 1.0), p3);

        // B(0.5) = (P0 + 3·P1 + 3·P2 + P3) / 8
        let mid = cubic_bezier(p0, p1, p2, p3, 0.5);
        let expected = (p0 + 3.0 * p1 + 3.0 * p2 + p3) / 8.0;
        assert!((mid - expected).length() < 1e-4);
    }

    #[test]
    fn split_cubic_halves_agree_with_curve() {
        let p0 = Vec2::ZERO;
        let p1 = Vec2::new(0.0, 10.0);
        let p2 = Vec2::new(10.0, 10.0);
        let p3 = Vec2::new(10.0, 0.0);

        let (left, right) = split_cubic(p0, p1, p2, p3, 0.3);
        assert!((left[3] - cubic_bezier(p0, p1, p2, p3, 0.3)).length() < 1e-4);
        assert_eq!(right[3], p3);

        // Punkt auf der linken Hälfte entspricht reparametrisiertem Original
        let q = cubic_bezier(left[0], left[1], left[2], left[3], 0.5);
        let expected = cubic_bezier(p0, p1, p2, p3, 0.15);
        assert!((q - expected).length() < 1e-3);
    }

    #[test]
    fn solve_cubic_simple_roots() {
        // (x-1)(x-2)(x-3) = x³ - 6x² + 11x - 6
        let mut roots = solve_cubic(1.0, -6.0, 11.0, -6.0);
        roots.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(roots.len(), 3);
        assert!((roots[0] - 1.0).abs() < 1e-3);
        assert!((roots[1] - 2.0).abs() < 1e-3);
        assert!((roots[2] - 3.0).abs() < 1e-3);

        // eine reelle Nullstelle: x³ + x = 0 hat nur x = 0... (x³ + x + 1)
        let roots = solve_cubic(1.0, 0.0, 1.0, 1.0);
        assert_eq!(roots.len(), 1);
        let x = roots[0];
        assert!((x * x * x + x + 1.0).abs() < 1e-3);
    }

    #[test]
    fn line_intersection_finds_crossing() {
        // flache Kurve entlang der x-Achse, vertikale Strecke bei x = 5
        let p0 = Vec2::ZERO;
        let p1 = Vec2::new(3.0, 0.0);
        let p2 = Vec2::new(7.0, 0.0);
        let p3 = Vec2::new(10.0, 0.0);

        let ts = cubic_line_intersections(
            p0,
            p1,
            p2,
            p3,
            Vec2::new(5.0, -5.0),
            Vec2::new(5.0, 5.0),
        );
        assert_eq!(ts.len(), 1, "genau ein Schnittpunkt erwartet");
        let p = cubic_bezier(p0, p1, p2, p3, ts[0]);
        assert!((p.x - 5.0).abs() < 1e-2);
    }

    #[test]
    fn rect_intersection_counts_entry_and_exit() {
        // gerade Linie quer durch das Rechteck → zwei Schnitte
        let p0 = Vec2::new(-10.0, 5.0);
        let p3 = Vec2::new(20.0, 5.0);
        let p1 = p0.lerp(p3, 0.33);
        let p2 = p0.lerp(p3, 0.66);
        let r = Rect::new(Vec2::ZERO, Vec2::new(10.0, 10.0));

        let ts = cubic_rect_intersections(p0, p1, p2, p3, &r);
        assert_eq!(ts.len(), 2, "Eintritt und Austritt erwartet");
        assert!(ts[0] < ts[1]);
    }

    #[test]
    fn curve_backup_leaves_box() {
        let obstruction = Rect::new(Vec2::ZERO, Vec2::new(80.0, 40.0));
        let to = Vec2::new(40.0, 20.0); // Mittelpunkt der Box
        let from = Vec2::new(200.0, 20.0);

        let p = calc_curve_backup(from, to, &obstruction, 5.0);
        assert!(
            !obstruction.contains(p) || (p - from).length() < 1e-3,
            "Punkt muss die Box verlassen"
        );
        assert!(p.x > 80.0, "Rückzug in Richtung `from` erwartet");
    }

    #[test]
    fn cap_magnitude_scales_down_only() {
        let v = Vec2::new(3.0, 4.0);
        assert_eq!(cap_magnitude(v, 10.0), v);
        let capped = cap_magnitude(v, 2.5);
        assert!((capped.length() - 2.5).abs() < 1e-4);
        let capped2 = cap_magnitude2(v, 4.0);
        assert!((capped2.length() - 2.0).abs() < 1e-4);
    }
}
