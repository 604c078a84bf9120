//! Affine 2D-Hilfsfunktionen rund um `glam::Affine2`.

use super::geometry::Rect;
use glam::{Affine2, Vec2};

/// Konstruiert die Transformation, die `src` formatfüllend und zentriert
/// in `dst` abbildet (uniforme Skalierung, Seitenverhältnis bleibt erhalten).
pub fn fit_to_window(src: &Rect, dst: &Rect) -> Affine2 {
    let sw = src.width();
    let sh = src.height();
    if sw < f32::EPSILON || sh < f32::EPSILON {
        return Affine2::from_translation(dst.center() - src.center());
    }
    let scale = (dst.width() / sw).min(dst.height() / sh);
    let translation = dst.center() - scale * src.center();
    Affine2::from_scale_angle_translation(Vec2::splat(scale), 0.0, translation)
}

/// Uniformer Skalierungsfaktor einer Transformation (√|det|).
pub fn scale_factor(tf: &Affine2) -> f32 {
    let m = tf.matrix2;
    (m.x_axis.x * m.y_axis.y - m.x_axis.y * m.y_axis.x).abs().sqrt()
}

/// Wendet nur den linearen Anteil an (keine Translation).
pub fn apply_linear_only(tf: &Affine2, v: Vec2) -> Vec2 {
    tf.transform_vector2(v)
}

/// Transformiert ein Rechteck und normalisiert Min/Max neu.
pub fn transform_rect(tf: &Affine2, r: &Rect) -> Rect {
    Rect::new(tf.transform_point2(r.min), tf.transform_point2(r.max))
}
