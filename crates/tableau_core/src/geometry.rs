//! Geometry snapshot and inversion math (FLIP)
//!
//! - **F**irst: measure every entity's box before the arrangement changes
//! - **L**ast: measure again once the new arrangement has been laid out
//! - **I**nvert: compute the transform that puts the new box back over the old one
//! - **P**lay: release the transform and let the host transition to identity
//!
//! Everything here is pure: measurement works on an offset chain the host
//! reports, and inversion works on two `Bounds`.

use std::fmt;

use smallvec::SmallVec;

use crate::id::NodeId;

// ============================================================================
// Bounds
// ============================================================================

/// A box in the coordinate space of the measurement ancestor
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const ZERO: Bounds = Bounds {
        top: 0.0,
        left: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(top: f32, left: f32, width: f32, height: f32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }
}

/// Layout size of a box, as reported by the host
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

// ============================================================================
// Measurement
// ============================================================================

/// One link of an offset-parent chain.
///
/// `top`/`left` are the offsets of `node` relative to the next frame in the
/// chain (its offset parent).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OffsetFrame {
    pub node: NodeId,
    pub top: f32,
    pub left: f32,
}

impl OffsetFrame {
    pub const fn new(node: NodeId, top: f32, left: f32) -> Self {
        Self { node, top, left }
    }
}

/// Offset chain as reported by the host, innermost frame first
pub type OffsetChain = SmallVec<[OffsetFrame; 8]>;

/// Measure a box relative to `relative_to`.
///
/// Walks the chain summing offsets until the ancestor frame is reached (the
/// ancestor's own offset is not included). A chain that never reaches the
/// ancestor yields the full sum, i.e. absolute offsets.
pub fn measure_rectangle<I>(chain: I, size: Size, relative_to: NodeId) -> Bounds
where
    I: IntoIterator<Item = OffsetFrame>,
{
    let mut top = 0.0;
    let mut left = 0.0;
    let mut reached = false;

    for frame in chain {
        if frame.node == relative_to {
            reached = true;
            break;
        }
        top += frame.top;
        left += frame.left;
    }

    if !reached {
        tracing::trace!(ancestor = %relative_to, "offset chain never reached ancestor");
    }

    Bounds {
        top,
        left,
        width: size.width,
        height: size.height,
    }
}

// ============================================================================
// Inversion
// ============================================================================

/// The invert step of FLIP: where to translate and how much to scale a box
/// laid out at `after` so it visually coincides with `before`.
///
/// Translations assume a centered transform origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InverseTransform {
    /// Vertical translation in pixels
    pub invert_top: f32,
    /// Horizontal translation in pixels
    pub invert_left: f32,
    /// Uniform scale factor (never NaN, infinite or zero)
    pub scale: f32,
}

impl InverseTransform {
    pub const IDENTITY: InverseTransform = InverseTransform {
        invert_top: 0.0,
        invert_left: 0.0,
        scale: 1.0,
    };

    /// Whether applying this transform would be a no-op
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Compose the style transform string.
    ///
    /// `external` is whatever transform the container layout applies on its
    /// own (a rotation, a jitter) and is kept verbatim between the inversion
    /// translate and scale. `none` and empty transforms are omitted.
    pub fn to_css(&self, external: &str) -> String {
        let external = external.trim();
        if external.is_empty() || external == "none" {
            format!(
                "translateY({}px) translateX({}px) scale({})",
                self.invert_top, self.invert_left, self.scale
            )
        } else {
            format!(
                "translateY({}px) translateX({}px) {} scale({})",
                self.invert_top, self.invert_left, external, self.scale
            )
        }
    }
}

impl Default for InverseTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for InverseTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css(""))
    }
}

/// Compute the inverse transform from `after` back to `before`.
///
/// When `rotated` is set the box turned by a quarter turn between the two
/// measurements, so its visual footprint swapped axes and the scale is taken
/// from `before.height` instead of `before.width`.
///
/// Degenerate measurements never leak into the result: a non-finite or zero
/// scale becomes `1.0` and a non-finite translation becomes `0.0`.
pub fn compute_inverse_transform(before: &Bounds, after: &Bounds, rotated: bool) -> InverseTransform {
    let invert_top = before.top - after.top - (after.height - before.height) / 2.0;
    let invert_left = before.left - after.left - (after.width - before.width) / 2.0;

    let raw_scale = if rotated {
        before.height / after.width
    } else {
        before.width / after.width
    };
    let scale = if raw_scale.is_finite() && raw_scale != 0.0 {
        raw_scale
    } else {
        tracing::trace!(raw_scale, "clamping degenerate scale factor");
        1.0
    };

    InverseTransform {
        invert_top: finite_or_zero(invert_top),
        invert_left: finite_or_zero(invert_left),
        scale,
    }
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    const ROOT: NodeId = NodeId::new(1);

    #[test]
    fn test_measure_stops_at_ancestor() {
        let chain: OffsetChain = smallvec![
            OffsetFrame::new(NodeId::new(10), 5.0, 7.0),
            OffsetFrame::new(NodeId::new(4), 20.0, 30.0),
            OffsetFrame::new(ROOT, 100.0, 100.0),
            OffsetFrame::new(NodeId::new(0), 1000.0, 1000.0),
        ];

        let bounds = measure_rectangle(chain, Size::new(40.0, 60.0), ROOT);
        assert_eq!(bounds, Bounds::new(25.0, 37.0, 40.0, 60.0));
    }

    #[test]
    fn test_measure_falls_back_to_absolute() {
        let chain = [
            OffsetFrame::new(NodeId::new(10), 5.0, 7.0),
            OffsetFrame::new(NodeId::new(4), 20.0, 30.0),
        ];

        let bounds = measure_rectangle(chain, Size::new(10.0, 10.0), ROOT);
        assert_eq!(bounds.top, 25.0);
        assert_eq!(bounds.left, 37.0);
    }

    #[test]
    fn test_measure_empty_chain() {
        let bounds = measure_rectangle(Vec::new(), Size::new(3.0, 4.0), ROOT);
        assert_eq!(bounds, Bounds::new(0.0, 0.0, 3.0, 4.0));
    }

    #[test]
    fn test_pure_translation() {
        let before = Bounds::new(100.0, 40.0, 50.0, 80.0);
        let after = Bounds::new(10.0, 200.0, 50.0, 80.0);

        let invert = compute_inverse_transform(&before, &after, false);
        assert_eq!(invert.invert_top, 90.0);
        assert_eq!(invert.invert_left, -160.0);
        assert_eq!(invert.scale, 1.0);
    }

    #[test]
    fn test_size_change_recenters() {
        // Box doubles in size at the same origin: the centered scale-down
        // must be shifted back up/left by half the growth.
        let before = Bounds::new(0.0, 0.0, 50.0, 50.0);
        let after = Bounds::new(0.0, 0.0, 100.0, 100.0);

        let invert = compute_inverse_transform(&before, &after, false);
        assert_eq!(invert.invert_top, -25.0);
        assert_eq!(invert.invert_left, -25.0);
        assert_eq!(invert.scale, 0.5);
    }

    #[test]
    fn test_rotated_scale_uses_height() {
        let before = Bounds::new(0.0, 0.0, 100.0, 60.0);
        let after = Bounds::new(0.0, 0.0, 50.0, 50.0);

        let rotated = compute_inverse_transform(&before, &after, true);
        assert!((rotated.scale - 1.2).abs() < 1e-6);

        let upright = compute_inverse_transform(&before, &after, false);
        assert!((upright.scale - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_degenerate_after_clamps() {
        let before = Bounds::new(0.0, 0.0, 100.0, 60.0);
        let after = Bounds::new(0.0, 0.0, 0.0, 0.0);

        for rotated in [false, true] {
            let invert = compute_inverse_transform(&before, &after, rotated);
            assert_eq!(invert.scale, 1.0);
            assert!(invert.invert_top.is_finite());
            assert!(invert.invert_left.is_finite());
        }
    }

    #[test]
    fn test_degenerate_before_clamps() {
        let before = Bounds::ZERO;
        let after = Bounds::new(0.0, 0.0, 100.0, 60.0);

        let invert = compute_inverse_transform(&before, &after, false);
        assert_eq!(invert.scale, 1.0);
    }

    #[test]
    fn test_nan_measurement_clamps() {
        let before = Bounds::new(f32::NAN, 0.0, 10.0, 10.0);
        let after = Bounds::new(0.0, 0.0, 10.0, 10.0);

        let invert = compute_inverse_transform(&before, &after, false);
        assert_eq!(invert.invert_top, 0.0);
        assert!(!invert.to_css("").contains("NaN"));
    }

    #[test]
    fn test_css_keeps_external_transform_in_the_middle() {
        let invert = InverseTransform {
            invert_top: 12.5,
            invert_left: -4.0,
            scale: 0.5,
        };

        assert_eq!(
            invert.to_css("rotate(3deg)"),
            "translateY(12.5px) translateX(-4px) rotate(3deg) scale(0.5)"
        );
        assert_eq!(
            invert.to_css("none"),
            "translateY(12.5px) translateX(-4px) scale(0.5)"
        );
        assert_eq!(invert.to_string(), invert.to_css(""));
    }

    #[test]
    fn test_identity() {
        let b = Bounds::new(3.0, 4.0, 5.0, 6.0);
        assert!(compute_inverse_transform(&b, &b, false).is_identity());
    }
}
