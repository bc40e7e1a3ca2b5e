use crate::foundation::core::Resolution;

/// How a source image is fitted onto the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Same size as the canvas; pasted as is.
    Unchanged,
    /// Top-left crop to `min(source, canvas)` on each axis; no resampling.
    Crop { width: u32, height: u32 },
    /// Proportional resample that fits inside the canvas and touches at least one edge.
    Scale { width: u32, height: u32 },
}

/// Canvas dimensions are rounded down to even, so a source that is one pixel larger
/// than the canvas is cropped rather than resampled.
const OVERSIZE_TOLERANCE: u32 = 1;

pub fn plan(source: (u32, u32), canvas: Resolution) -> Placement {
    let (sw, sh) = source;
    let (cw, ch) = (canvas.width(), canvas.height());

    let oversized = sw > cw + OVERSIZE_TOLERANCE || sh > ch + OVERSIZE_TOLERANCE;
    let undersized = sw < cw && sh < ch;
    if sw > 0 && sh > 0 && (oversized || undersized) {
        return fit(sw, sh, cw, ch);
    }
    if (sw, sh) == (cw, ch) {
        return Placement::Unchanged;
    }
    Placement::Crop {
        width: sw.min(cw),
        height: sh.min(ch),
    }
}

fn fit(sw: u32, sh: u32, cw: u32, ch: u32) -> Placement {
    let (sw64, sh64, cw64, ch64) = (
        u64::from(sw),
        u64::from(sh),
        u64::from(cw),
        u64::from(ch),
    );
    // cw / sw <= ch / sh: width is the binding constraint.
    let (width, height) = if cw64 * sh64 <= ch64 * sw64 {
        let h = (sh64 * cw64 + sw64 / 2) / sw64;
        (cw, (h as u32).clamp(1, ch))
    } else {
        let w = (sw64 * ch64 + sh64 / 2) / sh64;
        ((w as u32).clamp(1, cw), ch)
    };
    Placement::Scale { width, height }
}

/// Top-left position that centers a `placed` image on the canvas.
pub fn centered_origin(placed: (u32, u32), canvas: Resolution) -> (i64, i64) {
    (
        (i64::from(canvas.width()) - i64::from(placed.0)) / 2,
        (i64::from(canvas.height()) - i64::from(placed.1)) / 2,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/render/placement.rs"]
mod tests;
