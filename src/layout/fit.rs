use crate::rect::{Rect, Size};
use crate::units::Pt;

/// Scale `source` uniformly to the largest size that fits in `frame`, centred
/// along the axis with space left over. Returns [None] when the source has no
/// area to scale.
pub fn fit_aspect(frame: &Rect, source: Size) -> Option<Rect> {
    if source.is_empty() {
        return None;
    }

    let k = (frame.width() / source.width)
        .min(frame.height() / source.height)
        .max(0.0);
    let width = source.width * k;
    let height = source.height * k;
    Some(Rect::from_xywh(
        frame.x1 + (frame.width() - width) / 2.0,
        frame.y1 + (frame.height() - height) / 2.0,
        width,
        height,
    ))
}

/// Raster placement: drawn at intrinsic size in the top-left corner when it
/// fits, scaled down like [fit_aspect] otherwise
pub fn fit_raster(frame: &Rect, source: Size) -> Option<Rect> {
    if source.is_empty() {
        return None;
    }
    if source.width <= frame.width() && source.height <= frame.height() {
        return Some(Rect::from_xywh(frame.x1, frame.y1, source.width, source.height));
    }
    fit_aspect(frame, source)
}

/// The size matching `intrinsic` once explicit dimensions are applied; a single
/// explicit dimension keeps the aspect ratio
pub fn scale_to(intrinsic: Size, width: Option<Pt>, height: Option<Pt>) -> Size {
    match (width, height) {
        (Some(width), Some(height)) => Size { width, height },
        (Some(width), None) if intrinsic.width > Pt::ZERO => Size {
            width,
            height: intrinsic.height * (width / intrinsic.width),
        },
        (None, Some(height)) if intrinsic.height > Pt::ZERO => Size {
            width: intrinsic.width * (height / intrinsic.height),
            height,
        },
        (Some(width), None) => Size { width, ..intrinsic },
        (None, Some(height)) => Size { height, ..intrinsic },
        (None, None) => intrinsic,
    }
}
