//! Geometry serialization into `path=` and `markers=` fragments.
//!
//! Polylines and polygons each produce an independent `path=` fragment
//! carrying an encoded polyline. All markers share a single `markers=`
//! fragment. Paths come first, in the order they were added, followed by
//! the markers.

use crate::builder::RequestBuffer;
use crate::codec;
use crate::simplify::{PathSimplifier, SimplificationOptions};
use crate::style::join_params;
use crate::types::{Coordinate, Geometry, MapConfig, MapError, Path, PathStyle};

/// Serialize every buffered geometry, joined with `&`.
///
/// An empty buffer yields an empty string.
///
/// # Errors
///
/// Returns [`MapError::EmptyPolygon`] if a buffered polygon has no
/// points, or [`MapError::CoordinateOutOfRange`] if a path cannot be
/// encoded.
pub fn serialize_geometries(
    buffer: &RequestBuffer,
    config: &MapConfig,
) -> Result<String, MapError> {
    let mut fragments = Vec::new();
    let mut markers = Vec::new();

    for geometry in buffer.geometries() {
        match geometry {
            Geometry::Marker(point) => markers.push(*point),
            Geometry::Polyline(path) => fragments.push(polyline_fragment(path, config)?),
            Geometry::Polygon(path) => fragments.push(polygon_fragment(path, config)?),
        }
    }

    tracing::debug!(
        paths = fragments.len(),
        markers = markers.len(),
        "serialized geometries"
    );

    if let Some(fragment) = markers_fragment(&markers) {
        fragments.push(fragment);
    }

    Ok(fragments.join("&"))
}

/// `markers=lat,lng|lat,lng|...`, or `None` when there are no markers.
#[must_use]
pub fn markers_fragment(markers: &[Coordinate]) -> Option<String> {
    if markers.is_empty() {
        return None;
    }
    let joined: Vec<String> = markers.iter().map(ToString::to_string).collect();
    Some(format!("markers={}", joined.join("|")))
}

/// `path=color:0x..|weight:..|enc:..` for an open path.
///
/// # Errors
///
/// Returns [`MapError::CoordinateOutOfRange`] if `path` cannot be encoded.
pub fn polyline_fragment(path: &Path, config: &MapConfig) -> Result<String, MapError> {
    let token = polyline_token(path, config)?;
    let style = &config.path_style;
    let params = [
        ("color", format!("0x{}", style.color)),
        ("weight", style.weight.to_string()),
        ("enc", token),
    ];
    Ok(format!("path={}", join_params(&params)))
}

/// `path=fillcolor:0x..|color:0x..|weight:..|enc:..` for a closed path.
///
/// # Errors
///
/// Returns [`MapError::EmptyPolygon`] if `path` has no points, or
/// [`MapError::CoordinateOutOfRange`] if it cannot be encoded.
pub fn polygon_fragment(path: &Path, config: &MapConfig) -> Result<String, MapError> {
    let token = polygon_token(path, config)?;
    let style = &config.path_style;
    let params = [
        ("fillcolor", fill_color(style)),
        ("color", format!("0x{}", style.color)),
        ("weight", style.weight.to_string()),
        ("enc", token),
    ];
    Ok(format!("path={}", join_params(&params)))
}

/// Encoded polyline for an open path, simplified first if dense.
///
/// # Errors
///
/// Returns [`MapError::CoordinateOutOfRange`] if `path` cannot be encoded.
pub fn polyline_token(path: &Path, config: &MapConfig) -> Result<String, MapError> {
    let reduced = reduce(path, &config.path_style, &config.simplification);
    codec::encode(&reduced)
}

/// Encoded polyline for a polygon: simplified if dense, then closed so
/// the first and last points match.
///
/// # Errors
///
/// Returns [`MapError::EmptyPolygon`] if `path` has no points, or
/// [`MapError::CoordinateOutOfRange`] if it cannot be encoded.
pub fn polygon_token(path: &Path, config: &MapConfig) -> Result<String, MapError> {
    if path.is_empty() {
        return Err(MapError::EmptyPolygon);
    }
    let closed = reduce(path, &config.path_style, &config.simplification).close()?;
    codec::encode(&closed)
}

/// `0x` + fill color + alpha byte.
fn fill_color(style: &PathStyle) -> String {
    format!(
        "0x{}{}",
        style.fill_color,
        opacity_to_hex(style.fill_opacity)
    )
}

/// Convert an opacity fraction to a two-digit lowercase hex byte.
///
/// `round(opacity * 255)`, zero padded. Out-of-range input is clamped
/// to `0.0..=1.0`; NaN maps to `00`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn opacity_to_hex(opacity: f64) -> String {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("{alpha:02x}")
}

/// Simplify `path` when it has more points than the style allows.
fn reduce(path: &Path, style: &PathStyle, options: &SimplificationOptions) -> Path {
    if path.len() > style.min_points_to_simplify {
        options.simplify(path)
    } else {
        path.clone()
    }
}
