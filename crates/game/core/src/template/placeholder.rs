use super::TemplateError;
use crate::level::Rect;

/// Fill character of placeholder regions.
pub const PLACEHOLDER_FILL: char = '@';

/// Locates the placeholder rectangle marked by `id`.
///
/// The id must occur exactly once, at a corner of a solid rectangle whose
/// other cells are all [`PLACEHOLDER_FILL`]. The rectangle extends from the
/// id along the `@` run on its row and its column. Anything else is
/// rejected rather than guessed at.
pub fn find_placeholder_region_by_id(map: &[Vec<char>], id: char) -> Result<Rect, TemplateError> {
    let mut found = None;
    for (y, row) in map.iter().enumerate() {
        for (x, &glyph) in row.iter().enumerate() {
            if glyph == id {
                if found.is_some() {
                    return Err(TemplateError::DuplicatePlaceholder { id });
                }
                found = Some((x as i32, y as i32));
            }
        }
    }
    let (ix, iy) = found.ok_or(TemplateError::PlaceholderNotFound { id })?;

    let at = |x: i32, y: i32| -> Option<char> {
        let row = map.get(usize::try_from(y).ok()?)?;
        row.get(usize::try_from(x).ok()?).copied()
    };
    let is_fill = |x: i32, y: i32| at(x, y) == Some(PLACEHOLDER_FILL);

    let malformed = TemplateError::MalformedPlaceholder { id };
    let (left, right) = (is_fill(ix - 1, iy), is_fill(ix + 1, iy));
    let (up, down) = (is_fill(ix, iy - 1), is_fill(ix, iy + 1));
    if (left && right) || (up && down) {
        // The id sits on an edge, not a corner.
        return Err(malformed);
    }
    let dx = if left { -1 } else { 1 };
    let dy = if up { -1 } else { 1 };

    let mut w = 1;
    while is_fill(ix + dx * w, iy) {
        w += 1;
    }
    let mut h = 1;
    while is_fill(ix, iy + dy * h) {
        h += 1;
    }

    let x0 = if dx < 0 { ix - (w - 1) } else { ix };
    let y0 = if dy < 0 { iy - (h - 1) } else { iy };
    let rect = Rect::new(x0, y0, w, h);

    for position in rect.positions() {
        if (position.x, position.y) == (ix, iy) {
            continue;
        }
        if !is_fill(position.x, position.y) {
            return Err(malformed);
        }
    }
    Ok(rect)
}
