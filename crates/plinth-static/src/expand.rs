//! Marker expansion and the related-entries trailer.

use plinth_entry::Entry;

use crate::markers::{scan, MarkerKind, Segment};
use crate::templates::{PageRenderer, RenderError};

/// Paragraph that introduces the related-entries trailer.
pub const RELATED_SEPARATOR: &str = "If you enjoyed that article, try out a couple more:";

/// Expand `<!--MACRO:name-->` markers in raw content. Other markers are
/// left in place for [`expand_rendered`].
pub fn expand_raw(renderer: &PageRenderer, text: &str) -> Result<String, RenderError> {
    let mut out = String::with_capacity(text.len());

    for segment in scan(text) {
        match segment {
            Segment::Text(t) => out.push_str(t),
            Segment::Marker(m) if m.kind == MarkerKind::Macro => {
                out.push_str(&renderer.render_macro(m.key)?);
            }
            Segment::Marker(m) => out.push_str(m.raw),
        }
    }

    Ok(out)
}

/// Expand `<!--MACRO_WEB:name-->` and `<!--/path-->` markers in a rendered
/// body.
///
/// Every embed key is checked before anything is rendered; when some do not
/// resolve, the error lists each distinct one in order of first appearance.
pub fn expand_rendered(renderer: &PageRenderer, text: &str) -> Result<String, RenderError> {
    let index = &renderer.site().index;
    let segments: Vec<Segment<'_>> = scan(text).collect();

    let mut unresolved: Vec<String> = Vec::new();
    for segment in &segments {
        if let Segment::Marker(m) = segment {
            if m.kind == MarkerKind::Embed
                && index.get(m.key).is_none()
                && !unresolved.iter().any(|k| k == m.key)
            {
                unresolved.push(m.key.to_string());
            }
        }
    }
    if !unresolved.is_empty() {
        return Err(RenderError::UnresolvedReferences(unresolved));
    }

    let mut out = String::with_capacity(text.len());
    for segment in segments {
        match segment {
            Segment::Text(t) => out.push_str(t),
            Segment::Marker(m) => match m.kind {
                MarkerKind::WebMacro => out.push_str(&renderer.render_macro(m.key)?),
                MarkerKind::Embed => {
                    // Checked above.
                    if let Some(target) = index.get(m.key) {
                        out.push_str(&renderer.link_card(target)?);
                    }
                }
                MarkerKind::Macro => out.push_str(m.raw),
            },
        }
    }

    Ok(out)
}

/// Link cards for the entry's `related` list, after the separator
/// paragraph. Empty when the list is.
pub fn related_trailer(renderer: &PageRenderer, entry: &Entry) -> Result<String, RenderError> {
    if entry.related.is_empty() {
        return Ok(String::new());
    }

    let index = &renderer.site().index;
    let mut out = format!("\n<p>{RELATED_SEPARATOR}</p>\n");
    for key in &entry.related {
        let target = index
            .get(key)
            .ok_or_else(|| RenderError::UnknownRelated(key.clone()))?;
        out.push_str(&renderer.link_card(target)?);
    }

    Ok(out)
}
