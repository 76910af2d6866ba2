use std::{borrow::Cow, path::Path};

use crate::foundation::error::{ReelError, ReelResult};

/// Brush carried through parley layouts. Caption passes pick their own colors, so this is
/// only a marker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Shapes caption text with one registered font at black weight.
pub struct CaptionTypesetter {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
    size_px: f32,
}

impl std::fmt::Debug for CaptionTypesetter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionTypesetter")
            .field("family_name", &self.family_name)
            .field("size_px", &self.size_px)
            .finish_non_exhaustive()
    }
}

/// Where the caption typeface comes from.
#[derive(Debug, Default)]
pub enum CaptionFont {
    /// Host sans-serif, looked up when the session is prepared.
    #[default]
    System,
    Loaded(CaptionTypesetter),
    /// Render frames without captions.
    Disabled,
}

impl CaptionFont {
    /// `Loaded` from `path` when given, otherwise `System`.
    pub fn from_path(path: Option<&Path>, size_px: f32) -> ReelResult<Self> {
        match path {
            Some(p) => Ok(Self::Loaded(CaptionTypesetter::from_font_file(p, size_px)?)),
            None => Ok(Self::System),
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    /// Typesetter to draw with. A system lookup that finds no font yields `None`.
    pub fn resolve(self, size_px: f32) -> Option<CaptionTypesetter> {
        match self {
            Self::Loaded(typesetter) => Some(typesetter),
            Self::Disabled => None,
            Self::System => match CaptionTypesetter::system_sans_serif(size_px) {
                Ok(typesetter) => Some(typesetter),
                Err(err) => {
                    tracing::debug!(error = %err, "system caption font lookup failed");
                    None
                }
            },
        }
    }
}

/// Named families tried when the generic sans-serif family is not installed.
const SANS_SERIF_FAMILIES: [&str; 6] = [
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "Helvetica",
    "Arial",
    "FreeSans",
];

fn find_system_sans_serif(db: &usvg::fontdb::Database) -> Option<usvg::fontdb::ID> {
    use usvg::fontdb::{Family, Query, Stretch, Style, Weight};

    let mut families = vec![Family::SansSerif];
    families.extend(SANS_SERIF_FAMILIES.iter().map(|&name| Family::Name(name)));
    db.query(&Query {
        families: &families,
        weight: Weight::BLACK,
        stretch: Stretch::Normal,
        style: Style::Normal,
    })
    .or_else(|| db.faces().find(|face| !face.monospaced).map(|face| face.id))
}

impl CaptionTypesetter {
    pub fn from_font_bytes(font_bytes: Vec<u8>, size_px: f32) -> ReelResult<Self> {
        Self::from_font_face(font_bytes, 0, size_px)
    }

    /// Face `index` of a font file or collection.
    pub fn from_font_face(font_bytes: Vec<u8>, index: u32, size_px: f32) -> ReelResult<Self> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ReelError::validation(
                "caption font size must be finite and > 0",
            ));
        }

        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families
            .iter()
            .find(|(_, fonts)| fonts.iter().any(|f| f.index() == index))
            .or_else(|| families.first())
            .map(|(id, _)| *id)
            .ok_or_else(|| ReelError::validation("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ReelError::validation("registered font family has no name"))?
            .to_string();

        let font =
            vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), index);
        tracing::debug!(family = %family_name, index, size_px, "caption font registered");

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font,
            size_px,
        })
    }

    /// Heaviest upright sans-serif face installed on the host.
    pub fn system_sans_serif(size_px: f32) -> ReelResult<Self> {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();

        let id = find_system_sans_serif(&db)
            .ok_or_else(|| ReelError::validation("no system sans-serif font found"))?;
        let (bytes, index) = db
            .with_face_data(id, |data, index| (data.to_vec(), index))
            .ok_or_else(|| ReelError::validation("system font data unavailable"))?;
        Self::from_font_face(bytes, index, size_px)
    }

    pub fn from_font_file(path: &Path, size_px: f32) -> ReelResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            ReelError::validation(format!("read caption font '{}': {e}", path.display()))
        })?;
        Self::from_font_bytes(bytes, size_px)
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub fn font(&self) -> &vello_cpu::peniko::FontData {
        &self.font
    }

    /// Single-line layout of `text` at the configured size.
    pub fn layout(&mut self, text: &str) -> parley::Layout<TextBrushRgba8> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(self.size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::BLACK,
        ));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrushRgba8 {
            r: 255,
            g: 255,
            b: 255,
            a: 255,
        }));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
