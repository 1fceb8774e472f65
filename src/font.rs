use crate::error::ReportError;
use crate::refs::{ObjectReferences, RefType};
use crate::units::Pt;
use owned_ttf_parser::{name_id, AsFaceRef, Face, GlyphId, OwnedFace};
use pdf_writer::types::{CidFontType, FontFlags, SystemInfo};
use pdf_writer::{Filter, Finish, Name, Pdf, Ref, Str};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

/// Name of the font in page resource dictionaries
pub(crate) const FONT_RESOURCE: &str = "F0";

/// A parsed TrueType or OpenType font. It measures text for layout and is
/// embedded in its entirety in generated PDFs.
pub struct Font {
    pub face: OwnedFace,
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font").field("name", &self.name()).finish()
    }
}

impl Font {
    /// Parse a font from raw bytes
    pub fn load(bytes: Vec<u8>) -> Result<Font, ReportError> {
        let face = OwnedFace::from_vec(bytes, 0)?;
        Ok(Font { face })
    }

    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Font, ReportError> {
        Font::load(std::fs::read(path)?)
    }

    fn face(&self) -> &Face<'_> {
        self.face.as_face_ref()
    }

    fn lookup_name(&self, id: u16) -> Option<String> {
        self.face()
            .names()
            .into_iter()
            .find(|name| name.name_id == id && name.is_unicode())
            .and_then(|name| name.to_string())
    }

    /// Full name of the font, or a generic one for fonts that don't carry it
    pub fn name(&self) -> String {
        self.lookup_name(name_id::FULL_NAME)
            .unwrap_or_else(|| "Embedded".to_string())
    }

    /// Points per font unit at the given size
    fn scale(&self, size: Pt) -> Pt {
        size / self.face().units_per_em() as f32
    }

    /// Distance from the baseline to the top of the font
    pub fn ascent(&self, size: Pt) -> Pt {
        self.scale(size) * self.face().ascender() as f32
    }

    /// Vertical distance between the baselines of consecutive lines
    pub fn line_height(&self, size: Pt) -> Pt {
        let face = self.face();
        self.scale(size) * (face.ascender() as f32 - face.descender() as f32 + face.line_gap() as f32)
    }

    /// Horizontal advance of `ch` at the given size. Characters without a
    /// glyph advance like the glyph drawn in their place.
    pub fn advance(&self, ch: char, size: Pt) -> Pt {
        let advance = self
            .face()
            .glyph_hor_advance(GlyphId(self.glyph_id(ch)))
            .unwrap_or_default();
        self.scale(size) * advance as f32
    }

    /// The glyph drawn for `ch`, falling back to the replacement character,
    /// then '?', then the font's missing glyph
    pub fn glyph_id(&self, ch: char) -> u16 {
        ['\u{FFFD}', '?']
            .into_iter()
            .fold(self.face().glyph_index(ch), |found, fallback| {
                found.or_else(|| self.face().glyph_index(fallback))
            })
            .map(|id| id.0)
            .unwrap_or(0)
    }

    /// Glyph ids of `text`, encoded for an Identity-H font
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        text.chars()
            .flat_map(|ch| self.glyph_id(ch).to_be_bytes())
            .collect()
    }

    /// Every glyph reachable from a unicode codepoint, with the first
    /// character mapping to it
    fn glyph_chars(&self) -> BTreeMap<u16, char> {
        let mut map = BTreeMap::new();
        let Some(cmap) = self.face().tables().cmap else {
            return map;
        };
        for subtable in cmap.subtables.into_iter().filter(|t| t.is_unicode()) {
            subtable.codepoints(|codepoint| {
                let glyph = subtable.glyph_index(codepoint).filter(|g| g.0 > 0);
                if let (Some(glyph), Ok(ch)) = (glyph, char::try_from(codepoint)) {
                    map.entry(glyph.0).or_insert(ch);
                }
            });
        }
        map
    }

    /// Embed the font, returning the id of its Type0 font dictionary
    pub(crate) fn write(&self, refs: &mut ObjectReferences, writer: &mut Pdf) -> Ref {
        let font_id = refs.get_or_gen(RefType::Font);
        let glyphs = self.glyph_chars();
        let cid_id = self.write_cid(refs, &glyphs, writer);
        let to_unicode_id = self.write_to_unicode(refs, &glyphs, writer);

        let mut font = writer.type0_font(font_id);
        font.base_font(Name(FONT_RESOURCE.as_bytes()));
        font.encoding_predefined(Name(b"Identity-H"));
        font.descendant_font(cid_id);
        font.to_unicode(to_unicode_id);
        font_id
    }

    fn write_cid(
        &self,
        refs: &mut ObjectReferences,
        glyphs: &BTreeMap<u16, char>,
        writer: &mut Pdf,
    ) -> Ref {
        let descriptor_id = self.write_descriptor(refs, writer);
        let id = refs.gen(RefType::CidFont);
        let per_mille = 1000.0 / self.face().units_per_em() as f32;

        let mut cid = writer.cid_font(id);
        cid.subtype(CidFontType::Type2);
        cid.base_font(Name(FONT_RESOURCE.as_bytes()));
        cid.system_info(SystemInfo {
            registry: Str(b"Adobe"),
            ordering: Str(b"Identity"),
            supplement: 0,
        });
        cid.font_descriptor(descriptor_id);
        cid.default_width(1000.0);

        // runs of consecutive glyph ids share one widths entry
        let mut widths = cid.widths();
        let mut run: Option<(u16, Vec<f32>)> = None;
        for &glyph in glyphs.keys() {
            let width = self
                .face()
                .glyph_hor_advance(GlyphId(glyph))
                .unwrap_or_default() as f32
                * per_mille;
            run = match run {
                Some((start, mut ws)) if start as usize + ws.len() == glyph as usize => {
                    ws.push(width);
                    Some((start, ws))
                }
                Some((start, ws)) => {
                    widths.consecutive(start, ws);
                    Some((glyph, vec![width]))
                }
                None => Some((glyph, vec![width])),
            };
        }
        if let Some((start, ws)) = run {
            widths.consecutive(start, ws);
        }
        widths.finish();

        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        id
    }

    fn write_descriptor(&self, refs: &mut ObjectReferences, writer: &mut Pdf) -> Ref {
        let data_id = refs.gen(RefType::FontData);
        let data = self.face.as_slice();
        writer
            .stream(data_id, data)
            .pair(Name(b"Length1"), data.len() as i32);

        let face = self.face();
        let per_mille = 1000.0 / face.units_per_em() as f32;
        let bbox = face.global_bounding_box();

        let mut flags = FontFlags::SYMBOLIC;
        if face.is_monospaced() {
            flags.insert(FontFlags::FIXED_PITCH);
        }
        if face.is_italic() {
            flags.insert(FontFlags::ITALIC);
        }

        let id = refs.gen(RefType::FontDescriptor);
        let name = self.name().replace(' ', "");
        let mut descriptor = writer.font_descriptor(id);
        descriptor.name(Name(name.as_bytes()));
        if let Some(family) = self.lookup_name(name_id::FAMILY) {
            descriptor.family(Str(family.as_bytes()));
        }
        descriptor.flags(flags);
        descriptor.bbox(pdf_writer::Rect::new(
            bbox.x_min as f32 * per_mille,
            bbox.y_min as f32 * per_mille,
            bbox.x_max as f32 * per_mille,
            bbox.y_max as f32 * per_mille,
        ));
        descriptor.italic_angle(if face.is_italic() { -12.0 } else { 0.0 });
        descriptor.ascent(face.ascender() as f32 * per_mille);
        descriptor.descent(face.descender() as f32 * per_mille);
        descriptor.cap_height(face.capital_height().unwrap_or(face.ascender()) as f32 * per_mille);
        descriptor.stem_v(80.0);
        descriptor.font_file2(data_id);
        id
    }

    fn write_to_unicode(
        &self,
        refs: &mut ObjectReferences,
        glyphs: &BTreeMap<u16, char>,
        writer: &mut Pdf,
    ) -> Ref {
        let id = refs.gen(RefType::ToUnicode);

        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n\
             12 dict begin\n\
             begincmap\n\
             /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
             /CMapName /Adobe-Identity-UCS def\n\
             /CMapType 2 def\n\
             1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
        );
        let entries: Vec<(u16, char)> = glyphs.iter().map(|(g, c)| (*g, *c)).collect();
        // a bfchar block may hold at most 100 entries
        for block in entries.chunks(100) {
            let _ = writeln!(cmap, "{} beginbfchar", block.len());
            for (glyph, ch) in block {
                let mut utf16 = [0u16; 2];
                let _ = write!(cmap, "<{glyph:04x}> <");
                for unit in ch.encode_utf16(&mut utf16) {
                    let _ = write!(cmap, "{unit:04x}");
                }
                cmap.push_str(">\n");
            }
            cmap.push_str("endbfchar\n");
        }
        cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");

        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(cmap.as_bytes(), 6);
        writer
            .stream(id, compressed.as_slice())
            .filter(Filter::FlateDecode);
        id
    }
}
