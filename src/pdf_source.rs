//! [`RosterDocument`] backed by the `pdf` crate.
//!
//! Text runs are produced by replaying the page content stream with a small
//! text-state machine; a run's emphasis is its font size scaled by the text
//! matrix and the CTM. Images are the `Do` operations whose resource is an
//! image XObject. Form XObjects are expanded in place, with their own
//! resources and matrix, so text and images drawn inside them are seen in
//! painting order.

use std::collections::HashMap;
use std::path::Path;

use image::ImageFormat;
use pdf::content::{FormXObject, Matrix, Op, TextDrawAdjusted};
use pdf::enc::StreamFilter;
use pdf::error::PdfError;
use pdf::file::{CachedFile, FileOptions};
use pdf::font::{Font, ToUnicodeMap, Widths};
use pdf::object::{
    ColorSpace, ImageXObject, Object, Page, PageRc, PlainRef, Ref, Resolve, Resources, XObject,
};
use pdf::primitive::{Name, PdfString};

use crate::error::{ExtractError, Result};
use crate::source::{ImageHandle, PositionedTextRun, RasterImage, RosterDocument};

/// TJ spacing (thousandths of an em) wider than this is treated as a word gap.
const WORD_GAP: f32 = 200.0;

/// Longest chain of nested form XObjects that is followed.
const MAX_FORM_DEPTH: usize = 12;

/// Maintain the current text state while iterating over PDF text operators.
#[derive(Debug, Clone)]
struct TextState {
    current_font: Option<String>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    text_rise: f32,
    text_matrix: Matrix,
    text_line_matrix: Matrix,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            current_font: None,
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 100.0,
            leading: 0.0,
            text_rise: 0.0,
            text_matrix: Matrix::default(),
            text_line_matrix: Matrix::default(),
        }
    }
}

impl TextState {
    fn begin_text(&mut self) {
        self.text_matrix = Matrix::default();
        self.text_line_matrix = Matrix::default();
    }

    fn set_text_matrix(&mut self, matrix: Matrix) {
        self.text_matrix = matrix;
        self.text_line_matrix = matrix;
    }

    fn set_font(&mut self, name: &str, size: f32) {
        self.current_font = Some(name.to_owned());
        self.font_size = size;
    }

    fn translate_line(&mut self, tx: f32, ty: f32) {
        self.text_line_matrix = multiply_matrix(&translation(tx, ty), &self.text_line_matrix);
        self.text_matrix = self.text_line_matrix;
    }

    fn newline(&mut self) {
        self.translate_line(0.0, -self.leading);
    }

    fn translate_text(&mut self, tx: f32) {
        self.text_matrix = multiply_matrix(&translation(tx, 0.0), &self.text_matrix);
    }
}

/// Font information needed to decode strings and advance the text matrix.
struct ResolvedFont {
    widths: Option<Widths>,
    to_unicode: Option<ToUnicodeMap>,
    is_cid: bool,
}

impl ResolvedFont {
    fn from_font(font: &Font, resolver: &impl Resolve) -> std::result::Result<Self, PdfError> {
        let widths = font.widths(resolver)?;
        let to_unicode = match font.to_unicode(resolver) {
            Some(map) => Some(map?),
            None => None,
        };
        Ok(Self {
            widths,
            to_unicode,
            is_cid: font.is_cid(),
        })
    }

    fn decode(&self, text: &PdfString) -> DecodedText {
        let bytes = text.as_bytes();
        if self.is_cid {
            decode_cid(bytes, self.to_unicode.as_ref())
        } else {
            decode_simple(bytes, self.to_unicode.as_ref())
        }
    }

    fn glyph_width(&self, code: u16) -> f32 {
        self.widths
            .as_ref()
            .map(|w| w.get(code as usize))
            .unwrap_or(1000.0)
    }
}

/// Text decoded from a PDF string along with the glyph codes used for width calculation.
struct DecodedText {
    text: String,
    codes: Vec<u16>,
}

fn decode_codes(codes: Vec<u16>, map: Option<&ToUnicodeMap>) -> DecodedText {
    let mut text = String::new();
    for &code in &codes {
        if let Some(value) = map.and_then(|map| map.get(code)) {
            text.push_str(value);
            continue;
        }
        text.push(char::from_u32(code as u32).unwrap_or('\u{FFFD}'));
    }
    DecodedText { text, codes }
}

fn decode_simple(bytes: &[u8], map: Option<&ToUnicodeMap>) -> DecodedText {
    decode_codes(bytes.iter().map(|&b| b as u16).collect(), map)
}

fn decode_cid(bytes: &[u8], map: Option<&ToUnicodeMap>) -> DecodedText {
    let codes = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    decode_codes(codes, map)
}

fn fallback_decode(text: &PdfString) -> DecodedText {
    DecodedText {
        text: text.to_string_lossy(),
        codes: text.as_bytes().iter().map(|&b| b as u16).collect(),
    }
}

fn translation(tx: f32, ty: f32) -> Matrix {
    Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: tx,
        f: ty,
    }
}

fn multiply_matrix(left: &Matrix, right: &Matrix) -> Matrix {
    Matrix {
        a: left.a * right.a + left.b * right.c,
        b: left.a * right.b + left.b * right.d,
        c: left.c * right.a + left.d * right.c,
        d: left.c * right.b + left.d * right.d,
        e: left.e * right.a + left.f * right.c + right.e,
        f: left.e * right.b + left.f * right.d + right.f,
    }
}

fn apply_matrix(matrix: &Matrix, point: (f32, f32)) -> (f32, f32) {
    (
        matrix.a * point.0 + matrix.c * point.1 + matrix.e,
        matrix.b * point.0 + matrix.d * point.1 + matrix.f,
    )
}

/// Length of the transformed unit y-vector; how much a matrix stretches glyph height.
fn vertical_scale(matrix: &Matrix) -> f32 {
    (matrix.c * matrix.c + matrix.d * matrix.d).sqrt()
}

fn page_err(page: usize) -> impl Fn(PdfError) -> ExtractError {
    move |err| ExtractError::Page {
        page,
        reason: err.to_string(),
    }
}

fn collect_fonts(resources: &Resources, resolver: &impl Resolve) -> HashMap<String, ResolvedFont> {
    let mut fonts = HashMap::new();
    for (name, lazy) in resources.fonts.iter() {
        let resolved = lazy
            .load(resolver)
            .and_then(|font| ResolvedFont::from_font(&font, resolver));
        match resolved {
            Ok(font) => {
                fonts.insert(name.as_str().to_owned(), font);
            }
            Err(err) => log::warn!(
                "font {} unusable, falling back to raw bytes: {}",
                name.as_str(),
                err
            ),
        }
    }
    fonts
}

/// Receives a page's operators with form XObjects expanded in place.
///
/// `enter`/`leave` bracket the page itself and every form painted on it.
trait ContentSink {
    fn operation(&mut self, op: &Op);

    fn image(&mut self, _name: &str, _object: PlainRef) {}

    fn enter(&mut self, _matrix: Matrix, _resources: &Resources, _resolver: &impl Resolve) {}

    fn leave(&mut self) {}
}

/// Walks content streams, following `Do` into forms.
struct ContentWalker<'r, R> {
    resolver: &'r R,
    page_index: usize,
    forms: Vec<PlainRef>,
}

impl<'r, R: Resolve> ContentWalker<'r, R> {
    fn new(resolver: &'r R, page_index: usize) -> Self {
        Self {
            resolver,
            page_index,
            forms: Vec::new(),
        }
    }

    fn walk(&mut self, ops: &[Op], resources: &Resources, sink: &mut impl ContentSink) {
        for op in ops {
            match op {
                Op::XObject { name } => self.paint(name, resources, sink),
                _ => sink.operation(op),
            }
        }
    }

    fn paint(&mut self, name: &Name, resources: &Resources, sink: &mut impl ContentSink) {
        let Some(&xobject_ref) = resources.xobjects.get(name) else {
            log::debug!(
                "page {}: XObject {} missing from resources",
                self.page_index,
                name.as_str()
            );
            return;
        };
        let xobject = match self.resolver.get(xobject_ref) {
            Ok(xobject) => xobject,
            Err(err) => {
                log::warn!(
                    "page {}: XObject {} unreadable: {}",
                    self.page_index,
                    name.as_str(),
                    err
                );
                return;
            }
        };
        match &*xobject {
            XObject::Image(_) => sink.image(name.as_str(), xobject_ref.get_inner()),
            XObject::Form(form) => {
                self.enter_form(name.as_str(), xobject_ref.get_inner(), form, resources, sink)
            }
            _ => {}
        }
    }

    fn enter_form(
        &mut self,
        name: &str,
        key: PlainRef,
        form: &FormXObject,
        parent: &Resources,
        sink: &mut impl ContentSink,
    ) {
        if self.forms.contains(&key) {
            log::warn!("page {}: form {} paints itself", self.page_index, name);
            return;
        }
        if self.forms.len() >= MAX_FORM_DEPTH {
            log::warn!(
                "page {}: form {} nested deeper than {}",
                self.page_index,
                name,
                MAX_FORM_DEPTH
            );
            return;
        }
        let ops = match form.operations(self.resolver) {
            Ok(ops) => ops,
            Err(err) => {
                log::warn!("page {}: form {} unreadable: {}", self.page_index, name, err);
                return;
            }
        };
        let dict = form.dict();
        let matrix = match dict.matrix.clone() {
            Some(primitive) => {
                Matrix::from_primitive(primitive, self.resolver).unwrap_or_else(|err| {
                    log::warn!("page {}: form {} matrix ignored: {}", self.page_index, name, err);
                    Matrix::default()
                })
            }
            None => Matrix::default(),
        };
        // A form without resources uses those of whatever painted it.
        let resources = dict.resources.as_deref().unwrap_or(parent);

        self.forms.push(key);
        sink.enter(matrix, resources, self.resolver);
        self.walk(&ops, resources, sink);
        sink.leave();
        self.forms.pop();
    }
}

/// Replays text and graphics-state operators and records one run per show operation.
struct TextCollector {
    page_index: usize,
    /// Fonts of the page and of every form currently being painted.
    fonts: Vec<HashMap<String, ResolvedFont>>,
    state: TextState,
    ctm: Matrix,
    stack: Vec<(Matrix, TextState)>,
    runs: Vec<PositionedTextRun>,
}

impl TextCollector {
    fn new(page_index: usize) -> Self {
        Self {
            page_index,
            fonts: Vec::new(),
            state: TextState::default(),
            ctm: Matrix::default(),
            stack: Vec::new(),
            runs: Vec::new(),
        }
    }

    fn save(&mut self) {
        self.stack.push((self.ctm, self.state.clone()));
    }

    fn restore(&mut self) {
        let Some((ctm, saved)) = self.stack.pop() else {
            return;
        };
        // Text matrices are not part of the graphics state.
        let text_matrix = self.state.text_matrix;
        let text_line_matrix = self.state.text_line_matrix;
        self.ctm = ctm;
        self.state = saved;
        self.state.text_matrix = text_matrix;
        self.state.text_line_matrix = text_line_matrix;
    }

    fn apply(&mut self, op: &Op) {
        match op {
            Op::Save => self.save(),
            Op::Restore => self.restore(),
            Op::Transform { matrix } => self.ctm = multiply_matrix(matrix, &self.ctm),
            Op::BeginText => self.state.begin_text(),
            Op::SetTextMatrix { matrix } => self.state.set_text_matrix(*matrix),
            Op::MoveTextPosition { translation } => {
                self.state.translate_line(translation.x, translation.y)
            }
            Op::TextNewline => self.state.newline(),
            Op::TextFont { name, size } => self.state.set_font(name.as_str(), *size),
            Op::CharSpacing { char_space } => self.state.char_spacing = *char_space,
            Op::WordSpacing { word_space } => self.state.word_spacing = *word_space,
            Op::TextScaling { horiz_scale } => self.state.horizontal_scale = *horiz_scale,
            Op::Leading { leading } => self.state.leading = *leading,
            Op::TextRise { rise } => self.state.text_rise = *rise,
            Op::TextDraw { text } => {
                let (y, emphasis) = self.origin();
                let shown = self.draw(text);
                self.push_run(shown, y, emphasis);
            }
            Op::TextDrawAdjusted { array } => self.draw_adjusted(array),
            _ => {}
        }
    }

    fn origin(&self) -> (f32, f32) {
        let local = apply_matrix(&self.state.text_matrix, (0.0, self.state.text_rise));
        let (_, y) = apply_matrix(&self.ctm, local);
        let emphasis = self.state.font_size
            * vertical_scale(&self.state.text_matrix)
            * vertical_scale(&self.ctm);
        (y, emphasis)
    }

    fn font(&self) -> Option<&ResolvedFont> {
        let name = self.state.current_font.as_ref()?;
        self.fonts.last()?.get(name)
    }

    /// Decode one string and advance the text matrix past it.
    fn draw(&mut self, text: &PdfString) -> String {
        let font = self.font();
        let decoded = match font {
            Some(resolved) => resolved.decode(text),
            None => fallback_decode(text),
        };
        let displacement = self.displacement(font, &decoded.codes);
        if displacement != 0.0 {
            self.state.translate_text(displacement);
        }
        decoded.text
    }

    fn displacement(&self, font: Option<&ResolvedFont>, codes: &[u16]) -> f32 {
        let state = &self.state;
        let mut total = 0.0;
        for &code in codes {
            let glyph_width = font.map(|f| f.glyph_width(code)).unwrap_or(1000.0);
            let mut advance = (glyph_width / 1000.0) * state.font_size;
            advance += state.char_spacing;
            if code == 32 {
                advance += state.word_spacing;
            }
            total += advance;
        }
        total * (state.horizontal_scale / 100.0)
    }

    /// A TJ array is one run: kerning is dropped and wide gaps become spaces.
    fn draw_adjusted(&mut self, array: &[TextDrawAdjusted]) {
        let (y, emphasis) = self.origin();
        let mut shown = String::new();
        for item in array {
            match item {
                TextDrawAdjusted::Text(text) => shown.push_str(&self.draw(text)),
                TextDrawAdjusted::Spacing(amount) => {
                    if *amount < -WORD_GAP && !shown.is_empty() && !shown.ends_with(' ') {
                        shown.push(' ');
                    }
                    let adjustment = -amount / 1000.0
                        * self.state.font_size
                        * (self.state.horizontal_scale / 100.0);
                    if adjustment != 0.0 {
                        self.state.translate_text(adjustment);
                    }
                }
            }
        }
        self.push_run(shown, y, emphasis);
    }

    fn push_run(&mut self, text: String, y: f32, emphasis: f32) {
        if text.is_empty() {
            return;
        }
        self.runs
            .push(PositionedTextRun::new(text, emphasis, y, self.page_index));
    }
}

impl ContentSink for TextCollector {
    fn operation(&mut self, op: &Op) {
        self.apply(op);
    }

    fn enter(&mut self, matrix: Matrix, resources: &Resources, resolver: &impl Resolve) {
        self.save();
        self.ctm = multiply_matrix(&matrix, &self.ctm);
        self.fonts.push(collect_fonts(resources, resolver));
    }

    fn leave(&mut self) {
        self.fonts.pop();
        self.restore();
    }
}

/// Image paint operations in painting order.
#[derive(Default)]
struct ImageScan {
    handles: Vec<ImageHandle>,
}

impl ContentSink for ImageScan {
    fn operation(&mut self, _op: &Op) {}

    fn image(&mut self, name: &str, object: PlainRef) {
        self.handles
            .push(ImageHandle::with_object(name, object.id, object.r#gen));
    }
}

/// Samples per pixel implied by the decoded stream length.
fn sample_channels(len: usize, width: u32, height: u32) -> Option<u8> {
    let pixels = width as usize * height as usize;
    match len {
        l if l == pixels => Some(1),
        l if l == pixels * 3 => Some(3),
        l if l == pixels * 4 => Some(4),
        _ => None,
    }
}

/// Naive CMYK to RGB conversion; enough for photos on a roster.
fn cmyk_to_rgb(data: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(data.len() / 4 * 3);
    for px in data.chunks_exact(4) {
        let k = 255 - px[3] as u16;
        for &ink in &px[..3] {
            rgb.push(((255 - ink as u16) * k / 255) as u8);
        }
    }
    rgb
}

/// Components per color of a palette's base color space.
fn color_components(space: &ColorSpace) -> Option<usize> {
    let components = match space {
        ColorSpace::DeviceGray | ColorSpace::CalGray(_) => 1,
        ColorSpace::DeviceRGB | ColorSpace::CalRGB(_) => 3,
        ColorSpace::DeviceCMYK | ColorSpace::CalCMYK(_) => 4,
        ColorSpace::Icc(stream) => stream.info.components as usize,
        _ => return None,
    };
    matches!(components, 1 | 3 | 4).then_some(components)
}

/// Replace 8-bit palette indices with the colors they select.
fn expand_indexed(
    indices: &[u8],
    base: &ColorSpace,
    hival: u8,
    lookup: &[u8],
) -> std::result::Result<(Vec<u8>, u8), String> {
    let components = color_components(base)
        .ok_or_else(|| format!("unsupported palette base {:?}", base))?;
    let mut samples = Vec::with_capacity(indices.len() * components);
    for &index in indices {
        let start = index.min(hival) as usize * components;
        let color = lookup
            .get(start..start + components)
            .ok_or_else(|| format!("palette has no entry {}", index))?;
        samples.extend_from_slice(color);
    }
    match components {
        4 => Ok((cmyk_to_rgb(&samples), 3)),
        n => Ok((samples, n as u8)),
    }
}

fn decode_image(
    image: &ImageXObject,
    resolver: &impl Resolve,
) -> std::result::Result<RasterImage, String> {
    let width = image.width;
    let height = image.height;
    let (raw, filter) = image.raw_image_data(resolver).map_err(|e| e.to_string())?;
    if let Some(StreamFilter::DCTDecode(_)) = filter {
        let decoded = image::load_from_memory_with_format(&raw, ImageFormat::Jpeg)
            .map_err(|e| e.to_string())?;
        return Ok(RasterImage::from_bitmap(decoded.to_rgba8()));
    }

    let bits = image.bits_per_component.unwrap_or(8);
    if bits != 8 {
        return Err(format!("unsupported bit depth {bits}"));
    }
    let data = image.image_data(resolver).map_err(|e| e.to_string())?;

    if let Some(ColorSpace::Indexed(base, hival, lookup)) = &image.color_space {
        if data.len() != width as usize * height as usize {
            return Err(format!(
                "indexed image of {} bytes for {}x{}",
                data.len(),
                width,
                height
            ));
        }
        let (samples, channels) = expand_indexed(&data, base, *hival, lookup)?;
        return Ok(RasterImage::from_samples(width, height, samples, channels));
    }

    match sample_channels(data.len(), width, height) {
        Some(4) if matches!(image.color_space, Some(ColorSpace::DeviceCMYK)) => Ok(
            RasterImage::from_samples(width, height, cmyk_to_rgb(&data), 3),
        ),
        Some(channels) => Ok(RasterImage::from_samples(
            width,
            height,
            data.to_vec(),
            channels,
        )),
        None => Err(format!(
            "unexpected sample buffer of {} bytes for {}x{}",
            data.len(),
            width,
            height
        )),
    }
}

/// A roster PDF opened with the `pdf` crate.
pub struct PdfRoster {
    file: CachedFile<Vec<u8>>,
}

impl PdfRoster {
    /// Parse a PDF held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let file = FileOptions::cached()
            .load(bytes)
            .map_err(|e| ExtractError::DocumentParse(e.to_string()))?;
        Ok(Self { file })
    }

    /// Open a PDF file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = FileOptions::cached()
            .open(path)
            .map_err(|e| ExtractError::DocumentParse(e.to_string()))?;
        Ok(Self { file })
    }

    fn page(&self, page_index: usize) -> Result<PageRc> {
        self.file
            .get_page(page_index as u32)
            .map_err(page_err(page_index))
    }

    fn operations(&self, page: &Page, page_index: usize) -> Result<Vec<Op>> {
        match &page.contents {
            Some(content) => content
                .operations(&self.file.resolver())
                .map_err(page_err(page_index)),
            None => Ok(Vec::new()),
        }
    }

    /// Feed the page's operators, forms expanded, into `sink`.
    fn walk_page(&self, page_index: usize, sink: &mut impl ContentSink) -> Result<()> {
        let page = self.page(page_index)?;
        let page_ref: &Page = &page;
        let operations = self.operations(page_ref, page_index)?;
        let resolver = self.file.resolver();
        let empty = Resources::default();
        let resources: &Resources = match page_ref.resources() {
            Ok(resources) => &**resources,
            Err(err) => {
                log::debug!("page {}: no resources: {}", page_index, err);
                &empty
            }
        };

        sink.enter(Matrix::default(), resources, &resolver);
        ContentWalker::new(&resolver, page_index).walk(&operations, resources, sink);
        sink.leave();
        Ok(())
    }

    /// Look an image up by name among the page's own resources.
    fn page_xobject(
        &self,
        page_index: usize,
        name: &str,
    ) -> std::result::Result<Ref<XObject>, String> {
        let page = self.page(page_index).map_err(|e| e.to_string())?;
        let page_ref: &Page = &page;
        let resources = page_ref.resources().map_err(|e| e.to_string())?;
        resources
            .xobjects
            .iter()
            .find(|(candidate, _)| candidate.as_str() == name)
            .map(|(_, xobject_ref)| *xobject_ref)
            .ok_or_else(|| "no such XObject".to_owned())
    }
}

impl RosterDocument for PdfRoster {
    async fn page_count(&self) -> Result<usize> {
        Ok(self.file.num_pages() as usize)
    }

    async fn page_text_runs(&self, page_index: usize) -> Result<Vec<PositionedTextRun>> {
        let mut collector = TextCollector::new(page_index);
        self.walk_page(page_index, &mut collector)?;
        Ok(collector.runs)
    }

    async fn page_image_operations(&self, page_index: usize) -> Result<Vec<ImageHandle>> {
        let mut scan = ImageScan::default();
        self.walk_page(page_index, &mut scan)?;
        Ok(scan.handles)
    }

    async fn resolve_image(&self, page_index: usize, handle: &ImageHandle) -> Result<RasterImage> {
        let failed = |reason: String| ExtractError::ImageResolution {
            page: page_index,
            handle: handle.to_string(),
            reason,
        };
        let xobject_ref = match handle.object() {
            Some((id, generation)) => Ref::new(PlainRef {
                id,
                r#gen: generation,
            }),
            None => self.page_xobject(page_index, handle.name()).map_err(failed)?,
        };
        let resolver = self.file.resolver();
        let xobject = resolver.get(xobject_ref).map_err(|e| failed(e.to_string()))?;
        match &*xobject {
            XObject::Image(image) => decode_image(image, &resolver).map_err(failed),
            _ => Err(failed("XObject is not an image".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scale(s: f32) -> Matrix {
        Matrix {
            a: s,
            b: 0.0,
            c: 0.0,
            d: s,
            e: 0.0,
            f: 0.0,
        }
    }

    #[test]
    fn simple_strings_decode_byte_per_glyph() {
        let decoded = decode_simple(b"Jane", None);
        assert_eq!(decoded.text, "Jane");
        assert_eq!(decoded.codes, vec![74, 97, 110, 101]);
    }

    #[test]
    fn cid_strings_decode_two_bytes_per_glyph() {
        let decoded = decode_cid(&[0x00, 0x44, 0x00, 0x6f, 0x00], None);
        assert_eq!(decoded.text, "Do");
        assert_eq!(decoded.codes.len(), 2);
    }

    #[test]
    fn vertical_scale_combines_with_font_size() {
        assert_eq!(vertical_scale(&Matrix::default()), 1.0);
        assert_eq!(vertical_scale(&scale(2.0)), 2.0);
    }

    #[test]
    fn line_translation_moves_origin() {
        let mut state = TextState::default();
        state.set_text_matrix(scale(1.0));
        state.translate_line(10.0, 700.0);
        assert_eq!(apply_matrix(&state.text_matrix, (0.0, 0.0)), (10.0, 700.0));
        state.leading = 14.0;
        state.newline();
        assert_eq!(apply_matrix(&state.text_matrix, (0.0, 0.0)), (10.0, 686.0));
    }

    #[test]
    fn channels_follow_buffer_length() {
        assert_eq!(sample_channels(100, 10, 10), Some(1));
        assert_eq!(sample_channels(300, 10, 10), Some(3));
        assert_eq!(sample_channels(400, 10, 10), Some(4));
        assert_eq!(sample_channels(250, 10, 10), None);
    }

    #[test]
    fn cmyk_converts_to_rgb() {
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 0, 0, 0, 0, 255]), vec![255, 255, 255, 0, 0, 0]);
        assert_eq!(cmyk_to_rgb(&[255, 0, 0, 0]), vec![0, 255, 255]);
    }

    fn runs_of(content: &[u8]) -> Vec<(String, f32)> {
        let ops = pdf::content::parse_ops(content, &pdf::object::NoResolve).unwrap();
        let mut collector = TextCollector::new(0);
        for op in &ops {
            collector.apply(op);
        }
        collector
            .runs
            .into_iter()
            .map(|run| (run.text, run.emphasis))
            .collect()
    }

    #[test]
    fn font_size_is_restored_with_graphics_state() {
        let runs = runs_of(
            b"BT /F1 10 Tf 72 760 Td (Header) Tj ET \
              q BT /F1 14 Tf 72 740 Td (Jane Doe) Tj ET Q \
              BT 72 720 Td (Classification:) Tj ET",
        );
        assert_eq!(
            runs,
            vec![
                ("Header".to_owned(), 10.0),
                ("Jane Doe".to_owned(), 14.0),
                ("Classification:".to_owned(), 10.0),
            ]
        );
    }

    #[test]
    fn ctm_scales_emphasis_until_restore() {
        let runs = runs_of(
            b"q 2 0 0 2 0 0 cm BT /F1 10 Tf (Big) Tj ET Q BT /F1 10 Tf (Small) Tj ET",
        );
        assert_eq!(runs[0], ("Big".to_owned(), 20.0));
        assert_eq!(runs[1], ("Small".to_owned(), 10.0));
    }

    #[test]
    fn indexed_samples_expand_through_palette() {
        let palette = [10, 20, 30, 40, 50, 60];
        let (samples, channels) =
            expand_indexed(&[0, 1, 7], &ColorSpace::DeviceRGB, 1, &palette).unwrap();
        assert_eq!(channels, 3);
        assert_eq!(samples, vec![10, 20, 30, 40, 50, 60, 40, 50, 60]);

        let (gray, channels) =
            expand_indexed(&[1], &ColorSpace::DeviceGray, 1, &[0, 255]).unwrap();
        assert_eq!((gray, channels), (vec![255], 1));

        let (rgb, channels) =
            expand_indexed(&[0], &ColorSpace::DeviceCMYK, 0, &[0, 0, 0, 255]).unwrap();
        assert_eq!((rgb, channels), (vec![0, 0, 0], 3));
    }

    #[test]
    fn indexed_samples_need_a_usable_palette() {
        assert!(expand_indexed(&[2], &ColorSpace::DeviceRGB, 2, &[0; 6]).is_err());
        assert!(expand_indexed(&[0], &ColorSpace::Pattern, 0, &[0; 3]).is_err());
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        let err = PdfRoster::from_bytes(b"definitely not a pdf".to_vec())
            .err()
            .expect("parse must fail");
        assert!(err.is_fatal());
    }
}
