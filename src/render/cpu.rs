use std::{collections::HashMap, sync::Arc};

use crate::{
    assets::clips::ClipFrame,
    captions::style::{CaptionStyle, KineticCaption},
    foundation::core::{Affine, Canvas, Rgba8},
    foundation::error::{ReelError, ReelResult},
    render::{FrameRGBA, text::CaptionTypesetter},
};

/// Vertical darkening overlay, `(offset, alpha)` pairs top to bottom.
pub const OVERLAY_STOPS: [(f32, f32); 4] = [(0.0, 0.1), (0.5, 0.2), (0.8, 0.6), (1.0, 0.9)];

/// Below this scale a caption is invisible and its transform degenerate.
const MIN_CAPTION_SCALE: f64 = 1e-3;

/// A clip picture positioned on the canvas.
#[derive(Clone, Debug)]
pub struct ClipLayer {
    /// Index in the clip set, used to cache uploaded pictures.
    pub clip: usize,
    pub frame: ClipFrame,
    /// Source pixel space → canvas space.
    pub transform: Affine,
    pub opacity: f32,
}

/// Draws frames with `vello_cpu`: black clear, clip layers in order, overlay, caption.
pub struct FrameCompositor {
    canvas: Canvas,
    width: u16,
    height: u16,
    caption_style: CaptionStyle,
    typesetter: Option<CaptionTypesetter>,
    clip_images: HashMap<usize, (u64, vello_cpu::Image)>,
    overlay: vello_cpu::Image,
}

impl FrameCompositor {
    pub fn new(
        canvas: Canvas,
        caption_style: CaptionStyle,
        typesetter: Option<CaptionTypesetter>,
    ) -> ReelResult<Self> {
        canvas.validate()?;
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| ReelError::validation("canvas width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| ReelError::validation("canvas height exceeds u16"))?;
        let overlay = overlay_image(canvas)?;
        Ok(Self {
            canvas,
            width,
            height,
            caption_style,
            typesetter,
            clip_images: HashMap::new(),
            overlay,
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn has_caption_font(&self) -> bool {
        self.typesetter.is_some()
    }

    pub fn compose(
        &mut self,
        layers: &[ClipLayer],
        caption: Option<&KineticCaption>,
    ) -> ReelResult<FrameRGBA> {
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        let full = vello_cpu::kurbo::Rect::new(0.0, 0.0, self.canvas.w(), self.canvas.h());

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(0, 0, 0, 255));
        ctx.fill_rect(&full);

        for layer in layers {
            self.draw_clip(&mut ctx, layer)?;
        }

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(self.overlay.clone());
        ctx.fill_rect(&full);

        if let Some(caption) = caption {
            self.draw_caption(&mut ctx, caption);
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        ctx.render_to_pixmap(&mut pixmap);

        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn draw_clip(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        layer: &ClipLayer,
    ) -> ReelResult<()> {
        let opacity = layer.opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return Ok(());
        }
        let image = self.clip_image(layer.clip, &layer.frame)?;

        ctx.set_transform(affine_to_cpu(layer.transform));
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(image);
        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(layer.frame.width),
            f64::from(layer.frame.height),
        ));
        if opacity < 1.0 {
            ctx.pop_layer();
        }
        Ok(())
    }

    fn clip_image(&mut self, clip: usize, frame: &ClipFrame) -> ReelResult<vello_cpu::Image> {
        if let Some((generation, image)) = self.clip_images.get(&clip)
            && *generation == frame.generation
        {
            return Ok(image.clone());
        }
        let pixmap =
            image_premul_bytes_to_pixmap(frame.rgba8_premul.as_slice(), frame.width, frame.height)?;
        let image = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.clip_images
            .insert(clip, (frame.generation, image.clone()));
        Ok(image)
    }

    fn draw_caption(&mut self, ctx: &mut vello_cpu::RenderContext, caption: &KineticCaption) {
        if caption.scale.abs() <= MIN_CAPTION_SCALE || caption.text.is_empty() {
            return;
        }
        let Some(typesetter) = self.typesetter.as_mut() else {
            return;
        };

        let layout = typesetter.layout(&caption.text);
        let font = typesetter.font().clone();
        // Center the block on the text-space origin.
        let centered = Affine::translate((
            -f64::from(layout.width()) / 2.0,
            -f64::from(layout.height()) / 2.0,
        ));
        let base = caption.transform(self.canvas) * centered;
        let paint = caption.paint();

        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(affine_to_cpu(base));
        ctx.set_stroke(
            vello_cpu::kurbo::Stroke::new(self.caption_style.stroke_width)
                .with_join(vello_cpu::kurbo::Join::Round),
        );
        ctx.set_paint(color_to_cpu(paint.outline));
        draw_glyphs(ctx, &layout, &font, GlyphPass::Stroke);

        ctx.set_paint(color_to_cpu(paint.fill));
        draw_glyphs(ctx, &layout, &font, GlyphPass::Fill);

        if let Some(glitch) = paint.glitch {
            let shifted = caption.transform(self.canvas) * Affine::translate(glitch.offset) * centered;
            ctx.set_transform(affine_to_cpu(shifted));
            ctx.set_paint(color_to_cpu(glitch.color));
            draw_glyphs(ctx, &layout, &font, GlyphPass::Fill);
        }
    }
}

#[derive(Clone, Copy)]
enum GlyphPass {
    Stroke,
    Fill,
}

fn draw_glyphs(
    ctx: &mut vello_cpu::RenderContext,
    layout: &parley::Layout<crate::render::text::TextBrushRgba8>,
    font: &vello_cpu::peniko::FontData,
    pass: GlyphPass,
) {
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            let builder = ctx.glyph_run(font).font_size(run.run().font_size());
            match pass {
                GlyphPass::Stroke => builder.stroke_glyphs(glyphs),
                GlyphPass::Fill => builder.fill_glyphs(glyphs),
            }
        }
    }
}

fn overlay_image(canvas: Canvas) -> ReelResult<vello_cpu::Image> {
    let (w, h) = (canvas.width, canvas.height);
    let mut bytes = vec![0u8; (w as usize) * (h as usize) * 4];
    let h1 = (h.max(1) - 1) as f32;
    for y in 0..h {
        let t = if h1 <= 0.0 { 0.0 } else { (y as f32) / h1 };
        let c = Rgba8::BLACK.with_alpha_f32(overlay_alpha(t)).to_premul();
        let row = (y as usize) * (w as usize) * 4;
        for px in bytes[row..row + (w as usize) * 4].chunks_exact_mut(4) {
            px.copy_from_slice(&c);
        }
    }
    let pixmap = image_premul_bytes_to_pixmap(&bytes, w, h)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

/// Overlay alpha at vertical offset `t` in `[0, 1]`, linear between stops.
pub fn overlay_alpha(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    for pair in OVERLAY_STOPS.windows(2) {
        let (t0, a0) = pair[0];
        let (t1, a1) = pair[1];
        if t <= t1 {
            let span = t1 - t0;
            let u = if span <= 0.0 { 1.0 } else { (t - t0) / span };
            return a0 + (a1 - a0) * u;
        }
    }
    OVERLAY_STOPS[OVERLAY_STOPS.len() - 1].1
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> ReelResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ReelError::media("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ReelError::media("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(ReelError::media("clip frame byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
