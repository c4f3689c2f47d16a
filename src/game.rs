//! The text adventure: a dialogue box paged with N and B.

use glam::{Mat4, Vec3};
use log::{debug, info};

use crate::config::DialogueStyle;
use crate::contents::ContentsManager;
use crate::core::{Font, Renderer, TextureHandle};
use crate::error::GpuResult;
use crate::traits::{Controller, Game, GraphicsBackend};
use crate::types::{saturating_i32, Extent, FontDesc, Point, Rect};

const PANEL_SIZE: Extent = Extent::new(1, 1);

/// Pixel-space orthographic projection with the origin at the bottom left
pub fn pixel_projection(size: Extent) -> Mat4 {
    Mat4::orthographic_lh(0.0, size.width as f32, 0.0, size.height as f32, 0.0, 1.0)
}

/// Centre of the dialogue box in window pixels, y down
pub fn dialogue_center(size: Extent, style: &DialogueStyle) -> Point {
    Point::new(
        saturating_i32(size.width / 2),
        saturating_i32(size.height).saturating_sub(saturating_i32(style.bottom_margin)),
    )
}

/// World transform that stretches the unit quad over `area`
///
/// `area` is in window pixels with y down; the projection's y axis points up.
pub fn panel_world(area: Rect, size: Extent) -> Mat4 {
    let center_x = (area.left as f32 + area.right as f32) / 2.0;
    let center_y = size.height as f32 - (area.top as f32 + area.bottom as f32) / 2.0;

    Mat4::from_translation(Vec3::new(center_x, center_y, 0.0))
        * Mat4::from_scale(Vec3::new(area.width() as f32, area.height() as f32, 1.0))
}

pub struct TextAdventure<B: GraphicsBackend> {
    contents: ContentsManager,
    font_desc: FontDesc,
    style: DialogueStyle,
    font: Option<Font<B>>,
    panel: Option<TextureHandle<B>>,
    projected: Option<Extent>,
}

impl<B: GraphicsBackend> TextAdventure<B> {
    pub fn new(contents: ContentsManager, font_desc: FontDesc, style: DialogueStyle) -> Self {
        Self {
            contents,
            font_desc,
            style,
            font: None,
            panel: None,
            projected: None,
        }
    }

    pub fn contents(&self) -> &ContentsManager {
        &self.contents
    }

    /// Keep the projection in step with the client size
    fn sync_projection(&mut self, renderer: &mut Renderer<B>) -> GpuResult<()> {
        let size = renderer.size();
        if size.is_empty() || self.projected == Some(size) {
            return Ok(());
        }

        renderer.update_projection(pixel_projection(size))?;
        self.projected = Some(size);
        debug!("Projection set for {}x{}", size.width, size.height);
        Ok(())
    }
}

impl<B: GraphicsBackend> Game<B> for TextAdventure<B> {
    fn start(&mut self, renderer: &mut Renderer<B>) -> GpuResult<()> {
        self.font = Some(renderer.create_font(self.font_desc.clone())?);
        self.panel = Some(renderer.create_texture(PANEL_SIZE, &self.style.panel_bgra)?);

        renderer.update_view(Mat4::IDENTITY)?;
        self.sync_projection(renderer)?;

        info!("Text adventure started on {:?}", self.contents.active().name());
        Ok(())
    }

    fn update(&mut self, controller: &dyn Controller, renderer: &mut Renderer<B>) -> GpuResult<()> {
        if !renderer.has_target() {
            return Ok(());
        }

        if self.contents.update(controller) {
            debug!(
                "Line {} of {:?}",
                self.contents.index(),
                self.contents.active().name()
            );
        }

        self.sync_projection(renderer)?;

        let size = renderer.size();
        let center = dialogue_center(size, &self.style);
        let area = Rect::centered(center, self.style.text_box);

        if let Some(panel) = &self.panel {
            renderer.update_world(panel_world(area, size))?;
            let texels = Rect::new(0, 0, PANEL_SIZE.width as i32, PANEL_SIZE.height as i32);
            renderer.render_texture(panel, texels)?;
        }

        if let Some(font) = &self.font {
            renderer.render_text(
                font,
                self.contents.current_text(),
                self.style.text_color,
                self.style.text_box,
                center,
            )?;
        }

        Ok(())
    }

    fn end(&mut self, renderer: &mut Renderer<B>) {
        if let Some(panel) = self.panel.take() {
            renderer.delete_texture(panel);
        }
        self.font = None;
        self.projected = None;
        info!("Text adventure ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_maps_corners_to_clip_space() {
        let projection = pixel_projection(Extent::new(800, 600));
        let bottom_left = projection.project_point3(Vec3::new(0.0, 0.0, 0.0));
        let top_right = projection.project_point3(Vec3::new(800.0, 600.0, 0.0));

        assert!((bottom_left.x + 1.0).abs() < 1e-6);
        assert!((bottom_left.y + 1.0).abs() < 1e-6);
        assert!((top_right.x - 1.0).abs() < 1e-6);
        assert!((top_right.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_panel_world_covers_area() {
        let size = Extent::new(800, 600);
        let area = Rect::new(80, 440, 720, 560);
        let world = panel_world(area, size);

        let top_left = world.transform_point3(Vec3::new(-0.5, 0.5, 0.0));
        let bottom_right = world.transform_point3(Vec3::new(0.5, -0.5, 0.0));

        // y up: window row 440 is 160 above the bottom edge
        assert_eq!((top_left.x, top_left.y), (80.0, 160.0));
        assert_eq!((bottom_right.x, bottom_right.y), (720.0, 40.0));
    }

    #[test]
    fn test_dialogue_center_sits_above_bottom() {
        let center = dialogue_center(Extent::new(800, 600), &DialogueStyle::default());
        assert_eq!(center, Point::new(400, 500));
    }

    #[test]
    fn test_oversized_dialogue_style_does_not_overflow() {
        let style = DialogueStyle {
            text_box: Extent::new(u32::MAX, u32::MAX),
            bottom_margin: u32::MAX,
            ..DialogueStyle::default()
        };
        let size = Extent::new(800, 600);

        let center = dialogue_center(size, &style);
        assert_eq!(center, Point::new(400, 600 - i32::MAX));

        let area = Rect::centered(center, style.text_box);
        assert_eq!(area.top, i32::MIN);
        let world = panel_world(area, size);
        assert!(world.is_finite());
    }
}
