use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbImage, RgbaImage};
use serde::Serialize;
use tiny_skia::{FillRule, IntSize, Paint, PathBuilder, Pixmap, Transform};

use crate::{
    gaze, mapping, timeline, GazeMark, Record, Result, ScreenGeometry, StimulusCatalog, SyncError,
    TriggerEdge,
};

/// Drawing surface holding one stimulus image.
pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    /// Loads an image from disk. Transparency is flattened.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(SyncError::not_found(format!(
                "stimulus image {}",
                path.display()
            )));
        }
        let rgb = image::open(path)?.into_rgb8();
        Self::from_rgba(DynamicImage::ImageRgb8(rgb).into_rgba8())
    }

    /// Opaque pixels are identical in premultiplied and straight alpha, so
    /// the buffer can be handed to the pixmap as-is.
    fn from_rgba(image: RgbaImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        let size = IntSize::from_wh(width, height)
            .ok_or_else(|| SyncError::invalid("stimulus image has no pixels"))?;
        let pixmap = Pixmap::from_vec(image.into_raw(), size)
            .ok_or_else(|| SyncError::invalid("stimulus image buffer does not match its size"))?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Fills a circle centred on pixel (`x`, `y`).
    pub fn draw_mark(&mut self, x: i64, y: i64, mark: &GazeMark) {
        let [r, g, b] = mark.color;
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, 255);
        paint.anti_alias = false;

        let Some(circle) = PathBuilder::from_circle(x as f32 + 0.5, y as f32 + 0.5, mark.radius)
        else {
            return;
        };
        self.pixmap.fill_path(
            &circle,
            &paint,
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }

    /// RGBA of one pixel, if inside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let pixel = self.pixmap.pixel(x, y)?.demultiply();
        Some([pixel.red(), pixel.green(), pixel.blue(), pixel.alpha()])
    }

    /// Writes the image; the format follows the file extension.
    pub fn save(self, path: &Path) -> Result<()> {
        let (width, height) = (self.width(), self.height());
        let rgba = RgbaImage::from_raw(width, height, self.pixmap.take())
            .ok_or_else(|| SyncError::invalid("canvas buffer does not match its size"))?;
        let rgb: RgbImage = DynamicImage::ImageRgba8(rgba).into_rgb8();
        rgb.save(path)?;
        Ok(())
    }
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Outcome of a rendering pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderSummary {
    pub saved: Vec<PathBuf>,
    pub marks: usize,
    pub rejected: usize,
}

/// Stimulus currently on screen.
#[derive(Debug)]
struct ActiveStimulus {
    order: usize,
    canvas: Canvas,
}

#[derive(Debug)]
enum SpanState {
    Idle,
    StimulusActive(ActiveStimulus),
}

/// Projects synchronized gaze onto copies of the RSVP stimulus images.
#[derive(Debug, Clone)]
pub struct GazeRenderer {
    geometry: ScreenGeometry,
    mark: GazeMark,
    trigger_channel: String,
    /// Rows per native eye-tracker sample; the repeats carry no new gaze.
    stride: usize,
}

impl GazeRenderer {
    pub fn new(
        geometry: ScreenGeometry,
        mark: GazeMark,
        trigger_channel: impl Into<String>,
        stride: usize,
    ) -> Result<Self> {
        geometry.validate()?;
        if stride == 0 {
            return Err(SyncError::configuration("gaze stride must be at least one row"));
        }
        Ok(Self {
            geometry,
            mark,
            trigger_channel: trigger_channel.into(),
            stride,
        })
    }

    /// Walks `record` row by row. The record starts on a stimulus onset, so
    /// the first stimulus is active from row zero. Offset edges save the
    /// current image into `output_dir`; onset edges open the next one.
    pub fn render(
        &self,
        record: &Record,
        stimuli: &StimulusCatalog,
        output_dir: &Path,
    ) -> Result<RenderSummary> {
        let trigger = record.channel(&self.trigger_channel)?.samples();
        let left_x = record.channel(gaze::LEFT_X)?.samples();
        let left_y = record.channel(gaze::LEFT_Y)?.samples();
        let right_x = record.channel(gaze::RIGHT_X)?.samples();
        let right_y = record.channel(gaze::RIGHT_Y)?.samples();

        let mut summary = RenderSummary::default();
        let mut next_order = 0;
        let mut state = SpanState::StimulusActive(self.open(stimuli, next_order)?);

        for (row, edge) in timeline::edges(trigger).enumerate() {
            state = match (edge, state) {
                (Some(TriggerEdge::Offset), SpanState::StimulusActive(active)) => {
                    let path = output_dir.join(stimuli.annotated_name(active.order)?);
                    active.canvas.save(&path)?;
                    tracing::debug!(order = active.order, path = %path.display(), "saved stimulus");
                    summary.saved.push(path);
                    SpanState::Idle
                }
                (Some(TriggerEdge::Offset), SpanState::Idle) => SpanState::Idle,
                (Some(TriggerEdge::Onset), previous) => {
                    if let SpanState::StimulusActive(active) = previous {
                        tracing::warn!(
                            order = active.order,
                            row,
                            "stimulus replaced before its offset edge; its marks are dropped"
                        );
                    }
                    next_order += 1;
                    SpanState::StimulusActive(self.open(stimuli, next_order)?)
                }
                (None, SpanState::StimulusActive(mut active)) => {
                    if row % self.stride == 0 {
                        let (x, y) = mapping::binocular_center(
                            left_x[row],
                            left_y[row],
                            right_x[row],
                            right_y[row],
                        );
                        let point = self.geometry.to_screen(x, y);
                        if self.geometry.contains(point) {
                            let (px, py) = self.geometry.to_image(
                                point,
                                active.canvas.width(),
                                active.canvas.height(),
                            );
                            active.canvas.draw_mark(px, py, &self.mark);
                            summary.marks += 1;
                        } else {
                            summary.rejected += 1;
                        }
                    }
                    SpanState::StimulusActive(active)
                }
                (None, SpanState::Idle) => SpanState::Idle,
            };
        }

        if let SpanState::StimulusActive(active) = state {
            tracing::warn!(
                order = active.order,
                "recording ended while a stimulus was on screen; it is not saved"
            );
        }

        tracing::info!(
            saved = summary.saved.len(),
            marks = summary.marks,
            rejected = summary.rejected,
            "gaze rendering finished"
        );
        Ok(summary)
    }

    fn open(&self, stimuli: &StimulusCatalog, order: usize) -> Result<ActiveStimulus> {
        let canvas = Canvas::open(stimuli.get(order)?)?;
        Ok(ActiveStimulus { order, canvas })
    }
}
