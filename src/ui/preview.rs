use image::imageops::FilterType;
use image::RgbImage;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::path::Path;

use super::format_size;
use crate::app::{App, ImageEntry};
use crate::assets::{AssetStore, ImageInfo};
use crate::db::TIMESTAMP_FORMAT;

/// Upper half block: foreground paints the top pixel, background the bottom one.
const HALF_BLOCK: &str = "▀";

/// Decoded thumbnail and file facts for the selected image, kept between frames.
#[derive(Default)]
pub struct ImagePreviewState {
    cached: Option<CachedPreview>,
}

struct CachedPreview {
    image_id: i64,
    info: Option<ImageInfo>,
    thumbnail: Option<RgbImage>,
    rendered: Option<(u16, u16, Vec<Line<'static>>)>,
}

impl ImagePreviewState {
    fn load(&mut self, entry: &ImageEntry, assets: &AssetStore) -> &mut CachedPreview {
        let stale = self
            .cached
            .as_ref()
            .map(|c| c.image_id != entry.record.id)
            .unwrap_or(true);

        if stale {
            let path = Path::new(&entry.record.path);
            let info = assets.image_info(path).ok();
            let thumbnail = assets
                .thumbnails()
                .get_or_create(path)
                .and_then(|thumb| crate::assets::open_image(&thumb))
                .map(|img| img.to_rgb8());
            if let Err(ref e) = thumbnail {
                tracing::debug!(path = %path.display(), error = %e, "no thumbnail for preview");
            }

            self.cached = Some(CachedPreview {
                image_id: entry.record.id,
                info,
                thumbnail: thumbnail.ok(),
                rendered: None,
            });
        }

        self.cached.get_or_insert_with(|| CachedPreview {
            image_id: entry.record.id,
            info: None,
            thumbnail: None,
            rendered: None,
        })
    }
}

pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Preview ");

    let Some(entry) = app.selected_image().cloned() else {
        let paragraph = Paragraph::new("No selection")
            .block(block)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
        return;
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cached = app.preview.load(&entry, &app.assets);
    let info_lines = info_lines(&entry, cached.info.as_ref());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(info_lines.len() as u16 + 1),
            Constraint::Min(0),
        ])
        .split(inner);

    let paragraph = Paragraph::new(Text::from(info_lines)).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, chunks[0]);

    let image_area = chunks[1];
    if image_area.width == 0 || image_area.height == 0 {
        return;
    }

    let Some(ref thumbnail) = cached.thumbnail else {
        let missing = Paragraph::new("No preview available")
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC));
        frame.render_widget(missing, image_area);
        return;
    };

    let size = (image_area.width, image_area.height);
    let up_to_date = matches!(cached.rendered, Some((w, h, _)) if (w, h) == size);
    if !up_to_date {
        let lines = half_block_lines(thumbnail, size.0, size.1);
        cached.rendered = Some((size.0, size.1, lines));
    }
    if let Some((_, _, ref lines)) = cached.rendered {
        frame.render_widget(Paragraph::new(lines.clone()), image_area);
    }
}

fn info_lines(entry: &ImageEntry, info: Option<&ImageInfo>) -> Vec<Line<'static>> {
    let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::DarkGray));
    let record = &entry.record;

    let mut lines = vec![
        Line::from(vec![label("Name: "), Span::raw(record.original_name.clone())]),
        Line::from(vec![label("File: "), Span::raw(record.filename.clone())]),
        Line::from(vec![label("Added: "), Span::raw(display_timestamp(&record.created_date))]),
    ];

    if record.updated_date != record.created_date {
        lines.push(Line::from(vec![
            label("Updated: "),
            Span::raw(display_timestamp(&record.updated_date)),
        ]));
    }

    let tags = if entry.tags.is_empty() {
        Span::styled("none", Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
    } else {
        let names: Vec<&str> = entry.tags.iter().map(|t| t.name.as_str()).collect();
        Span::styled(names.join(", "), Style::default().fg(Color::Cyan))
    };
    lines.push(Line::from(vec![label("Tags: "), tags]));

    match info {
        Some(info) => {
            lines.push(Line::from(vec![
                label("Dimensions: "),
                Span::raw(format!("{}x{}", info.width, info.height)),
            ]));
            if let Some(ref format) = info.format {
                lines.push(Line::from(vec![label("Format: "), Span::raw(format.clone())]));
            }
            lines.push(Line::from(vec![label("Size: "), Span::raw(format_size(info.file_size))]));
        }
        None => lines.push(Line::from(Span::styled(
            "File missing or unreadable",
            Style::default().fg(Color::Red),
        ))),
    }

    lines
}

/// Stored UTC timestamps shown to the minute.
fn display_timestamp(raw: &str) -> String {
    chrono::NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Draw `img` into a `width` x `height` cell area using two pixels per cell.
pub fn half_block_lines(img: &RgbImage, width: u16, height: u16) -> Vec<Line<'static>> {
    let (max_w, max_h) = (width as u32, height as u32 * 2);
    if max_w == 0 || max_h == 0 || img.width() == 0 || img.height() == 0 {
        return Vec::new();
    }

    let scale = f64::min(
        max_w as f64 / img.width() as f64,
        max_h as f64 / img.height() as f64,
    )
    .min(1.0);
    let w = ((img.width() as f64 * scale).round() as u32).clamp(1, max_w);
    let h = ((img.height() as f64 * scale).round() as u32).clamp(1, max_h);
    let scaled = image::imageops::resize(img, w, h, FilterType::Triangle);

    let color = |x: u32, y: u32| {
        let p = scaled.get_pixel(x, y);
        Color::Rgb(p[0], p[1], p[2])
    };

    (0..h)
        .step_by(2)
        .map(|y| {
            let spans: Vec<Span<'static>> = (0..w)
                .map(|x| {
                    let style = if y + 1 < h {
                        Style::default().fg(color(x, y)).bg(color(x, y + 1))
                    } else {
                        Style::default().fg(color(x, y))
                    };
                    Span::styled(HALF_BLOCK, style)
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}
