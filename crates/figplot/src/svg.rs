use crate::figplot::{Color, Curve, FigPlot, Legend, Line, Shape, Track};
use std::fmt::Write as fmtWrite;
use std::path::Path;

const DEFAULT_X_SCALE: f64 = 750.0;
const DEFAULT_Y_SCALE: f64 = 3.0;
const DEFAULT_PADDING: f64 = 12.0;
const LABEL_GUTTER: f64 = 120.0;

pub fn generate_string(plot: &FigPlot) -> String {
    let widest = plot.max_xpos();
    let x_scale = if widest > 0.0 {
        DEFAULT_X_SCALE / widest
    } else {
        1.0
    };
    let has_labels = plot.tracks.iter().any(|track| track.label.is_some());
    let mut generator = Generator::new((x_scale, DEFAULT_Y_SCALE), DEFAULT_PADDING, has_labels);
    generator.generate(plot);
    generator.buffer
}

pub fn render_from_string(svg_content: &str, path: &Path) -> Result<(), String> {
    std::fs::write(path, svg_content)
        .map_err(|e| format!("Failed to write SVG {}: {}", path.display(), e))
}

struct Generator {
    scale: (f64, f64),
    pad: f64,
    label_gutter: f64,
    buffer: String,
}

impl Generator {
    fn new(scale: (f64, f64), pad: f64, has_labels: bool) -> Self {
        Self {
            scale,
            pad,
            label_gutter: if has_labels { LABEL_GUTTER } else { 0.0 },
            buffer: String::new(),
        }
    }

    fn generate(&mut self, plot: &FigPlot) {
        let (width, height) = self.get_dimensions(plot);
        self.start_svg(width, height);
        self.add_background();

        for track in &plot.tracks {
            self.plot_track(track);
            if track.outline {
                self.plot_outline(track);
            }
        }
        for line in &plot.lines {
            self.plot_line(line);
        }
        for curve in &plot.curves {
            self.plot_curve(curve);
        }
        self.plot_legend(&plot.legend);
        self.end_svg();
    }

    fn plot_track(&mut self, track: &Track) {
        let x = self.to_x(track.xpos as f64) + self.pad;
        let y = self.to_y(track.ypos as f64) + self.pad;
        let track_height = self.to_y(track.height as f64);

        let mut x_cur = x;
        for seg in &track.segs {
            let dims = (self.to_x(seg.width as f64), track_height);
            match seg.shape {
                Shape::Rect => self.add_rect((x_cur, y), dims, &seg.color),
                Shape::HLine => self.add_hline((x_cur, y), dims, &seg.color, 1.5),
                Shape::Tick(label) => self.add_tick((x_cur, y), dims, &seg.color, label),
                Shape::None | Shape::VLine => {}
            }
            x_cur += self.to_x(seg.width as f64);
        }

        // Vertical marks go on top of the filled segments
        let mut x_cur = x;
        for seg in &track.segs {
            let dims = (self.to_x(seg.width as f64), track_height);
            if seg.shape == Shape::VLine {
                self.add_vline((x_cur, y), dims, &seg.color);
            }
            x_cur += self.to_x(seg.width as f64);
        }

        if let Some(label) = &track.label {
            self.add_text((x_cur + 5.0, y + track_height - 1.0), label);
        }
    }

    fn plot_outline(&mut self, track: &Track) {
        let height = self.to_y(track.height as f64);
        let width = self.to_x(track.segs.iter().map(|seg| seg.width).sum::<u32>() as f64);
        let x = self.to_x(track.xpos as f64) + self.pad;
        let y = self.to_y(track.ypos as f64) + self.pad;

        let dimensions = format!("width=\"{width}\" height=\"{height}\"");
        let pos = format!("x=\"{x}\" y=\"{y}\"");
        let style = r##"stroke="#000000" stroke-width="1.5" fill="transparent""##;
        writeln!(self.buffer, "<rect {} {} {} />", dimensions, pos, style).unwrap();
    }

    fn plot_line(&mut self, line: &Line) {
        let x1y1 = format!(
            "x1=\"{}\" y1=\"{}\"",
            self.to_x(line.start.0) + self.pad,
            self.to_y(line.start.1) + self.pad
        );
        let x2y2 = format!(
            "x2=\"{}\" y2=\"{}\"",
            self.to_x(line.end.0) + self.pad,
            self.to_y(line.end.1) + self.pad
        );
        let style = format!("stroke=\"{}\" stroke-width=\"{}\"", line.color, line.width);
        writeln!(self.buffer, "<line {} {} {} />", x1y1, x2y2, style).unwrap();
    }

    fn plot_curve(&mut self, curve: &Curve) {
        if curve.points.len() < 2 {
            return;
        }
        let points = curve
            .points
            .iter()
            .map(|(x, y)| format!("{:.2},{:.2}", self.to_x(*x) + self.pad, self.to_y(*y) + self.pad))
            .collect::<Vec<_>>()
            .join(" ");
        let style = format!(
            "fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"",
            curve.color, curve.width
        );
        writeln!(self.buffer, "<polyline points=\"{}\" {} />", points, style).unwrap();
    }

    fn plot_legend(&mut self, legend: &Legend) {
        let base_x = self.to_x(legend.xpos as f64) + self.pad;
        let base_y = self.to_y(legend.ypos as f64) + self.pad;
        let height = self.to_y(legend.height as f64);
        let mut x = base_x;
        for (label, color) in &legend.labels {
            self.add_rect((x, base_y), (height, height), color);
            x += height + 2.0;
            self.add_text((x, base_y + height - 1.0), label);
            x += 5.0 * (2 * label.len() as u32 + 1) as f64;
        }
    }

    fn add_rect(&mut self, pos: (f64, f64), dims: (f64, f64), color: &Color) {
        let (x, y) = pos;
        let (w, h) = dims;
        let pos = format!("x=\"{}\" y=\"{}\"", x, y);
        let dim = format!("height=\"{}\" width=\"{}\"", h, w);
        let style = format!("fill=\"{}\" stroke=\"{}\" stroke-width=\"0\"", color, color);
        writeln!(self.buffer, "<rect {} {} {} opacity=\"0.9\" />", pos, dim, style).unwrap();
    }

    fn add_hline(&mut self, pos: (f64, f64), dims: (f64, f64), color: &Color, stroke: f64) {
        let y = pos.1 + dims.1 / 2.0;
        let x1y1 = format!("x1=\"{}\" y1=\"{}\"", pos.0, y);
        let x2y2 = format!("x2=\"{}\" y2=\"{}\"", pos.0 + dims.0, y);
        let style = format!("stroke=\"{}\" stroke-width=\"{}\"", color, stroke);
        writeln!(self.buffer, "<line {} {} {} />", x1y1, x2y2, style).unwrap();
    }

    fn add_vline(&mut self, pos: (f64, f64), dims: (f64, f64), color: &Color) {
        let x1y1 = format!("x1=\"{}\" y1=\"{}\"", pos.0, pos.1);
        let x2y2 = format!("x2=\"{}\" y2=\"{}\"", pos.0, pos.1 + dims.1);
        let stroke_width = 2.0_f64.min(self.to_x(1.0));
        let style = format!("stroke=\"{}\" stroke-width=\"{}\"", color, stroke_width);
        writeln!(self.buffer, "<line {} {} {} />", x1y1, x2y2, style).unwrap();
    }

    fn add_tick(&mut self, pos: (f64, f64), dims: (f64, f64), color: &Color, label: Option<u32>) {
        let x1y1 = format!("x1=\"{}\" y1=\"{}\"", pos.0, pos.1);
        let x2y2 = format!("x2=\"{}\" y2=\"{}\"", pos.0, pos.1 + dims.1);
        let style = format!("stroke=\"{}\" stroke-width=\"1.5\"", color);
        writeln!(self.buffer, "<line {} {} {} />", x1y1, x2y2, style).unwrap();

        if let Some(label) = label {
            let point = format!("x=\"{}\" y=\"{}\"", pos.0, pos.1 - 2.0);
            let height = r#"font-size="14px""#;
            let style = r#"font-family="monospace" font-weight="bold" text-anchor="middle""#;
            writeln!(self.buffer, "<text {} {} {} >{}</text>", point, style, height, label).unwrap();
        }
    }

    fn add_text(&mut self, pos: (f64, f64), text: &str) {
        let point = format!("x=\"{}\" y=\"{}\"", pos.0, pos.1);
        let height = r#"font-size="14px""#;
        let style = r#"font-family="monospace" font-weight="bold""#;
        writeln!(self.buffer, "<text {} {} {} >{}</text>", point, style, height, text).unwrap();
    }

    fn get_dimensions(&self, plot: &FigPlot) -> (f64, f64) {
        let xdim = self.to_x(plot.max_xpos()) + 2.0 * self.pad + self.label_gutter;
        let ydim = self.to_y(plot.max_ypos()) + 2.0 * self.pad;
        (xdim, ydim)
    }

    fn start_svg(&mut self, width: f64, height: f64) {
        writeln!(self.buffer, r#"<?xml version="1.0"?>"#).unwrap();
        write!(
            self.buffer,
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" "#
        )
        .unwrap();
        writeln!(self.buffer, "width=\"{}\" height=\"{}\">", width, height).unwrap();
    }

    fn end_svg(&mut self) {
        writeln!(self.buffer, "</svg>").unwrap();
    }

    fn add_background(&mut self) {
        writeln!(
            self.buffer,
            r#"<rect width="100%" height="100%" fill="white" />"#
        )
        .unwrap();
    }

    fn to_x(&self, pos: f64) -> f64 {
        pos * self.scale.0
    }

    fn to_y(&self, pos: f64) -> f64 {
        pos * self.scale.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figplot::Seg;

    fn one_track_plot() -> FigPlot {
        let mut plot = FigPlot::new();
        plot.tracks.push(Track {
            xpos: 0,
            ypos: 0,
            height: 4,
            segs: vec![
                Seg {
                    width: 10,
                    color: "#3366CC".to_string(),
                    shape: Shape::Rect,
                },
                Seg {
                    width: 5,
                    color: "#999999".to_string(),
                    shape: Shape::HLine,
                },
            ],
            label: Some("seq1".to_string()),
            outline: true,
        });
        plot
    }

    #[test]
    fn svg_output_is_well_formed() {
        let svg = generate_string(&one_track_plot());
        assert!(svg.starts_with(r#"<?xml version="1.0"?>"#));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("seq1"));
        assert!(svg.contains("#3366CC"));
    }

    #[test]
    fn empty_plot_has_no_zero_division() {
        let svg = generate_string(&FigPlot::new());
        assert!(svg.contains("<svg"));
    }
}
