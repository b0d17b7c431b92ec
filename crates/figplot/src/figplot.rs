#[derive(Debug, PartialEq)]
pub enum Shape {
    Rect,
    HLine,
    VLine,
    None,
    Tick(Option<u32>),
}

pub type Color = String;

#[derive(Debug, PartialEq)]
pub struct Seg {
    pub width: u32,
    pub color: Color,
    pub shape: Shape,
}

/// A horizontal run of segments at a fixed row, optionally labeled at its
/// right end.
#[derive(Debug)]
pub struct Track {
    pub xpos: u32,
    pub ypos: u32,
    pub height: u32,
    pub segs: Vec<Seg>,
    pub label: Option<String>,
    pub outline: bool,
}

/// A free line in plot coordinates (same units as track positions).
#[derive(Debug)]
pub struct Line {
    pub start: (f64, f64),
    pub end: (f64, f64),
    pub color: Color,
    pub width: f64,
}

/// A polyline in plot coordinates, used for score profiles.
#[derive(Debug)]
pub struct Curve {
    pub points: Vec<(f64, f64)>,
    pub color: Color,
    pub width: f64,
}

#[derive(Debug)]
pub struct Legend {
    pub xpos: u32,
    pub ypos: u32,
    pub height: u32,
    pub labels: Vec<(String, Color)>,
}

#[derive(Debug)]
pub struct FigPlot {
    pub tracks: Vec<Track>,
    pub lines: Vec<Line>,
    pub curves: Vec<Curve>,
    pub legend: Legend,
}

impl FigPlot {
    pub fn new() -> Self {
        FigPlot {
            tracks: Vec::new(),
            lines: Vec::new(),
            curves: Vec::new(),
            legend: Legend {
                xpos: 0,
                ypos: 0,
                height: 0,
                labels: Vec::new(),
            },
        }
    }

    /// Widest horizontal extent over all elements, in plot units.
    pub fn max_xpos(&self) -> f64 {
        let track_max = self
            .tracks
            .iter()
            .map(|track| track.xpos + track.segs.iter().map(|seg| seg.width).sum::<u32>())
            .max()
            .unwrap_or(0) as f64;
        let line_max = self
            .lines
            .iter()
            .map(|line| line.start.0.max(line.end.0))
            .fold(0.0, f64::max);
        let curve_max = self
            .curves
            .iter()
            .flat_map(|curve| curve.points.iter().map(|point| point.0))
            .fold(0.0, f64::max);
        track_max.max(line_max).max(curve_max)
    }

    /// Deepest vertical extent over all elements, in plot units.
    pub fn max_ypos(&self) -> f64 {
        let track_max = self
            .tracks
            .iter()
            .map(|track| track.ypos + track.height)
            .max()
            .unwrap_or(0) as f64;
        let line_max = self
            .lines
            .iter()
            .map(|line| line.start.1.max(line.end.1))
            .fold(0.0, f64::max);
        let curve_max = self
            .curves
            .iter()
            .flat_map(|curve| curve.points.iter().map(|point| point.1))
            .fold(0.0, f64::max);
        let legend_max = (self.legend.ypos + self.legend.height) as f64;
        track_max.max(line_max).max(curve_max).max(legend_max)
    }
}

impl Default for FigPlot {
    fn default() -> Self {
        Self::new()
    }
}
