/*!
This crate provides functionality to generate simple track figures: stacked
horizontal tracks made of segments of specified width, shape, and color,
optionally annotated with free-form lines, polyline curves, labels, and a
legend. Figures can be rendered as SVG, PNG, and PDF images.

Track figures are used to draw alignment overviews, synteny maps,
phylogenetic trees, and per-residue score profiles.
*/

mod common;
mod figplot;
mod image;
mod pdf;
mod png;
mod svg;

pub use common::prepare_svg_tree;
pub use figplot::{Color, Curve, FigPlot, Legend, Line, Seg, Shape, Track};
pub use image::generate as generate_image;
