use crate::prepare_svg_tree;
use std::path::Path;

pub fn render_from_string(svg_content: &str, path: &Path) -> Result<(), String> {
    let tree = prepare_svg_tree(svg_content.as_bytes())?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| format!("Cannot allocate a {}x{} canvas", size.width(), size.height()))?;
    resvg::render(
        &tree,
        resvg::usvg::Transform::identity(),
        &mut pixmap.as_mut(),
    );
    pixmap
        .save_png(path)
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_a_png_file() {
        let svg = "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"40\" height=\"20\">\
                   <rect x=\"2\" y=\"2\" width=\"36\" height=\"16\" fill=\"#009CA2\"/></svg>";
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.png");
        render_from_string(svg, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[test]
    fn reports_the_target_path_on_failure() {
        let svg = "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"4\" height=\"4\"/>";
        let error = render_from_string(svg, Path::new("/no/such/dir/plot.png")).unwrap_err();
        assert!(error.contains("/no/such/dir/plot.png"), "{}", error);
    }
}
