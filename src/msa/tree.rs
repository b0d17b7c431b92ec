use crate::msa::DistMatrix;
use crate::utils::Result;
use figplot::{FigPlot, Line, Track};
use kodama::{linkage, Method};

#[derive(Debug, Clone)]
pub struct Tree {
    pub name: Option<String>,
    /// Child subtrees with their branch lengths.
    pub children: Vec<(Tree, f64)>,
}

impl Tree {
    fn leaf(name: &str) -> Self {
        Tree {
            name: Some(name.to_string()),
            children: Vec::new(),
        }
    }

    fn join(left: (Tree, f64), right: (Tree, f64)) -> Self {
        Tree {
            name: None,
            children: vec![left, right],
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn leaf_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_leaves(&mut names);
        names
    }

    fn collect_leaves<'a>(&'a self, names: &mut Vec<&'a str>) {
        if self.is_leaf() {
            if let Some(name) = &self.name {
                names.push(name);
            }
        }
        for (child, _) in &self.children {
            child.collect_leaves(names);
        }
    }

    pub fn to_newick(&self) -> String {
        let mut out = String::new();
        self.write_newick(&mut out);
        out.push(';');
        out
    }

    fn write_newick(&self, out: &mut String) {
        if self.is_leaf() {
            out.push_str(&sanitize_label(self.name.as_deref().unwrap_or("")));
            return;
        }
        out.push('(');
        for (index, (child, length)) in self.children.iter().enumerate() {
            if index > 0 {
                out.push(',');
            }
            child.write_newick(out);
            out.push_str(&format!(":{:.5}", length));
        }
        out.push(')');
    }
}

fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            ' ' | '(' | ')' | ',' | ':' | ';' => '_',
            other => other,
        })
        .collect()
}

/// Saitou-Nei neighbor joining. Negative branch length estimates are
/// clamped to zero.
pub fn neighbor_joining(matrix: &DistMatrix) -> Result<Tree> {
    let n = matrix.len();
    if n == 0 {
        return Err("Cannot build a tree from an empty distance matrix".to_string());
    }
    let mut nodes: Vec<Tree> = matrix.ids.iter().map(|id| Tree::leaf(id)).collect();
    if n == 1 {
        return Ok(nodes.pop().unwrap());
    }
    let mut dist: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| matrix.get(i, j)).collect())
        .collect();

    while nodes.len() > 2 {
        let m = nodes.len();
        let row_sums: Vec<f64> = (0..m).map(|i| (0..m).map(|k| dist[i][k]).sum()).collect();

        // Pick the pair minimizing the Q criterion
        let (mut best_i, mut best_j) = (0, 1);
        let mut best_q = f64::INFINITY;
        for i in 0..m {
            for j in (i + 1)..m {
                let q = (m as f64 - 2.0) * dist[i][j] - row_sums[i] - row_sums[j];
                if q < best_q {
                    best_q = q;
                    best_i = i;
                    best_j = j;
                }
            }
        }

        let d_ij = dist[best_i][best_j];
        let length_i =
            (d_ij / 2.0 + (row_sums[best_i] - row_sums[best_j]) / (2.0 * (m as f64 - 2.0))).max(0.0);
        let length_j = (d_ij - length_i).max(0.0);

        let merged_dists: Vec<f64> = (0..m)
            .filter(|&k| k != best_i && k != best_j)
            .map(|k| ((dist[best_i][k] + dist[best_j][k] - d_ij) / 2.0).max(0.0))
            .collect();

        // best_j > best_i, remove in that order to keep indices valid
        let node_j = nodes.remove(best_j);
        let node_i = nodes.remove(best_i);
        let merged = Tree::join((node_i, length_i), (node_j, length_j));

        remove_index(&mut dist, best_j);
        remove_index(&mut dist, best_i);
        for (row, &d) in dist.iter_mut().zip(merged_dists.iter()) {
            row.push(d);
        }
        let mut new_row = merged_dists;
        new_row.push(0.0);
        dist.push(new_row);
        nodes.push(merged);
    }

    let d = dist[0][1].max(0.0);
    let right = nodes.pop().unwrap();
    let left = nodes.pop().unwrap();
    Ok(Tree::join((left, d / 2.0), (right, d / 2.0)))
}

fn remove_index(dist: &mut Vec<Vec<f64>>, index: usize) {
    dist.remove(index);
    for row in dist.iter_mut() {
        row.remove(index);
    }
}

/// UPGMA tree from kodama average linkage; node heights are half the merge
/// dissimilarity, branch lengths the height differences.
pub fn upgma(matrix: &DistMatrix) -> Result<Tree> {
    let n = matrix.len();
    if n == 0 {
        return Err("Cannot build a tree from an empty distance matrix".to_string());
    }
    if n == 1 {
        return Ok(Tree::leaf(&matrix.ids[0]));
    }
    let mut condensed = matrix.condensed().to_vec();
    let dendrogram = linkage(&mut condensed, n, Method::Average);

    let mut built: Vec<Option<(Tree, f64)>> = matrix
        .ids
        .iter()
        .map(|id| Some((Tree::leaf(id), 0.0)))
        .collect();
    built.resize(2 * n - 1, None);

    for (step_index, step) in dendrogram.steps().iter().enumerate() {
        let height = step.dissimilarity / 2.0;
        let (left, left_height) = built[step.cluster1]
            .take()
            .expect("kodama steps reference built clusters");
        let (right, right_height) = built[step.cluster2]
            .take()
            .expect("kodama steps reference built clusters");
        let node = Tree::join(
            (left, (height - left_height).max(0.0)),
            (right, (height - right_height).max(0.0)),
        );
        built[n + step_index] = Some((node, height));
    }
    let (root, _) = built[2 * n - 2].take().expect("dendrogram has a root");
    Ok(root)
}

const TREE_X_UNITS: f64 = 200.0;
const LEAF_ROW_HEIGHT: u32 = 6;

/// Renders the tree as a figplot: horizontal branch lines, vertical
/// connectors, leaf labels at their branch tips.
pub fn tree_figplot(tree: &Tree) -> FigPlot {
    let mut plot = FigPlot::new();
    let depth = max_depth(tree, 0.0).max(1e-9);
    let x_scale = TREE_X_UNITS / depth;
    let mut next_leaf_row = 0u32;
    layout(tree, 0.0, x_scale, &mut next_leaf_row, &mut plot);
    plot
}

fn max_depth(tree: &Tree, from_root: f64) -> f64 {
    tree.children
        .iter()
        .map(|(child, length)| max_depth(child, from_root + length))
        .fold(from_root, f64::max)
}

/// Returns this subtree's row (y position in rows).
fn layout(
    tree: &Tree,
    x: f64,
    x_scale: f64,
    next_leaf_row: &mut u32,
    plot: &mut FigPlot,
) -> f64 {
    if tree.is_leaf() {
        let row = *next_leaf_row as f64;
        *next_leaf_row += 1;
        plot.tracks.push(Track {
            xpos: (x * x_scale) as u32,
            ypos: row as u32 * LEAF_ROW_HEIGHT,
            height: LEAF_ROW_HEIGHT,
            segs: Vec::new(),
            label: tree.name.clone(),
            outline: false,
        });
        return row;
    }

    let mut child_rows = Vec::new();
    for (child, length) in &tree.children {
        let child_x = x + length;
        let row = layout(child, child_x, x_scale, next_leaf_row, plot);
        child_rows.push((row, child_x));
    }
    let row = child_rows.iter().map(|(r, _)| r).sum::<f64>() / child_rows.len() as f64;
    let y_of = |r: f64| (r + 0.5) * LEAF_ROW_HEIGHT as f64;

    for (child_row, child_x) in &child_rows {
        // horizontal branch, then vertical connector down to this node's row
        plot.lines.push(Line {
            start: (x * x_scale, y_of(*child_row)),
            end: (child_x * x_scale, y_of(*child_row)),
            color: "#000000".to_string(),
            width: 1.5,
        });
        plot.lines.push(Line {
            start: (x * x_scale, y_of(*child_row)),
            end: (x * x_scale, y_of(row)),
            color: "#000000".to_string(),
            width: 1.5,
        });
    }
    row
}
