use crate::utils::Result;
use std::io::BufRead;
use std::path::Path;

const BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];
const PSEUDOCOUNT: f64 = 0.01;
const UNIFORM_BG: f64 = 0.25;

pub fn base_index(base: u8) -> Option<usize> {
    match base {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// A positional weight matrix over ACGT, stored as per-position log2-odds
/// against a uniform background.
#[derive(Debug, Clone)]
pub struct Pwm {
    pub id: String,
    pub desc: String,
    weights: Vec<[f64; 4]>,
}

impl Pwm {
    /// Builds a PWM from raw per-position counts or frequencies (rows are
    /// positions, columns are A C G T).
    pub fn from_counts(id: &str, desc: &str, counts: &[[f64; 4]]) -> Result<Self> {
        if counts.is_empty() {
            return Err(format!("Motif {} has zero positions", id));
        }
        let mut weights = Vec::with_capacity(counts.len());
        for (pos, row) in counts.iter().enumerate() {
            if row.iter().any(|&v| v < 0.0) {
                return Err(format!("Motif {}: negative value at position {}", id, pos + 1));
            }
            let total: f64 = row.iter().sum::<f64>() + 4.0 * PSEUDOCOUNT;
            if total <= 0.0 {
                return Err(format!("Motif {}: empty column at position {}", id, pos + 1));
            }
            let mut row_weights = [0.0; 4];
            for (base, &count) in row.iter().enumerate() {
                let prob = (count + PSEUDOCOUNT) / total;
                row_weights[base] = (prob / UNIFORM_BG).log2();
            }
            weights.push(row_weights);
        }
        Ok(Pwm {
            id: id.to_string(),
            desc: desc.to_string(),
            weights,
        })
    }

    pub fn width(&self) -> usize {
        self.weights.len()
    }

    /// Highest score any window can reach.
    pub fn max_score(&self) -> f64 {
        self.weights
            .iter()
            .map(|row| row.iter().cloned().fold(f64::MIN, f64::max))
            .sum()
    }

    /// Scores one window of `width()` bases. Unknown bases take the minimum
    /// weight of their column.
    pub fn score(&self, window: &[u8]) -> f64 {
        debug_assert_eq!(window.len(), self.width());
        self.weights
            .iter()
            .zip(window.iter())
            .map(|(row, &base)| match base_index(base) {
                Some(idx) => row[idx],
                None => row.iter().cloned().fold(f64::MAX, f64::min),
            })
            .sum()
    }

    pub fn consensus(&self) -> String {
        self.weights
            .iter()
            .map(|row| {
                let best = row
                    .iter()
                    .enumerate()
                    .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
                    .map(|(idx, _)| idx)
                    .unwrap_or(0);
                BASES[best] as char
            })
            .collect()
    }
}

/// Parses one or more motifs from a plain-text matrix file: `>id desc`
/// header lines followed by one whitespace-separated row of four values
/// (A C G T) per motif position.
pub fn parse_motifs<R: BufRead>(reader: R) -> Result<Vec<Pwm>> {
    let mut motifs = Vec::new();
    let mut header: Option<(String, String)> = None;
    let mut rows: Vec<[f64; 4]> = Vec::new();

    let mut flush = |header: &Option<(String, String)>, rows: &mut Vec<[f64; 4]>| -> Result<()> {
        if let Some((id, desc)) = header {
            motifs.push(Pwm::from_counts(id, desc, rows)?);
            rows.clear();
        }
        Ok(())
    };

    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(rest) = line.strip_prefix('>') {
            flush(&header, &mut rows)?;
            let mut parts = rest.trim().splitn(2, char::is_whitespace);
            let id = parts
                .next()
                .filter(|id| !id.is_empty())
                .ok_or(format!("Empty motif id at line {}", line_number + 1))?;
            let desc = parts.next().unwrap_or("").trim().to_string();
            header = Some((id.to_string(), desc));
        } else {
            if header.is_none() {
                return Err(format!(
                    "Matrix row before any '>' header at line {}",
                    line_number + 1
                ));
            }
            let values: Vec<f64> = line
                .split_whitespace()
                .map(|v| {
                    v.parse::<f64>()
                        .map_err(|e| format!("Bad value '{}' at line {}: {}", v, line_number + 1, e))
                })
                .collect::<Result<_>>()?;
            if values.len() != 4 {
                return Err(format!(
                    "Expected 4 values (A C G T) at line {}, found {}",
                    line_number + 1,
                    values.len()
                ));
            }
            rows.push([values[0], values[1], values[2], values[3]]);
        }
    }
    flush(&header, &mut rows)?;
    if motifs.is_empty() {
        return Err("No motifs found in matrix file".to_string());
    }
    Ok(motifs)
}

pub fn read_motif_file(path: &Path) -> Result<Vec<Pwm>> {
    let reader = crate::utils::open_text_reader(path)?;
    parse_motifs(reader).map_err(|e| format!("{}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    pub fn tata_box() -> Pwm {
        let text = ">tata test motif\n\
                    10 0 0 0\n0 0 0 10\n10 0 0 0\n0 0 0 10\n10 0 0 0\n";
        parse_motifs(Cursor::new(text)).unwrap().remove(0)
    }

    #[test]
    fn parses_header_and_rows() {
        let pwm = tata_box();
        assert_eq!(pwm.id, "tata");
        assert_eq!(pwm.desc, "test motif");
        assert_eq!(pwm.width(), 5);
        assert_eq!(pwm.consensus(), "ATATA");
    }

    #[test]
    fn consensus_window_scores_maximal() {
        let pwm = tata_box();
        let max = pwm.max_score();
        assert!((pwm.score(b"ATATA") - max).abs() < 1e-9);
        assert!(pwm.score(b"GGGGG") < max);
    }

    #[test]
    fn unknown_base_takes_minimum_weight() {
        let pwm = tata_box();
        assert!(pwm.score(b"NTATA") <= pwm.score(b"CTATA"));
    }

    #[test]
    fn multiple_motifs_per_file() {
        let text = ">m1\n1 0 0 0\n>m2 second\n0 1 0 0\n0 0 1 0\n";
        let motifs = parse_motifs(Cursor::new(text)).unwrap();
        assert_eq!(motifs.len(), 2);
        assert_eq!(motifs[1].width(), 2);
        assert_eq!(motifs[1].consensus(), "CG");
    }

    #[test]
    fn rejects_row_without_header() {
        assert!(parse_motifs(Cursor::new("1 0 0 0\n")).is_err());
    }

    #[test]
    fn rejects_bad_row_width() {
        assert!(parse_motifs(Cursor::new(">m\n1 0 0\n")).is_err());
    }
}
