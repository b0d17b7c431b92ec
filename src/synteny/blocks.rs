use crate::synteny::{find_anchors, Anchor, SeqDb};
use crate::utils::{aligned_rows, global_align, Result, SeqKind, SeqRecord, GAP};
use bio::alphabets::dna::revcomp;
use figplot::{Color, FigPlot, Legend, Line, Seg, Shape, Track};
use itertools::Itertools;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

#[derive(Debug, Clone, Copy)]
pub struct ChainParams {
    pub k: usize,
    pub max_gap: usize,
    pub diag_band: usize,
    pub min_block: usize,
    pub min_anchors: usize,
}

impl Default for ChainParams {
    fn default() -> Self {
        ChainParams {
            k: 12,
            max_gap: 2000,
            diag_band: 100,
            min_block: 60,
            min_anchors: 2,
        }
    }
}

/// A syntenic block: matched intervals (half-open, forward-strand
/// coordinates) in the two parent sequences.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub a_start: usize,
    pub a_end: usize,
    pub b_start: usize,
    pub b_end: usize,
    pub strand: char,
    pub num_anchors: usize,
    /// Seed bases backing the chain, an upper bound on matched positions.
    pub score: usize,
}

impl Block {
    pub fn a_len(&self) -> usize {
        self.a_end - self.a_start
    }

    pub fn b_len(&self) -> usize {
        self.b_end - self.b_start
    }
}

/// Synteny between one pair of database sequences.
#[derive(Debug, Clone)]
pub struct PairSynteny {
    pub name_a: String,
    pub name_b: String,
    pub len_a: usize,
    pub len_b: usize,
    pub blocks: Vec<Block>,
}

/// Detects blocks between two sequences: anchor k-mers are chained
/// greedily along (anti)diagonals and chains spanning too little sequence
/// or too few anchors are dropped.
pub fn detect_blocks(a: &[u8], b: &[u8], params: &ChainParams) -> Vec<Block> {
    let anchors = find_anchors(a, b, params.k);
    let mut blocks = Vec::new();
    for strand in ['+', '-'] {
        let mut strand_anchors: Vec<Anchor> = anchors
            .iter()
            .filter(|anchor| anchor.strand == strand)
            .copied()
            .collect();
        strand_anchors.sort_by_key(|anchor| (anchor.pos_a, anchor.pos_b));
        blocks.extend(chain_anchors(&strand_anchors, strand, params));
    }
    blocks.sort_by_key(|block| (block.a_start, block.b_start));
    blocks
}

fn chain_anchors(anchors: &[Anchor], strand: char, params: &ChainParams) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut chain: Vec<Anchor> = Vec::new();

    let diagonal = |anchor: &Anchor| -> i64 {
        if strand == '+' {
            anchor.pos_a as i64 - anchor.pos_b as i64
        } else {
            anchor.pos_a as i64 + anchor.pos_b as i64
        }
    };

    for &anchor in anchors {
        let extends = chain.last().is_some_and(|last| {
            let a_step = anchor.pos_a > last.pos_a && anchor.pos_a - last.pos_a <= params.max_gap;
            let b_step = if strand == '+' {
                anchor.pos_b > last.pos_b && anchor.pos_b - last.pos_b <= params.max_gap
            } else {
                anchor.pos_b < last.pos_b && last.pos_b - anchor.pos_b <= params.max_gap
            };
            let on_diagonal =
                (diagonal(&anchor) - diagonal(last)).unsigned_abs() as usize <= params.diag_band;
            a_step && b_step && on_diagonal
        });
        if extends {
            chain.push(anchor);
        } else {
            if let Some(block) = finish_chain(&chain, strand, params) {
                blocks.push(block);
            }
            chain.clear();
            chain.push(anchor);
        }
    }
    if let Some(block) = finish_chain(&chain, strand, params) {
        blocks.push(block);
    }
    blocks
}

fn finish_chain(chain: &[Anchor], strand: char, params: &ChainParams) -> Option<Block> {
    let first = chain.first()?;
    let last = chain.last()?;
    let (b_start, b_end) = if strand == '+' {
        (first.pos_b, last.pos_b + params.k)
    } else {
        (last.pos_b, first.pos_b + params.k)
    };
    let block = Block {
        a_start: first.pos_a,
        a_end: last.pos_a + params.k,
        b_start,
        b_end,
        strand,
        num_anchors: chain.len(),
        score: chain.len() * params.k,
    };
    let spans_enough = block.a_len() >= params.min_block && block.b_len() >= params.min_block;
    (spans_enough && block.num_anchors >= params.min_anchors).then_some(block)
}

/// Runs block detection for every unordered pair of database sequences.
pub fn find_synteny(db: &SeqDb, params: &ChainParams) -> Result<Vec<PairSynteny>> {
    let names = db.names();
    if names.len() < 2 {
        return Err("Synteny detection needs at least two sequences".to_string());
    }
    let pairs: Vec<(String, String)> = names
        .iter()
        .tuple_combinations()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();

    pairs
        .into_par_iter()
        .map(|(name_a, name_b)| {
            let record_a = db.get(&name_a)?;
            let record_b = db.get(&name_b)?;
            let blocks = detect_blocks(&record_a.seq, &record_b.seq, params);
            log::debug!("{} vs {}: {} blocks", name_a, name_b, blocks.len());
            Ok(PairSynteny {
                name_a,
                name_b,
                len_a: record_a.len(),
                len_b: record_b.len(),
                blocks,
            })
        })
        .collect()
}

/// Aligns a block's two segments; the returned rows are gapped and equally
/// long. The B segment is reverse-complemented first for '-' blocks.
pub fn align_block(a: &[u8], b: &[u8], block: &Block) -> (Vec<u8>, Vec<u8>) {
    let seg_a = &a[block.a_start..block.a_end];
    let seg_b = if block.strand == '+' {
        b[block.b_start..block.b_end].to_vec()
    } else {
        revcomp(&b[block.b_start..block.b_end])
    };
    let alignment = global_align(SeqKind::Dna, seg_a, &seg_b);
    aligned_rows(seg_a, &seg_b, &alignment)
}

/// Exports one FASTA record per detected block: the gapped A-segment row of
/// the block alignment, with both parent intervals in the description. The
/// record's residue count therefore never exceeds the A interval length.
pub fn export_blocks(db: &SeqDb, pairs: &[PairSynteny]) -> Result<Vec<SeqRecord>> {
    let mut records = Vec::new();
    let mut block_number = 0usize;
    for pair in pairs {
        let a = db.get(&pair.name_a)?;
        let b = db.get(&pair.name_b)?;
        for block in &pair.blocks {
            block_number += 1;
            let (row_a, _row_b) = align_block(&a.seq, &b.seq, block);
            records.push(SeqRecord {
                id: format!("block{}", block_number),
                desc: Some(format!(
                    "{}:{}-{} {}:{}-{} strand={}",
                    pair.name_a,
                    block.a_start + 1,
                    block.a_end,
                    pair.name_b,
                    block.b_start + 1,
                    block.b_end,
                    block.strand
                )),
                seq: row_a,
            });
        }
    }
    Ok(records)
}

const BLOCK_PALETTE: [&str; 6] = [
    "#6A3D9A", "#1F78B4", "#FF7F00", "#33A02C", "#E31A1C", "#B15928",
];
const TRACK_HEIGHT: u32 = 5;
const TRACK_GAP: u32 = 14;

/// Two scaled tracks with matching block colors and connector lines between
/// matched intervals.
pub fn synteny_figplot(pair: &PairSynteny) -> FigPlot {
    let mut plot = FigPlot::new();
    plot.tracks.push(pair_track(
        &pair.blocks,
        pair.len_a,
        0,
        &pair.name_a,
        |block| (block.a_start, block.a_end),
    ));
    plot.tracks.push(pair_track(
        &pair.blocks,
        pair.len_b,
        TRACK_GAP,
        &pair.name_b,
        |block| (block.b_start, block.b_end),
    ));
    for (index, block) in pair.blocks.iter().enumerate() {
        let color: Color = BLOCK_PALETTE[index % BLOCK_PALETTE.len()].to_string();
        plot.lines.push(Line {
            start: (
                (block.a_start + block.a_len() / 2) as f64,
                (TRACK_HEIGHT + 1) as f64,
            ),
            end: (
                (block.b_start + block.b_len() / 2) as f64,
                (TRACK_GAP - 1) as f64,
            ),
            color,
            width: 1.0,
        });
    }
    plot.legend = Legend {
        xpos: 0,
        ypos: TRACK_GAP + TRACK_HEIGHT + 2,
        height: 4,
        labels: vec![("syntenic block".to_string(), BLOCK_PALETTE[0].to_string())],
    };
    plot
}

fn pair_track<F>(blocks: &[Block], len: usize, ypos: u32, label: &str, interval: F) -> Track
where
    F: Fn(&Block) -> (usize, usize),
{
    let mut segs = Vec::new();
    let mut cursor = 0usize;
    let mut sorted: Vec<(usize, usize, usize)> = blocks
        .iter()
        .enumerate()
        .map(|(index, block)| {
            let (start, end) = interval(block);
            (start, end, index)
        })
        .collect();
    sorted.sort_unstable();
    for (start, end, index) in sorted {
        if start < cursor {
            continue; // overlapping block, keep the first occupant
        }
        if start > cursor {
            segs.push(Seg {
                width: (start - cursor) as u32,
                color: "#D0D0D0".to_string(),
                shape: Shape::HLine,
            });
        }
        segs.push(Seg {
            width: (end - start) as u32,
            color: BLOCK_PALETTE[index % BLOCK_PALETTE.len()].to_string(),
            shape: Shape::Rect,
        });
        cursor = end;
    }
    if cursor < len {
        segs.push(Seg {
            width: (len - cursor) as u32,
            color: "#D0D0D0".to_string(),
            shape: Shape::HLine,
        });
    }
    Track {
        xpos: 0,
        ypos,
        height: TRACK_HEIGHT,
        segs,
        label: Some(label.to_string()),
        outline: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_dna(len: usize, seed: u64) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len).map(|_| b"ACGT"[rng.random_range(0..4)]).collect()
    }

    fn params() -> ChainParams {
        ChainParams {
            min_block: 40,
            ..ChainParams::default()
        }
    }

    #[test]
    fn shared_segment_becomes_one_block() {
        let shared = random_dna(120, 1);
        let mut a = random_dna(60, 2);
        a.extend_from_slice(&shared);
        a.extend(random_dna(50, 3));
        let mut b = random_dna(30, 4);
        b.extend_from_slice(&shared);
        b.extend(random_dna(80, 5));

        let blocks = detect_blocks(&a, &b, &params());
        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.strand, '+');
        assert!(block.a_start >= 55 && block.a_start <= 65, "{:?}", block);
        assert!(block.a_len() >= 110);
    }

    #[test]
    fn inverted_segment_is_found_on_the_minus_strand() {
        let shared = random_dna(120, 11);
        let mut a = random_dna(40, 12);
        a.extend_from_slice(&shared);
        a.extend(random_dna(40, 13));
        let mut b = random_dna(50, 14);
        b.extend_from_slice(&revcomp(&shared));
        b.extend(random_dna(30, 15));

        let blocks = detect_blocks(&a, &b, &params());
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].strand, '-');
        assert!(blocks[0].b_start >= 45 && blocks[0].b_start <= 55);
    }

    #[test]
    fn unrelated_sequences_have_no_blocks() {
        let blocks = detect_blocks(&random_dna(300, 21), &random_dna(300, 22), &params());
        assert!(blocks.is_empty());
    }

    #[test]
    fn block_alignment_rows_match() {
        let shared = random_dna(100, 31);
        let a = shared.clone();
        let b = shared;
        let block = Block {
            a_start: 0,
            a_end: 100,
            b_start: 0,
            b_end: 100,
            strand: '+',
            num_anchors: 5,
            score: 60,
        };
        let (row_a, row_b) = align_block(&a, &b, &block);
        assert_eq!(row_a, row_b);
        assert!(!row_a.contains(&GAP));
    }

    #[test]
    fn export_emits_one_record_per_block_within_interval_length() {
        let dir = tempfile::tempdir().unwrap();
        let shared = random_dna(150, 41);
        let mut a = random_dna(40, 42);
        a.extend_from_slice(&shared);
        let mut b = shared.clone();
        b.extend(random_dna(60, 43));
        let fasta = dir.path().join("pair.fa");
        let text = format!(
            ">ga\n{}\n>gb\n{}\n",
            String::from_utf8(a).unwrap(),
            String::from_utf8(b).unwrap()
        );
        std::fs::write(&fasta, text).unwrap();

        let db = SeqDb::build(&fasta, &dir.path().join("db")).unwrap();
        let pairs = find_synteny(&db, &params()).unwrap();
        let total_blocks: usize = pairs.iter().map(|pair| pair.blocks.len()).sum();
        assert!(total_blocks >= 1);

        let records = export_blocks(&db, &pairs).unwrap();
        assert_eq!(records.len(), total_blocks);
        let mut block_index = 0;
        for pair in &pairs {
            for block in &pair.blocks {
                let residues = records[block_index]
                    .seq
                    .iter()
                    .filter(|&&c| c != GAP)
                    .count();
                assert!(residues <= block.a_len());
                block_index += 1;
            }
        }
    }

    #[test]
    fn synteny_plot_has_two_tracks() {
        let pair = PairSynteny {
            name_a: "ga".to_string(),
            name_b: "gb".to_string(),
            len_a: 200,
            len_b: 180,
            blocks: vec![Block {
                a_start: 10,
                a_end: 90,
                b_start: 40,
                b_end: 120,
                strand: '+',
                num_anchors: 4,
                score: 48,
            }],
        };
        let plot = synteny_figplot(&pair);
        assert_eq!(plot.tracks.len(), 2);
        assert_eq!(plot.lines.len(), 1);
    }
}
