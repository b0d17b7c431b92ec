mod discover;
mod enrich;
mod pwm;
mod scan;
mod shuffle;

pub use discover::run_discovery;
pub use enrich::{motif_enrichment, Enrichment};
pub use pwm::{base_index, parse_motifs, read_motif_file, Pwm};
pub use scan::{scan_record, scan_records, MotifHit};
pub use shuffle::kmer_shuffle;
