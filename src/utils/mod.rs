mod aligner;
mod fasta;
mod io_utils;
mod util;

pub use aligner::{aligned_rows, column_identity, global_align, SeqKind, GAP};
pub use fasta::{looks_like_dna, read_fasta, write_fasta, SeqRecord};
pub use io_utils::{create_writer, open_table_writer, open_text_reader};
pub use util::{handle_error_and_exit, Result};
