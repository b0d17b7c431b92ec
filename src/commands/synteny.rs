use crate::cli::SyntenyArgs;
use crate::synteny::{export_blocks, find_synteny, synteny_figplot, ChainParams, SeqDb};
use crate::utils::{create_writer, write_fasta, Result};
use rayon::ThreadPoolBuilder;
use std::io::Write;
use std::path::Path;

pub fn synteny(args: SyntenyArgs) -> Result<()> {
    let db_dir = Path::new(&args.db_dir);
    let db = match &args.seqs_path {
        Some(fasta) => {
            log::info!("Building sequence database in {}", db_dir.display());
            SeqDb::build(fasta, db_dir)?
        }
        None => SeqDb::open(db_dir)?,
    };
    log::info!("Database holds {} sequences", db.len());

    let params = ChainParams {
        k: args.kmer_len,
        max_gap: args.max_gap,
        diag_band: ChainParams::default().diag_band,
        min_block: args.min_block,
        min_anchors: args.min_anchors,
    };

    let pool = ThreadPoolBuilder::new()
        .num_threads(args.num_threads)
        .thread_name(|i| format!("seqsuite-{}", i))
        .build()
        .map_err(|e| format!("Failed to initialize thread pool: {}", e))?;
    let pairs = pool.install(|| find_synteny(&db, &params))?;

    let num_blocks: usize = pairs.iter().map(|pair| pair.blocks.len()).sum();
    log::info!(
        "Found {} blocks across {} sequence pairs",
        num_blocks,
        pairs.len()
    );

    create_writer(&args.output_prefix, "blocks.tsv", |path| {
        let mut file = std::fs::File::create(path)
            .map_err(|e| format!("Failed to create {}: {}", path, e))?;
        write_block_table(&mut file, &pairs)
    })?;

    let records = export_blocks(&db, &pairs)?;
    create_writer(&args.output_prefix, "blocks.fa", |path| {
        write_fasta(Path::new(path), &records)
    })?;

    if let Some(plot_dir) = &args.plot_dir {
        std::fs::create_dir_all(plot_dir)
            .map_err(|e| format!("Failed to create {}: {}", plot_dir.display(), e))?;
        for pair in &pairs {
            if pair.blocks.is_empty() {
                continue;
            }
            let file = plot_dir.join(format!(
                "{}_vs_{}.{}",
                pair.name_a, pair.name_b, args.plot_format
            ));
            figplot::generate_image(&synteny_figplot(pair), &file)?;
            log::debug!("Wrote synteny plot {}", file.display());
        }
    }
    Ok(())
}

fn write_block_table(
    writer: &mut impl Write,
    pairs: &[crate::synteny::PairSynteny],
) -> Result<()> {
    let mut emit = |line: String| {
        writeln!(writer, "{}", line).map_err(|e| format!("Failed to write blocks: {}", e))
    };
    emit("seq_a\tstart_a\tend_a\tseq_b\tstart_b\tend_b\tstrand\tanchors\tscore".to_string())?;
    for pair in pairs {
        for block in &pair.blocks {
            emit(format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                pair.name_a,
                block.a_start + 1,
                block.a_end,
                pair.name_b,
                block.b_start + 1,
                block.b_end,
                block.strand,
                block.num_anchors,
                block.score
            ))?;
        }
    }
    Ok(())
}
