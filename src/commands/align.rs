use crate::cli::AlignArgs;
use crate::msa::{center_star, neighbor_joining, tree_figplot, upgma, DistMatrix};
use crate::utils::{create_writer, looks_like_dna, read_fasta, write_fasta, Result, SeqKind, SeqRecord};
use std::path::Path;

pub fn align(args: AlignArgs) -> Result<()> {
    let records = read_fasta(&args.seqs_path)?;
    if records.len() < 2 {
        return Err("Alignment needs at least 2 sequences".to_string());
    }
    let kind = if looks_like_dna(&records) {
        SeqKind::Dna
    } else {
        SeqKind::Protein
    };
    log::info!(
        "Aligning {} {} sequences",
        records.len(),
        match kind {
            SeqKind::Dna => "DNA",
            SeqKind::Protein => "protein",
        }
    );

    let msa = center_star(&records, kind)?;
    let aligned: Vec<SeqRecord> = msa
        .ids
        .iter()
        .zip(&msa.rows)
        .map(|(id, row)| SeqRecord {
            id: id.clone(),
            desc: None,
            seq: row.clone(),
        })
        .collect();
    create_writer(&args.output_prefix, "aln.fa", |path| {
        write_fasta(Path::new(path), &aligned)
    })?;

    let matrix = DistMatrix::from_msa(&msa);
    create_writer(&args.output_prefix, "dist.tsv", |path| {
        let mut file = std::fs::File::create(path)
            .map_err(|e| format!("Failed to create {}: {}", path, e))?;
        matrix.write_tsv(&mut file)
    })?;

    let tree = match args.method.as_str() {
        "upgma" => upgma(&matrix)?,
        _ => neighbor_joining(&matrix)?,
    };
    create_writer(&args.output_prefix, "nwk", |path| {
        std::fs::write(path, format!("{}\n", tree.to_newick()))
            .map_err(|e| format!("Failed to write {}: {}", path, e))
    })?;
    log::info!(
        "Wrote alignment of width {} and a {} tree with {} leaves",
        msa.width(),
        args.method,
        tree.leaf_names().len()
    );

    if let Some(plot_path) = &args.plot_path {
        let plot = tree_figplot(&tree);
        figplot::generate_image(&plot, Path::new(plot_path))?;
        log::info!("Wrote tree plot to {}", plot_path);
    }
    Ok(())
}
