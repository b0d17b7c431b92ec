use crate::cli::ScanArgs;
use crate::motif::{motif_enrichment, read_motif_file, run_discovery, scan_record, MotifHit, Pwm};
use crate::utils::{open_table_writer, read_fasta, Result, SeqRecord};
use crossbeam_channel::{bounded, Sender};
use rayon::iter::{ParallelBridge, ParallelIterator};
use rayon::ThreadPoolBuilder;
use std::io::Write;
use std::thread;

const CHANNEL_BUFFER_SIZE: usize = 256;
// Backgrounds keep the exact trinucleotide multiset.
const SHUFFLE_K: usize = 3;

pub fn scan(args: ScanArgs) -> Result<()> {
    let mut motifs = read_motif_file(&args.motifs_path)?;
    let records = read_fasta(&args.seqs_path)?;

    if let Some(exe) = &args.discover_exe {
        let discovered = run_discovery(exe, &args.seqs_path, &args.discover_dir)?;
        for pwm in &discovered {
            log::info!(
                "Discovered motif {}: width={}, consensus={}",
                pwm.id,
                pwm.width(),
                pwm.consensus()
            );
        }
        motifs.extend(discovered);
    }
    log::info!(
        "Scanning {} sequences with {} motifs",
        records.len(),
        motifs.len()
    );

    let pool = ThreadPoolBuilder::new()
        .num_threads(args.num_threads)
        .thread_name(|i| format!("seqsuite-{}", i))
        .build()
        .map_err(|e| format!("Failed to initialize thread pool: {}", e))?;

    let (sender_hits, receiver_hits) = bounded::<(usize, Vec<MotifHit>)>(CHANNEL_BUFFER_SIZE);
    let collector_thread = thread::spawn(move || {
        let mut hits: Vec<(usize, MotifHit)> = Vec::new();
        for (motif_index, batch) in &receiver_hits {
            hits.extend(batch.into_iter().map(|hit| (motif_index, hit)));
        }
        hits.sort_by(|(am, ah), (bm, bh)| {
            (am, &ah.seq_id, ah.pos, ah.strand).cmp(&(bm, &bh.seq_id, bh.pos, bh.strand))
        });
        hits
    });

    pool.install(|| {
        motifs
            .iter()
            .enumerate()
            .flat_map(|(motif_index, pwm)| {
                records
                    .iter()
                    .map(move |record| (motif_index, pwm, record))
            })
            .par_bridge()
            .for_each_with(&sender_hits, |sender, work| scan_task(work, &args, sender));
    });
    drop(sender_hits);
    let hits = collector_thread.join().expect("Collector thread panicked");

    write_hits(&motifs, &hits, &args)?;
    log::info!("Reported {} hits", hits.len());

    if args.num_shuffles > 0 {
        pool.install(|| report_enrichment(&motifs, &records, &args))?;
    }
    Ok(())
}

fn scan_task(
    (motif_index, pwm, record): (usize, &Pwm, &SeqRecord),
    args: &ScanArgs,
    sender: &Sender<(usize, Vec<MotifHit>)>,
) {
    let hits = scan_record(pwm, record, args.min_score_frac);
    if hits.is_empty() {
        return;
    }
    if let Err(e) = sender.send((motif_index, hits)) {
        log::error!("Failed to send hits to the collector thread: {}", e);
    }
}

fn write_hits(motifs: &[Pwm], hits: &[(usize, MotifHit)], args: &ScanArgs) -> Result<()> {
    let mut writer = open_table_writer(args.output.as_deref())?;
    writeln!(writer, "motif\tseq\tstart\tstrand\tscore\tsite")
        .map_err(|e| format!("Failed to write hits: {}", e))?;
    for (motif_index, hit) in hits {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{:.3}\t{}",
            motifs[*motif_index].id,
            hit.seq_id,
            hit.pos + 1,
            hit.strand,
            hit.score,
            hit.site
        )
        .map_err(|e| format!("Failed to write hits: {}", e))?;
    }
    Ok(())
}

fn report_enrichment(motifs: &[Pwm], records: &[SeqRecord], args: &ScanArgs) -> Result<()> {
    for pwm in motifs {
        let enrichment = motif_enrichment(
            pwm,
            records,
            args.min_score_frac,
            args.num_shuffles,
            SHUFFLE_K,
            args.seed,
        )?;
        log::info!(
            "Enrichment of {}: observed={}, background={:.2}+/-{:.2}, z={:.2}, p={:.3e}, fold={:.2}",
            pwm.id,
            enrichment.observed,
            enrichment.bg_mean,
            enrichment.bg_sd,
            enrichment.z_score,
            enrichment.p_value,
            enrichment.fold
        );
    }
    Ok(())
}
