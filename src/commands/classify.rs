use crate::cli::ClassifyArgs;
use crate::kernel::{
    evaluate, match_labels, prediction_profile, profile_figplot, split_indices, write_profile,
    GappyPairKernel, LinearSvm, SparseVec,
};
use crate::utils::{open_table_writer, read_fasta, Result};
use std::path::Path;

pub fn classify(args: ClassifyArgs) -> Result<()> {
    let records = read_fasta(&args.seqs_path)?;
    let labels = match_labels(&records, &args.labels_path)?;
    let kernel = GappyPairKernel::new(args.kmer_len, args.max_pair_gap)?;
    let samples: Vec<SparseVec> = records
        .iter()
        .map(|record| kernel.features(&record.seq))
        .collect();

    let split = split_indices(records.len(), args.train_frac, args.seed)?;
    log::info!(
        "Training on {} sequences, holding out {}",
        split.train.len(),
        split.test.len()
    );

    let train_samples: Vec<SparseVec> =
        split.train.iter().map(|&i| samples[i].clone()).collect();
    let train_labels: Vec<i8> = split.train.iter().map(|&i| labels[i]).collect();
    let svm = LinearSvm::train(
        &train_samples,
        &train_labels,
        args.lambda,
        args.epochs,
        args.seed,
    );

    let test_samples: Vec<SparseVec> = split.test.iter().map(|&i| samples[i].clone()).collect();
    let test_labels: Vec<i8> = split.test.iter().map(|&i| labels[i]).collect();
    let eval = evaluate(&svm, &test_samples, &test_labels);
    log::info!("Held-out accuracy: {:.3}", eval.accuracy);
    log::info!(
        "Confusion: TP={}, FN={}, FP={}, TN={}",
        eval.confusion[0][0],
        eval.confusion[0][1],
        eval.confusion[1][0],
        eval.confusion[1][1]
    );

    if let Some(profile_id) = &args.profile_id {
        let record = records
            .iter()
            .find(|record| record.id == *profile_id)
            .ok_or_else(|| format!("No sequence named '{}' in the input", profile_id))?;
        let decision = svm.decision_value(&kernel.features(&record.seq));
        log::info!(
            "Decision value of {}: {:.4} (class {})",
            record.id,
            decision,
            if decision >= 0.0 { 1 } else { -1 }
        );
        let profile = prediction_profile(&kernel, &svm, &record.seq);
        let mut writer = open_table_writer(args.output.as_deref())?;
        write_profile(&mut writer, &profile)?;

        if let Some(plot_path) = &args.plot_path {
            let plot = profile_figplot(&record.id, &profile);
            figplot::generate_image(&plot, Path::new(plot_path))?;
            log::info!("Wrote profile plot to {}", plot_path);
        }
    }
    Ok(())
}
