use crate::motif::{read_motif_file, Pwm};
use crate::utils::Result;
use std::path::Path;
use std::process::Command;

/// Runs an external motif-discovery executable as `EXE <fasta> <outdir>` and
/// reads back every plain-text matrix file (*.pwm, *.txt) it left in the
/// output directory.
pub fn run_discovery(exe: &Path, fasta: &Path, outdir: &Path) -> Result<Vec<Pwm>> {
    std::fs::create_dir_all(outdir)
        .map_err(|e| format!("Failed to create {}: {}", outdir.display(), e))?;

    log::info!(
        "Running motif discovery: {} {} {}",
        exe.display(),
        fasta.display(),
        outdir.display()
    );
    let status = Command::new(exe)
        .arg(fasta)
        .arg(outdir)
        .status()
        .map_err(|e| format!("Failed to launch {}: {}", exe.display(), e))?;
    if !status.success() {
        return Err(format!(
            "Motif discovery {} exited with {}",
            exe.display(),
            status
        ));
    }

    collect_discovered(outdir)
}

fn collect_discovered(outdir: &Path) -> Result<Vec<Pwm>> {
    let mut paths: Vec<_> = std::fs::read_dir(outdir)
        .map_err(|e| format!("Failed to read {}: {}", outdir.display(), e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("pwm") | Some("txt")
            )
        })
        .collect();
    paths.sort();

    let mut motifs = Vec::new();
    for path in paths {
        motifs.extend(read_motif_file(&path)?);
    }
    if motifs.is_empty() {
        log::warn!("Discovery produced no matrix files in {}", outdir.display());
    }
    Ok(motifs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn reads_back_matrices_from_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("motif1.pwm"),
            ">found1\n9 0 0 1\n0 9 1 0\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("ignored.log"), "not a matrix").unwrap();
        let motifs = collect_discovered(dir.path()).unwrap();
        assert_eq!(motifs.len(), 1);
        assert_eq!(motifs[0].id, "found1");
        assert_eq!(motifs[0].consensus(), "AC");
    }

    #[test]
    fn discovery_script_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = dir.path().join("seqs.fa");
        std::fs::write(&fasta, ">s\nACGT\n").unwrap();

        // stand-in discovery tool: writes one matrix into its outdir
        let exe = dir.path().join("fake_meme.sh");
        {
            let mut script = std::fs::File::create(&exe).unwrap();
            writeln!(script, "#!/bin/sh").unwrap();
            writeln!(script, "printf '>denovo\\n8 0 0 0\\n0 0 8 0\\n' > \"$2\"/out.pwm").unwrap();
        }
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();

        let outdir = dir.path().join("disc");
        let motifs = run_discovery(&exe, &fasta, &outdir).unwrap();
        assert_eq!(motifs.len(), 1);
        assert_eq!(motifs[0].consensus(), "AG");
    }

    #[test]
    fn missing_executable_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_discovery(
            &dir.path().join("does_not_exist"),
            &dir.path().join("x.fa"),
            &dir.path().join("out"),
        );
        assert!(result.is_err());
    }
}
