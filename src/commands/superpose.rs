use crate::cli::SuperposeArgs;
use crate::structure::{superpose as fit_structures, write_ca_pdb, Structure};
use crate::utils::{create_writer, Result};
use std::path::Path;

pub fn superpose(args: SuperposeArgs) -> Result<()> {
    let fixed = Structure::from_pdb(&args.fixed_path)?;
    let moving = Structure::from_pdb(&args.moving_path)?;
    log::info!(
        "Superposing {} ({} residues) onto {} ({} residues)",
        moving.name,
        moving.len(),
        fixed.name,
        fixed.len()
    );

    let fit = fit_structures(&fixed, &moving)?;
    let moved = fit.apply(&moving);
    create_writer(&args.output_prefix, "superposed.pdb", |path| {
        write_ca_pdb(Path::new(path), &moved)
    })?;

    log::info!(
        "Superposed {} residue pairs, RMSD = {:.3} A",
        fit.matched,
        fit.rmsd
    );
    Ok(())
}
