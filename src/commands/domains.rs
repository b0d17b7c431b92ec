use crate::annot::DomainDb;
use crate::cli::DomainsArgs;
use crate::utils::{open_table_writer, Result};
use std::io::Write;

pub fn domains(args: DomainsArgs) -> Result<()> {
    let db = DomainDb::open(&args.db_dir)?;
    let keytypes = db.keytypes();
    if !keytypes.iter().any(|keytype| *keytype == args.keytype) {
        return Err(format!(
            "Unknown key type '{}'; database holds: {}",
            args.keytype,
            keytypes.join(", ")
        ));
    }

    let annotations = db.annotate(&args.keys, &args.keytype);
    log::info!(
        "Annotated {} of {} identifiers with {} domain rows",
        annotations
            .iter()
            .map(|a| &a.gene_id)
            .collect::<std::collections::HashSet<_>>()
            .len(),
        args.keys.len(),
        annotations.len()
    );

    let mut writer = open_table_writer(args.output.as_deref())?;
    writeln!(writer, "gene_id\tdomain_id\tdescription")
        .map_err(|e| format!("Failed to write annotations: {}", e))?;
    for annotation in &annotations {
        writeln!(
            writer,
            "{}\t{}\t{}",
            annotation.gene_id, annotation.domain_id, annotation.description
        )
        .map_err(|e| format!("Failed to write annotations: {}", e))?;
    }
    Ok(())
}
