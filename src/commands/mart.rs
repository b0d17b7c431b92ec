use crate::annot::Mart;
use crate::cli::MartArgs;
use crate::utils::{open_table_writer, Result};
use std::io::Write;

pub fn mart(args: MartArgs) -> Result<()> {
    let mart = Mart::open(&args.mart_dir)?;

    if args.list_datasets {
        let mut writer = open_table_writer(args.output.as_deref())?;
        writeln!(writer, "dataset\tdescription")
            .map_err(|e| format!("Failed to write datasets: {}", e))?;
        for (name, spec) in mart.datasets() {
            writeln!(writer, "{}\t{}", name, spec.description)
                .map_err(|e| format!("Failed to write datasets: {}", e))?;
        }
        return Ok(());
    }

    if let Some(dataset) = &args.list_attributes {
        let mut writer = open_table_writer(args.output.as_deref())?;
        for attribute in mart.attributes(dataset)? {
            writeln!(writer, "{}", attribute)
                .map_err(|e| format!("Failed to write attributes: {}", e))?;
        }
        return Ok(());
    }

    let dataset = args
        .dataset
        .as_deref()
        .ok_or("Missing --dataset (or use --list-datasets / --list-attributes)")?;
    if args.attributes.is_empty() {
        return Err("Missing --attributes".to_string());
    }
    let filter = args.filter.as_deref().ok_or("Missing --filter")?;
    if args.values.is_empty() {
        return Err("Missing --values".to_string());
    }

    let rows = mart.query(dataset, &args.attributes, filter, &args.values)?;
    log::info!(
        "Query of dataset '{}' matched {} rows",
        dataset,
        rows.len()
    );

    let mut writer = open_table_writer(args.output.as_deref())?;
    writeln!(writer, "{}", args.attributes.join("\t"))
        .map_err(|e| format!("Failed to write rows: {}", e))?;
    for row in &rows {
        writeln!(writer, "{}", row.join("\t"))
            .map_err(|e| format!("Failed to write rows: {}", e))?;
    }
    Ok(())
}
