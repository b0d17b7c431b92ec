use clap::Parser;
use seqsuite::{
    cli::{init_verbose, Cli, Command, FULL_VERSION},
    commands::{align, classify, domains, mart, scan, superpose, synteny},
    utils::{handle_error_and_exit, Result},
};

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    let subcommand_name = match cli.command {
        Command::Scan(_) => "scan",
        Command::Domains(_) => "domains",
        Command::Mart(_) => "mart",
        Command::Align(_) => "align",
        Command::Synteny(_) => "synteny",
        Command::Classify(_) => "classify",
        Command::Superpose(_) => "superpose",
    };

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        *FULL_VERSION,
        subcommand_name
    );
    match cli.command {
        Command::Scan(args) => scan::scan(args)?,
        Command::Domains(args) => domains::domains(args)?,
        Command::Mart(args) => mart::mart(args)?,
        Command::Align(args) => align::align(args)?,
        Command::Synteny(args) => synteny::synteny(args)?,
        Command::Classify(args) => classify::classify(args)?,
        Command::Superpose(args) => superpose::superpose(args)?,
    }
    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
