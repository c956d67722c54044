use anyhow::{Context, Result, anyhow, bail};
use codon_optimizer::{
    CancellationToken, DNAsequence, Engine, EngineParameters, OptimizationEngine,
    OptimizationResult, ReferenceTables, codon_usage::CodonUsageTable, enzymes::Enzymes,
    genetic_code::GeneticCodes, logging,
};
use itertools::Itertools;
use serde::Serialize;
use std::{env, sync::Arc};

fn usage() {
    eprintln!(
        "Usage:\n  \
  codon_optimizer_cli --version\n  \
  codon_optimizer_cli [--verbose] optimize SEQUENCE|@file.fa [--codon-table PATH] [--enzymes PATH] [--config PATH] [--seed N] [--json]\n  \
  codon_optimizer_cli translate SEQUENCE|@file.fa [--code NAME]\n  \
  codon_optimizer_cli enzymes [SEQUENCE|@file.fa] [--enzymes PATH]\n  \
  codon_optimizer_cli defaults\n\n  \
  Codon tables are CSV (amino_acid,codon,relative_frequency) or JSON.\n  \
  Set CODON_OPTIMIZER_LOG=debug for detailed logs on stderr."
    );
}

/// Options that take a value, removed from `args` as they are read.
fn take_option(args: &mut Vec<String>, name: &str) -> Result<Option<String>> {
    let Some(pos) = args.iter().position(|a| a == name) else {
        return Ok(None);
    };
    if pos + 1 >= args.len() {
        bail!("Missing value for {name}");
    }
    let value = args.remove(pos + 1);
    args.remove(pos);
    Ok(Some(value))
}

fn take_flag(args: &mut Vec<String>, name: &str) -> bool {
    match args.iter().position(|a| a == name) {
        Some(pos) => {
            args.remove(pos);
            true
        }
        None => false,
    }
}

fn load_sequences(value: &str) -> Result<Vec<DNAsequence>> {
    if let Some(path) = value.strip_prefix('@') {
        let sequences = DNAsequence::from_fasta_file(path)
            .with_context(|| format!("Could not read FASTA file '{path}'"))?;
        if sequences.is_empty() {
            bail!("No sequences in '{path}'");
        }
        Ok(sequences)
    } else {
        Ok(vec![DNAsequence::from_sequence(value)?])
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Could not serialize JSON output")?;
    println!("{text}");
    Ok(())
}

fn print_result(result: &OptimizationResult) {
    if let Some(name) = &result.name {
        println!(">{name}");
    }
    println!("{}", result.optimized_sequence);
    println!();
    print!("{}", result.constraints_summary);
    println!();
    print!("{}", result.objectives_summary);
}

fn load_tables(args: &mut Vec<String>) -> Result<ReferenceTables> {
    let mut tables = ReferenceTables::builtin()?;
    if let Some(path) = take_option(args, "--codon-table")? {
        let table = CodonUsageTable::load_from_path(&path)
            .with_context(|| format!("Could not load codon table '{path}'"))?;
        tables = tables.with_codon_usage(table);
    }
    if let Some(path) = take_option(args, "--enzymes")? {
        let enzymes = Enzymes::load_from_path(&path)
            .with_context(|| format!("Could not load enzymes '{path}'"))?;
        tables = tables.with_enzymes(enzymes);
    }
    Ok(tables)
}

fn optimize(mut args: Vec<String>) -> Result<()> {
    let tables = load_tables(&mut args)?;
    let mut parameters = match take_option(&mut args, "--config")? {
        Some(path) => EngineParameters::load_from_path(&path)
            .with_context(|| format!("Could not load config '{path}'"))?,
        None => EngineParameters::default(),
    };
    if let Some(seed) = take_option(&mut args, "--seed")? {
        parameters.optimizer.seed = seed
            .parse()
            .with_context(|| format!("Invalid seed '{seed}'"))?;
    }
    let json = take_flag(&mut args, "--json");
    let [input] = args.as_slice() else {
        usage();
        bail!("optimize takes exactly one SEQUENCE or @file.fa");
    };

    let sequences = load_sequences(input)?;
    let engine = OptimizationEngine::new(Arc::new(tables), parameters)?;
    let results = engine
        .optimize_batch(&sequences, &CancellationToken::new())
        .into_iter()
        .collect::<codon_optimizer::Result<Vec<_>>>()?;

    if json {
        match results.as_slice() {
            [single] => print_json(single)?,
            _ => print_json(&results)?,
        }
    } else {
        for (num, result) in results.iter().enumerate() {
            if num > 0 {
                println!();
            }
            print_result(result);
        }
    }

    let failed = results.iter().filter(|r| !r.succeeded()).count();
    if failed > 0 {
        return Err(anyhow!("{failed} sequence(s) could not be optimized"));
    }
    Ok(())
}

fn translate(mut args: Vec<String>) -> Result<()> {
    let code_name = take_option(&mut args, "--code")?
        .unwrap_or_else(|| codon_optimizer::engine::DEFAULT_GENETIC_CODE.to_string());
    let [input] = args.as_slice() else {
        usage();
        bail!("translate takes exactly one SEQUENCE or @file.fa");
    };
    let codes = GeneticCodes::builtin()?;
    let code = codes.find(&code_name)?;
    for sequence in load_sequences(input)? {
        if let Some(name) = sequence.name() {
            println!(">{name}");
        }
        println!("{}", sequence.translate(code));
    }
    Ok(())
}

fn list_enzymes(mut args: Vec<String>) -> Result<()> {
    let enzymes = match take_option(&mut args, "--enzymes")? {
        Some(path) => Enzymes::load_from_path(&path)
            .with_context(|| format!("Could not load enzymes '{path}'"))?,
        None => Enzymes::builtin()?,
    };
    let sequences = match args.as_slice() {
        [] => vec![],
        [input] => load_sequences(input)?,
        _ => {
            usage();
            bail!("enzymes takes at most one SEQUENCE or @file.fa");
        }
    };

    if sequences.is_empty() {
        for enzyme in enzymes.restriction_enzymes() {
            let kind = if enzyme.is_palindromic() {
                "palindromic"
            } else {
                "asymmetric"
            };
            let note = enzyme.note.as_deref().unwrap_or_default();
            println!("{}\t{}\t{kind}\t{note}", enzyme.name, enzyme.sequence);
        }
        return Ok(());
    }

    // Sites present in each sequence, one line per enzyme that cuts it
    for sequence in &sequences {
        if let Some(name) = sequence.name() {
            println!(">{name}");
        }
        for enzyme in enzymes.restriction_enzymes() {
            let sites = enzyme.find_sites(sequence)?;
            if sites.is_empty() {
                continue;
            }
            let spans = sites
                .iter()
                .map(|span| format!("{}-{}", span.start, span.end))
                .join(", ");
            println!("{}\t{}\t{spans}", enzyme.name, enzyme.sequence);
        }
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("codon_optimizer_cli {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    if take_flag(&mut args, "--verbose") {
        logging::init_tracing_with_filter("codon_optimizer=debug");
    } else {
        logging::init_tracing();
    }
    if args.is_empty() {
        usage();
        bail!("Missing command");
    }

    let command = args.remove(0);
    match command.as_str() {
        "optimize" => optimize(args),
        "translate" => translate(args),
        "enzymes" => list_enzymes(args),
        "defaults" => print_json(&EngineParameters::default()),
        "help" | "--help" | "-h" => {
            usage();
            Ok(())
        }
        _ => {
            usage();
            bail!("Unknown command '{command}'")
        }
    }
}
