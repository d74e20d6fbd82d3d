use neurovis::csv_export::write_csv_file;
use neurovis::data_source::{load_default_dataset, load_from_source};
use neurovis::dataset::Dataset;
use neurovis::interpretation::{interpret_latent, LatentInterpretation};
use neurovis::search::{filter_latents, group_latents, monosemantic_index, SearchMode};
use neurovis::{EXPLANATIONS, GLOSSARY, THRESHOLDS};
use serde::Serialize;
use std::env;

#[derive(Serialize)]
struct LatentRow {
    id: String,
    records: usize,
    dead: bool,
    threshold: Option<f64>,
}

#[derive(Serialize)]
struct InterpretationOutput {
    headline: String,
    #[serde(flatten)]
    interpretation: LatentInterpretation,
}

fn usage() {
    eprintln!(
        "Usage:\n  \
  neurovis_cli --version\n  \
  neurovis_cli [--data SOURCE] summary\n  \
  neurovis_cli [--data SOURCE] latents\n  \
  neurovis_cli [--data SOURCE] filter QUERY id|content\n  \
  neurovis_cli [--data SOURCE] groups [QUERY id|content]\n  \
  neurovis_cli [--data SOURCE] monosemantic\n  \
  neurovis_cli [--data SOURCE] interpret LATENT_ID\n  \
  neurovis_cli [--data SOURCE] export-csv OUTPUT.csv\n  \
  neurovis_cli explain LATENT_ID\n  \
  neurovis_cli glossary [TERM]\n\n  \
  SOURCE is an http(s) URL, a file:// URL, or a path; without --data the\n  \
  well-known locations are tried in order"
    );
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Could not serialize JSON output: {e}"))?;
    println!("{text}");
    Ok(())
}

fn parse_global_data_arg(args: &[String]) -> (Option<String>, usize) {
    if args.len() >= 3 && args[1] == "--data" {
        return (Some(args[2].clone()), 3);
    }
    (None, 1)
}

fn load(data_source: &Option<String>) -> Result<Dataset, String> {
    match data_source {
        Some(source) => load_from_source(source),
        None => load_default_dataset(),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().collect();
    if args.len() <= 1 {
        usage();
        return Err("Missing command".to_string());
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("neurovis {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let (data_source, cmd_idx) = parse_global_data_arg(&args);
    if args.len() <= cmd_idx {
        usage();
        return Err("Missing command".to_string());
    }

    let command = &args[cmd_idx];

    match command.as_str() {
        "summary" => {
            let dataset = load(&data_source)?;
            print_json(&dataset.summary())
        }
        "latents" => {
            let dataset = load(&data_source)?;
            let rows: Vec<LatentRow> = dataset
                .iter()
                .map(|latent| LatentRow {
                    id: latent.id.clone(),
                    records: latent.activations.len(),
                    dead: latent.is_dead(),
                    threshold: THRESHOLDS.threshold_for(latent),
                })
                .collect();
            print_json(&rows)
        }
        "filter" => {
            if args.len() <= cmd_idx + 2 {
                usage();
                return Err("filter requires: QUERY id|content".to_string());
            }
            let query = &args[cmd_idx + 1];
            let mode: SearchMode = args[cmd_idx + 2].parse()?;
            let dataset = load(&data_source)?;
            let found = filter_latents(&dataset, &THRESHOLDS, query, mode);
            print_json(&found)
        }
        "groups" => {
            let (query, mode) = match args.len() - cmd_idx - 1 {
                0 => (String::new(), SearchMode::Id),
                2 => (args[cmd_idx + 1].clone(), args[cmd_idx + 2].parse()?),
                _ => {
                    usage();
                    return Err("groups takes no arguments, or QUERY id|content".to_string());
                }
            };
            let dataset = load(&data_source)?;
            let found = filter_latents(&dataset, &THRESHOLDS, &query, mode);
            let groups = group_latents(&found, &query, mode);
            print_json(&groups)
        }
        "monosemantic" => {
            let dataset = load(&data_source)?;
            let index = monosemantic_index(&dataset, &THRESHOLDS);
            print_json(&index)
        }
        "interpret" => {
            if args.len() <= cmd_idx + 1 {
                usage();
                return Err("Missing latent id for interpret".to_string());
            }
            let latent_id = &args[cmd_idx + 1];
            let dataset = load(&data_source)?;
            let latent = dataset
                .get(latent_id)
                .ok_or_else(|| format!("Latent '{latent_id}' not found in dataset"))?;
            let interpretation = interpret_latent(latent, &THRESHOLDS);
            print_json(&InterpretationOutput {
                headline: interpretation.headline(),
                interpretation,
            })
        }
        "export-csv" => {
            if args.len() <= cmd_idx + 1 {
                usage();
                return Err("Missing output path for export-csv".to_string());
            }
            let output = &args[cmd_idx + 1];
            let dataset = load(&data_source)?;
            write_csv_file(&dataset, output).map_err(|e| e.to_string())?;
            println!(
                "Wrote {} activation records to '{output}'",
                dataset.record_count()
            );
            Ok(())
        }
        "explain" => {
            if args.len() <= cmd_idx + 1 {
                usage();
                return Err("Missing latent id for explain".to_string());
            }
            let latent_id = &args[cmd_idx + 1];
            match EXPLANATIONS.get(latent_id) {
                Some(text) => {
                    println!("{text}");
                    Ok(())
                }
                None => Err(format!(
                    "No curated explanation for latent '{latent_id}'; curated ids: {}",
                    EXPLANATIONS.explained_ids().join(", ")
                )),
            }
        }
        "glossary" => {
            if args.len() > cmd_idx + 1 {
                let term = &args[cmd_idx + 1];
                let definition = GLOSSARY
                    .get(term)
                    .ok_or_else(|| format!("No glossary entry for '{term}'"))?;
                println!("{definition}");
                Ok(())
            } else {
                print_json(&GLOSSARY.terms())
            }
        }
        _ => {
            usage();
            Err(format!("Unknown command '{command}'"))
        }
    }
}
