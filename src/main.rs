use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use regress_pipeline::{
    FsObjectStore, MonitorOutcome, Pipeline, PipelineConfig, TrainReport, model_key,
};

const USAGE: &str = "\
usage: regress-pipeline [--config FILE] <command> [options]

commands:
  train    [--dataset KEY] [--version N]
  monitor  [--dataset KEY] [--version N] [--retrain-version N]
  run      cleanup, train v1, then monitor v1 and retrain into v2
  cleanup  [--version N]...";

#[derive(Debug, PartialEq)]
enum Command {
    Train {
        dataset: Option<String>,
        version: u32,
    },
    Monitor {
        dataset: Option<String>,
        version: u32,
        retrain_version: Option<u32>,
    },
    Run,
    Cleanup {
        versions: Vec<u32>,
    },
}

#[derive(Debug, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    command: Command,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut config = None;
        let mut command = None;
        let mut dataset = None;
        let mut versions = Vec::new();
        let mut retrain_version = None;

        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .with_context(|| format!("{flag} expects a value"))
            };
            match arg.as_str() {
                "--config" => config = Some(PathBuf::from(value("--config")?)),
                "--dataset" => dataset = Some(value("--dataset")?),
                "--version" => versions.push(parse_version(&value("--version")?)?),
                "--retrain-version" => {
                    retrain_version = Some(parse_version(&value("--retrain-version")?)?)
                }
                "-h" | "--help" => bail!("{USAGE}"),
                cmd if command.is_none() && !cmd.starts_with('-') => command = Some(cmd.to_string()),
                other => bail!("unexpected argument `{other}`\n\n{USAGE}"),
            }
        }

        let single_version = |versions: &[u32]| -> Result<u32> {
            match versions {
                [] => Ok(1),
                [v] => Ok(*v),
                _ => bail!("--version given more than once"),
            }
        };

        let command = match command.as_deref() {
            Some("train") => Command::Train {
                dataset,
                version: single_version(&versions)?,
            },
            Some("monitor") => Command::Monitor {
                dataset,
                version: single_version(&versions)?,
                retrain_version,
            },
            Some("run") => Command::Run,
            Some("cleanup") => Command::Cleanup {
                versions: if versions.is_empty() { vec![1, 2] } else { versions },
            },
            Some(other) => bail!("unknown command `{other}`\n\n{USAGE}"),
            None => bail!("missing command\n\n{USAGE}"),
        };

        Ok(Self { config, command })
    }
}

fn parse_version(raw: &str) -> Result<u32> {
    let version: u32 = raw
        .parse()
        .with_context(|| format!("`{raw}` is not a version number"))?;
    if version == 0 {
        bail!("versions start at 1");
    }
    Ok(version)
}

fn print_report(label: &str, report: &TrainReport) {
    println!("{label}: {}", report.key);
    println!("  dataset:   {}", report.dataset);
    println!("  slope:     {:.6}", report.model.slope());
    println!("  intercept: {:.6}", report.model.intercept());
    println!(
        "  train R²:  {:.4}  (MSE {:.4}, {} rows)",
        report.train.r2, report.train.mse, report.train.rows
    );
    println!(
        "  test R²:   {:.4}  (MSE {:.4}, {} rows)",
        report.test.r2, report.test.mse, report.test.rows
    );
}

fn print_outcome(model: &str, outcome: &MonitorOutcome) {
    match outcome {
        MonitorOutcome::Adequate { score } => {
            println!("{model} still fits the new data (R² {score:.4}), nothing retrained");
        }
        MonitorOutcome::Retrained {
            previous_score,
            report,
        } => {
            println!("{model} scored R² {previous_score:.4} on the new data, retrained");
            print_report("retrained model", report);
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = PipelineConfig::load(args.config.as_deref()).context("loading configuration")?;
    let store = FsObjectStore::from_config(&config).context("opening object store")?;
    log::info!("using store at {}", store.root().display());

    let prefix = config.model_prefix.clone();
    let pipeline = Pipeline::new(store, config);

    match args.command {
        Command::Train { dataset, version } => {
            let dataset = dataset.unwrap_or_else(|| pipeline.config().dataset_key.clone());
            let key = model_key(&prefix, version);
            let report = pipeline
                .train(&dataset, &key)
                .with_context(|| format!("training on {dataset}"))?;
            print_report("trained model", &report);
        }
        Command::Monitor {
            dataset,
            version,
            retrain_version,
        } => {
            let dataset = dataset.unwrap_or_else(|| pipeline.config().new_dataset_key.clone());
            let key = model_key(&prefix, version);
            let retrain_key = model_key(&prefix, retrain_version.unwrap_or(version.saturating_add(1)));
            let outcome = pipeline
                .monitor(&key, &dataset, &retrain_key)
                .with_context(|| format!("checking {key} against {dataset}"))?;
            print_outcome(&key, &outcome);
        }
        Command::Run => {
            let summary = pipeline.run().context("running pipeline")?;
            if summary.cleaned > 0 {
                println!("removed {} prior artifact(s)", summary.cleaned);
            }
            print_report("initial model", &summary.initial);
            print_outcome(&summary.initial.key, &summary.outcome);
        }
        Command::Cleanup { versions } => {
            let keys: Vec<String> = versions.iter().map(|v| model_key(&prefix, *v)).collect();
            let deleted = pipeline.cleanup(&keys);
            println!("deleted {deleted} of {} artifact(s)", keys.len());
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = Args::parse(std::env::args().skip(1)).and_then(run);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args> {
        Args::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_train_defaults() {
        let args = parse(&["train"]).unwrap();
        assert_eq!(args.config, None);
        assert_eq!(
            args.command,
            Command::Train {
                dataset: None,
                version: 1
            }
        );
    }

    #[test]
    fn test_parse_monitor_with_flags() {
        let args = parse(&[
            "--config",
            "regress.toml",
            "monitor",
            "--dataset",
            "data/june.csv",
            "--version",
            "3",
            "--retrain-version",
            "7",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("regress.toml")));
        assert_eq!(
            args.command,
            Command::Monitor {
                dataset: Some("data/june.csv".into()),
                version: 3,
                retrain_version: Some(7),
            }
        );
    }

    #[test]
    fn test_parse_cleanup_versions() {
        assert_eq!(
            parse(&["cleanup"]).unwrap().command,
            Command::Cleanup { versions: vec![1, 2] }
        );
        assert_eq!(
            parse(&["cleanup", "--version", "4", "--version", "5"]).unwrap().command,
            Command::Cleanup { versions: vec![4, 5] }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["deploy"]).is_err());
        assert!(parse(&["train", "--version"]).is_err());
        assert!(parse(&["train", "--version", "0"]).is_err());
        assert!(parse(&["train", "--version", "1", "--version", "2"]).is_err());
        assert!(parse(&["train", "extra"]).is_err());
    }
}
