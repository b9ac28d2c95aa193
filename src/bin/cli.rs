use anyhow::{anyhow, bail, Context, Result};
use crabfocus::session::SessionTracker;
use crabfocus::testing::synthetic_data::{self, TARGET_KINDS};
use crabfocus::{evaluate_dynamic, FocusConfig, Metrics, Roi};
use std::env;
use std::path::PathBuf;

fn main() -> Result<()> {
    crabfocus::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: crabfocus-cli <evaluate|sweep|synthetic> [args]");
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "evaluate" => cmd_evaluate(&args[2..]),
        "sweep" => cmd_sweep(&args[2..]),
        "synthetic" => cmd_synthetic(&args[2..]),
        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }
}

/// Positional arguments plus the flags shared by all subcommands
#[derive(Debug, Default)]
struct Options {
    positional: Vec<String>,
    roi: Option<Roi>,
    json: bool,
    size: Option<u32>,
    blur: Option<u32>,
}

fn parse_options(args: &[String]) -> Result<Options> {
    let mut options = Options::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => options.json = true,
            "--roi" => {
                let value = iter.next().ok_or_else(|| anyhow!("--roi needs x,y,w,h"))?;
                let roi = Roi::parse(value)
                    .ok_or_else(|| anyhow!("invalid ROI '{}', expected x,y,w,h", value))?;
                options.roi = Some(roi);
            }
            "--size" => {
                let value = iter.next().ok_or_else(|| anyhow!("--size needs a value"))?;
                options.size = Some(value.parse().context("invalid --size")?);
            }
            "--blur" => {
                let value = iter.next().ok_or_else(|| anyhow!("--blur needs a value"))?;
                options.blur = Some(value.parse().context("invalid --blur")?);
            }
            _ => options.positional.push(arg.clone()),
        }
    }
    Ok(options)
}

fn load_and_evaluate(path: &str, roi: Option<Roi>) -> Result<Metrics> {
    let image = image::open(path).with_context(|| format!("failed to open {}", path))?;
    Ok(evaluate_dynamic(&image, roi))
}

fn print_metrics(metrics: &Metrics) {
    println!("valid: {}", metrics.valid);
    for (name, value) in metrics.fields() {
        println!("{:>22}: {:.4}", name, value);
    }
}

fn cmd_evaluate(args: &[String]) -> Result<()> {
    let options = parse_options(args)?;
    let path = match options.positional.as_slice() {
        [path] => path,
        _ => bail!("Usage: crabfocus-cli evaluate <image> [--roi x,y,w,h] [--json]"),
    };

    let metrics = load_and_evaluate(path, options.roi)?;
    if options.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        print_metrics(&metrics);
    }
    Ok(())
}

fn cmd_sweep(args: &[String]) -> Result<()> {
    let options = parse_options(args)?;
    if options.positional.is_empty() {
        bail!("Usage: crabfocus-cli sweep <image>... [--roi x,y,w,h] [--json]");
    }

    let config = FocusConfig::load_or_default();
    let mut tracker = SessionTracker::from_config(&config.session);
    let mut steps = Vec::new();

    for path in &options.positional {
        let metrics = load_and_evaluate(path, options.roi)?;
        tracker.apply_metrics(metrics);
        if !metrics.valid {
            log::warn!("{}: no usable region, skipped", path);
        }

        if options.json {
            steps.push(serde_json::json!({
                "path": path,
                "metrics": metrics,
                "guidance": tracker.guidance_lines(),
            }));
        } else {
            println!(
                "{} -> {:.2} (best {:.2})",
                path, metrics.composite_score, tracker.best_composite()
            );
            for line in tracker.guidance_lines() {
                println!("    {}", line);
            }
        }
    }

    let export = tracker.export_metadata();
    if options.json {
        let report = serde_json::json!({ "steps": steps, "export": export });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        for (key, value) in &export {
            println!("{} = {}", key, value);
        }
    }
    Ok(())
}

fn cmd_synthetic(args: &[String]) -> Result<()> {
    let options = parse_options(args)?;
    let (kind, out) = match options.positional.as_slice() {
        [kind, out] => (kind, PathBuf::from(out)),
        _ => bail!(
            "Usage: crabfocus-cli synthetic <{}> <out.png> [--size N] [--blur R]",
            TARGET_KINDS.join("|")
        ),
    };

    let size = options.size.unwrap_or(512);
    let target = synthetic_data::by_name(kind, size)
        .ok_or_else(|| anyhow!("unknown target '{}', expected one of {:?}", kind, TARGET_KINDS))?;
    let target = match options.blur {
        Some(radius) => synthetic_data::box_blur(&target, radius),
        None => target,
    };

    target
        .save(&out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!("Wrote {} {}x{} to {}", kind, size, size, out.display());
    Ok(())
}
