use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use log::{error, info};
use moorkpi::{
    normalize_duration, CanonicalDuration, EngineConfig, KpiBatch, KpiEngine, KpiRequest,
};

const USAGE: &str =
    "<config.yaml> <batch.json> <unit|all> [duration] [--series] [--end <rfc3339>]";

struct Args {
    config_path: String,
    batch_path: String,
    unit: String,
    duration: Option<String>,
    series: bool,
    end_time: Option<DateTime<Utc>>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Args> {
    let mut positional = Vec::new();
    let mut series = false;
    let mut end_time = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--series" => series = true,
            "--end" => {
                let value = args.next().context("--end requires a timestamp")?;
                let parsed = DateTime::parse_from_rfc3339(&value)
                    .with_context(|| format!("invalid --end timestamp '{}'", value))?;
                end_time = Some(parsed.with_timezone(&Utc));
            }
            flag if flag.starts_with("--") => bail!("unknown option {}", flag),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let (Some(config_path), Some(batch_path), Some(unit)) =
        (positional.next(), positional.next(), positional.next())
    else {
        bail!("missing arguments");
    };
    let duration = positional.next();
    if let Some(extra) = positional.next() {
        bail!("unexpected argument '{}'", extra);
    }

    Ok(Args {
        config_path,
        batch_path,
        unit,
        duration,
        series,
        end_time,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    moorkpi::init();

    let mut argv = std::env::args();
    let program = argv.next().unwrap_or_else(|| "moorkpi".to_string());

    if std::env::args().any(|a| a == "--version") {
        println!("{}", moorkpi::build_info::summary());
        return Ok(());
    }

    let args = parse_args(argv).unwrap_or_else(|e| {
        error!("{}", e);
        error!("Usage: {} {}", program, USAGE);
        std::process::exit(1);
    });

    let config = EngineConfig::from_file(&args.config_path)
        .with_context(|| format!("loading config {}", args.config_path))?;
    let batch = KpiBatch::from_json_file(&args.batch_path, &config)
        .with_context(|| format!("loading batch {}", args.batch_path))?;
    info!(
        "Loaded {} samples and {} alarms for {} unit(s)",
        batch.sample_count(),
        batch.alarms().len(),
        config.units.len()
    );

    let duration = args
        .duration
        .as_deref()
        .map(normalize_duration)
        .unwrap_or_default();
    let engine = KpiEngine::new(config)?;

    // One clock read for every unit and series point of this run
    let end = args.end_time.unwrap_or_else(Utc::now);
    let output = evaluate(engine, &args, duration, end, batch).await?;

    println!("{}", output);
    Ok(())
}

#[cfg(feature = "fleet")]
async fn evaluate(
    engine: KpiEngine,
    args: &Args,
    duration: CanonicalDuration,
    end: DateTime<Utc>,
    batch: KpiBatch,
) -> anyhow::Result<String> {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    let fleet = moorkpi::FleetEvaluator::new(engine);
    let batch = Arc::new(batch);

    let output = match (args.unit.as_str(), args.series) {
        ("all", false) => {
            let results = fleet.evaluate_fleet(duration, Some(end), batch).await?;
            let reports = results.into_iter().collect::<moorkpi::Result<Vec<_>>>()?;
            serde_json::to_string_pretty(&reports)?
        }
        ("all", true) => {
            let mut series = BTreeMap::new();
            for request in fleet.fleet_requests(duration, Some(end)) {
                let points = fleet.series(&request, Arc::clone(&batch)).await?;
                series.insert(request.unit, points);
            }
            serde_json::to_string_pretty(&series)?
        }
        (unit, true) => {
            let request = KpiRequest::new(unit, duration).ending_at(end);
            serde_json::to_string_pretty(&fleet.series(&request, batch).await?)?
        }
        (unit, false) => {
            let request = KpiRequest::new(unit, duration).ending_at(end);
            serde_json::to_string_pretty(&fleet.engine().evaluate(&request, &batch)?)?
        }
    };
    Ok(output)
}

#[cfg(not(feature = "fleet"))]
async fn evaluate(
    engine: KpiEngine,
    args: &Args,
    duration: CanonicalDuration,
    end: DateTime<Utc>,
    batch: KpiBatch,
) -> anyhow::Result<String> {
    if args.unit == "all" {
        bail!("fleet evaluation requires the 'fleet' feature");
    }

    let request = KpiRequest::new(args.unit.clone(), duration).ending_at(end);
    let output = if args.series {
        serde_json::to_string_pretty(&engine.series(&request, &batch)?)?
    } else {
        serde_json::to_string_pretty(&engine.evaluate(&request, &batch)?)?
    };
    Ok(output)
}
