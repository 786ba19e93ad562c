use anyhow::{bail, Context};
use lumino_coordinator::ProtocolConfig;
use lumino_sim::{Scenario, SimRunner};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: lumino-sim [scenario] [config.json]\n\
                     scenarios: default, honest, lazy, withheld, unreliable, all";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let name = args.next().unwrap_or_else(|| "default".to_string());
    let config_path = args.next();

    let mut scenarios = if name == "all" {
        Scenario::all()
    } else {
        match Scenario::by_name(&name) {
            Some(scenario) => vec![scenario],
            None => bail!("unknown scenario '{}'\n{}", name, USAGE),
        }
    };

    if let Some(path) = config_path {
        let protocol = ProtocolConfig::from_file(&path)
            .with_context(|| format!("failed to load config from {}", path))?;
        for scenario in &mut scenarios {
            scenario.config.protocol = protocol.clone();
        }
    }

    let runner = SimRunner::new();
    let mut results = Vec::new();
    for scenario in &scenarios {
        let result = runner
            .run_scenario(scenario)
            .with_context(|| format!("scenario {} failed", scenario.config.name))?;
        tracing::info!(
            scenario = %result.scenario_name,
            passed = result.summary.passed,
            penalties = result.summary.total_penalties,
            slashes = result.summary.total_slashes,
            "scenario finished"
        );
        results.push(result);
    }

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
