//! Demo shell: load the persisted weather, optionally apply new conditions,
//! print the snapshot and save it back.
//!
//! Usage: `weatherface [CONDITION_CODE FORECAST_CODE [is_night]]`

use anyhow::{anyhow, Context};
use log::{info, warn, LevelFilter};
use std::env;
use weatherface::{
    config::Config,
    icon::{
        BitmapDecoder, DisplayKind, DrawCommandDecoder, IconDecoder,
        ResourceDir,
    },
    storage::FileStorage,
    WeatherStore,
};

/// New conditions passed on the command line
struct Conditions {
    current: i32,
    forecast: i32,
    is_night: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_module("weatherface", LevelFilter::Info)
        .parse_default_env()
        .init();

    let conditions = parse_args(env::args().skip(1).collect())?;
    let config = Config::load()?;
    let resources = ResourceDir::new(&config.icon_dir, config.display);

    // The display type is fixed for the life of the process, so pick the
    // decoder once here
    match config.display {
        DisplayKind::Monochrome => {
            run(&config, BitmapDecoder::new(resources), conditions)
        }
        DisplayKind::Color => {
            run(&config, DrawCommandDecoder::new(resources), conditions)
        }
    }
}

fn run<D: IconDecoder>(
    config: &Config,
    decoder: D,
    conditions: Option<Conditions>,
) -> anyhow::Result<()> {
    let storage = FileStorage::open(&config.storage_path).with_context(|| {
        format!("Error opening storage {}", config.storage_path.display())
    })?;
    let mut store = WeatherStore::open(storage, decoder);

    if let Some(conditions) = conditions {
        // A missing icon shouldn't stop the new data from being saved
        if let Err(err) = store.set_conditions(
            conditions.current,
            conditions.is_night,
            conditions.forecast,
        ) {
            warn!("Continuing without icon: {err}");
        }
    }

    println!("{}", serde_json::to_string_pretty(&store.snapshot())?);
    info!(
        "Icons loaded: current={}, forecast={}",
        store.current_icon().is_some(),
        store.forecast_icon().is_some()
    );

    store.teardown().context("Error saving weather")?;
    Ok(())
}

fn parse_args(args: Vec<String>) -> anyhow::Result<Option<Conditions>> {
    let parse_code = |arg: &str| {
        arg.parse::<i32>()
            .with_context(|| format!("Invalid condition code `{arg}`"))
    };
    match args.as_slice() {
        [] => Ok(None),
        [current, forecast, rest @ ..] if rest.len() <= 1 => {
            let is_night = match rest.first().map(String::as_str) {
                None => false,
                Some("is_night") => true,
                Some(other) => {
                    return Err(anyhow!("Unexpected argument `{other}`"))
                }
            };
            Ok(Some(Conditions {
                current: parse_code(current)?,
                forecast: parse_code(forecast)?,
                is_night,
            }))
        }
        _ => Err(anyhow!(
            "Usage: weatherface [CONDITION_CODE FORECAST_CODE [is_night]]"
        )),
    }
}
