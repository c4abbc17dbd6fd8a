use std::sync::Arc;

use anyhow::anyhow;
use store_forecast::presenter::{self, Presenter};
use store_forecast::{synthetic, Cli, DashboardConfig, DashboardSession, DataStore};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

const DEMO_WEEKS: u32 = 143;
const DEMO_SEED: u64 = 2010;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::import()?;
    let mut config = DashboardConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);

    let data = match (cli.demo, &config.data.path) {
        (Some(stores), _) => synthetic::generate_sales(stores, DEMO_WEEKS, DEMO_SEED)?,
        (None, Some(path)) => DataStore::from_csv(path)?,
        (None, None) => return Err(anyhow!("No sales data given; pass --data <CSV> or --demo <STORES>")),
    };
    let data = Arc::new(data);

    let selection = config.selection.resolve(&data, config.forecast.current_week)?;
    let session = DashboardSession::new(
        data,
        config.oracle()?,
        selection,
        config.session_settings(),
    )?;

    let panels = Presenter::new(config.week_calendar()).dashboard(&session);
    if cli.json {
        println!("{}", presenter::to_json(&panels)?);
    } else {
        for panel in &panels {
            println!("{}", panel);
        }
    }

    Ok(())
}
