use anyhow::{Result, bail};
use clap::Parser;
use min_reduce_cpu::agrees;
use min_reduce_cpu::options::Options;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let options = Options::parse();
    let config = options.resolve()?;
    let cells = options.load_cells(config.cell)?;
    // The kernel never reads the mask, it only has to be parallel to the input.
    let mask = vec![0u8; cells.len()];
    let launch = config.launch_for(cells.len());
    info!(
        "reducing {} `{}` cell(s): {} group(s) x {}, {} executor, {} finish",
        cells.len(),
        config.cell,
        launch.groups,
        launch.group_size,
        config.mode,
        config.finish
    );

    let reduction = config
        .cell
        .reduce(&launch, config.mode, config.finish, &cells, &mask)?;

    if options.partials {
        for (group, &cell) in reduction.partials.iter().enumerate() {
            println!("group {group}: {}", config.cell.load(cell));
        }
    }
    println!("{}", reduction.minimum);

    if options.verify {
        let baseline = config.cell.baseline_min(&cells);
        let minimum = reduction.minimum;
        if !agrees(minimum, baseline) {
            error!("kernel and baseline disagree");
            bail!("kernel minimum {minimum} disagrees with baseline {baseline}");
        }
        info!("baseline agrees");
    }
    Ok(())
}
