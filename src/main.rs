use elasticsearch_retention::{
    args::Opt, clock::SystemClock, es::Cluster, logging, runner::run,
};
use std::io::Write;
use structopt::StructOpt;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let opt = Opt::from_args();
    logging::init(opt.verbose);
    log::info!("Elasticsearch retention started!");

    let outcome = run(&opt.hosts, Cluster::connect, &SystemClock).await?;

    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "elasticsearch-retention".to_string());
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    outcome.report(&program, &mut out)?;
    out.flush()?;

    std::process::exit(outcome.exit_code())
}
