use env_logger::{Builder, Env};
use kwl_fanplot::plot::{parse_cli, run};
use log::{error, info};

fn main() {
    let config = parse_cli();
    let default_level = if config.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_level)).init();

    info!(
        "read fan values from {} and plot to {}",
        config.infile.display(),
        config.outdir.display()
    );
    match run(&config) {
        Ok(written) => info!("done, {} plot file(s) written", written.len()),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}
