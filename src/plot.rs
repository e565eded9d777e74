use super::{DEFAULT_INFILE, DEFAULT_OUTDIR, FAN_IDS, VERSION};
use crate::extract::{extract, MalformedPolicy};
use crate::{FanLogError, TimestampLabels};
use clap::{App, Arg, ArgMatches};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Everything one invocation of the fan plotter needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    pub infile: PathBuf,
    pub outdir: PathBuf,
    pub fans: Vec<u8>,
    pub show: bool,
    pub csv: bool,
    pub policy: MalformedPolicy,
    pub labels: TimestampLabels,
    pub verbose: bool,
}

impl Default for PlotConfig {
    fn default() -> Self {
        PlotConfig {
            infile: PathBuf::from(DEFAULT_INFILE),
            outdir: PathBuf::from(DEFAULT_OUTDIR),
            fans: FAN_IDS.to_vec(),
            show: false,
            csv: false,
            policy: MalformedPolicy::Abort,
            labels: TimestampLabels::Uptime,
            verbose: false,
        }
    }
}

impl PlotConfig {
    pub fn from_matches(cli_args: &ArgMatches) -> PlotConfig {
        let fans = match cli_args.value_of("fan") {
            Some("1") => vec![1],
            Some("2") => vec![2],
            _ => FAN_IDS.to_vec(),
        };
        let policy = if cli_args.is_present("skip_malformed") {
            MalformedPolicy::Skip
        } else {
            MalformedPolicy::Abort
        };
        let labels = if cli_args.is_present("raw_timestamps") {
            TimestampLabels::Raw
        } else {
            TimestampLabels::Uptime
        };
        PlotConfig {
            infile: PathBuf::from(cli_args.value_of("infile").unwrap_or(DEFAULT_INFILE)),
            outdir: PathBuf::from(cli_args.value_of("outdir").unwrap_or(DEFAULT_OUTDIR)),
            fans,
            show: cli_args.is_present("show"),
            csv: cli_args.is_present("csv"),
            policy,
            labels,
            verbose: cli_args.is_present("verbose"),
        }
    }

    /// path of the png report of the given fan
    pub fn png_path(&self, fan_id: u8) -> PathBuf {
        self.outdir.join(format!("Plot_Fan{}.png", fan_id))
    }

    pub fn csv_path(&self, fan_id: u8) -> PathBuf {
        self.outdir.join(format!("Fan{}.csv", fan_id))
    }
}

pub fn build_cli() -> App<'static, 'static> {
    let arg_infile = Arg::with_name("infile")
        .help("log file with the fan values, as written by mosquitto_sub -v")
        .short("i")
        .long("infile")
        .takes_value(true)
        .default_value(DEFAULT_INFILE);
    let arg_outdir = Arg::with_name("outdir")
        .help("directory to write the plot file(s)")
        .short("o")
        .long("out")
        .takes_value(true)
        .default_value(DEFAULT_OUTDIR);
    let arg_fan = Arg::with_name("fan")
        .help("number of the fan to plot, both fans if not given")
        .short("f")
        .long("fan")
        .takes_value(true)
        .possible_values(&["1", "2"]);
    let arg_show = Arg::with_name("show")
        .help("open the plot in the image viewer after writing it")
        .short("s")
        .long("show")
        .takes_value(false);
    let arg_csv = Arg::with_name("csv")
        .help("also write the extracted values to Fan<N>.csv in the output directory")
        .long("csv")
        .takes_value(false);
    let arg_skip = Arg::with_name("skip_malformed")
        .help("skip malformed lines with a warning instead of aborting")
        .long("skip-malformed")
        .takes_value(false);
    let arg_raw = Arg::with_name("raw_timestamps")
        .help("label the timestamp axis with the raw values instead of the controller uptime")
        .long("raw-timestamps")
        .takes_value(false);
    let arg_verbose = Arg::with_name("verbose")
        .help("print verbose information")
        .short("v")
        .long("verbose")
        .takes_value(false);
    App::new("kwl_plotfans")
        .version(VERSION.unwrap_or("unknown"))
        .about("cli app to plot the fan values from the ventilation controller debug log")
        .arg(arg_infile)
        .arg(arg_outdir)
        .arg(arg_fan)
        .arg(arg_show)
        .arg(arg_csv)
        .arg(arg_skip)
        .arg(arg_raw)
        .arg(arg_verbose)
}

/// Takes the CLI arguments that control the plotting of the fan values.
pub fn parse_cli() -> PlotConfig {
    PlotConfig::from_matches(&build_cli().get_matches())
}

/// Extracts and plots every requested fan in turn, returns the written png files.
/// A fan without samples is reported and skipped.
pub fn run(config: &PlotConfig) -> Result<Vec<PathBuf>, FanLogError> {
    if !config.outdir.is_dir() {
        return Err(FanLogError::OutDir {
            path: config.outdir.clone(),
        });
    }
    let mut written = Vec::with_capacity(config.fans.len());
    for &fan_id in &config.fans {
        let series = extract(&config.infile, fan_id, config.policy)?;
        match series.summary() {
            Some(summary) => info!("Fan{}: {}", fan_id, summary),
            None => {
                warn!("{}, nothing to plot", FanLogError::EmptySeries { fan_id });
                continue;
            }
        }
        if config.csv {
            let csvout = config.csv_path(fan_id);
            series.to_csv(&csvout)?;
            info!("Write values to: {}", csvout.display());
        }
        let pngout = config.png_path(fan_id);
        info!("Write plot file to: {}", pngout.display());
        series.plot_png(&pngout, config.labels)?;
        if config.show {
            show_image(&pngout)?;
        }
        written.push(pngout);
    }
    Ok(written)
}

/// hands the image to the desktop viewer of the platform
pub fn show_image(path: &Path) -> Result<(), FanLogError> {
    let mut cmd = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.args(&["/C", "start", ""]);
        c
    } else {
        Command::new("xdg-open")
    };
    let viewer_err = |message: String| FanLogError::Viewer {
        path: path.to_path_buf(),
        message,
    };
    let status = cmd
        .arg(path)
        .status()
        .map_err(|e| viewer_err(e.to_string()))?;
    if status.success() {
        Ok(())
    } else {
        Err(viewer_err(format!("viewer exited with {}", status)))
    }
}
