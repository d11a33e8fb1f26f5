use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use pulseox_core::sensor::ReplaySource;
use pulseox_core::{
    ButtonEvent, HeartRateData, ManualClock, Monitor, MonitorConfig, OximeterConfig,
    PulseOximeter, SyntheticConfig, SyntheticPpg,
};

#[derive(Parser)]
#[command(name = "pulseox", version, about = "Heart rate and SpO2 from red/IR PPG samples")]
struct Cli {
    /// TOML config file (defaults are used when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a synthetic PPG waveform through the pipeline
    Simulate {
        #[arg(long, default_value_t = 72.0)]
        bpm: f32,
        #[arg(long, default_value_t = 20)]
        seconds: u32,
        #[arg(long, default_value_t = 100)]
        rate: u32,
        /// Uniform noise amplitude in sensor counts
        #[arg(long, default_value_t = 0.0)]
        noise: f32,
        /// Simulate an uncovered sensor
        #[arg(long)]
        no_finger: bool,
        /// Inject a double press (reset) after this many seconds
        #[arg(long)]
        reset_at: Option<u32>,
        /// Show R and AC/DC components in status lines
        #[arg(long)]
        calibration: bool,
        /// Print one JSON object per second instead of text
        #[arg(long)]
        json: bool,
    },
    /// Replay a recorded `timestamp_ms,red,ir` CSV file
    Replay {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML
    Config {},
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.cmd {
        Commands::Simulate {
            bpm,
            seconds,
            rate,
            noise,
            no_finger,
            reset_at,
            calibration,
            json,
        } => {
            if rate == 0 || 1000 % rate != 0 {
                return Err("rate must divide 1000 (e.g. 50, 100, 200)".into());
            }
            let source = SyntheticPpg::new(SyntheticConfig {
                bpm,
                sample_rate_hz: rate as f32,
                noise,
                no_finger,
                ..Default::default()
            });
            let period_ms = source.period_ms().round() as u32;
            let clock = ManualClock::new(0);
            let oximeter = PulseOximeter::with_clock(config, clock.clone());
            let monitor_cfg = MonitorConfig {
                logging: !json,
                calibration,
                ..Default::default()
            };
            let mut monitor = Monitor::new(source, oximeter, monitor_cfg);

            for second in 1..=seconds {
                for _ in 0..rate {
                    clock.advance(period_ms);
                    monitor.step();
                }
                if reset_at == Some(second) {
                    monitor.handle_button(ButtonEvent::DoublePress);
                }
                if json {
                    print_json(&monitor.readings())?;
                }
            }

            log::info!(
                "Simulated {} samples at {} Hz ({} bpm target)",
                monitor.sample_count(),
                rate,
                bpm
            );
        }
        Commands::Replay { path, json } => {
            let source = ReplaySource::from_path(&path)?;
            let total = source.remaining();
            let clock = ManualClock::new(0);
            let oximeter = PulseOximeter::with_clock(config, clock.clone());
            let monitor_cfg = MonitorConfig {
                logging: !json,
                ..Default::default()
            };
            let mut monitor = Monitor::new(source, oximeter, monitor_cfg);

            while let Some(ts) = monitor.source_mut().peek_timestamp() {
                clock.set(ts);
                monitor.step();
            }

            log::info!(
                "Replayed {} of {} rows from {}",
                monitor.sample_count(),
                total,
                path.display()
            );
            let readings = monitor.readings();
            if json {
                print_json(&readings)?;
            } else {
                println!(
                    "HR: {:.1} bpm | SpO2: {:.1}% | Quality: {:.0}% | Finger: {} | Valid: {}",
                    readings.heart_rate,
                    readings.spo2,
                    readings.signal_quality,
                    readings.finger_detected,
                    readings.valid_reading
                );
            }
        }
        Commands::Config {} => {
            print!("{}", config.to_toml_string()?);
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<OximeterConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => OximeterConfig::from_file_with_env(p)?,
        None => {
            let mut config = OximeterConfig::default();
            config.apply_env_overrides()?;
            config.validate()?;
            config
        }
    };
    Ok(config)
}

fn print_json(readings: &HeartRateData) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(readings)?);
    Ok(())
}
