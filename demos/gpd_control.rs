// Command line control of a GPD power supply
//
// Lists serial ports, or connects to a supply and runs a single command.

use clap::{Parser, Subcommand, ValueEnum};
use gpd_psu::{Model, PowerSupply, SerialSettings, TrackingMode};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "gpd_control")]
#[command(version = "1.0")]
#[command(about = "Control a GW Instek GPD-3303S / GPD-4303S over its serial port")]
struct Args {
    /// Serial port of the supply, e.g. /dev/ttyUSB0 or COM3
    #[arg(short, long)]
    port: Option<String>,

    /// Supply model, selects the valid channel range
    #[arg(short, long, value_enum, default_value_t = ModelArg::Gpd3303s)]
    model: ModelArg,

    /// Read/write timeout in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    timeout: u64,

    /// Treat replies as CRLF terminated regardless of what was detected
    #[arg(long)]
    crlf: bool,

    /// Enable verbose logging
    #[arg(short, long, help = "Show debug information and detailed logs")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModelArg {
    Gpd3303s,
    Gpd4303s,
}

impl From<ModelArg> for Model {
    fn from(value: ModelArg) -> Self {
        match value {
            ModelArg::Gpd3303s => Self::Gpd3303s,
            ModelArg::Gpd4303s => Self::Gpd4303s,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Independent,
    Series,
    Parallel,
}

impl From<ModeArg> for TrackingMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Independent => Self::Independent,
            ModeArg::Series => Self::Series,
            ModeArg::Parallel => Self::Parallel,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List serial ports on this machine
    Ports,
    /// Print the identification string
    Identify,
    /// Print settings and readback of a channel
    Read { channel: u8 },
    /// Set voltage and current limit of a channel
    Set {
        channel: u8,
        #[arg(long)]
        volts: Option<f64>,
        #[arg(long)]
        amps: Option<f64>,
    },
    /// Switch all outputs on or off
    Output {
        #[arg(action = clap::ArgAction::Set)]
        on: bool,
    },
    /// Switch the beeper on or off
    Beep {
        #[arg(action = clap::ArgAction::Set)]
        on: bool,
    },
    /// Select the tracking mode
    Mode { mode: ModeArg },
    /// Save the panel settings to a memory slot
    Save { slot: u8 },
    /// Recall the panel settings from a memory slot
    Recall { slot: u8 },
    /// Print the status report
    Status,
    /// Print the supply's own command summary (HELP?)
    #[command(name = "commands")]
    CommandList,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    if matches!(args.command, Command::Ports) {
        for port in serialport::available_ports()? {
            println!("{}", port.port_name);
        }
        return Ok(());
    }

    let Some(port) = args.port.as_deref() else {
        eprintln!("No port given. Use --port, or the `ports` command to list them.");
        std::process::exit(1);
    };

    let settings = SerialSettings::with_timeout(Duration::from_millis(args.timeout));
    let mut psu = PowerSupply::open(port, &settings, args.model.into())?;
    if args.crlf {
        psu.set_delimiter(gpd_psu::Delimiter::CrLf);
    }

    match args.command {
        Command::Ports => {}
        Command::Identify => println!("{}", psu.get_identification()?),
        Command::Read { channel } => {
            println!(
                "CH{}: set {:.3} V / {:.3} A, out {:.3} V / {:.3} A",
                channel,
                psu.get_voltage(channel)?,
                psu.get_current(channel)?,
                psu.get_voltage_output(channel)?,
                psu.get_current_output(channel)?
            );
        }
        Command::Set {
            channel,
            volts,
            amps,
        } => {
            if let Some(volts) = volts {
                psu.set_voltage(channel, volts)?;
            }
            if let Some(amps) = amps {
                psu.set_current(channel, amps)?;
            }
        }
        Command::Output { on } => psu.enable_output(on)?,
        Command::Beep { on } => psu.enable_beep(on)?,
        Command::Mode { mode } => psu.select_tracking_mode(mode.into())?,
        Command::Save { slot } => psu.save_setting(slot)?,
        Command::Recall { slot } => println!("{}", psu.recall_setting(slot)?),
        Command::Status => {
            for line in psu.print_status()? {
                println!("{line}");
            }
        }
        Command::CommandList => {
            for line in psu.print_help()? {
                println!("{line}");
            }
        }
    }

    psu.close();
    Ok(())
}
