use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use serial_interface::{
    list_ports, setup_logging, AppConfig, AppError, HardwarePort, LineTester, SerialInterface,
    VirtualPort,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args)]
struct CommonArgs {
    /// Path to the config file
    #[arg(short, long, default_value = "/etc/serial-interface.yaml")]
    config: PathBuf,

    /// Dump default config and exit
    #[arg(long = "dump-default-config")]
    dump_default: bool,

    /// Serial device, overrides the config file
    #[arg(short, long)]
    device: Option<String>,

    /// Baud rate, overrides the config file
    #[arg(short, long)]
    baud_rate: Option<u32>,

    /// Use an in-memory loopback port instead of a device
    #[arg(long = "virtual")]
    virtual_port: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List serial ports found on this machine
    List,
    /// Send data to the port
    Send {
        /// Text to send, or hex bytes with --hex
        data: String,

        /// Interpret DATA as hex
        #[arg(long)]
        hex: bool,

        /// Wait for a reply frame, up to the configured read timeout
        #[arg(long)]
        reply: bool,
    },
    /// Print received data and line faults
    Listen {
        /// Stop after this long, e.g. "30s"; runs until Ctrl-C when omitted
        #[arg(long, value_parser = humantime_serde::re::humantime::parse_duration)]
        duration: Option<Duration>,
    },
    /// Provoke line faults on the device under test
    #[command(subcommand)]
    Stress(StressCommand),
}

#[derive(Subcommand)]
enum StressCommand {
    /// Flood the receiver to cause an overrun
    Overrun,
    /// Alternate between matching and mismatched baud rates to cause framing errors
    Framing,
}

fn load_config(common: &CommonArgs) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load(Some(common.config.as_path()))?;

    if let Some(device) = &common.device {
        config.port.device = device.clone();
    }
    if let Some(baud_rate) = common.baud_rate {
        config.port.baud_rate = baud_rate;
    }
    config.validate()?;

    Ok(config)
}

fn build_port(common: &CommonArgs, config: &AppConfig) -> Box<dyn SerialInterface> {
    if common.virtual_port {
        let (port, _line) = VirtualPort::loopback(config.port.device.clone());
        Box::new(port)
    } else {
        Box::new(HardwarePort::new(config.port.device.clone()))
    }
}

async fn run(cli: Cli, config: AppConfig) -> Result<(), AppError> {
    let Some(command) = cli.command else {
        return Err(AppError::input("no command given, see --help"));
    };

    if let Command::List = command {
        for port in list_ports()? {
            println!("{}\t{}", port.name, port.kind);
        }
        return Ok(());
    }

    let tester = LineTester::new(build_port(&cli.common, &config), config);
    tester.open().await?;

    let shutdown = tester.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, shutting down");
            let _ = shutdown.send(true);
        }
    });

    let outcome = match command {
        Command::List => Ok(()),
        Command::Send { data, hex, reply } => {
            let payload = if hex {
                hex::decode(data.replace([' ', ':'], ""))?
            } else {
                data.into_bytes()
            };
            if reply {
                tester
                    .request(&payload)
                    .await
                    .map(|reply| {
                        println!("{} {:?}", hex::encode(&reply), String::from_utf8_lossy(&reply))
                    })
                    .map_err(AppError::from)
            } else {
                tester.send(&payload).await.map_err(AppError::from)
            }
        }
        Command::Listen { duration } => tester
            .listen(duration)
            .await
            .map(|report| {
                info!(
                    "Received {} bytes, faults: {:?}",
                    report.bytes_received, report.faults
                )
            })
            .map_err(AppError::from),
        Command::Stress(StressCommand::Overrun) => tester
            .stress_overrun()
            .await
            .map(|report| info!("Overrun report: {:?}", report))
            .map_err(AppError::from),
        Command::Stress(StressCommand::Framing) => tester
            .stress_framing()
            .await
            .map(|report| info!("Framing report: {:?}", report))
            .map_err(AppError::from),
    };

    if let Err(e) = tester.close().await {
        error!("Failed to close port: {}", e);
    }
    print!("{}", tester.stats().await);

    outcome
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.common.dump_default {
        let config = AppConfig::default();
        println!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    let config = load_config(&cli.common)?;
    let _guard = setup_logging(&config.logging)?;
    info!("Using {}", config.port.serial_port_info());

    run(cli, config).await?;

    Ok(())
}
