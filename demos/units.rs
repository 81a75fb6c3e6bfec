//! Prints systemd units, showing how the client can be configured.
//!
//! ```sh
//! cargo run --example units -- --svc
//! ```

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use systemd_client::{Client, ClientBuilder, Unit};

#[derive(Parser)]
struct Args {
    /// Bus address, e.g., unix:path=/run/user/1000/bus.
    #[arg(long)]
    addr: Option<String>,
    /// Show only services along with their main PIDs.
    #[arg(long)]
    svc: bool,
    /// Check that reply serials match the requests.
    #[arg(long)]
    serial: bool,
    /// Connection read/write timeout in seconds.
    #[arg(long, default_value_t = 1)]
    timeout: u64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut builder = ClientBuilder::new();
    builder
        .timeout(Duration::from_secs(args.timeout))
        .serial_check(args.serial);

    if let Some(addr) = &args.addr {
        builder.address(addr);
    }

    let client = builder.connect().context("failed to connect to dbus")?;

    if args.svc {
        print_services(&client)
    } else {
        client
            .list_units(None, |unit| {
                println!("{} {}", unit.name, unit.active_state);
            })
            .context("failed to get systemd units")
    }
}

/// Print service names along with their PIDs, ignoring non-service units.
fn print_services(client: &Client) -> anyhow::Result<()> {
    let mut services = Vec::new();

    client
        .list_units(Some(&|unit: &Unit<'_>| unit.is_service()), |unit| {
            // The unit is overwritten on the next callback; keep copies.
            services.push((unit.name.to_string(), unit.active_state.to_string()));
        })
        .context("failed to get systemd units")?;

    for (name, active_state) in services {
        let pid = client
            .main_pid(&name)
            .with_context(|| format!("failed to get PID of {name}"))?;

        println!("{pid} {name} {active_state}");
    }

    Ok(())
}
