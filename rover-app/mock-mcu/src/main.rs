use clap::Parser;
use embassy_executor::{Executor, Spawner};
use embassy_net::{Config, Ipv4Address, Ipv4Cidr, Runner, Stack, StackResources};
use embassy_net_tuntap::TunTapDevice;
use heapless::Vec;
use rand_core::{OsRng, TryRngCore};
use rover_core::mk_static;
use rover_core::utils::{
    self,
    config::{DriveConfig, PivotPolarity},
    controllers::ActuationPort,
    math::drive::{Wheel, WheelCommand},
    DriveController,
};
use static_cell::StaticCell;
use tracing::{error, info};

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts {
    /// TAP device name
    #[clap(long, default_value = "tap0")]
    tap: String,
    /// use a static IP instead of DHCP
    #[clap(long)]
    static_ip: bool,
    /// HTTP / WebSocket port
    #[clap(long, default_value_t = 8000)]
    port: u16,
    /// PWM ceiling reported to the motion controller
    #[clap(long)]
    duty_max: Option<u16>,
    /// stop the wheels after this many ms without a command
    #[clap(long)]
    watchdog_ms: Option<u64>,
    /// fraction of the duty ceiling used for pivot turns
    #[clap(long)]
    pivot_fraction: Option<f32>,
    /// right pivot drives the right wheel forward
    #[clap(long)]
    invert_pivot: bool,
    /// control loop period in ms
    #[clap(long)]
    tick_ms: Option<u64>,
}

impl Opts {
    fn drive_config(&self) -> DriveConfig {
        let polarity = self.invert_pivot.then_some(PivotPolarity::RightForward);
        let config =
            DriveConfig::new(self.duty_max, self.pivot_fraction, polarity, self.watchdog_ms);
        match self.tick_ms {
            Some(ms) => config.with_tick_period(utils::Duration::from_millis(ms)),
            None => config,
        }
    }
}

/// Actuation port that prints wheel changes instead of driving a bridge.
struct ConsolePort {
    last: [Option<WheelCommand>; 2],
}

impl ActuationPort for ConsolePort {
    fn apply(
        &mut self,
        wheel: Wheel,
        command: WheelCommand,
    ) {
        let slot = match wheel {
            Wheel::Left => 0,
            Wheel::Right => 1,
        };
        if self.last[slot] != Some(command) {
            info!(?wheel, direction = ?command.direction, duty = command.duty, "wheel");
            self.last[slot] = Some(command);
        }
    }
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, TunTapDevice>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn drive_task(mut ctrl: DriveController<ConsolePort>) -> ! {
    ctrl.run().await
}

#[embassy_executor::task]
async fn main_task(
    spawner: Spawner,
    opts: Opts,
) {
    let config = opts.drive_config();
    info!(?config, "drive configuration");
    let ctrl = DriveController::new(ConsolePort { last: [None; 2] }, config);
    spawner.spawn(drive_task(ctrl)).unwrap();

    let device = match TunTapDevice::new(&opts.tap) {
        Ok(device) => device,
        Err(e) => {
            error!("Failed to open TAP device {}: {:?}", opts.tap, e);
            return;
        }
    };
    let net_config = if opts.static_ip {
        Config::ipv4_static(embassy_net::StaticConfigV4 {
            address: Ipv4Cidr::new(Ipv4Address::new(192, 168, 69, 2), 24),
            dns_servers: Vec::new(),
            gateway: Some(Ipv4Address::new(192, 168, 69, 1)),
        })
    } else {
        Config::dhcpv4(Default::default())
    };

    let mut seed_buf = [0; 8];
    if let Err(e) = OsRng.try_fill_bytes(&mut seed_buf) {
        error!("OS RNG unavailable: {:?}", e);
        return;
    }
    let seed = u64::from_le_bytes(seed_buf);

    let (stack, runner) = embassy_net::new(
        device,
        net_config,
        mk_static!(StackResources<3>, StackResources::<3>::new()),
        seed,
    );
    spawner.spawn(net_task(runner)).unwrap();

    wait_for_network(&stack).await;

    info!("Starting drive server on port {}", opts.port);
    utils::wss(0, opts.port, stack, None).await;
}

/// Helper function to wait for network connection
async fn wait_for_network(stack: &Stack<'static>) {
    info!("Waiting for network link...");
    loop {
        if stack.is_link_up() {
            break;
        }
        utils::Timer::after(utils::Duration::from_millis(500)).await;
    }

    info!("Waiting to get IP address...");
    loop {
        if let Some(config) = stack.config_v4() {
            info!("Got IP: {}", config.address);
            break;
        }
        utils::Timer::after(utils::Duration::from_millis(500)).await;
    }
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let opts = Opts::parse();
    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(main_task(spawner, opts)).unwrap();
    });
}
