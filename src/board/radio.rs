//! cyw43 WiFi chip and the embassy-net stack on top of it.

use core::net::Ipv4Addr;

use cyw43::JoinOptions;
use cyw43_pio::{PioSpi, DEFAULT_CLOCK_DIVIDER};
use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_net::{Config, Stack, StackResources};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{DMA_CH0, PIN_23, PIN_24, PIN_25, PIN_29, PIO0};
use embassy_rp::pio::{InterruptHandler, Pio};
use static_cell::StaticCell;

use pico_switch::error::ConnectFailure;
use pico_switch::wifi::{LinkStatus, WifiCredentials, WifiRadio};

use super::transport::POOL_SIZE;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => InterruptHandler<PIO0>;
});

/// Join status reported when no network with the SSID answered.
const STATUS_NO_NETWORKS: u32 = 3;
/// Join status reported when the WPA handshake never completed.
const STATUS_HANDSHAKE_TIMEOUT: u32 = 2;

type RadioSpi = PioSpi<'static, PIO0, 0, DMA_CH0>;

#[embassy_executor::task]
async fn cyw43_task(runner: cyw43::Runner<'static, Output<'static>, RadioSpi>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
async fn net_task(mut runner: embassy_net::Runner<'static, cyw43::NetDriver<'static>>) -> ! {
    runner.run().await
}

/// Bring up the chip and the DHCP network stack. The radio is idle until
/// the first `join`.
#[allow(clippy::too_many_arguments)]
pub async fn init(
    spawner: Spawner,
    pwr: PIN_23,
    dio: PIN_24,
    cs: PIN_25,
    clk: PIN_29,
    pio0: PIO0,
    dma: DMA_CH0,
    seed: u64,
) -> Cyw43Radio {
    let fw = cyw43_firmware::CYW43_43439A0;
    let clm = cyw43_firmware::CYW43_43439A0_CLM;

    let pwr = Output::new(pwr, Level::Low);
    let cs = Output::new(cs, Level::High);
    let mut pio = Pio::new(pio0, Irqs);
    let spi = PioSpi::new(
        &mut pio.common,
        pio.sm0,
        DEFAULT_CLOCK_DIVIDER,
        pio.irq0,
        cs,
        dio,
        clk,
        dma,
    );

    static STATE: StaticCell<cyw43::State> = StaticCell::new();
    let state = STATE.init(cyw43::State::new());
    let (net_device, mut control, runner) = cyw43::new(state, pwr, spi, fw).await;
    unwrap!(spawner.spawn(cyw43_task(runner)));

    control.init(clm).await;
    control
        .set_power_management(cyw43::PowerManagementMode::PowerSave)
        .await;

    // One slot per pooled socket plus DHCP.
    static RESOURCES: StaticCell<StackResources<{ POOL_SIZE + 1 }>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        net_device,
        Config::dhcpv4(Default::default()),
        RESOURCES.init(StackResources::new()),
        seed,
    );
    unwrap!(spawner.spawn(net_task(runner)));
    info!("cyw43 up");

    Cyw43Radio { control, stack }
}

pub struct Cyw43Radio {
    control: cyw43::Control<'static>,
    stack: Stack<'static>,
}

impl Cyw43Radio {
    pub fn stack(&self) -> Stack<'static> {
        self.stack
    }
}

impl WifiRadio for Cyw43Radio {
    async fn join(&mut self, credentials: &WifiCredentials) -> Result<(), ConnectFailure> {
        let options = JoinOptions::new(credentials.password.as_bytes());
        match self.control.join(&credentials.ssid, options).await {
            Ok(()) => Ok(()),
            Err(err) => {
                info!("join failed with status {}", err.status);
                Err(match err.status {
                    STATUS_NO_NETWORKS => ConnectFailure::NoApFound,
                    STATUS_HANDSHAKE_TIMEOUT => ConnectFailure::WrongPassword,
                    _ => ConnectFailure::ConnectFailed,
                })
            }
        }
    }

    async fn status(&mut self) -> LinkStatus {
        if !self.stack.is_link_up() {
            return LinkStatus::Idle;
        }
        match self.stack.config_v4() {
            Some(config) => {
                let ip: Ipv4Addr = config.address.address();
                LinkStatus::GotIp(ip)
            }
            None => LinkStatus::Joining,
        }
    }
}
