#![no_std]
#![no_main]

mod board;
mod drivers;

use embassy_executor::Spawner;
use embassy_stm32::gpio::{Input, Level, Output, Pin, Pull, Speed};
use embassy_stm32::i2c::I2c;
use embassy_stm32::time::Hertz as TimeHertz;
use embassy_stm32::usart::Uart;
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use patio_controller::scheduler::{self, ShutdownPolicy};
use patio_controller::state::SharedRegister;
use patio_controller::tasks::mission_task::{Mission, NeverStop};
use patio_controller::tasks::server_task::ProtocolServer;
use patio_controller::{log_error, log_info, log_warn};

use crate::board::Board;
use crate::drivers::bno055::{Bno055, Bno055Error};
use crate::drivers::host_link::{HostRx, HostTx, RX_RING_LEN};
use crate::drivers::ir_array::IrLineArray;
use crate::drivers::timer_pace::TimerPace;

/// The host may keep polling after the mission ends.
const SHUTDOWN_POLICY: ShutdownPolicy = ShutdownPolicy::KeepServing;

/// Pause at the end of every task loop iteration.
const LOOP_PAUSE: Duration = Duration::from_millis(1);

// ── Shared register ───────────────────────────────────────────────────────────
static REGISTER: StaticCell<SharedRegister<CriticalSectionRawMutex>> = StaticCell::new();

// ── Host link receive ring (DMA) ──────────────────────────────────────────────
static HOST_RX_RING: StaticCell<[u8; RX_RING_LEN]> = StaticCell::new();

// ── Interrupt bindings ────────────────────────────────────────────────────────
bind_interrupts!(struct Irqs {
    I2C1_EV  => embassy_stm32::i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER  => embassy_stm32::i2c::ErrorInterruptHandler<peripherals::I2C1>;
    UART4    => embassy_stm32::usart::InterruptHandler<peripherals::UART4>;
});

// ── Main ──────────────────────────────────────────────────────────────────────
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    // 1. Board init (168 MHz PLL)
    let board = Board::init();
    let p = board.p;

    // 2. Status LED (PC13, active low), off until something fails
    let mut status_led = Output::new(p.PC13, Level::High, Speed::Low);

    // 3. Register shared by the mission and the protocol server
    let register: &'static SharedRegister<CriticalSectionRawMutex> =
        REGISTER.init(SharedRegister::new());

    // 4. Host link UART4 @ 115200 (TX=PA0, RX=PA1)
    let host_uart = Uart::new(
        p.UART4, p.PA1, p.PA0,
        Irqs,
        p.DMA1_CH4, p.DMA1_CH2,
        board::host_uart_config(),
    ).unwrap();
    let (host_uart_tx, host_uart_rx) = host_uart.split();
    let host_rx = HostRx::new(host_uart_rx, HOST_RX_RING.init([0; RX_RING_LEN]));
    let host_tx = HostTx::new(host_uart_tx);

    // 5. I2C1 @ 400 kHz for the BNO055 (SCL=PB8, SDA=PB9)
    let i2c = I2c::new(
        p.I2C1,
        p.PB8, p.PB9,
        Irqs,
        p.DMA1_CH7,
        p.DMA1_CH0,
        TimeHertz(board::IMU_I2C_HZ),
        Default::default(),
    );

    // 6. IMU init. Mission still runs without it.
    let imu = match Bno055::init(i2c).await {
        Ok(imu) => {
            log_info!("BNO055 ready");
            Some(imu)
        }
        Err(Bno055Error::WrongChipId(id)) => {
            log_error!("BNO055 not found, chip id {:#x}", id);
            status_led.set_low();
            None
        }
        Err(Bno055Error::Bus(_)) => {
            log_error!("BNO055 init failed on I2C");
            status_led.set_low();
            None
        }
    };

    // 7. Reflectance array, left → right
    let tracker = IrLineArray::new([
        Input::new(p.PC0.degrade(), Pull::Up),
        Input::new(p.PC1.degrade(), Pull::Up),
        Input::new(p.PC2.degrade(), Pull::Up),
        Input::new(p.PC3.degrade(), Pull::Up),
        Input::new(p.PC4.degrade(), Pull::Up),
    ]);

    // 8. Tasks
    let mut server = ProtocolServer::new(register);
    let mut mission = Mission::new(register, tracker, imu, NeverStop);
    let mut server_pace = TimerPace::new(LOOP_PAUSE);
    let mut control_pace = TimerPace::new(LOOP_PAUSE);

    log_info!("mission start");
    let code = scheduler::run(
        SHUTDOWN_POLICY,
        mission.run(&mut control_pace),
        server.run(host_rx, host_tx, &mut server_pace),
    )
    .await;

    // Only reached with StopWithMission
    log_warn!("scheduler stopped, code {}", code);
    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}
