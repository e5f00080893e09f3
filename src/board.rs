use embassy_stm32::rcc::*;
use embassy_stm32::time::Hertz as TimeHertz;
use embassy_stm32::usart::Config as UsartConfig;
use embassy_stm32::Config;

// ── Pin map ───────────────────────────────────────────────────────────────────
//  UART4  TX=PA0  RX=PA1      host link
//  I2C1   SCL=PB8 SDA=PB9     BNO055 IMU
//  PC0..PC4                   reflectance array, left → right, low = line
//  PC13                       status LED (active low, lit on IMU failure)

pub const HOST_BAUD: u32 = 115_200;
pub const IMU_I2C_HZ: u32 = 400_000;

pub struct Board {
    pub p: embassy_stm32::Peripherals,
}

impl Board {
    /// 8 MHz crystal → 168 MHz core.
    pub fn init() -> Self {
        let mut config = Config::default();
        config.rcc.hse = Some(Hse {
            freq: TimeHertz(8_000_000),
            mode: HseMode::Oscillator,
        });
        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL168,
            divp: Some(PllPDiv::DIV2),
            // no USB, the 48 MHz domain is left off
            divq: None,
            divr: None,
        });
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;

        Self {
            p: embassy_stm32::init(config),
        }
    }
}

/// 115200 8N1, same as the host side expects.
pub fn host_uart_config() -> UsartConfig {
    let mut config = UsartConfig::default();
    config.baudrate = HOST_BAUD;
    config
}
