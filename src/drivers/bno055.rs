use embassy_stm32::i2c::{Error, I2c, Instance, RxDma, TxDma};
use embassy_time::{Duration, Instant, Timer};

use patio_controller::sensing::{Imu, ImuSample};

const ADDR: u8 = 0x28;

const REG_CHIP_ID: u8 = 0x00;
const REG_LIA_DATA: u8 = 0x28;
const REG_UNIT_SEL: u8 = 0x3B;
const REG_OPR_MODE: u8 = 0x3D;
const REG_PWR_MODE: u8 = 0x3E;
const REG_AXIS_MAP_CONFIG: u8 = 0x41;
const REG_AXIS_MAP_SIGN: u8 = 0x42;

const CHIP_ID: u8 = 0xA0;

const MODE_CONFIG: u8 = 0x00;
const MODE_NDOF: u8 = 0x0C;
const PWR_NORMAL: u8 = 0x00;

// Mounting P7
const AXIS_P7_CONFIG: u8 = 0x24;
const AXIS_P7_SIGN: u8 = 0x05;

/// Linear acceleration: 1 m/s² = 100 LSB
const LIA_LSB_PER_MS2: f32 = 100.0;

#[derive(Debug)]
pub enum Bno055Error {
    Bus(Error),
    WrongChipId(u8),
}

impl From<Error> for Bno055Error {
    fn from(e: Error) -> Self {
        Bno055Error::Bus(e)
    }
}

pub struct Bno055<'d, T: Instance, Tx, Rx> {
    i2c: I2c<'d, T, Tx, Rx>,
}

impl<'d, T: Instance, Tx: TxDma<T>, Rx: RxDma<T>> Bno055<'d, T, Tx, Rx> {
    /// Probe the chip and switch it to NDOF fusion. Fails if nothing answers
    /// with the BNO055 chip id.
    pub async fn init(i2c: I2c<'d, T, Tx, Rx>) -> Result<Self, Bno055Error> {
        let mut imu = Self { i2c };

        // Power-on boot takes up to 650 ms
        Timer::after(Duration::from_millis(650)).await;

        let id = imu.read_reg(REG_CHIP_ID)?;
        if id != CHIP_ID {
            return Err(Bno055Error::WrongChipId(id));
        }

        imu.write_reg(REG_OPR_MODE, MODE_CONFIG)?;
        Timer::after(Duration::from_millis(25)).await;

        imu.write_reg(REG_PWR_MODE, PWR_NORMAL)?;
        imu.write_reg(REG_AXIS_MAP_CONFIG, AXIS_P7_CONFIG)?;
        imu.write_reg(REG_AXIS_MAP_SIGN, AXIS_P7_SIGN)?;
        // m/s², degrees, Celsius
        imu.write_reg(REG_UNIT_SEL, 0x00)?;

        imu.write_reg(REG_OPR_MODE, MODE_NDOF)?;
        Timer::after(Duration::from_millis(20)).await;

        Ok(imu)
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, Error> {
        let mut buf = [0u8; 1];
        self.i2c.blocking_write_read(ADDR, &[reg], &mut buf)?;
        Ok(buf[0])
    }

    fn write_reg(&mut self, reg: u8, val: u8) -> Result<(), Error> {
        self.i2c.blocking_write(ADDR, &[reg, val])
    }

    /// Gravity-compensated acceleration, m/s².
    pub fn read_linear_accel(&mut self) -> Result<[f32; 3], Error> {
        let mut buf = [0u8; 6];
        self.i2c.blocking_write_read(ADDR, &[REG_LIA_DATA], &mut buf)?;

        let x = i16::from_le_bytes([buf[0], buf[1]]);
        let y = i16::from_le_bytes([buf[2], buf[3]]);
        let z = i16::from_le_bytes([buf[4], buf[5]]);

        Ok([
            x as f32 / LIA_LSB_PER_MS2,
            y as f32 / LIA_LSB_PER_MS2,
            z as f32 / LIA_LSB_PER_MS2,
        ])
    }
}

impl<'d, T: Instance, Tx: TxDma<T>, Rx: RxDma<T>> Imu for Bno055<'d, T, Tx, Rx> {
    type Error = Bno055Error;

    async fn read(&mut self) -> Result<ImuSample, Self::Error> {
        let accel = self.read_linear_accel()?;
        Ok(ImuSample {
            accel,
            timestamp_us: Instant::now().as_micros(),
        })
    }
}
