//! H-bridge actuation for the two drive wheels.
//!
//! Each wheel is driven by a pair of bridge inputs (IN1/IN2). Forward puts the
//! duty on IN1, reverse puts it on IN2, and stop pulls both low. The opposite
//! input is always cleared before the active one is raised.
//!
//! Two drivers are provided:
//! - [`PwmBridge`]: four `embedded-hal` PWM outputs wired straight to the bridge.
//! - [`Pca9685Bridge`]: a PCA9685 PWM expander on a shared I2C bus.

use core::cell::RefCell;

use embedded_hal::{i2c::I2c, pwm::SetDutyCycle};
use embedded_hal_bus::i2c::RefCellDevice;
use pwm_pca9685::{Address as PwmAddress, Channel, Error as PwmError, Pca9685};

use crate::utils::math::drive::{Direction, Wheel, WheelCommand, WheelPair};

/// Sink for wheel commands.
///
/// Writes are fire-and-forget: a driver that hits a bus error logs it and
/// returns. Once `apply` returns the command is assumed to be in effect.
pub trait ActuationPort {
    fn apply(
        &mut self,
        wheel: Wheel,
        command: WheelCommand,
    );

    fn apply_pair(
        &mut self,
        pair: &WheelPair,
    ) {
        self.apply(Wheel::Left, pair.left);
        self.apply(Wheel::Right, pair.right);
    }
}

impl<P: ActuationPort + ?Sized> ActuationPort for &mut P {
    fn apply(
        &mut self,
        wheel: Wheel,
        command: WheelCommand,
    ) {
        (**self).apply(wheel, command)
    }
}

/// Duty levels for (IN1, IN2) of one bridge channel.
fn bridge_levels(command: WheelCommand) -> (u16, u16) {
    let duty = command.effective_duty();
    match command.direction {
        Direction::Forward => (duty, 0),
        Direction::Reverse => (0, duty),
        Direction::Stop => (0, 0),
    }
}

/// Bridge driven by four PWM pins.
pub struct PwmBridge<P> {
    left: (P, P),
    right: (P, P),
    duty_max: u16,
}

impl<P> PwmBridge<P>
where
    P: SetDutyCycle,
{
    /// Take ownership of the pins and immediately drive them all low.
    pub fn new(
        left: (P, P),
        right: (P, P),
        duty_max: u16,
    ) -> Self {
        let mut bridge = Self {
            left,
            right,
            duty_max,
        };
        bridge.apply_pair(&WheelPair::STOP);
        bridge
    }

    pub fn release(self) -> ((P, P), (P, P)) {
        (self.left, self.right)
    }

    fn write(
        &mut self,
        wheel: Wheel,
        command: WheelCommand,
    ) -> Result<(), P::Error> {
        let duty_max = self.duty_max;
        let (in1, in2) = match wheel {
            Wheel::Left => &mut self.left,
            Wheel::Right => &mut self.right,
        };
        let (level1, level2) = bridge_levels(command);

        if level1 == 0 {
            set_level(in1, 0, duty_max)?;
            set_level(in2, level2, duty_max)
        } else {
            set_level(in2, 0, duty_max)?;
            set_level(in1, level1, duty_max)
        }
    }
}

fn set_level<P: SetDutyCycle>(
    pin: &mut P,
    duty: u16,
    duty_max: u16,
) -> Result<(), P::Error> {
    if duty == 0 || duty_max == 0 {
        pin.set_duty_cycle_fully_off()
    } else {
        pin.set_duty_cycle_fraction(duty.min(duty_max), duty_max)
    }
}

impl<P> ActuationPort for PwmBridge<P>
where
    P: SetDutyCycle,
{
    fn apply(
        &mut self,
        wheel: Wheel,
        command: WheelCommand,
    ) {
        if let Err(error) = self.write(wheel, command) {
            tracing::error!(?error, ?wheel, "PWM write failed");
        }
    }
}

/// Errors raised by the PCA9685 bridge.
#[derive(Debug)]
pub enum BridgeError<E: core::fmt::Debug> {
    PwmError(PwmError<E>),
}

impl<E: core::fmt::Debug> From<PwmError<E>> for BridgeError<E> {
    fn from(e: PwmError<E>) -> Self {
        BridgeError::PwmError(e)
    }
}

/// Full-scale count of the PCA9685 12-bit outputs.
const PCA_MAX_DUTY: u16 = 4095;

/// Default I2C address of the expander.
pub const PCA9685_ADDRESS: u8 = 0x55;

/// Bridge driven through a PCA9685 on a shared I2C bus.
pub struct Pca9685Bridge<'a, I2C: 'static> {
    pwm: Pca9685<RefCellDevice<'a, I2C>>,
    left: (Channel, Channel),
    right: (Channel, Channel),
    duty_max: u16,
}

impl<'a, I2C, E> Pca9685Bridge<'a, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    /// Bind the expander at `address`. Left wheel uses C6/C7, right wheel C2/C3.
    pub fn new(
        i2c_bus: &'a RefCell<I2C>,
        address: u8,
        duty_max: u16,
    ) -> Result<Self, BridgeError<E>> {
        let pwm = Pca9685::new(RefCellDevice::new(i2c_bus), PwmAddress::from(address))?;
        Ok(Self {
            pwm,
            left: (Channel::C6, Channel::C7),
            right: (Channel::C2, Channel::C3),
            duty_max,
        })
    }

    /// Wake the oscillator and set the PWM prescaler.
    pub fn init(
        &mut self,
        prescale: u8,
    ) -> Result<(), BridgeError<E>> {
        self.pwm.enable()?;
        tracing::info!("PWM enabled");
        self.pwm.set_prescale(prescale)?;
        tracing::info!(prescale, "PWM prescale set");
        Ok(())
    }

    fn counts(
        &self,
        duty: u16,
    ) -> u16 {
        if self.duty_max == 0 {
            return 0;
        }
        let duty = u32::from(duty.min(self.duty_max));
        (duty * u32::from(PCA_MAX_DUTY) / u32::from(self.duty_max)) as u16
    }

    fn write(
        &mut self,
        wheel: Wheel,
        command: WheelCommand,
    ) -> Result<(), BridgeError<E>> {
        let (in1, in2) = match wheel {
            Wheel::Left => self.left,
            Wheel::Right => self.right,
        };
        let (level1, level2) = bridge_levels(command);

        if level1 == 0 {
            self.set_input(in1, 0)?;
            self.set_input(in2, level2)
        } else {
            self.set_input(in2, 0)?;
            self.set_input(in1, level1)
        }
    }

    /// Drive one input. The duty ceiling uses the full-on bit, not a 4095 off count.
    fn set_input(
        &mut self,
        channel: Channel,
        level: u16,
    ) -> Result<(), BridgeError<E>> {
        if self.duty_max > 0 && level >= self.duty_max {
            self.pwm.set_channel_full_on(channel, 0)?;
        } else {
            let off = self.counts(level);
            self.pwm.set_channel_on_off(channel, 0, off)?;
        }
        Ok(())
    }
}

impl<'a, I2C, E> ActuationPort for Pca9685Bridge<'a, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    fn apply(
        &mut self,
        wheel: Wheel,
        command: WheelCommand,
    ) {
        if let Err(error) = self.write(wheel, command) {
            tracing::error!(?error, ?wheel, "PCA9685 write failed");
        }
    }
}
