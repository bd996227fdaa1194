/*
 * The boundary between the control logic and the board.
 *
 * Tasks only ever see these traits. The firmware implements them on top of
 * the HAL in `board`, host tests implement them in `mock`. Each implementation
 * is owned by exactly one task, so nothing here needs to be `Sync`.
 */

use core::future::Future;

use crate::runtime::RestartReason;

/*
 * A two-channel H-bridge style output. Intensities are duty counts bounded by
 * the drive period passed to `setup`; zero is fully off.
 */
pub trait ActuatorDriver {
    fn setup(&mut self, drive_period: u16);
    fn set_channel_a(&mut self, intensity: u16);
    fn set_channel_b(&mut self, intensity: u16);
    fn enable(&mut self);
}

/*
 * Non-blocking operator link. `read_char` is only meaningful after `has_char`
 * returned true. Writes may be buffered; `flush` resolves once everything
 * written so far has left the device.
 */
pub trait CharacterChannel {
    fn has_char(&self) -> bool;
    fn read_char(&mut self) -> u8;
    fn write_bytes(&mut self, bytes: &[u8]);

    fn write(&mut self, text: &str) {
        self.write_bytes(text.as_bytes());
    }

    fn write_line(&mut self, text: &str) {
        self.write(text);
        self.write("\r\n");
    }

    fn flush(&mut self) -> impl Future<Output = ()> {
        async {}
    }
}

/*
 * Whatever can bring the whole controller back from scratch. On the board
 * that is the watchdog; it never hands control back.
 */
pub trait Supervisor {
    fn restart(&mut self, reason: RestartReason) -> !;
}

impl<A: ActuatorDriver + ?Sized> ActuatorDriver for &mut A {
    fn setup(&mut self, drive_period: u16) {
        (**self).setup(drive_period)
    }

    fn set_channel_a(&mut self, intensity: u16) {
        (**self).set_channel_a(intensity)
    }

    fn set_channel_b(&mut self, intensity: u16) {
        (**self).set_channel_b(intensity)
    }

    fn enable(&mut self) {
        (**self).enable()
    }
}

impl<C: CharacterChannel + ?Sized> CharacterChannel for &mut C {
    fn has_char(&self) -> bool {
        (**self).has_char()
    }

    fn read_char(&mut self) -> u8 {
        (**self).read_char()
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        (**self).write_bytes(bytes)
    }

    fn flush(&mut self) -> impl Future<Output = ()> {
        (**self).flush()
    }
}
