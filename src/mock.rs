/*
 * Host-side stand-ins for the board collaborators.
 *
 * Compiled for unit tests, or with the `mock` feature for anything else that
 * wants to drive the controller off-target. They record what the control
 * logic asked for so tests can check it afterwards.
 */

use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

use crate::io::{ActuatorDriver, CharacterChannel, Supervisor};
use crate::runtime::RestartReason;

// Records the latest intensity on each channel.
#[derive(Debug, Default)]
pub struct MockActuator {
    channel_a: u16,
    channel_b: u16,
    drive_period: Option<u16>,
    enabled: bool,
    setups: u32,
    writes: u32,
}

impl MockActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel_a(&self) -> u16 {
        self.channel_a
    }

    pub fn channel_b(&self) -> u16 {
        self.channel_b
    }

    pub fn drive_period(&self) -> Option<u16> {
        self.drive_period
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn setups(&self) -> u32 {
        self.setups
    }

    // Number of channel writes, to tell "wrote zero" from "did nothing".
    pub fn writes(&self) -> u32 {
        self.writes
    }
}

impl ActuatorDriver for MockActuator {
    fn setup(&mut self, drive_period: u16) {
        self.drive_period = Some(drive_period);
        self.setups += 1;
    }

    fn set_channel_a(&mut self, intensity: u16) {
        self.channel_a = intensity;
        self.writes += 1;
    }

    fn set_channel_b(&mut self, intensity: u16) {
        self.channel_b = intensity;
        self.writes += 1;
    }

    fn enable(&mut self) {
        self.enabled = true;
    }
}

/*
 * In-memory operator link: inject keystrokes, inspect what was written.
 * A flush marks everything written so far as sent.
 */
#[derive(Debug, Default)]
pub struct MockSerial {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    flushed: usize,
    flushes: u32,
}

impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inject(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.tx).into_owned()
    }

    pub fn take_output(&mut self) -> String {
        let output = self.output();
        self.tx.clear();
        self.flushed = 0;
        output
    }

    pub fn flushes(&self) -> u32 {
        self.flushes
    }

    // Bytes written since the last flush.
    pub fn unflushed(&self) -> usize {
        self.tx.len() - self.flushed
    }
}

impl CharacterChannel for MockSerial {
    fn has_char(&self) -> bool {
        !self.rx.is_empty()
    }

    fn read_char(&mut self) -> u8 {
        self.rx.pop_front().unwrap_or(0)
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.tx.extend_from_slice(bytes);
    }

    async fn flush(&mut self) {
        self.flushed = self.tx.len();
        self.flushes += 1;
    }
}

// Turns a restart into a panic carrying the reason, which a test can catch.
#[derive(Debug, Default)]
pub struct MockSupervisor;

impl Supervisor for MockSupervisor {
    fn restart(&mut self, reason: RestartReason) -> ! {
        panic!("restart requested: {:?}", reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_reads_in_order_and_reports_empty() {
        let mut serial = MockSerial::new();
        assert!(!serial.has_char());

        serial.inject(b"ab");
        assert_eq!(serial.read_char(), b'a');
        assert_eq!(serial.read_char(), b'b');
        assert!(!serial.has_char());
    }

    #[test]
    fn serial_write_line_appends_crlf() {
        let mut serial = MockSerial::new();
        serial.write_line("hello");
        assert_eq!(serial.take_output(), "hello\r\n");
        assert_eq!(serial.output(), "");
    }

    #[test]
    fn flush_marks_output_as_sent() {
        let mut serial = MockSerial::new();
        serial.write("abc");
        assert_eq!(serial.unflushed(), 3);

        embassy_futures::block_on(serial.flush());
        serial.write("d");
        assert_eq!(serial.unflushed(), 1);
        assert_eq!(serial.flushes(), 1);
        assert_eq!(serial.output(), "abcd");
    }

    #[test]
    fn actuator_through_a_mutable_reference() {
        fn drive<A: ActuatorDriver>(mut driver: A) {
            driver.setup(1600);
            driver.set_channel_b(300);
        }

        let mut actuator = MockActuator::new();
        drive(&mut actuator);
        assert_eq!(actuator.drive_period(), Some(1600));
        assert_eq!(actuator.channel_b(), 300);
        assert_eq!(actuator.writes(), 1);
    }
}
