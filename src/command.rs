/*
 * The steering command the user interface hands to a motor task.
 *
 * On the wire between tasks it is a single byte; anything outside the known
 * ordinals reads as neutral, so a motor never acts on a value it does not
 * understand.
 */

use enum_ordinalize::Ordinalize;

#[derive(Ordinalize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    #[default]
    Neutral = 0,
    SteerPort = 1,
    SteerStarboard = 2,
}

impl Command {
    pub fn from_byte(byte: u8) -> Self {
        Command::from_ordinal(byte).unwrap_or(Command::Neutral)
    }

    pub fn as_byte(self) -> u8 {
        self.ordinal()
    }
}

impl From<u8> for Command {
    fn from(byte: u8) -> Self {
        Command::from_byte(byte)
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> Self {
        command.as_byte()
    }
}
