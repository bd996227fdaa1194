#![cfg_attr(not(any(test, feature = "mock")), no_std)]

/*
 * Control core of a two-motor steering robot.
 *
 * An operator types single keys over a serial link; a low-priority user
 * interface task turns them into steering commands, one single-slot channel
 * per motor; two higher-priority motor tasks poll their channel every period
 * and drive an H-bridge. Everything in this crate is independent of the board
 * except `board`, which only exists with the `stm32` feature.
 */

pub mod logging;

pub mod command;
pub mod config;
pub mod io;
pub mod motor;
pub mod runtime;
pub mod shared;
pub mod user_interface;

#[cfg(feature = "stm32")]
pub mod board;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(test)]
mod scenarios;

pub use command::Command;
pub use motor::{MotorState, MotorTask};
pub use runtime::{Priority, Runtime, Task};
pub use shared::SharedValue;
pub use user_interface::{UiState, UserInterfaceTask};
