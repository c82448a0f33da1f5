//! Voice assistant neuron for Sonos speakers
//!
//! Groups discovered zones and user-defined aliases into rooms, plays Sonos
//! favorites picked by fuzzy name match and forwards transport commands to
//! each room's coordinator.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use sonos_neuron::{InMemoryVariables, Invocation, Neuron, UpnpController};
//!
//! let controller = UpnpController::new(Duration::from_secs(3));
//! let mut neuron = Neuron::new(controller, InMemoryVariables::new());
//!
//! neuron.run(&Invocation::new("init").room("Living").ipv4("192.168.1.10"))?;
//! neuron.run(&Invocation::new("play").room("Kitchen").item("jazz radio"))?;
//! # Ok::<(), sonos_neuron::NeuronError>(())
//! ```

pub mod action;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod neuron;
pub mod session;
pub mod similarity;
pub mod variables;

pub use action::{Action, Invocation};
pub use config::{CoordinatorPolicy, NeuronConfig, RoomConfig};
pub use controller::{ControlError, Controller, Device, Group, UpnpController};
pub use error::{ConfigError, NeuronError, Result};
pub use neuron::{Neuron, Outcome};
pub use session::{Session, SyncReport};
pub use variables::{InMemoryVariables, Lookup, VariableStore};
