//! duet-services — the pairing broker.
//!
//! A [`Broker`] owns a waiting list, a pair registry and the participants
//! connected to it. The gateway hands it a [`ConnectionHandle`] per socket
//! and feeds it decoded client events; everything else happens inside.

pub mod broker;
pub mod handle;
mod matching;
pub mod participant;
pub mod policy;
pub mod registry;
mod relay;
pub mod state;
pub mod waiting;

pub use broker::{Broker, BrokerOptions, BrokerSnapshot, SessionInfo};
pub use handle::{ConnectionHandle, OUTBOUND_CAPACITY};
pub use participant::{normalize_name, ParticipantState, MAX_NAME_CHARS};
pub use policy::{AllowAll, BlockList, Candidate, PairingPolicy};
pub use registry::{PairRegistry, Session};
pub use state::{BrokerCounters, InvariantViolation};
pub use waiting::WaitingList;
