//
// SPDX-License-Identifier: MIT
//

pub mod backlog;
pub mod connection;
pub mod delta;
pub mod engine;
pub mod fsm;
pub mod notifier;

pub use connection::Connection;
pub use delta::DeltaProducer;
pub use engine::Session;
pub use notifier::HelperProcessNotifier;
