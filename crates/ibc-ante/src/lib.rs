//! Transaction admission stages for IBC packet relaying.
//!
//! The main export is [`RedundancyDecorator`], an ante stage that rejects
//! transactions during `CheckTx`/`ReCheckTx` when every packet-relay message
//! they carry has already been settled on chain. Packet handlers are reached
//! through the [`HandlerInvoker`] seam and run against the cache-wrapped
//! [`Context`] of the admission attempt, so nothing they write survives the
//! check.
mod error;
pub use error::{
    AnteError,
    ConfigError,
    HandlerError,
    ParamsError,
    Result,
};

pub mod ante;
pub use ante::{
    AnteChain,
    AnteChainBuilder,
    AnteDecorator,
    Next,
};

pub mod config;
pub use config::AnteConfig;

pub mod context;
pub use context::{
    Context,
    ExecMode,
};

pub mod keeper;
pub use keeper::{
    HandlerInvoker,
    StoreKeeper,
};

pub mod params;
pub use params::Params;

pub mod primitives;

pub mod redundancy;
pub use redundancy::{
    RedundancyCounter,
    RedundancyDecorator,
};

pub mod store;

mod metrics;

#[cfg(any(test, feature = "test"))]
pub mod test_utils;
