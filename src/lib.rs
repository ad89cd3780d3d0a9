//! Rendezvous handshake for two peers that cannot address each other yet.
//!
//! A server and a client each hold an opaque [`Credential`] and need the
//! other's before opening a direct connection. The handshake is carried by
//! an exchange strategy implementing [`CredentialExchanger`]: an operator
//! relaying ids on the terminal, or a JSON record on a shared file that
//! both sides poll.
//!
//! ```no_run
//! use duet_rendezvous::{Credential, Handshake, Role, RunOptions};
//!
//! let handshake = Handshake::default();
//! let peer = handshake
//!     .run(Credential::generate(), Role::Server, &RunOptions::default())
//!     .unwrap();
//! println!("client id: {peer}");
//! ```
#![deny(clippy::all)]

pub mod errors;
pub use errors::{ExchangeError, MediumError, Result};

mod cancel;
mod config;
mod credential;
pub mod exchanger;
mod handshake;
pub mod medium;
mod poll;
mod record;

pub use cancel::CancelToken;
pub use config::{
    Backoff, ExchangeConfig, ExchangeMethod, PollConfig, DEFAULT_POLL_INTERVAL,
};
pub use credential::{Credential, Role, CREDENTIAL_LEN};
pub use exchanger::{
    CredentialExchanger, Exchanger, InteractiveExchanger, RunOptions,
    SharedMediumExchanger, StdioExchanger,
};
pub use handshake::Handshake;
pub use medium::{SharedMedium, LOOPBACK_FILENAME};
pub use record::ExchangeRecord;

use std::sync::Once;

pub static INIT: Once = Once::new();

/// Install `env_logger` once per process. Later calls do nothing.
pub fn initialize() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(cfg!(test)).try_init();
        log::info!("Initializing duet-rendezvous");
    });
}
