//! Transport strategies for swapping credentials with a peer.
//!
//! Every strategy implements [`CredentialExchanger`]: it is built with the
//! local credential and a role, and `run` hands back the peer's credential.
//! [`Exchanger`] bundles the strategies shipped with this crate so callers
//! can pick one from configuration.

mod interactive;
mod shared_medium;

use std::io::{BufRead, Write};

pub use interactive::{InteractiveExchanger, StdioExchanger};
pub use shared_medium::SharedMediumExchanger;

use crate::{CancelToken, Credential, Result, Role};

/// Options for one `run` call.
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
    /// Server id the caller already holds. Only the interactive joining
    /// side uses it.
    pub server_id: Option<Credential>,
    pub cancel: CancelToken,
}

impl RunOptions {
    pub fn with_server_id(mut self, server_id: Credential) -> Self {
        self.server_id = Some(server_id);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

pub trait CredentialExchanger {
    fn credential(&self) -> &Credential;

    fn role(&self) -> Role;

    /// Block until the peer's credential is known.
    fn run(&mut self, options: &RunOptions) -> Result<Credential>;

    /// Like [`CredentialExchanger::run`], but reports failure as an empty
    /// string.
    fn run_or_empty(&mut self, options: &RunOptions) -> String {
        match self.run(options) {
            Ok(peer) => peer.into_string(),
            Err(e) if e.is_wait_aborted() => {
                log::warn!("{} exchange gave up: {}", self.role(), e);
                String::new()
            }
            Err(e) => {
                log::error!("{} exchange failed: {}", self.role(), e);
                String::new()
            }
        }
    }
}

/// The exchangers this crate provides, selected at runtime.
pub enum Exchanger<R = std::io::StdinLock<'static>, W = std::io::Stdout> {
    Interactive(InteractiveExchanger<R, W>),
    SharedMedium(SharedMediumExchanger),
}

impl<R: BufRead, W: Write> CredentialExchanger for Exchanger<R, W> {
    fn credential(&self) -> &Credential {
        match self {
            Exchanger::Interactive(inner) => inner.credential(),
            Exchanger::SharedMedium(inner) => inner.credential(),
        }
    }

    fn role(&self) -> Role {
        match self {
            Exchanger::Interactive(inner) => inner.role(),
            Exchanger::SharedMedium(inner) => inner.role(),
        }
    }

    fn run(&mut self, options: &RunOptions) -> Result<Credential> {
        match self {
            Exchanger::Interactive(inner) => inner.run(options),
            Exchanger::SharedMedium(inner) => inner.run(options),
        }
    }
}

impl<R, W> From<InteractiveExchanger<R, W>> for Exchanger<R, W> {
    fn from(inner: InteractiveExchanger<R, W>) -> Self {
        Exchanger::Interactive(inner)
    }
}

impl<R, W> From<SharedMediumExchanger> for Exchanger<R, W> {
    fn from(inner: SharedMediumExchanger) -> Self {
        Exchanger::SharedMedium(inner)
    }
}
