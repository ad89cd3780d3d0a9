use std::path::PathBuf;

use crate::{
    Credential, CredentialExchanger, ExchangeConfig, ExchangeMethod,
    Exchanger, InteractiveExchanger, Result, Role, RunOptions,
    SharedMediumExchanger, StdioExchanger,
};

/// Picks the exchanger named by the configuration and runs it for one role.
#[derive(Clone, Debug, Default)]
pub struct Handshake {
    config: ExchangeConfig,
}

impl Handshake {
    pub fn new(config: ExchangeConfig) -> Self {
        Self { config }
    }

    /// Shared-medium handshake through an explicit file.
    pub fn loopback(file_path: impl Into<PathBuf>) -> Self {
        Self::new(ExchangeConfig::shared_medium(Some(file_path.into())))
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Build the exchanger for `role`, wired to stdin/stdout when the
    /// method is interactive.
    pub fn exchanger(&self, credential: Credential, role: Role) -> Exchanger {
        match &self.config.method {
            ExchangeMethod::Interactive => Exchanger::Interactive(
                StdioExchanger::stdio(credential, role.is_join()),
            ),
            ExchangeMethod::SharedMedium { file_path } => {
                self.shared_medium(credential, role, file_path.clone())
            }
        }
    }

    /// Like [`Handshake::exchanger`], with the interactive channel bound
    /// to the given reader and writer.
    pub fn exchanger_with_io<R, W>(
        &self,
        credential: Credential,
        role: Role,
        input: R,
        output: W,
    ) -> Exchanger<R, W>
    where
        R: std::io::BufRead,
        W: std::io::Write,
    {
        match &self.config.method {
            ExchangeMethod::Interactive => {
                Exchanger::Interactive(InteractiveExchanger::new(
                    credential,
                    role.is_join(),
                    input,
                    output,
                ))
            }
            ExchangeMethod::SharedMedium { file_path } => {
                self.shared_medium(credential, role, file_path.clone())
            }
        }
    }

    /// Run the handshake and return the peer's credential.
    pub fn run(
        &self,
        credential: Credential,
        role: Role,
        options: &RunOptions,
    ) -> Result<Credential> {
        log::info!(
            "starting {} handshake via {:?}",
            role,
            self.config.method
        );
        self.exchanger(credential, role).run(options)
    }

    fn shared_medium<R, W>(
        &self,
        credential: Credential,
        role: Role,
        file_path: Option<PathBuf>,
    ) -> Exchanger<R, W> {
        Exchanger::SharedMedium(
            SharedMediumExchanger::new(credential, role.is_join(), file_path)
                .with_poll(self.config.poll),
        )
    }
}
