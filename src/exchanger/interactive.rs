use std::io::{self, BufRead, Write};

use super::{CredentialExchanger, RunOptions};
use crate::{Credential, ExchangeError, Result, Role};

const MARK: &str = "♫♫♫ >";

pub type StdioExchanger =
    InteractiveExchanger<io::StdinLock<'static>, io::Stdout>;

/// Relays credentials through a human operator.
///
/// The server prints its id and then prompts until the operator types a
/// 32-character client id. The joining side only prints its own id: the
/// server id has to reach it some other way and is taken from
/// [`RunOptions::server_id`].
pub struct InteractiveExchanger<R, W> {
    credential: Credential,
    role: Role,
    input: R,
    output: W,
}

impl StdioExchanger {
    pub fn stdio(credential: Credential, join: bool) -> Self {
        Self::new(credential, join, io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> InteractiveExchanger<R, W> {
    pub fn new(credential: Credential, join: bool, input: R, output: W) -> Self {
        Self {
            credential,
            role: Role::from_join(join),
            input,
            output,
        }
    }

    pub fn into_parts(self) -> (R, W) {
        (self.input, self.output)
    }

    fn server_exchange(&mut self, options: &RunOptions) -> Result<Credential> {
        let out = &mut self.output;
        writeln!(out, "{MARK} Duet Server ID: {}", self.credential)?;
        writeln!(out)?;
        writeln!(
            out,
            "{MARK} STEP 1: Send the following code to your Duet Partner!"
        )?;
        writeln!(out)?;
        writeln!(out, "import syft as sy")?;
        writeln!(out, "duet = sy.duet(\"{}\")", self.credential)?;
        writeln!(out)?;
        writeln!(
            out,
            "{MARK} STEP 2: Have your duet partner send their Client ID to \
             you and enter it below!"
        )?;

        let mut line = String::new();
        loop {
            if options.cancel.is_cancelled() {
                return Err(ExchangeError::Cancelled);
            }
            write!(self.output, "{MARK} Duet Partner's Client ID: ")?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Err(ExchangeError::InputClosed);
            }
            let candidate = strip_line_ending(&line);
            if Credential::is_interactive_token(candidate) {
                writeln!(self.output)?;
                return Credential::new(candidate);
            }
            log::debug!(
                "rejected client id of {} chars",
                candidate.chars().count()
            );
            writeln!(
                self.output,
                "    > Error: Invalid Client ID. Please try again."
            )?;
        }
    }

    fn client_exchange(&mut self, options: &RunOptions) -> Result<Credential> {
        let out = &mut self.output;
        writeln!(
            out,
            "{MARK} STEP 1: Send the following Duet Client ID to your duet \
             partner!"
        )?;
        writeln!(out, "{MARK} Duet Client ID: {}", self.credential)?;
        writeln!(out)?;
        writeln!(out, "{MARK} ...waiting for partner to connect...")?;
        out.flush()?;

        options
            .server_id
            .clone()
            .ok_or(ExchangeError::MissingServerId)
    }
}

impl<R: BufRead, W: Write> CredentialExchanger for InteractiveExchanger<R, W> {
    fn credential(&self) -> &Credential {
        &self.credential
    }

    fn role(&self) -> Role {
        self.role
    }

    fn run(&mut self, options: &RunOptions) -> Result<Credential> {
        match self.role {
            Role::Server => self.server_exchange(options),
            Role::Client => self.client_exchange(options),
        }
    }
}

fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
