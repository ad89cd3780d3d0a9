use std::path::PathBuf;

use super::{CredentialExchanger, RunOptions};
use crate::poll::poll_until;
use crate::{
    Credential, ExchangeRecord, PollConfig, Result, Role, SharedMedium,
};

/// Swaps credentials through a JSON record both sides poll.
///
/// The server announces itself by overwriting the record with its id and
/// waits for a `client_id` to appear. The client waits for a record that
/// carries a `server_id` and no `client_id` yet, adds its own id and writes
/// the record back.
///
/// Reading or writing the medium fails fast: only "nothing there yet" is
/// retried. Two handshakes sharing one path will interfere with each other.
pub struct SharedMediumExchanger {
    credential: Credential,
    role: Role,
    medium: SharedMedium,
    poll: PollConfig,
}

impl SharedMediumExchanger {
    /// `file_path` defaults to the loopback file in the temp directory.
    pub fn new(
        credential: Credential,
        join: bool,
        file_path: Option<PathBuf>,
    ) -> Self {
        let medium = file_path.map(SharedMedium::new).unwrap_or_default();
        Self::with_medium(credential, Role::from_join(join), medium)
    }

    pub fn with_medium(
        credential: Credential,
        role: Role,
        medium: SharedMedium,
    ) -> Self {
        Self {
            credential,
            role,
            medium,
            poll: PollConfig::default(),
        }
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn medium(&self) -> &SharedMedium {
        &self.medium
    }

    fn server_exchange(&self, options: &RunOptions) -> Result<Credential> {
        log::info!(
            "waiting for a partner to join through {} \
             (sy.join_duet(loopback=True))",
            self.medium.path().display()
        );

        self.medium
            .write(&ExchangeRecord::announce(self.credential.clone()))?;
        log::info!("announced server id {}", self.credential);

        // The record is ours from here on; losing the file is fatal.
        let client_id = poll_until(&self.poll, &options.cancel, || {
            Ok(self.medium.read_published()?.client_id)
        })?;
        log::info!("partner joined with client id {client_id}");
        Ok(client_id)
    }

    fn client_exchange(&self, options: &RunOptions) -> Result<Credential> {
        let (server_id, record) =
            poll_until(&self.poll, &options.cancel, || {
                let Some(record) = self.medium.read()? else {
                    return Ok(None);
                };
                if record.is_complete() {
                    log::trace!("skipping record of a finished handshake");
                }
                if !record.is_awaiting_client() {
                    return Ok(None);
                }
                Ok(record.server_id.clone().map(|id| (id, record)))
            })?;
        log::info!("found server id {server_id}");

        self.medium
            .write(&record.with_client(self.credential.clone()))?;
        log::info!("answered with client id {}", self.credential);
        Ok(server_id)
    }
}

impl CredentialExchanger for SharedMediumExchanger {
    fn credential(&self) -> &Credential {
        &self.credential
    }

    fn role(&self) -> Role {
        self.role
    }

    fn run(&mut self, options: &RunOptions) -> Result<Credential> {
        self.poll.validate()?;
        match self.role {
            Role::Server => self.server_exchange(options),
            Role::Client => self.client_exchange(options),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medium::LOOPBACK_FILENAME;
    use crate::{initialize, CancelToken, ExchangeError};
    use std::fs;
    use std::time::Duration;
    use tempdir::TempDir;

    fn cred(s: &str) -> Credential {
        Credential::new(s).unwrap()
    }

    fn quick() -> PollConfig {
        PollConfig::default()
            .with_interval(Duration::from_millis(2))
            .with_timeout(Duration::from_millis(100))
    }

    #[test]
    fn server_overwrites_stale_record() {
        initialize();
        let dir = TempDir::new("server_overwrite").unwrap();
        let path = dir.path().join(LOOPBACK_FILENAME);
        fs::write(
            &path,
            r#"{"server_id":"old","client_id":"older","note":"keep?"}"#,
        )
        .unwrap();

        let mut server =
            SharedMediumExchanger::new(cred("A"), false, Some(path.clone()))
                .with_poll(quick());
        // The stale client_id must not be mistaken for an answer.
        let result = server.run(&RunOptions::default());
        assert!(matches!(result, Err(ExchangeError::Timeout { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"server_id":"A"}"#);
    }

    #[test]
    fn client_ignores_complete_record() {
        initialize();
        let dir = TempDir::new("client_stale").unwrap();
        let path = dir.path().join(LOOPBACK_FILENAME);
        let stale = r#"{"server_id":"S0","client_id":"C0"}"#;
        fs::write(&path, stale).unwrap();

        let mut client =
            SharedMediumExchanger::new(cred("B"), true, Some(path.clone()))
                .with_poll(quick());
        let result = client.run(&RunOptions::default());
        assert!(matches!(result, Err(ExchangeError::Timeout { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), stale);
    }

    #[test]
    fn client_merges_into_fresh_record() {
        initialize();
        let dir = TempDir::new("client_merge").unwrap();
        let path = dir.path().join(LOOPBACK_FILENAME);
        fs::write(&path, r#"{"server_id":"S1","extra":true}"#).unwrap();

        let mut client =
            SharedMediumExchanger::new(cred("C1"), true, Some(path.clone()))
                .with_poll(quick());
        assert_eq!(client.run(&RunOptions::default()).unwrap(), cred("S1"));

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            written,
            serde_json::json!({"server_id": "S1", "client_id": "C1", "extra": true})
        );
    }

    #[test]
    fn client_waits_for_missing_file() {
        initialize();
        let dir = TempDir::new("client_missing").unwrap();
        let path = dir.path().join(LOOPBACK_FILENAME);
        let mut client =
            SharedMediumExchanger::new(cred("C"), true, Some(path))
                .with_poll(quick());
        assert!(matches!(
            client.run(&RunOptions::default()),
            Err(ExchangeError::Timeout { .. })
        ));
    }

    #[test]
    fn corrupt_record_aborts_without_retry() {
        initialize();
        let dir = TempDir::new("corrupt").unwrap();
        let path = dir.path().join(LOOPBACK_FILENAME);
        fs::write(&path, "not json").unwrap();

        let mut client = SharedMediumExchanger::new(
            cred("C"),
            true,
            Some(path.clone()),
        )
        .with_poll(PollConfig::default());
        assert!(matches!(
            client.run(&RunOptions::default()),
            Err(ExchangeError::MediumUnavailable { .. })
        ));
        assert_eq!(client.run_or_empty(&RunOptions::default()), "");
    }

    #[test]
    fn cancel_stops_server() {
        initialize();
        let dir = TempDir::new("cancel").unwrap();
        let path = dir.path().join(LOOPBACK_FILENAME);
        let cancel = CancelToken::new();
        let options = RunOptions::default().with_cancel(cancel.clone());

        let handle = std::thread::spawn(move || {
            let mut server =
                SharedMediumExchanger::new(cred("S"), false, Some(path));
            server.run(&options)
        });
        std::thread::sleep(Duration::from_millis(30));
        cancel.cancel();
        assert!(matches!(
            handle.join().unwrap(),
            Err(ExchangeError::Cancelled)
        ));
    }

    fn spawn_server(
        path: PathBuf,
    ) -> std::thread::JoinHandle<Result<Credential>> {
        std::thread::spawn(move || {
            SharedMediumExchanger::new(cred("A"), false, Some(path))
                .with_poll(
                    PollConfig::default()
                        .with_interval(Duration::from_millis(2))
                        .with_timeout(Duration::from_secs(2)),
                )
                .run(&RunOptions::default())
        })
    }

    fn wait_for_announce(path: &std::path::Path) {
        let started = std::time::Instant::now();
        while fs::read_to_string(path).ok().as_deref()
            != Some(r#"{"server_id":"A"}"#)
        {
            assert!(started.elapsed() < Duration::from_secs(2));
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn server_fails_fast_when_record_is_removed() {
        initialize();
        let dir = TempDir::new("server_lost_record").unwrap();
        let path = dir.path().join(LOOPBACK_FILENAME);

        let handle = spawn_server(path.clone());
        wait_for_announce(&path);
        fs::remove_file(&path).unwrap();

        let result = handle.join().unwrap();
        assert!(
            matches!(
                result,
                Err(ExchangeError::MediumUnavailable {
                    source: crate::MediumError::Io(_),
                    ..
                })
            ),
            "got {result:?}"
        );
        assert!(dir.path().is_dir());
    }

    #[test]
    fn server_keeps_waiting_on_blank_client_id() {
        initialize();
        let dir = TempDir::new("server_blank_client").unwrap();
        let path = dir.path().join(LOOPBACK_FILENAME);

        let handle = spawn_server(path.clone());
        wait_for_announce(&path);
        fs::write(&path, r#"{"server_id":"A","client_id":""}"#).unwrap();

        let result = handle.join().unwrap();
        assert!(
            matches!(result, Err(ExchangeError::Timeout { .. })),
            "got {result:?}"
        );
    }

    #[test]
    fn client_keeps_waiting_on_blank_server_id() {
        initialize();
        let dir = TempDir::new("client_blank_server").unwrap();
        let path = dir.path().join(LOOPBACK_FILENAME);
        fs::write(&path, r#"{"server_id":""}"#).unwrap();

        let mut client =
            SharedMediumExchanger::new(cred("C"), true, Some(path.clone()))
                .with_poll(quick());
        assert!(matches!(
            client.run(&RunOptions::default()),
            Err(ExchangeError::Timeout { .. })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"{"server_id":""}"#);
    }

    #[test]
    fn invalid_poll_config_is_rejected() {
        let dir = TempDir::new("bad_poll").unwrap();
        let mut server = SharedMediumExchanger::new(
            cred("S"),
            false,
            Some(dir.path().join(LOOPBACK_FILENAME)),
        )
        .with_poll(PollConfig::default().with_interval(Duration::ZERO));
        assert!(matches!(
            server.run(&RunOptions::default()),
            Err(ExchangeError::Config(_))
        ));
        assert!(!dir.path().join(LOOPBACK_FILENAME).exists());
    }
}
