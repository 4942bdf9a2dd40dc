//! Shared setup for the suites: a relay on a temporary directory with a
//! recording backend network, and an in-memory vote-listing client.

use relay_runtime::{RelayConfig, RelayRuntime};
use shared_crypto::{LegacyKeyPair, TokenKey};
use shared_types::Vote;
use std::sync::{Arc, OnceLock};
use tempfile::TempDir;
use tokio::io::{duplex, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use vr_01_key_store::adapters::save_key_pair;
use vr_02_vote_protocol::{encode_legacy, encode_token, ConnectionError};
use vr_04_vote_forwarding::testing::{ManualScheduler, RecordingNetwork};

pub const SERVICE: &str = "TopList";
pub const SERVICE_TOKEN: &str = "toplist-secret";
pub const DEFAULT_TOKEN: &str = "default-secret";
pub const REMOTE: &str = "203.0.113.7:41000";

/// 1024-bit pair shared by every test; generating one per test is slow.
pub fn key_pair() -> &'static LegacyKeyPair {
    static PAIR: OnceLock<LegacyKeyPair> = OnceLock::new();
    PAIR.get_or_init(|| LegacyKeyPair::generate(1024).unwrap())
}

pub fn relay_config(dir: &std::path::Path) -> RelayConfig {
    let key_dir = dir.join("rsa");
    if !key_dir.exists() {
        save_key_pair(&key_dir, key_pair()).unwrap();
    }
    let mut config = RelayConfig::default();
    config.protocol.key_dir = key_dir;
    config.protocol.key_bits = 1024;
    config.protocol.read_timeout_ms = 200;
    config.protocol.tokens = [
        (SERVICE.to_string(), SERVICE_TOKEN.to_string()),
        ("default".to_string(), DEFAULT_TOKEN.to_string()),
    ]
    .into_iter()
    .collect();
    config.cache.file_path = Some(dir.join("cached-votes.json"));
    config
}

pub struct TestRelay {
    pub runtime: RelayRuntime,
    pub network: Arc<RecordingNetwork>,
    pub scheduler: Arc<ManualScheduler>,
    pub dir: TempDir,
}

impl TestRelay {
    pub fn start(servers: &[&str]) -> Self {
        Self::start_with(servers, |_| {})
    }

    pub fn start_with(servers: &[&str], adjust: impl FnOnce(&mut RelayConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = relay_config(dir.path());
        adjust(&mut config);
        let network = Arc::new(RecordingNetwork::new(servers.iter().copied()));
        let scheduler = Arc::new(ManualScheduler::new());
        let runtime = RelayRuntime::start(config, network.clone(), scheduler.clone()).unwrap();
        Self {
            runtime,
            network,
            scheduler,
            dir,
        }
    }

    /// Stop this relay and start a new one on the same directory and network.
    pub fn restart(self) -> Self {
        self.runtime.shutdown().unwrap();
        let config = self.runtime.config().clone();
        let scheduler = Arc::new(ManualScheduler::new());
        let runtime =
            RelayRuntime::start(config, self.network.clone(), scheduler.clone()).unwrap();
        Self {
            runtime,
            scheduler,
            ..self
        }
    }

    /// Connect, read the greeting, send whatever `build` makes of the
    /// challenge, and collect everything the relay writes back.
    pub async fn exchange(
        &self,
        build: impl FnOnce(&str) -> Vec<u8>,
    ) -> (Result<Vote, ConnectionError>, String) {
        let (client, server) = duplex(64 * 1024);

        let client_task = async move {
            let mut client = BufReader::new(client);
            let mut greeting = String::new();
            client.read_line(&mut greeting).await.unwrap();
            let challenge = challenge_from(&greeting);

            client.get_mut().write_all(&build(&challenge)).await.unwrap();

            let mut reply = Vec::new();
            client.read_to_end(&mut reply).await.unwrap();
            String::from_utf8(reply).unwrap()
        };

        tokio::join!(self.runtime.serve_connection(server, REMOTE), client_task)
    }

    pub async fn send_token_vote(
        &self,
        vote: &Vote,
        token: &str,
    ) -> (Result<Vote, ConnectionError>, String) {
        let key = TokenKey::from_token(token);
        self.exchange(|challenge| encode_token(vote, &key, challenge).unwrap())
            .await
    }

    pub async fn send_legacy_vote(&self, vote: &Vote) -> Result<Vote, ConnectionError> {
        let block = encode_legacy(vote, key_pair().public_key()).unwrap();
        self.exchange(move |_| block).await.0
    }
}

pub fn challenge_from(greeting: &str) -> String {
    greeting
        .trim_end()
        .strip_prefix("VOTIFIER 2 ")
        .unwrap()
        .to_string()
}

pub fn vote(user: &str, timestamp: &str) -> Vote {
    Vote::new(SERVICE, user, "198.51.100.4", timestamp)
}
