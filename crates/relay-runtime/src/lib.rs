//! # Relay Runtime
//!
//! Wires the subsystems into a running vote relay. The host owns the
//! listener and the backend transport; the runtime owns everything between
//! them.
//!
//! ## Startup Order
//!
//! ```text
//! 1. RelayConfig::validate
//! 2. Key Store (1)       load or generate the RSA pair, register tokens
//! 3. Vote Cache (3)      load the cache file, drop expired votes
//! 4. Forwarding (4)      filter, dump rate, scheduler
//! 5. Protocol (2)        codec over the key store handle
//! ```
//!
//! ## Host Hooks
//!
//! | Event | Call |
//! |-------|------|
//! | Inbound connection | [`RelayRuntime::serve_connection`] |
//! | Backend server connected | `forwarding().on_server_connect(server)` |
//! | Player joined a server | `forwarding().handle_player_switch(server, player)` |
//! | Vote for an offline player | `forwarding().cache_for_player(vote, player)` |
//! | Key rotation | [`RelayRuntime::reload_keys`] |
//! | Shutdown | [`RelayRuntime::shutdown`] |

pub mod adapters;
pub mod container;
pub mod errors;

pub use adapters::ForwardingReceiver;
pub use container::{ConfigError, RelayConfig};
pub use errors::RuntimeError;

use anyhow::Context;
use shared_types::Vote;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, instrument, warn};
use vote_telemetry::{encode_metrics, sync_counter, TelemetryError, CACHE_PENDING, VOTES_REPLAYED};
use vr_01_key_store::{adapters::load_or_generate, KeyStore, KeyStoreHandle, DEFAULT_TOKEN_NAME};
use vr_02_vote_protocol::{handle_connection, ConnectionError, ConnectionSettings, VoteCodec};
use vr_03_vote_cache::{JsonFileStore, MemoryVoteCache, SystemTimeSource, VoteCache};
use vr_04_vote_forwarding::{ConsumerNetwork, ForwardingService, Scheduler, TokioScheduler};

use crate::container::{CacheConfig, ProtocolConfig};
use shared_crypto::TokenKey;

/// A configured, running vote relay.
pub struct RelayRuntime {
    config: RelayConfig,
    keys: KeyStoreHandle,
    codec: VoteCodec,
    cache: Option<Arc<MemoryVoteCache>>,
    forwarding: Arc<ForwardingService>,
    receiver: ForwardingReceiver,
    settings: ConnectionSettings,
}

impl RelayRuntime {
    /// Build every subsystem from `config`.
    #[instrument(name = "relay_start", skip_all)]
    pub fn start(
        config: RelayConfig,
        network: Arc<dyn ConsumerNetwork>,
        scheduler: Arc<dyn Scheduler>,
    ) -> anyhow::Result<Self> {
        config
            .validate()
            .map_err(RuntimeError::from)
            .context("invalid relay configuration")?;

        let store = build_key_store(&config.protocol, None).with_context(|| {
            format!(
                "failed to load protocol keys from {}",
                config.protocol.key_dir.display()
            )
        })?;
        let keys = KeyStoreHandle::new(store);

        let cache = open_cache(&config.cache).context("failed to open vote cache")?;
        let forwarding = ForwardingService::new(
            network,
            scheduler,
            cache.clone().map(|c| c as Arc<dyn VoteCache>),
            config.forwarding_config(),
        )
        .map_err(RuntimeError::from)
        .context("failed to start forwarding")?;
        let forwarding = Arc::new(forwarding);

        info!(
            dump_rate = config.forwarding.dump_rate,
            cache = cache.is_some(),
            "Vote relay started"
        );

        Ok(Self {
            settings: config.connection_settings(),
            codec: VoteCodec::new(keys.clone()),
            receiver: ForwardingReceiver::new(Arc::clone(&forwarding)),
            keys,
            cache,
            forwarding,
            config,
        })
    }

    /// [`start`](Self::start) with replays scheduled on the calling tokio
    /// runtime.
    pub fn start_on_current_runtime(
        config: RelayConfig,
        network: Arc<dyn ConsumerNetwork>,
    ) -> anyhow::Result<Self> {
        let scheduler = TokioScheduler::try_current().ok_or(RuntimeError::NoAsyncRuntime)?;
        Self::start(config, network, Arc::new(scheduler))
    }

    /// Serve one inbound connection: greet, decode one vote, forward it.
    pub async fn serve_connection<S>(
        &self,
        stream: S,
        remote_addr: &str,
    ) -> Result<Vote, ConnectionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        handle_connection(stream, remote_addr, &self.codec, &self.receiver, &self.settings).await
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn keys(&self) -> &KeyStoreHandle {
        &self.keys
    }

    pub fn forwarding(&self) -> &Arc<ForwardingService> {
        &self.forwarding
    }

    pub fn cache(&self) -> Option<&Arc<MemoryVoteCache>> {
        self.cache.as_ref()
    }

    /// Re-read the key directory and swap in a fresh key store.
    ///
    /// Connections already decoding keep the store they started with. A
    /// generated `default` token survives the reload.
    pub fn reload_keys(&self) -> anyhow::Result<()> {
        let previous = self.keys.snapshot();
        let store = build_key_store(&self.config.protocol, Some(previous.as_ref()))
            .context("failed to reload protocol keys")?;
        self.keys.replace(store);
        Ok(())
    }

    /// Current metrics in Prometheus text format.
    pub fn metrics_text(&self) -> Result<String, TelemetryError> {
        sync_counter(&VOTES_REPLAYED, self.forwarding.stats().replayed);
        if let Some(cache) = &self.cache {
            CACHE_PENDING.set(cache.snapshot().len() as i64);
        }
        encode_metrics()
    }

    /// Interrupt pending replays and save held votes. Votes a replay had not
    /// yet delivered go back to the cache before it is written.
    pub fn shutdown(&self) -> Result<(), RuntimeError> {
        self.forwarding.halt()?;
        info!("Vote relay stopped");
        Ok(())
    }
}

impl std::fmt::Debug for RelayRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayRuntime")
            .field("config", &self.config)
            .field("forwarding", &self.forwarding)
            .finish()
    }
}

fn build_key_store(
    protocol: &ProtocolConfig,
    previous: Option<&KeyStore>,
) -> Result<KeyStore, RuntimeError> {
    let pair = load_or_generate(&protocol.key_dir, protocol.key_bits)?;
    let mut tokens: HashMap<String, TokenKey> = protocol
        .tokens
        .iter()
        .map(|(name, token)| (name.clone(), TokenKey::from_token(token)))
        .collect();

    if !tokens.contains_key(DEFAULT_TOKEN_NAME) {
        if let Some(key) = previous.and_then(|p| p.lookup_token(DEFAULT_TOKEN_NAME).ok()) {
            tokens.insert(DEFAULT_TOKEN_NAME.to_string(), key.clone());
        }
    }

    let (store, generated) = KeyStore::new(pair, tokens).ensure_default_token();
    if let Some(token) = generated {
        warn!(
            token = %token,
            "No default token configured, generated one. Give it to vote-listing sites that use the token protocol"
        );
    }
    Ok(store)
}

fn open_cache(config: &CacheConfig) -> Result<Option<Arc<MemoryVoteCache>>, RuntimeError> {
    if !config.enabled {
        warn!("Vote cache disabled, votes for unreachable servers will be lost");
        return Ok(None);
    }
    let Some(path) = &config.file_path else {
        return Err(ConfigError::MissingCachePath.into());
    };
    let cache = MemoryVoteCache::open(
        Arc::new(JsonFileStore::new(path)),
        Arc::new(SystemTimeSource),
        config.ttl(),
    )?;
    Ok(Some(Arc::new(cache)))
}
