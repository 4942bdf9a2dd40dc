//! # Relay Flows
//!
//! A vote travels from a vote-listing client through the protocol codec and
//! the forwarding source to the backend servers, or into the cache and back
//! out again by replay.
//!
//! ```text
//! client ──frame──→ RelayRuntime ──forward──→ lobby, survival
//!                                    │ unreachable
//!                                    ▼
//!                               vote cache ──on_server_connect──→ replay
//! ```

#[cfg(test)]
mod tests {
    use crate::fixtures::{vote, TestRelay, DEFAULT_TOKEN, SERVICE, SERVICE_TOKEN};
    use shared_types::Vote;
    use std::time::Duration;
    use vr_03_vote_cache::VoteCache;

    // =========================================================================
    // PROTOCOL → FORWARDING
    // =========================================================================

    #[tokio::test]
    async fn test_token_vote_reaches_every_backend() {
        let relay = TestRelay::start(&["lobby", "survival"]);
        let sent = vote("alice", "1700000000");

        let (result, ack) = relay.send_token_vote(&sent, SERVICE_TOKEN).await;

        assert_eq!(result.unwrap(), sent);
        assert_eq!(ack, "{\"status\":\"ok\"}\r\n");
        assert_eq!(relay.network.delivered_votes("lobby"), [sent.clone()]);
        assert_eq!(relay.network.delivered_votes("survival"), [sent]);
    }

    #[tokio::test]
    async fn test_legacy_vote_reaches_every_backend() {
        let relay = TestRelay::start(&["lobby"]);
        let sent = vote("bob", "1700000001");

        let received = relay.send_legacy_vote(&sent).await.unwrap();

        assert_eq!(received, sent);
        assert_eq!(relay.network.delivered_votes("lobby"), [sent]);
    }

    #[tokio::test]
    async fn test_unlisted_service_uses_default_token() {
        let relay = TestRelay::start(&["lobby"]);
        let sent = Vote::new("SmallSite", "carol", "198.51.100.9", "1700000002");

        let (result, ack) = relay.send_token_vote(&sent, DEFAULT_TOKEN).await;

        assert_eq!(result.unwrap(), sent);
        assert!(ack.contains("\"ok\""));
    }

    #[tokio::test]
    async fn test_listed_service_cannot_use_default_token() {
        let relay = TestRelay::start(&["lobby"]);

        let (result, ack) = relay
            .send_token_vote(&vote("mallory", "1"), DEFAULT_TOKEN)
            .await;

        assert!(result.is_err());
        assert!(ack.contains("IntegrityFailure"));
        assert!(relay.network.delivered_votes("lobby").is_empty());
    }

    // =========================================================================
    // CACHING AND REPLAY
    // =========================================================================

    #[tokio::test]
    async fn test_unreachable_backend_gets_vote_on_reconnect() {
        let relay = TestRelay::start(&["lobby", "survival"]);
        relay.network.set_down("survival", true);
        let sent = vote("alice", "1700000000");

        relay.send_token_vote(&sent, SERVICE_TOKEN).await.0.unwrap();

        assert_eq!(relay.network.delivered_votes("lobby"), [sent.clone()]);
        assert!(relay.network.delivered_votes("survival").is_empty());

        relay.network.set_down("survival", false);
        relay.runtime.forwarding().on_server_connect("survival");
        relay.scheduler.run_all();

        assert_eq!(relay.network.delivered_votes("survival"), [sent.clone()]);
        // lobby got its copy exactly once
        assert_eq!(relay.network.delivered_votes("lobby"), [sent]);
    }

    #[tokio::test]
    async fn test_backlog_replays_in_chunks_with_cool_downs() {
        let relay = TestRelay::start(&["lobby"]);
        relay.network.set_down("lobby", true);
        let mut sent = Vec::new();
        for i in 0..11 {
            let v = vote(&format!("user{}", i), &i.to_string());
            relay.send_token_vote(&v, SERVICE_TOKEN).await.0.unwrap();
            sent.push(v);
        }

        relay.network.set_down("lobby", false);
        relay.runtime.forwarding().on_server_connect("lobby");
        assert_eq!(relay.scheduler.run_all(), 3);

        let sizes: Vec<usize> = relay
            .network
            .delivered("lobby")
            .iter()
            .map(Vec::len)
            .collect();
        assert_eq!(sizes, [5, 5, 1]);
        assert_eq!(relay.network.delivered_votes("lobby"), sent);
        assert_eq!(
            relay.scheduler.delays(),
            [
                Duration::from_secs(3),
                Duration::from_secs(1),
                Duration::from_secs(1)
            ]
        );
    }

    #[tokio::test]
    async fn test_flapping_backend_keeps_order_across_attempts() {
        let relay = TestRelay::start_with(&["lobby"], |c| c.forwarding.dump_rate = 2);
        relay.network.set_down("lobby", true);
        let sent: Vec<Vote> = (0..5).map(|i| vote(&format!("u{}", i), "1")).collect();
        for v in &sent {
            relay.send_token_vote(v, SERVICE_TOKEN).await.0.unwrap();
        }
        let cache = relay.runtime.cache().unwrap();

        // First replay: one chunk in, then the server drops again.
        relay.network.set_down("lobby", false);
        relay.network.script("lobby", [true, false]);
        relay.runtime.forwarding().on_server_connect("lobby");
        relay.scheduler.run_all();
        assert_eq!(cache.pending(&shared_types::CacheKey::Server("lobby".into())), 3);

        // Second replay drains the rest.
        relay.runtime.forwarding().on_server_connect("lobby");
        relay.scheduler.run_all();

        assert_eq!(relay.network.delivered_votes("lobby"), sent);
    }

    #[tokio::test]
    async fn test_player_votes_replay_oldest_first_on_switch() {
        let relay = TestRelay::start(&["lobby", "survival"]);
        let forwarding = relay.runtime.forwarding();
        for ts in ["1700000300", "1700000100", "1700000200"] {
            assert!(forwarding.cache_for_player(&vote("alice", ts), "alice"));
        }

        forwarding.handle_player_switch("survival", "alice");
        relay.scheduler.run_all();

        let order: Vec<String> = relay
            .network
            .delivered_votes("survival")
            .into_iter()
            .map(|v| v.timestamp)
            .collect();
        assert_eq!(order, ["1700000100", "1700000200", "1700000300"]);
        assert!(relay.network.delivered_votes("lobby").is_empty());
    }

    #[tokio::test]
    async fn test_filtered_backend_never_sees_votes() {
        let relay = TestRelay::start_with(&["lobby", "hub"], |c| {
            c.forwarding.server_filter = Some(relay_runtime::container::ServerFilterConfig {
                servers: vec!["hub".to_string()],
                whitelist: false,
            });
        });
        relay.network.set_down("hub", true);

        relay
            .send_token_vote(&vote("alice", "1"), SERVICE_TOKEN)
            .await
            .0
            .unwrap();
        relay.runtime.forwarding().on_server_connect("hub");

        assert_eq!(relay.network.attempts("hub"), 0);
        assert_eq!(relay.scheduler.pending(), 0);
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    #[tokio::test]
    async fn test_cached_votes_survive_restart() {
        let relay = TestRelay::start(&["lobby"]);
        relay.network.set_down("lobby", true);
        let sent = vote("alice", "1700000000");
        relay.send_token_vote(&sent, SERVICE_TOKEN).await.0.unwrap();
        relay
            .runtime
            .forwarding()
            .cache_for_player(&vote("bob", "1700000001"), "bob");

        let relay = relay.restart();
        relay.network.set_down("lobby", false);
        relay.runtime.forwarding().on_server_connect("lobby");
        relay.runtime.forwarding().handle_player_switch("lobby", "bob");
        relay.scheduler.run_all();

        assert_eq!(
            relay.network.delivered_votes("lobby"),
            [sent, vote("bob", "1700000001")]
        );
    }

    #[tokio::test]
    async fn test_interrupted_replay_is_saved_at_shutdown() {
        let relay = TestRelay::start(&["lobby"]);
        relay.network.set_down("lobby", true);
        relay
            .send_token_vote(&vote("alice", "1"), SERVICE_TOKEN)
            .await
            .0
            .unwrap();

        relay.network.set_down("lobby", false);
        relay.runtime.forwarding().on_server_connect("lobby");
        // Scheduler stops before the first chunk goes out.
        relay.scheduler.discard_all();

        let relay = relay.restart();
        relay.runtime.forwarding().on_server_connect("lobby");
        relay.scheduler.run_all();

        assert_eq!(relay.network.delivered_votes("lobby"), [vote("alice", "1")]);
    }

    #[tokio::test]
    async fn test_service_name_is_preserved() {
        let relay = TestRelay::start(&["lobby"]);
        relay
            .send_token_vote(&vote("alice", "1"), SERVICE_TOKEN)
            .await
            .0
            .unwrap();
        assert_eq!(relay.network.delivered_votes("lobby")[0].service_name, SERVICE);
    }
}
