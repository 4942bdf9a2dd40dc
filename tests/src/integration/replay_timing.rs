//! # Replay Timing
//!
//! The forwarding source on a real tokio scheduler with paused time: chunk
//! boundaries land on the cool-downs, and a replay never blocks the caller.

#[cfg(test)]
mod tests {
    use crate::fixtures::vote;
    use shared_types::CacheKey;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::sleep;
    use vr_03_vote_cache::{MemoryVoteCache, VoteCache};
    use vr_04_vote_forwarding::testing::RecordingNetwork;
    use vr_04_vote_forwarding::{ForwardingConfig, ForwardingService, TokioScheduler};

    fn service(
        network: Arc<RecordingNetwork>,
        cache: Arc<MemoryVoteCache>,
    ) -> ForwardingService {
        ForwardingService::new(
            network,
            Arc::new(TokioScheduler::try_current().unwrap()),
            Some(cache),
            ForwardingConfig::default(),
        )
        .unwrap()
    }

    fn chunks(network: &RecordingNetwork) -> Vec<usize> {
        network.delivered("lobby").iter().map(Vec::len).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_chunks_follow_cool_downs() {
        let network = Arc::new(RecordingNetwork::new(["lobby"]));
        let cache = Arc::new(MemoryVoteCache::new());
        for i in 0..11 {
            cache.add_to_cache(vote(&format!("u{}", i), "1"), "lobby");
        }
        let service = service(network.clone(), cache.clone());

        service.on_server_connect("lobby");
        assert!(chunks(&network).is_empty());

        sleep(Duration::from_millis(2_500)).await;
        assert!(chunks(&network).is_empty());

        sleep(Duration::from_millis(1_000)).await; // t = 3.5s
        assert_eq!(chunks(&network), [5]);

        sleep(Duration::from_millis(1_000)).await; // t = 4.5s
        assert_eq!(chunks(&network), [5, 5]);

        sleep(Duration::from_millis(1_000)).await; // t = 5.5s
        assert_eq!(chunks(&network), [5, 5, 1]);
        assert_eq!(cache.pending(&CacheKey::Server("lobby".into())), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_vote_arriving_during_replay_is_kept() {
        let network = Arc::new(RecordingNetwork::new(["lobby"]));
        let cache = Arc::new(MemoryVoteCache::new());
        cache.add_to_cache(vote("early", "1"), "lobby");
        let service = service(network.clone(), cache.clone());

        service.on_server_connect("lobby");
        network.set_down("lobby", true);
        service.forward(&vote("late", "2"));

        sleep(Duration::from_secs(4)).await;

        let held: Vec<String> = cache
            .evict("lobby")
            .into_iter()
            .map(|v| v.username)
            .collect();
        assert_eq!(held, ["early", "late"]);
    }
}
