//! # Hostile Clients
//!
//! Attack simulations against the vote endpoint. Every case must end the
//! connection with a classified error and forward nothing.
//!
//! | Attack | Expected failure |
//! |--------|------------------|
//! | Frame captured on one connection replayed on another | `IntegrityFailure` |
//! | Payload edited after signing | `IntegrityFailure` |
//! | Random bytes the size of an RSA block | `DecryptFailure` |
//! | Legacy block followed by trailing bytes | `MalformedFrame` |
//! | Token frame with a non-JSON body | `MalformedFrame` |
//! | Client that stops mid-frame | `Timeout` |
//! | Client that hangs up mid-frame | `Incomplete` |

#[cfg(test)]
mod tests {
    use crate::fixtures::{key_pair, vote, TestRelay, SERVICE_TOKEN};
    use serde_json::Value;
    use shared_crypto::TokenKey;
    use tokio::io::{duplex, AsyncBufReadExt, AsyncWriteExt, BufReader};
    use vr_02_vote_protocol::domain::frame::wrap_token_body;
    use vr_02_vote_protocol::{encode_legacy, encode_token, ConnectionError, DecodeError};

    fn decode_error(result: Result<shared_types::Vote, ConnectionError>) -> DecodeError {
        match result {
            Err(ConnectionError::Decode(e)) => e,
            other => panic!("expected a decode error, got {:?}", other),
        }
    }

    fn cause(ack: &str) -> String {
        let parsed: Value = serde_json::from_str(ack.trim_end()).unwrap();
        assert_eq!(parsed["status"], "error");
        parsed["cause"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_replayed_frame_is_rejected() {
        let relay = TestRelay::start(&["lobby"]);
        let key = TokenKey::from_token(SERVICE_TOKEN);
        let captured = encode_token(&vote("alice", "1"), &key, "challenge-from-old-session").unwrap();

        let (result, ack) = relay.exchange(|_| captured).await;

        assert!(matches!(decode_error(result), DecodeError::IntegrityFailure(_)));
        assert_eq!(cause(&ack), "IntegrityFailure");
        assert!(relay.network.delivered_votes("lobby").is_empty());
    }

    #[tokio::test]
    async fn test_tampered_payload_is_rejected() {
        let relay = TestRelay::start(&["lobby"]);
        let key = TokenKey::from_token(SERVICE_TOKEN);

        let (result, ack) = relay
            .exchange(|challenge| {
                let frame = encode_token(&vote("alice", "1"), &key, challenge).unwrap();
                let body = String::from_utf8(frame[4..].to_vec()).unwrap();
                let forged = body.replace("alice", "mallory");
                wrap_token_body(forged.as_bytes()).unwrap()
            })
            .await;

        assert!(matches!(decode_error(result), DecodeError::IntegrityFailure(_)));
        assert_eq!(cause(&ack), "IntegrityFailure");
        assert_eq!(relay.network.attempts("lobby"), 0);
    }

    #[tokio::test]
    async fn test_random_block_fails_to_decrypt_silently() {
        let relay = TestRelay::start(&["lobby"]);
        let block_size = key_pair().block_size();

        let (result, reply) = relay
            .exchange(|_| (0..block_size).map(|i| (i * 7 + 3) as u8).collect())
            .await;

        assert!(matches!(decode_error(result), DecodeError::DecryptFailure(_)));
        assert!(reply.is_empty(), "legacy failures are not acknowledged");
        assert_eq!(relay.network.attempts("lobby"), 0);
    }

    #[tokio::test]
    async fn test_trailing_bytes_after_legacy_block() {
        let relay = TestRelay::start(&["lobby"]);

        let (result, _) = relay
            .exchange(|_| {
                let mut data = encode_legacy(&vote("alice", "1"), key_pair().public_key()).unwrap();
                data.extend_from_slice(b"extra");
                data
            })
            .await;

        assert!(matches!(decode_error(result), DecodeError::MalformedFrame(_)));
        assert_eq!(relay.network.attempts("lobby"), 0);
    }

    #[tokio::test]
    async fn test_token_frame_with_garbage_body() {
        let relay = TestRelay::start(&["lobby"]);

        let (result, ack) = relay
            .exchange(|_| wrap_token_body(b"{not json at all").unwrap())
            .await;

        assert!(matches!(decode_error(result), DecodeError::MalformedFrame(_)));
        assert_eq!(cause(&ack), "MalformedFrame");
    }

    #[tokio::test]
    async fn test_stalled_client_times_out() {
        let relay = TestRelay::start(&["lobby"]);
        let (client, server) = duplex(1024);

        let client_task = async move {
            let mut client = BufReader::new(client);
            let mut greeting = String::new();
            client.read_line(&mut greeting).await.unwrap();
            // Header promising 100 bytes that never come.
            client.get_mut().write_all(&[0x73, 0x3A, 0x00, 0x64]).await.unwrap();
            client
        };

        let (result, _client) = tokio::join!(
            relay.runtime.serve_connection(server, "203.0.113.50:1"),
            client_task
        );

        assert!(matches!(result, Err(ConnectionError::Timeout { received: 4 })));
    }

    #[tokio::test]
    async fn test_client_hanging_up_mid_frame() {
        let relay = TestRelay::start(&["lobby"]);
        let (client, server) = duplex(1024);

        let client_task = async move {
            let mut client = BufReader::new(client);
            let mut greeting = String::new();
            client.read_line(&mut greeting).await.unwrap();
            client.get_mut().write_all(&[0x73, 0x3A, 0x00]).await.unwrap();
            drop(client);
        };

        let (result, ()) = tokio::join!(
            relay.runtime.serve_connection(server, "203.0.113.51:1"),
            client_task
        );

        assert!(matches!(result, Err(ConnectionError::Incomplete { received: 3 })));
    }

    #[tokio::test]
    async fn test_failed_connection_does_not_disturb_the_next() {
        let relay = TestRelay::start(&["lobby"]);
        let key = TokenKey::from_token(SERVICE_TOKEN);

        let (bad, _) = relay.exchange(|_| wrap_token_body(b"[]").unwrap()).await;
        assert!(bad.is_err());

        let good = vote("alice", "1");
        let (result, ack) = relay
            .exchange(|challenge| encode_token(&good, &key, challenge).unwrap())
            .await;

        assert_eq!(result.unwrap(), good);
        assert!(ack.contains("\"ok\""));
        assert_eq!(relay.network.delivered_votes("lobby"), [good]);
    }
}
