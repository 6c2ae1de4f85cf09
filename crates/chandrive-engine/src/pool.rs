//! Per-channel worker pools over bot credentials.
//!
//! Two pools exist: the upload pool rotates raw tokens, the stream pool
//! additionally keeps one connected client per token warm. Both select
//! with a locked increment, so concurrent callers see a fair round-robin
//! with no long-term starvation. Pools never evict credentials; an
//! authorization failure surfaces to the caller.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chandrive_core::result::AppResult;
use chandrive_core::traits::remote::RemoteApi;

/// Round-robin rotation state for one channel.
#[derive(Debug)]
struct Rotation {
    tokens: Vec<String>,
    index: usize,
}

/// Token pool used by the upload engine (and the lazy download path).
#[derive(Debug, Default)]
pub struct UploadWorkers {
    channels: Mutex<HashMap<i64, Rotation>>,
}

impl UploadWorkers {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the credential list for a channel.
    ///
    /// Idempotent: an unchanged token set keeps the rotation index, so
    /// repeated installs from concurrent requests do not reset fairness.
    pub fn set(&self, channel_id: i64, tokens: &[String]) {
        let mut channels = self.channels.lock().expect("upload pool lock poisoned");
        match channels.get(&channel_id) {
            Some(existing) if existing.tokens == tokens => {}
            _ => {
                channels.insert(
                    channel_id,
                    Rotation {
                        tokens: tokens.to_vec(),
                        index: 0,
                    },
                );
            }
        }
    }

    /// The next token for a channel, in round-robin order.
    pub fn next(&self, channel_id: i64) -> Option<String> {
        let mut channels = self.channels.lock().expect("upload pool lock poisoned");
        let rotation = channels.get_mut(&channel_id)?;
        if rotation.tokens.is_empty() {
            return None;
        }
        let token = rotation.tokens[rotation.index % rotation.tokens.len()].clone();
        rotation.index = rotation.index.wrapping_add(1);
        Some(token)
    }
}

/// Warm-client rotation state for one channel.
struct StreamRotation {
    tokens: Vec<String>,
    clients: Vec<Arc<dyn RemoteApi>>,
    index: usize,
}

/// Client pool used by the download engine.
///
/// Entries carry live connected clients; `next` returns the client and
/// its index so the caller can recover which bot user it acts as.
pub struct StreamWorkers {
    limit: usize,
    channels: Mutex<HashMap<i64, StreamRotation>>,
    user: Mutex<Option<Arc<dyn RemoteApi>>>,
}

impl StreamWorkers {
    /// Create an empty pool capped at `limit` warm workers per channel.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            channels: Mutex::new(HashMap::new()),
            user: Mutex::new(None),
        }
    }

    /// Install credentials for a channel, connecting one client per token.
    ///
    /// Only the first `limit` tokens are installed. Idempotent for an
    /// unchanged token set: existing clients stay warm and the rotation
    /// index is preserved.
    pub fn set_with<F>(&self, channel_id: i64, tokens: &[String], mut connect: F) -> AppResult<()>
    where
        F: FnMut(&str) -> AppResult<Arc<dyn RemoteApi>>,
    {
        let capped = &tokens[..tokens.len().min(self.limit)];

        let mut channels = self.channels.lock().expect("stream pool lock poisoned");
        if let Some(existing) = channels.get(&channel_id) {
            if existing.tokens == capped {
                return Ok(());
            }
        }

        let mut clients = Vec::with_capacity(capped.len());
        for token in capped {
            clients.push(connect(token)?);
        }
        channels.insert(
            channel_id,
            StreamRotation {
                tokens: capped.to_vec(),
                clients,
                index: 0,
            },
        );
        Ok(())
    }

    /// The next warm client for a channel with its rotation index.
    pub fn next(&self, channel_id: i64) -> Option<(Arc<dyn RemoteApi>, usize)> {
        let mut channels = self.channels.lock().expect("stream pool lock poisoned");
        let rotation = channels.get_mut(&channel_id)?;
        if rotation.clients.is_empty() {
            return None;
        }
        let picked = rotation.index % rotation.clients.len();
        rotation.index = rotation.index.wrapping_add(1);
        Some((Arc::clone(&rotation.clients[picked]), picked))
    }

    /// The single-slot user-credential fallback worker.
    ///
    /// The first call connects and stores the client; later calls reuse it
    /// regardless of the session that triggered creation.
    pub fn user_worker<F>(&self, connect: F) -> AppResult<Arc<dyn RemoteApi>>
    where
        F: FnOnce() -> AppResult<Arc<dyn RemoteApi>>,
    {
        let mut slot = self.user.lock().expect("user worker lock poisoned");
        if let Some(client) = slot.as_ref() {
            return Ok(Arc::clone(client));
        }
        let client = connect()?;
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }
}

impl std::fmt::Debug for StreamWorkers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamWorkers")
            .field("limit", &self.limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockRemote;

    fn tokens(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_round_robin_order() {
        let pool = UploadWorkers::new();
        pool.set(7, &tokens(&["t1", "t2", "t3"]));

        let picked: Vec<String> = (0..6).map(|_| pool.next(7).unwrap()).collect();
        assert_eq!(picked, vec!["t1", "t2", "t3", "t1", "t2", "t3"]);
    }

    #[test]
    fn test_fairness_over_many_rounds() {
        let pool = UploadWorkers::new();
        let ts = tokens(&["a", "b", "c", "d"]);
        pool.set(1, &ts);

        let mut counts = HashMap::new();
        for _ in 0..4 * 25 {
            *counts.entry(pool.next(1).unwrap()).or_insert(0u32) += 1;
        }
        for t in &ts {
            assert_eq!(counts[t], 25);
        }
    }

    #[test]
    fn test_set_is_idempotent_for_same_tokens() {
        let pool = UploadWorkers::new();
        let ts = tokens(&["t1", "t2"]);
        pool.set(5, &ts);
        assert_eq!(pool.next(5).unwrap(), "t1");

        // Reinstalling the same set must not reset the rotation.
        pool.set(5, &ts);
        assert_eq!(pool.next(5).unwrap(), "t2");

        // A different set does.
        pool.set(5, &tokens(&["t9"]));
        assert_eq!(pool.next(5).unwrap(), "t9");
    }

    #[test]
    fn test_next_on_unknown_channel() {
        let pool = UploadWorkers::new();
        assert!(pool.next(404).is_none());
    }

    #[test]
    fn test_concurrent_next_is_fair() {
        let pool = Arc::new(UploadWorkers::new());
        let ts = tokens(&["x", "y", "z"]);
        pool.set(2, &ts);

        let mut handles = Vec::new();
        for _ in 0..3 {
            let pool = Arc::clone(&pool);
            handles.push(std::thread::spawn(move || {
                (0..30).map(|_| pool.next(2).unwrap()).collect::<Vec<_>>()
            }));
        }

        let mut counts: HashMap<String, u32> = HashMap::new();
        for handle in handles {
            for token in handle.join().unwrap() {
                *counts.entry(token).or_insert(0) += 1;
            }
        }
        // 90 selections over 3 tokens: exactly 30 each.
        for t in &ts {
            assert_eq!(counts[t], 30);
        }
    }

    #[test]
    fn test_stream_pool_caps_tokens() {
        let pool = StreamWorkers::new(2);
        let mut connected = Vec::new();
        pool.set_with(9, &tokens(&["t1", "t2", "t3"]), |t| {
            connected.push(t.to_string());
            Ok(Arc::new(MockRemote::default()))
        })
        .unwrap();

        assert_eq!(connected, vec!["t1", "t2"]);
        let (_c, i0) = pool.next(9).unwrap();
        let (_c, i1) = pool.next(9).unwrap();
        let (_c, i2) = pool.next(9).unwrap();
        assert_eq!((i0, i1, i2), (0, 1, 0));
    }

    #[test]
    fn test_stream_pool_keeps_clients_warm() {
        let pool = StreamWorkers::new(4);
        let mut connects = 0;
        for _ in 0..3 {
            pool.set_with(9, &tokens(&["t1", "t2"]), |_| {
                connects += 1;
                Ok(Arc::new(MockRemote::default()))
            })
            .unwrap();
        }
        // Two clients connected once, not once per install.
        assert_eq!(connects, 2);
    }

    #[test]
    fn test_user_worker_is_single_slot() {
        let pool = StreamWorkers::new(4);
        let first = pool
            .user_worker(|| Ok(Arc::new(MockRemote::default()) as Arc<dyn RemoteApi>))
            .unwrap();
        let second = pool
            .user_worker(|| panic!("must reuse the existing client"))
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
