//! Background asset decoding with non-blocking polling
//!
//! A [`PendingAsset`] runs a decode job on a worker thread and hands the result
//! back over a oneshot channel. The frame loop calls [`PendingAsset::poll`] every
//! frame and never blocks on it.

use futures::channel::oneshot;
use log::{debug, error};

use super::AssetError;

/// Result of polling a [`PendingAsset`]
#[derive(Debug)]
pub enum AssetState<T> {
    /// Still decoding
    Pending,
    /// Decoded; returned exactly once
    Ready(T),
    /// Decoding failed; returned exactly once
    Failed(AssetError),
    /// The result was already handed out by an earlier poll
    Settled,
}

enum Inner<T> {
    Waiting(oneshot::Receiver<Result<T, AssetError>>),
    Done(Option<Result<T, AssetError>>),
}

/// Asset being decoded off the frame loop
pub struct PendingAsset<T> {
    label: String,
    inner: Inner<T>,
}

impl<T: Send + 'static> PendingAsset<T> {
    /// Runs `job` on a named worker thread
    pub fn spawn<F>(label: &str, job: F) -> Self
    where
        F: FnOnce() -> Result<T, AssetError> + Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let thread_label = label.to_string();

        let spawned = std::thread::Builder::new()
            .name(format!("asset:{}", label))
            .spawn(move || {
                debug!("Decoding {}", thread_label);
                // The receiver may be gone if the app shut down first
                let _ = sender.send(job());
            });

        match spawned {
            Ok(_) => Self::from_receiver(label, receiver),
            Err(e) => {
                error!("Could not start asset worker for {}: {}", label, e);
                Self {
                    label: label.to_string(),
                    inner: Inner::Done(Some(Err(AssetError::Worker {
                        label: label.to_string(),
                    }))),
                }
            }
        }
    }
}

impl<T> PendingAsset<T> {
    /// Wraps a receiver fed by some other producer
    pub fn from_receiver(label: &str, receiver: oneshot::Receiver<Result<T, AssetError>>) -> Self {
        Self {
            label: label.to_string(),
            inner: Inner::Waiting(receiver),
        }
    }

    /// An asset that is already available
    pub fn ready(label: &str, value: T) -> Self {
        Self {
            label: label.to_string(),
            inner: Inner::Done(Some(Ok(value))),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Checks for a result without blocking
    pub fn poll(&mut self) -> AssetState<T> {
        if let Inner::Waiting(receiver) = &mut self.inner {
            match receiver.try_recv() {
                Ok(None) => return AssetState::Pending,
                Ok(Some(result)) => self.inner = Inner::Done(Some(result)),
                Err(oneshot::Canceled) => {
                    self.inner = Inner::Done(Some(Err(AssetError::Worker {
                        label: self.label.clone(),
                    })))
                }
            }
        }

        match &mut self.inner {
            Inner::Done(slot) => match slot.take() {
                Some(Ok(value)) => AssetState::Ready(value),
                Some(Err(err)) => AssetState::Failed(err),
                None => AssetState::Settled,
            },
            Inner::Waiting(_) => AssetState::Pending,
        }
    }

    /// Whether the result has been handed out
    pub fn is_settled(&self) -> bool {
        matches!(self.inner, Inner::Done(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_pending_until_sent_then_ready_once() {
        let (sender, receiver) = oneshot::channel();
        let mut asset = PendingAsset::from_receiver("mesh", receiver);

        assert!(matches!(asset.poll(), AssetState::Pending));
        assert!(matches!(asset.poll(), AssetState::Pending));

        sender.send(Ok(42u32)).unwrap();
        assert!(matches!(asset.poll(), AssetState::Ready(42)));
        assert!(asset.is_settled());
        assert!(matches!(asset.poll(), AssetState::Settled));
    }

    #[test]
    fn test_dropped_sender_fails() {
        let (sender, receiver) = oneshot::channel::<Result<u32, AssetError>>();
        let mut asset = PendingAsset::from_receiver("texture", receiver);
        drop(sender);

        match asset.poll() {
            AssetState::Failed(AssetError::Worker { label }) => assert_eq!(label, "texture"),
            other => panic!("unexpected state {:?}", other),
        }
        assert!(matches!(asset.poll(), AssetState::Settled));
    }

    #[test]
    fn test_ready_asset() {
        let mut asset = PendingAsset::ready("feed", "frame");
        assert!(matches!(asset.poll(), AssetState::Ready("frame")));
        assert!(matches!(asset.poll(), AssetState::Settled));
    }

    #[test]
    fn test_spawned_job_delivers() {
        let mut asset = PendingAsset::spawn("number", || Ok(7u8));
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match asset.poll() {
                AssetState::Pending if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(1))
                }
                AssetState::Ready(value) => {
                    assert_eq!(value, 7);
                    break;
                }
                other => panic!("unexpected state {:?}", other),
            }
        }
    }
}
