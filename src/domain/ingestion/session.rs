use futures::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;

use crate::domain::ingestion::codec::ResultCodec;
use crate::domain::ingestion::protocol::{Envelope, Payload};
use crate::domain::results::iteration_result_set::IterationResultSet;
use crate::error::{Error, Result};

/// One worker connection. Frames are handled strictly in arrival order; the connection is
/// closed on the first codec error or protocol violation, which never affects other sessions.
///
/// Applying a frame takes a permit from the server-wide `permits`, so an idle connection holds
/// nothing.
pub struct ResultSession {
    results: IterationResultSet,
    permits: Arc<Semaphore>,
    peer: Option<SocketAddr>,
    accepted: usize,
    discarded: usize,
}

impl ResultSession {
    pub fn new(results: IterationResultSet, permits: Arc<Semaphore>, peer: Option<SocketAddr>) -> Self {
        Self { results, permits, peer, accepted: 0, discarded: 0 }
    }

    /// Reads frames until the peer hangs up, a frame is rejected, or `shutdown` fires. The
    /// socket is dropped (closed) on return.
    pub async fn run(mut self, stream: TcpStream, max_frame_length: usize, shutdown: CancellationToken) {
        let mut frames = FramedRead::new(stream, ResultCodec::with_max_frame_length(max_frame_length));

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    log::debug!("Closing connection from {:?} on server shutdown.", self.peer);
                    break;
                }
                frame = frames.next() => match frame {
                    Some(Ok(envelope)) => {
                        let Ok(_permit) = self.permits.clone().acquire_owned().await else {
                            break;
                        };
                        if let Err(e) = self.handle_envelope(envelope) {
                            log::error!("Closing connection from {:?}: {}", self.peer, e);
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        log::error!("Codec error on connection from {:?}: {}", self.peer, e);
                        break;
                    }
                    None => break,
                },
            }
        }

        log::debug!("Connection from {:?} closed after {} accepted and {} discarded results.", self.peer, self.accepted, self.discarded);
    }

    pub(crate) fn handle_envelope(&mut self, envelope: Envelope) -> Result<()> {
        match envelope.payload {
            Payload::WorkerResult(record) => {
                let worker_id = record.worker_id.clone();
                let iteration = record.iteration;
                if self.results.append(record) {
                    self.accepted += 1;
                    log::info!("Received result of worker {} for iteration {}.", worker_id, iteration);
                } else {
                    // A restarted worker resends the same result; the stored one stays authoritative.
                    self.discarded += 1;
                    log::debug!("Discarded duplicate result of worker {} for iteration {}.", worker_id, iteration);
                }
                Ok(())
            }
            other => Err(Error::Protocol(format!("expected WorkerResult from '{}', got {}", envelope.sender_id, other.kind()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::results::iteration_result_set::WorkerResultRecord;
    use crate::domain::utils::id::WorkerId;

    fn session(results: &IterationResultSet) -> ResultSession {
        ResultSession::new(results.clone(), Arc::new(Semaphore::new(1)), None)
    }

    #[test]
    fn rejects_master_result_payload() {
        let results = IterationResultSet::new();
        let mut session = session(&results);

        let envelope = Envelope { sender_id: "w1".into(), payload: Payload::MasterResult { iteration: 2, bytes: vec![1] } };
        assert!(matches!(session.handle_envelope(envelope), Err(Error::Protocol(_))));
        assert!(results.is_empty());
    }

    #[test]
    fn counts_duplicates() {
        let results = IterationResultSet::new();
        let mut session = session(&results);

        for payload in [b"a", b"b"] {
            let record = WorkerResultRecord::new(WorkerId::new("w1"), 1, payload.to_vec());
            session.handle_envelope(Envelope::worker_result(record)).unwrap();
        }

        assert_eq!((session.accepted, session.discarded), (1, 1));
        assert_eq!(results.size(), 1);
    }
}
