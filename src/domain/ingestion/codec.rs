use bytes::BytesMut;
use std::io;
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

use crate::domain::ingestion::protocol::Envelope;

pub const DEFAULT_MAX_FRAME_LENGTH: usize = 64 * 1024 * 1024;

/// Combines LengthDelimitedCodec (TCP framing, 4-byte big-endian length) with Bincode
/// (serialization of [`Envelope`]).
pub struct ResultCodec {
    codec: LengthDelimitedCodec,
}

impl ResultCodec {
    pub fn new() -> Self {
        Self::with_max_frame_length(DEFAULT_MAX_FRAME_LENGTH)
    }

    pub fn with_max_frame_length(max_frame_length: usize) -> Self {
        Self { codec: LengthDelimitedCodec::builder().max_frame_length(max_frame_length).new_codec() }
    }
}

impl Default for ResultCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<Envelope> for ResultCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Envelope, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let bytes = bincode::serialize(&item).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.codec.encode(bytes::Bytes::from(bytes), dst)
    }
}

impl Decoder for ResultCodec {
    type Item = Envelope;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.codec.decode(src)? {
            Some(bytes) => {
                let item = bincode::deserialize(&bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ingestion::protocol::Payload;
    use crate::domain::results::iteration_result_set::WorkerResultRecord;
    use crate::domain::utils::id::WorkerId;

    #[test]
    fn partial_frame_waits_for_more_bytes() {
        let mut codec = ResultCodec::new();
        let mut buf = BytesMut::new();
        let envelope = Envelope::worker_result(WorkerResultRecord::new(WorkerId::new("w1"), 3, vec![9; 32]));
        codec.encode(envelope.clone(), &mut buf).unwrap();

        let mut head = buf.split_to(buf.len() / 2);
        assert!(codec.decode(&mut head).unwrap().is_none());

        head.unsplit(buf);
        assert_eq!(codec.decode(&mut head).unwrap(), Some(envelope));
    }

    #[test]
    fn garbage_body_is_invalid_data() {
        let mut codec = ResultCodec::new();
        let mut buf = BytesMut::from(&[0u8, 0, 0, 2, 0xff, 0xff][..]);
        let err = codec.decode(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let mut codec = ResultCodec::with_max_frame_length(16);
        let mut buf = BytesMut::new();
        let envelope = Envelope { sender_id: "m".into(), payload: Payload::MasterResult { iteration: 1, bytes: vec![0; 64] } };
        assert!(codec.encode(envelope, &mut buf).is_err());
    }
}
