use crate::error::BusError;
use futures::Stream;

/// `StreamParser`s are capable of parsing the input messages from a given stream protocol
/// (eg/ WebSocket, delimited batch file, FIX, etc.) and deserialising into an `Output`.
///
/// Feed Normalizers (§4.2) implement this to bridge raw source-specific transport into the
/// generic [`crate::Transformer`] pipeline that produces canonical events.
pub trait StreamParser<Output> {
    type Stream: Stream;
    type Message;
    type Error;

    fn parse(input: Result<Self::Message, Self::Error>) -> Option<Result<Output, BusError>>;
}
