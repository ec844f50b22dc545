//! Unix-domain-socket transport for the job-management API (spec
//! section 6): accept loop plus one task per connection, each reading a
//! length-prefixed [`quaero_wire::ClientMessage`] and writing back the
//! [`quaero_wire::Response`] [`crate::dispatch::dispatch`] produces.

use quaero_core::Clock;
use quaero_wire::{decode, encode, read_message, write_message, ClientMessage, ProtocolError, Response};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dispatch::{dispatch, DispatchCtx};

/// Accept connections until `cancellation` fires. Each connection runs
/// in its own task so one slow or hostile client never blocks another.
pub async fn run<C: Clock + 'static>(listener: UnixListener, ctx: DispatchCtx<C>, cancellation: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => {
                info!("listener shutting down");
                return;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _addr)) => {
                        let ctx = ctx.clone();
                        let cancellation = cancellation.clone();
                        tokio::spawn(handle_connection(stream, ctx, cancellation));
                    }
                    Err(error) => error!(%error, "failed to accept connection"),
                }
            }
        }
    }
}

/// One request/response pair per frame, in a loop, until the client
/// disconnects, a malformed frame is read, or shutdown is requested.
async fn handle_connection<C: Clock + 'static>(mut stream: UnixStream, ctx: DispatchCtx<C>, cancellation: CancellationToken) {
    loop {
        let read_result = tokio::select! {
            _ = cancellation.cancelled() => return,
            result = read_message(&mut stream) => result,
        };

        let bytes = match read_result {
            Ok(bytes) => bytes,
            Err(ProtocolError::Io(io_error)) if io_error.kind() == std::io::ErrorKind::UnexpectedEof => return,
            Err(error) => {
                debug!(%error, "connection read failed");
                return;
            }
        };

        let client_message: Result<ClientMessage, _> = decode(&bytes);
        let response = match client_message {
            Ok(message) => dispatch(&ctx, message).await,
            Err(error) => {
                warn!(%error, "failed to decode client message");
                Response::Error { message: error.to_string() }
            }
        };

        if let Err(error) = write_response(&mut stream, &response).await {
            debug!(%error, "connection write failed");
            return;
        }
    }
}

async fn write_response(stream: &mut UnixStream, response: &Response) -> Result<(), ProtocolError> {
    let bytes = encode(response)?;
    write_message(stream, &bytes).await
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
