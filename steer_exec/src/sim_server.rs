//! # Simulator Server Module
//!
//! This module abstracts over the networking side of the steering executable. The bridge to the
//! simulator forwards each frame it receives as a request on a REP socket, and relays the frames in
//! the reply (one per message part) back to the simulator.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{zmq, open_socket, NetError, NetParams, SocketOptions},
    sim::{decode_frame, FrameError, SimCommand, SimEvent}
};
use log::debug;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An abstraction over the networking part of the steering executable.
pub struct SimServer {
    /// REP socket which accepts frames from the bridge
    socket: zmq::Socket,

    params: NetParams
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur in the [`SimServer`]
#[derive(thiserror::Error, Debug)]
pub enum SimServerError {
    #[error("Socket error: {0}")]
    SocketError(NetError),

    #[error("Could not recieve a frame from the bridge: {0}")]
    RecvError(zmq::Error),

    #[error("Could not send commands to the bridge: {0}")]
    SendError(zmq::Error)
}

/// A request from the bridge.
#[derive(Debug)]
pub enum Request {
    /// A frame holding an event.
    Event(SimEvent),

    /// A frame which couldn't be decoded into an event.
    Undecodable(FrameError)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimServer {

    /// Create a new instance of the simulator server.
    ///
    /// This function will not wait for a connection from the bridge before returning.
    pub fn new(params: &NetParams) -> Result<Self, SimServerError> {
        Ok(Self {
            socket: Self::open(params)?,
            params: params.clone()
        })
    }

    /// Close the socket and bind a fresh one on the same endpoint.
    ///
    /// A REP socket which failed to send its reply can't receive again, so the server must be
    /// reopened after a [`SimServerError::SendError`]. Any request still waiting on a reply is
    /// dropped.
    pub fn reopen(self) -> Result<Self, SimServerError> {
        let Self { socket, params } = self;

        // Release the endpoint before binding again
        drop(socket);

        Self::new(&params)
    }

    fn open(params: &NetParams) -> Result<zmq::Socket, SimServerError> {
        let ctx = zmq::Context::new();

        let socket_options = SocketOptions {
            bind: true,
            linger: 1,
            recv_timeout: params.recv_timeout_ms,
            send_timeout: params.send_timeout_ms
        };

        Ok(open_socket(&ctx, zmq::REP, socket_options, &params.sim_endpoint)?)
    }

    /// Retrieve the next request from the bridge.
    ///
    /// `Ok(None)` is returned if no frame arrived before the receive timeout. Otherwise the user
    /// MUST call [`SimServer::send_commands`] before the next call to this function.
    pub fn get_request(&mut self) -> Result<Option<Request>, SimServerError> {
        let msg = match self.socket.recv_msg(0) {
            Ok(m) => m,
            Err(zmq::Error::EAGAIN) => return Ok(None),
            Err(e) => return Err(SimServerError::RecvError(e))
        };

        let frame = match msg.as_str() {
            Some(s) => s,
            None => {
                debug!("Non UTF-8 frame from the bridge");
                return Ok(Some(Request::Undecodable(FrameError::NotAnEvent)))
            }
        };

        Ok(Some(match decode_frame(frame) {
            Ok(e) => Request::Event(e),
            Err(e) => Request::Undecodable(e)
        }))
    }

    /// Reply to the last request with the given commands, one frame per message part.
    pub fn send_commands(&mut self, cmds: &[SimCommand]) -> Result<(), SimServerError> {
        let frames: Vec<String> = cmds.iter().map(SimCommand::encode).collect();

        self.socket
            .send_multipart(frames.iter().map(|f| f.as_bytes()), 0)
            .map_err(SimServerError::SendError)
    }
}

impl From<NetError> for SimServerError {
    fn from(e: NetError) -> Self {
        SimServerError::SocketError(e)
    }
}
