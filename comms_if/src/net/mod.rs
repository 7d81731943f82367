//! # Network Module
//!
//! This module provides networking abstractions over ZMQ, the networking library chosen for the 
//! software.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;
use zmq::{Context, Socket, SocketType};

// Export zmq
pub use zmq;

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

macro_rules! set_sockopts {
    ($socket:expr, $(($opt:ident, $val:expr)),+) => {
        $(
            $socket.$opt($val)
                .map_err(|e| NetError::SocketOptionError(stringify!($opt).into(), e))?;
        )+
    };
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network parameters, loaded from the exec's parameter file.
#[derive(Debug, Clone, Deserialize)]
pub struct NetParams {
    /// Endpoint on which the simulator bridge exchanges frames with the exec, for example
    /// `"tcp://*:4567"`.
    pub sim_endpoint: String,

    /// Time in milliseconds a receive may block before returning with no frame.
    pub recv_timeout_ms: i32,

    /// Time in milliseconds a send may block before failing.
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: i32
}

/// Represents options which can be set on a socket.
///
/// Options correspond to those found in the
/// [`zmq_setsockopt`](http://api.zeromq.org/4-2:zmq-setsockopt) documentation.
#[derive(Debug, Clone, Copy)]
pub struct SocketOptions {
    /// Indicates if the socket should bind itself to the endpoint. Servers should have this value
    /// set as `true`, clients should have it set as `false`.
    ///
    /// The default value is `false`.
    pub bind: bool,

    /// `ZMQ_LINGER`: Set linger period for socket shutdown
    pub linger: i32,

    /// `ZMQ_RCVTIMEO`: Maximum time before a recv operation returns with `EAGAIN`
    pub recv_timeout: i32,

    /// `ZMQ_SNDTIMEO`: Maximum time before a send operation returns with `EAGAIN`
    pub send_timeout: i32
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum NetError {
    #[error("Error creating the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Could not connect the socket to {0}: {1}")]
    CouldNotConnect(String, zmq::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(String, zmq::Error)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SocketOptions {
    /// Set these options on the given socket.
    pub fn set(&self, socket: &Socket) -> Result<(), NetError> {
        set_sockopts!(
            socket,
            (set_linger, self.linger),
            (set_rcvtimeo, self.recv_timeout),
            (set_sndtimeo, self.send_timeout)
        );

        Ok(())
    }
}

impl Default for SocketOptions {
    fn default() -> Self {
        // Defaults for sockopts taken from http://api.zeromq.org/4-2:zmq-setsockopt
        Self {
            bind: false,
            linger: 30_000,
            recv_timeout: -1,
            send_timeout: -1
        }
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Create a socket, apply the options to it and bind or connect it to the endpoint.
///
/// ## Arguments
/// - `ctx`: the zmq context which will be used to create the socket
/// - `socket_type`: the type of zmq socket to create
/// - `socket_options`: a [`SocketOptions`] struct specifying how to configure the socket
/// - `endpoint`: a zmq endpoint string, such as `"tcp://localhost:4567"`
pub fn open_socket(
    ctx: &Context,
    socket_type: SocketType,
    socket_options: SocketOptions,
    endpoint: &str
) -> Result<Socket, NetError> {
    let socket = ctx.socket(socket_type)
        .map_err(NetError::CreateSocketError)?;

    socket_options.set(&socket)?;

    match socket_options.bind {
        false => socket.connect(endpoint),
        true => socket.bind(endpoint)
    }.map_err(|e| NetError::CouldNotConnect(endpoint.into(), e))?;

    Ok(socket)
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_send_timeout_ms() -> i32 {
    100
}
