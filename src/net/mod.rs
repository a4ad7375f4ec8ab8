//! Embedded web server.
//!
//! Event driven: the transport reports accepts, received bytes, completed
//! writes and errors, and [`manager::ConnectionManager`] reacts to each one.
//! Nothing blocks waiting on a client.
//!
//! ```text
//!  Transport ──events──▶ ConnectionManager ──▶ RequestBuffer ──▶ router
//!      ▲                       │                                   │
//!      └────── head + chunks ──┴─────────── Outbound ◀─── Response ┘
//! ```
//!
//! | Module          | Role                                        |
//! |-----------------|---------------------------------------------|
//! | `transport`     | Event and write surface of the socket layer |
//! | `pool`          | Fixed slots with generation-tagged ids      |
//! | `request`       | Request accumulation and parsing            |
//! | `response`      | Status line, headers and chunked body       |
//! | `router`        | Endpoint dispatch                           |
//! | `config_update` | `POST /cfg` form handling                   |
//! | `dashboard`     | Static HTML page                            |
//! | `manager`       | Connection lifecycle                        |
//! | `link`          | Boot connect and reconnect pacing           |
//! | `pump`          | Single-threaded executor owning the pool    |

pub mod config_update;
pub mod dashboard;
pub mod link;
pub mod manager;
pub mod pool;
pub mod pump;
pub mod request;
pub mod response;
pub mod router;
pub mod transport;
