//! # SSO Server
//!
//! gRPC front end for [`sso_core`]. The transport layer checks request
//! shape, calls the authentication service and maps its outcomes onto gRPC
//! status codes; [`app`] owns the listen/serve/shutdown lifecycle.

#![allow(missing_docs)]

pub mod app;
pub mod transport;

/// Generated protobuf types and service stubs for `auth.Auth`.
pub mod pb {
    tonic::include_proto!("auth");
}
