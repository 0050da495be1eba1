//! # FCAT ESI
//!
//! Thin authenticated gateway to the EVE Swagger Interface.
//!
//! - [`Authenticator`] produces a [`Credential`] (static token or `/verify/`).
//! - [`EsiClient`] consumes a credential and implements [`FleetGateway`].
//!
//! Every failure is a [`GatewayError`] whose [`ErrorClass`] tells the caller
//! whether to retry next poll, surface an auth problem, or fall back to
//! defaults.

mod auth;
mod client;
mod error;
mod gateway;

pub use auth::{Authenticator, Credential, StaticAuthenticator, TokenVerifier};
pub use client::{EsiClient, EsiConfig, DEFAULT_ESI_BASE_URL, DEFAULT_USER_AGENT};
pub use error::{ErrorClass, GatewayError, Result};
pub use gateway::{FleetGateway, GroupMetadata, NameCategory, SharedGateway, TypeMetadata};
