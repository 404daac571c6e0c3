// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Remote search service.
//!
//! [`SearchService`] is the seam every remote call goes through.
//! [`HttpSearchService`] talks to the hosted service with signed requests;
//! [`MemorySearchService`] is an in-process double for tests and local runs.
//! Responses come back as [`RawResponse`] and are classified with
//! [`Envelope`].

mod envelope;
mod http;
mod memory;
mod signer;
mod traits;

pub use envelope::{
    Envelope, RawResponse, RemoteErrorDetail, APP_NOT_FOUND_CODE, STATUS_FAIL, STATUS_OK,
};
pub use http::HttpSearchService;
pub use memory::{MemorySearchService, RemoteCall, MISSING_KEY_CODE};
pub use signer::{canonical_resource, raw_url_encode, RequestSigner, SignedHeaders};
pub use traits::SearchService;
