//! tessera-client — typed client SDK for the Tessera API.
//!
//! Response errors come back as [`ClientError`] variants, so callers match
//! on `ClientError::NotFound` instead of inspecting slugs.

mod client;
mod error;

pub use client::{Client, Collection};
pub use error::{ClientError, ClientResult};
pub use tessera_core::{
    ComputeCluster, Record, RequestError, RequestErrors, Speaker, StorageCluster, Talk,
    TalkRecording, TalkRecordingResolution, TenantGateway, Worker, Workshop, WorkshopMeetingInfo,
    WorkshopPresenter,
};
