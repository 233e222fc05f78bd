//! Resource record types.
//!
//! Each type is a flat/nested value object that is JSON-serialized on the
//! wire and in the store. Absent JSON fields decode to their empty value
//! (`#[serde(default)]`) so that [`Record::validate`] can report them as
//! `missing` instead of failing the whole body as `invalid_format`.
//! Optional fields are `Option` where unset must stay distinguishable from
//! an empty string.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::{EnrichError, Lookup, Record};
use crate::wire::{RequestError, RequestErrors};

/// Push a `missing` error for every named field whose value is empty.
fn require(errors: &mut RequestErrors, field: &str, present: bool) {
    if !present {
        errors.push(RequestError::missing_field(field));
    }
}

// ── Storage cluster ───────────────────────────────────────────────

/// Descriptor of an archive storage cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageCluster {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub partition_space_tb: i64,
    pub ip_address: String,
    pub ip_port: String,
    /// DICOM application entity title.
    pub aet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Record for StorageCluster {
    const COLLECTION: &'static str = "storage_clusters";
    const KIND: &'static str = "storage cluster";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> RequestErrors {
        let mut errors = RequestErrors::new();
        require(&mut errors, "partition_space_tb", self.partition_space_tb > 0);
        errors
    }
}

// ── Compute cluster ───────────────────────────────────────────────

/// Descriptor of a compute (Kubernetes) cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeCluster {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub region: String,
    pub profile: String,
    pub release: String,
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dicom_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_server_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Record for ComputeCluster {
    const COLLECTION: &'static str = "compute_clusters";
    const KIND: &'static str = "compute cluster";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> RequestErrors {
        let mut errors = RequestErrors::new();
        require(&mut errors, "region", !self.region.is_empty());
        require(&mut errors, "profile", !self.profile.is_empty());
        require(&mut errors, "release", !self.release.is_empty());
        errors
    }
}

// ── Worker ────────────────────────────────────────────────────────

/// Descriptor of a worker attached to a compute cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Worker {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub concurrent_users: i64,
    /// ID of the owning compute cluster.
    pub ehs_cluster_id: String,
    pub dicom_endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Record for Worker {
    const COLLECTION: &'static str = "workers";
    const KIND: &'static str = "worker";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> RequestErrors {
        let mut errors = RequestErrors::new();
        require(&mut errors, "concurrent_users", self.concurrent_users > 0);
        require(&mut errors, "ehs_cluster_id", !self.ehs_cluster_id.is_empty());
        require(&mut errors, "dicom_endpoint", !self.dicom_endpoint.is_empty());
        errors
    }
}

// ── Tenant gateway ────────────────────────────────────────────────

/// Per-tenant ingestion gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantGateway {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub account_id: String,
    pub tenant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_folder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_queue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Record for TenantGateway {
    const COLLECTION: &'static str = "tenant_gateways";
    const KIND: &'static str = "tenant gateway";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> RequestErrors {
        let mut errors = RequestErrors::new();
        require(&mut errors, "tenant_id", !self.tenant_id.is_empty());
        require(&mut errors, "account_id", !self.account_id.is_empty());
        errors
    }
}

// ── Speaker ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Speaker {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub pronouns: Option<String>,
    pub employer: Option<String>,
    pub title: Option<String>,
    pub photo: Option<String>,
}

impl Record for Speaker {
    const COLLECTION: &'static str = "speakers";
    const KIND: &'static str = "speaker";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> RequestErrors {
        let mut errors = RequestErrors::new();
        require(&mut errors, "name", !self.name.is_empty());
        errors
    }
}

// ── Talk ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Talk {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "durationMinutes")]
    pub duration_minutes: i64,
    pub prerecorded: bool,
    #[serde(rename = "speakerIDs")]
    pub speaker_ids: Vec<String>,
    /// Derived on create: one entry per speaker, keyed by speaker name.
    pub recordings: BTreeMap<String, TalkRecording>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TalkRecording {
    pub resolution: TalkRecordingResolution,
    pub codec: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TalkRecordingResolution {
    pub width: i64,
    pub height: i64,
}

impl TalkRecording {
    /// The recording format provisioned for every speaker of a new talk.
    pub fn uhd_h264() -> Self {
        Self {
            resolution: TalkRecordingResolution {
                width: 3840,
                height: 2160,
            },
            codec: "h264".to_string(),
        }
    }
}

impl Record for Talk {
    const COLLECTION: &'static str = "talks";
    const KIND: &'static str = "talk";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> RequestErrors {
        let mut errors = RequestErrors::new();
        require(&mut errors, "title", !self.title.is_empty());
        errors
    }

    /// Materialize one recording per referenced speaker. Any caller-supplied
    /// recordings are discarded.
    fn enrich<L: Lookup>(&mut self, lookup: &L) -> Result<(), EnrichError> {
        let mut recordings = BTreeMap::new();
        for (index, speaker_id) in self.speaker_ids.iter().enumerate() {
            let speaker: Speaker =
                lookup
                    .find(speaker_id)?
                    .ok_or_else(|| EnrichError::UnresolvedReference {
                        field: format!("/speakerIDs/{index}"),
                        id: speaker_id.clone(),
                    })?;
            recordings.insert(speaker.name, TalkRecording::uhd_h264());
        }
        self.recordings = recordings;
        Ok(())
    }
}

// ── Workshop ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workshop {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "durationMinutes")]
    pub duration_minutes: i64,
    pub presenters: BTreeMap<String, WorkshopPresenter>,
    #[serde(rename = "meetingInfo")]
    pub meeting_info: WorkshopMeetingInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkshopPresenter {
    pub title: Option<String>,
    pub employer: Option<String>,
    pub pronouns: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkshopMeetingInfo {
    pub url: String,
    pub password: Option<String>,
}

impl Record for Workshop {
    const COLLECTION: &'static str = "workshops";
    const KIND: &'static str = "workshop";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn validate(&self) -> RequestErrors {
        let mut errors = RequestErrors::new();
        require(&mut errors, "title", !self.title.is_empty());
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LookupError;
    use serde_json::json;
    use std::collections::HashMap;

    /// Lookup over a fixed set of speakers.
    struct Speakers(HashMap<String, Speaker>);

    impl Lookup for Speakers {
        fn find<R: Record>(&self, id: &str) -> Result<Option<R>, LookupError> {
            if R::COLLECTION != Speaker::COLLECTION {
                return Ok(None);
            }
            self.0
                .get(id)
                .map(|s| serde_json::to_value(s).and_then(serde_json::from_value))
                .transpose()
                .map_err(|e| LookupError(e.to_string()))
        }
    }

    fn speaker(id: &str, name: &str) -> Speaker {
        Speaker {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn worker_decodes_scenario_body() {
        let worker: Worker = serde_json::from_value(json!({
            "concurrent_users": 5,
            "ehs_cluster_id": "c1",
            "dicom_endpoint": "d1"
        }))
        .unwrap();
        assert_eq!(worker.concurrent_users, 5);
        assert!(worker.id.is_empty());
        assert!(worker.dns_endpoint.is_none());
        assert!(worker.validate().is_empty());
    }

    #[test]
    fn absent_fields_are_reported_missing() {
        let worker: Worker = serde_json::from_value(json!({"concurrent_users": 5})).unwrap();
        let errors = worker.validate();
        assert_eq!(
            errors,
            vec![
                RequestError::missing_field("ehs_cluster_id"),
                RequestError::missing_field("dicom_endpoint"),
            ]
        );
    }

    #[test]
    fn wrong_type_is_a_decode_error() {
        let result: Result<Worker, _> =
            serde_json::from_value(json!({"concurrent_users": "five"}));
        assert!(result.is_err());
    }

    #[test]
    fn empty_id_is_omitted_on_the_wire() {
        let value = serde_json::to_value(Worker::default()).unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("dns_endpoint").is_none());
    }

    #[test]
    fn speaker_optional_fields_serialize_as_null() {
        let value = serde_json::to_value(speaker("s-1", "Ada")).unwrap();
        assert_eq!(value["pronouns"], serde_json::Value::Null);
        assert!(value.as_object().unwrap().contains_key("pronouns"));
    }

    #[test]
    fn talk_uses_camel_case_wire_names() {
        let talk: Talk = serde_json::from_value(json!({
            "title": "Keynote",
            "durationMinutes": 45,
            "speakerIDs": ["s-1"]
        }))
        .unwrap();
        assert_eq!(talk.duration_minutes, 45);
        assert_eq!(talk.speaker_ids, vec!["s-1".to_string()]);
    }

    #[test]
    fn talk_enrich_builds_recordings_per_speaker() {
        let lookup = Speakers(HashMap::from([
            ("s-1".to_string(), speaker("s-1", "Ada")),
            ("s-2".to_string(), speaker("s-2", "Grace")),
        ]));
        let mut talk = Talk {
            title: "Keynote".to_string(),
            speaker_ids: vec!["s-1".to_string(), "s-2".to_string()],
            ..Default::default()
        };
        talk.recordings
            .insert("stale".to_string(), TalkRecording::default());

        talk.enrich(&lookup).unwrap();

        assert_eq!(talk.recordings.len(), 2);
        assert_eq!(talk.recordings["Ada"], TalkRecording::uhd_h264());
        assert!(!talk.recordings.contains_key("stale"));
    }

    #[test]
    fn talk_enrich_reports_first_unresolved_speaker() {
        let lookup = Speakers(HashMap::from([(
            "s-1".to_string(),
            speaker("s-1", "Ada"),
        )]));
        let mut talk = Talk {
            title: "Keynote".to_string(),
            speaker_ids: vec!["s-1".to_string(), "ghost".to_string()],
            ..Default::default()
        };

        match talk.enrich(&lookup) {
            Err(EnrichError::UnresolvedReference { field, id }) => {
                assert_eq!(field, "/speakerIDs/1");
                assert_eq!(id, "ghost");
            }
            other => panic!("expected unresolved reference, got {other:?}"),
        }
    }
}
