//! Per-application user profile kinds, schemas, and product gating.
//!
//! The profile catalogue is a closed enumeration: each variant of
//! [`ProfileApp`] owns a typed schema and (except for the always-available
//! MyLaw default) the product entitlement that unlocks it. Keeping the
//! mapping on the enum rather than in a runtime table makes a new profile
//! kind a compile error until every match arm is extended.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::DomainError;

/// Maximum favourite topics a MyLaw profile may carry.
pub const MYLAW_MAX_FAVORITE_TOPICS: usize = 10;

/// The closed set of profile applications the upstream exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileApp {
    /// Default profile, available to every account.
    #[serde(rename = "MyLawProfile")]
    MyLaw,
    /// Radar dashboards, unlocked by `radar-prod`.
    #[serde(rename = "RadarProfile")]
    Radar,
    /// Scholar research settings, unlocked by `scholar-prod`.
    #[serde(rename = "ScholarProfile")]
    Scholar,
    /// Newsvault delivery settings, unlocked by `newsvault-prod`.
    #[serde(rename = "SettingsProfile")]
    Settings,
}

impl ProfileApp {
    /// Every profile kind, in the order the dashboard lists them.
    pub const ALL: [Self; 4] = [Self::MyLaw, Self::Radar, Self::Scholar, Self::Settings];

    /// Wire identifier used in upstream profile paths.
    #[must_use]
    pub fn app_id(self) -> &'static str {
        match self {
            Self::MyLaw => "MyLawProfile",
            Self::Radar => "RadarProfile",
            Self::Scholar => "ScholarProfile",
            Self::Settings => "SettingsProfile",
        }
    }

    /// Human-readable label shown by the dashboard.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::MyLaw => "MyLaw",
            Self::Radar => "Radar",
            Self::Scholar => "Scholar",
            Self::Settings => "Settings",
        }
    }

    /// Product that unlocks this profile; `None` for the MyLaw default.
    #[must_use]
    pub fn required_product(self) -> Option<&'static str> {
        match self {
            Self::MyLaw => None,
            Self::Radar => Some("radar-prod"),
            Self::Scholar => Some("scholar-prod"),
            Self::Settings => Some("newsvault-prod"),
        }
    }

    /// Profile unlocked by the given product identifier, if any.
    ///
    /// `mylaw-prod` maps back to MyLaw even though MyLaw never requires it.
    #[must_use]
    pub fn from_product_id(product_id: &str) -> Option<Self> {
        match product_id {
            "mylaw-prod" => Some(Self::MyLaw),
            "radar-prod" => Some(Self::Radar),
            "scholar-prod" => Some(Self::Scholar),
            "newsvault-prod" => Some(Self::Settings),
            _ => None,
        }
    }

    /// Decode and validate a raw profile payload against this kind's schema.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorCode::InvalidRequest`](super::ErrorCode) error when
    /// the payload does not conform.
    pub fn decode(self, payload: Value) -> Result<ProfileDocument, DomainError> {
        let map_err = |error: serde_json::Error| {
            DomainError::invalid_request(format!(
                "{} payload failed validation: {error}",
                self.app_id()
            ))
        };
        let document = match self {
            Self::MyLaw => {
                let profile: MyLawProfile = serde_json::from_value(payload).map_err(map_err)?;
                if profile.favorite_topics.len() > MYLAW_MAX_FAVORITE_TOPICS {
                    return Err(DomainError::invalid_request(format!(
                        "MyLawProfile allows at most {MYLAW_MAX_FAVORITE_TOPICS} favorite topics"
                    )));
                }
                ProfileDocument::MyLaw(profile)
            }
            Self::Radar => {
                ProfileDocument::Radar(serde_json::from_value(payload).map_err(map_err)?)
            }
            Self::Scholar => {
                ProfileDocument::Scholar(serde_json::from_value(payload).map_err(map_err)?)
            }
            Self::Settings => {
                ProfileDocument::Settings(serde_json::from_value(payload).map_err(map_err)?)
            }
        };
        Ok(document)
    }
}

impl std::fmt::Display for ProfileApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.app_id())
    }
}

/// A validated profile payload, tagged by its application kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileDocument {
    /// MyLaw default profile.
    MyLaw(MyLawProfile),
    /// Radar profile.
    Radar(RadarProfile),
    /// Scholar profile.
    Scholar(ScholarProfile),
    /// Newsvault settings profile.
    Settings(NewsvaultProfile),
}

impl ProfileDocument {
    /// Application kind this document belongs to.
    #[must_use]
    pub fn app(&self) -> ProfileApp {
        match self {
            Self::MyLaw(_) => ProfileApp::MyLaw,
            Self::Radar(_) => ProfileApp::Radar,
            Self::Scholar(_) => ProfileApp::Scholar,
            Self::Settings(_) => ProfileApp::Settings,
        }
    }

    /// Serialise the validated document back to its wire representation.
    ///
    /// # Errors
    ///
    /// Returns an internal error if serialisation fails, which only happens
    /// when a schema type stops being JSON-representable.
    pub fn to_value(&self) -> Result<Value, DomainError> {
        serde_json::to_value(self)
            .map_err(|error| DomainError::internal(format!("profile serialisation failed: {error}")))
    }
}

/// How often MyLaw alert digests are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertFrequency {
    /// Delivered every day.
    Daily,
    /// Delivered every week.
    Weekly,
    /// Delivered every month.
    Monthly,
}

/// Radar access tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Read-only dashboards.
    Viewer,
    /// Can edit dashboards.
    Editor,
    /// Full administration.
    Admin,
}

/// Citation style used by Scholar exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CitationStyle {
    /// American Psychological Association.
    #[serde(rename = "APA")]
    Apa,
    /// Modern Language Association.
    #[serde(rename = "MLA")]
    Mla,
    /// Chicago Manual of Style.
    Chicago,
}

/// Newsvault report cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsFrequency {
    /// Delivered every day.
    Daily,
    /// Delivered every week.
    Weekly,
}

/// MyLaw default profile settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MyLawProfile {
    /// Whether the user receives the news digest.
    pub news_digest: bool,
    /// Favourite topics, at most [`MYLAW_MAX_FAVORITE_TOPICS`].
    pub favorite_topics: Vec<String>,
    /// Digest delivery cadence.
    pub alert_frequency: AlertFrequency,
    /// Whether alerts also go out by e-mail.
    pub email_notifications: bool,
}

/// Radar profile settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RadarProfile {
    /// Whether in-app notifications are enabled.
    pub notifications: bool,
    /// Data sources feeding the user's dashboards.
    pub data_sources: Vec<String>,
    /// Whether the shared team view is enabled.
    pub team_view: bool,
    /// Access tier within Radar.
    pub access_level: AccessLevel,
    /// Optional persisted dashboard layout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard_layout: Option<String>,
}

/// Scholar profile settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScholarProfile {
    /// Primary research area.
    pub research_area: String,
    /// Saved reference identifiers.
    pub reference_ids: Vec<String>,
    /// Whether results are saved to the library automatically.
    pub save_to_library: bool,
    /// Citation style for exports.
    pub citation_style: CitationStyle,
}

/// Newsvault settings profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewsvaultProfile {
    /// Default section opened on login; `null` for the front page.
    pub default_section: Option<String>,
    /// Whether e-mail reports are enabled.
    pub email_reports: bool,
    /// Report cadence.
    pub frequency: NewsFrequency,
}

/// Availability of one profile kind for an account, derived from grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableProfile {
    /// Profile application identifier.
    pub app_id: ProfileApp,
    /// Display label.
    pub label: &'static str,
    /// Whether the account's grants unlock this profile.
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(ProfileApp::MyLaw, "MyLawProfile", None)]
    #[case(ProfileApp::Radar, "RadarProfile", Some("radar-prod"))]
    #[case(ProfileApp::Scholar, "ScholarProfile", Some("scholar-prod"))]
    #[case(ProfileApp::Settings, "SettingsProfile", Some("newsvault-prod"))]
    fn app_ids_and_required_products(
        #[case] app: ProfileApp,
        #[case] app_id: &str,
        #[case] product: Option<&str>,
    ) {
        assert_eq!(app.app_id(), app_id);
        assert_eq!(app.required_product(), product);
    }

    #[test]
    fn product_mapping_round_trips_for_gated_profiles() {
        for app in ProfileApp::ALL {
            if let Some(product) = app.required_product() {
                assert_eq!(ProfileApp::from_product_id(product), Some(app));
            }
        }
        assert_eq!(ProfileApp::from_product_id("unknown-prod"), None);
    }

    #[test]
    fn decodes_valid_radar_payload() {
        let payload = json!({
            "notifications": true,
            "dataSources": ["filings"],
            "teamView": false,
            "accessLevel": "editor"
        });
        let document = ProfileApp::Radar.decode(payload).expect("valid payload");
        match document {
            ProfileDocument::Radar(profile) => {
                assert_eq!(profile.access_level, AccessLevel::Editor);
                assert_eq!(profile.dashboard_layout, None);
            }
            other => panic!("unexpected document kind: {:?}", other.app()),
        }
    }

    #[test]
    fn rejects_payload_missing_required_fields() {
        let error = ProfileApp::Scholar
            .decode(json!({ "researchArea": "antitrust" }))
            .expect_err("incomplete payload rejected");
        assert_eq!(error.code(), crate::domain::ErrorCode::InvalidRequest);
    }

    #[test]
    fn rejects_unknown_fields() {
        let error = ProfileApp::Radar
            .decode(json!({
                "notifications": true,
                "dataSources": [],
                "teamView": false,
                "accessLevel": "viewer",
                "surprise": 1
            }))
            .expect_err("unknown field rejected");
        assert_eq!(error.code(), crate::domain::ErrorCode::InvalidRequest);
    }

    #[test]
    fn rejects_too_many_favorite_topics() {
        let topics: Vec<String> = (0..=MYLAW_MAX_FAVORITE_TOPICS)
            .map(|n| format!("topic-{n}"))
            .collect();
        let error = ProfileApp::MyLaw
            .decode(json!({
                "newsDigest": true,
                "favoriteTopics": topics,
                "alertFrequency": "weekly",
                "emailNotifications": false
            }))
            .expect_err("topic limit enforced");
        assert_eq!(error.code(), crate::domain::ErrorCode::InvalidRequest);
    }

    #[test]
    fn newsvault_default_section_accepts_null() {
        let document = ProfileApp::Settings
            .decode(json!({
                "defaultSection": null,
                "emailReports": true,
                "frequency": "daily"
            }))
            .expect("null section allowed");
        assert_eq!(document.app(), ProfileApp::Settings);
    }

    #[test]
    fn validated_document_round_trips_to_wire_shape() {
        let document = ProfileDocument::Scholar(ScholarProfile {
            research_area: "antitrust".to_owned(),
            reference_ids: vec!["ref-1".to_owned()],
            save_to_library: true,
            citation_style: CitationStyle::Apa,
        });
        let value = document.to_value().expect("serialises");
        assert_eq!(value["citationStyle"], "APA");
        assert_eq!(value["researchArea"], "antitrust");
    }
}
