//! The denormalized location page record.
//!
//! [`LocationSeoData`] merges research, generated content and the clinic
//! profile into the object that the page data file is rendered from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::{ContentSections, GeneratedContent, SeoMetadata};
use crate::research::{CompetitionLevel, Competitor, Coordinates, ResearchResult, TransportInfo};
use crate::seo::schema::build_location_schema;

/// A fixed-price care package offered at every location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarePackage {
    pub name: String,
    pub price: String,
    pub includes: Vec<String>,
}

/// Opening hours for a set of days, e.g. Monday-Saturday 09:00-20:00.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHours {
    pub days: Vec<String>,
    pub opens: String,
    pub closes: String,
}

/// Practice details shared by every location page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicProfile {
    pub name: String,
    pub doctor: String,
    pub doctor_qualifications: String,
    pub phone: String,
    pub email: String,
    pub street_address: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    /// Base URL of the website, without a trailing slash
    pub site_url: String,
    /// Opening hours as shown in prose
    pub opening_hours: String,
    pub opening_hours_spec: Vec<OpeningHours>,
    pub specialties: Vec<String>,
    pub insurance_accepted: Vec<String>,
    pub packages: Vec<CarePackage>,
    pub price_range: String,
}

impl Default for ClinicProfile {
    fn default() -> Self {
        let weekdays = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];
        Self {
            name: "Motherhood Women's Clinic".to_string(),
            doctor: "Dr. Ananya Rao".to_string(),
            doctor_qualifications: "MBBS, MS (Obstetrics & Gynaecology)".to_string(),
            phone: "+91-80-4000-1234".to_string(),
            email: "care@motherhoodclinic.example".to_string(),
            street_address: "12 Main Road".to_string(),
            state: "Karnataka".to_string(),
            postal_code: String::new(),
            country: "IN".to_string(),
            site_url: "https://www.motherhoodclinic.example".to_string(),
            opening_hours: "Monday to Saturday, 9 AM to 8 PM".to_string(),
            opening_hours_spec: vec![OpeningHours {
                days: weekdays.iter().map(|d| d.to_string()).collect(),
                opens: "09:00".to_string(),
                closes: "20:00".to_string(),
            }],
            specialties: vec!["Gynecologic".to_string(), "Obstetric".to_string()],
            insurance_accepted: ["Star Health", "HDFC ERGO", "ICICI Lombard", "Niva Bupa"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            packages: vec![
                CarePackage {
                    name: "Pregnancy Care Package".to_string(),
                    price: "₹25,000".to_string(),
                    includes: vec![
                        "Monthly prenatal checkups".to_string(),
                        "Routine scans".to_string(),
                        "Delivery planning".to_string(),
                    ],
                },
                CarePackage {
                    name: "Well-Woman Checkup".to_string(),
                    price: "₹3,500".to_string(),
                    includes: vec![
                        "Consultation".to_string(),
                        "Pap smear".to_string(),
                        "Pelvic ultrasound".to_string(),
                    ],
                },
            ],
            price_range: "₹₹".to_string(),
        }
    }
}

impl ClinicProfile {
    /// Canonical URL of a location page.
    pub fn page_url(&self, slug: &str) -> String {
        format!("{}{}", self.site_url.trim_end_matches('/'), page_path(slug))
    }
}

/// Site path of a location page.
pub fn page_path(slug: &str) -> String {
    format!("/gynecologist-in-{slug}")
}

/// Everything a location page is rendered from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSeoData {
    pub slug: String,
    pub display_name: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub url: String,
    pub coordinates: Coordinates,
    pub seo: SeoMetadata,
    pub content: ContentSections,
    pub landmarks: Vec<String>,
    pub nearby_areas: Vec<String>,
    pub hospitals: Vec<String>,
    pub transport: TransportInfo,
    pub competitors: Vec<Competitor>,
    pub search_volume: u32,
    pub competition_level: CompetitionLevel,
    pub clinic: ClinicProfile,
    /// JSON-LD `MedicalOrganization` object for the page head
    pub schema: serde_json::Value,
    pub generated_at: DateTime<Utc>,
}

impl LocationSeoData {
    /// Merge research, content and the clinic profile, and embed the
    /// JSON-LD schema.
    pub fn assemble(
        research: &ResearchResult,
        content: &GeneratedContent,
        clinic: &ClinicProfile,
    ) -> Self {
        let state = if research.state.trim().is_empty() {
            clinic.state.clone()
        } else {
            research.state.clone()
        };
        let mut data = Self {
            slug: content.slug.clone(),
            display_name: content.location.clone(),
            city: content.city.clone(),
            state,
            pincode: research.pincode.clone(),
            url: clinic.page_url(&content.slug),
            coordinates: research.coordinates,
            seo: content.seo.clone(),
            content: content.sections.clone(),
            landmarks: research.landmarks.clone(),
            nearby_areas: research.nearby_areas.clone(),
            hospitals: research.hospitals.clone(),
            transport: research.transport.clone(),
            competitors: research.competitors.clone(),
            search_volume: research.search_volume,
            competition_level: research.competition_level,
            clinic: clinic.clone(),
            schema: serde_json::Value::Null,
            generated_at: content.metadata.generated_at,
        };
        data.schema = build_location_schema(&data);
        data
    }

    pub fn page_path(&self) -> String {
        page_path(&self.slug)
    }

    /// The research facts carried by this record.
    pub fn research_view(&self) -> ResearchResult {
        ResearchResult {
            location: self.display_name.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            pincode: self.pincode.clone(),
            coordinates: self.coordinates,
            landmarks: self.landmarks.clone(),
            nearby_areas: self.nearby_areas.clone(),
            hospitals: self.hospitals.clone(),
            competitors: self.competitors.clone(),
            transport: self.transport.clone(),
            search_volume: self.search_volume,
            competition_level: self.competition_level,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentGenerationEngine;
    use crate::content::BrandVoice;
    use crate::lexicon::Lexicon;

    fn assembled(research: &ResearchResult) -> LocationSeoData {
        let engine = ContentGenerationEngine::new(
            Lexicon::default(),
            ClinicProfile::default(),
            BrandVoice {
                seed: Some(5),
                ..Default::default()
            },
        );
        let content = engine.generate_location_content(research, "Indira Nagar");
        LocationSeoData::assemble(research, &content, &ClinicProfile::default())
    }

    #[test]
    fn test_assemble_merges_research_and_clinic() {
        let research = ResearchResult {
            city: "Bangalore".to_string(),
            pincode: "560038".to_string(),
            coordinates: Coordinates::new(12.9784, 77.6408),
            landmarks: vec!["100 Feet Road".to_string()],
            search_volume: 880,
            ..Default::default()
        };
        let data = assembled(&research);

        assert_eq!(data.slug, "indira-nagar");
        assert_eq!(data.display_name, "Indira Nagar");
        assert_eq!(data.state, "Karnataka");
        assert_eq!(data.pincode, "560038");
        assert_eq!(data.search_volume, 880);
        assert_eq!(
            data.url,
            "https://www.motherhoodclinic.example/gynecologist-in-indira-nagar"
        );
        assert_eq!(data.schema["@type"][0], "MedicalOrganization");
        assert!(!data.clinic.insurance_accepted.is_empty());
    }

    #[test]
    fn test_serializes_camel_case() {
        let data = assembled(&ResearchResult::fallback("Indira Nagar", "Bangalore"));
        let json = serde_json::to_value(&data).unwrap();
        assert!(json.get("displayName").is_some());
        assert!(json.get("nearbyAreas").is_some());
        assert!(json.get("display_name").is_none());
    }

    #[test]
    fn test_page_path() {
        assert_eq!(page_path("domlur"), "/gynecologist-in-domlur");
    }
}
