//! Schema.org JSON-LD for location pages.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::location::LocationSeoData;

/// Build the `MedicalOrganization` / `LocalBusiness` JSON-LD object for a
/// location page.
pub fn build_location_schema(data: &LocationSeoData) -> Value {
    let clinic = &data.clinic;

    let mut address = json!({
        "@type": "PostalAddress",
        "streetAddress": clinic.street_address,
        "addressLocality": data.display_name,
        "addressRegion": data.state,
        "addressCountry": clinic.country,
    });
    let postal_code = if data.pincode.is_empty() {
        &clinic.postal_code
    } else {
        &data.pincode
    };
    if !postal_code.is_empty() {
        address["postalCode"] = json!(postal_code);
    }

    let mut area_served = vec![json!({ "@type": "Place", "name": data.display_name })];
    area_served.extend(
        data.nearby_areas
            .iter()
            .map(|area| json!({ "@type": "Place", "name": area })),
    );
    if !data.city.is_empty() && data.city != data.display_name {
        area_served.push(json!({ "@type": "City", "name": data.city }));
    }

    let opening_hours: Vec<Value> = clinic
        .opening_hours_spec
        .iter()
        .map(|hours| {
            json!({
                "@type": "OpeningHoursSpecification",
                "dayOfWeek": hours.days,
                "opens": hours.opens,
                "closes": hours.closes,
            })
        })
        .collect();

    let mut schema = json!({
        "@context": "https://schema.org",
        "@type": ["MedicalOrganization", "LocalBusiness"],
        "name": format!("{} - {}", clinic.name, data.display_name),
        "description": data.seo.description,
        "url": data.url,
        "telephone": clinic.phone,
        "email": clinic.email,
        "priceRange": clinic.price_range,
        "address": address,
        "areaServed": area_served,
        "medicalSpecialty": clinic.specialties,
        "physician": {
            "@type": "Physician",
            "name": clinic.doctor,
            "description": clinic.doctor_qualifications,
            "medicalSpecialty": clinic.specialties,
        },
        "openingHoursSpecification": opening_hours,
        "paymentAccepted": clinic.insurance_accepted,
        "isAcceptingNewPatients": true,
    });
    if let (Some(latitude), Some(longitude)) =
        (data.coordinates.latitude, data.coordinates.longitude)
    {
        schema["geo"] = json!({
            "@type": "GeoCoordinates",
            "latitude": latitude,
            "longitude": longitude,
        });
    }
    schema
}

/// Outcome of validating a location's structured data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

pub struct SchemaValidator;

impl SchemaValidator {
    /// Check that a location can produce rich-snippet eligible JSON-LD.
    ///
    /// Missing or zero coordinates, or an empty name, telephone or locality,
    /// make the schema invalid.
    pub fn validate_location_schema(data: &LocationSeoData) -> SchemaValidation {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if !is_set(data.coordinates.latitude) {
            errors.push("latitude is missing or zero".to_string());
        }
        if !is_set(data.coordinates.longitude) {
            errors.push("longitude is missing or zero".to_string());
        }
        if data.clinic.name.trim().is_empty() {
            errors.push("organization name is empty".to_string());
        }
        if data.clinic.phone.trim().is_empty() {
            errors.push("telephone is empty".to_string());
        }
        if data.display_name.trim().is_empty() {
            errors.push("address locality is empty".to_string());
        }

        let schema = &data.schema;
        if schema.is_null() {
            errors.push("schema has not been generated".to_string());
        } else {
            if schema["@context"] != "https://schema.org" {
                errors.push("@context must be https://schema.org".to_string());
            }
            let has_medical_type = schema["@type"]
                .as_array()
                .is_some_and(|types| types.iter().any(|t| t == "MedicalOrganization"));
            if !has_medical_type {
                errors.push("@type must include MedicalOrganization".to_string());
            }
        }

        if data.pincode.trim().is_empty() && data.clinic.postal_code.trim().is_empty() {
            warnings.push("postal code is missing".to_string());
        }
        if data.clinic.opening_hours_spec.is_empty() {
            warnings.push("opening hours are missing".to_string());
        }
        if data.nearby_areas.is_empty() {
            warnings.push("areaServed lists only the locality".to_string());
        }

        SchemaValidation {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

fn is_set(value: Option<f64>) -> bool {
    value.is_some_and(|v| v != 0.0 && v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::GeneratedContent;
    use crate::location::ClinicProfile;
    use crate::research::{Coordinates, ResearchResult};

    fn data_with(coordinates: Coordinates) -> LocationSeoData {
        let research = ResearchResult {
            coordinates,
            nearby_areas: vec!["Domlur".to_string()],
            pincode: "560038".to_string(),
            ..Default::default()
        };
        let content = GeneratedContent {
            location: "Indira Nagar".to_string(),
            city: "Bangalore".to_string(),
            slug: "indira-nagar".to_string(),
            ..Default::default()
        };
        LocationSeoData::assemble(&research, &content, &ClinicProfile::default())
    }

    #[test]
    fn test_valid_schema() {
        let data = data_with(Coordinates::new(12.97, 77.64));
        let validation = SchemaValidator::validate_location_schema(&data);
        assert!(validation.is_valid, "{:?}", validation.errors);
        assert!(validation.warnings.is_empty());
        assert_eq!(data.schema["geo"]["latitude"], 12.97);
        assert_eq!(data.schema["address"]["postalCode"], "560038");
        assert_eq!(data.schema["physician"]["@type"], "Physician");
    }

    #[test]
    fn test_missing_latitude_is_invalid() {
        let data = data_with(Coordinates {
            latitude: None,
            longitude: Some(77.64),
        });
        let validation = SchemaValidator::validate_location_schema(&data);
        assert!(!validation.is_valid);
        assert!(validation.errors[0].contains("latitude"));
        assert!(data.schema.get("geo").is_none());
    }

    #[test]
    fn test_zero_latitude_is_invalid() {
        let data = data_with(Coordinates::new(0.0, 77.64));
        assert!(!SchemaValidator::validate_location_schema(&data).is_valid);
    }

    #[test]
    fn test_empty_telephone_is_invalid() {
        let mut data = data_with(Coordinates::new(12.97, 77.64));
        data.clinic.phone.clear();
        let validation = SchemaValidator::validate_location_schema(&data);
        assert_eq!(validation.errors, vec!["telephone is empty"]);
    }

    #[test]
    fn test_area_served_includes_city_and_nearby() {
        let data = data_with(Coordinates::new(12.97, 77.64));
        let areas = data.schema["areaServed"].as_array().unwrap();
        assert_eq!(areas.len(), 3);
        assert_eq!(areas[2]["@type"], "City");
    }
}
