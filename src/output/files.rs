//! Renders and writes the files for a location page.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Serialize;
use tracing::{info, warn};

use super::{write_atomic, OutputError, OutputResult, RegistryEntry, LOCATIONS_DIR};
use crate::config::OutputConfig;
use crate::location::{page_path, ClinicProfile, LocationSeoData};
use crate::seo::SchemaValidator;

const SITEMAP_PATH: &str = "public/sitemap-locations.xml";
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// A file produced by the generator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub bytes: usize,
    /// Copy of the previous contents, when one was made
    pub backup: Option<PathBuf>,
    /// False in dry-run mode
    pub written: bool,
}

/// What a generation call produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationReport {
    pub files: Vec<GeneratedFile>,
    pub warnings: Vec<String>,
    pub dry_run: bool,
}

impl GenerationReport {
    pub fn written(&self) -> impl Iterator<Item = &GeneratedFile> {
        self.files.iter().filter(|f| f.written)
    }

    fn merge(&mut self, other: GenerationReport) {
        self.files.extend(other.files);
        self.warnings.extend(other.warnings);
    }
}

/// One `<url>` element of the locations sitemap.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub last_modified: DateTime<Utc>,
    pub priority: f32,
}

impl SitemapEntry {
    pub fn from_registry(entry: &RegistryEntry, clinic: &ClinicProfile) -> Self {
        Self {
            loc: clinic.page_url(&entry.slug),
            last_modified: entry.last_updated,
            priority: entry.priority.sitemap_weight(),
        }
    }
}

/// Writes page data files, pages and the sitemap under a site root.
#[derive(Debug, Clone)]
pub struct FileGenerator {
    root: PathBuf,
    dry_run: bool,
    backups: bool,
}

impl FileGenerator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dry_run: false,
            backups: true,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(config.root.clone())
            .with_dry_run(config.dry_run)
            .with_backups(config.backups)
    }

    /// Render files without writing them.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_backups(mut self, backups: bool) -> Self {
        self.backups = backups;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn data_file_path(&self, slug: &str) -> PathBuf {
        self.root.join(LOCATIONS_DIR).join(format!("{slug}.ts"))
    }

    pub fn page_file_path(&self, slug: &str) -> PathBuf {
        self.root
            .join("app")
            .join(page_path(slug).trim_start_matches('/'))
            .join("page.tsx")
    }

    pub fn sitemap_path(&self) -> PathBuf {
        self.root.join(SITEMAP_PATH)
    }

    /// Write the data file and the page for one location.
    ///
    /// An invalid JSON-LD schema does not stop generation; it is reported
    /// as a warning.
    pub fn generate(&self, data: &LocationSeoData) -> OutputResult<GenerationReport> {
        let mut report = GenerationReport {
            dry_run: self.dry_run,
            ..Default::default()
        };

        let schema = SchemaValidator::validate_location_schema(data);
        for error in &schema.errors {
            warn!(slug = %data.slug, "{}", error);
            report.warnings.push(format!("schema: {error}"));
        }
        report.warnings.extend(schema.warnings.iter().map(|w| format!("schema: {w}")));

        let data_file = render_data_file(data)?;
        report
            .files
            .push(self.emit(&self.data_file_path(&data.slug), &data_file)?);

        let page = render_page(data)?;
        report
            .files
            .push(self.emit(&self.page_file_path(&data.slug), &page)?);

        info!(
            slug = %data.slug,
            files = report.files.len(),
            dry_run = self.dry_run,
            "Generated location files"
        );
        Ok(report)
    }

    /// Write the locations sitemap for every registry entry.
    pub fn write_sitemap(
        &self,
        entries: &[RegistryEntry],
        clinic: &ClinicProfile,
    ) -> OutputResult<GenerationReport> {
        let urls: Vec<SitemapEntry> = entries
            .iter()
            .map(|entry| SitemapEntry::from_registry(entry, clinic))
            .collect();
        let xml = render_sitemap(&urls)?;
        let mut report = GenerationReport {
            dry_run: self.dry_run,
            ..Default::default()
        };
        if urls.is_empty() {
            report.warnings.push("sitemap has no locations".to_string());
        }
        report.files.push(self.emit(&self.sitemap_path(), &xml)?);
        Ok(report)
    }

    /// Generate the page files and refresh the sitemap in one call.
    pub fn generate_with_sitemap(
        &self,
        data: &LocationSeoData,
        entries: &[RegistryEntry],
    ) -> OutputResult<GenerationReport> {
        let mut report = self.generate(data)?;
        report.merge(self.write_sitemap(entries, &data.clinic)?);
        Ok(report)
    }

    fn emit(&self, path: &Path, contents: &str) -> OutputResult<GeneratedFile> {
        if self.dry_run {
            return Ok(GeneratedFile {
                path: path.to_path_buf(),
                bytes: contents.len(),
                backup: None,
                written: false,
            });
        }
        let backup = write_atomic(path, contents, self.backups)?;
        Ok(GeneratedFile {
            path: path.to_path_buf(),
            bytes: contents.len(),
            backup,
            written: true,
        })
    }
}

/// `indira-nagar` -> `indiraNagar`; identifiers never start with a digit.
fn camel_identifier(slug: &str) -> String {
    let mut ident = String::with_capacity(slug.len());
    for (i, part) in slug.split('-').filter(|p| !p.is_empty()).enumerate() {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                ident.push(first);
            } else {
                ident.extend(first.to_uppercase());
            }
            ident.push_str(chars.as_str());
        }
    }
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert_str(0, "location");
    }
    ident
}

fn pascal_identifier(slug: &str) -> String {
    let camel = camel_identifier(slug);
    let mut chars = camel.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => camel,
    }
}

/// Render `data/locations/<slug>.ts`.
pub fn render_data_file(data: &LocationSeoData) -> OutputResult<String> {
    let ident = format!("{}Data", camel_identifier(&data.slug));
    let json = serde_json::to_string_pretty(data)?;
    Ok(format!(
        "import type {{ LocationSEOData }} from '@/types/location';\n\
         \n\
         export const {ident}: LocationSEOData = {json};\n\
         \n\
         export default {ident};\n"
    ))
}

/// Render `app/gynecologist-in-<slug>/page.tsx` with the JSON-LD script.
pub fn render_page(data: &LocationSeoData) -> OutputResult<String> {
    let data_ident = format!("{}Data", camel_identifier(&data.slug));
    let component = format!("GynecologistIn{}Page", pascal_identifier(&data.slug));
    let title = serde_json::to_string(&data.seo.title)?;
    let description = serde_json::to_string(&data.seo.description)?;
    let keywords = serde_json::to_string(&data.seo.keywords)?;
    let canonical = serde_json::to_string(&data.url)?;
    let schema = serde_json::to_string(&script_safe_json(&data.schema)?)?;
    let slug = &data.slug;

    Ok(format!(
        r#"import type {{ Metadata }} from 'next';
import LocationPage from '@/components/location/LocationPage';
import {{ {data_ident} }} from '@/data/locations/{slug}';

export const metadata: Metadata = {{
  title: {title},
  description: {description},
  keywords: {keywords},
  alternates: {{ canonical: {canonical} }},
  openGraph: {{
    title: {title},
    description: {description},
    url: {canonical},
    type: 'website',
  }},
}};

const schemaJson = {schema};

export default function {component}() {{
  return (
    <>
      <script
        type="application/ld+json"
        dangerouslySetInnerHTML={{{{ __html: schemaJson }}}}
      />
      <LocationPage data={{{data_ident}}} />
    </>
  );
}}
"#
    ))
}

/// Serialize JSON for inlining in a `<script>` element.
///
/// `<`, `>` and `&` become unicode escapes so string values can never
/// close the element or open a comment.
pub fn script_safe_json<T: Serialize>(value: &T) -> OutputResult<String> {
    let json = serde_json::to_string(value)?;
    Ok(json
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

/// Render the locations sitemap.
pub fn render_sitemap(entries: &[SitemapEntry]) -> OutputResult<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let xml_err = |e: std::io::Error| OutputError::Xml(e.to_string());

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Start(
            BytesStart::new("urlset").with_attributes([("xmlns", SITEMAP_NS)]),
        ))
        .map_err(xml_err)?;
    for entry in entries {
        let lastmod = entry.last_modified.format("%Y-%m-%d").to_string();
        let priority = format!("{:.1}", entry.priority);
        writer
            .write_event(Event::Start(BytesStart::new("url")))
            .map_err(xml_err)?;
        for (tag, value) in [
            ("loc", entry.loc.as_str()),
            ("lastmod", lastmod.as_str()),
            ("changefreq", "weekly"),
            ("priority", priority.as_str()),
        ] {
            writer
                .write_event(Event::Start(BytesStart::new(tag)))
                .map_err(xml_err)?;
            writer
                .write_event(Event::Text(BytesText::new(value)))
                .map_err(xml_err)?;
            writer
                .write_event(Event::End(BytesEnd::new(tag)))
                .map_err(xml_err)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new("url")))
            .map_err(xml_err)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("urlset")))
        .map_err(xml_err)?;

    let mut xml =
        String::from_utf8(writer.into_inner()).map_err(|e| OutputError::Xml(e.to_string()))?;
    xml.push('\n');
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{BrandVoice, ContentGenerationEngine};
    use crate::lexicon::Lexicon;
    use crate::output::{LocationStatus, Priority};
    use crate::research::{CompetitionLevel, Coordinates, ResearchResult};
    use std::fs;
    use tempfile::TempDir;

    fn location(research: &ResearchResult) -> LocationSeoData {
        let engine = ContentGenerationEngine::new(
            Lexicon::default(),
            ClinicProfile::default(),
            BrandVoice {
                seed: Some(2),
                ..Default::default()
            },
        );
        let content = engine.generate_location_content(research, "Indira Nagar");
        LocationSeoData::assemble(research, &content, &ClinicProfile::default())
    }

    fn research() -> ResearchResult {
        ResearchResult {
            city: "Bangalore".to_string(),
            pincode: "560038".to_string(),
            coordinates: Coordinates::new(12.9784, 77.6408),
            nearby_areas: vec!["Domlur".to_string()],
            ..Default::default()
        }
    }

    fn registry_entry(slug: &str) -> RegistryEntry {
        let now = "2026-03-01T10:00:00Z".parse().unwrap();
        RegistryEntry {
            slug: slug.to_string(),
            display_name: slug.to_string(),
            status: LocationStatus::Active,
            priority: Priority::High,
            search_volume: 1500,
            competition_level: CompetitionLevel::Low,
            created_at: now,
            last_updated: now,
        }
    }

    #[test]
    fn test_paths_follow_site_layout() {
        let generator = FileGenerator::new("/site");
        assert_eq!(
            generator.data_file_path("indira-nagar"),
            PathBuf::from("/site/data/locations/indira-nagar.ts")
        );
        assert_eq!(
            generator.page_file_path("indira-nagar"),
            PathBuf::from("/site/app/gynecologist-in-indira-nagar/page.tsx")
        );
        assert_eq!(
            generator.sitemap_path(),
            PathBuf::from("/site/public/sitemap-locations.xml")
        );
    }

    #[test]
    fn test_generate_writes_data_and_page() {
        let dir = TempDir::new().unwrap();
        let generator = FileGenerator::new(dir.path());
        let data = location(&research());

        let report = generator.generate(&data).unwrap();

        assert_eq!(report.written().count(), 2);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        let data_file = fs::read_to_string(generator.data_file_path("indira-nagar")).unwrap();
        assert!(data_file.contains("export const indiraNagarData: LocationSEOData = {"));
        assert!(data_file.contains(r#""displayName": "Indira Nagar""#));

        let page = fs::read_to_string(generator.page_file_path("indira-nagar")).unwrap();
        assert!(page.contains(r#"type="application/ld+json""#));
        assert!(page.contains("dangerouslySetInnerHTML={{ __html: schemaJson }}"));
        assert!(page.contains("export default function GynecologistInIndiraNagarPage()"));
        assert!(page.contains("<LocationPage data={indiraNagarData} />"));
        assert!(page.contains(r#"\"MedicalOrganization\""#));
    }

    #[test]
    fn test_page_schema_cannot_close_script_element() {
        let mut data = location(&research());
        data.schema["name"] = serde_json::json!("Clinic</script><script>alert(1)</script> & Co");

        let page = render_page(&data).unwrap();

        assert!(page.contains(r"Clinic\\u003c/script\\u003e"));
        assert!(page.contains(r"\\u0026 Co"));
        assert!(!page.contains("</script>"));
        assert!(!page.contains("<script>alert"));
    }

    #[test]
    fn test_script_safe_json_parses_back() {
        let value = serde_json::json!({ "text": "a < b && c > d" });
        let escaped = script_safe_json(&value).unwrap();
        assert_eq!(escaped, r#"{"text":"a \u003c b \u0026\u0026 c \u003e d"}"#);
        let parsed: serde_json::Value = serde_json::from_str(&escaped).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_regenerate_keeps_backup() {
        let dir = TempDir::new().unwrap();
        let generator = FileGenerator::new(dir.path());
        let data = location(&research());

        generator.generate(&data).unwrap();
        let report = generator.generate(&data).unwrap();

        assert!(report.files.iter().all(|f| f.backup.is_some()));
        assert!(dir.path().join("data/locations/indira-nagar.ts.bak").exists());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let generator = FileGenerator::new(dir.path()).with_dry_run(true);
        let data = location(&research());

        let report = generator.generate(&data).unwrap();

        assert!(report.dry_run);
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.written().count(), 0);
        assert!(report.files.iter().all(|f| f.bytes > 0));
        assert!(!generator.data_file_path("indira-nagar").exists());
    }

    #[test]
    fn test_invalid_schema_becomes_warning() {
        let dir = TempDir::new().unwrap();
        let generator = FileGenerator::new(dir.path());
        let data = location(&ResearchResult::fallback("Indira Nagar", "Bangalore"));

        let report = generator.generate(&data).unwrap();

        assert_eq!(report.written().count(), 2);
        assert!(report.warnings.iter().any(|w| w.contains("latitude")));
    }

    #[test]
    fn test_sitemap_lists_registry_entries() {
        let dir = TempDir::new().unwrap();
        let generator = FileGenerator::new(dir.path());
        let entries = vec![registry_entry("indira-nagar"), registry_entry("domlur")];

        generator
            .write_sitemap(&entries, &ClinicProfile::default())
            .unwrap();

        let xml = fs::read_to_string(generator.sitemap_path()).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
        assert!(xml.contains(
            "<loc>https://www.motherhoodclinic.example/gynecologist-in-indira-nagar</loc>"
        ));
        assert!(xml.contains("<lastmod>2026-03-01</lastmod>"));
        assert!(xml.contains("<priority>0.9</priority>"));
        assert_eq!(xml.matches("<url>").count(), 2);
    }

    #[test]
    fn test_sitemap_escapes_text() {
        let xml = render_sitemap(&[SitemapEntry {
            loc: "https://example.com/?a=1&b=2".to_string(),
            last_modified: Utc::now(),
            priority: 0.5,
        }])
        .unwrap();
        assert!(xml.contains("a=1&amp;b=2"));
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(camel_identifier("indira-nagar"), "indiraNagar");
        assert_eq!(pascal_identifier("hsr-layout-sector-2"), "HsrLayoutSector2");
        assert_eq!(camel_identifier("5th-block"), "location5thBlock");
    }
}
