//! Section templates and placeholder rendering.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("valid placeholder regex"));

/// Hero section. `{opening}` is chosen by the engine.
pub const HERO: &str = "{opening} in {location}. {clinic} brings experienced women's health care \
to families in {location}, {city}, with pregnancy care, fertility treatment and gynecology \
services under one roof. Our doctor and team make sure you feel informed and comfortable at every \
visit, from a first checkup to long-term care.";

pub const DEMOGRAPHICS: &str = "{location} is home to {population}, and many young families and \
working women here need a gynecologist they can reach without a long commute. Our team speaks \
{languages}, so every conversation about your health is clear. We see women from {location} \
and from {nearby} for routine care and for complex needs alike.";

pub const SERVICES: &str = "Our gynecologist in {location} offers complete women's health \
services. Pregnancy care covers every prenatal checkup, antenatal care, scans and planning for a \
normal delivery, with close monitoring for a high-risk pregnancy. Fertility treatment starts \
with a careful evaluation and may include ovulation tracking, IUI and referral for IVF when it \
is the right step. We provide PCOS treatment with diet, lifestyle and medical support, and we \
manage menstrual health concerns such as heavy or painful periods. When surgery is needed, our \
specialist performs laparoscopic surgery and hysteroscopy with short recovery times. Families \
in {location} can also book well-woman checkups, cervical screening and menopause care.";

pub const WHY_CHOOSE_US: &str = "Women in {location} choose {clinic} because {doctor} takes \
time to listen. Each plan is explained in plain words. Our clinic follows strict safety and \
hygiene standards. We keep waiting times short and share reports quickly. Our gynecologist works \
with trusted hospitals such as {hospitals} for deliveries and procedures, so your care \
continues smoothly if you need admission.";

pub const ACCESSIBILITY: &str = "Reaching our gynecologist from {location} is easy. The clinic \
is close to {landmarks}. Metro riders can use {metro}. Buses on {bus_routes} stop \
nearby, and the clinic is a short drive from {roads}. Parking and step-free access are \
available.";

pub const COMPETITIVE_EDGE: &str = "There are {competitor_count} women's health clinics around \
{location}. We stand apart through continuity of care: the same doctor follows your pregnancy \
from the first visit to delivery. We offer transparent package pricing and same-week \
appointments for new patients.";

pub const CTA: &str = "Book an appointment with our gynecologist in {location} today. Call us \
or use the online booking form at /book-appointment to choose a time that suits you.";

/// FAQ templates as (question, answer) pairs.
pub const FAQ: [(&str, &str); 5] = [
    (
        "Where is the gynecologist clinic in {location}?",
        "Our clinic serves {location} and is close to {landmarks}. It is easy to reach from \
{nearby}.",
    ),
    (
        "Do you offer pregnancy care in {location}?",
        "Yes. We offer complete pregnancy care, from the first prenatal checkup to delivery \
planning, for women in {location} and {city}.",
    ),
    (
        "How do I reach the clinic by public transport?",
        "Take the metro to {metro}, then a short auto ride. Buses on {bus_routes} also stop \
close to the clinic.",
    ),
    (
        "Can I consult a gynecologist about PCOS or irregular periods?",
        "Yes. Our doctor sees many women with PCOS and menstrual health concerns. A visit starts \
with a full history and a clear plan.",
    ),
    (
        "What are the clinic timings?",
        "We are open {hours}. Please call ahead for same-day appointments.",
    ),
];

/// Paragraphs appended to thin pages, as (section, template) pairs.
pub const AREA_PARAGRAPHS: [(&str, &str); 3] = [
    (
        "demographics",
        "Families in {location} often tell us that having a gynecologist close to home makes \
regular care easier. Short travel times mean fewer missed visits during pregnancy, quicker \
follow-up after tests and less stress for working women who need to fit care around a busy day.",
    ),
    (
        "accessibility",
        "If you are coming from {nearby}, allow a few extra minutes at peak hours. Our front desk \
can share directions, suggest a quiet time to arrive and call you the day before your visit.",
    ),
    (
        "why_choose_us",
        "Every visit at {clinic} starts with time to talk. We explain test results in plain words, \
write down the next steps and make sure you know whom to call with questions later. Many women \
from {location} stay with us from their first checkup through pregnancy and beyond.",
    ),
];

/// FAQ entries added when a page has too few.
pub const EXTRA_FAQ: [(&str, &str); 3] = [
    (
        "Do you offer fertility treatment in {location}?",
        "Yes. Couples from {location} can start with a fertility evaluation at our clinic, and we \
explain every option before any treatment begins.",
    ),
    (
        "Which insurance plans do you accept?",
        "We accept most major health insurance plans. Please call us with your policy details \
before your visit.",
    ),
    (
        "Do I need a referral to see the gynecologist?",
        "No referral is needed. You can book a visit directly by phone or online.",
    ),
];

/// Placeholder values for a template render.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    values: BTreeMap<String, String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a placeholder value. `key` is given without braces.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Renders a template string by substituting `{placeholder}` with context
/// values in a single pass. Unknown placeholders are left as-is and
/// substituted values are never expanded again.
pub fn render_template(template: &str, context: &TemplateContext) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match context.values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Join list items as prose: "A", "A and B", "A, B and C".
///
/// Returns `fallback` for an empty list.
pub fn join_list(items: &[String], limit: usize, fallback: &str) -> String {
    let items: Vec<&str> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(limit)
        .collect();
    match items.as_slice() {
        [] => fallback.to_string(),
        [one] => one.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

/// Generates a slug from a location name for use in paths.
///
/// Converts to lowercase, replaces spaces and special characters with hyphens,
/// and removes consecutive hyphens.
pub fn slugify(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();

    let mut result = String::new();
    let mut last_was_hyphen = true; // skips leading hyphens

    for c in slug.chars() {
        if c == '-' {
            if !last_was_hyphen {
                result.push(c);
                last_was_hyphen = true;
            }
        } else {
            result.push(c);
            last_was_hyphen = false;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_template() {
        let ctx = TemplateContext::new()
            .with("location", "Indira Nagar")
            .with("city", "Bangalore");
        let rendered = render_template("{location}, {city} - {unknown}", &ctx);
        assert_eq!(rendered, "Indira Nagar, Bangalore - {unknown}");
    }

    #[test]
    fn test_render_template_repeated_placeholder() {
        let ctx = TemplateContext::new().with("location", "Domlur");
        assert_eq!(render_template("{location} {location}", &ctx), "Domlur Domlur");
    }

    #[test]
    fn test_render_template_does_not_expand_values() {
        let ctx = TemplateContext::new()
            .with("clinic", "Care {city} {unknown}")
            .with("city", "Bangalore");
        assert_eq!(
            render_template("{clinic} in {city}", &ctx),
            "Care {city} {unknown} in Bangalore"
        );
        assert_eq!(render_template("{ city } {}", &ctx), "{ city } {}");
    }

    #[test]
    fn test_join_list() {
        let items = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert_eq!(join_list(&items, 5, "none"), "A, B and C");
        assert_eq!(join_list(&items, 2, "none"), "A and B");
        assert_eq!(join_list(&items[..1], 5, "none"), "A");
        assert_eq!(join_list(&[], 5, "none"), "none");
        assert_eq!(join_list(&[" ".to_string()], 5, "none"), "none");
    }

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Indira Nagar"), "indira-nagar");
    }

    #[test]
    fn test_slugify_special_characters() {
        assert_eq!(slugify("HSR Layout (Sector 2)!"), "hsr-layout-sector-2");
    }

    #[test]
    fn test_slugify_leading_trailing_special() {
        assert_eq!(slugify("--Koramangala--"), "koramangala");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_templates_only_use_known_placeholders() {
        let known = [
            "opening", "location", "city", "clinic", "doctor", "population", "languages",
            "nearby", "hospitals", "landmarks", "metro", "bus_routes", "roads",
            "competitor_count", "hours",
        ];
        let mut ctx = TemplateContext::new();
        for key in known {
            ctx = ctx.with(key, "x");
        }
        let mut all: Vec<&str> = vec![
            HERO,
            DEMOGRAPHICS,
            SERVICES,
            WHY_CHOOSE_US,
            ACCESSIBILITY,
            COMPETITIVE_EDGE,
            CTA,
        ];
        for (q, a) in FAQ.into_iter().chain(EXTRA_FAQ) {
            all.push(q);
            all.push(a);
        }
        all.extend(AREA_PARAGRAPHS.into_iter().map(|(_, template)| template));
        for template in all {
            let rendered = render_template(template, &ctx);
            assert!(!rendered.contains('{'), "unrendered placeholder in {rendered}");
        }
    }
}
