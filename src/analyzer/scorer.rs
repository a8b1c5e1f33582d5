//! Rubric scorer: structured signals → score plus transparent breakdown
//!
//! `score` is a pure function over fields already present on the result.
//! All adjustments are additive and the sum is clamped to [0, 100] at the
//! end, so the application order only affects the breakdown listing, never
//! the final number.

use crate::analyzer::types::{AnalysisResult, ScoreDelta};

/// Alt-text penalty is 2 per image, capped at this total
const MAX_ALT_PENALTY: i32 = 10;

/// Computes the SEO score and its breakdown for a populated result
///
/// Deterministic and side-effect-free: identical inputs always yield the
/// identical `(score, breakdown)` pair.
pub fn score(result: &AnalysisResult) -> (i32, Vec<ScoreDelta>) {
    let mut total = 100;
    let mut breakdown = Vec::new();
    let seo = &result.seo_signals;
    let tech = &result.technical_signals;

    let apply = |breakdown: &mut Vec<ScoreDelta>, total: &mut i32, label: &str, delta: i32| {
        *total += delta;
        breakdown.push(ScoreDelta::new(label, delta));
    };

    // Title
    if seo.title.is_none() {
        apply(&mut breakdown, &mut total, "Missing title tag", -15);
    } else if seo.title_length < 30 {
        apply(&mut breakdown, &mut total, "Title too short", -5);
    } else if seo.title_length > 60 {
        apply(&mut breakdown, &mut total, "Title too long", -5);
    }

    // Meta description
    if seo.meta_description.is_none() {
        apply(&mut breakdown, &mut total, "Missing meta description", -10);
    } else if seo.meta_description_length < 120 {
        apply(&mut breakdown, &mut total, "Meta description too short", -5);
    } else if seo.meta_description_length > 160 {
        apply(&mut breakdown, &mut total, "Meta description too long", -5);
    }

    // H1
    let h1_count = seo.header_counts.get(&1).copied().unwrap_or(0);
    if h1_count == 0 {
        apply(&mut breakdown, &mut total, "Missing H1 tag", -10);
    } else if h1_count > 1 {
        apply(&mut breakdown, &mut total, "Multiple H1 tags", -5);
    }

    // Image alt text
    if seo.images_without_alt > 0 {
        let penalty = MAX_ALT_PENALTY.min(seo.images_without_alt as i32 * 2);
        apply(
            &mut breakdown,
            &mut total,
            &format!("{} images without alt text", seo.images_without_alt),
            -penalty,
        );
    }

    // Technical
    if !tech.is_https {
        apply(&mut breakdown, &mut total, "Not using HTTPS", -10);
    }
    if !tech.viewport_present {
        apply(&mut breakdown, &mut total, "Not mobile-friendly", -10);
    }
    if !tech.robots_txt_present {
        apply(&mut breakdown, &mut total, "Missing robots.txt", -5);
    }
    if !tech.sitemap_xml_present {
        apply(&mut breakdown, &mut total, "Missing sitemap.xml", -5);
    }

    // Load time
    if result.basic_info.load_time_score < 50 {
        apply(&mut breakdown, &mut total, "Slow load time", -10);
    }

    // Structured data bonus; additive, masked only by the final clamp
    if seo.has_schema {
        apply(&mut breakdown, &mut total, "Has Schema markup", 5);
    }

    (total.clamp(0, 100), breakdown)
}
