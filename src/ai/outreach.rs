//! Outreach composition: a short persuasive message per main site
//!
//! The AI path summarizes the site's standing against its competitors; the
//! template path is the terminal fallback and always succeeds.

use crate::ai::RotatingGenerator;
use crate::analyzer::AnalysisResult;
use serde_json::json;
use std::sync::Arc;
use url::Url;

/// Issues quoted in the AI prompt
const PROMPT_ISSUE_CAP: usize = 5;
/// Advantages listed per higher-scoring competitor
const ADVANTAGE_CAP: usize = 3;
/// Issues quoted in the template fallback
const TEMPLATE_ISSUE_CAP: usize = 2;

/// Composes outreach messages, preferring AI generation over the template
pub struct OutreachComposer {
    generator: Option<Arc<RotatingGenerator>>,
}

impl OutreachComposer {
    pub fn new(generator: Option<Arc<RotatingGenerator>>) -> Self {
        Self { generator }
    }

    /// Builds the message for one main site; never fails
    pub async fn compose(
        &self,
        main: &AnalysisResult,
        competitors: &[AnalysisResult],
    ) -> String {
        if let Some(generator) = &self.generator {
            let prompt = outreach_prompt(main, competitors);
            match generator.generate(&prompt).await {
                Ok(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        return text.to_string();
                    }
                    tracing::debug!("Empty outreach response for {}", main.url);
                }
                Err(e) => {
                    tracing::warn!("Outreach generation failed for {}: {}", main.url, e);
                }
            }
        }
        template_message(main, competitors)
    }
}

/// Mean score over competitors that analyzed successfully; 0 when none did
fn competitor_average(competitors: &[AnalysisResult]) -> f64 {
    let scores: Vec<i32> = competitors
        .iter()
        .filter(|c| c.error.is_none())
        .map(|c| c.seo_score)
        .collect();
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<i32>() as f64 / scores.len() as f64
    }
}

fn host_of(raw: &str) -> String {
    Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| raw.to_string())
}

fn outreach_prompt(main: &AnalysisResult, competitors: &[AnalysisResult]) -> String {
    let average = competitor_average(competitors);

    // For each competitor that outscores the main site, list the issues the
    // main site carries that the competitor does not
    let disadvantages: Vec<serde_json::Value> = competitors
        .iter()
        .filter(|c| c.seo_score > main.seo_score)
        .map(|c| {
            let their_advantages: Vec<&String> = main
                .issues
                .iter()
                .filter(|issue| !c.issues.contains(issue))
                .take(ADVANTAGE_CAP)
                .collect();
            json!({
                "competitor": host_of(&c.url),
                "score_diff": c.seo_score - main.seo_score,
                "their_advantages": their_advantages,
            })
        })
        .collect();
    let disadvantages_json = serde_json::to_string_pretty(&disadvantages)
        .unwrap_or_else(|_| "[]".to_string());

    let top_issues = main
        .issues
        .iter()
        .take(PROMPT_ISSUE_CAP)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Create a brief, personalized outreach message for {url} based on this SEO analysis data.

Website Analysis:
- SEO Score: {score}/100
- Average Competitor Score: {average:.0}/100
- Main Issues: {top_issues}
- Total Issues Found: {issue_count}

Competitor Advantages:
{disadvantages_json}

Create a SHORT (max 150 words), direct outreach message that:
1. Opens with their specific competitive disadvantage (if any)
2. Mentions 1-2 specific issues hurting their ranking
3. Quantifies potential impact (traffic/revenue increase)
4. Ends with a clear call to action

Be specific, data-driven, and avoid generic marketing fluff. Write as if you're a helpful expert, not a salesperson.

IMPORTANT: Return ONLY the message text, no explanations or formatting."#,
        url = main.url,
        score = main.seo_score,
        issue_count = main.issues.len(),
    )
}

/// Template fallback, the path of last resort
fn template_message(main: &AnalysisResult, competitors: &[AnalysisResult]) -> String {
    let average = competitor_average(competitors);
    let domain = host_of(&main.url);

    let opening = if (main.seo_score as f64) < average {
        format!(
            "Your competitors are outranking {} with {:.0} points higher SEO scores.",
            domain,
            average - main.seo_score as f64
        )
    } else {
        format!(
            "While {} performs well, there are opportunities to extend your lead.",
            domain
        )
    };

    let issues_text = if main.issues.is_empty() {
        "Several technical improvements needed".to_string()
    } else {
        format!(
            "Key issues: {}",
            main.issues
                .iter()
                .take(TEMPLATE_ISSUE_CAP)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        )
    };

    format!(
        "{} {}.\nOur analysis shows fixing these could increase organic traffic by 25-40% \
         within 3 months.\nInterested in seeing the full competitive analysis report?",
        opening, issues_text
    )
}
