//! `analyze_fundamentals` request and reply.

use serde::{Deserialize, Serialize};

/// Parameters for candidate selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundamentalRequest {
    /// Sector to screen (all sectors when absent).
    pub sector: Option<String>,
    /// Screening criteria.
    pub criteria: Vec<String>,
    /// Maximum number of candidates to return.
    pub max_companies: u32,
}

/// One ranked candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateCompany {
    /// Ticker symbol.
    #[serde(alias = "symbol")]
    pub ticker: String,
    /// Fundamental score.
    #[serde(default, alias = "overall_score")]
    pub score: f64,
    /// Analyst recommendation.
    #[serde(default)]
    pub recommendation: Option<String>,
    /// Notable strengths.
    #[serde(default)]
    pub strengths: Vec<String>,
    /// Notable weaknesses.
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

/// Reply to `analyze_fundamentals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalAnalysis {
    /// Candidates, best first.
    pub companies: Vec<CandidateCompany>,
    /// Analysis summary.
    #[serde(default)]
    pub summary: Option<String>,
}

impl FundamentalAnalysis {
    /// Highest ranked candidate.
    #[must_use]
    pub fn top_candidate(&self) -> Option<&CandidateCompany> {
        self.companies.first()
    }
}
