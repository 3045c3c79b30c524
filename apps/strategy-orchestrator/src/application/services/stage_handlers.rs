//! Stage handler table.
//!
//! Each stage has one handler that knows how to build its request from
//! what earlier stages left in the [`StageContext`] and how to read the
//! collaborator's reply as a proceed/stop decision. The orchestrator looks
//! handlers up by [`Stage`]; there is no string-based method routing.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::PipelineSettings;
use crate::domain::trading::{
    CandidateCompany, ExecutionReport, ExecutionRequest, FundamentalAnalysis, FundamentalRequest,
    PayloadError, RiskEvaluation, TechnicalAnalysis, TechnicalRequest, TradeOutcome,
    TradeProposal,
};
use crate::domain::workflow::{Stage, StrategyInput};

/// What a stage's reply means for the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageDecision {
    /// Move to the next stage.
    Proceed,
    /// Stop with a normal, non-error outcome.
    Stop {
        /// Why the collaborator said stop.
        reason: String,
    },
}

/// Facts carried from one stage to the next within a workflow.
#[derive(Debug, Clone)]
pub struct StageContext {
    /// Submitted strategy.
    pub strategy: StrategyInput,
    /// Candidate chosen by fundamental analysis.
    pub candidate: Option<CandidateCompany>,
    /// Technical analysis of the candidate.
    pub technical: Option<TechnicalAnalysis>,
    /// Sized trade sent to risk.
    pub proposal: Option<TradeProposal>,
    /// Quantity cleared by risk.
    pub approved_quantity: Option<u64>,
    /// Collaborator warnings not yet copied onto the workflow.
    pub warnings: Vec<String>,
    /// Execution outcome not yet copied onto the workflow.
    pub trade: Option<TradeOutcome>,
}

impl StageContext {
    /// Fresh context for a strategy.
    #[must_use]
    pub const fn new(strategy: StrategyInput) -> Self {
        Self {
            strategy,
            candidate: None,
            technical: None,
            proposal: None,
            approved_quantity: None,
            warnings: Vec::new(),
            trade: None,
        }
    }

    fn candidate(&self) -> Result<&CandidateCompany, PayloadError> {
        self.candidate
            .as_ref()
            .ok_or(PayloadError::MissingContext("selected candidate"))
    }

    fn proposal(&self) -> Result<&TradeProposal, PayloadError> {
        self.proposal
            .as_ref()
            .ok_or(PayloadError::MissingContext("trade proposal"))
    }
}

/// Builds one stage's request and interprets its reply.
pub trait StageHandler: Send + Sync {
    /// Stage handled.
    fn stage(&self) -> Stage;

    /// Request parameters for the stage's remote method.
    fn build_params(
        &self,
        ctx: &StageContext,
        settings: &PipelineSettings,
    ) -> Result<Map<String, Value>, PayloadError>;

    /// Read the reply, update the context and decide.
    fn interpret(
        &self,
        payload: &Value,
        ctx: &mut StageContext,
        settings: &PipelineSettings,
    ) -> Result<StageDecision, PayloadError>;
}

fn to_params<T: Serialize>(request: &T) -> Result<Map<String, Value>, PayloadError> {
    match serde_json::to_value(request)? {
        Value::Object(map) => Ok(map),
        other => Err(PayloadError::Contract(format!(
            "request must serialize to an object, got {other}"
        ))),
    }
}

fn decode<T: DeserializeOwned>(payload: &Value) -> Result<T, PayloadError> {
    Ok(T::deserialize(payload)?)
}

// ============================================================================
// Fundamental
// ============================================================================

/// `analyze_fundamentals`: pick the top-ranked candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FundamentalStage;

impl StageHandler for FundamentalStage {
    fn stage(&self) -> Stage {
        Stage::Fundamental
    }

    fn build_params(
        &self,
        ctx: &StageContext,
        settings: &PipelineSettings,
    ) -> Result<Map<String, Value>, PayloadError> {
        to_params(&FundamentalRequest {
            sector: ctx.strategy.sector_preference.clone(),
            criteria: settings.criteria.clone(),
            max_companies: settings.max_companies,
        })
    }

    fn interpret(
        &self,
        payload: &Value,
        ctx: &mut StageContext,
        _settings: &PipelineSettings,
    ) -> Result<StageDecision, PayloadError> {
        let analysis: FundamentalAnalysis = decode(payload)?;
        let Some(top) = analysis.top_candidate() else {
            return Ok(StageDecision::Stop {
                reason: "no suitable candidates".to_string(),
            });
        };
        if top.ticker.trim().is_empty() {
            return Err(PayloadError::Contract("candidate has an empty ticker".into()));
        }
        ctx.candidate = Some(top.clone());
        Ok(StageDecision::Proceed)
    }
}

// ============================================================================
// Technical
// ============================================================================

/// `analyze_technical`: proceed only on a buy signal, then size the trade.
#[derive(Debug, Clone, Copy, Default)]
pub struct TechnicalStage;

impl StageHandler for TechnicalStage {
    fn stage(&self) -> Stage {
        Stage::Technical
    }

    fn build_params(
        &self,
        ctx: &StageContext,
        settings: &PipelineSettings,
    ) -> Result<Map<String, Value>, PayloadError> {
        to_params(&TechnicalRequest {
            ticker: ctx.candidate()?.ticker.clone(),
            timeframe: settings.timeframe.clone(),
        })
    }

    fn interpret(
        &self,
        payload: &Value,
        ctx: &mut StageContext,
        settings: &PipelineSettings,
    ) -> Result<StageDecision, PayloadError> {
        let analysis: TechnicalAnalysis = decode(payload)?;
        let ticker = ctx.candidate()?.ticker.clone();

        if !analysis.is_entry() {
            let reason = format!(
                "technical signal {} for {ticker}",
                analysis.signal.as_str()
            );
            ctx.technical = Some(analysis);
            return Ok(StageDecision::Stop { reason });
        }

        let entry_price = analysis
            .entry_price
            .ok_or_else(|| PayloadError::Contract("BUY signal without entry_price".into()))?;
        let proposal = TradeProposal::size(
            ticker,
            entry_price,
            ctx.strategy.max_investment,
            settings.max_single_trade_value,
        )?;

        ctx.technical = Some(analysis);
        ctx.proposal = Some(proposal);
        Ok(StageDecision::Proceed)
    }
}

// ============================================================================
// Risk
// ============================================================================

/// `evaluate_trade`: proceed on approval with the cleared quantity.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskStage;

impl StageHandler for RiskStage {
    fn stage(&self) -> Stage {
        Stage::Risk
    }

    fn build_params(
        &self,
        ctx: &StageContext,
        _settings: &PipelineSettings,
    ) -> Result<Map<String, Value>, PayloadError> {
        to_params(&ctx.proposal()?.to_risk_request())
    }

    fn interpret(
        &self,
        payload: &Value,
        ctx: &mut StageContext,
        _settings: &PipelineSettings,
    ) -> Result<StageDecision, PayloadError> {
        let evaluation: RiskEvaluation = decode(payload)?;
        let proposed = ctx.proposal()?.quantity;

        ctx.warnings.extend(evaluation.warnings.iter().cloned());

        if !evaluation.is_approved() {
            return Ok(StageDecision::Stop {
                reason: evaluation.denial_reason(),
            });
        }

        let quantity = evaluation.execution_quantity(proposed);
        if quantity == 0 {
            return Err(PayloadError::Contract(
                "trade approved with zero quantity".into(),
            ));
        }
        ctx.approved_quantity = Some(quantity);
        Ok(StageDecision::Proceed)
    }
}

// ============================================================================
// Execution
// ============================================================================

/// `execute_trade`: place the approved order and report the fill.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutionStage;

impl ExecutionStage {
    fn request(
        ctx: &StageContext,
        settings: &PipelineSettings,
    ) -> Result<ExecutionRequest, PayloadError> {
        let proposal = ctx.proposal()?;
        let quantity = ctx
            .approved_quantity
            .ok_or(PayloadError::MissingContext("approved quantity"))?;
        Ok(ExecutionRequest {
            ticker: proposal.ticker.clone(),
            action: proposal.action,
            quantity,
            order_type: settings.order_type,
        })
    }
}

impl StageHandler for ExecutionStage {
    fn stage(&self) -> Stage {
        Stage::Execution
    }

    fn build_params(
        &self,
        ctx: &StageContext,
        settings: &PipelineSettings,
    ) -> Result<Map<String, Value>, PayloadError> {
        to_params(&Self::request(ctx, settings)?)
    }

    fn interpret(
        &self,
        payload: &Value,
        ctx: &mut StageContext,
        settings: &PipelineSettings,
    ) -> Result<StageDecision, PayloadError> {
        let report: ExecutionReport = decode(payload)?;
        if report.is_executed() && report.trade_id.is_none() {
            return Err(PayloadError::Contract("EXECUTED without trade_id".into()));
        }

        let request = Self::request(ctx, settings)?;
        let executed = report.is_executed();
        let reason = report.reason.clone();
        ctx.trade = Some(TradeOutcome::from_report(&request, report));

        if executed {
            Ok(StageDecision::Proceed)
        } else {
            Ok(StageDecision::Stop {
                reason: reason.unwrap_or_else(|| "execution failed at venue".to_string()),
            })
        }
    }
}

// ============================================================================
// Lookup table
// ============================================================================

/// Stage → handler table.
pub struct StageHandlers {
    handlers: [Box<dyn StageHandler>; 4],
}

impl StageHandlers {
    /// Handler for a stage.
    #[must_use]
    pub fn get(&self, stage: Stage) -> &dyn StageHandler {
        self.handlers[stage.index()].as_ref()
    }
}

impl Default for StageHandlers {
    fn default() -> Self {
        Self {
            handlers: [
                Box::new(FundamentalStage),
                Box::new(TechnicalStage),
                Box::new(RiskStage),
                Box::new(ExecutionStage),
            ],
        }
    }
}

impl std::fmt::Debug for StageHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|h| h.stage()))
            .finish()
    }
}
