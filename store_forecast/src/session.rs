//! Per-user dashboard session
//!
//! A session owns its selection and every derived value; only the
//! [`DataStore`] is shared between sessions. Selection changes are
//! recomputed synchronously through the [`DependencyGraph`], in full and
//! without caching forecasts across recomputations.
//!
//! Every recomputation pass bumps the session generation. Oracle work is
//! tagged with the generation it was started in, and results from an older
//! generation are discarded instead of being applied.

use crate::data::DataStore;
use crate::error::{ForecastError, Result};
use crate::graph::{DependencyGraph, Node};
use crate::oracle::{CancellationToken, ForecastOracle, ForecastResult};
use crate::planner::{self, ForecastPlan, QuarterlyTraining};
use crate::selection::{
    ConfidenceLevel, Selection, SelectionChange, SelectionState, DEFAULT_MAX_QUARTERS,
};
use crate::series::Series;
use crate::stitch::{self, ComparisonSeries};
use forecast_math::stats::{self, HistogramBin, Summary};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{event, Level};

/// Knobs of a session that are not user controls
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Training policy of the quarterly planner
    pub quarterly_training: QuarterlyTraining,
    /// Fixed current week; defaults to the store's last observed week
    pub current_week: Option<u32>,
    /// Horizon of the confidence-interval view
    pub interval_horizon: usize,
    /// Bins of the sales distribution
    pub histogram_bins: usize,
    /// Upper bound on the quarter count control
    pub max_quarters: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            quarterly_training: QuarterlyTraining::default(),
            current_week: None,
            interval_horizon: 52,
            histogram_bins: 20,
            max_quarters: DEFAULT_MAX_QUARTERS,
        }
    }
}

/// A forecast together with the plan and level it answers
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastView {
    pub plan: ForecastPlan,
    pub result: ForecastResult,
    pub level: ConfidenceLevel,
}

/// Oracle work detached from the session, tagged with its generation
#[derive(Debug, Clone)]
pub struct ForecastTicket {
    plan: ForecastPlan,
    level: ConfidenceLevel,
    token: CancellationToken,
}

impl ForecastTicket {
    /// Generation the ticket was issued in
    pub fn generation(&self) -> u64 {
        self.token.generation()
    }

    /// Plan to forecast
    pub fn plan(&self) -> &ForecastPlan {
        &self.plan
    }

    /// Confidence level to request
    pub fn level(&self) -> ConfidenceLevel {
        self.level
    }

    /// Token the oracle polls for cancellation
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Invoke the oracle for this ticket
    pub fn run<O: ForecastOracle + ?Sized>(&self, oracle: &O) -> Result<ForecastResult> {
        if self.token.is_cancelled() {
            return Err(ForecastError::Cancelled);
        }

        event!(
            Level::INFO,
            oracle = oracle.name(),
            generation = self.generation(),
            store = %self.plan.training().store(),
            training = self.plan.training().len(),
            horizon = self.plan.horizon(),
            level = %self.level,
            "invoking forecast oracle"
        );
        let result = oracle.fit_and_forecast(
            self.plan.training(),
            self.plan.horizon(),
            &[self.level],
            &self.token,
        )?;
        self.check(result)
    }

    fn check(&self, result: ForecastResult) -> Result<ForecastResult> {
        if result.is_empty() {
            return Err(ForecastError::EmptyForecast);
        }
        if result.len() != self.plan.horizon() {
            return Err(ForecastError::OracleError(format!(
                "Oracle returned {} points for a {}-week horizon",
                result.len(),
                self.plan.horizon()
            )));
        }
        Ok(result)
    }

    fn into_view(self, result: ForecastResult) -> ForecastView {
        ForecastView {
            plan: self.plan,
            result,
            level: self.level,
        }
    }
}

type View<T> = Option<Result<T>>;

#[derive(Debug, Default)]
struct Views {
    series: View<Series>,
    current_week: Option<u32>,
    summary: View<Summary>,
    distribution: View<Vec<HistogramBin>>,
    plan: View<ForecastPlan>,
    forecast: View<ForecastView>,
    interval: View<ForecastView>,
    comparison: View<ComparisonSeries>,
}

/// One user's dashboard: selection, derived values and the oracle
#[derive(Debug)]
pub struct DashboardSession<O: ForecastOracle> {
    data: Arc<DataStore>,
    oracle: O,
    settings: SessionSettings,
    graph: DependencyGraph,
    selection: SelectionState,
    generation: Arc<AtomicU64>,
    views: Views,
}

impl<O: ForecastOracle> DashboardSession<O> {
    /// Open a session and compute every view for the initial selection
    pub fn new(
        data: Arc<DataStore>,
        oracle: O,
        selection: Selection,
        settings: SessionSettings,
    ) -> Result<Self> {
        let graph = DependencyGraph::dashboard()?;
        let selection = SelectionState::new(selection, settings.max_quarters)?;

        let mut session = Self {
            data,
            oracle,
            settings,
            graph,
            selection,
            generation: Arc::new(AtomicU64::new(0)),
            views: Views::default(),
        };
        session.refresh();
        Ok(session)
    }

    /// Apply one control change and recompute what depends on it.
    ///
    /// Returns the recomputed values, upstream first.
    pub fn apply(&mut self, change: SelectionChange) -> Result<Vec<Node>> {
        event!(Level::DEBUG, ?change, "selection change");
        self.selection.apply(change)?;
        Ok(self.refresh())
    }

    /// Apply several changes as one recomputation pass.
    ///
    /// Changes before an invalid one stay applied and are recomputed.
    pub fn apply_all<I>(&mut self, changes: I) -> Result<Vec<Node>>
    where
        I: IntoIterator<Item = SelectionChange>,
    {
        let mut outcome = Ok(());
        for change in changes {
            event!(Level::DEBUG, ?change, "selection change");
            if let Err(e) = self.selection.apply(change) {
                outcome = Err(e);
                break;
            }
        }
        let nodes = self.refresh();
        outcome.map(|_| nodes)
    }

    /// Recompute every value affected by pending input changes
    pub fn refresh(&mut self) -> Vec<Node> {
        let changed = self.selection.take_pending();
        if changed.is_empty() {
            return Vec::new();
        }

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let snapshot = self.selection.snapshot();
        let nodes = self.graph.affected_by(&changed);
        event!(Level::DEBUG, generation, ?changed, ?nodes, "recomputing views");

        for node in &nodes {
            self.recompute(*node, &snapshot, generation);
        }
        nodes
    }

    fn recompute(&mut self, node: Node, selection: &Selection, generation: u64) {
        match node {
            Node::Series => {
                let series = self.data.series(&selection.store);
                self.views.current_week = series
                    .as_ref()
                    .ok()
                    .and_then(|s| self.settings.current_week.or(s.last_week()));
                log_outcome(node, &series);
                self.views.series = Some(series);
            }
            Node::Summary => {
                let summary = self.with_series(|s| {
                    stats::summarize(&s.values()).map_err(|e| ForecastError::DataError(e.to_string()))
                });
                log_outcome(node, &summary);
                self.views.summary = Some(summary);
            }
            Node::Distribution => {
                let bins = self.settings.histogram_bins;
                let distribution = self.with_series(|s| {
                    stats::histogram(&s.values(), bins)
                        .map_err(|e| ForecastError::DataError(e.to_string()))
                });
                log_outcome(node, &distribution);
                self.views.distribution = Some(distribution);
            }
            Node::Plan => {
                let plan = self.with_series(|s| {
                    let current_week = self.current_week().ok_or_else(|| {
                        ForecastError::ValidationError("Current week is unknown".to_string())
                    })?;
                    planner::plan_for_selection(
                        s,
                        current_week,
                        selection,
                        self.settings.quarterly_training,
                    )
                });
                log_outcome(node, &plan);
                self.views.plan = Some(plan);
            }
            Node::Forecast => {
                let forecast = match &self.views.plan {
                    Some(Ok(plan)) => {
                        self.execute(plan.clone(), selection.confidence, generation)
                    }
                    Some(Err(e)) => Err(e.clone()),
                    None => Err(not_computed(Node::Plan)),
                };
                log_outcome(node, &forecast);
                self.views.forecast = Some(forecast);
            }
            Node::IntervalForecast => {
                let interval = self
                    .with_series(|s| planner::plan_full_history(s, self.settings.interval_horizon))
                    .and_then(|plan| self.execute(plan, selection.confidence, generation));
                log_outcome(node, &interval);
                self.views.interval = Some(interval);
            }
            Node::Comparison => {
                if !selection.compare_enabled {
                    self.views.comparison = None;
                    return;
                }
                let window = selection.comparison;
                let comparison = self.with_series(|s| {
                    let plan = planner::plan_full_history(s, window.future_weeks as usize)?;
                    let view = self.execute(plan, selection.confidence, generation)?;
                    stitch::stitch(
                        s,
                        &view.result,
                        view.plan.output_weeks(),
                        window.past_weeks as usize,
                    )
                });
                log_outcome(node, &comparison);
                self.views.comparison = Some(comparison);
            }
        }
    }

    fn with_series<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Series) -> Result<T>,
    {
        match &self.views.series {
            Some(Ok(series)) => f(series),
            Some(Err(e)) => Err(e.clone()),
            None => Err(not_computed(Node::Series)),
        }
    }

    fn ticket(&self, plan: ForecastPlan, level: ConfidenceLevel, generation: u64) -> ForecastTicket {
        ForecastTicket {
            plan,
            level,
            token: CancellationToken::new(generation, self.generation.clone()),
        }
    }

    fn execute(&self, plan: ForecastPlan, level: ConfidenceLevel, generation: u64) -> Result<ForecastView> {
        let ticket = self.ticket(plan, level, generation);
        let result = ticket.run(&self.oracle)?;
        Ok(ticket.into_view(result))
    }

    /// Detach the main forecast so it can run outside the session.
    ///
    /// Hand the ticket's result back through
    /// [`complete_forecast`](Self::complete_forecast).
    pub fn begin_forecast(&self) -> Result<ForecastTicket> {
        match &self.views.plan {
            Some(Ok(plan)) => Ok(self.ticket(
                plan.clone(),
                self.selection.current().confidence,
                self.generation(),
            )),
            Some(Err(e)) => Err(e.clone()),
            None => Err(not_computed(Node::Plan)),
        }
    }

    /// Apply a detached forecast result.
    ///
    /// Returns `false` and leaves the view untouched when the selection
    /// changed since the ticket was issued.
    pub fn complete_forecast(&mut self, ticket: ForecastTicket, result: Result<ForecastResult>) -> bool {
        if ticket.token.is_cancelled() {
            event!(
                Level::INFO,
                issued = ticket.generation(),
                current = self.generation(),
                "discarding stale forecast"
            );
            return false;
        }

        let forecast = result
            .and_then(|r| ticket.check(r))
            .map(|r| ticket.into_view(r));
        log_outcome(Node::Forecast, &forecast);
        self.views.forecast = Some(forecast);
        true
    }

    /// Current selection
    pub fn selection(&self) -> &Selection {
        self.selection.current()
    }

    /// Shared sales data
    pub fn data(&self) -> &DataStore {
        &self.data
    }

    /// Session settings
    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Dependency graph driving recomputation
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Forecasting oracle
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Number of recomputation passes so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Week forecasts start after, for the selected store
    pub fn current_week(&self) -> Option<u32> {
        self.views.current_week
    }

    /// Series of the selected store
    pub fn series(&self) -> Option<&Result<Series>> {
        self.views.series.as_ref()
    }

    /// Summary statistics of the selected store
    pub fn summary(&self) -> Option<&Result<Summary>> {
        self.views.summary.as_ref()
    }

    /// Weekly sales histogram of the selected store
    pub fn distribution(&self) -> Option<&Result<Vec<HistogramBin>>> {
        self.views.distribution.as_ref()
    }

    /// Window plan of the main forecast
    pub fn plan(&self) -> Option<&Result<ForecastPlan>> {
        self.views.plan.as_ref()
    }

    /// Main forecast
    pub fn forecast(&self) -> Option<&Result<ForecastView>> {
        self.views.forecast.as_ref()
    }

    /// Fixed-horizon forecast with confidence band
    pub fn interval_forecast(&self) -> Option<&Result<ForecastView>> {
        self.views.interval.as_ref()
    }

    /// Past-vs-forecast comparison; `None` while the comparison is off
    pub fn comparison(&self) -> Option<&Result<ComparisonSeries>> {
        self.views.comparison.as_ref()
    }
}

fn not_computed(node: Node) -> ForecastError {
    ForecastError::ValidationError(format!("{} has not been computed", node))
}

fn log_outcome<T>(node: Node, outcome: &Result<T>) {
    match outcome {
        Ok(_) => event!(Level::DEBUG, %node, "view recomputed"),
        Err(e) if e.is_recoverable() => {
            event!(Level::INFO, %node, error = %e, "view shows placeholder")
        }
        Err(e) => event!(Level::WARN, %node, error = %e, "view failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{SalesRecord, StoreId};
    use crate::oracle::AutoArimaOracle;

    fn data() -> Arc<DataStore> {
        let mut records = Vec::new();
        for week in 1..=30u32 {
            let w = f64::from(week);
            records.push(SalesRecord::new("1", week, 1000.0 + 20.0 * w + (w * 0.9).sin() * 50.0));
            records.push(SalesRecord::new("2", week, 500.0 + 5.0 * w + (w * 1.3).cos() * 30.0));
        }
        Arc::new(DataStore::from_records(records).unwrap())
    }

    fn session() -> DashboardSession<AutoArimaOracle> {
        let mut selection = Selection::new(StoreId::from("1"), 34);
        selection.mode = crate::selection::ForecastMode::Weekly;
        DashboardSession::new(data(), AutoArimaOracle::default(), selection, SessionSettings::default())
            .unwrap()
    }

    #[test]
    fn test_initial_pass_computes_every_view() {
        let session = session();
        assert_eq!(session.generation(), 1);
        assert_eq!(session.current_week(), Some(30));
        assert!(matches!(session.series(), Some(Ok(_))));
        assert!(matches!(session.summary(), Some(Ok(_))));
        assert!(matches!(session.distribution(), Some(Ok(_))));
        assert!(matches!(session.forecast(), Some(Ok(_))));
        assert!(matches!(session.interval_forecast(), Some(Ok(_))));
        assert!(session.comparison().is_none());
    }

    #[test]
    fn test_unchanged_selection_does_not_recompute() {
        let mut session = session();
        let nodes = session.apply(SelectionChange::TargetWeek(34)).unwrap();
        assert!(nodes.is_empty());
        assert_eq!(session.generation(), 1);
    }

    #[test]
    fn test_invalid_change_keeps_views() {
        let mut session = session();
        assert!(session.apply(SelectionChange::QuarterCount(0)).is_err());
        assert_eq!(session.generation(), 1);
        assert!(matches!(session.forecast(), Some(Ok(_))));
    }
}
