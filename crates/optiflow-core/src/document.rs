//! Configuration document types and builder.
//!
//! A configuration document is the declarative description of one
//! optimization session: what to decide (variables), what must hold
//! (constraints), what to optimize (objective), which domain data applies,
//! and which protocol steps to run.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::domain::{DomainModel, FleetModel, InventoryModel, ProductionModel, SchedulingModel};
use crate::error::{OptiflowError, Result};
use crate::types::{
    ConstraintOperator, ConstraintPriority, DataQuality, DocumentStatus, Industry, ObjectiveType,
    ProblemType, VariableType,
};

/// The declarative optimization-problem description run by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationDocument {
    /// Opaque identifier of the logical optimization session.
    pub session_id: String,

    /// Variables, constraints, objective and the optional domain sub-model.
    pub model: Model,

    /// Descriptive metadata; selects which domain rules apply.
    pub context: ProblemContext,

    /// Ordered protocol steps and run flags.
    pub protocol: Protocol,

    /// Semantic version (`major.minor.patch`).
    pub version: String,

    pub created: DateTime<Utc>,

    pub last_modified: DateTime<Utc>,

    pub status: DocumentStatus,
}

impl ConfigurationDocument {
    /// Create a new DocumentBuilder.
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }

    /// Parse a document from its JSON wire form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the document to its JSON wire form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn problem_type(&self) -> ProblemType {
        self.context.problem_type
    }

    pub fn steps(&self) -> &[ProtocolStep] {
        &self.protocol.steps
    }
}

/// Variables, constraints and objective, plus at most one domain sub-model.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub variables: Vec<Variable>,
    pub constraints: Vec<Constraint>,
    pub objective: Objectives,
    pub domain: Option<DomainModel>,
}

impl Model {
    pub fn fleet(&self) -> Option<&FleetModel> {
        match &self.domain {
            Some(DomainModel::Fleet(fleet)) => Some(fleet),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelRepr {
    #[serde(default)]
    variables: Vec<Variable>,
    #[serde(default)]
    constraints: Vec<Constraint>,
    objective: Objectives,
    #[serde(default)]
    fleet: Option<FleetModel>,
    #[serde(default)]
    scheduling: Option<SchedulingModel>,
    #[serde(default)]
    inventory: Option<InventoryModel>,
    #[serde(default)]
    production: Option<ProductionModel>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ModelReprRef<'a> {
    variables: &'a [Variable],
    constraints: &'a [Constraint],
    objective: &'a Objectives,
    #[serde(skip_serializing_if = "Option::is_none")]
    fleet: Option<&'a FleetModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scheduling: Option<&'a SchedulingModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inventory: Option<&'a InventoryModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    production: Option<&'a ProductionModel>,
}

impl<'de> Deserialize<'de> for Model {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let repr = ModelRepr::deserialize(deserializer)?;

        // The structural pass rejects documents carrying more than one
        // sub-model; here the first one present wins.
        let domain = repr
            .fleet
            .map(DomainModel::Fleet)
            .or(repr.scheduling.map(DomainModel::Scheduling))
            .or(repr.inventory.map(DomainModel::Inventory))
            .or(repr.production.map(DomainModel::Production));

        Ok(Model {
            variables: repr.variables,
            constraints: repr.constraints,
            objective: repr.objective,
            domain,
        })
    }
}

impl Serialize for Model {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut repr = ModelReprRef {
            variables: &self.variables,
            constraints: &self.constraints,
            objective: &self.objective,
            fleet: None,
            scheduling: None,
            inventory: None,
            production: None,
        };
        match &self.domain {
            Some(DomainModel::Fleet(m)) => repr.fleet = Some(m),
            Some(DomainModel::Scheduling(m)) => repr.scheduling = Some(m),
            Some(DomainModel::Inventory(m)) => repr.inventory = Some(m),
            Some(DomainModel::Production(m)) => repr.production = Some(m),
            None => {}
        }
        repr.serialize(serializer)
    }
}

/// A decision variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Unique within the document.
    pub name: String,

    #[serde(rename = "type")]
    pub kind: VariableType,

    pub description: String,

    /// Seed value for the session state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl Variable {
    pub fn new(name: impl Into<String>, kind: VariableType) -> Self {
        let name = name.into();
        Self {
            description: name.clone(),
            name,
            kind,
            default: None,
        }
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// A model constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// Free-form constraint type (e.g. "capacity", "time_window").
    #[serde(rename = "type")]
    pub kind: String,

    pub description: String,

    pub operator: ConstraintOperator,

    pub field: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<ConstraintPriority>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub penalty: Option<f64>,
}

impl Constraint {
    /// Whether the constraint type starts with any of the given prefixes.
    pub fn is_kind(&self, prefixes: &[String]) -> bool {
        prefixes.iter().any(|p| self.kind.starts_with(p.as_str()))
    }
}

/// An optimization objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    #[serde(rename = "type")]
    pub kind: ObjectiveType,

    pub field: String,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl Objective {
    pub fn minimize(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            kind: ObjectiveType::Minimize,
            description: format!("Minimize {}", field),
            field,
            weight: None,
        }
    }

    pub fn maximize(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            kind: ObjectiveType::Maximize,
            description: format!("Maximize {}", field),
            field,
            weight: None,
        }
    }
}

/// A single objective or a weighted list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Objectives {
    Single(Objective),
    Multiple(Vec<Objective>),
}

impl Objectives {
    pub fn iter(&self) -> impl Iterator<Item = &Objective> {
        match self {
            Objectives::Single(objective) => std::slice::from_ref(objective).iter(),
            Objectives::Multiple(objectives) => objectives.iter(),
        }
    }
}

impl Default for Objectives {
    fn default() -> Self {
        Objectives::Multiple(Vec::new())
    }
}

/// Descriptive metadata about the problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProblemContext {
    pub problem_type: ProblemType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<Industry>,

    #[serde(default)]
    pub environment: Environment,

    #[serde(default)]
    pub dataset: Dataset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub internal_sources: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_quality: Option<DataQuality>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_fields: Vec<String>,
}

/// The ordered steps to run and the run flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Protocol {
    #[serde(default)]
    pub steps: Vec<ProtocolStep>,

    #[serde(default)]
    pub allow_partial_solutions: bool,

    #[serde(default)]
    pub explainability_enabled: bool,

    #[serde(default)]
    pub human_in_the_loop: HumanInTheLoop,
}

/// Human review requirements for a protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HumanInTheLoop {
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_steps: Option<Vec<String>>,
}

/// One step of a protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolStep {
    /// Key under which the step's result is recorded.
    pub id: String,

    pub action: StepAction,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_required")]
    pub required: bool,

    /// Handler-specific configuration, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

fn default_required() -> bool {
    true
}

impl ProtocolStep {
    pub fn new(id: impl Into<String>, action: StepAction) -> Self {
        Self {
            id: id.into(),
            action,
            description: String::new(),
            required: true,
            config: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = Some(config);
        self
    }
}

/// Abstract action a protocol step performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    CollectData,
    EnrichData,
    ValidateConstraints,
    ValidateNetwork,
    BuildModel,
    SolveModel,
    ExplainSolution,
    HumanReview,
    HumanApproval,
    Custom,
}

impl StepAction {
    pub const VALUES: &'static [&'static str] = &[
        "collect_data",
        "enrich_data",
        "validate_constraints",
        "validate_network",
        "build_model",
        "solve_model",
        "explain_solution",
        "human_review",
        "human_approval",
        "custom",
    ];

    /// Position of the action in the canonical protocol order.
    ///
    /// `Custom` has no rank and may appear anywhere.
    pub fn rank(&self) -> Option<u8> {
        match self {
            StepAction::CollectData => Some(0),
            StepAction::EnrichData => Some(1),
            StepAction::ValidateConstraints => Some(2),
            StepAction::ValidateNetwork => Some(3),
            StepAction::BuildModel => Some(4),
            StepAction::SolveModel => Some(5),
            StepAction::ExplainSolution => Some(6),
            StepAction::HumanReview => Some(7),
            StepAction::HumanApproval => Some(8),
            StepAction::Custom => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepAction::CollectData => "collect_data",
            StepAction::EnrichData => "enrich_data",
            StepAction::ValidateConstraints => "validate_constraints",
            StepAction::ValidateNetwork => "validate_network",
            StepAction::BuildModel => "build_model",
            StepAction::SolveModel => "solve_model",
            StepAction::ExplainSolution => "explain_solution",
            StepAction::HumanReview => "human_review",
            StepAction::HumanApproval => "human_approval",
            StepAction::Custom => "custom",
        }
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder for creating documents with a fluent API.
#[derive(Debug)]
pub struct DocumentBuilder {
    session_id: Option<String>,
    problem_type: ProblemType,
    industry: Option<Industry>,
    environment: Environment,
    dataset: Dataset,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objectives: Vec<Objective>,
    domain: Option<DomainModel>,
    protocol: Protocol,
    status: DocumentStatus,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder {
    /// Create a new DocumentBuilder.
    pub fn new() -> Self {
        Self {
            session_id: None,
            problem_type: ProblemType::Custom,
            industry: None,
            environment: Environment::default(),
            dataset: Dataset::default(),
            variables: Vec::new(),
            constraints: Vec::new(),
            objectives: Vec::new(),
            domain: None,
            protocol: Protocol::default(),
            status: DocumentStatus::Pending,
        }
    }

    /// Use a fixed session id instead of a generated one.
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn problem_type(mut self, problem_type: ProblemType) -> Self {
        self.problem_type = problem_type;
        self
    }

    pub fn industry(mut self, industry: Industry) -> Self {
        self.industry = Some(industry);
        self
    }

    pub fn environment(mut self, region: impl Into<String>, timezone: impl Into<String>) -> Self {
        self.environment = Environment {
            region: Some(region.into()),
            timezone: Some(timezone.into()),
        };
        self
    }

    pub fn internal_source(mut self, source: impl Into<String>) -> Self {
        self.dataset.internal_sources.push(source.into());
        self
    }

    pub fn variable(mut self, variable: Variable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Add an objective. At least one is required; two or more build a
    /// weighted list.
    pub fn objective(mut self, objective: Objective) -> Self {
        self.objectives.push(objective);
        self
    }

    /// Attach the domain sub-model; must match the problem type at build time.
    pub fn domain(mut self, domain: DomainModel) -> Self {
        self.domain = Some(domain);
        self
    }

    pub fn step(mut self, step: ProtocolStep) -> Self {
        self.protocol.steps.push(step);
        self
    }

    pub fn allow_partial_solutions(mut self, allow: bool) -> Self {
        self.protocol.allow_partial_solutions = allow;
        self
    }

    pub fn explainability(mut self, enabled: bool) -> Self {
        self.protocol.explainability_enabled = enabled;
        self
    }

    /// Require human approval for the named steps.
    pub fn human_approval<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protocol.human_in_the_loop = HumanInTheLoop {
            required: true,
            approval_steps: Some(steps.into_iter().map(Into::into).collect()),
        };
        self
    }

    pub fn status(mut self, status: DocumentStatus) -> Self {
        self.status = status;
        self
    }

    /// Build the document.
    ///
    /// Fails without an objective, or when the domain sub-model does not
    /// match the problem type.
    pub fn build(self) -> Result<ConfigurationDocument> {
        if self.objectives.is_empty() {
            return Err(OptiflowError::InvalidDocument {
                session_id: self.session_id,
                message: "At least one objective is required".to_string(),
            });
        }

        if let Some(domain) = &self.domain {
            if !domain.matches(self.problem_type) {
                return Err(OptiflowError::InvalidDocument {
                    session_id: self.session_id,
                    message: format!(
                        "Domain model '{}' does not apply to problem type '{}'",
                        domain.key(),
                        self.problem_type
                    ),
                });
            }
        }

        let mut objectives = self.objectives;
        let objective = if objectives.len() == 1 {
            Objectives::Single(objectives.remove(0))
        } else {
            Objectives::Multiple(objectives)
        };

        let now = Utc::now();
        Ok(ConfigurationDocument {
            session_id: self
                .session_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            model: Model {
                variables: self.variables,
                constraints: self.constraints,
                objective,
                domain: self.domain,
            },
            context: ProblemContext {
                problem_type: self.problem_type,
                industry: self.industry,
                environment: self.environment,
                dataset: self.dataset,
            },
            protocol: self.protocol,
            version: "1.0.0".to_string(),
            created: now,
            last_modified: now,
            status: self.status,
        })
    }
}
