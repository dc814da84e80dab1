//! Structural pass: the document schema, checked with `jsonschema`.
//!
//! The schema is built once from the wire-name tables of the core enums, so
//! enum membership can never drift from what the typed document accepts.
//! Every error names the JSON pointer of the offending value; `required`
//! errors point at the object missing the property.

use std::sync::LazyLock;

use jsonschema::Validator;
use optiflow_core::{
    ConstraintOperator, ConstraintPriority, DataQuality, DocumentStatus, Industry, ObjectiveType,
    ProblemType, StepAction, VariableType,
};
use serde_json::{json, Map, Value};
use tracing::error;

use crate::error::ValidationError;

/// Domain sub-model keys that may appear under `model`.
const DOMAIN_KEYS: &[&str] = &["fleet", "scheduling", "inventory", "production"];

/// `major.minor.patch`
pub const VERSION_PATTERN: &str = r"^\d+\.\d+\.\d+$";

static VALIDATOR: LazyLock<Result<Validator, String>> = LazyLock::new(|| {
    jsonschema::options()
        .should_validate_formats(true)
        .build(&document_schema())
        .map_err(|e| {
            error!(error = %e, "Document schema failed to compile");
            e.to_string()
        })
});

/// Run the structural pass over a raw document.
pub fn check(document: &Value) -> Vec<ValidationError> {
    let validator = match VALIDATOR.as_ref() {
        Ok(validator) => validator,
        Err(e) => return vec![ValidationError::new(format!("Invalid schema: {}", e))],
    };

    validator
        .iter_errors(document)
        .map(|e| {
            let path = e.instance_path.to_string();
            let field = if path.is_empty() { "/".to_string() } else { path };
            ValidationError::new(format!("{}: {}", field, e)).at(field)
        })
        .collect()
}

/// The JSON Schema every configuration document must satisfy.
pub fn document_schema() -> Value {
    let mut schema = object(
        &[
            "sessionId",
            "version",
            "created",
            "lastModified",
            "status",
            "model",
            "context",
            "protocol",
        ],
        json!({
            "sessionId": { "type": "string" },
            "version": { "type": "string", "pattern": VERSION_PATTERN },
            "created": timestamp(),
            "lastModified": timestamp(),
            "status": one_of(DocumentStatus::VALUES),
            "model": model(),
            "context": context(),
            "protocol": protocol(),
        }),
    );
    schema["$schema"] = json!("http://json-schema.org/draft-07/schema#");
    schema["allOf"] = Value::Array(domain_by_problem_type());
    schema
}

/// One `if`/`then` clause per domain key: the matching problem types must
/// carry that sub-model and no other.
fn domain_by_problem_type() -> Vec<Value> {
    let mut groups: Vec<(Option<&str>, Vec<&str>)> = Vec::new();
    for &name in ProblemType::VALUES {
        let key = ProblemType::from_wire(name).and_then(|p| p.domain_key());
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, names)) => names.push(name),
            None => groups.push((key, vec![name])),
        }
    }

    groups
        .into_iter()
        .map(|(key, problem_types)| {
            let forbidden: Map<String, Value> = DOMAIN_KEYS
                .iter()
                .filter(|k| Some(**k) != key)
                .map(|k| (k.to_string(), Value::Bool(false)))
                .collect();
            let mut model = json!({ "properties": forbidden });
            if let Some(key) = key {
                model["required"] = json!([key]);
            }

            json!({
                "if": {
                    "required": ["context"],
                    "properties": {
                        "context": {
                            "required": ["problemType"],
                            "properties": { "problemType": { "enum": problem_types } }
                        }
                    }
                },
                "then": { "properties": { "model": model } }
            })
        })
        .collect()
}

fn model() -> Value {
    let objective = object(
        &["type", "field", "description"],
        json!({
            "type": one_of(ObjectiveType::VALUES),
            "field": { "type": "string" },
            "description": { "type": "string" },
            "weight": { "type": "number" },
        }),
    );

    object(
        &["variables", "constraints", "objective"],
        json!({
            "variables": array_of(object(
                &["name", "type", "description"],
                json!({
                    "name": { "type": "string" },
                    "type": one_of(VariableType::VALUES),
                    "description": { "type": "string" },
                }),
            )),
            "constraints": array_of(object(
                &["type", "description", "operator", "field"],
                json!({
                    "type": { "type": "string" },
                    "description": { "type": "string" },
                    "operator": one_of(ConstraintOperator::VALUES),
                    "field": { "type": "string" },
                    "priority": one_of(ConstraintPriority::VALUES),
                    "penalty": { "type": "number" },
                }),
            )),
            "objective": {
                "if": { "type": "array" },
                "then": { "minItems": 1, "items": objective },
                "else": objective,
            },
            "fleet": fleet(),
            "scheduling": scheduling(),
            "inventory": inventory(),
            "production": production(),
        }),
    )
}

fn context() -> Value {
    object(
        &["problemType"],
        json!({
            "problemType": one_of(ProblemType::VALUES),
            "industry": one_of(Industry::VALUES),
            "environment": object(&[], json!({
                "region": { "type": "string" },
                "timezone": { "type": "string" },
            })),
            "dataset": object(&[], json!({
                "internalSources": strings(),
                "dataQuality": one_of(DataQuality::VALUES),
                "requiredFields": strings(),
            })),
        }),
    )
}

fn protocol() -> Value {
    object(
        &["steps", "allowPartialSolutions", "explainabilityEnabled", "humanInTheLoop"],
        json!({
            "steps": array_of(object(
                &["id", "action"],
                json!({
                    "id": { "type": "string" },
                    "action": one_of(StepAction::VALUES),
                    "description": { "type": "string" },
                    "required": { "type": "boolean" },
                }),
            )),
            "allowPartialSolutions": { "type": "boolean" },
            "explainabilityEnabled": { "type": "boolean" },
            "humanInTheLoop": object(&["required"], json!({
                "required": { "type": "boolean" },
                "approvalSteps": strings(),
            })),
        }),
    )
}

fn fleet() -> Value {
    let location = object(
        &["id", "latitude", "longitude"],
        json!({
            "id": { "type": "string" },
            "latitude": { "type": "number", "minimum": -90, "maximum": 90 },
            "longitude": { "type": "number", "minimum": -180, "maximum": 180 },
            "address": { "type": "string" },
            "demand": { "type": "number", "minimum": 0 },
            "timeWindows": array_of(time_span()),
        }),
    );
    let vehicle = object(
        &["id", "capacity", "costPerKm"],
        json!({
            "id": { "type": "string" },
            "name": { "type": "string" },
            "capacity": { "type": "number", "exclusiveMinimum": 0 },
            "costPerKm": { "type": "number", "minimum": 0 },
            "costPerHour": { "type": "number", "minimum": 0 },
            "maxDistance": { "type": "number", "exclusiveMinimum": 0 },
            "maxDuration": { "type": "number", "exclusiveMinimum": 0 },
        }),
    );

    object(
        &["vehicles", "depots", "customers"],
        json!({
            "vehicles": non_empty(vehicle),
            "depots": non_empty(location.clone()),
            "customers": non_empty(location),
        }),
    )
}

fn scheduling() -> Value {
    object(
        &[],
        json!({
            "resources": array_of(object(&["id"], json!({
                "id": { "type": "string" },
                "name": { "type": "string" },
                "skills": strings(),
                "availability": array_of(time_span()),
                "cost": { "type": "number" },
                "efficiency": { "type": "number" },
                "maxWorkload": { "type": "number" },
            }))),
            "tasks": array_of(object(&["id", "duration"], json!({
                "id": { "type": "string" },
                "name": { "type": "string" },
                "duration": { "type": "number" },
                "requiredSkills": strings(),
                "priority": { "type": "integer" },
                "dependencies": strings(),
                "earliestStart": timestamp(),
                "latestEnd": timestamp(),
            }))),
        }),
    )
}

fn inventory() -> Value {
    object(
        &[],
        json!({
            "products": array_of(object(&["id", "unitCost", "holdingCost"], json!({
                "id": { "type": "string" },
                "name": { "type": "string" },
                "unitCost": { "type": "number" },
                "holdingCost": { "type": "number" },
                "setupCost": { "type": "number" },
                "leadTime": { "type": "number" },
                "minOrderQuantity": { "type": "number" },
                "maxOrderQuantity": { "type": "number" },
                "shelfLife": { "type": "number" },
            }))),
            "warehouses": array_of(object(&["id", "capacity"], json!({
                "id": { "type": "string" },
                "name": { "type": "string" },
                "capacity": { "type": "number" },
                "fixedCost": { "type": "number" },
                "handlingCost": { "type": "number" },
            }))),
            "demandForecasts": array_of(object(&["productId", "period", "quantity"], json!({
                "productId": { "type": "string" },
                "period": { "type": "string" },
                "quantity": { "type": "number" },
                "confidence": { "type": "number" },
            }))),
        }),
    )
}

fn production() -> Value {
    let routing_step = object(
        &["machineType"],
        json!({
            "machineType": { "type": "string" },
            "duration": { "type": "number" },
            "materials": array_of(object(&["materialId", "quantity"], json!({
                "materialId": { "type": "string" },
                "quantity": { "type": "number" },
            }))),
        }),
    );

    object(
        &[],
        json!({
            "machines": array_of(object(&["id", "processingRate"], json!({
                "id": { "type": "string" },
                "name": { "type": "string" },
                "setupTime": { "type": "number" },
                "processingRate": { "type": "number" },
                "capabilities": strings(),
                "costPerHour": { "type": "number" },
            }))),
            "materials": array_of(object(&["id", "cost"], json!({
                "id": { "type": "string" },
                "name": { "type": "string" },
                "cost": { "type": "number" },
                "leadTime": { "type": "number" },
                "supplier": { "type": "string" },
            }))),
            "orders": array_of(object(&["id", "quantity"], json!({
                "id": { "type": "string" },
                "productId": { "type": "string" },
                "quantity": { "type": "number" },
                "dueDate": { "type": "string" },
                "priority": { "type": "integer" },
                "routingSteps": array_of(routing_step),
            }))),
        }),
    )
}

fn object(required: &[&str], properties: Value) -> Value {
    json!({ "type": "object", "required": required, "properties": properties })
}

fn array_of(items: Value) -> Value {
    json!({ "type": "array", "items": items })
}

fn non_empty(items: Value) -> Value {
    json!({ "type": "array", "minItems": 1, "items": items })
}

fn strings() -> Value {
    array_of(json!({ "type": "string" }))
}

fn one_of(values: &[&str]) -> Value {
    json!({ "type": "string", "enum": values })
}

fn timestamp() -> Value {
    json!({ "type": "string", "format": "date-time" })
}

fn time_span() -> Value {
    object(&["start", "end"], json!({ "start": timestamp(), "end": timestamp() }))
}
