//! JEXL evaluation of `=`-prefixed subscription parameters.
//!
//! Workflow values are always passed as context objects, never interpolated
//! into expression strings.

use serde_json::{Value, json};

use hookrelay_types::workflow::WorkflowSnapshot;

/// Prefix marking a parameter value as an expression.
pub const EXPRESSION_PREFIX: char = '=';

#[derive(Debug, thiserror::Error)]
pub enum ExpressionError {
    #[error("expression evaluation failed: {0}")]
    EvalFailed(String),

    #[error("expression must yield a string or a list of strings, got {result}")]
    NotStringList { result: Value },
}

/// Evaluates subscription expressions against workflow state.
pub struct SubscriptionEvaluator {
    evaluator: jexl_eval::Evaluator<'static>,
}

impl SubscriptionEvaluator {
    pub fn new() -> Self {
        let evaluator = jexl_eval::Evaluator::new()
            .with_transform("lower", |args: &[Value]| {
                let s = args.first().and_then(|v| v.as_str()).unwrap_or("");
                Ok(json!(s.to_lowercase()))
            })
            .with_transform("split", |args: &[Value]| {
                let s = args.first().and_then(|v| v.as_str()).unwrap_or("");
                let delimiter = args.get(1).and_then(|v| v.as_str()).unwrap_or(",");
                let parts: Vec<&str> = s.split(delimiter).map(str::trim).collect();
                Ok(json!(parts))
            })
            .with_transform("keys", |args: &[Value]| {
                let keys: Vec<String> = args
                    .first()
                    .and_then(|v| v.as_object())
                    .map(|o| o.keys().cloned().collect())
                    .unwrap_or_default();
                Ok(json!(keys))
            });

        Self { evaluator }
    }

    /// The object expressions are evaluated against. Static data is exposed
    /// as both `$static` and `staticData`.
    pub fn context_for(workflow: &WorkflowSnapshot, static_data: &Value) -> Value {
        json!({
            "$static": static_data,
            "staticData": static_data,
            "workflow": { "id": workflow.id.as_str(), "name": workflow.name },
            "settings": workflow.settings,
        })
    }

    /// Whether a raw parameter value is an expression.
    pub fn is_expression(raw: &str) -> bool {
        raw.starts_with(EXPRESSION_PREFIX)
    }

    /// Evaluate an expression (with or without its `=` prefix) to the list of
    /// sub-types it names.
    pub fn evaluate_subscriptions(
        &self,
        expression: &str,
        context: &Value,
    ) -> Result<Vec<String>, ExpressionError> {
        let source = expression.strip_prefix(EXPRESSION_PREFIX).unwrap_or(expression);
        let result = self
            .evaluator
            .eval_in_context(source.trim(), context)
            .map_err(|e| ExpressionError::EvalFailed(e.to_string()))?;

        match result {
            Value::String(s) => Ok(vec![s]),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(ExpressionError::NotStringList { result: other }),
                })
                .collect(),
            other => Err(ExpressionError::NotStringList { result: other }),
        }
    }
}

impl Default for SubscriptionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}
