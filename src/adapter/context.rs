//! Invocation context delivered by the platform alongside each event.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-invocation metadata. Available to handlers as a request extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationContext {
    /// Platform request id (the Lambda `awsRequestId`).
    pub request_id: String,

    pub function_name: String,

    pub invoked_function_arn: String,

    /// Invocation deadline in milliseconds since the Unix epoch; 0 if unknown.
    pub deadline_ms: u64,

    /// X-Ray trace header, if tracing is active.
    pub trace_id: Option<String>,
}

impl InvocationContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Self::default()
        }
    }

    /// Context for an invocation that did not come from the platform.
    pub fn local(function_name: &str, timeout: Duration) -> Self {
        let deadline = SystemTime::now() + timeout;
        Self {
            request_id: Uuid::new_v4().to_string(),
            function_name: function_name.to_string(),
            invoked_function_arn: format!("arn:local:function:{function_name}"),
            deadline_ms: deadline
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or_default(),
            trace_id: None,
        }
    }

    pub fn deadline(&self) -> Option<SystemTime> {
        (self.deadline_ms > 0).then(|| UNIX_EPOCH + Duration::from_millis(self.deadline_ms))
    }

    /// Time left before the platform aborts the invocation.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline()
            .map(|deadline| deadline.duration_since(SystemTime::now()).unwrap_or_default())
    }
}

impl From<lambda_runtime::Context> for InvocationContext {
    fn from(ctx: lambda_runtime::Context) -> Self {
        Self {
            request_id: ctx.request_id,
            function_name: ctx.env_config.function_name.clone(),
            invoked_function_arn: ctx.invoked_function_arn,
            deadline_ms: ctx.deadline,
            trace_id: ctx.xray_trace_id,
        }
    }
}
