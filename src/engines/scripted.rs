// SPDX-License-Identifier: GPL-3.0-only

//! Scripted detection engine
//!
//! Returns pre-recorded responses in submission order. Used as the test
//! double for the detector and by the CLI to replay engine output captured
//! elsewhere.
//!
//! Script files are JSON:
//!
//! ```json
//! {
//!   "responses": [
//!     { "kind": "candidates", "quads": [ ... ], "delay_ms": 20 },
//!     { "kind": "fail", "message": "engine crashed" },
//!     { "kind": "reject", "message": "unsupported pixel format" }
//!   ],
//!   "repeat": { "kind": "candidates", "quads": [] }
//! }
//! ```

use super::types::{CandidateFuture, DetectionRequest};
use super::RectangleDetectionEngine;
use crate::errors::{AppError, AppResult, EngineError, EngineResult};
use crate::geometry::Quadrilateral;
use crate::media::Orientation;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, trace};
use uuid::Uuid;

/// One scripted engine response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ScriptedResponse {
    /// Complete with these candidates (normalized coordinates)
    Candidates {
        quads: Vec<Quadrilateral>,
        #[serde(default)]
        delay_ms: u64,
    },
    /// Complete with an engine failure
    Fail {
        message: String,
        #[serde(default)]
        delay_ms: u64,
    },
    /// Reject the request at submission
    Reject { message: String },
    /// Panic while running the request
    Panic,
    /// Never complete
    Hang,
}

impl ScriptedResponse {
    pub fn candidates(quads: Vec<Quadrilateral>) -> Self {
        Self::Candidates { quads, delay_ms: 0 }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail {
            message: message.into(),
            delay_ms: 0,
        }
    }

    pub fn reject(message: impl Into<String>) -> Self {
        Self::Reject {
            message: message.into(),
        }
    }

    /// Delay completion by `delay`
    ///
    /// Has no effect on rejections, panics and hangs.
    pub fn delayed(self, delay: Duration) -> Self {
        let ms = delay.as_millis() as u64;
        match self {
            Self::Candidates { quads, .. } => Self::Candidates { quads, delay_ms: ms },
            Self::Fail { message, .. } => Self::Fail { message, delay_ms: ms },
            other => other,
        }
    }
}

/// Serialized form of a script
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineScript {
    /// Responses consumed in submission order
    #[serde(default)]
    pub responses: Vec<ScriptedResponse>,
    /// Response used once `responses` is exhausted (default: no candidates)
    #[serde(default)]
    pub repeat: Option<ScriptedResponse>,
}

/// A request as seen by the scripted engine
#[derive(Debug, Clone, PartialEq)]
pub struct SeenRequest {
    pub id: Uuid,
    /// Raw buffer size
    pub width: u32,
    pub height: u32,
    pub orientation: Option<Orientation>,
}

struct ScriptState {
    pending: VecDeque<ScriptedResponse>,
    seen: Vec<SeenRequest>,
}

/// Engine that replays scripted responses
pub struct ScriptedEngine {
    state: Mutex<ScriptState>,
    repeat: ScriptedResponse,
}

impl ScriptedEngine {
    /// Engine that answers with `responses` in order, then with no candidates
    pub fn new(responses: impl IntoIterator<Item = ScriptedResponse>) -> Self {
        Self::from_script(EngineScript {
            responses: responses.into_iter().collect(),
            repeat: None,
        })
    }

    /// Engine that gives the same answer to every request
    pub fn always(response: ScriptedResponse) -> Self {
        Self::from_script(EngineScript {
            responses: Vec::new(),
            repeat: Some(response),
        })
    }

    pub fn from_script(script: EngineScript) -> Self {
        Self {
            state: Mutex::new(ScriptState {
                pending: script.responses.into(),
                seen: Vec::new(),
            }),
            repeat: script
                .repeat
                .unwrap_or_else(|| ScriptedResponse::candidates(Vec::new())),
        }
    }

    pub fn from_json_str(json: &str) -> AppResult<Self> {
        let script: EngineScript = serde_json::from_str(json)?;
        Ok(Self::from_script(script))
    }

    pub fn from_json_file(path: &Path) -> AppResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| AppError::Script(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Requests submitted so far, in submission order
    pub fn seen_requests(&self) -> Vec<SeenRequest> {
        self.lock().seen.clone()
    }

    /// Number of scripted responses not yet consumed
    pub fn remaining(&self) -> usize {
        self.lock().pending.len()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        // Script state stays consistent across a poisoning panic
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RectangleDetectionEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn submit(&self, request: DetectionRequest) -> EngineResult<CandidateFuture> {
        let response = {
            let mut state = self.lock();
            state.seen.push(SeenRequest {
                id: request.id,
                width: request.frame.width,
                height: request.frame.height,
                orientation: request.orientation,
            });
            state
                .pending
                .pop_front()
                .unwrap_or_else(|| self.repeat.clone())
        };

        trace!(request = %request.id, ?response, "Scripted response");

        match response {
            ScriptedResponse::Reject { message } => Err(EngineError::Unsupported(message)),
            ScriptedResponse::Candidates { quads, delay_ms } => Ok(async move {
                // The frame is held until completion, like a real engine would
                let _frame = request.frame;
                sleep_ms(delay_ms).await;
                debug!(count = quads.len(), "Scripted engine completed");
                Ok(quads)
            }
            .boxed()),
            ScriptedResponse::Fail { message, delay_ms } => Ok(async move {
                sleep_ms(delay_ms).await;
                Err(EngineError::Failed(message))
            }
            .boxed()),
            ScriptedResponse::Panic => Ok(panicking_response().boxed()),
            ScriptedResponse::Hang => Ok(futures::future::pending().boxed()),
        }
    }
}

async fn sleep_ms(delay_ms: u64) {
    if delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }
}

async fn panicking_response() -> EngineResult<Vec<Quadrilateral>> {
    panic!("scripted engine panic")
}
