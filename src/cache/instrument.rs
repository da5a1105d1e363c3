//! Instrumentation Module
//!
//! Call counting and call history recorded in the store around an operation.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::value::decode_utf8;
use crate::error::{CacheError, Result};
use crate::store::KeyValueStore;

// == Options ==
/// Which instrumentation layers are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstrumentationOptions {
    /// Increment a counter keyed by the operation identifier on every call
    pub count_calls: bool,
    /// Append argument and result reprs to `<op>:inputs` / `<op>:outputs`
    pub call_history: bool,
}

impl InstrumentationOptions {
    /// No counting, no history.
    pub fn disabled() -> Self {
        Self {
            count_calls: false,
            call_history: false,
        }
    }
}

impl Default for InstrumentationOptions {
    fn default() -> Self {
        Self {
            count_calls: true,
            call_history: true,
        }
    }
}

// == Invocation Record ==
/// How a recorded call ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    /// The operation returned this value (rendered with `Display`)
    Returned(String),
    /// The operation failed with this error message
    Failed(String),
    /// The input was recorded but its outcome never reached the store
    Unrecorded,
}

/// One recorded call: the argument repr and how the call ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationRecord {
    pub args: String,
    pub outcome: CallOutcome,
}

impl InvocationRecord {
    /// The returned value, if the call succeeded.
    pub fn result(&self) -> Option<&str> {
        match &self.outcome {
            CallOutcome::Returned(value) => Some(value),
            _ => None,
        }
    }
}

/// Entry of the outputs list, tagged with the position of its input.
#[derive(Debug, Serialize, Deserialize)]
struct OutputEntry {
    call: usize,
    outcome: CallOutcome,
}

/// Store key of the argument history list for `op`.
pub fn inputs_key(op: &str) -> String {
    format!("{}:inputs", op)
}

/// Store key of the result history list for `op`.
pub fn outputs_key(op: &str) -> String {
    format!("{}:outputs", op)
}

// == Instrumentation ==
/// Interceptor that wraps an operation with counting and history.
#[derive(Clone)]
pub struct Instrumentation {
    store: Arc<dyn KeyValueStore>,
    options: InstrumentationOptions,
}

impl Instrumentation {
    pub fn new(store: Arc<dyn KeyValueStore>, options: InstrumentationOptions) -> Self {
        Self { store, options }
    }

    /// Runs `operation` under instrumentation.
    ///
    /// Side effects happen in this order: counter increment, input append,
    /// the operation itself, output append. Each output entry carries the
    /// position of its input, so failed calls and lost output appends never
    /// shift the pairing of later calls. Once the operation has run, a failed
    /// output append is logged and the operation's own result is returned.
    pub async fn call<T, F, Fut>(&self, op: &str, args: String, operation: F) -> Result<T>
    where
        T: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if self.options.count_calls {
            let count = self.store.increment(op).await?;
            debug!("{} call #{}", op, count);
        }

        let call_index = if self.options.call_history {
            let len = self
                .store
                .append_to_list(&inputs_key(op), args.as_bytes())
                .await?;
            Some(len.saturating_sub(1))
        } else {
            None
        };

        let output = operation().await;

        if let Some(call) = call_index {
            let outcome = match &output {
                Ok(value) => CallOutcome::Returned(value.to_string()),
                Err(e) => CallOutcome::Failed(e.to_string()),
            };
            if let Err(e) = self.record_outcome(op, OutputEntry { call, outcome }).await {
                warn!("{} call #{} outcome not recorded: {}", op, call + 1, e);
            }
        }

        output
    }

    async fn record_outcome(&self, op: &str, entry: OutputEntry) -> Result<()> {
        let encoded =
            serde_json::to_vec(&entry).map_err(|e| CacheError::Decode(e.to_string()))?;
        self.store.append_to_list(&outputs_key(op), &encoded).await?;
        Ok(())
    }

    /// Number of recorded calls to `op`; 0 when never called.
    pub async fn call_count(&self, op: &str) -> Result<u64> {
        match self.store.get(op).await? {
            Some(raw) => {
                let text = decode_utf8(raw)?;
                text.parse().map_err(|_| {
                    CacheError::Decode(format!("call counter {} holds {:?}", op, text))
                })
            }
            None => Ok(0),
        }
    }

    /// Recorded calls to `op`, oldest first, one per recorded input.
    pub async fn history(&self, op: &str) -> Result<Vec<InvocationRecord>> {
        let inputs = self.store.list_range(&inputs_key(op)).await?;
        let outputs = self.store.list_range(&outputs_key(op)).await?;

        let mut records = inputs
            .into_iter()
            .map(|args| {
                Ok(InvocationRecord {
                    args: decode_utf8(args)?,
                    outcome: CallOutcome::Unrecorded,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        for raw in outputs {
            let entry: OutputEntry = serde_json::from_slice(&raw)
                .map_err(|e| CacheError::Decode(format!("{} output entry: {}", op, e)))?;
            if let Some(record) = records.get_mut(entry.call) {
                record.outcome = entry.outcome;
            }
        }

        Ok(records)
    }

    /// Renders the call history of `op` and logs each line.
    ///
    /// ```text
    /// Cache.store was called 2 times:
    /// Cache.store(*("foo",)) -> 1f7e...
    /// Cache.store(*(b"bar",)) -> 9a0c...
    /// ```
    pub async fn replay(&self, op: &str) -> Result<Vec<String>> {
        let count = self.call_count(op).await?;
        let history = self.history(op).await?;

        let mut lines = Vec::with_capacity(history.len() + 1);
        lines.push(format!("{} was called {} times:", op, count));
        lines.extend(history.iter().map(|record| match &record.outcome {
            CallOutcome::Returned(value) => format!("{}(*{}) -> {}", op, record.args, value),
            CallOutcome::Failed(error) => {
                format!("{}(*{}) failed: {}", op, record.args, error)
            }
            CallOutcome::Unrecorded => format!("{}(*{}) -> ?", op, record.args),
        }));

        for line in &lines {
            info!("{}", line);
        }
        Ok(lines)
    }
}

impl std::fmt::Debug for Instrumentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instrumentation")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn instrumentation(options: InstrumentationOptions) -> (Arc<MemoryStore>, Instrumentation) {
        let store = Arc::new(MemoryStore::new());
        let inst = Instrumentation::new(store.clone(), options);
        (store, inst)
    }

    fn returned(args: &str, value: &str) -> InvocationRecord {
        InvocationRecord {
            args: args.to_string(),
            outcome: CallOutcome::Returned(value.to_string()),
        }
    }

    #[tokio::test]
    async fn test_call_records_count_and_history() {
        let (_store, inst) = instrumentation(InstrumentationOptions::default());

        let out = inst
            .call("Op.echo", "(1,)".to_string(), || async { Ok::<_, CacheError>(1) })
            .await
            .unwrap();
        assert_eq!(out, 1);

        inst.call("Op.echo", "(2,)".to_string(), || async { Ok::<_, CacheError>(2) })
            .await
            .unwrap();

        assert_eq!(inst.call_count("Op.echo").await.unwrap(), 2);
        let history = inst.history("Op.echo").await.unwrap();
        assert_eq!(history, vec![returned("(1,)", "1"), returned("(2,)", "2")]);
        assert_eq!(history[1].result(), Some("2"));
    }

    #[tokio::test]
    async fn test_counter_is_written_before_operation_runs() {
        let (store, inst) = instrumentation(InstrumentationOptions::default());
        let probe = store.clone();

        inst.call("Op.peek", "()".to_string(), || async move {
            let seen = probe.get("Op.peek").await?;
            let inputs = probe.list_range("Op.peek:inputs").await?;
            assert_eq!(seen, Some(b"1".to_vec()));
            assert_eq!(inputs.len(), 1);
            assert!(probe.list_range("Op.peek:outputs").await?.is_empty());
            Ok::<_, CacheError>("done")
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_failed_call_keeps_later_calls_paired() {
        let (_store, inst) = instrumentation(InstrumentationOptions::default());

        let result: Result<String> = inst
            .call("Op.flaky", "(\"lost\",)".to_string(), || async {
                Err(CacheError::Store("down".to_string()))
            })
            .await;
        assert!(matches!(result, Err(CacheError::Store(_))));

        inst.call("Op.flaky", "(\"kept\",)".to_string(), || async {
            Ok::<_, CacheError>("k2")
        })
        .await
        .unwrap();

        assert_eq!(inst.call_count("Op.flaky").await.unwrap(), 2);
        let history = inst.history("Op.flaky").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].args, "(\"lost\",)");
        assert_eq!(
            history[0].outcome,
            CallOutcome::Failed("Store error: down".to_string())
        );
        assert_eq!(history[1], returned("(\"kept\",)", "k2"));
    }

    #[tokio::test]
    async fn test_lost_output_does_not_shift_pairs() {
        let (store, inst) = instrumentation(InstrumentationOptions::default());

        inst.call("Op.gap", "(1,)".to_string(), || async { Ok::<_, CacheError>("a") })
            .await
            .unwrap();
        // An input whose outcome never made it to the store
        store.append_to_list("Op.gap:inputs", b"(2,)").await.unwrap();
        inst.call("Op.gap", "(3,)".to_string(), || async { Ok::<_, CacheError>("c") })
            .await
            .unwrap();

        let history = inst.history("Op.gap").await.unwrap();
        assert_eq!(history[0], returned("(1,)", "a"));
        assert_eq!(history[1].outcome, CallOutcome::Unrecorded);
        assert_eq!(history[2], returned("(3,)", "c"));
    }

    #[tokio::test]
    async fn test_disabled_options_record_nothing() {
        let (store, inst) = instrumentation(InstrumentationOptions::disabled());

        inst.call("Op.quiet", "()".to_string(), || async { Ok::<_, CacheError>("x") })
            .await
            .unwrap();

        assert_eq!(inst.call_count("Op.quiet").await.unwrap(), 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_replay_format() {
        let (_store, inst) = instrumentation(InstrumentationOptions::default());

        inst.call("Op.say", "(\"hi\",)".to_string(), || async {
            Ok::<_, CacheError>("k1")
        })
        .await
        .unwrap();
        let _ = inst
            .call("Op.say", "(\"no\",)".to_string(), || async {
                Err::<String, _>(CacheError::Store("down".to_string()))
            })
            .await;

        let lines = inst.replay("Op.say").await.unwrap();
        assert_eq!(
            lines,
            vec![
                "Op.say was called 2 times:".to_string(),
                "Op.say(*(\"hi\",)) -> k1".to_string(),
                "Op.say(*(\"no\",)) failed: Store error: down".to_string(),
            ]
        );
    }
}
