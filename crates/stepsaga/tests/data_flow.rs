//! Integration tests for passing step results into later steps.

use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use stepsaga::{RecordingLogger, SagaBuilder, Step, StepHandler};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct TestError(String);

type Calls = Arc<Mutex<Vec<(&'static str, Vec<i64>)>>>;

/// Returns the seed when called without inputs, otherwise the sum of inputs + 1.
struct SumPlusOne {
    name: &'static str,
    seed: i64,
    calls: Calls,
}

impl StepHandler for SumPlusOne {
    type Value = i64;
    type Error = TestError;

    fn execute(&mut self, inputs: Vec<i64>) -> Result<i64, TestError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((self.name, inputs.clone()));
        if inputs.is_empty() {
            Ok(self.seed)
        } else {
            Ok(inputs.iter().sum::<i64>() + 1)
        }
    }
}

fn step(name: &'static str, calls: &Calls) -> SumPlusOne {
    SumPlusOne {
        name,
        seed: 5,
        calls: Arc::clone(calls),
    }
}

#[test]
fn results_thread_through_requirements() -> anyhow::Result<()> {
    let calls = Calls::default();
    let mut saga = SagaBuilder::new("test_saga")
        .logger(RecordingLogger::new())
        .step(Step::new("step1", step("step1", &calls)))
        .step(Step::new("step2", step("step2", &calls)).requires("step1"))
        .step(Step::new("step3", step("step3", &calls)).with_requirements(["step1", "step2"]))
        .step(Step::new("step4", step("step4", &calls)).requires("step3"))
        .build()?;

    let results = saga.exec()?;

    assert_eq!(results["step1"], 5);
    assert_eq!(results["step2"], 6);
    assert_eq!(results["step3"], 12);
    assert_eq!(results["step4"], 13);

    let calls = calls.lock().expect("calls lock");
    assert_eq!(
        *calls,
        [
            ("step1", vec![]),
            ("step2", vec![5]),
            ("step3", vec![5, 6]),
            ("step4", vec![12]),
        ]
    );
    Ok(())
}

#[test]
fn results_keep_declaration_order() -> anyhow::Result<()> {
    let calls = Calls::default();
    let mut saga = SagaBuilder::new("ordered")
        .logger(RecordingLogger::new())
        .step(Step::new("z", step("z", &calls)))
        .step(Step::new("a", step("a", &calls)).requires("z"))
        .step(Step::new("m", step("m", &calls)).requires("a"))
        .build()?;

    let results = saga.exec()?;

    let keys: Vec<&str> = results.keys().map(String::as_str).collect();
    assert_eq!(keys, ["z", "a", "m"]);
    Ok(())
}

#[test]
fn inputs_follow_requirement_order_not_declaration_order() -> anyhow::Result<()> {
    let calls = Calls::default();
    let mut saga = SagaBuilder::new("reversed")
        .logger(RecordingLogger::new())
        .step(Step::new("a", step("a", &calls)))
        .step(Step::new("b", step("b", &calls)).requires("a"))
        .step(Step::new("c", step("c", &calls)).with_requirements(["b", "a"]))
        .build()?;

    saga.exec()?;

    let calls = calls.lock().expect("calls lock");
    assert_eq!(calls[2], ("c", vec![6, 5]));
    Ok(())
}

#[test]
fn requirement_may_be_repeated() -> anyhow::Result<()> {
    let calls = Calls::default();
    let mut saga = SagaBuilder::new("repeat")
        .logger(RecordingLogger::new())
        .step(Step::new("a", step("a", &calls)))
        .step(Step::new("b", step("b", &calls)).with_requirements(["a", "a", "a"]))
        .build()?;

    let results = saga.exec()?;

    assert_eq!(results["b"], 16);
    Ok(())
}

#[test]
fn empty_saga_succeeds_with_empty_results() -> anyhow::Result<()> {
    let mut saga = SagaBuilder::<i64, TestError>::new("empty")
        .logger(RecordingLogger::new())
        .build()?;

    let results = saga.exec()?;

    assert!(results.is_empty());
    Ok(())
}

struct JsonStep<F> {
    build: F,
}

impl<F> StepHandler for JsonStep<F>
where
    F: FnMut(Vec<Value>) -> Value + Send,
{
    type Value = Value;
    type Error = TestError;

    fn execute(&mut self, inputs: Vec<Value>) -> Result<Value, TestError> {
        Ok((self.build)(inputs))
    }
}

#[test]
fn tagged_values_of_different_shapes_flow_between_steps() -> anyhow::Result<()> {
    let mut saga = SagaBuilder::new("order")
        .logger(RecordingLogger::new())
        .step(Step::new(
            "customer",
            JsonStep {
                build: |_: Vec<Value>| json!({ "id": 42, "name": "Ada" }),
            },
        ))
        .step(Step::new(
            "items",
            JsonStep {
                build: |_: Vec<Value>| json!(["book", "pen"]),
            },
        ))
        .step(
            Step::new(
                "order",
                JsonStep {
                    build: |inputs: Vec<Value>| {
                        json!({
                            "customer": inputs[0]["id"],
                            "count": inputs[1].as_array().map_or(0, Vec::len),
                        })
                    },
                },
            )
            .with_requirements(["customer", "items"]),
        )
        .build()?;

    let results = saga.exec()?;

    assert_eq!(results["order"], json!({ "customer": 42, "count": 2 }));
    Ok(())
}
